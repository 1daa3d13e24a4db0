//! ScreenLab Core: multi-source screener reconciliation and indicators.
//!
//! This crate holds the pure, I/O-free logic:
//! - Domain types (ticker identities, canonical fields, merged records)
//! - Indicator calculator (percent-change, Wilder RSI, oversold flag)
//! - Source extractor (list / nested list / dict-of-records payloads)
//! - Record normalizer driven by per-source alias tables
//! - Reconciliation engine with explicit source precedence and fill-only merging
//! - Merged-record emitter (mapping or list shape)

pub mod data;
pub mod domain;
pub mod emit;
pub mod indicators;
pub mod reconcile;
