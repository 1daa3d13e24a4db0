//! Domain types for ScreenLab

pub mod field;
pub mod ids;
pub mod record;

pub use field::{Field, FieldKind, UnknownField};
pub use ids::TickerId;
pub use record::{
    AttributeSet, FillOutcome, MergedMap, MergedRecord, FIELD_SOURCES_KEY, SOURCE_KEY,
};
