//! Yahoo Finance closes via the v8 chart API.
//!
//! Only daily closes are read. Null closes (holidays, halted sessions) are
//! dropped. Repeated rate limiting or an outright ban trips a circuit
//! breaker shared by every worker, so a blocked provider fails fast instead
//! of being hammered by the whole universe.

use super::{FetchError, PriceHistoryProvider};
use screenlab_core::indicators::PriceSeries;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Refuses requests for `cooldown` after a ban or repeated failures.
#[derive(Debug)]
struct CircuitBreaker {
    state: Mutex<BreakerState>,
    cooldown: Duration,
    failure_threshold: u32,
}

#[derive(Debug, Default)]
struct BreakerState {
    tripped_at: Option<Instant>,
    consecutive_failures: u32,
}

impl CircuitBreaker {
    fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            cooldown,
            failure_threshold: 3,
        }
    }

    fn is_allowed(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.tripped_at {
            Some(at) if at.elapsed() < self.cooldown => false,
            Some(_) => {
                *state = BreakerState::default();
                true
            }
            None => true,
        }
    }

    fn record_success(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .consecutive_failures = 0;
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.failure_threshold {
            state.tripped_at = Some(Instant::now());
        }
    }

    fn trip(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tripped_at = Some(Instant::now());
    }
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    breaker: CircuitBreaker,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            breaker: CircuitBreaker::new(Duration::from_secs(30 * 60)),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(ticker: &str, days: u32) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?range={days}d&interval=1d"
        )
    }

    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<f64>, FetchError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            Some(err) => {
                FetchError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => FetchError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let quote = result
            .into_iter()
            .next()
            .and_then(|data| data.indicators.quote.into_iter().next())
            .ok_or_else(|| FetchError::ResponseFormatChanged("no quote data".into()))?;

        let closes: Vec<f64> = quote.close.into_iter().flatten().collect();
        if closes.is_empty() {
            return Err(FetchError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        Ok(closes)
    }

    fn fetch_with_retry(&self, ticker: &str, days: u32) -> Result<Vec<f64>, FetchError> {
        let url = Self::chart_url(ticker, days);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(ticker, attempt, ?delay, "retrying");
                std::thread::sleep(delay);
            }

            if !self.breaker.is_allowed() {
                return Err(FetchError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(FetchError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(FetchError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                warn!(ticker, "provider returned 403, tripping circuit breaker");
                self.breaker.trip();
                return Err(FetchError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(FetchError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if !status.is_success() {
                self.breaker.record_failure();
                last_error = Some(FetchError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                FetchError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
            })?;
            let closes = Self::parse_response(ticker, chart)?;
            self.breaker.record_success();
            return Ok(closes);
        }

        Err(last_error.unwrap_or_else(|| FetchError::Other("max retries exceeded".into())))
    }
}

impl PriceHistoryProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_closes(&self, ticker: &str, days: u32) -> Result<PriceSeries, FetchError> {
        self.fetch_with_retry(ticker, days).map(PriceSeries::new)
    }
}
