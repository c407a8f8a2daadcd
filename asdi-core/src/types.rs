//! Shared error enum, result alias, and unit constants for asdi-core.

use thiserror::Error;

/// All errors produced by asdi-core outside of route resolution.
#[derive(Debug, Error)]
pub enum AsdiError {
    #[error("line too short: expected at least {expected} chars, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("invalid header field: {0}")]
    InvalidHeader(&'static str),
    #[error("invalid timestamp: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidTimestamp {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    },
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("navigation data error: {0}")]
    NavData(String),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AsdiError>;

// ---------------------------------------------------------------------------
// Unit constants
// ---------------------------------------------------------------------------

/// Knots per Mach used by the feed's speed encoding.
pub const KNOTS_PER_MACH: f64 = 644.62216;

/// Meters per nautical mile.
pub const METERS_PER_NM: f64 = 1852.0;

/// Milliseconds per hour.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.2808;

/// Convert knots (NM/h) to meters per millisecond.
pub fn knots_to_m_per_ms(knots: f64) -> f64 {
    knots * METERS_PER_NM / MS_PER_HOUR
}

/// Convert feet to meters.
pub fn feet_to_meters(feet: f64) -> f64 {
    feet / FEET_PER_METER
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
