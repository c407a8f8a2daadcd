//! Single-field decoders for NAS message fields.
//!
//! Every decoder is total: malformed input yields 0 or `None`, never an
//! error. The feed is noisy and a bad sub-field should not cost the caller
//! the rest of the message.
//!
//! - Flight id:      `AAL123/1234` → aircraft id + computer id
//! - Aircraft data:  `H/B744/F` → type designator
//! - Ground speed:   `M085` (Mach hundredths) or `480` (knots) → m/ms
//! - Altitude:       `310`, `310T`, `OTP/310`, `300B320` → meters
//! - Position:       `4230N/07530W` → signed decimal degrees
//! - Coordination:   `P15` + date → instant at the top of that hour

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::types::{feet_to_meters, knots_to_m_per_ms, KNOTS_PER_MACH};

// ---------------------------------------------------------------------------
// Flight id
// ---------------------------------------------------------------------------

/// Decoded flight id field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightId {
    pub aircraft_id: String,
    pub computer_id: Option<String>,
}

/// Split a flight id on the first `/` into aircraft id and computer id.
pub fn flight_id(field: &str) -> FlightId {
    match field.split_once('/') {
        Some((acid, cid)) => FlightId {
            aircraft_id: acid.to_string(),
            computer_id: Some(cid.to_string()),
        },
        None => FlightId {
            aircraft_id: field.to_string(),
            computer_id: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Aircraft data
// ---------------------------------------------------------------------------

/// Extract the aircraft type designator from an aircraft data field.
///
/// Handles a leading count (`2/F16`) or weight class (`H/B744`) and a
/// trailing equipment suffix (`B738/L`).
pub fn aircraft_type(field: &str) -> Option<String> {
    let parts: Vec<&str> = field.split('/').collect();
    let designator = match parts.as_slice() {
        [first, second, ..]
            if first.len() == 1 || first.bytes().all(|b| b.is_ascii_digit()) =>
        {
            second
        }
        [first, ..] => first,
        [] => return None,
    };
    if designator.is_empty() {
        None
    } else {
        Some(designator.to_string())
    }
}

// ---------------------------------------------------------------------------
// Ground speed
// ---------------------------------------------------------------------------

/// Decode a speed field to knots. Unparseable input gives 0.
pub fn ground_speed_knots(field: &str) -> f64 {
    if let Some(mach) = field.strip_prefix('M') {
        return match mach.parse::<u32>() {
            Ok(hundredths) if is_digits(mach) => hundredths as f64 / 100.0 * KNOTS_PER_MACH,
            _ => 0.0,
        };
    }
    if !(2..=4).contains(&field.len()) || !is_digits(field) {
        return 0.0;
    }
    field.parse::<u32>().map(|v| v as f64).unwrap_or(0.0)
}

/// Decode a speed field to meters per millisecond.
pub fn ground_speed(field: &str) -> f64 {
    knots_to_m_per_ms(ground_speed_knots(field))
}

// ---------------------------------------------------------------------------
// Altitude
// ---------------------------------------------------------------------------

/// Decode an altitude field to hundreds of feet.
///
/// Accepted shapes: `dd`/`ddd`, `dddT`/`dddC`, `OTP/ddd`, `dddBddd`
/// (block altitude, mean of the two bounds). Everything else gives 0.
pub fn altitude_hundreds(field: &str) -> f64 {
    let b = field.as_bytes();
    match b.len() {
        2 | 3 => parse_digits(field),
        4 if matches!(b[3], b'T' | b'C') => parse_digits(&field[..3]),
        7 if field.starts_with("OTP/") => parse_digits(&field[4..]),
        7 if b[3] == b'B' => match (parse_u32(&field[..3]), parse_u32(&field[4..])) {
            (Some(low), Some(high)) => (low + high) as f64 / 2.0,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// Decode an altitude field to meters.
pub fn altitude(field: &str) -> f64 {
    feet_to_meters(altitude_hundreds(field) * 100.0)
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Latitude from a track position string (`ddmmN...`), south negative.
pub fn latitude(track: &str) -> Option<f64> {
    let deg = parse_u32(track.get(0..2)?)?;
    let min = parse_u32(track.get(2..4)?)?;
    let sign = match track.get(4..5)? {
        "N" => 1.0,
        "S" => -1.0,
        _ => return None,
    };
    Some(sign * (deg as f64 + min as f64 / 60.0))
}

/// Longitude from a track position string (`ddmmN/dddmmW`), west negative.
pub fn longitude(track: &str) -> Option<f64> {
    let deg = parse_u32(track.get(6..9)?)?;
    let min = parse_u32(track.get(9..11)?)?;
    let sign = match track.get(11..12)? {
        "E" => 1.0,
        "W" => -1.0,
        _ => return None,
    };
    Some(sign * (deg as f64 + min as f64 / 60.0))
}

/// Decode both halves of a track position string.
pub fn position(track: &str) -> Option<(f64, f64)> {
    Some((latitude(track)?, longitude(track)?))
}

// ---------------------------------------------------------------------------
// Coordination time
// ---------------------------------------------------------------------------

/// Build the instant named by an hour-only time field on the given date.
///
/// Leading letters (`P`, `E`, `D`...) are annotation and are skipped; the
/// next two digits are the hour. Minutes and seconds are zero.
pub fn coordination_time(year: i32, month: u32, day: u32, field: &str) -> Option<DateTime<Utc>> {
    let digits = field.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let hour = parse_u32(digits.get(0..2)?)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)?;
    Some(naive.and_utc())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_u32(s: &str) -> Option<u32> {
    if is_digits(s) {
        s.parse().ok()
    } else {
        None
    }
}

fn parse_digits(s: &str) -> f64 {
    parse_u32(s).map(|v| v as f64).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
