//! Decode raw ASDI feed lines into typed NAS messages.
//!
//! Line layout: `SSSSddhhmmssFFFFTT <fields...>`
//! - `SSSS`     sequence number, 4 hex digits
//! - `ddhhmmss` day, hour, minute, second (decimal)
//! - `FFFF`     facility code
//! - `TT`       message type
//!
//! The fields after the type are whitespace separated and positional. Each
//! message type has a fixed field order; a line may stop early, in which case
//! the trailing fields are absent.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::fields::{self, FlightId};
use crate::types::{AsdiError, Result};

/// Header width: sequence + day/hour/minute/second + facility.
pub const HEADER_LEN: usize = 16;

/// Header plus the two-character message type.
pub const PREFIX_LEN: usize = HEADER_LEN + 2;

// ---------------------------------------------------------------------------
// Field ids
// ---------------------------------------------------------------------------

/// NAS field identifiers. Numbers below 20 follow NAS field numbering; the
/// ASDI-specific fields are numbered from 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldId {
    FlightId,
    AircraftData,
    Speed,
    CoordinationFix,
    CoordinationTime,
    Altitude,
    Route,
    DeparturePoint,
    Destination,
    DepartureTime,
    ArrivalTime,
    EstimatedArrival,
    BoundaryFix,
    BoundaryTime,
    Position,
    ReportTime,
    AmendmentField,
    AmendmentData,
}

impl FieldId {
    pub const ALL: &'static [FieldId] = &[
        FieldId::FlightId,
        FieldId::AircraftData,
        FieldId::Speed,
        FieldId::CoordinationFix,
        FieldId::CoordinationTime,
        FieldId::Altitude,
        FieldId::Route,
        FieldId::DeparturePoint,
        FieldId::Destination,
        FieldId::DepartureTime,
        FieldId::ArrivalTime,
        FieldId::EstimatedArrival,
        FieldId::BoundaryFix,
        FieldId::BoundaryTime,
        FieldId::Position,
        FieldId::ReportTime,
        FieldId::AmendmentField,
        FieldId::AmendmentData,
    ];

    pub const fn number(self) -> u8 {
        match self {
            FieldId::FlightId => 2,
            FieldId::AircraftData => 3,
            FieldId::Speed => 5,
            FieldId::CoordinationFix => 6,
            FieldId::CoordinationTime => 7,
            FieldId::Altitude => 8,
            FieldId::Route => 10,
            FieldId::DeparturePoint => 20,
            FieldId::Destination => 21,
            FieldId::DepartureTime => 22,
            FieldId::ArrivalTime => 23,
            FieldId::EstimatedArrival => 24,
            FieldId::BoundaryFix => 25,
            FieldId::BoundaryTime => 26,
            FieldId::Position => 27,
            FieldId::ReportTime => 28,
            FieldId::AmendmentField => 29,
            FieldId::AmendmentData => 30,
        }
    }

    pub fn from_number(n: u8) -> Option<FieldId> {
        FieldId::ALL.iter().copied().find(|f| f.number() == n)
    }
}

// ---------------------------------------------------------------------------
// Per-type field sets
// ---------------------------------------------------------------------------

/// Declare a message body struct together with its field layout. The struct
/// field order is the on-the-wire token order.
macro_rules! field_set {
    ($(#[$meta:meta])* $name:ident { $($field:ident => $id:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct $name {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<String>,
            )*
        }

        impl $name {
            /// Field order on the wire.
            pub const LAYOUT: &'static [FieldId] = &[$(FieldId::$id),*];

            #[allow(unused_variables)]
            fn from_tokens<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Self {
                $name {
                    $($field: tokens.next().map(str::to_string),)*
                }
            }

            /// Raw field text, or `None` if absent or not part of this type.
            pub fn get(&self, id: FieldId) -> Option<&str> {
                match id {
                    $(FieldId::$id => self.$field.as_deref(),)*
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    };
}

field_set! {
    /// AF: flight plan amendment.
    AmendmentMsg {
        flight_id => FlightId,
        departure_point => DeparturePoint,
        destination => Destination,
        amendment_field => AmendmentField,
        amendment_data => AmendmentData,
    }
}

field_set! {
    /// AZ: arrival.
    ArrivalMsg {
        flight_id => FlightId,
        aircraft_data => AircraftData,
        departure_point => DeparturePoint,
        destination => Destination,
        arrival_time => ArrivalTime,
    }
}

field_set! {
    /// DZ: departure.
    DepartureMsg {
        flight_id => FlightId,
        aircraft_data => AircraftData,
        departure_point => DeparturePoint,
        departure_time => DepartureTime,
        destination => Destination,
        estimated_arrival => EstimatedArrival,
    }
}

field_set! {
    /// FZ: filed flight plan.
    FlightPlanMsg {
        flight_id => FlightId,
        aircraft_data => AircraftData,
        speed => Speed,
        coordination_fix => CoordinationFix,
        coordination_time => CoordinationTime,
        altitude => Altitude,
        route => Route,
    }
}

field_set! {
    /// RZ: flight plan cancellation.
    CancellationMsg {
        flight_id => FlightId,
        aircraft_data => AircraftData,
        departure_point => DeparturePoint,
        destination => Destination,
    }
}

field_set! {
    /// TZ: track position report.
    TrackMsg {
        flight_id => FlightId,
        speed => Speed,
        altitude => Altitude,
        position => Position,
    }
}

field_set! {
    /// UZ: boundary crossing update.
    BoundaryCrossingMsg {
        flight_id => FlightId,
        aircraft_data => AircraftData,
        speed => Speed,
        boundary_fix => BoundaryFix,
        boundary_time => BoundaryTime,
        altitude => Altitude,
        route => Route,
    }
}

field_set! {
    /// RT: reroute.
    RerouteMsg {
        flight_id => FlightId,
        aircraft_data => AircraftData,
        departure_point => DeparturePoint,
        destination => Destination,
        route => Route,
    }
}

field_set! {
    /// TO: oceanic position report.
    OceanicReportMsg {
        flight_id => FlightId,
        report_time => ReportTime,
        position => Position,
        altitude => Altitude,
    }
}

field_set! {
    /// HB: heartbeat. Carries no fields.
    HeartbeatMsg {}
}

// ---------------------------------------------------------------------------
// Message type
// ---------------------------------------------------------------------------

/// The supported two-letter message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageType {
    AF,
    AZ,
    DZ,
    FZ,
    RZ,
    TZ,
    UZ,
    RT,
    TO,
    HB,
}

impl MessageType {
    pub const ALL: &'static [MessageType] = &[
        MessageType::AF,
        MessageType::AZ,
        MessageType::DZ,
        MessageType::FZ,
        MessageType::RZ,
        MessageType::TZ,
        MessageType::UZ,
        MessageType::RT,
        MessageType::TO,
        MessageType::HB,
    ];

    pub fn from_code(code: &str) -> Option<MessageType> {
        MessageType::ALL.iter().copied().find(|t| t.code() == code)
    }

    pub const fn code(self) -> &'static str {
        match self {
            MessageType::AF => "AF",
            MessageType::AZ => "AZ",
            MessageType::DZ => "DZ",
            MessageType::FZ => "FZ",
            MessageType::RZ => "RZ",
            MessageType::TZ => "TZ",
            MessageType::UZ => "UZ",
            MessageType::RT => "RT",
            MessageType::TO => "TO",
            MessageType::HB => "HB",
        }
    }

    /// Ordered field layout for this type.
    pub const fn layout(self) -> &'static [FieldId] {
        match self {
            MessageType::AF => AmendmentMsg::LAYOUT,
            MessageType::AZ => ArrivalMsg::LAYOUT,
            MessageType::DZ => DepartureMsg::LAYOUT,
            MessageType::FZ => FlightPlanMsg::LAYOUT,
            MessageType::RZ => CancellationMsg::LAYOUT,
            MessageType::TZ => TrackMsg::LAYOUT,
            MessageType::UZ => BoundaryCrossingMsg::LAYOUT,
            MessageType::RT => RerouteMsg::LAYOUT,
            MessageType::TO => OceanicReportMsg::LAYOUT,
            MessageType::HB => HeartbeatMsg::LAYOUT,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Message body, one variant per message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum MessageBody {
    #[serde(rename = "AF")]
    Amendment(AmendmentMsg),
    #[serde(rename = "AZ")]
    Arrival(ArrivalMsg),
    #[serde(rename = "DZ")]
    Departure(DepartureMsg),
    #[serde(rename = "FZ")]
    FlightPlan(FlightPlanMsg),
    #[serde(rename = "RZ")]
    Cancellation(CancellationMsg),
    #[serde(rename = "TZ")]
    Track(TrackMsg),
    #[serde(rename = "UZ")]
    BoundaryCrossing(BoundaryCrossingMsg),
    #[serde(rename = "RT")]
    Reroute(RerouteMsg),
    #[serde(rename = "TO")]
    OceanicReport(OceanicReportMsg),
    #[serde(rename = "HB")]
    Heartbeat(HeartbeatMsg),
}

impl MessageBody {
    fn from_tokens<'a>(
        mtype: MessageType,
        tokens: &mut impl Iterator<Item = &'a str>,
    ) -> MessageBody {
        match mtype {
            MessageType::AF => MessageBody::Amendment(AmendmentMsg::from_tokens(tokens)),
            MessageType::AZ => MessageBody::Arrival(ArrivalMsg::from_tokens(tokens)),
            MessageType::DZ => MessageBody::Departure(DepartureMsg::from_tokens(tokens)),
            MessageType::FZ => MessageBody::FlightPlan(FlightPlanMsg::from_tokens(tokens)),
            MessageType::RZ => MessageBody::Cancellation(CancellationMsg::from_tokens(tokens)),
            MessageType::TZ => MessageBody::Track(TrackMsg::from_tokens(tokens)),
            MessageType::UZ => {
                MessageBody::BoundaryCrossing(BoundaryCrossingMsg::from_tokens(tokens))
            }
            MessageType::RT => MessageBody::Reroute(RerouteMsg::from_tokens(tokens)),
            MessageType::TO => MessageBody::OceanicReport(OceanicReportMsg::from_tokens(tokens)),
            MessageType::HB => MessageBody::Heartbeat(HeartbeatMsg::from_tokens(tokens)),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::Amendment(_) => MessageType::AF,
            MessageBody::Arrival(_) => MessageType::AZ,
            MessageBody::Departure(_) => MessageType::DZ,
            MessageBody::FlightPlan(_) => MessageType::FZ,
            MessageBody::Cancellation(_) => MessageType::RZ,
            MessageBody::Track(_) => MessageType::TZ,
            MessageBody::BoundaryCrossing(_) => MessageType::UZ,
            MessageBody::Reroute(_) => MessageType::RT,
            MessageBody::OceanicReport(_) => MessageType::TO,
            MessageBody::Heartbeat(_) => MessageType::HB,
        }
    }

    /// Raw text of a field, `None` if this type does not carry it.
    pub fn get(&self, id: FieldId) -> Option<&str> {
        match self {
            MessageBody::Amendment(m) => m.get(id),
            MessageBody::Arrival(m) => m.get(id),
            MessageBody::Departure(m) => m.get(id),
            MessageBody::FlightPlan(m) => m.get(id),
            MessageBody::Cancellation(m) => m.get(id),
            MessageBody::Track(m) => m.get(id),
            MessageBody::BoundaryCrossing(m) => m.get(id),
            MessageBody::Reroute(m) => m.get(id),
            MessageBody::OceanicReport(m) => m.get(id),
            MessageBody::Heartbeat(m) => m.get(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One decoded feed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub sequence: u16,
    pub timestamp: DateTime<Utc>,
    pub facility: String,
    pub body: MessageBody,
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn field(&self, id: FieldId) -> Option<&str> {
        self.body.get(id)
    }

    pub fn flight_id(&self) -> Option<FlightId> {
        self.field(FieldId::FlightId).map(fields::flight_id)
    }

    pub fn aircraft_type(&self) -> Option<String> {
        self.field(FieldId::AircraftData)
            .and_then(fields::aircraft_type)
    }

    /// Ground speed in meters per millisecond.
    pub fn ground_speed(&self) -> Option<f64> {
        self.field(FieldId::Speed).map(fields::ground_speed)
    }

    /// Assigned altitude in meters.
    pub fn altitude(&self) -> Option<f64> {
        self.field(FieldId::Altitude).map(fields::altitude)
    }

    /// `(latitude, longitude)` in signed decimal degrees.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.field(FieldId::Position).and_then(fields::position)
    }

    /// Coordination time on the message's own date.
    pub fn coordination_time(&self) -> Option<DateTime<Utc>> {
        let ts = self.timestamp;
        self.field(FieldId::CoordinationTime)
            .and_then(|f| fields::coordination_time(ts.year(), ts.month(), ts.day(), f))
    }

    /// Route description text, if this message carries one.
    ///
    /// An AF amendment carries a route when its amended field number is 10.
    pub fn route_text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Amendment(m) => {
                let amended = m.amendment_field.as_deref()?.parse::<u8>().ok()?;
                if FieldId::from_number(amended) == Some(FieldId::Route) {
                    m.amendment_data.as_deref()
                } else {
                    None
                }
            }
            body => body.get(FieldId::Route),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one raw feed line.
///
/// The header timestamp has no year or month; `year` and `month` supply them.
pub fn decode_line(line: &str, year: i32, month: u32) -> Result<Message> {
    let line = line.trim_end();
    if line.len() < PREFIX_LEN {
        return Err(AsdiError::Truncated {
            expected: PREFIX_LEN,
            actual: line.len(),
        });
    }

    let slice = |range: std::ops::Range<usize>, name: &'static str| {
        line.get(range).ok_or(AsdiError::InvalidHeader(name))
    };
    let decimal = |range: std::ops::Range<usize>, name: &'static str| -> Result<u32> {
        let s = slice(range, name)?;
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AsdiError::InvalidHeader(name));
        }
        s.parse().map_err(|_| AsdiError::InvalidHeader(name))
    };

    let sequence = slice(0..4, "sequence")?;
    if !sequence.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AsdiError::InvalidHeader("sequence"));
    }
    let sequence =
        u16::from_str_radix(sequence, 16).map_err(|_| AsdiError::InvalidHeader("sequence"))?;
    let day = decimal(4..6, "day")?;
    let hour = decimal(6..8, "hour")?;
    let minute = decimal(8..10, "minute")?;
    let second = decimal(10..12, "second")?;
    let facility = slice(12..16, "facility")?.to_string();
    let code = slice(HEADER_LEN..PREFIX_LEN, "type")?;

    let timestamp = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .map(|dt| dt.and_utc())
        .ok_or(AsdiError::InvalidTimestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })?;

    let mtype = MessageType::from_code(code).ok_or_else(|| {
        debug!(sequence, code, "unknown message type");
        AsdiError::UnknownMessageType(code.to_string())
    })?;

    let mut tokens = line[PREFIX_LEN..].split_whitespace();
    let body = MessageBody::from_tokens(mtype, &mut tokens);

    Ok(Message {
        sequence,
        timestamp,
        facility,
        body,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
