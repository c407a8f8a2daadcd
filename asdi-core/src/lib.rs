//! asdi-core: Pure decode + route resolution library for ASDI feed messages.
//!
//! No async and no I/O beyond loading config and navigation data files. Just
//! algorithms. This crate is the shared core used by the `asdi` CLI.

pub mod config;
pub mod fields;
pub mod geo;
pub mod message;
pub mod nav;
pub mod route;
pub mod types;

// Re-export commonly used types at crate root
pub use geo::GreatCircle;
pub use message::{decode_line, FieldId, Message, MessageBody, MessageType};
pub use nav::{Airway, DistanceCalculator, Fix, NavDatabase, NavigationLookup, Route, Sid, Star};
pub use route::{resolve, Resolution, RouteError, RouteParser, SkipReason, Skipped};
pub use types::*;
