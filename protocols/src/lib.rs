//! Wire formats spoken by test accessories.

pub mod accessory;

pub use accessory::{format_record, parse_response};
