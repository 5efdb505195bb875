//! IRC message model and wire conversions.

mod parse;
mod serialize;
mod types;

pub use self::types::Message;
