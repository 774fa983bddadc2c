//! Data models for return records.
//!
//! Nothing here is tied to a particular CSV layout: a [`Record`] is an ordered
//! set of named [`Value`]s and a [`RecordSet`] is whatever the live `returns`
//! table currently holds.

mod record;
mod summary;
mod value;


pub use record::{Record, RecordSet};
pub use summary::LoadSummary;
pub use value::Value;
