//! Display implementations and wrappers.
//!
//! Output is markdown so the CLI can render it richly or print it as plain
//! text.
//!
//! - [`records`]: record sets as markdown tables, single records as key lists
//! - [`results`]: load, report and dispatch outcomes

mod records;
mod results;

pub use records::Extracted;
