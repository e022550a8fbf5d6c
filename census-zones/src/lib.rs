#![deny(missing_docs)]

//! The census zone hierarchy.
//!
//! Output Areas roll up into Wards and into Middle-layer Super Output Areas. A Ward is named by
//! a prefix of its Output Area codes, so [`ward_of`] is a pure function. MSOA membership has to
//! be looked up in a national table; [`ZoneCache`] parses that table once and keeps the parsed
//! mapping beside it on disk, and [`ZoneHierarchy`] loads it on first use.

pub use cache::*;
pub use hierarchy::*;
pub use lookup::*;

mod cache;
mod hierarchy;
mod lookup;
