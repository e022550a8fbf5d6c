#![deny(missing_docs)]

//! Stream census source tables into fixed-width record stores.
//!
//! Source files are read row by row and every parsed record is appended to the target store
//! straight away. Ids are positions in the target store, so ingesting several regional files
//! through one [`Ingester`] numbers their rows as a single national sequence.

pub use ingester::*;
pub use source::*;

mod ingester;
mod source;
