#![deny(missing_docs)]

//! Schemas and the fixed-width record codec for census tables.
//!
//! Every census table is described by a [`Schema`]: an ordered list of numeric fields. A
//! [`Record`] of that table is stored as `L = 8 + 2 * 10 + 4 * fields` bytes: the record id, the
//! ten UTF-16 units of its [`ZoneCode`] and one signed 32-bit integer per measure, all
//! big-endian. The byte layout carries no header, so readers must know the schema out-of-band.
//!
//! Source text differs by region, so each table also carries one [`TextLayout`] per
//! [`Region`] describing which text columns feed which measure.

pub use layout::*;
pub use record::*;
pub use schema::*;
pub use table::*;
pub use zone::*;

pub mod catalog;
mod codec;
mod layout;
mod record;
mod schema;
mod table;
mod zone;
