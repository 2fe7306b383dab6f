//! Units of measure and conversions between them.
//!
//! Pure arithmetic over [`Uom`] records; lookups are the caller's business.

pub mod convert;
pub mod uom;

pub use convert::{compute_price, compute_quantity, float_round};
pub use uom::{Uom, UomCategory, UomType};
