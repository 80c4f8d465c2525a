//! Braid Hash - Partition Hash Space Arithmetic
//!
//! Fixed-width unsigned integer arithmetic over the 128-bit partition
//! addressing space. One bit is reserved as an overflow guard, leaving
//! 127 usable bits: every value satisfies `0 <= v <= HashValue::MAX`.
//!
//! Partition keys are hashed into this space and compared against the
//! `[min_inclusive, max_exclusive)` boundaries of partition ranges to
//! decide which partition owns a document.

mod error;
mod value;

pub use error::HashError;
pub use value::HashValue;
