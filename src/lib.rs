//! Symbol-driven marshalling between PLC tag trees and typed Rust values.
//!
//! PLC backends (ADS, OPC UA, S7 and the like) read and write scalar leaf
//! tags, while host code wants structured objects. This crate sits in
//! between:
//!
//! - [`enumerate`] and [`parse_coordinate`] deal with multi-dimensional
//!   array coordinates and element tag names,
//! - [`NonZeroBasedArray`] holds PLC arrays whose lower bounds are not zero,
//! - [`SymbolTreeWalker`] flattens a symbol tree into leaf symbols, paired
//!   with the matching part of a [`Value`] when writing, and assembles leaf
//!   values back into a [`Value`] when reading,
//! - [`to_value`] and [`from_value`] convert between [`Value`] and any
//!   serde type, and [`TypeActivatorRegistry`] builds types that describe
//!   their own constructors and properties through [`Activate`].

pub mod activator;
pub mod array;
pub mod config;
pub mod de;
mod error;
mod index;
pub mod sequencer;
pub mod ser;
pub mod symbol;
mod tag;
mod util;
pub mod value;
pub mod walker;

pub use activator::*;
pub use array::NonZeroBasedArray;
pub use config::*;
pub use de::from_value;
pub use error::*;
pub use index::*;
pub use sequencer::*;
pub use ser::to_value;
pub use symbol::*;
pub use tag::*;
pub use util::short_name_of;
pub(crate) use util::cold_path;
pub use value::*;
pub use walker::*;
