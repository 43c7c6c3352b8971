//! Error types for symbol walking, array access and type activation.
//!
//! This module contains the [`Error`] type which represents all possible errors
//! that can occur while marshalling between a PLC symbol tree and host values.
//!
//! # Example
//!
//! ```
//! use plc_marshal::{parse_coordinate, Error, Result};
//!
//! fn element_index(tag: &str) -> Result<Vec<i32>> {
//!     match parse_coordinate(tag) {
//!         Ok(coordinate) => Ok(coordinate),
//!         Err(Error::Format { input, reason }) => {
//!             println!("bad tag name {input}: {reason}");
//!             Err(Error::Format { input, reason })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//!
//! assert_eq!(element_index("Motor.Speeds[2,1]").unwrap(), vec![2, 1]);
//! ```

use std::fmt::{self, Display};

use serde::{de, ser};

use crate::ValueKind;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// This type represents all possible errors that can occur when flattening a
/// symbol tree, indexing a PLC array or activating a host type.
///
/// None of these errors are retried by the crate. They are raised to the
/// immediate caller, and a failed activation never hands out a partially
/// populated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A custom message raised through serde.
    Message(String),

    /// A symbol name could not be resolved.
    ///
    /// Usually a stale symbol table or a typo in a tag name.
    SymbolNotFound(String),

    /// An index suffix could not be parsed.
    Format { input: String, reason: &'static str },

    /// An index lies outside the declared bounds of one array dimension.
    IndexOutOfRange { index: i32, lower: i32, upper: i32 },

    /// Rank or shape of the arguments does not match the array.
    Argument(String),

    /// A required constructor parameter or property had no value.
    MissingMember(String),

    /// Neither activation strategy accepts the supplied member count.
    ShapeMismatch {
        type_name: &'static str,
        member_count: usize,
        constructor_params: Option<usize>,
        properties: usize,
    },

    /// A constructor parameter has no usable name and no property strategy
    /// applies.
    UnsupportedShape(&'static str),

    /// A value of one kind was found where another was expected.
    TypeMismatch {
        expected: &'static str,
        actual: ValueKind,
    },

    /// The symbol tree is nested deeper than the configured limit.
    DepthLimit(usize),
}

impl Error {
    pub(crate) fn format(input: &str, reason: &'static str) -> Self {
        Error::Format {
            input: input.to_owned(),
            reason,
        }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingMember(field.to_owned())
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(message) => formatter.write_str(message),
            Error::SymbolNotFound(name) => write!(formatter, "symbol not found: {name}"),
            Error::Format { input, reason } => {
                write!(formatter, "invalid index suffix in {input:?}: {reason}")
            }
            Error::IndexOutOfRange {
                index,
                lower,
                upper,
            } => write!(
                formatter,
                "index {index} out of range: expected {lower}..={upper}"
            ),
            Error::Argument(message) => write!(formatter, "invalid argument: {message}"),
            Error::MissingMember(name) => write!(formatter, "no value for member {name:?}"),
            Error::ShapeMismatch {
                type_name,
                member_count,
                constructor_params,
                properties,
            } => {
                write!(
                    formatter,
                    "cannot activate {type_name} from {member_count} members: "
                )?;
                match constructor_params {
                    Some(params) => write!(formatter, "constructor takes {params}, ")?,
                    None => formatter.write_str("no constructor, ")?,
                }
                write!(formatter, "{properties} writable properties")
            }
            Error::UnsupportedShape(type_name) => write!(
                formatter,
                "constructor of {type_name} has an unnamed parameter"
            ),
            Error::TypeMismatch { expected, actual } => {
                write!(formatter, "type mismatch: expected {expected}, got {actual}")
            }
            Error::DepthLimit(depth) => {
                write!(formatter, "symbol tree deeper than {depth} levels")
            }
        }
    }
}

impl std::error::Error for Error {}
