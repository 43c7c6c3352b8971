//! Coordinate enumeration for multi-dimensional PLC arrays.
//!
//! PLC arrays are declared with an explicit range per dimension
//! (`ARRAY[1..10, 0..3] OF INT`), and their elements are addressed in tag
//! names with a bracketed suffix (`Name[4,2]`). This module walks every
//! coordinate of such a range in row-major order and converts between
//! coordinates and element tag names.
//!
//! # Example
//!
//! ```
//! use plc_marshal::{element_name, enumerate, parse_coordinate};
//!
//! let all: Vec<_> = enumerate(&[0, 1], &[1, 2]).unwrap().collect();
//! assert_eq!(all, vec![vec![0, 1], vec![0, 2], vec![1, 1], vec![1, 2]]);
//!
//! let name = element_name("Line.Stations", &[3, 1]);
//! assert_eq!(name, "Line.Stations[3,1]");
//! assert_eq!(parse_coordinate(&name).unwrap(), vec![3, 1]);
//! ```

use std::{fmt::Write as _, iter::FusedIterator};

use crate::{Error, Result, cold_path};

/// A position inside an array, one component per dimension.
pub type Coordinate = Vec<i32>;

/// Enumerates every coordinate between `lower_bounds` and `upper_bounds`
/// (both inclusive), last dimension fastest.
///
/// Each yielded coordinate is an owned copy the caller may keep. Use
/// [`CoordinateCursor`] to walk the same sequence without allocating per
/// step.
///
/// A rank of zero, or any dimension whose upper bound lies below its lower
/// bound, gives an empty sequence.
///
/// # Errors
///
/// Returns [`Error::Argument`] when the two slices differ in length, or when
/// the range holds more coordinates than `usize` can count.
pub fn enumerate(lower_bounds: &[i32], upper_bounds: &[i32]) -> Result<Coordinates> {
    Ok(Coordinates {
        cursor: CoordinateCursor::new(lower_bounds, upper_bounds)?,
    })
}

/// Zero-copy walk over the coordinates of an array range.
///
/// The cursor reuses one buffer for every step. The slice returned by
/// [`advance`](CoordinateCursor::advance) is only valid until the next
/// call; copy it to keep it.
#[derive(Clone, Debug)]
pub struct CoordinateCursor {
    lower: Box<[i32]>,
    upper: Box<[i32]>,
    current: Box<[i32]>,
    remaining: usize,
    started: bool,
}

impl CoordinateCursor {
    pub fn new(lower_bounds: &[i32], upper_bounds: &[i32]) -> Result<Self> {
        if lower_bounds.len() != upper_bounds.len() {
            cold_path();
            return Err(Error::Argument(format!(
                "{} lower bounds but {} upper bounds",
                lower_bounds.len(),
                upper_bounds.len()
            )));
        }
        let mut remaining = usize::from(!lower_bounds.is_empty());
        for (&lower, &upper) in lower_bounds.iter().zip(upper_bounds) {
            let Some(product) = remaining.checked_mul(extent(lower, upper)) else {
                cold_path();
                return Err(Error::Argument(format!(
                    "coordinate range {lower_bounds:?}..={upper_bounds:?} has too many elements"
                )));
            };
            remaining = product;
        }
        Ok(Self::with_count(lower_bounds, upper_bounds, remaining))
    }

    fn with_count(lower_bounds: &[i32], upper_bounds: &[i32], remaining: usize) -> Self {
        Self {
            lower: lower_bounds.into(),
            upper: upper_bounds.into(),
            current: lower_bounds.into(),
            remaining,
            started: false,
        }
    }

    /// Steps to the next coordinate.
    pub fn advance(&mut self) -> Option<&[i32]> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if !self.started {
            self.started = true;
            return Some(&self.current);
        }
        // increment the last dimension, carrying into the more significant ones
        let mut dimension = self.current.len();
        while dimension > 0 {
            dimension -= 1;
            if self.current[dimension] < self.upper[dimension] {
                self.current[dimension] += 1;
                break;
            }
            self.current[dimension] = self.lower[dimension];
        }
        Some(&self.current)
    }

    pub fn rank(&self) -> usize {
        self.lower.len()
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

/// Owning iterator returned by [`enumerate`].
#[derive(Clone, Debug)]
pub struct Coordinates {
    cursor: CoordinateCursor,
}

impl Coordinates {
    /// Callers guarantee both slices have the same length and that `count`
    /// is the number of coordinates between them.
    pub(crate) fn within(lower_bounds: &[i32], upper_bounds: &[i32], count: usize) -> Self {
        debug_assert_eq!(lower_bounds.len(), upper_bounds.len());
        Self {
            cursor: CoordinateCursor::with_count(lower_bounds, upper_bounds, count),
        }
    }
}

impl Iterator for Coordinates {
    type Item = Coordinate;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance().map(<[i32]>::to_vec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl ExactSizeIterator for Coordinates {}

impl FusedIterator for Coordinates {}

/// Number of indices in `lower..=upper`, zero when the range is empty.
pub(crate) fn extent(lower: i32, upper: i32) -> usize {
    if upper < lower {
        0
    } else {
        (upper as i64 - lower as i64 + 1) as usize
    }
}

/// Reads the bracketed index suffix of a tag name.
///
/// `"Foo.Bar[5,3]"` gives `[5, 3]`. Only the trailing bracket group is read,
/// so `"Line[1].Axis[2]"` gives `[2]`. Bounds are not checked.
///
/// # Errors
///
/// Returns [`Error::Format`] if the name has no `[`, the group is not closed,
/// anything follows the closing `]`, or a component is not an integer.
pub fn parse_coordinate(tag_name: &str) -> Result<Coordinate> {
    let Some(open) = tag_name.rfind('[') else {
        cold_path();
        return Err(Error::format(tag_name, "no index suffix"));
    };
    let rest = &tag_name[open + 1..];
    let Some(close) = rest.find(']') else {
        cold_path();
        return Err(Error::format(tag_name, "missing closing bracket"));
    };
    if close + 1 != rest.len() {
        cold_path();
        return Err(Error::format(tag_name, "characters after closing bracket"));
    }
    rest[..close]
        .split(',')
        .map(|component| {
            let component = component.trim();
            if component.is_empty() {
                cold_path();
                return Err(Error::format(tag_name, "empty index"));
            }
            component.parse::<i32>().map_err(|_| {
                cold_path();
                Error::format(tag_name, "index is not an integer")
            })
        })
        .collect()
}

/// Builds the tag name of one array element, `Base[i,j,k]`.
pub fn element_name(base: &str, coordinate: &[i32]) -> String {
    let mut name = String::with_capacity(base.len() + 2 + coordinate.len() * 3);
    name.push_str(base);
    name.push('[');
    for (i, index) in coordinate.iter().enumerate() {
        if i > 0 {
            name.push(',');
        }
        let _ = write!(name, "{index}");
    }
    name.push(']');
    name
}
