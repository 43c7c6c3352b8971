//! Arrays indexed in the PLC's native coordinate space.
//!
//! IEC 61131-3 arrays carry an explicit lower bound per dimension, and
//! `ARRAY[1..10] OF REAL` is at least as common as a zero-based one.
//! [`NonZeroBasedArray`] keeps that origin, so element `[1]` on the PLC is
//! element `[1]` on the host:
//!
//! ```
//! use plc_marshal::NonZeroBasedArray;
//!
//! let mut speeds = NonZeroBasedArray::<f32>::new(&[3], &[1]).unwrap();
//! speeds.set(&[1], 12.5).unwrap();
//! speeds.set_linear(3, 7.0).unwrap();
//!
//! assert_eq!(speeds.get(&[1]).unwrap(), &12.5);
//! assert!(speeds.get(&[0]).is_err());
//! assert_eq!(speeds.as_slice(), &[12.5, 0.0, 7.0]);
//! ```
//!
//! # Serde
//!
//! The array serializes as a struct with its bounds, lengths and elements
//! in storage order. [`to_value`](crate::to_value) recognises it and
//! produces a [`Value::Array`](crate::Value::Array) with the same bounds,
//! and [`from_value`](crate::from_value) restores it. It also deserializes
//! from a plain sequence, which gives a zero-based rank 1 array.

use std::{fmt, marker::PhantomData, slice};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::SerializeStruct,
};

use crate::{Coordinates, Error, Result, cold_path, sequencer::extent};

/// Struct name under which arrays travel through serde.
pub(crate) const ARRAY_TOKEN: &str = "$plc_marshal::NonZeroBasedArray";
pub(crate) const ARRAY_FIELDS: &[&str] = &["lower_bounds", "lengths", "elements"];

/// A dense, fixed-shape array with a lower bound per dimension.
///
/// Elements are stored row-major (last dimension contiguous), the same order
/// [`enumerate`](crate::enumerate) produces coordinates in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NonZeroBasedArray<T> {
    data: Vec<T>,
    lengths: Box<[usize]>,
    lower_bounds: Box<[i32]>,
}

impl<T: Default + Clone> NonZeroBasedArray<T> {
    /// Allocates an array of default elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if `lengths` and `lower_bounds` differ in
    /// length, or the shape does not fit (see [`from_vec`](Self::from_vec)).
    pub fn new(lengths: &[usize], lower_bounds: &[i32]) -> Result<Self> {
        let count = check_shape(lengths, lower_bounds)?;
        if count.saturating_mul(size_of::<T>()) > isize::MAX as usize {
            cold_path();
            return Err(Error::Argument(format!(
                "{count} elements exceed the addressable memory"
            )));
        }
        Ok(Self {
            data: vec![T::default(); count],
            lengths: lengths.into(),
            lower_bounds: lower_bounds.into(),
        })
    }
}

impl<T> NonZeroBasedArray<T> {
    /// Wraps existing row-major storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if the ranks differ, a dimension's upper
    /// bound falls outside `i32`, the element count overflows `usize`, or
    /// `data` does not hold exactly the product of `lengths` elements.
    pub fn from_vec(data: Vec<T>, lengths: &[usize], lower_bounds: &[i32]) -> Result<Self> {
        let count = check_shape(lengths, lower_bounds)?;
        if data.len() != count {
            cold_path();
            return Err(Error::Argument(format!(
                "{} elements do not fill a shape of {count}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            lengths: lengths.into(),
            lower_bounds: lower_bounds.into(),
        })
    }

    /// A rank 1 array starting at index 0.
    pub fn zero_based(data: Vec<T>) -> Self {
        let len = data.len();
        Self {
            data,
            lengths: Box::new([len]),
            lower_bounds: Box::new([0]),
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    #[inline]
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    #[inline]
    pub fn lower_bounds(&self) -> &[i32] {
        &self.lower_bounds
    }

    /// Inclusive upper bound of `dimension`, one below the lower bound when
    /// the dimension is empty.
    ///
    /// # Panics
    ///
    /// Panics if `dimension >= self.rank()`.
    #[inline]
    pub fn upper_bound(&self, dimension: usize) -> i32 {
        (self.lower_bounds[dimension] as i64 + self.lengths[dimension] as i64 - 1) as i32
    }

    pub fn upper_bounds(&self) -> Vec<i32> {
        (0..self.rank()).map(|d| self.upper_bound(d)).collect()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Translates a native coordinate into a storage offset.
    pub fn offset(&self, indices: &[i32]) -> Result<usize> {
        if indices.len() != self.rank() {
            cold_path();
            return Err(Error::Argument(format!(
                "{} indices given for an array of rank {}",
                indices.len(),
                self.rank()
            )));
        }
        let mut offset = 0usize;
        for (dimension, &index) in indices.iter().enumerate() {
            let lower = self.lower_bounds[dimension];
            let length = self.lengths[dimension];
            let relative = index as i64 - lower as i64;
            if relative < 0 || relative >= length as i64 {
                cold_path();
                return Err(Error::IndexOutOfRange {
                    index,
                    lower,
                    upper: self.upper_bound(dimension),
                });
            }
            offset = offset * length + relative as usize;
        }
        Ok(offset)
    }

    pub fn get(&self, indices: &[i32]) -> Result<&T> {
        let offset = self.offset(indices)?;
        Ok(&self.data[offset])
    }

    pub fn get_mut(&mut self, indices: &[i32]) -> Result<&mut T> {
        let offset = self.offset(indices)?;
        Ok(&mut self.data[offset])
    }

    pub fn set(&mut self, indices: &[i32], value: T) -> Result<()> {
        *self.get_mut(indices)? = value;
        Ok(())
    }

    /// Single-index access, rank 1 only.
    pub fn get_linear(&self, index: i32) -> Result<&T> {
        self.check_linear()?;
        self.get(&[index])
    }

    pub fn set_linear(&mut self, index: i32, value: T) -> Result<()> {
        self.check_linear()?;
        self.set(&[index], value)
    }

    fn check_linear(&self) -> Result<()> {
        if self.rank() != 1 {
            cold_path();
            return Err(Error::Argument(format!(
                "single index used on an array of rank {}",
                self.rank()
            )));
        }
        Ok(())
    }

    /// Every valid coordinate, in storage order.
    pub fn indices(&self) -> Coordinates {
        let count = if self.rank() == 0 { 0 } else { self.len() };
        Coordinates::within(&self.lower_bounds, &self.upper_bounds(), count)
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.data.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Same shape, elements mapped through `f`.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> NonZeroBasedArray<U> {
        NonZeroBasedArray {
            data: self.data.into_iter().map(f).collect(),
            lengths: self.lengths,
            lower_bounds: self.lower_bounds,
        }
    }

    /// Fallible [`map`](Self::map), stopping at the first error.
    pub fn try_map<U, E>(
        self,
        f: impl FnMut(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<NonZeroBasedArray<U>, E> {
        Ok(NonZeroBasedArray {
            data: self.data.into_iter().map(f).collect::<std::result::Result<_, E>>()?,
            lengths: self.lengths,
            lower_bounds: self.lower_bounds,
        })
    }
}

/// Validates a shape and returns its element count.
fn check_shape(lengths: &[usize], lower_bounds: &[i32]) -> Result<usize> {
    if lengths.len() != lower_bounds.len() {
        cold_path();
        return Err(Error::Argument(format!(
            "{} lengths but {} lower bounds",
            lengths.len(),
            lower_bounds.len()
        )));
    }
    let mut count = 1usize;
    for (&length, &lower) in lengths.iter().zip(lower_bounds) {
        // the inclusive upper bound must be an i32, even for empty dimensions
        let upper = i64::try_from(length)
            .ok()
            .and_then(|length| (lower as i64).checked_add(length - 1));
        if !upper.is_some_and(|upper| i32::try_from(upper).is_ok()) {
            cold_path();
            return Err(Error::Argument(format!(
                "dimension of length {length} from {lower} leaves the i32 index range"
            )));
        }
        let Some(product) = count.checked_mul(length) else {
            cold_path();
            return Err(Error::Argument(format!("shape {lengths:?} has too many elements")));
        };
        count = product;
    }
    Ok(count)
}

impl<T> From<Vec<T>> for NonZeroBasedArray<T> {
    fn from(data: Vec<T>) -> Self {
        Self::zero_based(data)
    }
}

impl<T> IntoIterator for NonZeroBasedArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a NonZeroBasedArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut NonZeroBasedArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter_mut()
    }
}

// ============================================================================
// Serde
// ============================================================================

impl<T: Serialize> Serialize for NonZeroBasedArray<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct(ARRAY_TOKEN, 3)?;
        state.serialize_field("lower_bounds", &self.lower_bounds)?;
        state.serialize_field("lengths", &self.lengths)?;
        state.serialize_field("elements", &self.data)?;
        state.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NonZeroBasedArray<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct(
            ARRAY_TOKEN,
            ARRAY_FIELDS,
            ArrayVisitor {
                marker: PhantomData,
            },
        )
    }
}

struct ArrayVisitor<T> {
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for ArrayVisitor<T> {
    type Value = NonZeroBasedArray<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array with bounds or a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut data = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(element) = seq.next_element()? {
            data.push(element);
        }
        Ok(NonZeroBasedArray::zero_based(data))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut lower_bounds: Option<Vec<i32>> = None;
        let mut lengths: Option<Vec<usize>> = None;
        let mut elements: Option<Vec<T>> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "lower_bounds" => lower_bounds = Some(map.next_value()?),
                "lengths" => lengths = Some(map.next_value()?),
                "elements" => elements = Some(map.next_value()?),
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                }
            }
        }
        let lower_bounds = lower_bounds.ok_or_else(|| de::Error::missing_field("lower_bounds"))?;
        let lengths = lengths.ok_or_else(|| de::Error::missing_field("lengths"))?;
        let elements = elements.ok_or_else(|| de::Error::missing_field("elements"))?;
        NonZeroBasedArray::from_vec(elements, &lengths, &lower_bounds).map_err(de::Error::custom)
    }
}

/// Derives lengths and lower bounds from a set of coordinates of one rank.
///
/// Returns `(lengths, lower_bounds)`; an empty input gives rank 0.
pub(crate) fn bounds_of<'a>(
    coordinates: impl IntoIterator<Item = &'a [i32]>,
) -> Result<(Vec<usize>, Vec<i32>)> {
    let mut lower: Vec<i32> = Vec::new();
    let mut upper: Vec<i32> = Vec::new();
    let mut first = true;
    for coordinate in coordinates {
        if first {
            lower = coordinate.to_vec();
            upper = coordinate.to_vec();
            first = false;
            continue;
        }
        if coordinate.len() != lower.len() {
            cold_path();
            return Err(Error::Argument(format!(
                "mixed ranks {} and {} among array elements",
                lower.len(),
                coordinate.len()
            )));
        }
        for (d, &index) in coordinate.iter().enumerate() {
            lower[d] = lower[d].min(index);
            upper[d] = upper[d].max(index);
        }
    }
    let lengths = lower
        .iter()
        .zip(&upper)
        .map(|(&l, &u)| extent(l, u))
        .collect();
    Ok((lengths, lower))
}
