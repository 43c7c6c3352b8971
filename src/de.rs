//! Serde deserializer from [`Value`] into host types.
//!
//! The read-direction half of the serde bridge. A [`Value`] tree assembled
//! from per-leaf PLC values (see
//! [`SymbolTreeWalker::assemble`](crate::SymbolTreeWalker::assemble)) is
//! turned into any type deriving [`Deserialize`]:
//!
//! ```
//! use plc_marshal::{from_value, Members, Value};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Setpoint {
//!     target: f64,
//!     ramp: u16,
//! }
//!
//! let mut members = Members::new();
//! members.insert("target".into(), Value::Float(72.5));
//! members.insert("ramp".into(), Value::UInt(30));
//!
//! let setpoint: Setpoint = from_value(Value::Struct(members)).unwrap();
//! assert_eq!(setpoint, Setpoint { target: 72.5, ramp: 30 });
//! ```
//!
//! # Conversions
//!
//! Integers convert between `Int` and `UInt` when the number fits the
//! target type. Floating-point targets also accept integers. Enums decode
//! unit variants from a `String` (variant name) or an integer (variant
//! index), and other variants from a single-member `Struct`.
//!
//! # Errors
//!
//! - [`Error::TypeMismatch`] - the value has the wrong kind for the target
//! - [`Error::MissingMember`] - a struct field has no member and no default
//! - [`Error::Message`] - any other serde error, e.g. an integer out of range

use serde::{
    Deserialize,
    de::{
        self, DeserializeOwned, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
        VariantAccess,
    },
};

use crate::{
    Error, Members, NonZeroBasedArray, Result, Value,
    array::ARRAY_TOKEN,
    cold_path,
};

/// Deserializes a `T` out of a [`Value`].
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
}

macro_rules! check_kind {
    ($expected:expr, $value:expr) => {{
        cold_path();
        Err(Error::TypeMismatch {
            expected: $expected,
            actual: $value.kind(),
        })
    }};
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {$(
        fn $method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            match self {
                Value::Int(v) => visitor.visit_i64(v),
                Value::UInt(v) => visitor.visit_u64(v),
                other => check_kind!("integer", other),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Int(v) => visitor.visit_i64(v),
            Value::UInt(v) => visitor.visit_u64(v),
            Value::Float(v) => visitor.visit_f64(v),
            Value::String(v) => visitor.visit_string(v),
            Value::Struct(members) => visitor.visit_map(StructAccess::new(members)),
            Value::Array(array) => visitor.visit_seq(ArrayAccess::new(array)),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Bool(v) => visitor.visit_bool(v),
            other => check_kind!("bool", other),
        }
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Float(v) => visitor.visit_f64(v),
            Value::Int(v) => visitor.visit_f64(v as f64),
            Value::UInt(v) => visitor.visit_f64(v as f64),
            other => check_kind!("float", other),
        }
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(v) => visitor.visit_string(v),
            other => check_kind!("string", other),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(v) => visitor.visit_byte_buf(v.into_bytes()),
            Value::Array(array) => visitor.visit_seq(ArrayAccess::new(array)),
            other => check_kind!("bytes", other),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_unit(),
            other => check_kind!("null", other),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Array(array) => visitor.visit_seq(ArrayAccess::new(array)),
            other => check_kind!("array", other),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Struct(members) => visitor.visit_map(StructAccess::new(members)),
            other => check_kind!("struct", other),
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Array(array) if name == ARRAY_TOKEN => {
                visitor.visit_map(StructAccess::new(array_fields(array)))
            }
            // a plain sequence may fill a bounded array, zero-based
            Value::Array(array) => visitor.visit_seq(ArrayAccess::new(array)),
            Value::Struct(members) => visitor.visit_map(StructAccess::new(members)),
            other => check_kind!("struct", other),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(variant) => visitor.visit_enum(variant.into_deserializer()),
            // PLC enumerations travel as their integer value
            Value::Int(index) => match u32::try_from(index) {
                Ok(index) => visitor.visit_enum(index.into_deserializer()),
                Err(_) => {
                    cold_path();
                    Err(Error::Message(format!("invalid enum index {index}")))
                }
            },
            Value::UInt(index) => match u32::try_from(index) {
                Ok(index) => visitor.visit_enum(index.into_deserializer()),
                Err(_) => {
                    cold_path();
                    Err(Error::Message(format!("invalid enum index {index}")))
                }
            },
            Value::Struct(members) => {
                let mut members = members.into_iter();
                match (members.next(), members.next()) {
                    (Some((variant, value)), None) => {
                        visitor.visit_enum(VariantDeserializer { variant, value })
                    }
                    _ => {
                        cold_path();
                        Err(Error::Message(
                            "enum variant must be a struct with exactly one member".into(),
                        ))
                    }
                }
            }
            other => check_kind!("enum", other),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        drop(self);
        visitor.visit_unit()
    }
}

// Bounded arrays deserialize through the field layout of their `Serialize`
// impl.
fn array_fields(array: NonZeroBasedArray<Value>) -> Members {
    let mut fields = Members::new();
    fields.insert(
        "lower_bounds".into(),
        array.lower_bounds().iter().copied().collect(),
    );
    fields.insert(
        "lengths".into(),
        array.lengths().iter().map(|&len| len as u64).collect(),
    );
    fields.insert("elements".into(), Value::from(array.into_vec()));
    fields
}

struct ArrayAccess {
    elements: std::vec::IntoIter<Value>,
}

impl ArrayAccess {
    fn new(array: NonZeroBasedArray<Value>) -> Self {
        Self {
            elements: array.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.elements.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.len())
    }
}

// For deserializing structs and maps
struct StructAccess {
    members: std::collections::btree_map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl StructAccess {
    fn new(members: Members) -> Self {
        Self {
            members: members.into_iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for StructAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.members.next() {
            Some((name, value)) => {
                self.value = Some(value);
                seed.deserialize(name.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => {
                cold_path();
                Err(Error::Message("struct member value requested before its name".into()))
            }
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.members.len())
    }
}

// For newtype/tuple/struct enum variants
struct VariantDeserializer {
    variant: String,
    value: Value,
}

impl<'de> EnumAccess<'de> for VariantDeserializer {
    type Error = Error;
    type Variant = VariantValueDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(self.variant.into_deserializer())?;
        Ok((variant, VariantValueDeserializer { value: self.value }))
    }
}

struct VariantValueDeserializer {
    value: Value,
}

impl<'de> VariantAccess<'de> for VariantValueDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => check_kind!("null", other),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self.value, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self.value, visitor)
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}
