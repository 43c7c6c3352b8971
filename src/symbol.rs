//! PLC symbol descriptions and name resolution.
//!
//! A [`SymbolInfo`] describes one tag of the PLC's symbol table. Structured
//! and array symbols list their children by name only; the walker resolves
//! those names lazily through a [`SymbolResolver`], which each backend
//! supplies from its loaded symbol table. [`SymbolTable`] is a ready-made
//! in-memory resolver.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, cold_path, element_name, enumerate, short_name_of};

/// One entry of a PLC symbol table.
///
/// A symbol without children is a leaf and maps to one scalar PLC value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolInfo {
    name: String,
    short_name: String,
    #[serde(default)]
    child_symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
}

impl SymbolInfo {
    /// A leaf symbol. The short name is the last dotted segment of `name`.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::composite(name, Vec::<String>::new())
    }

    /// A symbol with the given children, in declaration order.
    pub fn composite<I>(name: impl Into<String>, child_symbols: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let name = name.into();
        Self {
            short_name: short_name_of(&name).to_owned(),
            name,
            child_symbols: child_symbols.into_iter().map(Into::into).collect(),
            type_name: None,
        }
    }

    /// A structured symbol whose children are `name.member` for each member.
    pub fn structure<I>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let name = name.into();
        let children: Vec<String> = members
            .into_iter()
            .map(|member| format!("{name}.{}", member.as_ref()))
            .collect();
        Self::composite(name, children)
    }

    /// An array symbol whose children are `name[i,j,..]` for every coordinate
    /// between the bounds, row-major.
    pub fn array(
        name: impl Into<String>,
        lower_bounds: &[i32],
        upper_bounds: &[i32],
    ) -> Result<Self> {
        let name = name.into();
        let children: Vec<String> = enumerate(lower_bounds, upper_bounds)?
            .map(|coordinate| element_name(&name, &coordinate))
            .collect();
        Ok(Self::composite(name, children))
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Full path, e.g. `Block.Struct.Array[2,3]`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leaf identifier, e.g. `Array[2,3]`.
    #[inline]
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    #[inline]
    pub fn child_symbols(&self) -> &[String] {
        &self.child_symbols
    }

    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child_symbols.is_empty()
    }

    /// Whether `child` names an element of this symbol, i.e. it is this
    /// symbol's name followed by a bracketed index.
    pub fn is_element(&self, child: &str) -> bool {
        child
            .strip_prefix(self.name.as_str())
            .is_some_and(|suffix| suffix.starts_with('[') && suffix.ends_with(']'))
    }

    /// Whether every child of this symbol is an array element.
    pub fn is_array(&self) -> bool {
        !self.child_symbols.is_empty()
            && self.child_symbols.iter().all(|child| self.is_element(child))
    }
}

/// Looks up symbols by full name.
///
/// Implementations must be safe for concurrent reads; the walkers never
/// mutate through a resolver.
pub trait SymbolResolver {
    /// # Errors
    ///
    /// Returns [`Error::SymbolNotFound`] for unknown names.
    fn resolve(&self, name: &str) -> Result<&SymbolInfo>;
}

impl<R: SymbolResolver + ?Sized> SymbolResolver for &R {
    #[inline]
    fn resolve(&self, name: &str) -> Result<&SymbolInfo> {
        (**self).resolve(name)
    }
}

impl<R: SymbolResolver + ?Sized> SymbolResolver for Arc<R> {
    #[inline]
    fn resolve(&self, name: &str) -> Result<&SymbolInfo> {
        (**self).resolve(name)
    }
}

impl SymbolResolver for HashMap<String, SymbolInfo> {
    fn resolve(&self, name: &str) -> Result<&SymbolInfo> {
        self.get(name).ok_or_else(|| not_found(name))
    }
}

fn not_found(name: &str) -> Error {
    cold_path();
    Error::SymbolNotFound(name.to_owned())
}

/// An in-memory symbol table keyed by full symbol name.
///
/// ```
/// use plc_marshal::{SymbolInfo, SymbolResolver, SymbolTable};
///
/// let mut table = SymbolTable::new();
/// table.insert(SymbolInfo::structure("Obj", ["Flag", "Count"]));
/// table.insert(SymbolInfo::leaf("Obj.Flag"));
/// table.insert(SymbolInfo::leaf("Obj.Count"));
///
/// assert_eq!(table.resolve("Obj.Count").unwrap().short_name(), "Count");
/// assert!(table.resolve("Obj.Missing").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a symbol, returning the one it replaced.
    pub fn insert(&mut self, symbol: SymbolInfo) -> Option<SymbolInfo> {
        self.symbols.insert(symbol.name.clone(), symbol)
    }

    /// Adds an array symbol together with a leaf symbol for every element.
    pub fn insert_leaf_array(
        &mut self,
        name: impl Into<String>,
        lower_bounds: &[i32],
        upper_bounds: &[i32],
    ) -> Result<()> {
        let array = SymbolInfo::array(name, lower_bounds, upper_bounds)?;
        for child in array.child_symbols() {
            self.insert(SymbolInfo::leaf(child.as_str()));
        }
        self.insert(array);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.symbols.values()
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, name: &str) -> Result<&SymbolInfo> {
        self.symbols.get(name).ok_or_else(|| not_found(name))
    }
}

impl FromIterator<SymbolInfo> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = SymbolInfo>>(iter: I) -> Self {
        let mut table = SymbolTable::new();
        table.extend(iter);
        table
    }
}

impl Extend<SymbolInfo> for SymbolTable {
    fn extend<I: IntoIterator<Item = SymbolInfo>>(&mut self, iter: I) {
        for symbol in iter {
            self.insert(symbol);
        }
    }
}
