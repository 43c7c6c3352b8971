//! Flattening symbol trees into leaf symbols, and building them back up.
//!
//! A PLC only reads and writes leaf tags. Writing a host object means
//! pairing every leaf symbol under the object's root symbol with the leaf
//! value at the same position in the object
//! ([`SymbolTreeWalker::flatten_with_value`]).
//! Reading goes the other way: the backend reads every leaf and
//! [`SymbolTreeWalker::assemble`] puts the values back into a [`Value`] tree.
//!
//! Both flatten iterators are lazy. Children are resolved only when the walk
//! reaches them, and the first error ends the walk.
//!
//! ```
//! use plc_marshal::{SymbolInfo, SymbolTable, SymbolTreeWalker};
//!
//! let mut table = SymbolTable::new();
//! table.insert(SymbolInfo::structure("Obj", ["Flag", "Count"]));
//! table.insert(SymbolInfo::leaf("Obj.Flag"));
//! table.insert(SymbolInfo::leaf("Obj.Count"));
//!
//! let walker = SymbolTreeWalker::new(&table);
//! let root = table.get("Obj").unwrap();
//! let names: Vec<_> = walker
//!     .flatten(root)
//!     .map(|leaf| leaf.map(|symbol| symbol.name()))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(names, ["Obj.Flag", "Obj.Count"]);
//! ```

use std::iter::FusedIterator;

use serde::{Serialize, de::DeserializeOwned};
use tracing::trace;

use crate::{
    Error, Members, MissingMemberPolicy, NonZeroBasedArray, Result, SymbolInfo, SymbolResolver,
    Value, WalkConfig, array::bounds_of, cold_path, from_value, parse_coordinate, to_value,
};

/// Walks symbol trees through a [`SymbolResolver`].
///
/// The walker holds no state besides its resolver and configuration, so one
/// instance can serve any number of concurrent walks.
#[derive(Clone, Debug)]
pub struct SymbolTreeWalker<R> {
    resolver: R,
    config: WalkConfig,
}

impl<R: SymbolResolver> SymbolTreeWalker<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, WalkConfig::default())
    }

    pub fn with_config(resolver: R, config: WalkConfig) -> Self {
        Self { resolver, config }
    }

    #[inline]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    #[inline]
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Every leaf symbol under `symbol`, depth-first and in declaration
    /// order. A leaf symbol yields only itself.
    pub fn flatten<'a>(&'a self, symbol: &'a SymbolInfo) -> Flatten<'a, R> {
        Flatten {
            resolver: &self.resolver,
            max_depth: self.config.max_depth,
            root: Some(symbol),
            stack: Vec::new(),
        }
    }

    /// Every leaf symbol under `symbol` paired with the part of `value` at
    /// the same position.
    ///
    /// Array symbols index an array value by the coordinate in each child's
    /// name; other composite symbols look up the struct member named by the
    /// child's short name. A null value skips its whole subtree. A member the
    /// value lacks is handled per [`WalkConfig::missing_member`]; an element
    /// outside the array's bounds yields [`Error::IndexOutOfRange`], and a
    /// coordinate of the wrong rank yields [`Error::Argument`].
    pub fn flatten_with_value<'a>(
        &'a self,
        symbol: &'a SymbolInfo,
        value: &'a Value,
    ) -> FlattenWithValue<'a, R> {
        FlattenWithValue {
            resolver: &self.resolver,
            config: self.config,
            root: Some((symbol, value)),
            stack: Vec::new(),
        }
    }

    /// Serializes `object` and flattens it against `symbol`, keeping owned
    /// copies of the pairs.
    pub fn flatten_object<T>(&self, symbol: &SymbolInfo, object: &T) -> Result<Vec<OwnedLeafPair>>
    where
        T: Serialize + ?Sized,
    {
        let value = to_value(object)?;
        self.flatten_with_value(symbol, &value)
            .map(|pair| pair.map(OwnedLeafPair::from))
            .collect()
    }

    /// Builds the value tree for `symbol` from the values of its leaves.
    ///
    /// Composite symbols whose children are all elements of the symbol
    /// become [`Value::Array`], with bounds taken from the smallest and
    /// largest coordinate per dimension. Other composite symbols become
    /// [`Value::Struct`] keyed by short name. A leaf for which `leaf_value`
    /// returns `None` is left out of its struct, or stays null inside an
    /// array, unless the policy is [`MissingMemberPolicy::Fail`].
    pub fn assemble<F>(&self, symbol: &SymbolInfo, mut leaf_value: F) -> Result<Value>
    where
        F: FnMut(&SymbolInfo) -> Option<Value>,
    {
        self.assemble_node(symbol, &mut leaf_value, 0)
    }

    /// [`assemble`](Self::assemble) followed by [`from_value`].
    pub fn read_object<T, F>(&self, symbol: &SymbolInfo, leaf_value: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut(&SymbolInfo) -> Option<Value>,
    {
        from_value(self.assemble(symbol, leaf_value)?)
    }

    fn assemble_node<F>(
        &self,
        symbol: &SymbolInfo,
        leaf_value: &mut F,
        depth: usize,
    ) -> Result<Value>
    where
        F: FnMut(&SymbolInfo) -> Option<Value>,
    {
        if symbol.is_leaf() {
            return match leaf_value(symbol) {
                Some(value) => Ok(value),
                None => absent(self.config.missing_member, symbol.name()).map(|()| Value::Null),
            };
        }
        if depth >= self.config.max_depth {
            return Err(depth_limit(self.config.max_depth));
        }

        if symbol.is_array() {
            let children = symbol.child_symbols();
            let mut coordinates = Vec::with_capacity(children.len());
            let mut elements = Vec::with_capacity(children.len());
            for name in children {
                let child = self.resolver.resolve(name)?;
                coordinates.push(parse_coordinate(name)?);
                elements.push(self.assemble_node(child, leaf_value, depth + 1)?);
            }
            let (lengths, lower_bounds) = bounds_of(coordinates.iter().map(Vec::as_slice))?;
            let mut array = NonZeroBasedArray::new(&lengths, &lower_bounds)?;
            for (coordinate, element) in coordinates.iter().zip(elements) {
                array.set(coordinate, element)?;
            }
            return Ok(Value::Array(array));
        }

        let mut members = Members::new();
        for name in symbol.child_symbols() {
            let child = self.resolver.resolve(name)?;
            match self.assemble_node(child, leaf_value, depth + 1)? {
                Value::Null => trace!(symbol = %name, "leaving out member without value"),
                value => {
                    members.insert(child.short_name().to_owned(), value);
                }
            }
        }
        Ok(Value::Struct(members))
    }
}

fn absent(policy: MissingMemberPolicy, name: &str) -> Result<()> {
    match policy {
        MissingMemberPolicy::Skip => {
            trace!(symbol = %name, "skipping member without value");
            Ok(())
        }
        MissingMemberPolicy::Fail => {
            cold_path();
            Err(Error::MissingMember(name.to_owned()))
        }
    }
}

fn depth_limit(max_depth: usize) -> Error {
    cold_path();
    Error::DepthLimit(max_depth)
}

/// A leaf symbol and the value to write to it, borrowed from the walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafPair<'a> {
    pub symbol: &'a SymbolInfo,
    pub value: &'a Value,
}

impl LeafPair<'_> {
    pub fn to_owned_pair(&self) -> OwnedLeafPair {
        OwnedLeafPair {
            symbol: self.symbol.clone(),
            value: self.value.clone(),
        }
    }
}

/// A [`LeafPair`] that owns its symbol and value.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedLeafPair {
    pub symbol: SymbolInfo,
    pub value: Value,
}

impl From<LeafPair<'_>> for OwnedLeafPair {
    fn from(pair: LeafPair<'_>) -> Self {
        pair.to_owned_pair()
    }
}

#[derive(Clone, Copy)]
struct Frame<'a> {
    symbol: &'a SymbolInfo,
    next: usize,
}

/// Iterator returned by [`SymbolTreeWalker::flatten`].
pub struct Flatten<'a, R> {
    resolver: &'a R,
    max_depth: usize,
    root: Option<&'a SymbolInfo>,
    stack: Vec<Frame<'a>>,
}

impl<'a, R: SymbolResolver> Flatten<'a, R> {
    /// Yields `symbol` if it is a leaf, otherwise descends into it.
    fn enter(&mut self, symbol: &'a SymbolInfo) -> Option<Result<&'a SymbolInfo>> {
        if symbol.is_leaf() {
            return Some(Ok(symbol));
        }
        if self.stack.len() >= self.max_depth {
            return Some(Err(self.fail(depth_limit(self.max_depth))));
        }
        self.stack.push(Frame { symbol, next: 0 });
        None
    }

    fn fail(&mut self, error: Error) -> Error {
        self.stack.clear();
        error
    }
}

impl<'a, R: SymbolResolver> Iterator for Flatten<'a, R> {
    type Item = Result<&'a SymbolInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            if let Some(item) = self.enter(root) {
                return Some(item);
            }
        }
        loop {
            let frame = self.stack.last_mut()?;
            let symbol = frame.symbol;
            let Some(name) = symbol.child_symbols().get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            let child = match self.resolver.resolve(name) {
                Ok(child) => child,
                Err(e) => return Some(Err(self.fail(e))),
            };
            if let Some(item) = self.enter(child) {
                return Some(item);
            }
        }
    }
}

impl<R: SymbolResolver> FusedIterator for Flatten<'_, R> {}

impl<R> Clone for Flatten<'_, R> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver,
            max_depth: self.max_depth,
            root: self.root,
            stack: self.stack.clone(),
        }
    }
}

#[derive(Clone, Copy)]
struct ValueFrame<'a> {
    symbol: &'a SymbolInfo,
    value: &'a Value,
    next: usize,
}

/// Iterator returned by [`SymbolTreeWalker::flatten_with_value`].
pub struct FlattenWithValue<'a, R> {
    resolver: &'a R,
    config: WalkConfig,
    root: Option<(&'a SymbolInfo, &'a Value)>,
    stack: Vec<ValueFrame<'a>>,
}

impl<'a, R: SymbolResolver> FlattenWithValue<'a, R> {
    fn enter(
        &mut self,
        symbol: &'a SymbolInfo,
        value: &'a Value,
    ) -> Option<Result<LeafPair<'a>>> {
        if value.is_null() {
            trace!(symbol = %symbol.name(), "skipping null subtree");
            return None;
        }
        if symbol.is_leaf() {
            return Some(Ok(LeafPair { symbol, value }));
        }
        if self.stack.len() >= self.config.max_depth {
            return Some(Err(self.fail(depth_limit(self.config.max_depth))));
        }
        self.stack.push(ValueFrame {
            symbol,
            value,
            next: 0,
        });
        None
    }

    fn fail(&mut self, error: Error) -> Error {
        self.stack.clear();
        error
    }
}

/// The part of `parent` that the child symbol `name` stands for.
///
/// Only a struct without the member, or a scalar standing in for a
/// composite, is a miss. Array elements must exist.
fn lookup<'a>(parent: &'a Value, name: &str, child: &SymbolInfo) -> Result<Option<&'a Value>> {
    Ok(match parent {
        Value::Array(array) => Some(array.get(&parse_coordinate(name)?)?),
        Value::Struct(members) => members.get(child.short_name()),
        _ => None,
    })
}

impl<'a, R: SymbolResolver> Iterator for FlattenWithValue<'a, R> {
    type Item = Result<LeafPair<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((symbol, value)) = self.root.take() {
            if let Some(item) = self.enter(symbol, value) {
                return Some(item);
            }
        }
        loop {
            let frame = self.stack.last_mut()?;
            let (symbol, parent) = (frame.symbol, frame.value);
            let Some(name) = symbol.child_symbols().get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            let child = match self.resolver.resolve(name) {
                Ok(child) => child,
                Err(e) => return Some(Err(self.fail(e))),
            };
            let value = match lookup(parent, name, child) {
                Ok(Some(value)) => value,
                Ok(None) => match absent(self.config.missing_member, name) {
                    Ok(()) => continue,
                    Err(e) => return Some(Err(self.fail(e))),
                },
                Err(e) => return Some(Err(self.fail(e))),
            };
            if let Some(item) = self.enter(child, value) {
                return Some(item);
            }
        }
    }
}

impl<R: SymbolResolver> FusedIterator for FlattenWithValue<'_, R> {}
