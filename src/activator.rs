//! Building host objects from named member values.
//!
//! A type takes part by implementing [`Activate`], describing how it can be
//! built: through a constructor taking named parameters, or by default
//! construction followed by property assignment. [`TypeActivatorRegistry`]
//! compiles that description into an [`ActivationPlan`] once per type and
//! picks a strategy for each activation based on how many member values the
//! caller has.
//!
//! ```
//! use plc_marshal::{Activate, MemberDescriptor, TypeActivatorRegistry, TypeShape, Value};
//!
//! struct Limits {
//!     low: i32,
//!     high: i32,
//! }
//!
//! impl Activate for Limits {
//!     fn shape() -> TypeShape<Self> {
//!         TypeShape::new().constructor(
//!             vec![MemberDescriptor::of::<i32>("Low"), MemberDescriptor::of::<i32>("High")],
//!             |args| {
//!                 Ok(Limits {
//!                     low: args.take()?,
//!                     high: args.take()?,
//!                 })
//!             },
//!         )
//!     }
//! }
//!
//! let registry = TypeActivatorRegistry::new();
//! let limits: Limits = registry
//!     .try_create_instance(|name, _| Some(Value::Int(if name == "Low" { 5 } else { 95 })), 2)
//!     .unwrap();
//! assert_eq!((limits.low, limits.high), (5, 95));
//! ```

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::{Error, Result, Value, ValueKind, cold_path, from_value};

/// The Rust type of a member, as reported to member value getters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemberType {
    name: &'static str,
    id: TypeId,
}

impl MemberType {
    pub fn of<V: ?Sized + 'static>() -> Self {
        Self {
            name: type_name::<V>(),
            id: TypeId::of::<V>(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn is<V: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<V>()
    }
}

/// A named constructor parameter or property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    name: String,
    member_type: MemberType,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, member_type: MemberType) -> Self {
        Self {
            name: name.into(),
            member_type,
        }
    }

    pub fn of<V: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, MemberType::of::<V>())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn member_type(&self) -> &MemberType {
        &self.member_type
    }
}

/// Types that can be built from named member values.
pub trait Activate: Sized + 'static {
    fn shape() -> TypeShape<Self>;
}

type Invoke<T> = Box<dyn Fn(&mut Arguments) -> Result<T> + Send + Sync>;
type Assign<T> = Box<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;
type Construct<T> = Box<dyn Fn() -> T + Send + Sync>;

struct Constructor<T> {
    params: Vec<MemberDescriptor>,
    invoke: Invoke<T>,
}

struct Property<T> {
    descriptor: MemberDescriptor,
    required: bool,
    assign: Assign<T>,
}

/// How a type can be built, as declared by [`Activate::shape`].
pub struct TypeShape<T> {
    constructor: Option<Constructor<T>>,
    default: Option<Construct<T>>,
    properties: Vec<Property<T>>,
}

impl<T: 'static> TypeShape<T> {
    pub fn new() -> Self {
        Self {
            constructor: None,
            default: None,
            properties: Vec::new(),
        }
    }

    /// Declares the constructor. `invoke` receives the parameter values in
    /// the order of `params`. A type has at most one; a second call replaces
    /// the first.
    pub fn constructor<F>(mut self, params: Vec<MemberDescriptor>, invoke: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            params,
            invoke: Box::new(invoke),
        });
        self
    }

    /// Declares the default constructor used by the property strategy.
    pub fn default_with<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default = Some(Box::new(construct));
        self
    }

    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.default_with(T::default)
    }

    /// Declares a writable property that must receive a value.
    pub fn property<V, F>(self, name: impl Into<String>, set: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push_property::<V, F>(name.into(), true, set)
    }

    /// Declares a writable property that keeps its default when there is
    /// no value for it.
    pub fn optional_property<V, F>(self, name: impl Into<String>, set: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.push_property::<V, F>(name.into(), false, set)
    }

    fn push_property<V, F>(mut self, name: String, required: bool, set: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.properties.push(Property {
            descriptor: MemberDescriptor::of::<V>(name),
            required,
            assign: Box::new(move |target, value| {
                set(target, from_value(value)?);
                Ok(())
            }),
        });
        self
    }
}

impl<T: 'static> Default for TypeShape<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Constructor parameter values, handed out in declaration order.
pub struct Arguments {
    values: std::vec::IntoIter<Value>,
}

impl Arguments {
    fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Converts the next parameter value into `V`.
    pub fn take<V: DeserializeOwned>(&mut self) -> Result<V> {
        from_value(self.take_value()?)
    }

    /// The next parameter value, unconverted.
    pub fn take_value(&mut self) -> Result<Value> {
        self.values.next().ok_or_else(|| {
            cold_path();
            Error::Argument("constructor read more arguments than it declares".to_owned())
        })
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Which way an activation builds its instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Every member value goes to the constructor.
    Constructor,
    /// Default construction, then one assignment per property.
    Properties,
}

/// A compiled [`TypeShape`]. Immutable once built.
pub struct ActivationPlan<T> {
    type_name: &'static str,
    shape: TypeShape<T>,
    constructor_named: bool,
}

impl<T: Activate> ActivationPlan<T> {
    pub fn compile() -> Self {
        let shape = T::shape();
        let constructor_named = shape
            .constructor
            .as_ref()
            .is_none_or(|ctor| ctor.params.iter().all(|param| !param.name.is_empty()));
        Self {
            type_name: type_name::<T>(),
            shape,
            constructor_named,
        }
    }
}

impl<T> ActivationPlan<T> {
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn constructor_params(&self) -> Option<&[MemberDescriptor]> {
        self.shape.constructor.as_ref().map(|ctor| ctor.params.as_slice())
    }

    pub fn properties(&self) -> impl ExactSizeIterator<Item = &MemberDescriptor> {
        self.shape.properties.iter().map(|property| &property.descriptor)
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.shape.default.is_some()
    }

    fn properties_apply(&self, member_count: usize) -> bool {
        self.shape.default.is_some() && member_count <= self.shape.properties.len()
    }

    /// The strategy an activation with `member_count` values would use.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedShape`] when the constructor matches the count but
    /// has an unnamed parameter and properties do not apply.
    /// [`Error::ShapeMismatch`] when neither strategy applies.
    pub fn strategy(&self, member_count: usize) -> Result<Strategy> {
        if let Some(ctor) = &self.shape.constructor {
            if ctor.params.len() == member_count {
                if self.constructor_named {
                    return Ok(Strategy::Constructor);
                }
                if !self.properties_apply(member_count) {
                    cold_path();
                    return Err(Error::UnsupportedShape(self.type_name));
                }
            }
        }
        if self.properties_apply(member_count) {
            return Ok(Strategy::Properties);
        }
        cold_path();
        Err(Error::ShapeMismatch {
            type_name: self.type_name,
            member_count,
            constructor_params: self.constructor_params().map(<[_]>::len),
            properties: self.shape.properties.len(),
        })
    }

    /// Builds an instance, asking `getter` for each member value.
    pub fn activate<G>(&self, mut getter: G, member_count: usize) -> Result<T>
    where
        G: FnMut(&str, &MemberType) -> Option<Value>,
    {
        let strategy = self.strategy(member_count).inspect_err(|e| {
            debug!(type_name = self.type_name, member_count, error = %e, "activation rejected");
        })?;
        trace!(type_name = self.type_name, member_count, ?strategy, "activating");

        match (strategy, &self.shape.constructor, &self.shape.default) {
            (Strategy::Constructor, Some(ctor), _) => {
                let mut values = Vec::with_capacity(ctor.params.len());
                for param in &ctor.params {
                    let value = getter(&param.name, &param.member_type)
                        .ok_or_else(|| missing(&param.name))?;
                    values.push(value);
                }
                (ctor.invoke)(&mut Arguments::new(values))
            }
            (Strategy::Properties, _, Some(construct)) => {
                let mut instance = construct();
                for property in &self.shape.properties {
                    let descriptor = &property.descriptor;
                    match getter(&descriptor.name, &descriptor.member_type) {
                        Some(value) => (property.assign)(&mut instance, value)?,
                        None if property.required => return Err(missing(&descriptor.name)),
                        None => {}
                    }
                }
                Ok(instance)
            }
            _ => {
                cold_path();
                Err(Error::UnsupportedShape(self.type_name))
            }
        }
    }
}

fn missing(name: &str) -> Error {
    cold_path();
    Error::MissingMember(name.to_owned())
}

impl<T> fmt::Debug for ActivationPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationPlan")
            .field("type_name", &self.type_name)
            .field("constructor_params", &self.constructor_params())
            .field("properties", &self.properties().collect::<Vec<_>>())
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Caches one [`ActivationPlan`] per type.
///
/// Safe to share between threads. Plans are compiled on first use; if two
/// threads race on the same type both compile, and the plan published first
/// is the one every later caller gets.
#[derive(Default)]
pub struct TypeActivatorRegistry {
    plans: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl TypeActivatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The plan for `T`, compiling it on first use.
    pub fn plan<T: Activate>(&self) -> Arc<ActivationPlan<T>> {
        let id = TypeId::of::<T>();
        if let Some(plan) = self.plans.read().get(&id) {
            if let Ok(plan) = Arc::clone(plan).downcast::<ActivationPlan<T>>() {
                return plan;
            }
        }

        let compiled = Arc::new(ActivationPlan::<T>::compile());
        debug!(type_name = compiled.type_name(), "compiled activation plan");
        let published = Arc::clone(
            self.plans
                .write()
                .entry(id)
                .or_insert_with(|| Arc::clone(&compiled) as Arc<dyn Any + Send + Sync>),
        );
        published
            .downcast::<ActivationPlan<T>>()
            .unwrap_or(compiled)
    }

    /// Whether a plan for `T` has been compiled.
    pub fn contains<T: Activate>(&self) -> bool {
        self.plans.read().contains_key(&TypeId::of::<T>())
    }

    /// Number of compiled plans.
    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }

    /// Builds a `T` from `member_count` member values supplied by `getter`.
    ///
    /// Uses the constructor when its parameter count equals `member_count`,
    /// otherwise default construction plus property assignment when the type
    /// has a default constructor and at least `member_count` properties.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingMember`] when `getter` has no value for a
    ///   constructor parameter or required property.
    /// - [`Error::ShapeMismatch`] when neither strategy fits.
    /// - [`Error::UnsupportedShape`] when only a constructor with an unnamed
    ///   parameter fits.
    /// - Conversion errors from [`from_value`](crate::from_value).
    pub fn try_create_instance<T, G>(&self, getter: G, member_count: usize) -> Result<T>
    where
        T: Activate,
        G: FnMut(&str, &MemberType) -> Option<Value>,
    {
        self.plan::<T>().activate(getter, member_count)
    }

    pub fn select_strategy<T: Activate>(&self, member_count: usize) -> Result<Strategy> {
        self.plan::<T>().strategy(member_count)
    }

    /// Activates a `T` from the members of a [`Value::Struct`].
    pub fn create_from_struct<T: Activate>(&self, value: &Value) -> Result<T> {
        let Value::Struct(members) = value else {
            cold_path();
            return Err(Error::TypeMismatch {
                expected: ValueKind::Struct.name(),
                actual: value.kind(),
            });
        };
        self.try_create_instance(|name, _| members.get(name).cloned(), members.len())
    }
}

impl fmt::Debug for TypeActivatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeActivatorRegistry")
            .field("plans", &self.len())
            .finish()
    }
}
