//! Typed attribute lookup over an operator definition.
//!
//! The helper is built once at operator construction and is read-only
//! thereafter. Lookups are by name and expected type with caller-supplied
//! defaults, mirroring how operators read their configuration.

use crate::definition::{ArgValue, OperatorDef};
use crate::{Error, Result};
use std::collections::HashMap;

/// Conversion from a stored attribute to a single typed value.
pub trait SingleArgument: Sized {
    fn from_arg(value: &ArgValue) -> Option<Self>;
}

impl SingleArgument for f32 {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl SingleArgument for i64 {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl SingleArgument for bool {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl SingleArgument for String {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Conversion from a stored attribute to a repeated typed value.
pub trait RepeatedArgument: Sized {
    fn from_arg(value: &ArgValue) -> Option<Vec<Self>>;
}

impl RepeatedArgument for f32 {
    fn from_arg(value: &ArgValue) -> Option<Vec<Self>> {
        match value {
            ArgValue::Floats(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl RepeatedArgument for i64 {
    fn from_arg(value: &ArgValue) -> Option<Vec<Self>> {
        match value {
            ArgValue::Ints(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl RepeatedArgument for String {
    fn from_arg(value: &ArgValue) -> Option<Vec<Self>> {
        match value {
            ArgValue::Strings(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Read-only attribute map derived from a definition.
pub struct ArgumentHelper {
    args: HashMap<String, ArgValue>,
}

impl ArgumentHelper {
    /// Build the helper from a definition.
    ///
    /// Attribute names must be unique within one definition; a duplicate is
    /// an invalid-definition error.
    pub fn new(def: &OperatorDef) -> Result<Self> {
        let mut args = HashMap::with_capacity(def.args.len());
        for arg in &def.args {
            if args.insert(arg.name.clone(), arg.value.clone()).is_some() {
                return Err(Error::invalid_definition(format!(
                    "duplicate argument '{}' in definition of operator {}",
                    arg.name, def.op_type
                )));
            }
        }
        Ok(Self { args })
    }

    /// Check if an attribute with the given name exists.
    pub fn has_argument(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    /// Get a single typed value, or the default when the attribute is
    /// absent or of a different kind.
    pub fn get_single_argument<T: SingleArgument>(&self, name: &str, default: T) -> T {
        self.args
            .get(name)
            .and_then(T::from_arg)
            .unwrap_or(default)
    }

    /// Check if the attribute exists and converts to `T`.
    pub fn has_single_argument_of_type<T: SingleArgument>(&self, name: &str) -> bool {
        self.args
            .get(name)
            .map(|v| T::from_arg(v).is_some())
            .unwrap_or(false)
    }

    /// Get a repeated typed value; absent attributes yield an empty vector.
    pub fn get_repeated_argument<T: RepeatedArgument>(&self, name: &str) -> Vec<T> {
        self.args
            .get(name)
            .and_then(T::from_arg)
            .unwrap_or_default()
    }
}
