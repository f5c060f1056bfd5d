//! Operator definitions: the serialized description of one operator instance.
//!
//! A definition is produced by whatever builds graphs (a parser, a frontend,
//! a test) and consumed by the factory and the operator constructors. The
//! core never produces definitions; it copies and reads them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device kinds understood by the engine.
///
/// The integer codes are stable and key the registry-of-registries. `Cpu`
/// and `Gpu` are the two reference kinds; the Gpu operator registry ships
/// empty and is populated by backend crates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    #[default]
    Cpu,
    Gpu,
}

impl DeviceType {
    /// Stable integer code for this device kind.
    pub fn code(self) -> i32 {
        match self {
            DeviceType::Cpu => 0,
            DeviceType::Gpu => 1,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => f.write_str("cpu"),
            DeviceType::Gpu => f.write_str("gpu"),
        }
    }
}

/// Device placement for one operator: kind plus ordinal index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceOption {
    pub device_type: DeviceType,
    pub device_id: i32,
}

impl DeviceOption {
    pub fn new(device_type: DeviceType, device_id: i32) -> Self {
        Self {
            device_type,
            device_id,
        }
    }
}

impl fmt::Display for DeviceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device_type, self.device_id)
    }
}

/// Scalar or repeated attribute payload.
///
/// The closed set of primitive kinds a definition may carry. Typed access
/// with defaults goes through [`crate::ArgumentHelper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    Float(f32),
    Int(i64),
    String(String),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::String(v) => write!(f, "{v:?}"),
            ArgValue::Floats(v) => write!(f, "{v:?}"),
            ArgValue::Ints(v) => write!(f, "{v:?}"),
            ArgValue::Strings(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        ArgValue::Float(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::String(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::String(v)
    }
}

impl From<Vec<f32>> for ArgValue {
    fn from(v: Vec<f32>) -> Self {
        ArgValue::Floats(v)
    }
}

impl From<Vec<i64>> for ArgValue {
    fn from(v: Vec<i64>) -> Self {
        ArgValue::Ints(v)
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(v: Vec<String>) -> Self {
        ArgValue::Strings(v)
    }
}

/// A named attribute within a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: ArgValue,
}

/// The serialized description of a single operator instance.
///
/// Immutable once produced; the untyped operator stores its own copy at
/// construction. Attribute names must be unique within one definition
/// (checked when the argument helper is built).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorDef {
    /// Instance name, may be empty.
    #[serde(default)]
    pub name: String,

    /// Operator type name resolved against the registry (e.g. "Scale").
    pub op_type: String,

    /// Ordered input blob names.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Ordered output blob names.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Optional engine variant; tried as an `_ENGINE_`-qualified name first.
    #[serde(default)]
    pub engine: Option<String>,

    /// Device placement for this operator.
    #[serde(default)]
    pub device_option: DeviceOption,

    /// Ordered named attributes.
    #[serde(default)]
    pub args: Vec<Argument>,
}

impl OperatorDef {
    /// Start a definition for the given operator type.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            ..Default::default()
        }
    }

    /// Set the instance name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append an input blob name.
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    /// Append an output blob name.
    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    /// Request an engine variant.
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Place the operator on device 0 of the given kind.
    pub fn device(mut self, device_type: DeviceType) -> Self {
        self.device_option = DeviceOption::new(device_type, 0);
        self
    }

    /// Set the full device option.
    pub fn device_option(mut self, option: DeviceOption) -> Self {
        self.device_option = option;
        self
    }

    /// Append a named attribute.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.push(Argument {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// The full textual form, appended to errors crossing the run boundary.
impl fmt::Display for OperatorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op_type)?;
        if !self.name.is_empty() {
            write!(f, " \"{}\"", self.name)?;
        }
        if let Some(engine) = &self.engine {
            write!(f, " (engine {engine})")?;
        }
        write!(
            f,
            ": ({}) -> ({}) on {}",
            self.inputs.join(", "),
            self.outputs.join(", "),
            self.device_option
        )?;
        if !self.args.is_empty() {
            let rendered: Vec<String> = self
                .args
                .iter()
                .map(|a| format!("{} = {}", a.name, a.value))
                .collect();
            write!(f, " with {{{}}}", rendered.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let def = OperatorDef::new("Scale")
            .name("scale_x")
            .input("X")
            .output("Y")
            .device(DeviceType::Cpu)
            .arg("scale", 2.0f32);

        assert_eq!(def.op_type, "Scale");
        assert_eq!(def.inputs, vec!["X"]);
        assert_eq!(def.outputs, vec!["Y"]);
        assert_eq!(def.device_option.device_type, DeviceType::Cpu);
        assert_eq!(def.args.len(), 1);
        assert_eq!(def.args[0].value, ArgValue::Float(2.0));
    }

    #[test]
    fn test_display_names_everything() {
        let def = OperatorDef::new("Gather")
            .input("data")
            .input("indices")
            .output("out")
            .engine("FAST")
            .arg("axis", 0i64);

        let text = def.to_string();
        assert!(text.contains("Gather"));
        assert!(text.contains("FAST"));
        assert!(text.contains("data, indices"));
        assert!(text.contains("axis = 0"));
        assert!(text.contains("cpu:0"));
    }

    #[test]
    fn test_json_roundtrip() {
        let def = OperatorDef::new("Sum")
            .input("a")
            .input("b")
            .output("s")
            .arg("coefficients", vec![0.5f32, 0.5]);
        let json = serde_json::to_string(&def).unwrap();
        let back: OperatorDef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_device_codes_are_stable() {
        assert_eq!(DeviceType::Cpu.code(), 0);
        assert_eq!(DeviceType::Gpu.code(), 1);
    }
}
