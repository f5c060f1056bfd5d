//! Core operator abstractions for the sluice dataflow engine.
//!
//! This crate provides the seam where dynamic graph descriptions meet
//! statically-typed, device-specialized kernels:
//! - Operator definitions and typed argument access (`OperatorDef`,
//!   `ArgumentHelper`)
//! - The type-erased blob store shared by one execution scope (`Blob`,
//!   `Workspace`)
//! - Untyped and device-typed operator layers (`OperatorBase`,
//!   `Operator<C>`, `RunnableOperator`, `DeviceOperator`)
//! - Compile-time dispatch ladders (`dispatch_fixed_values!`,
//!   `dispatch_tensor_types!`)
//! - Name-to-factory registries and the operator factory entry point
//!   (`OperatorRegistry`, `DeviceRegistries`)
//!
//! Concrete operator kinds live outside this crate and plug in purely by
//! contributing registrations; see the `sluice-operators` crate for the
//! reference set.

pub mod argument;
pub mod blob;
pub mod context;
pub mod definition;
pub mod dispatch;
pub mod operator;
pub mod registry;
pub mod tensor;
pub mod workspace;

// Re-export commonly used types
pub use argument::{ArgumentHelper, RepeatedArgument, SingleArgument};
pub use blob::{Blob, BlobReadGuard, BlobWriteGuard, SharedBlob};
pub use context::{Context, CpuContext};
pub use definition::{ArgValue, Argument, DeviceOption, DeviceType, OperatorDef};
pub use operator::{AsOperator, DeviceOperator, Operator, OperatorBase, RunnableOperator};
pub use registry::{DeviceRegistries, OperatorFactory, OperatorRegistry};
pub use tensor::{DataType, Element, Tensor, TensorData};
pub use workspace::Workspace;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification tag carried by every [`Error`].
///
/// The kind survives [`Error::context`] augmentation, so callers can always
/// distinguish, say, an engine declining a configuration from an operator
/// name that was never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A blob or tensor payload is not of the requested type.
    TypeMismatch,
    /// Closed-type dispatch exhausted its candidate list.
    UnsupportedType,
    /// An operator or engine constructor declined a configuration.
    UnsupportedFeature,
    /// A device kind, operator name, or blob name failed to resolve.
    Resolution,
    /// An operator definition is malformed.
    InvalidDefinition,
    /// Tensor shapes do not line up.
    Shape,
    /// An input, output, or element index is out of range.
    OutOfRange,
    /// The operator does not implement the requested entry point.
    NotImplemented,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::UnsupportedType => "unsupported type",
            ErrorKind::UnsupportedFeature => "unsupported feature",
            ErrorKind::Resolution => "resolution error",
            ErrorKind::InvalidDefinition => "invalid definition",
            ErrorKind::Shape => "shape error",
            ErrorKind::OutOfRange => "out of range",
            ErrorKind::NotImplemented => "not implemented",
        };
        f.write_str(name)
    }
}

/// Core error type: a kind tag plus a human-readable message.
///
/// Errors are never downgraded as they propagate; layers that add context
/// (an offending blob name, the textual operator definition) do so with
/// [`Error::context`], which appends to the message and keeps the kind.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Create an error with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The classification tag of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Append diagnostic context to the message, preserving the kind.
    pub fn context(mut self, extra: impl AsRef<str>) -> Self {
        self.message.push_str(extra.as_ref());
        self
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedType, message)
    }

    pub fn unsupported_feature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFeature, message)
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, message)
    }

    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDefinition, message)
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Shape, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }
}
