//! Reference operator implementations for sluice.
//!
//! Each operator here exercises one extension surface of `sluice-core` and
//! doubles as the worked example for writing new operator kinds:
//! - **Scale**: argument access and the simple single-input kernel shape
//! - **Sum**: multiple bound inputs
//! - **Gather**: index-type specialization through the closed-type ladder,
//!   plus a constructor that declines unsupported configurations
//! - **ScatterAssign**: block-width specialization through the
//!   fixed-value ladder
//!
//! [`cpu_operator_registry`] collects the registrations;
//! [`standard_device_registries`] wraps them in the device-keyed registry
//! set an executor consumes.

pub mod elementwise;
pub mod gather;
pub mod scatter;

mod registry;

pub use elementwise::{ScaleOp, SumOp};
pub use gather::GatherOp;
pub use registry::{cpu_operator_registry, standard_device_registries};
pub use scatter::ScatterAssignOp;
