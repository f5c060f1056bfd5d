//! Untyped and device-typed operator layers.
//!
//! [`OperatorBase`] owns the definition and the resolved input/output blob
//! handles; [`RunnableOperator`] is the type-erased execution surface the
//! graph executor drives; [`Operator`] binds the base to an execution
//! context; [`DeviceOperator`] is the extension point concrete operator
//! kinds implement. A blanket impl gives every device operator the final
//! run semantics, so `run`/`run_async` cannot be overridden further down.

use crate::argument::{ArgumentHelper, RepeatedArgument, SingleArgument};
use crate::blob::{BlobReadGuard, BlobWriteGuard, SharedBlob};
use crate::context::Context;
use crate::definition::OperatorDef;
use crate::tensor::Tensor;
use crate::workspace::Workspace;
use crate::{Error, Result};
use std::ops::Deref;

/// The untyped operator layer: a definition bound to workspace blobs.
///
/// Owns its copy of the definition and the derived argument helper; holds
/// shared handles to the workspace's blobs, resolved once at construction
/// in declared order. Deliberately not `Clone`: a copied handle set would
/// be meaningless once blob lifetime is managed externally.
pub struct OperatorBase {
    def: OperatorDef,
    args: ArgumentHelper,
    inputs: Vec<SharedBlob>,
    outputs: Vec<SharedBlob>,
}

impl OperatorBase {
    /// Bind a definition to a workspace.
    ///
    /// Every declared input must already exist in the workspace; outputs
    /// are created if absent. A missing input is a resolution error.
    pub fn new(def: OperatorDef, ws: &mut Workspace) -> Result<Self> {
        let args = ArgumentHelper::new(&def)?;

        let mut inputs = Vec::with_capacity(def.inputs.len());
        for name in &def.inputs {
            let blob = ws.blob(name).ok_or_else(|| {
                Error::resolution(format!(
                    "input blob '{}' does not exist in the workspace (operator {})",
                    name, def.op_type
                ))
            })?;
            inputs.push(blob);
        }

        let outputs = def.outputs.iter().map(|name| ws.create_blob(name)).collect();

        Ok(Self {
            def,
            args,
            inputs,
            outputs,
        })
    }

    /// The operator's own copy of its definition.
    pub fn def(&self) -> &OperatorDef {
        &self.def
    }

    /// The argument accessor derived from the definition.
    pub fn arg_helper(&self) -> &ArgumentHelper {
        &self.args
    }

    /// Check if the definition carries an argument with the given name.
    pub fn has_argument(&self, name: &str) -> bool {
        self.args.has_argument(name)
    }

    /// Typed single-argument lookup with a default.
    pub fn get_single_argument<T: SingleArgument>(&self, name: &str, default: T) -> T {
        self.args.get_single_argument(name, default)
    }

    /// Check if the argument exists and converts to `T`.
    pub fn has_single_argument_of_type<T: SingleArgument>(&self, name: &str) -> bool {
        self.args.has_single_argument_of_type::<T>(name)
    }

    /// Typed repeated-argument lookup; absent yields an empty vector.
    pub fn get_repeated_argument<T: RepeatedArgument>(&self, name: &str) -> Vec<T> {
        self.args.get_repeated_argument(name)
    }

    /// Typed view of the idx-th input blob.
    ///
    /// A payload of a different type is a type-mismatch error, augmented
    /// with the offending blob's declared name.
    pub fn input<T: 'static>(&self, idx: usize) -> Result<BlobReadGuard<'_, T>> {
        let blob = self.input_blob(idx)?;
        BlobReadGuard::new(blob.read().expect("blob lock poisoned")).map_err(|err| {
            err.context(format!(". Offending blob name: {}.", self.def.inputs[idx]))
        })
    }

    /// Typed mutable view of the idx-th output blob.
    ///
    /// The payload is allocated (or replaced) as a default `T` if it is not
    /// one already. An operator whose input and output resolve to the same
    /// blob must drop the input guard before taking this one, or the write
    /// lock will block on the read lock.
    pub fn output<T: Default + Send + Sync + 'static>(
        &self,
        idx: usize,
    ) -> Result<BlobWriteGuard<'_, T>> {
        let blob = self.output_blob(idx)?;
        Ok(BlobWriteGuard::new(
            blob.write().expect("blob lock poisoned"),
        ))
    }

    /// The idx-th input's type-erased container, for operators that branch
    /// on runtime type.
    pub fn input_blob(&self, idx: usize) -> Result<&SharedBlob> {
        self.inputs.get(idx).ok_or_else(|| {
            Error::out_of_range(format!(
                "input index {} out of range ({} inputs) for operator {}",
                idx,
                self.inputs.len(),
                self.def.op_type
            ))
        })
    }

    /// The idx-th output's type-erased container.
    pub fn output_blob(&self, idx: usize) -> Result<&SharedBlob> {
        self.outputs.get(idx).ok_or_else(|| {
            Error::out_of_range(format!(
                "output index {} out of range ({} outputs) for operator {}",
                idx,
                self.outputs.len(),
                self.def.op_type
            ))
        })
    }

    /// Runtime type test on the idx-th input.
    pub fn input_is_type<T: 'static>(&self, idx: usize) -> Result<bool> {
        Ok(self
            .input_blob(idx)?
            .read()
            .expect("blob lock poisoned")
            .is_type::<T>())
    }

    /// Runtime type test on the idx-th output.
    pub fn output_is_type<T: 'static>(&self, idx: usize) -> Result<bool> {
        Ok(self
            .output_blob(idx)?
            .read()
            .expect("blob lock poisoned")
            .is_type::<T>())
    }

    /// Number of resolved inputs.
    pub fn input_size(&self) -> usize {
        self.inputs.len()
    }

    /// Number of resolved outputs.
    pub fn output_size(&self) -> usize {
        self.outputs.len()
    }
}

/// Type-erased execution surface held by the executor.
///
/// Both entry points return `Ok(true)` when the operator ran to
/// completion, `Ok(false)` as a recoverable "did not run to completion"
/// signal, and `Err` for real failures. Callers must treat `Ok(false)` as
/// distinct from an error.
pub trait RunnableOperator: Send {
    /// Synchronous execution; does not return before device work started by
    /// this call has completed.
    fn run(&mut self) -> Result<bool> {
        Err(Error::not_implemented(format!(
            "operator {} does not implement run()",
            self.base().def().op_type
        )))
    }

    /// Asynchronous execution; returns once work is submitted. The caller
    /// owns any synchronization needed before consuming outputs.
    fn run_async(&mut self) -> Result<bool> {
        self.run()
    }

    /// The untyped layer beneath this operator.
    fn base(&self) -> &OperatorBase;
}

/// The device-typed operator layer: an [`OperatorBase`] plus an execution
/// context built from the definition's device option.
///
/// The context is switched to its device during construction so concrete
/// constructors can already touch it.
pub struct Operator<C: Context> {
    base: OperatorBase,
    context: C,
}

impl<C: Context> Operator<C> {
    /// Bind a definition to a workspace and construct the context.
    pub fn new(def: OperatorDef, ws: &mut Workspace) -> Result<Self> {
        let base = OperatorBase::new(def, ws)?;
        let mut context = C::new(&base.def().device_option);
        context.switch_to_device();
        Ok(Self { base, context })
    }

    /// The untyped layer.
    pub fn base(&self) -> &OperatorBase {
        &self.base
    }

    /// The execution context owned by this operator.
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Device-typed view of the idx-th input: the payload must be a
    /// `Tensor<C>`. This is where generic blob access becomes a concrete,
    /// device-resident, shaped array.
    pub fn input(&self, idx: usize) -> Result<BlobReadGuard<'_, Tensor<C>>> {
        self.base.input::<Tensor<C>>(idx)
    }

    /// Device-typed mutable view of the idx-th output.
    pub fn output(&self, idx: usize) -> Result<BlobWriteGuard<'_, Tensor<C>>> {
        self.base.output::<Tensor<C>>(idx)
    }
}

/// Generic blob access and argument forwarding stay reachable on the
/// device-typed layer.
impl<C: Context> Deref for Operator<C> {
    type Target = OperatorBase;

    fn deref(&self) -> &OperatorBase {
        &self.base
    }
}

/// Access to the device-typed layer of a concrete operator.
///
/// Usually generated by [`crate::operator_boilerplate!`] for operators
/// whose device layer lives in a field named `op`.
pub trait AsOperator {
    type Context: Context;

    fn op(&self) -> &Operator<Self::Context>;
    fn op_mut(&mut self) -> &mut Operator<Self::Context>;
}

/// The extension point every concrete operator kind implements.
///
/// Implementing this trait is all it takes to get the final `run` and
/// `run_async` semantics through the blanket [`RunnableOperator`] impl:
/// the device is reselected at the start of every call, errors from
/// `run_on_device` are augmented with the operator's textual definition,
/// and the synchronous path insists on completion confirmation. A context
/// that cannot confirm completion leaves the device in an unknown state,
/// so that case aborts the process rather than propagating; this policy is
/// deliberate and must not be relaxed to a recoverable error.
pub trait DeviceOperator: AsOperator + Send {
    /// Perform the computation with the context's device active.
    fn run_on_device(&mut self) -> Result<bool>;
}

impl<T: DeviceOperator> RunnableOperator for T {
    fn run(&mut self) -> Result<bool> {
        self.op_mut().context_mut().switch_to_device();
        let started = match self.run_on_device() {
            Ok(started) => started,
            Err(err) => {
                return Err(err.context(format!(
                    "\nError from operator:\n{}",
                    self.op().base().def()
                )))
            }
        };
        if !self.op_mut().context_mut().finish_device_computation() {
            tracing::error!(
                operator = %self.op().base().def(),
                "device failed to confirm completion of submitted work; aborting"
            );
            std::process::abort();
        }
        Ok(started)
    }

    fn run_async(&mut self) -> Result<bool> {
        self.op_mut().context_mut().switch_to_device();
        self.run_on_device().map_err(|err| {
            err.context(format!(
                "\nError from operator:\n{}",
                self.op().base().def()
            ))
        })
    }

    fn base(&self) -> &OperatorBase {
        self.op().base()
    }
}

/// Implements [`AsOperator`] for an operator struct, generic over its
/// context, whose device layer lives in a field named `op`.
#[macro_export]
macro_rules! operator_boilerplate {
    ($ty:ident) => {
        impl<C: $crate::Context> $crate::AsOperator for $ty<C> {
            type Context = C;

            fn op(&self) -> &$crate::Operator<C> {
                &self.op
            }

            fn op_mut(&mut self) -> &mut $crate::Operator<C> {
                &mut self.op
            }
        }
    };
}

/// Boilerplate for operators that hold nothing beyond the device layer: a
/// `new` constructor delegating to [`Operator::new`] plus the
/// [`AsOperator`] impl.
#[macro_export]
macro_rules! simple_device_operator {
    ($ty:ident) => {
        impl<C: $crate::Context> $ty<C> {
            pub fn new(
                def: $crate::OperatorDef,
                ws: &mut $crate::Workspace,
            ) -> $crate::Result<Self> {
                Ok(Self {
                    op: $crate::Operator::new(def, ws)?,
                })
            }
        }

        $crate::operator_boilerplate!($ty);
    };
}
