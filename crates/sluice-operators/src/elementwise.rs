//! Elementwise reference operators.

use sluice_core::{
    operator_boilerplate, DeviceOperator, Error, Operator, OperatorDef, Result, Tensor, Workspace,
};

/// Scales its f32 input by the `scale` argument: `Y = scale * X`.
///
/// `scale` defaults to 1.0, making the operator an identity copy.
pub struct ScaleOp<C: sluice_core::Context> {
    op: Operator<C>,
    scale: f32,
}

impl<C: sluice_core::Context> ScaleOp<C> {
    pub fn new(def: OperatorDef, ws: &mut Workspace) -> Result<Self> {
        let op = Operator::new(def, ws)?;
        let scale = op.get_single_argument("scale", 1.0f32);
        Ok(Self { op, scale })
    }
}

operator_boilerplate!(ScaleOp);

impl<C: sluice_core::Context> DeviceOperator for ScaleOp<C> {
    fn run_on_device(&mut self) -> Result<bool> {
        let (dims, scaled): (Vec<usize>, Vec<f32>) = {
            let x = self.op.input(0)?;
            let data = x.data::<f32>()?;
            (
                x.dims().to_vec(),
                data.iter().map(|v| v * self.scale).collect(),
            )
        };
        *self.op.output(0)? = Tensor::new(dims, scaled)?;
        Ok(true)
    }
}

/// Elementwise sum of N same-shaped f32 inputs.
pub struct SumOp<C: sluice_core::Context> {
    op: Operator<C>,
}

impl<C: sluice_core::Context> SumOp<C> {
    pub fn new(def: OperatorDef, ws: &mut Workspace) -> Result<Self> {
        let op = Operator::new(def, ws)?;
        if op.input_size() == 0 {
            return Err(Error::invalid_definition(
                "Sum needs at least one input",
            ));
        }
        Ok(Self { op })
    }
}

operator_boilerplate!(SumOp);

impl<C: sluice_core::Context> DeviceOperator for SumOp<C> {
    fn run_on_device(&mut self) -> Result<bool> {
        let (dims, acc): (Vec<usize>, Vec<f32>) = {
            let first = self.op.input(0)?;
            let dims = first.dims().to_vec();
            let mut acc = first.data::<f32>()?.to_vec();
            drop(first);

            for idx in 1..self.op.input_size() {
                let x = self.op.input(idx)?;
                if x.dims() != dims.as_slice() {
                    return Err(Error::shape(format!(
                        "Sum input {} has shape {:?}, expected {:?}",
                        idx,
                        x.dims(),
                        dims
                    )));
                }
                for (a, v) in acc.iter_mut().zip(x.data::<f32>()?) {
                    *a += v;
                }
            }
            (dims, acc)
        };
        *self.op.output(0)? = Tensor::new(dims, acc)?;
        Ok(true)
    }
}
