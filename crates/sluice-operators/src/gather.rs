//! Axis-0 gather with index-type specialization.

use sluice_core::{
    dispatch_tensor_types, operator_boilerplate, DeviceOperator, Element, Error, Operator,
    OperatorDef, Result, Tensor, Workspace,
};

/// Conversion from a stored index element to a row offset.
trait AsIndex: Copy {
    fn as_index(self) -> Option<usize>;
}

impl AsIndex for i32 {
    fn as_index(self) -> Option<usize> {
        usize::try_from(self).ok()
    }
}

impl AsIndex for i64 {
    fn as_index(self) -> Option<usize> {
        usize::try_from(self).ok()
    }
}

/// Gathers rows of an f32 data tensor: `Y[k] = X[indices[k]]`.
///
/// Inputs: data (f32, at least 1-d) and indices (i32 or i64; the element
/// type is selected at runtime through the closed-type ladder). Only axis 0
/// is supported; the constructor refuses anything else.
pub struct GatherOp<C: sluice_core::Context> {
    op: Operator<C>,
}

impl<C: sluice_core::Context> GatherOp<C> {
    const DATA: usize = 0;
    const INDICES: usize = 1;

    pub fn new(def: OperatorDef, ws: &mut Workspace) -> Result<Self> {
        let op = Operator::new(def, ws)?;
        let axis = op.get_single_argument("axis", 0i64);
        if axis != 0 {
            return Err(Error::unsupported_feature(format!(
                "Gather supports only axis 0, got axis {axis}"
            )));
        }
        Ok(Self { op })
    }

    fn run_with_type<I: Element + AsIndex + std::fmt::Debug>(&mut self) -> Result<bool> {
        let (out_dims, out): (Vec<usize>, Vec<f32>) = {
            let data = self.op.input(Self::DATA)?;
            let indices = self.op.input(Self::INDICES)?;

            let dims = data.dims();
            if dims.is_empty() {
                return Err(Error::shape("Gather data must be at least 1-d"));
            }
            let rows = dims[0];
            let block: usize = dims[1..].iter().product();

            let src = data.data::<f32>()?;
            let idx = indices.data::<I>()?;

            let mut out = Vec::with_capacity(idx.len() * block);
            for &i in idx {
                let row = i.as_index().filter(|r| *r < rows).ok_or_else(|| {
                    Error::out_of_range(format!(
                        "gather index {i:?} out of range for {rows} rows"
                    ))
                })?;
                out.extend_from_slice(&src[row * block..(row + 1) * block]);
            }

            let mut out_dims = vec![idx.len()];
            out_dims.extend_from_slice(&dims[1..]);
            (out_dims, out)
        };
        *self.op.output(0)? = Tensor::new(out_dims, out)?;
        Ok(true)
    }
}

operator_boilerplate!(GatherOp);

impl<C: sluice_core::Context> DeviceOperator for GatherOp<C> {
    fn run_on_device(&mut self) -> Result<bool> {
        let dtype = self.op.input(Self::INDICES)?.dtype();
        dispatch_tensor_types!(self, dtype, [i32, i64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{CpuContext, ErrorKind, RunnableOperator, Tensor, Workspace};

    fn gather_def() -> OperatorDef {
        OperatorDef::new("Gather")
            .input("data")
            .input("indices")
            .output("out")
    }

    fn workspace_with_data() -> Workspace {
        let mut ws = Workspace::new();
        ws.set_blob(
            "data",
            Tensor::<CpuContext>::new(vec![3, 2], vec![0.0f32, 1.0, 10.0, 11.0, 20.0, 21.0])
                .unwrap(),
        );
        ws
    }

    fn read_out(ws: &Workspace) -> (Vec<usize>, Vec<f32>) {
        let blob = ws.blob("out").unwrap();
        let guard = blob.read().unwrap();
        let tensor = guard.get::<Tensor<CpuContext>>().unwrap();
        (tensor.dims().to_vec(), tensor.data::<f32>().unwrap().to_vec())
    }

    #[test]
    fn test_gather_i64_indices() {
        let mut ws = workspace_with_data();
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![2], vec![2i64, 0]).unwrap(),
        );
        let mut op = GatherOp::<CpuContext>::new(gather_def(), &mut ws).unwrap();
        assert!(op.run().unwrap());

        let (dims, data) = read_out(&ws);
        assert_eq!(dims, vec![2, 2]);
        assert_eq!(data, vec![20.0, 21.0, 0.0, 1.0]);
    }

    #[test]
    fn test_gather_i32_indices() {
        let mut ws = workspace_with_data();
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![3], vec![1i32, 1, 0]).unwrap(),
        );
        let mut op = GatherOp::<CpuContext>::new(gather_def(), &mut ws).unwrap();
        assert!(op.run().unwrap());

        let (dims, data) = read_out(&ws);
        assert_eq!(dims, vec![3, 2]);
        assert_eq!(data, vec![10.0, 11.0, 10.0, 11.0, 0.0, 1.0]);
    }

    #[test]
    fn test_gather_rejects_float_indices() {
        let mut ws = workspace_with_data();
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![1], vec![0.5f32]).unwrap(),
        );
        let mut op = GatherOp::<CpuContext>::new(gather_def(), &mut ws).unwrap();
        let err = op.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(err.to_string().contains("f32"));
    }

    #[test]
    fn test_gather_index_out_of_range() {
        let mut ws = workspace_with_data();
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![1], vec![3i64]).unwrap(),
        );
        let mut op = GatherOp::<CpuContext>::new(gather_def(), &mut ws).unwrap();
        let err = op.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_gather_declines_nonzero_axis() {
        let mut ws = workspace_with_data();
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![1], vec![0i64]).unwrap(),
        );
        let err =
            GatherOp::<CpuContext>::new(gather_def().arg("axis", 1i64), &mut ws).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }
}
