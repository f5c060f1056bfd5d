//! Row scatter with block-size specialization.

use sluice_core::{
    dispatch_fixed_values, simple_device_operator, DeviceOperator, Error, Operator, Result, Tensor,
};

/// Copies an f32 data tensor, then overwrites the rows named by an i64
/// index tensor with the corresponding rows of a slices tensor.
///
/// Inputs: data (f32, at least 1-d), indices (i64), slices (f32, one row
/// per index). The per-row copy width is specialized through the
/// fixed-value ladder for the common widths 1 and 4; other widths take the
/// runtime-sized fallback path.
pub struct ScatterAssignOp<C: sluice_core::Context> {
    op: Operator<C>,
}

simple_device_operator!(ScatterAssignOp);

impl<C: sluice_core::Context> ScatterAssignOp<C> {
    const DATA: usize = 0;
    const INDICES: usize = 1;
    const SLICES: usize = 2;

    fn run_with_value<const BLOCK: i64>(&mut self) -> Result<bool> {
        let (dims, out): (Vec<usize>, Vec<f32>) = {
            let data = self.op.input(Self::DATA)?;
            let indices = self.op.input(Self::INDICES)?;
            let slices = self.op.input(Self::SLICES)?;

            let dims = data.dims().to_vec();
            let rows = dims[0];
            // The sentinel means "not a specialized width": recompute.
            let block = if BLOCK >= 0 {
                BLOCK as usize
            } else {
                dims[1..].iter().product()
            };

            let idx = indices.data::<i64>()?;
            let sl = slices.data::<f32>()?;
            if sl.len() != idx.len() * block {
                return Err(Error::shape(format!(
                    "ScatterAssign slices hold {} elements, expected {} ({} rows of width {})",
                    sl.len(),
                    idx.len() * block,
                    idx.len(),
                    block
                )));
            }

            let mut out = data.data::<f32>()?.to_vec();
            for (k, &i) in idx.iter().enumerate() {
                let row = usize::try_from(i).ok().filter(|r| *r < rows).ok_or_else(|| {
                    Error::out_of_range(format!(
                        "scatter index {i} out of range for {rows} rows"
                    ))
                })?;
                out[row * block..(row + 1) * block]
                    .copy_from_slice(&sl[k * block..(k + 1) * block]);
            }
            (dims, out)
        };
        *self.op.output(0)? = Tensor::new(dims, out)?;
        Ok(true)
    }
}

impl<C: sluice_core::Context> DeviceOperator for ScatterAssignOp<C> {
    fn run_on_device(&mut self) -> Result<bool> {
        let block = {
            let data = self.op.input(Self::DATA)?;
            let dims = data.dims();
            if dims.is_empty() {
                return Err(Error::shape("ScatterAssign data must be at least 1-d"));
            }
            dims[1..].iter().product::<usize>() as i64
        };
        dispatch_fixed_values!(self, block, [1, 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{
        CpuContext, ErrorKind, OperatorDef, RunnableOperator, Tensor, Workspace,
    };

    fn scatter_def() -> OperatorDef {
        OperatorDef::new("ScatterAssign")
            .input("data")
            .input("indices")
            .input("slices")
            .output("out")
    }

    fn run_scatter(
        data_dims: Vec<usize>,
        data: Vec<f32>,
        indices: Vec<i64>,
        slice_dims: Vec<usize>,
        slices: Vec<f32>,
    ) -> (Vec<usize>, Vec<f32>) {
        let mut ws = Workspace::new();
        let index_count = indices.len();
        ws.set_blob(
            "data",
            Tensor::<CpuContext>::new(data_dims, data).unwrap(),
        );
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![index_count], indices).unwrap(),
        );
        ws.set_blob(
            "slices",
            Tensor::<CpuContext>::new(slice_dims, slices).unwrap(),
        );
        let mut op = ScatterAssignOp::<CpuContext>::new(scatter_def(), &mut ws).unwrap();
        assert!(op.run().unwrap());

        let blob = ws.blob("out").unwrap();
        let guard = blob.read().unwrap();
        let tensor = guard.get::<Tensor<CpuContext>>().unwrap();
        (tensor.dims().to_vec(), tensor.data::<f32>().unwrap().to_vec())
    }

    #[test]
    fn test_scatter_block_width_one() {
        let (dims, out) = run_scatter(
            vec![4],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1, 3],
            vec![2],
            vec![5.0, 6.0],
        );
        assert_eq!(dims, vec![4]);
        assert_eq!(out, vec![0.0, 5.0, 0.0, 6.0]);
    }

    #[test]
    fn test_scatter_block_width_four() {
        let (dims, out) = run_scatter(
            vec![2, 4],
            vec![0.0; 8],
            vec![1],
            vec![1, 4],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        assert_eq!(dims, vec![2, 4]);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_scatter_fallback_width() {
        // Width 3 is not a specialized candidate; the sentinel path runs.
        let (_, out) = run_scatter(
            vec![2, 3],
            vec![0.0; 6],
            vec![0],
            vec![1, 3],
            vec![7.0, 8.0, 9.0],
        );
        assert_eq!(out, vec![7.0, 8.0, 9.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scatter_index_out_of_range() {
        let mut ws = Workspace::new();
        ws.set_blob("data", Tensor::<CpuContext>::filled(&[2], 0.0f32));
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![1], vec![-1i64]).unwrap(),
        );
        ws.set_blob("slices", Tensor::<CpuContext>::filled(&[1], 1.0f32));
        let mut op = ScatterAssignOp::<CpuContext>::new(scatter_def(), &mut ws).unwrap();
        let err = op.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_scatter_slices_shape_mismatch() {
        let mut ws = Workspace::new();
        ws.set_blob("data", Tensor::<CpuContext>::filled(&[2, 4], 0.0f32));
        ws.set_blob(
            "indices",
            Tensor::<CpuContext>::new(vec![1], vec![0i64]).unwrap(),
        );
        // One row of width 3 against data rows of width 4.
        ws.set_blob("slices", Tensor::<CpuContext>::filled(&[1, 3], 1.0f32));
        let mut op = ScatterAssignOp::<CpuContext>::new(scatter_def(), &mut ws).unwrap();
        let err = op.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }
}
