//! Compile-time dispatch ladders for value- and type-specialized kernels.
//!
//! Concrete operators often want a hot loop specialized on a small closed
//! set of block sizes or element types without paying a runtime branch per
//! element. The two macros here unroll, at expansion time, a chain of
//! equality tests over the candidate list; the first match invokes the
//! correspondingly specialized method on the operator. Beyond one equality
//! test per remaining candidate there is no runtime cost, and each arm is
//! a separate monomorphization.
//!
//! The per-specialization methods are duck-typed: the macros call
//! `run_with_value::<N>()` / `run_with_type::<T>()` on whatever expression
//! is passed as the operator, so the methods can be inherent, private, and
//! shaped however the operator likes, as long as they return
//! `Result<bool>`.

/// Dispatch on a fixed, closed set of integer values.
///
/// Tests `value` against each candidate in list order; the first match
/// calls `op.run_with_value::<{candidate}>()`. When no candidate matches,
/// the sentinel specialization `run_with_value::<{-1}>()` runs as the
/// catch-all, so the ladder itself never fails. Order the most likely
/// candidate first; correctness does not depend on order since the values
/// are disjoint.
///
/// # Example
///
/// ```ignore
/// fn run_on_device(&mut self) -> Result<bool> {
///     let block = self.row_width() as i64;
///     dispatch_fixed_values!(self, block, [1, 4])
/// }
///
/// fn run_with_value<const BLOCK: i64>(&mut self) -> Result<bool> {
///     // BLOCK is -1 on the fallback path
///     ...
/// }
/// ```
#[macro_export]
macro_rules! dispatch_fixed_values {
    ($op:expr, $value:expr, [$($candidate:literal),+ $(,)?]) => {{
        let value: i64 = $value;
        $crate::dispatch_fixed_values!(@arm $op, value, $($candidate),+)
    }};
    (@arm $op:expr, $value:ident, $head:literal $(, $rest:literal)*) => {
        if $value == $head {
            $op.run_with_value::<{ $head }>()
        } else {
            $crate::dispatch_fixed_values!(@arm $op, $value $(, $rest)*)
        }
    };
    (@arm $op:expr, $value:ident) => {
        $op.run_with_value::<{ -1 }>()
    };
}

/// Dispatch on a closed set of element types.
///
/// Tests the runtime descriptor against each candidate's
/// [`Element::DTYPE`](crate::Element) in list order; the first match calls
/// `op.run_with_type::<Candidate>()`. Exhausting the list is an
/// unsupported-type error naming the unmatched descriptor; there is no
/// fallback, because silently running a wrong-type computation would
/// corrupt results.
///
/// # Example
///
/// ```ignore
/// fn run_on_device(&mut self) -> Result<bool> {
///     let dtype = self.op.input(0)?.dtype();
///     dispatch_tensor_types!(self, dtype, [i32, i64])
/// }
/// ```
#[macro_export]
macro_rules! dispatch_tensor_types {
    ($op:expr, $dtype:expr, [$($candidate:ty),+ $(,)?]) => {{
        let dtype: $crate::DataType = $dtype;
        $crate::dispatch_tensor_types!(@arm $op, dtype, $($candidate),+)
    }};
    (@arm $op:expr, $dtype:ident, $head:ty $(, $rest:ty)*) => {
        if $dtype == <$head as $crate::Element>::DTYPE {
            $op.run_with_type::<$head>()
        } else {
            $crate::dispatch_tensor_types!(@arm $op, $dtype $(, $rest)*)
        }
    };
    (@arm $op:expr, $dtype:ident) => {
        ::std::result::Result::Err($crate::Error::unsupported_type(format!(
            "unsupported tensor type: {}",
            $dtype
        )))
    };
}
