// Licensed under the MIT and Apache-2.0 licenses.

/*!
 * This crate is the vectorized compute core of an N-dimensional array
 * ("cube") engine: element-wise arithmetic, comparison, logical and
 * transcendental operations, reductions, casts, scalar broadcasting,
 * masked application and boolean-mask extraction over homogeneous
 * containers of bool/i32/i64/f32/f64. It provides three notable
 * features:
 *
 *   1. Isolates in one compilation unit the cartesian product of all
 *      primitive operations across all element types, compiled into
 *      (where possible) efficient SIMD loops: one generic kernel per
 *      operation family over an `Element` capability trait, instead of a
 *      hand-duplicated copy per type.
 *
 *   2. Abstracts away runtime strategy selection: kernels stage operand
 *      chunks into small stack buffers, run `wide` vector loops over
 *      them, split large operations into 32-aligned buckets on a
 *      process-wide worker pool, and fall back to an elementwise scalar
 *      path whenever a container cannot honor bulk staged I/O.
 *
 *   3. Keeps the storage contract narrow and dynamically dispatched at
 *      the rim: kernels depend only on the `Cube`/`CubeMut` traits
 *      (flat-index access plus bulk staged I/O), so contiguous arrays,
 *      packed bitsets, scalar-broadcast views and strided slice views
 *      all flow through the same entry points. Dispatch cost is paid
 *      once per operation, never per element.
 *
 * This is the kind of building block that sits under a numerical-array
 * front end: the outer layer owns shapes, views and user types, and
 * comes back to these inner loops only once per bulk operation.
 */

#[macro_use]
mod macros;

mod axis;
mod cast;
mod config;
mod ctor;
mod cube;
mod dense;
mod dispatch;
mod dtype;
mod error;
mod kernels;
mod ops;
mod pool;
mod view;

pub mod math;

#[cfg(test)]
mod tests;

// The public API. Intentionally narrow: traits and tags out of the
// internals, one entry point per operation family and variant.
pub use cast::CastTo;
pub use config::{settings, Settings, STAGING_SIZE};
pub use ctor::{arange, arange_between, arange_to, array, broadcast, full, full_1d};
pub use cube::{dim, Accessor, Cube, CubeMut, Dimension, ParWriter};
pub use dense::{BitsetCube, DenseCube};
pub use dispatch::{
    associative_op, associative_op_by_axes, binary_op, binary_op_into, binary_op_scalar_lhs,
    binary_op_scalar_lhs_into, binary_op_scalar_rhs, binary_op_scalar_rhs_into, comparison_op,
    comparison_op_into, comparison_op_scalar_lhs, comparison_op_scalar_lhs_into,
    comparison_op_scalar_rhs, comparison_op_scalar_rhs_into, copy, copy_into, extract, popcount,
    predicate_op, predicate_op_into, reductive_logic_op, reductive_logic_op_by_axes, to_bool_cube,
    to_f32_cube, to_f64_cube, to_i32_cube, to_i64_cube, unary_op, unary_op_into,
};
pub use dtype::{DType, Element, Scalar};
pub use error::{BulkIoUnsupported, CubeError, Result};
pub use ops::{AssociativeOp, BinaryOp, ComparisonOp, PredicateOp, ReductiveLogicOp, UnaryOp};
pub use view::{BroadcastCube, SliceCube};
