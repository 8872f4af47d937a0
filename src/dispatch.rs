// Licensed under the MIT and Apache-2.0 licenses.

//! Public entry points.
//!
//! Each operation family has one entry per arity/variant: two-operand,
//! three-operand (caller-supplied destination, optional where-mask), and
//! scalar-lhs/scalar-rhs forms that lift the scalar through a strict cast
//! into a [`BroadcastCube`] before running the cube-vs-cube kernel.
//!
//! The dispatcher validates shapes and op support up front (so a failed
//! validation never touches the destination), allocates the natural
//! result cube when none is supplied, and routes to the generic kernel;
//! it never reads operand data itself.

use crate::axis;
use crate::cast::CastTo;
use crate::cube::{ensure_shape, Cube, CubeMut};
use crate::dtype::{Element, Scalar};
use crate::error::{CubeError, Result};
use crate::kernels;
use crate::ops::{AssociativeOp, BinaryOp, ComparisonOp, PredicateOp, ReductiveLogicOp, UnaryOp};
use crate::view::BroadcastCube;

fn ensure_binary_support<T: Element>(op: BinaryOp) -> Result<()> {
    if T::supports_binary(op) {
        Ok(())
    } else {
        Err(CubeError::UnsupportedOp {
            op: op.name(),
            dtype: T::DTYPE,
        })
    }
}

fn ensure_unary_support<T: Element>(op: UnaryOp) -> Result<()> {
    if T::supports_unary(op) {
        Ok(())
    } else {
        Err(CubeError::UnsupportedOp {
            op: op.name(),
            dtype: T::DTYPE,
        })
    }
}

fn ensure_mask<T: Element>(a: &dyn Cube<T>, w: Option<&dyn Cube<bool>>) -> Result<()> {
    if let Some(w) = w {
        ensure_shape(a.shape(), w.shape())?;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Binary
////////////////////////////////////////////////////////////////////////////////

pub fn binary_op<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
) -> Result<Box<dyn CubeMut<T>>> {
    ensure_binary_support::<T>(op)?;
    ensure_shape(a.shape(), b.shape())?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "binary");
    let mut dst = T::alloc(a.shape());
    kernels::binary(op, a, b, &mut *dst, None)?;
    Ok(dst)
}

pub fn binary_op_into<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    ensure_binary_support::<T>(op)?;
    ensure_shape(a.shape(), b.shape())?;
    ensure_shape(a.shape(), dst.shape())?;
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "binary into");
    kernels::binary(op, a, b, dst, w)
}

pub fn binary_op_scalar_rhs<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    s: Scalar,
) -> Result<Box<dyn CubeMut<T>>> {
    let v = T::from_scalar_strict(s)?;
    let b = BroadcastCube::new(a.shape().to_vec(), v);
    binary_op(op, a, &b)
}

pub fn binary_op_scalar_lhs<T: Element>(
    op: BinaryOp,
    s: Scalar,
    b: &dyn Cube<T>,
) -> Result<Box<dyn CubeMut<T>>> {
    let v = T::from_scalar_strict(s)?;
    let a = BroadcastCube::new(b.shape().to_vec(), v);
    binary_op(op, &a, b)
}

pub fn binary_op_scalar_rhs_into<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    s: Scalar,
    dst: &mut dyn CubeMut<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let v = T::from_scalar_strict(s)?;
    let b = BroadcastCube::new(a.shape().to_vec(), v);
    binary_op_into(op, a, &b, dst, w)
}

pub fn binary_op_scalar_lhs_into<T: Element>(
    op: BinaryOp,
    s: Scalar,
    b: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let v = T::from_scalar_strict(s)?;
    let a = BroadcastCube::new(b.shape().to_vec(), v);
    binary_op_into(op, &a, b, dst, w)
}

////////////////////////////////////////////////////////////////////////////////
// Unary
////////////////////////////////////////////////////////////////////////////////

pub fn unary_op<T: Element>(op: UnaryOp, a: &dyn Cube<T>) -> Result<Box<dyn CubeMut<T>>> {
    ensure_unary_support::<T>(op)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "unary");
    let mut dst = T::alloc(a.shape());
    kernels::unary(op, a, &mut *dst, None)?;
    Ok(dst)
}

pub fn unary_op_into<T: Element>(
    op: UnaryOp,
    a: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    ensure_unary_support::<T>(op)?;
    ensure_shape(a.shape(), dst.shape())?;
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "unary into");
    kernels::unary(op, a, dst, w)
}

////////////////////////////////////////////////////////////////////////////////
// Comparison
////////////////////////////////////////////////////////////////////////////////

pub fn comparison_op<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
) -> Result<Box<dyn CubeMut<bool>>> {
    ensure_shape(a.shape(), b.shape())?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "comparison");
    let mut dst = <bool as Element>::alloc(a.shape());
    kernels::compare(op, a, b, &mut *dst, None)?;
    Ok(dst)
}

pub fn comparison_op_into<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    dst: &mut dyn CubeMut<bool>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    ensure_shape(a.shape(), b.shape())?;
    // Comparison destinations need only match the operand shape.
    ensure_shape(a.shape(), dst.shape())?;
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "comparison into");
    kernels::compare(op, a, b, dst, w)
}

pub fn comparison_op_scalar_rhs<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    s: Scalar,
) -> Result<Box<dyn CubeMut<bool>>> {
    let v = T::from_scalar_strict(s)?;
    let b = BroadcastCube::new(a.shape().to_vec(), v);
    comparison_op(op, a, &b)
}

pub fn comparison_op_scalar_lhs<T: Element>(
    op: ComparisonOp,
    s: Scalar,
    b: &dyn Cube<T>,
) -> Result<Box<dyn CubeMut<bool>>> {
    let v = T::from_scalar_strict(s)?;
    let a = BroadcastCube::new(b.shape().to_vec(), v);
    comparison_op(op, &a, b)
}

pub fn comparison_op_scalar_rhs_into<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    s: Scalar,
    dst: &mut dyn CubeMut<bool>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let v = T::from_scalar_strict(s)?;
    let b = BroadcastCube::new(a.shape().to_vec(), v);
    comparison_op_into(op, a, &b, dst, w)
}

pub fn comparison_op_scalar_lhs_into<T: Element>(
    op: ComparisonOp,
    s: Scalar,
    b: &dyn Cube<T>,
    dst: &mut dyn CubeMut<bool>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let v = T::from_scalar_strict(s)?;
    let a = BroadcastCube::new(b.shape().to_vec(), v);
    comparison_op_into(op, &a, b, dst, w)
}

////////////////////////////////////////////////////////////////////////////////
// Predicates
////////////////////////////////////////////////////////////////////////////////

pub fn predicate_op<T: Element>(
    op: PredicateOp,
    a: &dyn Cube<T>,
) -> Result<Box<dyn CubeMut<bool>>> {
    if !T::supports_predicate() {
        return Err(CubeError::UnsupportedOp {
            op: op.name(),
            dtype: T::DTYPE,
        });
    }
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "predicate");
    let mut dst = <bool as Element>::alloc(a.shape());
    kernels::predicate(op, a, &mut *dst, None)?;
    Ok(dst)
}

pub fn predicate_op_into<T: Element>(
    op: PredicateOp,
    a: &dyn Cube<T>,
    dst: &mut dyn CubeMut<bool>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    if !T::supports_predicate() {
        return Err(CubeError::UnsupportedOp {
            op: op.name(),
            dtype: T::DTYPE,
        });
    }
    ensure_shape(a.shape(), dst.shape())?;
    ensure_mask(a, w)?;
    kernels::predicate(op, a, dst, w)
}

////////////////////////////////////////////////////////////////////////////////
// Reductions
////////////////////////////////////////////////////////////////////////////////

pub fn associative_op<T: Element>(
    op: AssociativeOp,
    a: &dyn Cube<T>,
    init: Option<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<T> {
    if !T::supports_associative() {
        return Err(CubeError::UnsupportedOp {
            op: op.name(),
            dtype: T::DTYPE,
        });
    }
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "reduce");
    kernels::reduce(op, a, init, w)
}

pub fn associative_op_by_axes<T: Element>(
    op: AssociativeOp,
    a: &dyn Cube<T>,
    axes: &[usize],
    init: Option<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<Box<dyn CubeMut<T>>> {
    if !T::supports_associative() {
        return Err(CubeError::UnsupportedOp {
            op: op.name(),
            dtype: T::DTYPE,
        });
    }
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, ?axes, "reduce by axes");
    axis::reduce_by_axes(op, a, axes, init, w)
}

pub fn reductive_logic_op<T: Element>(
    op: ReductiveLogicOp,
    a: &dyn Cube<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<bool> {
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, size = a.size(), "logic reduce");
    kernels::logic(op, a, w)
}

pub fn reductive_logic_op_by_axes<T: Element>(
    op: ReductiveLogicOp,
    a: &dyn Cube<T>,
    axes: &[usize],
    w: Option<&dyn Cube<bool>>,
) -> Result<Box<dyn CubeMut<bool>>> {
    ensure_mask(a, w)?;
    tracing::trace!(op = op.name(), dtype = %T::DTYPE, ?axes, "logic reduce by axes");
    axis::logic_by_axes(op, a, axes, w)
}

////////////////////////////////////////////////////////////////////////////////
// Popcount and extract
////////////////////////////////////////////////////////////////////////////////

pub fn popcount(c: &dyn Cube<bool>) -> Result<usize> {
    kernels::popcount(c)
}

/// Gathers the elements of `a` where `c` is true into a fresh 1-D cube,
/// in flattened order. The output length is `popcount(c)`.
pub fn extract<T: Element>(
    c: &dyn Cube<bool>,
    a: &dyn Cube<T>,
) -> Result<Box<dyn CubeMut<T>>> {
    ensure_shape(a.shape(), c.shape())?;
    let n = kernels::popcount(c)?;
    tracing::trace!(dtype = %T::DTYPE, size = a.size(), hits = n, "extract");
    let mut dst = T::alloc(&[n]);
    kernels::extract_into(c, a, &mut *dst)?;
    Ok(dst)
}

////////////////////////////////////////////////////////////////////////////////
// Cast and copy
////////////////////////////////////////////////////////////////////////////////

/// Allocates a like-shaped cube of the same dtype and copies into it.
pub fn copy<T: Element + CastTo<T>>(src: &dyn Cube<T>) -> Result<Box<dyn CubeMut<T>>> {
    let mut dst = T::alloc(src.shape());
    kernels::cast(src, &mut *dst)?;
    Ok(dst)
}

/// Copies into a caller-supplied destination of identical shape and dtype.
pub fn copy_into<T: Element + CastTo<T>>(
    src: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
) -> Result<()> {
    ensure_shape(src.shape(), dst.shape())?;
    kernels::cast(src, dst)
}

macro_rules! impl_to_cube {
    ($($name:ident -> $D:ty),* $(,)?) => {
        $(
            /// Converts into a fresh cube with the target element type's
            /// natural storage, applying the per-pair conversion rule.
            pub fn $name<S: Element + CastTo<$D>>(
                src: &dyn Cube<S>,
            ) -> Result<Box<dyn CubeMut<$D>>> {
                tracing::trace!(from = %S::DTYPE, to = %<$D as Element>::DTYPE, "cast");
                let mut dst = <$D as Element>::alloc(src.shape());
                kernels::cast(src, &mut *dst)?;
                Ok(dst)
            }
        )*
    }
}

impl_to_cube!(
    to_bool_cube -> bool,
    to_i32_cube -> i32,
    to_i64_cube -> i64,
    to_f32_cube -> f32,
    to_f64_cube -> f64,
);
