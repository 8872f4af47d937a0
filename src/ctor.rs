// Licensed under the MIT and Apache-2.0 licenses.

//! 1-D constructors and materializing broadcast.

use crate::cast::CastTo;
use crate::cube::{Cube, CubeMut};
use crate::dispatch;
use crate::dtype::{Element, Scalar};
use crate::error::{CubeError, Result};
use crate::ops::ComparisonOp;

/// Clone of a cube, in the dtype's natural storage.
pub fn array<T: Element + CastTo<T>>(src: &dyn Cube<T>) -> Result<Box<dyn CubeMut<T>>> {
    dispatch::copy(src)
}

/// `[start, stop)` stepped by `step`. The step must be nonzero and point
/// from `start` toward `stop`; element `i` is `start + step * i`.
pub fn arange<T: Element>(start: T, stop: T, step: T) -> Result<Box<dyn CubeMut<T>>> {
    if step == T::ZERO {
        return Err(CubeError::InvalidArgument(
            "arange step must be nonzero".into(),
        ));
    }
    let ascending = T::compare(ComparisonOp::Gt, step, T::ZERO);
    let rising = T::compare(ComparisonOp::Gt, stop, start);
    let falling = T::compare(ComparisonOp::Lt, stop, start);
    if (ascending && !rising) || (!ascending && !falling) {
        return Err(CubeError::InvalidArgument(format!(
            "arange step {step:?} does not move from {start:?} toward {stop:?}"
        )));
    }
    let n = T::arange_len(start, stop, step)?;
    let mut dst = T::alloc(&[n]);
    for i in 0..n {
        dst.set_at(i, T::arange_at(start, step, i));
    }
    Ok(dst)
}

/// `[0, stop)` with unit step.
pub fn arange_to<T: Element>(stop: T) -> Result<Box<dyn CubeMut<T>>> {
    arange(T::ZERO, stop, T::ONE)
}

/// `[start, stop)` with unit step.
pub fn arange_between<T: Element>(start: T, stop: T) -> Result<Box<dyn CubeMut<T>>> {
    arange(start, stop, T::ONE)
}

/// Newly-allocated cube of `shape` filled with `value`, which is lifted
/// through the strict round-trip cast (the materializing counterpart to
/// the lazy broadcast view).
pub fn full<T: Element>(shape: &[usize], value: Scalar) -> Result<Box<dyn CubeMut<T>>> {
    let v = T::from_scalar_strict(value)?;
    let mut dst = T::alloc(shape);
    dst.fill(v);
    Ok(dst)
}

/// 1-D [`full`].
pub fn full_1d<T: Element>(size: usize, value: Scalar) -> Result<Box<dyn CubeMut<T>>> {
    full(&[size], value)
}

/// Alias for [`full`].
pub fn broadcast<T: Element>(shape: &[usize], value: Scalar) -> Result<Box<dyn CubeMut<T>>> {
    full(shape, value)
}
