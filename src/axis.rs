// Licensed under the MIT and Apache-2.0 licenses.

//! Axis-wise reduction driver.
//!
//! An N-dimensional ripple counter walks every coordinate tuple over the
//! non-reduced axes (last axis fastest, matching row-major flat order),
//! builds a slice view that spans the reduced axes at that tuple, runs
//! the scalar reduction over the view, and writes the result at the
//! matching flat index of the destination.

use crate::cube::{Accessor, Cube, CubeMut};
use crate::dtype::Element;
use crate::error::{CubeError, Result};
use crate::kernels;
use crate::ops::{AssociativeOp, ReductiveLogicOp};
use crate::view::SliceCube;

/// Coordinate-tuple iterator: increments the last axis first and carries
/// left; over zero axes it yields exactly one empty tuple.
pub(crate) struct RippleCounter {
    dims: Vec<usize>,
    coords: Vec<usize>,
    done: bool,
}

impl RippleCounter {
    pub(crate) fn new(dims: Vec<usize>) -> Self {
        let done = dims.iter().any(|&d| d == 0);
        RippleCounter {
            coords: vec![0; dims.len()],
            dims,
            done,
        }
    }
}

impl Iterator for RippleCounter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let out = self.coords.clone();
        let mut axis = self.dims.len();
        loop {
            if axis == 0 {
                self.done = true;
                break;
            }
            axis -= 1;
            self.coords[axis] += 1;
            if self.coords[axis] < self.dims[axis] {
                break;
            }
            self.coords[axis] = 0;
        }
        Some(out)
    }
}

/// Per-axis reduction flags. An empty axis list reduces over everything.
fn normalize_axes(ndim: usize, axes: &[usize]) -> Result<Vec<bool>> {
    if axes.is_empty() {
        return Ok(vec![true; ndim]);
    }
    let mut reduced = vec![false; ndim];
    for &axis in axes {
        if axis >= ndim {
            return Err(CubeError::IndexOutOfBounds {
                index: axis,
                len: ndim,
            });
        }
        if reduced[axis] {
            return Err(CubeError::InvalidArgument(format!("duplicate axis {axis}")));
        }
        reduced[axis] = true;
    }
    Ok(reduced)
}

fn tuple_accessors(shape: &[usize], reduced: &[bool], coords: &[usize]) -> Vec<Accessor> {
    let mut k = 0usize;
    shape
        .iter()
        .enumerate()
        .map(|(axis, &len)| {
            if reduced[axis] {
                Accessor::Range(0, len)
            } else {
                let c = coords[k];
                k += 1;
                Accessor::At(c)
            }
        })
        .collect()
}

pub(crate) fn reduce_by_axes<T: Element>(
    op: AssociativeOp,
    a: &dyn Cube<T>,
    axes: &[usize],
    init: Option<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<Box<dyn CubeMut<T>>> {
    let reduced = normalize_axes(a.ndim(), axes)?;
    let kept: Vec<usize> = a
        .shape()
        .iter()
        .zip(&reduced)
        .filter(|(_, &r)| !r)
        .map(|(&d, _)| d)
        .collect();
    let out_shape = if kept.is_empty() { vec![1] } else { kept.clone() };
    let mut dst = T::alloc(&out_shape);
    for (k, coords) in RippleCounter::new(kept).enumerate() {
        let accessors = tuple_accessors(a.shape(), &reduced, &coords);
        let slice = SliceCube::new(a, &accessors)?;
        let wslice = match w {
            Some(w) => Some(SliceCube::new(w, &accessors)?),
            None => None,
        };
        let v = kernels::reduce(
            op,
            &slice,
            init,
            wslice.as_ref().map(|s| s as &dyn Cube<bool>),
        )?;
        dst.set_at(k, v);
    }
    Ok(dst)
}

pub(crate) fn logic_by_axes<T: Element>(
    op: ReductiveLogicOp,
    a: &dyn Cube<T>,
    axes: &[usize],
    w: Option<&dyn Cube<bool>>,
) -> Result<Box<dyn CubeMut<bool>>> {
    let reduced = normalize_axes(a.ndim(), axes)?;
    let kept: Vec<usize> = a
        .shape()
        .iter()
        .zip(&reduced)
        .filter(|(_, &r)| !r)
        .map(|(&d, _)| d)
        .collect();
    let out_shape = if kept.is_empty() { vec![1] } else { kept.clone() };
    let mut dst = <bool as Element>::alloc(&out_shape);
    for (k, coords) in RippleCounter::new(kept).enumerate() {
        let accessors = tuple_accessors(a.shape(), &reduced, &coords);
        let slice = SliceCube::new(a, &accessors)?;
        let wslice = match w {
            Some(w) => Some(SliceCube::new(w, &accessors)?),
            None => None,
        };
        let v = kernels::logic(
            op,
            &slice,
            wslice.as_ref().map(|s| s as &dyn Cube<bool>),
        )?;
        dst.set_at(k, v);
    }
    Ok(dst)
}
