// Licensed under the MIT and Apache-2.0 licenses.

use crate::dtype::{DType, Element};
use crate::error::{BulkIoUnsupported, CubeError, Result};

/// Read surface of an N-dimensional rectangular container. This is the
/// only storage contract the kernels depend on: flat-index scalar access
/// plus (optionally) bulk staged I/O. Containers that cannot honor bulk
/// I/O return [`BulkIoUnsupported`] and the kernels fall back to their
/// elementwise scalar path.
///
/// Flat indices follow last-axis-fastest (row-major) order.
pub trait Cube<T: Element>: Send + Sync {
    fn shape(&self) -> &[usize];

    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    fn length(&self, axis: usize) -> usize {
        self.shape()[axis]
    }

    fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Reads the element at flat index `i`. Panics if out of bounds.
    fn get_at(&self, i: usize) -> T;

    /// Object-level read: `None` denotes a missing element. For the
    /// concrete storages here only float NaN maps to `None`.
    fn get_object_at(&self, i: usize) -> Option<T> {
        let v = self.get_at(i);
        if v.is_missing() {
            None
        } else {
            Some(v)
        }
    }

    /// Bulk staged read: copies `len` elements starting at flat index
    /// `src_off` into `dst[dst_off..dst_off + len]`.
    fn to_flat(
        &self,
        src_off: usize,
        dst: &mut [T],
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported>;

    /// Shape and dtype compatibility. Dtype equality is implied by the
    /// type parameter; only shapes are compared.
    fn matches(&self, other: &dyn Cube<T>) -> bool {
        self.shape() == other.shape()
    }

    fn matches_shape(&self, shape: &[usize]) -> bool {
        self.shape() == shape
    }
}

/// Write surface. Destinations supplied to the three-operand entry points
/// implement this; their entries are the only observable side effect of
/// an operation.
pub trait CubeMut<T: Element>: Cube<T> {
    fn set_at(&mut self, i: usize, v: T);

    fn set_object_at(&mut self, i: usize, v: Option<T>) {
        self.set_at(i, v.unwrap_or(T::MISSING));
    }

    fn fill(&mut self, v: T);

    /// Bulk staged write: copies `src[src_off..src_off + len]` to flat
    /// indices starting at `dst_off`.
    fn from_flat(
        &mut self,
        src: &[T],
        src_off: usize,
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported>;

    /// Hands out a shared writer for bucket workers. See [`ParWriter`].
    fn writer(&mut self) -> Box<dyn ParWriter<T> + '_>;

    fn as_cube(&self) -> &dyn Cube<T>;
}

/// Shared handle through which concurrent bucket workers write one
/// destination cube.
///
/// Invariant (load-bearing for the parallel `extract` path): ranges
/// written by concurrent callers must be disjoint. Packed-boolean
/// implementations additionally make the boundary words of adjacent
/// unaligned regions safe via atomic word updates; everything else relies
/// on the disjointness alone.
pub trait ParWriter<T: Element>: Send + Sync {
    fn set(&self, i: usize, v: T);

    fn write_flat(&self, src: &[T], dst_off: usize);
}

/// One per-axis selector of a logical sub-view: a fixed coordinate (the
/// axis is dropped from the view), a half-open range, or a circular roll
/// of the full axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accessor {
    At(usize),
    Range(usize, usize),
    Roll(isize),
}

/// One axis of a cube: its position and length, with constructors for
/// the accessors that select within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub axis: usize,
    pub length: usize,
}

impl Dimension {
    /// Fixes this axis at `coord` (the axis is dropped from the view).
    pub fn at(&self, coord: usize) -> Result<Accessor> {
        if coord >= self.length {
            return Err(CubeError::IndexOutOfBounds {
                index: coord,
                len: self.length,
            });
        }
        Ok(Accessor::At(coord))
    }

    /// Keeps the half-open window `[from, to)` of this axis.
    pub fn range(&self, from: usize, to: usize) -> Result<Accessor> {
        if from > to || to > self.length {
            return Err(CubeError::IndexOutOfBounds {
                index: to,
                len: self.length,
            });
        }
        Ok(Accessor::Range(from, to))
    }

    /// Keeps the whole axis circularly shifted by `shift`.
    pub fn roll(&self, shift: isize) -> Accessor {
        Accessor::Roll(shift)
    }

    /// Keeps the whole axis.
    pub fn full(&self) -> Accessor {
        Accessor::Range(0, self.length)
    }
}

/// The [`Dimension`] of `axis` in a cube. Panics if the axis does not
/// exist, like [`Cube::length`].
pub fn dim<T: Element>(c: &dyn Cube<T>, axis: usize) -> Dimension {
    Dimension {
        axis,
        length: c.length(axis),
    }
}

pub(crate) fn size_of_shape(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major strides: last axis fastest.
pub(crate) fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

pub(crate) fn ensure_shape(expected: &[usize], got: &[usize]) -> Result<()> {
    if expected != got {
        return Err(CubeError::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        });
    }
    Ok(())
}
