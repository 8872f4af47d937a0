// Licensed under the MIT and Apache-2.0 licenses.

use crate::cube::{row_major_strides, size_of_shape, Accessor, Cube};
use crate::dtype::Element;
use crate::error::{BulkIoUnsupported, CubeError, Result};

/// Immutable zero-storage view of one value across a shape. Scalar
/// operands are lifted through this so every scalar-vs-cube entry point
/// lowers to the cube-vs-cube kernels.
#[derive(Debug, Clone)]
pub struct BroadcastCube<T: Element> {
    shape: Vec<usize>,
    size: usize,
    value: T,
}

impl<T: Element> BroadcastCube<T> {
    pub fn new(shape: Vec<usize>, value: T) -> Self {
        let size = size_of_shape(&shape);
        BroadcastCube { shape, size, value }
    }

    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Element> Cube<T> for BroadcastCube<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn size(&self) -> usize {
        self.size
    }

    fn get_at(&self, i: usize) -> T {
        assert!(i < self.size);
        self.value
    }

    fn to_flat(
        &self,
        src_off: usize,
        dst: &mut [T],
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported> {
        assert!(src_off + len <= self.size);
        dst[dst_off..dst_off + len].fill(self.value);
        Ok(())
    }
}

/// Logical sub-view of a base cube described by one [`Accessor`] per base
/// axis. `At` fixes a coordinate and drops the axis from the view;
/// `Range` keeps a half-open window; `Roll` keeps the axis at full length
/// circularly shifted, so view element `j` reads base element
/// `(j - shift) mod len` along that axis.
///
/// The view is not contiguous in general, so it reports bulk staged I/O
/// as unsupported; kernels running over it take their scalar path.
pub struct SliceCube<'a, T: Element> {
    base: &'a dyn Cube<T>,
    accessors: Vec<Accessor>,
    base_shape: Vec<usize>,
    base_strides: Vec<usize>,
    shape: Vec<usize>,
    view_strides: Vec<usize>,
}

impl<'a, T: Element> SliceCube<'a, T> {
    pub fn new(base: &'a dyn Cube<T>, accessors: &[Accessor]) -> Result<Self> {
        let base_shape = base.shape().to_vec();
        if accessors.len() != base_shape.len() {
            return Err(CubeError::InvalidArgument(format!(
                "{} accessors for {} axes",
                accessors.len(),
                base_shape.len()
            )));
        }
        let mut shape = Vec::new();
        for (axis, acc) in accessors.iter().enumerate() {
            let len = base_shape[axis];
            match *acc {
                Accessor::At(c) => {
                    if c >= len {
                        return Err(CubeError::IndexOutOfBounds { index: c, len });
                    }
                }
                Accessor::Range(a, b) => {
                    if a > b || b > len {
                        return Err(CubeError::IndexOutOfBounds { index: b, len });
                    }
                    shape.push(b - a);
                }
                Accessor::Roll(_) => shape.push(len),
            }
        }
        let base_strides = row_major_strides(&base_shape);
        let view_strides = row_major_strides(&shape);
        Ok(SliceCube {
            base,
            accessors: accessors.to_vec(),
            base_shape,
            base_strides,
            shape,
            view_strides,
        })
    }
}

impl<T: Element> Cube<T> for SliceCube<'_, T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn get_at(&self, i: usize) -> T {
        let mut rem = i;
        let mut flat = 0usize;
        let mut k = 0usize;
        for (axis, acc) in self.accessors.iter().enumerate() {
            match *acc {
                Accessor::At(c) => flat += c * self.base_strides[axis],
                Accessor::Range(a, _) => {
                    let coord = rem / self.view_strides[k];
                    rem %= self.view_strides[k];
                    k += 1;
                    flat += (a + coord) * self.base_strides[axis];
                }
                Accessor::Roll(s) => {
                    let coord = rem / self.view_strides[k];
                    rem %= self.view_strides[k];
                    k += 1;
                    let n = self.base_shape[axis] as isize;
                    let c = (coord as isize - s).rem_euclid(n) as usize;
                    flat += c * self.base_strides[axis];
                }
            }
        }
        self.base.get_at(flat)
    }

    fn to_flat(
        &self,
        _src_off: usize,
        _dst: &mut [T],
        _dst_off: usize,
        _len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported> {
        Err(BulkIoUnsupported)
    }
}
