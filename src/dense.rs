// Licensed under the MIT and Apache-2.0 licenses.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::cube::{size_of_shape, Cube, CubeMut, ParWriter};
use crate::dtype::Element;
use crate::error::{BulkIoUnsupported, CubeError, Result};

/// Contiguous `Vec`-backed storage; the natural destination for the
/// numeric element types. Bulk staged I/O is a memcpy.
#[derive(Debug, Clone)]
pub struct DenseCube<T: Element> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Element> DenseCube<T> {
    pub fn new(shape: &[usize]) -> Self {
        DenseCube {
            shape: shape.to_vec(),
            data: vec![T::ZERO; size_of_shape(shape)],
        }
    }

    pub fn from_vec(shape: &[usize], data: Vec<T>) -> Result<Self> {
        if size_of_shape(shape) != data.len() {
            return Err(CubeError::InvalidArgument(format!(
                "shape {:?} wants {} elements, got {}",
                shape,
                size_of_shape(shape),
                data.len()
            )));
        }
        Ok(DenseCube {
            shape: shape.to_vec(),
            data,
        })
    }

    /// 1-D cube over a copy of `flat`.
    pub fn from_slice(flat: &[T]) -> Self {
        DenseCube {
            shape: vec![flat.len()],
            data: flat.to_vec(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Element> Cube<T> for DenseCube<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn get_at(&self, i: usize) -> T {
        self.data[i]
    }

    fn to_flat(
        &self,
        src_off: usize,
        dst: &mut [T],
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported> {
        dst[dst_off..dst_off + len].copy_from_slice(&self.data[src_off..src_off + len]);
        Ok(())
    }
}

impl<T: Element> CubeMut<T> for DenseCube<T> {
    fn set_at(&mut self, i: usize, v: T) {
        self.data[i] = v;
    }

    fn fill(&mut self, v: T) {
        self.data.fill(v);
    }

    fn from_flat(
        &mut self,
        src: &[T],
        src_off: usize,
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported> {
        self.data[dst_off..dst_off + len].copy_from_slice(&src[src_off..src_off + len]);
        Ok(())
    }

    fn writer(&mut self) -> Box<dyn ParWriter<T> + '_> {
        Box::new(DenseWriter {
            ptr: self.data.as_mut_ptr(),
            len: self.data.len(),
            _marker: PhantomData,
        })
    }

    fn as_cube(&self) -> &dyn Cube<T> {
        self
    }
}

/// Raw-pointer writer over a dense cube's storage. Soundness rests on the
/// [`ParWriter`] contract: the exclusive borrow of the cube is held for
/// `'a`, and concurrent callers write disjoint index ranges.
pub struct DenseWriter<'a, T: Element> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: the writer holds the cube's unique &mut borrow, and writes from
// different threads target disjoint ranges per the ParWriter contract.
unsafe impl<T: Element> Send for DenseWriter<'_, T> {}
unsafe impl<T: Element> Sync for DenseWriter<'_, T> {}

impl<T: Element> ParWriter<T> for DenseWriter<'_, T> {
    fn set(&self, i: usize, v: T) {
        assert!(i < self.len);
        // SAFETY: in-bounds (asserted) and range-disjoint per contract.
        unsafe { self.ptr.add(i).write(v) }
    }

    fn write_flat(&self, src: &[T], dst_off: usize) {
        assert!(dst_off + src.len() <= self.len);
        // SAFETY: in-bounds (asserted); src is a staging buffer that can
        // never alias destination storage.
        unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.add(dst_off), src.len()) }
    }
}

/// Packed boolean storage over 32-bit words; the natural destination for
/// `bool`. The 32-element bucket alignment of the partitioner keeps whole
/// words inside one bucket for elementwise work; the writer still updates
/// words atomically so the unaligned offsets of `extract` cannot race on
/// a boundary word shared by two buckets.
#[derive(Debug, Clone)]
pub struct BitsetCube {
    shape: Vec<usize>,
    len: usize,
    words: Vec<u32>,
}

impl BitsetCube {
    pub fn new(shape: &[usize]) -> Self {
        let len = size_of_shape(shape);
        BitsetCube {
            shape: shape.to_vec(),
            len,
            words: vec![0u32; len.div_ceil(32)],
        }
    }

    /// 1-D cube over a copy of `flat`.
    pub fn from_slice(flat: &[bool]) -> Self {
        let mut cube = BitsetCube::new(&[flat.len()]);
        for (i, &b) in flat.iter().enumerate() {
            cube.set_at(i, b);
        }
        cube
    }
}

impl Cube<bool> for BitsetCube {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn size(&self) -> usize {
        self.len
    }

    fn get_at(&self, i: usize) -> bool {
        assert!(i < self.len);
        (self.words[i >> 5] >> (i & 31)) & 1 == 1
    }

    fn to_flat(
        &self,
        src_off: usize,
        dst: &mut [bool],
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported> {
        assert!(src_off + len <= self.len);
        for k in 0..len {
            let i = src_off + k;
            dst[dst_off + k] = (self.words[i >> 5] >> (i & 31)) & 1 == 1;
        }
        Ok(())
    }
}

impl CubeMut<bool> for BitsetCube {
    fn set_at(&mut self, i: usize, v: bool) {
        assert!(i < self.len);
        let bit = 1u32 << (i & 31);
        if v {
            self.words[i >> 5] |= bit;
        } else {
            self.words[i >> 5] &= !bit;
        }
    }

    fn fill(&mut self, v: bool) {
        let word = if v { !0u32 } else { 0u32 };
        self.words.fill(word);
    }

    fn from_flat(
        &mut self,
        src: &[bool],
        src_off: usize,
        dst_off: usize,
        len: usize,
    ) -> std::result::Result<(), BulkIoUnsupported> {
        for k in 0..len {
            self.set_at(dst_off + k, src[src_off + k]);
        }
        Ok(())
    }

    fn writer(&mut self) -> Box<dyn ParWriter<bool> + '_> {
        Box::new(BitsetWriter {
            ptr: self.words.as_mut_ptr(),
            len: self.len,
            words: self.words.len(),
            _marker: PhantomData,
        })
    }

    fn as_cube(&self) -> &dyn Cube<bool> {
        self
    }
}

pub struct BitsetWriter<'a> {
    ptr: *mut u32,
    len: usize,
    words: usize,
    _marker: PhantomData<&'a mut [u32]>,
}

// SAFETY: unique borrow held for 'a; every word update below is an atomic
// RMW, so even two writers landing on the same boundary word are safe.
unsafe impl Send for BitsetWriter<'_> {}
unsafe impl Sync for BitsetWriter<'_> {}

impl BitsetWriter<'_> {
    fn word(&self, w: usize) -> &AtomicU32 {
        assert!(w < self.words);
        // SAFETY: in-bounds (asserted); AtomicU32 has the same layout as
        // u32 and the storage is exclusively borrowed for 'a.
        unsafe { AtomicU32::from_ptr(self.ptr.add(w)) }
    }
}

impl ParWriter<bool> for BitsetWriter<'_> {
    fn set(&self, i: usize, v: bool) {
        assert!(i < self.len);
        let bit = 1u32 << (i & 31);
        if v {
            self.word(i >> 5).fetch_or(bit, Ordering::Relaxed);
        } else {
            self.word(i >> 5).fetch_and(!bit, Ordering::Relaxed);
        }
    }

    fn write_flat(&self, src: &[bool], dst_off: usize) {
        for (k, &b) in src.iter().enumerate() {
            self.set(dst_off + k, b);
        }
    }
}
