// Licensed under the MIT and Apache-2.0 licenses.

use std::fmt;

use crate::cube::CubeMut;
use crate::error::Result;
use crate::ops::{AssociativeOp, BinaryOp, ComparisonOp, PredicateOp, UnaryOp};

/// Runtime tag for the element type of a cube. Dispatch itself is static
/// (entry points are generic over [`Element`]); the tag is carried for
/// diagnostics and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    I32,
    I64,
    F32,
    F64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A dynamically-typed scalar value, used by the scalar-broadcast entry
/// points and the `full`/`arange` constructors. Lifting a `Scalar` into a
/// cube's element type goes through the strict round-trip-checked casts
/// and fails with `CastOverflow` on any value change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub fn dtype(self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::I32(_) => DType::I32,
            Scalar::I64(_) => DType::I64,
            Scalar::F32(_) => DType::F32,
            Scalar::F64(_) => DType::F64,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}
impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I32(v)
    }
}
impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}
impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F32(v)
    }
}
impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

/// The capability set every supported element type provides: identity
/// constants, the missing-value convention, scalar semantics for each
/// operation family, and chunk-level vectorized bodies for the kernels.
///
/// One generic kernel per operation family is instantiated over this
/// trait; the per-type vector bodies live in `ops.rs` behind the macros
/// of `macros.rs`.
pub trait Element:
    Copy + PartialEq + Send + Sync + fmt::Debug + fmt::Display + 'static
{
    const DTYPE: DType;
    const ZERO: Self;
    const ONE: Self;
    const MIN_VALUE: Self;
    const MAX_VALUE: Self;
    /// Raw representation written for a missing element: NaN for floats,
    /// zero for integers, false for bool.
    const MISSING: Self;

    /// True iff the raw value denotes a missing element. Only the float
    /// types have a representable missing state (NaN).
    fn is_missing(self) -> bool;

    /// "Truthiness" used by the reductive-logic family: nonzero. NaN is
    /// nonzero, so missing values count as true there.
    fn truthy(self) -> bool;

    /// Strict lift of a dynamically-typed scalar into this element type;
    /// refuses any conversion that does not round-trip.
    fn from_scalar_strict(s: Scalar) -> Result<Self>;

    // Scalar semantics, used by the fallback paths and by the in-chunk
    // loops for ops without a vector form.
    fn supports_binary(op: BinaryOp) -> bool;
    fn supports_unary(op: UnaryOp) -> bool;
    fn supports_associative() -> bool;
    fn supports_predicate() -> bool;

    fn apply_binary(op: BinaryOp, a: Self, b: Self) -> Result<Self>;
    fn apply_unary(op: UnaryOp, a: Self) -> Result<Self>;
    fn compare(op: ComparisonOp, a: Self, b: Self) -> bool;
    fn apply_predicate(op: PredicateOp, a: Self) -> Result<bool>;

    /// Identity accumulator for a reduction: 0 for Add/NanAdd, dtype max
    /// for Min, dtype min for Max.
    fn reduce_init(op: AssociativeOp) -> Result<Self>;
    /// Folds one element into the accumulator. NaN poisons Add/Min/Max;
    /// NanAdd skips missing elements.
    fn reduce_scalar(op: AssociativeOp, acc: Self, v: Self) -> Self;
    /// Combines two partial (bucket) results.
    fn combine(op: AssociativeOp, a: Self, b: Self) -> Self;

    // Chunk-level vectorized bodies. Slices are at most STAGING_SIZE
    // long. A `false` return means the op has no vector form for this
    // type and the caller should run its scalar loop over the chunk.
    fn vec_binary(op: BinaryOp, lhs: &[Self], rhs: &[Self], dst: &mut [Self]) -> bool;
    fn vec_unary(op: UnaryOp, src: &[Self], dst: &mut [Self]) -> bool;
    fn vec_compare(op: ComparisonOp, lhs: &[Self], rhs: &[Self], dst: &mut [bool]);
    fn vec_predicate(op: PredicateOp, src: &[Self], dst: &mut [bool]) -> bool;
    /// Reduces a staged chunk into the accumulator with `op`'s semantics.
    fn vec_reduce(op: AssociativeOp, acc: Self, src: &[Self]) -> Self;

    // arange support; integer division semantics differ per type, so the
    // length rule lives with the element type.
    fn arange_len(start: Self, stop: Self, step: Self) -> Result<usize>;
    fn arange_at(start: Self, step: Self, i: usize) -> Self;

    /// Allocates the natural destination storage for this element type
    /// (contiguous array for numerics, packed bitset for bool), zeroed.
    fn alloc(shape: &[usize]) -> Box<dyn CubeMut<Self>>;
}
