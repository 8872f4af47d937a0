// Licensed under the MIT and Apache-2.0 licenses.

//! Per-pair element conversion rules.
//!
//! Numeric-to-numeric pairs use the machine cast: value-preserving widen
//! for int->float and int->int widening, truncation toward zero
//! (saturating, NaN -> 0) for float->int, ties-to-even rounding for
//! float->float. Numeric-to-bool is `v != 0`; bool-to-numeric is 0/1.
//!
//! The strict, round-trip-checked lifts used by the scalar-broadcast
//! entry points live on [`Element::from_scalar_strict`]; this module is
//! the bulk (lossy-by-rule) grid.

use crate::dtype::Element;

/// One ordered conversion `Self -> D`.
pub trait CastTo<D: Element>: Element {
    fn cast(self) -> D;
}

macro_rules! impl_cast_as {
    ($S:ty => $($D:ty)*) => {
        $(
            impl CastTo<$D> for $S {
                #[inline]
                fn cast(self) -> $D {
                    self as $D
                }
            }
        )*
    }
}

impl_cast_as!(i32 => i32 i64 f32 f64);
impl_cast_as!(i64 => i32 i64 f32 f64);
impl_cast_as!(f32 => i32 i64 f32 f64);
impl_cast_as!(f64 => i32 i64 f32 f64);

macro_rules! impl_cast_to_bool {
    ($($S:ty)*) => {
        $(
            impl CastTo<bool> for $S {
                #[inline]
                fn cast(self) -> bool {
                    // NaN is nonzero.
                    self != (0 as $S)
                }
            }
        )*
    }
}

impl_cast_to_bool!(i32 i64 f32 f64);

macro_rules! impl_cast_from_bool {
    ($($D:ty)*) => {
        $(
            impl CastTo<$D> for bool {
                #[inline]
                fn cast(self) -> $D {
                    (self as i32) as $D
                }
            }
        )*
    }
}

impl_cast_from_bool!(i32 i64 f32 f64);

impl CastTo<bool> for bool {
    #[inline]
    fn cast(self) -> bool {
        self
    }
}
