// Licensed under the MIT and Apache-2.0 licenses.

//! Named convenience surface over the generic entry points.
//!
//! These are thin: each resolves to one dispatcher call with the op tag
//! filled in. Front ends that bind operations by name (foreign-function
//! layers, expression evaluators) route through here; everything else
//! can use the generic entry points directly.

use crate::cube::{Cube, CubeMut};
use crate::dispatch;
use crate::dtype::Element;
use crate::error::Result;
use crate::ops::{AssociativeOp, BinaryOp, ComparisonOp, PredicateOp, ReductiveLogicOp, UnaryOp};

macro_rules! named_binary {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name<T: Element>(
                a: &dyn Cube<T>,
                b: &dyn Cube<T>,
            ) -> Result<Box<dyn CubeMut<T>>> {
                dispatch::binary_op(BinaryOp::$op, a, b)
            }
        )*
    }
}

named_binary!(
    add => Add,
    subtract => Sub,
    multiply => Mul,
    divide => Div,
    modulo => Mod,
    power => Pow,
    minimum => Min,
    maximum => Max,
    and => And,
    or => Or,
    xor => Xor,
);

macro_rules! named_unary {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name<T: Element>(a: &dyn Cube<T>) -> Result<Box<dyn CubeMut<T>>> {
                dispatch::unary_op(UnaryOp::$op, a)
            }
        )*
    }
}

named_unary!(
    negative => Neg,
    abs => Abs,
    floor => Floor,
    round => Round,
    ceil => Ceil,
    cos => Cos,
    cosh => Cosh,
    sin => Sin,
    sinh => Sinh,
    tan => Tan,
    tanh => Tanh,
    exp => Exp,
    log => Log,
    log10 => Log10,
    not => Not,
);

macro_rules! named_comparison {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name<T: Element>(
                a: &dyn Cube<T>,
                b: &dyn Cube<T>,
            ) -> Result<Box<dyn CubeMut<bool>>> {
                dispatch::comparison_op(ComparisonOp::$op, a, b)
            }
        )*
    }
}

named_comparison!(
    equal => Eq,
    not_equal => Ne,
    less => Lt,
    greater => Gt,
    less_equal => Le,
    greater_equal => Ge,
);

pub fn sum<T: Element>(a: &dyn Cube<T>) -> Result<T> {
    dispatch::associative_op(AssociativeOp::Add, a, None, None)
}

/// Sum that skips missing (NaN) elements.
pub fn nansum<T: Element>(a: &dyn Cube<T>) -> Result<T> {
    dispatch::associative_op(AssociativeOp::NanAdd, a, None, None)
}

pub fn min<T: Element>(a: &dyn Cube<T>) -> Result<T> {
    dispatch::associative_op(AssociativeOp::Min, a, None, None)
}

pub fn max<T: Element>(a: &dyn Cube<T>) -> Result<T> {
    dispatch::associative_op(AssociativeOp::Max, a, None, None)
}

pub fn sum_over_axes<T: Element>(
    a: &dyn Cube<T>,
    axes: &[usize],
) -> Result<Box<dyn CubeMut<T>>> {
    dispatch::associative_op_by_axes(AssociativeOp::Add, a, axes, None, None)
}

pub fn min_over_axes<T: Element>(
    a: &dyn Cube<T>,
    axes: &[usize],
) -> Result<Box<dyn CubeMut<T>>> {
    dispatch::associative_op_by_axes(AssociativeOp::Min, a, axes, None, None)
}

pub fn max_over_axes<T: Element>(
    a: &dyn Cube<T>,
    axes: &[usize],
) -> Result<Box<dyn CubeMut<T>>> {
    dispatch::associative_op_by_axes(AssociativeOp::Max, a, axes, None, None)
}

pub fn any<T: Element>(a: &dyn Cube<T>) -> Result<bool> {
    dispatch::reductive_logic_op(ReductiveLogicOp::Any, a, None)
}

pub fn all<T: Element>(a: &dyn Cube<T>) -> Result<bool> {
    dispatch::reductive_logic_op(ReductiveLogicOp::All, a, None)
}

pub fn any_over_axes<T: Element>(
    a: &dyn Cube<T>,
    axes: &[usize],
) -> Result<Box<dyn CubeMut<bool>>> {
    dispatch::reductive_logic_op_by_axes(ReductiveLogicOp::Any, a, axes, None)
}

pub fn all_over_axes<T: Element>(
    a: &dyn Cube<T>,
    axes: &[usize],
) -> Result<Box<dyn CubeMut<bool>>> {
    dispatch::reductive_logic_op_by_axes(ReductiveLogicOp::All, a, axes, None)
}

pub fn isnan<T: Element>(a: &dyn Cube<T>) -> Result<Box<dyn CubeMut<bool>>> {
    dispatch::predicate_op(PredicateOp::IsNan, a)
}

pub fn isinf<T: Element>(a: &dyn Cube<T>) -> Result<Box<dyn CubeMut<bool>>> {
    dispatch::predicate_op(PredicateOp::IsInf, a)
}

pub fn isfinite<T: Element>(a: &dyn Cube<T>) -> Result<Box<dyn CubeMut<bool>>> {
    dispatch::predicate_op(PredicateOp::IsFinite, a)
}
