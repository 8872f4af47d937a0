// Licensed under the MIT and Apache-2.0 licenses.

////////////////////////////////////////////////////////////////////////////////
// Chunk-body skeletons
////////////////////////////////////////////////////////////////////////////////
//
// Every vectorized chunk body has the same skeleton: walk the staged slice
// in steps of the lane count, loading whole vectors over the prefix, and
// run the final partial step through a lane-padded copy (the pad value is
// chosen so padding lanes are inert for the op). The op itself is a
// closure over whole vectors, so each operation family needs exactly one
// skeleton and the per-dtype instantiations stay small.

macro_rules! simd_zip {
    ($V:ty, $L:expr, $pad:expr, $lhs:expr, $rhs:expr, $dst:expr, $f:expr) => {{
        let n = $dst.len();
        let mut j = 0usize;
        while j < n {
            let m = ::std::cmp::min($L, n - j);
            let mut xa = [$pad; $L];
            let mut ya = [$pad; $L];
            xa[..m].copy_from_slice(&$lhs[j..j + m]);
            ya[..m].copy_from_slice(&$rhs[j..j + m]);
            let rv = $f(<$V>::from(xa), <$V>::from(ya));
            let ra = rv.to_array();
            $dst[j..j + m].copy_from_slice(&ra[..m]);
            j += m;
        }
    }};
}

macro_rules! simd_map {
    ($V:ty, $L:expr, $pad:expr, $src:expr, $dst:expr, $f:expr) => {{
        let n = $dst.len();
        let mut j = 0usize;
        while j < n {
            let m = ::std::cmp::min($L, n - j);
            let mut xa = [$pad; $L];
            xa[..m].copy_from_slice(&$src[j..j + m]);
            let rv = $f(<$V>::from(xa));
            let ra = rv.to_array();
            $dst[j..j + m].copy_from_slice(&ra[..m]);
            j += m;
        }
    }};
}

// Comparison skeleton: the closure yields a lane mask in the operand's
// vector type; a lane is true iff its bits are nonzero, optionally
// inverted. (Float masks read back as NaN-patterned lanes, which still
// compare nonzero.) Deriving Ne/Le/Ge by inversion keeps the integer
// instantiations on the cmp_eq/cmp_gt pair the hardware actually has.
macro_rules! simd_cmp_zip {
    ($V:ty, $L:expr, $pad:expr, $lhs:expr, $rhs:expr, $dst:expr, $f:expr, $invert:expr) => {{
        let n = $dst.len();
        let mut j = 0usize;
        while j < n {
            let m = ::std::cmp::min($L, n - j);
            let mut xa = [$pad; $L];
            let mut ya = [$pad; $L];
            xa[..m].copy_from_slice(&$lhs[j..j + m]);
            ya[..m].copy_from_slice(&$rhs[j..j + m]);
            let mv = $f(<$V>::from(xa), <$V>::from(ya));
            let ma = mv.to_array();
            for k in 0..m {
                $dst[j + k] = (ma[k] != $pad) ^ $invert;
            }
            j += m;
        }
    }};
}

macro_rules! simd_pred_map {
    ($V:ty, $L:expr, $pad:expr, $src:expr, $dst:expr, $f:expr) => {{
        let n = $dst.len();
        let mut j = 0usize;
        while j < n {
            let m = ::std::cmp::min($L, n - j);
            let mut xa = [$pad; $L];
            xa[..m].copy_from_slice(&$src[j..j + m]);
            let mv = $f(<$V>::from(xa));
            let ma = mv.to_array();
            for k in 0..m {
                $dst[j + k] = ma[k] != $pad;
            }
            j += m;
        }
    }};
}

// Associative fold skeleton: keeps a vector accumulator across the chunk
// and hands back the lane array for the caller to fold to a scalar.
// Padding lanes carry the op's identity.
macro_rules! simd_fold {
    ($V:ty, $L:expr, $pad:expr, $src:expr, $f:expr) => {{
        let mut vacc = <$V>::splat($pad);
        let n = $src.len();
        let mut j = 0usize;
        while j < n {
            let m = ::std::cmp::min($L, n - j);
            let mut xa = [$pad; $L];
            xa[..m].copy_from_slice(&$src[j..j + m]);
            vacc = $f(vacc, <$V>::from(xa));
            j += m;
        }
        vacc.to_array()
    }};
}

////////////////////////////////////////////////////////////////////////////////
// Floating-point element types
////////////////////////////////////////////////////////////////////////////////

macro_rules! impl_float_element {
    ($T:ty, $V:ty, $L:expr, $DT:expr) => {
        impl Element for $T {
            const DTYPE: DType = $DT;
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const MIN_VALUE: Self = <$T>::MIN;
            const MAX_VALUE: Self = <$T>::MAX;
            const MISSING: Self = <$T>::NAN;

            #[inline]
            fn is_missing(self) -> bool {
                self.is_nan()
            }

            #[inline]
            fn truthy(self) -> bool {
                self != 0.0
            }

            fn from_scalar_strict(s: Scalar) -> Result<Self> {
                let overflow = || CubeError::CastOverflow {
                    value: s.to_string(),
                    dtype: Self::DTYPE,
                };
                match s {
                    Scalar::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
                    // The magnitude guards close the saturation hole at
                    // exactly 2^31 / 2^63, where the back-cast clamps and
                    // the round-trip test alone would pass.
                    Scalar::I32(v) => {
                        let t = v as $T;
                        if t as i32 == v && (t as f64) < 2147483648.0 {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                    Scalar::I64(v) => {
                        let t = v as $T;
                        if t as i64 == v && (t as f64) < 9223372036854775808.0 {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                    Scalar::F32(v) => {
                        let t = v as $T;
                        if t as f32 == v || (v.is_nan() && t.is_nan()) {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                    Scalar::F64(v) => {
                        let t = v as $T;
                        if t as f64 == v || (v.is_nan() && t.is_nan()) {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                }
            }

            fn supports_binary(op: BinaryOp) -> bool {
                !matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
            }

            fn supports_unary(op: UnaryOp) -> bool {
                !matches!(op, UnaryOp::Not)
            }

            fn supports_associative() -> bool {
                true
            }

            fn supports_predicate() -> bool {
                true
            }

            fn apply_binary(op: BinaryOp, a: Self, b: Self) -> Result<Self> {
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    BinaryOp::Pow => a.powf(b),
                    BinaryOp::Min => {
                        if a.is_nan() || b.is_nan() {
                            <$T>::NAN
                        } else {
                            a.min(b)
                        }
                    }
                    BinaryOp::Max => {
                        if a.is_nan() || b.is_nan() {
                            <$T>::NAN
                        } else {
                            a.max(b)
                        }
                    }
                    BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                        return Err(CubeError::UnsupportedOp {
                            op: op.name(),
                            dtype: Self::DTYPE,
                        })
                    }
                })
            }

            fn apply_unary(op: UnaryOp, a: Self) -> Result<Self> {
                Ok(match op {
                    UnaryOp::Neg => -a,
                    UnaryOp::Abs => a.abs(),
                    UnaryOp::Floor => a.floor(),
                    UnaryOp::Round => a.round(),
                    UnaryOp::Ceil => a.ceil(),
                    UnaryOp::Cos => a.cos(),
                    UnaryOp::Cosh => a.cosh(),
                    UnaryOp::Sin => a.sin(),
                    UnaryOp::Sinh => a.sinh(),
                    UnaryOp::Tan => a.tan(),
                    UnaryOp::Tanh => a.tanh(),
                    UnaryOp::Exp => a.exp(),
                    UnaryOp::Log => a.ln(),
                    UnaryOp::Log10 => a.log10(),
                    UnaryOp::Not => {
                        return Err(CubeError::UnsupportedOp {
                            op: op.name(),
                            dtype: Self::DTYPE,
                        })
                    }
                })
            }

            #[inline]
            fn compare(op: ComparisonOp, a: Self, b: Self) -> bool {
                match op {
                    ComparisonOp::Eq => a == b,
                    ComparisonOp::Ne => a != b,
                    ComparisonOp::Lt => a < b,
                    ComparisonOp::Gt => a > b,
                    ComparisonOp::Le => a <= b,
                    ComparisonOp::Ge => a >= b,
                }
            }

            fn apply_predicate(op: PredicateOp, a: Self) -> Result<bool> {
                Ok(match op {
                    PredicateOp::IsNan => a.is_nan(),
                    PredicateOp::IsInf => a.is_infinite(),
                    PredicateOp::IsFinite => a.is_finite(),
                })
            }

            fn reduce_init(op: AssociativeOp) -> Result<Self> {
                Ok(match op {
                    AssociativeOp::Add | AssociativeOp::NanAdd => 0.0,
                    AssociativeOp::Min => <$T>::MAX,
                    AssociativeOp::Max => <$T>::MIN,
                })
            }

            #[inline]
            fn reduce_scalar(op: AssociativeOp, acc: Self, v: Self) -> Self {
                match op {
                    AssociativeOp::Add => acc + v,
                    AssociativeOp::NanAdd => {
                        if v.is_nan() {
                            acc
                        } else {
                            acc + v
                        }
                    }
                    AssociativeOp::Min => {
                        if acc.is_nan() || v.is_nan() {
                            <$T>::NAN
                        } else {
                            acc.min(v)
                        }
                    }
                    AssociativeOp::Max => {
                        if acc.is_nan() || v.is_nan() {
                            <$T>::NAN
                        } else {
                            acc.max(v)
                        }
                    }
                }
            }

            #[inline]
            fn combine(op: AssociativeOp, a: Self, b: Self) -> Self {
                match op {
                    AssociativeOp::Add | AssociativeOp::NanAdd => a + b,
                    _ => Self::reduce_scalar(op, a, b),
                }
            }

            fn vec_binary(op: BinaryOp, lhs: &[Self], rhs: &[Self], dst: &mut [Self]) -> bool {
                match op {
                    BinaryOp::Add => {
                        simd_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x + y)
                    }
                    BinaryOp::Sub => {
                        simd_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x - y)
                    }
                    BinaryOp::Mul => {
                        simd_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x * y)
                    }
                    BinaryOp::Div => {
                        simd_zip!($V, $L, 1.0, lhs, rhs, dst, |x: $V, y: $V| x / y)
                    }
                    BinaryOp::Min => {
                        simd_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| {
                            let nan = x.cmp_ne(x) | y.cmp_ne(y);
                            nan.blend(<$V>::splat(<$T>::NAN), x.min(y))
                        })
                    }
                    BinaryOp::Max => {
                        simd_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| {
                            let nan = x.cmp_ne(x) | y.cmp_ne(y);
                            nan.blend(<$V>::splat(<$T>::NAN), x.max(y))
                        })
                    }
                    BinaryOp::Mod
                    | BinaryOp::Pow
                    | BinaryOp::And
                    | BinaryOp::Or
                    | BinaryOp::Xor => return false,
                }
                true
            }

            fn vec_unary(op: UnaryOp, src: &[Self], dst: &mut [Self]) -> bool {
                match op {
                    UnaryOp::Neg => simd_map!($V, $L, 0.0, src, dst, |x: $V| -x),
                    UnaryOp::Abs => simd_map!($V, $L, 0.0, src, dst, |x: $V| x.abs()),
                    // Rounding and the transcendentals run as scalar
                    // loops in the chunk.
                    _ => return false,
                }
                true
            }

            fn vec_compare(op: ComparisonOp, lhs: &[Self], rhs: &[Self], dst: &mut [bool]) {
                match op {
                    ComparisonOp::Eq => {
                        simd_cmp_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_eq(y), false)
                    }
                    ComparisonOp::Ne => {
                        simd_cmp_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_eq(y), true)
                    }
                    ComparisonOp::Lt => {
                        simd_cmp_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_lt(y), false)
                    }
                    ComparisonOp::Gt => {
                        simd_cmp_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_gt(y), false)
                    }
                    ComparisonOp::Le => {
                        simd_cmp_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_le(y), false)
                    }
                    ComparisonOp::Ge => {
                        simd_cmp_zip!($V, $L, 0.0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_ge(y), false)
                    }
                }
            }

            fn vec_predicate(op: PredicateOp, src: &[Self], dst: &mut [bool]) -> bool {
                match op {
                    // NaN != NaN: the self-inequality mask is the NaN mask.
                    PredicateOp::IsNan => {
                        simd_pred_map!($V, $L, 0.0, src, dst, |x: $V| x.cmp_ne(x))
                    }
                    PredicateOp::IsInf => {
                        simd_pred_map!($V, $L, 0.0, src, dst, |x: $V| x
                            .abs()
                            .cmp_eq(<$V>::splat(<$T>::INFINITY)))
                    }
                    PredicateOp::IsFinite => {
                        simd_pred_map!($V, $L, 0.0, src, dst, |x: $V| x
                            .abs()
                            .cmp_lt(<$V>::splat(<$T>::INFINITY)))
                    }
                }
                true
            }

            fn vec_reduce(op: AssociativeOp, acc: Self, src: &[Self]) -> Self {
                match op {
                    AssociativeOp::Add => {
                        let lanes = simd_fold!($V, $L, 0.0, src, |a: $V, v: $V| a + v);
                        acc + lanes.iter().copied().fold(0.0, |a, b| a + b)
                    }
                    AssociativeOp::NanAdd => {
                        let lanes = simd_fold!($V, $L, 0.0, src, |a: $V, v: $V| {
                            let present = v.cmp_eq(v);
                            a + present.blend(v, <$V>::splat(0.0))
                        });
                        acc + lanes.iter().copied().fold(0.0, |a, b| a + b)
                    }
                    AssociativeOp::Min => {
                        if acc.is_nan() {
                            return acc;
                        }
                        if src.iter().any(|v| v.is_nan()) {
                            return <$T>::NAN;
                        }
                        let lanes =
                            simd_fold!($V, $L, <$T>::MAX, src, |a: $V, v: $V| a.min(v));
                        acc.min(lanes.iter().copied().fold(<$T>::MAX, <$T>::min))
                    }
                    AssociativeOp::Max => {
                        if acc.is_nan() {
                            return acc;
                        }
                        if src.iter().any(|v| v.is_nan()) {
                            return <$T>::NAN;
                        }
                        let lanes =
                            simd_fold!($V, $L, <$T>::MIN, src, |a: $V, v: $V| a.max(v));
                        acc.max(lanes.iter().copied().fold(<$T>::MIN, <$T>::max))
                    }
                }
            }

            fn arange_len(start: Self, stop: Self, step: Self) -> Result<usize> {
                Ok(((stop - start) / step).ceil() as usize)
            }

            fn arange_at(start: Self, step: Self, i: usize) -> Self {
                start + step * (i as $T)
            }

            fn alloc(shape: &[usize]) -> Box<dyn CubeMut<Self>> {
                Box::new(DenseCube::<$T>::new(shape))
            }
        }
    };
}

////////////////////////////////////////////////////////////////////////////////
// Integer element types
////////////////////////////////////////////////////////////////////////////////
//
// $BOUND is the exclusive magnitude bound applied when strict-casting a
// float scalar: the saturating float-to-int cast would otherwise make the
// round-trip check mis-accept exactly 2^31 / 2^63.

macro_rules! impl_int_element {
    ($T:ty, $V:ty, $L:expr, $DT:expr, $BOUND:expr) => {
        impl Element for $T {
            const DTYPE: DType = $DT;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN_VALUE: Self = <$T>::MIN;
            const MAX_VALUE: Self = <$T>::MAX;
            const MISSING: Self = 0;

            #[inline]
            fn is_missing(self) -> bool {
                false
            }

            #[inline]
            fn truthy(self) -> bool {
                self != 0
            }

            fn from_scalar_strict(s: Scalar) -> Result<Self> {
                let overflow = || CubeError::CastOverflow {
                    value: s.to_string(),
                    dtype: Self::DTYPE,
                };
                match s {
                    Scalar::Bool(b) => Ok(if b { 1 } else { 0 }),
                    Scalar::I32(v) => {
                        let t = v as $T;
                        if t as i32 == v {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                    Scalar::I64(v) => {
                        let t = v as $T;
                        if t as i64 == v {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                    Scalar::F32(v) => {
                        let vd = v as f64;
                        let t = v as $T;
                        if vd >= -$BOUND && vd < $BOUND && t as f32 == v {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                    Scalar::F64(v) => {
                        let t = v as $T;
                        if v >= -$BOUND && v < $BOUND && t as f64 == v {
                            Ok(t)
                        } else {
                            Err(overflow())
                        }
                    }
                }
            }

            fn supports_binary(_op: BinaryOp) -> bool {
                true
            }

            fn supports_unary(op: UnaryOp) -> bool {
                matches!(
                    op,
                    UnaryOp::Neg
                        | UnaryOp::Abs
                        | UnaryOp::Floor
                        | UnaryOp::Round
                        | UnaryOp::Ceil
                        | UnaryOp::Not
                )
            }

            fn supports_associative() -> bool {
                true
            }

            fn supports_predicate() -> bool {
                false
            }

            fn apply_binary(op: BinaryOp, a: Self, b: Self) -> Result<Self> {
                Ok(match op {
                    BinaryOp::Add => a.wrapping_add(b),
                    BinaryOp::Sub => a.wrapping_sub(b),
                    BinaryOp::Mul => a.wrapping_mul(b),
                    // Division by zero traps, as in the host language;
                    // guarding is the caller's concern.
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    BinaryOp::Pow => (a as f64).powf(b as f64) as $T,
                    BinaryOp::Min => a.min(b),
                    BinaryOp::Max => a.max(b),
                    BinaryOp::And => a & b,
                    BinaryOp::Or => a | b,
                    BinaryOp::Xor => a ^ b,
                })
            }

            fn apply_unary(op: UnaryOp, a: Self) -> Result<Self> {
                Ok(match op {
                    UnaryOp::Neg => a.wrapping_neg(),
                    UnaryOp::Abs => a.wrapping_abs(),
                    UnaryOp::Floor | UnaryOp::Round | UnaryOp::Ceil => a,
                    UnaryOp::Not => !a,
                    _ => {
                        return Err(CubeError::UnsupportedOp {
                            op: op.name(),
                            dtype: Self::DTYPE,
                        })
                    }
                })
            }

            #[inline]
            fn compare(op: ComparisonOp, a: Self, b: Self) -> bool {
                match op {
                    ComparisonOp::Eq => a == b,
                    ComparisonOp::Ne => a != b,
                    ComparisonOp::Lt => a < b,
                    ComparisonOp::Gt => a > b,
                    ComparisonOp::Le => a <= b,
                    ComparisonOp::Ge => a >= b,
                }
            }

            fn apply_predicate(op: PredicateOp, _a: Self) -> Result<bool> {
                Err(CubeError::UnsupportedOp {
                    op: op.name(),
                    dtype: Self::DTYPE,
                })
            }

            fn reduce_init(op: AssociativeOp) -> Result<Self> {
                Ok(match op {
                    AssociativeOp::Add | AssociativeOp::NanAdd => 0,
                    AssociativeOp::Min => <$T>::MAX,
                    AssociativeOp::Max => <$T>::MIN,
                })
            }

            #[inline]
            fn reduce_scalar(op: AssociativeOp, acc: Self, v: Self) -> Self {
                match op {
                    AssociativeOp::Add | AssociativeOp::NanAdd => acc.wrapping_add(v),
                    AssociativeOp::Min => acc.min(v),
                    AssociativeOp::Max => acc.max(v),
                }
            }

            #[inline]
            fn combine(op: AssociativeOp, a: Self, b: Self) -> Self {
                Self::reduce_scalar(op, a, b)
            }

            fn vec_binary(op: BinaryOp, lhs: &[Self], rhs: &[Self], dst: &mut [Self]) -> bool {
                match op {
                    BinaryOp::Add => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x + y)
                    }
                    BinaryOp::Sub => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x - y)
                    }
                    BinaryOp::And => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x & y)
                    }
                    BinaryOp::Or => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x | y)
                    }
                    BinaryOp::Xor => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x ^ y)
                    }
                    BinaryOp::Min => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| {
                            let gt = x.cmp_gt(y);
                            gt.blend(y, x)
                        })
                    }
                    BinaryOp::Max => {
                        simd_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| {
                            let gt = x.cmp_gt(y);
                            gt.blend(x, y)
                        })
                    }
                    // Mul/Div/Mod/Pow have no uniform vector form across
                    // the integer widths; scalar loop in the chunk.
                    BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
                        return false
                    }
                }
                true
            }

            fn vec_unary(op: UnaryOp, src: &[Self], dst: &mut [Self]) -> bool {
                match op {
                    UnaryOp::Neg => {
                        simd_map!($V, $L, 0, src, dst, |x: $V| <$V>::splat(0) - x)
                    }
                    UnaryOp::Abs => {
                        simd_map!($V, $L, 0, src, dst, |x: $V| {
                            let neg = <$V>::splat(0).cmp_gt(x);
                            neg.blend(<$V>::splat(0) - x, x)
                        })
                    }
                    UnaryOp::Not => {
                        simd_map!($V, $L, 0, src, dst, |x: $V| x ^ <$V>::splat(!0))
                    }
                    // Integers are already integral.
                    UnaryOp::Floor | UnaryOp::Round | UnaryOp::Ceil => {
                        dst.copy_from_slice(src);
                    }
                    _ => return false,
                }
                true
            }

            fn vec_compare(op: ComparisonOp, lhs: &[Self], rhs: &[Self], dst: &mut [bool]) {
                match op {
                    ComparisonOp::Eq => {
                        simd_cmp_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_eq(y), false)
                    }
                    ComparisonOp::Ne => {
                        simd_cmp_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_eq(y), true)
                    }
                    ComparisonOp::Gt => {
                        simd_cmp_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_gt(y), false)
                    }
                    ComparisonOp::Le => {
                        simd_cmp_zip!($V, $L, 0, lhs, rhs, dst, |x: $V, y: $V| x
                            .cmp_gt(y), true)
                    }
                    // a < b is b > a with the operands swapped.
                    ComparisonOp::Lt => {
                        simd_cmp_zip!($V, $L, 0, rhs, lhs, dst, |x: $V, y: $V| x
                            .cmp_gt(y), false)
                    }
                    ComparisonOp::Ge => {
                        simd_cmp_zip!($V, $L, 0, rhs, lhs, dst, |x: $V, y: $V| x
                            .cmp_gt(y), true)
                    }
                }
            }

            fn vec_predicate(_op: PredicateOp, _src: &[Self], _dst: &mut [bool]) -> bool {
                false
            }

            fn vec_reduce(op: AssociativeOp, acc: Self, src: &[Self]) -> Self {
                match op {
                    AssociativeOp::Add | AssociativeOp::NanAdd => {
                        let lanes = simd_fold!($V, $L, 0, src, |a: $V, v: $V| a + v);
                        lanes.iter().copied().fold(acc, |a, b| a.wrapping_add(b))
                    }
                    AssociativeOp::Min => {
                        let lanes = simd_fold!($V, $L, <$T>::MAX, src, |a: $V, v: $V| {
                            let gt = a.cmp_gt(v);
                            gt.blend(v, a)
                        });
                        lanes.iter().copied().fold(acc, <$T>::min)
                    }
                    AssociativeOp::Max => {
                        let lanes = simd_fold!($V, $L, <$T>::MIN, src, |a: $V, v: $V| {
                            let gt = v.cmp_gt(a);
                            gt.blend(v, a)
                        });
                        lanes.iter().copied().fold(acc, <$T>::max)
                    }
                }
            }

            fn arange_len(start: Self, stop: Self, step: Self) -> Result<usize> {
                let diff = stop.wrapping_sub(start);
                let q = diff / step;
                let r = diff % step;
                Ok((q + <$T>::from(r != 0)) as usize)
            }

            fn arange_at(start: Self, step: Self, i: usize) -> Self {
                start.wrapping_add(step.wrapping_mul(i as $T))
            }

            fn alloc(shape: &[usize]) -> Box<dyn CubeMut<Self>> {
                Box::new(DenseCube::<$T>::new(shape))
            }
        }
    };
}
