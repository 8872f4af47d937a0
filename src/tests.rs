// Licensed under the MIT and Apache-2.0 licenses.

#[cfg(test)]
mod test_helpers {
    use crate::*;

    pub fn dump<T: Element>(c: &dyn Cube<T>) -> Vec<T> {
        (0..c.size()).map(|i| c.get_at(i)).collect()
    }

    /// Value equality with NaN == NaN, for oracle comparisons.
    pub fn same<T: Element>(a: T, b: T) -> bool {
        (a.is_missing() && b.is_missing()) || a == b
    }

    // Long enough to cross several staging chunks and leave a lane tail.
    pub const CYCLE: usize = 515;
}

#[cfg(test)]
mod test_binary {
    use super::test_helpers::*;
    use crate::*;
    use quickcheck::{QuickCheck, TestResult};

    macro_rules! binary_matches_oracle {
        ($T:ty, $($test:ident $opcode:ident),* $(,)?) => {
            $(
                #[test]
                fn $test() {
                    fn check(mut x: Vec<$T>, mut y: Vec<$T>) -> TestResult {
                        if x.is_empty() {
                            x.push(<$T as Element>::ONE);
                        }
                        if y.is_empty() {
                            y.push(<$T as Element>::ONE);
                        }
                        if matches!(BinaryOp::$opcode, BinaryOp::Div | BinaryOp::Mod) {
                            // No zero divisors, and no MIN / -1 overflow trap.
                            for v in x.iter_mut().chain(y.iter_mut()) {
                                if *v == <$T as Element>::ZERO
                                    || *v == <$T as Element>::MIN_VALUE
                                {
                                    *v = <$T as Element>::ONE;
                                }
                            }
                        }
                        let a: Vec<$T> = x.iter().cloned().cycle().take(CYCLE).collect();
                        let b: Vec<$T> = y.iter().cloned().cycle().take(CYCLE).collect();
                        let ca = DenseCube::from_slice(&a);
                        let cb = DenseCube::from_slice(&b);
                        let r = match binary_op(BinaryOp::$opcode, &ca, &cb) {
                            Ok(r) => r,
                            Err(_) => return TestResult::failed(),
                        };
                        for i in 0..CYCLE {
                            let expect =
                                <$T as Element>::apply_binary(BinaryOp::$opcode, a[i], b[i])
                                    .unwrap();
                            if !same(r.get_at(i), expect) {
                                return TestResult::failed();
                            }
                        }
                        TestResult::passed()
                    }
                    QuickCheck::new()
                        .tests(40)
                        .max_tests(200)
                        .quickcheck(check as fn(Vec<$T>, Vec<$T>) -> TestResult);
                }
            )*
        }
    }

    binary_matches_oracle!(i32,
                           test_i32_add Add,
                           test_i32_sub Sub,
                           test_i32_mul Mul,
                           test_i32_div Div,
                           test_i32_mod Mod,
                           test_i32_pow Pow,
                           test_i32_min Min,
                           test_i32_max Max,
                           test_i32_and And,
                           test_i32_or Or,
                           test_i32_xor Xor);

    binary_matches_oracle!(i64,
                           test_i64_add Add,
                           test_i64_sub Sub,
                           test_i64_mul Mul,
                           test_i64_div Div,
                           test_i64_mod Mod,
                           test_i64_min Min,
                           test_i64_max Max,
                           test_i64_and And,
                           test_i64_or Or,
                           test_i64_xor Xor);

    binary_matches_oracle!(f32,
                           test_f32_add Add,
                           test_f32_sub Sub,
                           test_f32_mul Mul,
                           test_f32_div Div,
                           test_f32_mod Mod,
                           test_f32_min Min,
                           test_f32_max Max);

    binary_matches_oracle!(f64,
                           test_f64_add Add,
                           test_f64_sub Sub,
                           test_f64_mul Mul,
                           test_f64_div Div,
                           test_f64_mod Mod,
                           test_f64_pow Pow,
                           test_f64_min Min,
                           test_f64_max Max);

    #[test]
    fn test_bool_logic_ops() {
        fn check(mut x: Vec<bool>, mut y: Vec<bool>) -> TestResult {
            if x.is_empty() {
                x.push(true);
            }
            if y.is_empty() {
                y.push(false);
            }
            let a: Vec<bool> = x.iter().cloned().cycle().take(CYCLE).collect();
            let b: Vec<bool> = y.iter().cloned().cycle().take(CYCLE).collect();
            let ca = BitsetCube::from_slice(&a);
            let cb = BitsetCube::from_slice(&b);
            for (op, f) in [
                (BinaryOp::And, (|p: bool, q: bool| p & q) as fn(bool, bool) -> bool),
                (BinaryOp::Or, |p, q| p | q),
                (BinaryOp::Xor, |p, q| p ^ q),
            ] {
                let r = binary_op(op, &ca, &cb).unwrap();
                for i in 0..CYCLE {
                    if r.get_at(i) != f(a[i], b[i]) {
                        return TestResult::failed();
                    }
                }
            }
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(40)
            .quickcheck(check as fn(Vec<bool>, Vec<bool>) -> TestResult);
    }

    #[test]
    fn test_unsupported_combinations() {
        let f = DenseCube::from_slice(&[1.0f64, 2.0]);
        assert!(matches!(
            binary_op(BinaryOp::And, &f, &f),
            Err(CubeError::UnsupportedOp { .. })
        ));
        let b = BitsetCube::from_slice(&[true, false]);
        assert!(matches!(
            binary_op(BinaryOp::Add, &b, &b),
            Err(CubeError::UnsupportedOp { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DenseCube::from_slice(&[1i32, 2, 3]);
        let b = DenseCube::from_slice(&[1i32, 2]);
        assert!(matches!(
            binary_op(BinaryOp::Add, &a, &b),
            Err(CubeError::ShapeMismatch { .. })
        ));
    }
}

#[cfg(test)]
mod test_comparison {
    use super::test_helpers::*;
    use crate::*;
    use quickcheck::{QuickCheck, TestResult};

    macro_rules! comparison_matches_oracle {
        ($T:ty, $($test:ident $opcode:ident),* $(,)?) => {
            $(
                #[test]
                fn $test() {
                    fn check(mut x: Vec<$T>, mut y: Vec<$T>) -> TestResult {
                        if x.is_empty() {
                            x.push(<$T as Element>::ONE);
                        }
                        if y.is_empty() {
                            y.push(<$T as Element>::ONE);
                        }
                        let a: Vec<$T> = x.iter().cloned().cycle().take(CYCLE).collect();
                        let b: Vec<$T> = y.iter().cloned().cycle().take(CYCLE).collect();
                        let ca = DenseCube::from_slice(&a);
                        let cb = DenseCube::from_slice(&b);
                        let r = comparison_op(ComparisonOp::$opcode, &ca, &cb).unwrap();
                        for i in 0..CYCLE {
                            let expect =
                                <$T as Element>::compare(ComparisonOp::$opcode, a[i], b[i]);
                            if r.get_at(i) != expect {
                                return TestResult::failed();
                            }
                        }
                        TestResult::passed()
                    }
                    QuickCheck::new()
                        .tests(40)
                        .max_tests(200)
                        .quickcheck(check as fn(Vec<$T>, Vec<$T>) -> TestResult);
                }
            )*
        }
    }

    comparison_matches_oracle!(i32,
                               test_i32_eq Eq,
                               test_i32_ne Ne,
                               test_i32_lt Lt,
                               test_i32_gt Gt,
                               test_i32_le Le,
                               test_i32_ge Ge);

    comparison_matches_oracle!(i64,
                               test_i64_lt Lt,
                               test_i64_ge Ge);

    comparison_matches_oracle!(f64,
                               test_f64_eq Eq,
                               test_f64_ne Ne,
                               test_f64_lt Lt,
                               test_f64_gt Gt,
                               test_f64_le Le,
                               test_f64_ge Ge);

    #[test]
    fn test_nan_compares_false_except_ne() {
        let a = DenseCube::from_slice(&[1.0f64, f64::NAN, f64::NAN]);
        let b = DenseCube::from_slice(&[1.0f64, 1.0, f64::NAN]);
        assert_eq!(
            dump(comparison_op(ComparisonOp::Eq, &a, &b).unwrap().as_cube()),
            vec![true, false, false]
        );
        assert_eq!(
            dump(comparison_op(ComparisonOp::Ne, &a, &b).unwrap().as_cube()),
            vec![false, true, true]
        );
        assert_eq!(
            dump(comparison_op(ComparisonOp::Le, &a, &b).unwrap().as_cube()),
            vec![true, false, false]
        );
    }

    #[test]
    fn test_bool_comparisons() {
        let a = BitsetCube::from_slice(&[false, false, true, true]);
        let b = BitsetCube::from_slice(&[false, true, false, true]);
        assert_eq!(
            dump(comparison_op(ComparisonOp::Lt, &a, &b).unwrap().as_cube()),
            vec![false, true, false, false]
        );
        assert_eq!(
            dump(comparison_op(ComparisonOp::Ge, &a, &b).unwrap().as_cube()),
            vec![true, false, true, true]
        );
        assert_eq!(
            dump(comparison_op(ComparisonOp::Eq, &a, &b).unwrap().as_cube()),
            vec![true, false, false, true]
        );
    }
}

#[cfg(test)]
mod test_unary {
    use super::test_helpers::*;
    use crate::*;
    use quickcheck::{QuickCheck, TestResult};

    macro_rules! unary_matches_oracle {
        ($T:ty, $($test:ident $opcode:ident),* $(,)?) => {
            $(
                #[test]
                fn $test() {
                    fn check(mut x: Vec<$T>) -> TestResult {
                        if x.is_empty() {
                            x.push(<$T as Element>::ONE);
                        }
                        let a: Vec<$T> = x.iter().cloned().cycle().take(CYCLE).collect();
                        let ca = DenseCube::from_slice(&a);
                        let r = unary_op(UnaryOp::$opcode, &ca).unwrap();
                        for i in 0..CYCLE {
                            let expect =
                                <$T as Element>::apply_unary(UnaryOp::$opcode, a[i]).unwrap();
                            if !same(r.get_at(i), expect) {
                                return TestResult::failed();
                            }
                        }
                        TestResult::passed()
                    }
                    QuickCheck::new()
                        .tests(40)
                        .max_tests(200)
                        .quickcheck(check as fn(Vec<$T>) -> TestResult);
                }
            )*
        }
    }

    unary_matches_oracle!(f64,
                          test_f64_neg Neg,
                          test_f64_abs Abs,
                          test_f64_floor Floor,
                          test_f64_round Round,
                          test_f64_ceil Ceil,
                          test_f64_exp Exp,
                          test_f64_log Log,
                          test_f64_tanh Tanh);

    unary_matches_oracle!(f32,
                          test_f32_neg Neg,
                          test_f32_sin Sin,
                          test_f32_cos Cos);

    unary_matches_oracle!(i32,
                          test_i32_neg Neg,
                          test_i32_abs Abs,
                          test_i32_not Not,
                          test_i32_floor Floor);

    unary_matches_oracle!(i64,
                          test_i64_neg Neg,
                          test_i64_not Not);

    #[test]
    fn test_bool_not() {
        let a = BitsetCube::from_slice(&[true, false, true]);
        let r = unary_op(UnaryOp::Not, &a).unwrap();
        assert_eq!(dump(r.as_cube()), vec![false, true, false]);
    }

    #[test]
    fn test_transcendental_unsupported_on_ints() {
        let a = DenseCube::from_slice(&[1i32, 2]);
        assert!(matches!(
            unary_op(UnaryOp::Exp, &a),
            Err(CubeError::UnsupportedOp { .. })
        ));
    }
}

#[cfg(test)]
mod test_reductions {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_nan_poisons_sum_but_not_nansum() {
        let a = DenseCube::from_slice(&[1.0f64, f64::NAN, 3.0]);
        assert!(associative_op(AssociativeOp::Add, &a, None, None)
            .unwrap()
            .is_nan());
        assert_eq!(
            associative_op(AssociativeOp::NanAdd, &a, None, None).unwrap(),
            4.0
        );
        assert!(reductive_logic_op(ReductiveLogicOp::Any, &a, None).unwrap());
        assert!(reductive_logic_op(ReductiveLogicOp::All, &a, None).unwrap());
    }

    #[test]
    fn test_nan_poisons_min_max() {
        let a = DenseCube::from_slice(&[3.0f64, 1.0, f64::NAN, 2.0]);
        assert!(associative_op(AssociativeOp::Min, &a, None, None)
            .unwrap()
            .is_nan());
        assert!(associative_op(AssociativeOp::Max, &a, None, None)
            .unwrap()
            .is_nan());
        let clean = DenseCube::from_slice(&[3.0f64, 1.0, 2.0]);
        assert_eq!(
            associative_op(AssociativeOp::Min, &clean, None, None).unwrap(),
            1.0
        );
        assert_eq!(
            associative_op(AssociativeOp::Max, &clean, None, None).unwrap(),
            3.0
        );
    }

    #[test]
    fn test_int_reductions() {
        let a = DenseCube::from_slice(&[5i32, -2, 9, 0]);
        assert_eq!(associative_op(AssociativeOp::Add, &a, None, None).unwrap(), 12);
        assert_eq!(associative_op(AssociativeOp::Min, &a, None, None).unwrap(), -2);
        assert_eq!(associative_op(AssociativeOp::Max, &a, None, None).unwrap(), 9);
        // NanAdd on integers is a plain sum.
        assert_eq!(
            associative_op(AssociativeOp::NanAdd, &a, None, None).unwrap(),
            12
        );
    }

    #[test]
    fn test_initial_value_seeds_accumulator() {
        let a = DenseCube::from_slice(&[1i64, 2, 3]);
        assert_eq!(
            associative_op(AssociativeOp::Add, &a, Some(10), None).unwrap(),
            16
        );
        assert_eq!(
            associative_op(AssociativeOp::Min, &a, Some(0), None).unwrap(),
            0
        );
    }

    #[test]
    fn test_where_mask_filters_reduction() {
        let a = DenseCube::from_slice(&[1i32, 2, 3, 4, 5, 6]);
        let w = BitsetCube::from_slice(&[true, false, true, false, true, false]);
        assert_eq!(
            associative_op(AssociativeOp::Add, &a, None, Some(&w)).unwrap(),
            9
        );
        assert!(!reductive_logic_op(
            ReductiveLogicOp::All,
            &DenseCube::from_slice(&[1i32, 0, 1]),
            None
        )
        .unwrap());
        // Masking out the zero flips All back to true.
        let w2 = BitsetCube::from_slice(&[true, false, true]);
        assert!(reductive_logic_op(
            ReductiveLogicOp::All,
            &DenseCube::from_slice(&[1i32, 0, 1]),
            Some(&w2)
        )
        .unwrap());
    }

    #[test]
    fn test_sum_and_negated_sum_cancel() {
        let a = DenseCube::from_slice(&[4i64, -7, 11, 3, -1]);
        let n = unary_op(UnaryOp::Neg, &a).unwrap();
        let s = associative_op(AssociativeOp::Add, &a, None, None).unwrap();
        let sn = associative_op(AssociativeOp::Add, n.as_cube(), None, None).unwrap();
        assert_eq!(s + sn, 0);
    }

    #[test]
    fn test_associative_unsupported_on_bool() {
        let b = BitsetCube::from_slice(&[true, false]);
        assert!(matches!(
            associative_op(AssociativeOp::Add, &b, None, None),
            Err(CubeError::UnsupportedOp { .. })
        ));
    }
}

#[cfg(test)]
mod test_axes {
    use super::test_helpers::*;
    use crate::*;

    fn two_by_three() -> DenseCube<i64> {
        DenseCube::from_vec(&[2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn test_sum_by_last_axis() {
        let a = two_by_three();
        let r = associative_op_by_axes(AssociativeOp::Add, &a, &[1], None, None).unwrap();
        assert_eq!(r.shape(), &[2]);
        assert_eq!(dump(r.as_cube()), vec![6, 15]);
    }

    #[test]
    fn test_sum_by_first_axis() {
        let a = two_by_three();
        let r = associative_op_by_axes(AssociativeOp::Add, &a, &[0], None, None).unwrap();
        assert_eq!(r.shape(), &[3]);
        assert_eq!(dump(r.as_cube()), vec![5, 7, 9]);
    }

    #[test]
    fn test_empty_axis_list_reduces_everything() {
        let a = two_by_three();
        let r = associative_op_by_axes(AssociativeOp::Add, &a, &[], None, None).unwrap();
        assert_eq!(r.shape(), &[1]);
        assert_eq!(dump(r.as_cube()), vec![21]);
    }

    #[test]
    fn test_axis_validation() {
        let a = two_by_three();
        assert!(matches!(
            associative_op_by_axes(AssociativeOp::Add, &a, &[2], None, None),
            Err(CubeError::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            associative_op_by_axes(AssociativeOp::Add, &a, &[0, 0], None, None),
            Err(CubeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_by_axes_with_initial_and_mask() {
        let a = two_by_three();
        let r =
            associative_op_by_axes(AssociativeOp::Add, &a, &[1], Some(10), None).unwrap();
        assert_eq!(dump(r.as_cube()), vec![16, 25]);

        let w = BitsetCube::from_slice(&[true, false, true, true, false, true]);
        let w = {
            let mut m = BitsetCube::new(&[2, 3]);
            for i in 0..6 {
                m.set_at(i, w.get_at(i));
            }
            m
        };
        let r = associative_op_by_axes(AssociativeOp::Add, &a, &[1], None, Some(&w)).unwrap();
        assert_eq!(dump(r.as_cube()), vec![4, 10]);
    }

    #[test]
    fn test_logic_by_axes() {
        let a = DenseCube::from_vec(&[2, 3], vec![1i32, 0, 1, 1, 1, 1]).unwrap();
        let any = reductive_logic_op_by_axes(ReductiveLogicOp::Any, &a, &[1], None).unwrap();
        assert_eq!(dump(any.as_cube()), vec![true, true]);
        let all = reductive_logic_op_by_axes(ReductiveLogicOp::All, &a, &[1], None).unwrap();
        assert_eq!(dump(all.as_cube()), vec![false, true]);
        let nothing = reductive_logic_op_by_axes(ReductiveLogicOp::All, &a, &[], None).unwrap();
        assert_eq!(dump(nothing.as_cube()), vec![false]);
    }

    #[test]
    fn test_three_dim_reduction() {
        // shape [2, 2, 2] = 0..8; reduce the middle axis.
        let a = DenseCube::from_vec(&[2, 2, 2], (0..8i64).collect()).unwrap();
        let r = associative_op_by_axes(AssociativeOp::Add, &a, &[1], None, None).unwrap();
        assert_eq!(r.shape(), &[2, 2]);
        // [[0+2, 1+3], [4+6, 5+7]]
        assert_eq!(dump(r.as_cube()), vec![2, 4, 10, 12]);
    }
}

#[cfg(test)]
mod test_extract {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_extract_preserves_flat_order() {
        let c = BitsetCube::from_slice(&[true, false, true, false, true]);
        let a = DenseCube::from_slice(&[10i32, 20, 30, 40, 50]);
        let r = extract(&c, &a).unwrap();
        assert_eq!(r.shape(), &[3]);
        assert_eq!(dump(r.as_cube()), vec![10, 30, 50]);
    }

    #[test]
    fn test_extract_length_is_popcount() {
        let flags: Vec<bool> = (0..CYCLE).map(|i| i % 3 == 0).collect();
        let vals: Vec<i64> = (0..CYCLE as i64).collect();
        let c = BitsetCube::from_slice(&flags);
        let a = DenseCube::from_slice(&vals);
        let n = popcount(&c).unwrap();
        assert_eq!(n, flags.iter().filter(|&&b| b).count());
        let r = extract(&c, &a).unwrap();
        assert_eq!(r.size(), n);
        let expect: Vec<i64> = vals
            .iter()
            .zip(&flags)
            .filter(|(_, &f)| f)
            .map(|(&v, _)| v)
            .collect();
        assert_eq!(dump(r.as_cube()), expect);
    }

    #[test]
    fn test_extract_bool_values() {
        let c = BitsetCube::from_slice(&[true, true, false, true]);
        let a = BitsetCube::from_slice(&[true, false, true, true]);
        let r = extract(&c, &a).unwrap();
        assert_eq!(dump(r.as_cube()), vec![true, false, true]);
    }
}

#[cfg(test)]
mod test_masks {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_mask_law_binary() {
        let a = DenseCube::from_slice(&[1i32, 2, 3, 4]);
        let b = DenseCube::from_slice(&[10i32, 20, 30, 40]);
        let w = BitsetCube::from_slice(&[true, false, true, false]);
        let mut dst = DenseCube::from_slice(&[-1i32, -1, -1, -1]);
        binary_op_into(BinaryOp::Add, &a, &b, &mut dst, Some(&w)).unwrap();
        assert_eq!(dump(dst.as_cube()), vec![11, -1, 33, -1]);
    }

    #[test]
    fn test_mask_law_unary_and_comparison() {
        let a = DenseCube::from_slice(&[1.0f64, -2.0, 3.0, -4.0]);
        let w = BitsetCube::from_slice(&[false, true, false, true]);

        let mut dst = DenseCube::from_slice(&[0.0f64; 4]);
        unary_op_into(UnaryOp::Abs, &a, &mut dst, Some(&w)).unwrap();
        assert_eq!(dump(dst.as_cube()), vec![0.0, 2.0, 0.0, 4.0]);

        let mut cmp = BitsetCube::new(&[4]);
        cmp.fill(true);
        comparison_op_into(ComparisonOp::Lt, &a, &a, &mut cmp, Some(&w)).unwrap();
        // Unmasked entries keep their previous value.
        assert_eq!(dump(cmp.as_cube()), vec![true, false, true, false]);
    }

    #[test]
    fn test_mask_shape_must_match() {
        let a = DenseCube::from_slice(&[1i32, 2, 3]);
        let b = DenseCube::from_slice(&[1i32, 2, 3]);
        let w = BitsetCube::from_slice(&[true, false]);
        let mut dst = DenseCube::from_slice(&[0i32, 0, 0]);
        assert!(matches!(
            binary_op_into(BinaryOp::Add, &a, &b, &mut dst, Some(&w)),
            Err(CubeError::ShapeMismatch { .. })
        ));
        // Failed validation leaves the destination untouched.
        assert_eq!(dump(dst.as_cube()), vec![0, 0, 0]);
    }
}

#[cfg(test)]
mod test_scalars {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_scalar_rhs_and_lhs() {
        let a = DenseCube::from_slice(&[1.0f64, 2.0, 3.0]);
        let r = binary_op_scalar_rhs(BinaryOp::Mul, &a, Scalar::I32(10)).unwrap();
        assert_eq!(dump(r.as_cube()), vec![10.0, 20.0, 30.0]);
        let r = binary_op_scalar_lhs(BinaryOp::Sub, Scalar::F64(10.0), &a).unwrap();
        assert_eq!(dump(r.as_cube()), vec![9.0, 8.0, 7.0]);
    }

    #[test]
    fn test_scalar_comparison() {
        let a = DenseCube::from_slice(&[1i32, 5, 3]);
        let r = comparison_op_scalar_rhs(ComparisonOp::Ge, &a, Scalar::I32(3)).unwrap();
        assert_eq!(dump(r.as_cube()), vec![false, true, true]);
    }

    #[test]
    fn test_strict_lift_refuses_lossy_values() {
        let a = DenseCube::from_slice(&[1i32, 2, 3]);
        assert!(matches!(
            binary_op_scalar_rhs(BinaryOp::Add, &a, Scalar::F64(2.5)),
            Err(CubeError::CastOverflow { .. })
        ));
        assert!(matches!(
            binary_op_scalar_rhs(BinaryOp::Add, &a, Scalar::I64(1 << 40)),
            Err(CubeError::CastOverflow { .. })
        ));
        // Integral floats round-trip and are accepted.
        let r = binary_op_scalar_rhs(BinaryOp::Add, &a, Scalar::F64(2.0)).unwrap();
        assert_eq!(dump(r.as_cube()), vec![3, 4, 5]);
    }

    #[test]
    fn test_strict_lift_f32_precision() {
        let a = DenseCube::from_slice(&[0.0f32]);
        // (1 << 25) + 1 is not representable in f32.
        assert!(matches!(
            binary_op_scalar_rhs(BinaryOp::Add, &a, Scalar::I32((1 << 25) + 1)),
            Err(CubeError::CastOverflow { .. })
        ));
        assert!(binary_op_scalar_rhs(BinaryOp::Add, &a, Scalar::I32(1 << 25)).is_ok());
    }
}

#[cfg(test)]
mod test_ctors {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_arange_odd_step() {
        let r = arange(1i32, 10, 2).unwrap();
        assert_eq!(dump(r.as_cube()), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_arange_descending() {
        let r = arange(5i32, 0, -1).unwrap();
        assert_eq!(dump(r.as_cube()), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_arange_zero_step_fails() {
        assert!(matches!(
            arange(0i32, 5, 0),
            Err(CubeError::InvalidArgument(_))
        ));
        assert!(matches!(
            arange(0i32, 5, -1),
            Err(CubeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_arange_floats() {
        let r = arange(0.0f64, 1.0, 0.25).unwrap();
        assert_eq!(dump(r.as_cube()), vec![0.0, 0.25, 0.5, 0.75]);
        let r = arange_to(4.0f32).unwrap();
        assert_eq!(dump(r.as_cube()), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_full_fills_and_strict_casts() {
        let r = full::<i32>(&[4], Scalar::I64(100)).unwrap();
        assert_eq!(r.shape(), &[4]);
        assert_eq!(dump(r.as_cube()), vec![100, 100, 100, 100]);
        // bool is the narrowest dtype: anything but 0/1 overflows.
        assert!(matches!(
            full::<bool>(&[4], Scalar::I32(300)),
            Err(CubeError::CastOverflow { .. })
        ));
        let r = broadcast::<f64>(&[2, 2], Scalar::I32(7)).unwrap();
        assert_eq!(dump(r.as_cube()), vec![7.0; 4]);
    }

    #[test]
    fn test_array_clones() {
        let a = DenseCube::from_slice(&[1i64, 2, 3]);
        let r = array(&a).unwrap();
        assert_eq!(dump(r.as_cube()), vec![1, 2, 3]);
    }
}

#[cfg(test)]
mod test_casts {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_widening_round_trip() {
        let a = DenseCube::from_slice(&[-3i32, 0, 7, i32::MAX]);
        let f = to_f64_cube(&a).unwrap();
        assert_eq!(dump(f.as_cube()), vec![-3.0, 0.0, 7.0, i32::MAX as f64]);
        let back = to_i32_cube(f.as_cube()).unwrap();
        assert_eq!(dump(back.as_cube()), dump(&a));
    }

    #[test]
    fn test_float_to_int_truncates_toward_zero() {
        let a = DenseCube::from_slice(&[2.7f64, -2.7, 0.5, f64::NAN]);
        let r = to_i64_cube(&a).unwrap();
        assert_eq!(dump(r.as_cube()), vec![2, -2, 0, 0]);
    }

    #[test]
    fn test_bool_conversions() {
        let a = DenseCube::from_slice(&[0.0f64, 1.5, f64::NAN, -0.0]);
        let b = to_bool_cube(&a).unwrap();
        assert_eq!(dump(b.as_cube()), vec![false, true, true, false]);
        let n = to_i32_cube(b.as_cube()).unwrap();
        assert_eq!(dump(n.as_cube()), vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_copy_idempotent() {
        let a = DenseCube::from_slice(&[1.5f32, -2.5, f32::NAN]);
        let c1 = copy(&a).unwrap();
        let c2 = copy(c1.as_cube()).unwrap();
        for i in 0..a.size() {
            assert!(same(c1.get_at(i), c2.get_at(i)));
        }
    }

    #[test]
    fn test_copy_into_checks_shape() {
        let a = DenseCube::from_slice(&[1i32, 2, 3]);
        let mut d = DenseCube::new(&[2]);
        assert!(matches!(
            copy_into(&a, &mut d),
            Err(CubeError::ShapeMismatch { .. })
        ));
        let mut d = DenseCube::new(&[3]);
        copy_into(&a, &mut d).unwrap();
        assert_eq!(dump(d.as_cube()), vec![1, 2, 3]);
    }
}

#[cfg(test)]
mod test_predicates {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_float_classification() {
        let a = DenseCube::from_slice(&[1.0f64, f64::NAN, f64::INFINITY, f64::NEG_INFINITY]);
        assert_eq!(
            dump(predicate_op(PredicateOp::IsNan, &a).unwrap().as_cube()),
            vec![false, true, false, false]
        );
        assert_eq!(
            dump(predicate_op(PredicateOp::IsInf, &a).unwrap().as_cube()),
            vec![false, false, true, true]
        );
        assert_eq!(
            dump(predicate_op(PredicateOp::IsFinite, &a).unwrap().as_cube()),
            vec![true, false, false, false]
        );
    }

    #[test]
    fn test_predicates_only_for_floats() {
        let a = DenseCube::from_slice(&[1i32, 2]);
        assert!(matches!(
            predicate_op(PredicateOp::IsNan, &a),
            Err(CubeError::UnsupportedOp { .. })
        ));
    }
}

#[cfg(test)]
mod test_views {
    use super::test_helpers::*;
    use crate::axis::RippleCounter;
    use crate::*;

    #[test]
    fn test_broadcast_view_reads_one_value() {
        let b = BroadcastCube::new(vec![2, 3], 42i32);
        assert_eq!(b.size(), 6);
        for i in 0..6 {
            assert_eq!(b.get_at(i), 42);
        }
        let a = DenseCube::from_vec(&[2, 3], vec![1i32; 6]).unwrap();
        let r = binary_op(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(dump(r.as_cube()), vec![43; 6]);
    }

    #[test]
    fn test_slice_view_takes_scalar_path() {
        let a = DenseCube::from_vec(&[4, 3], (0..12i32).collect()).unwrap();
        let row = SliceCube::new(&a, &[Accessor::At(2), Accessor::Range(0, 3)]).unwrap();
        assert_eq!(row.shape(), &[3]);
        assert_eq!(dump(&row), vec![6, 7, 8]);
        // The view has no bulk I/O, so this exercises the fallback.
        let s = associative_op(AssociativeOp::Add, &row, None, None).unwrap();
        assert_eq!(s, 21);
        let r = binary_op(BinaryOp::Add, &row, &row).unwrap();
        assert_eq!(dump(r.as_cube()), vec![12, 14, 16]);
    }

    #[test]
    fn test_roll_accessor_shifts_circularly() {
        let a = DenseCube::from_slice(&[1i32, 2, 3, 4, 5]);
        let rolled = SliceCube::new(&a, &[Accessor::Roll(1)]).unwrap();
        assert_eq!(dump(&rolled), vec![5, 1, 2, 3, 4]);
        let rolled = SliceCube::new(&a, &[Accessor::Roll(-2)]).unwrap();
        assert_eq!(dump(&rolled), vec![3, 4, 5, 1, 2]);
    }

    #[test]
    fn test_slice_validation() {
        let a = DenseCube::from_slice(&[1i32, 2, 3]);
        assert!(SliceCube::new(&a, &[Accessor::At(3)]).is_err());
        assert!(SliceCube::new(&a, &[Accessor::Range(1, 4)]).is_err());
        assert!(SliceCube::new(&a, &[Accessor::At(0), Accessor::At(0)]).is_err());
    }

    #[test]
    fn test_ripple_counter_orders_last_axis_fastest() {
        let got: Vec<Vec<usize>> = RippleCounter::new(vec![2, 3]).collect();
        assert_eq!(
            got,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
        let one: Vec<Vec<usize>> = RippleCounter::new(vec![]).collect();
        assert_eq!(one, vec![Vec::<usize>::new()]);
    }
}

#[cfg(test)]
mod test_parallel {
    use super::test_helpers::*;
    use crate::pool;
    use crate::*;

    // Large enough to clear the default threading threshold, so these run
    // through the bucketed pool path when the pool exists.
    const BIG: usize = 200_000;

    #[test]
    fn test_bucket_partitioning() {
        for &(total, pieces) in &[(100usize, 4usize), (131072, 4), (200_000, 8), (31, 4)] {
            let buckets = pool::split(total, pieces);
            assert!(buckets.len() <= pieces);
            let mut expect = 0;
            for (i, b) in buckets.iter().enumerate() {
                assert_eq!(b.start, expect);
                // Every bucket but the last is 32-aligned.
                if i + 1 < buckets.len() {
                    assert_eq!(b.len() % 32, 0);
                }
                expect = b.end;
            }
            assert_eq!(expect, total);
        }
        assert!(pool::split(0, 4).is_empty());
    }

    #[test]
    fn test_parallel_elementwise_matches_oracle() {
        let a: Vec<f64> = (0..BIG).map(|i| i as f64 * 0.5).collect();
        let b: Vec<f64> = (0..BIG).map(|i| (BIG - i) as f64).collect();
        let ca = DenseCube::from_slice(&a);
        let cb = DenseCube::from_slice(&b);
        let r = binary_op(BinaryOp::Add, &ca, &cb).unwrap();
        for i in 0..BIG {
            assert_eq!(r.get_at(i), a[i] + b[i]);
        }
    }

    #[test]
    fn test_parallel_sum_of_integers_is_exact() {
        // Integer-valued doubles below 2^53 sum exactly under any
        // bucketing, so the parallel result is deterministic here.
        let a: Vec<f64> = (0..BIG).map(|i| i as f64).collect();
        let ca = DenseCube::from_slice(&a);
        let s = associative_op(AssociativeOp::Add, &ca, None, None).unwrap();
        let expect = (BIG as f64 - 1.0) * BIG as f64 / 2.0;
        assert_eq!(s, expect);
    }

    #[test]
    fn test_parallel_extract_preserves_order() {
        let vals: Vec<i64> = (0..BIG as i64).collect();
        let flags: Vec<bool> = (0..BIG).map(|i| i % 7 == 0).collect();
        let a = DenseCube::from_slice(&vals);
        let c = BitsetCube::from_slice(&flags);
        let r = extract(&c, &a).unwrap();
        let expect: Vec<i64> = vals
            .iter()
            .zip(&flags)
            .filter(|(_, &f)| f)
            .map(|(&v, _)| v)
            .collect();
        assert_eq!(r.size(), expect.len());
        assert_eq!(dump(r.as_cube()), expect);
    }

    #[test]
    fn test_parallel_comparison_into_bitset() {
        let a: Vec<i32> = (0..BIG as i32).collect();
        let ca = DenseCube::from_slice(&a);
        let r = comparison_op_scalar_rhs(ComparisonOp::Lt, &ca, Scalar::I32(1000)).unwrap();
        assert_eq!(popcount(r.as_cube()).unwrap(), 1000);
    }
}

#[cfg(test)]
mod test_storage {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_bitset_roundtrip() {
        let flags: Vec<bool> = (0..100).map(|i| i % 3 != 0).collect();
        let mut c = BitsetCube::from_slice(&flags);
        assert_eq!(dump(&c), flags);
        c.set_at(1, false);
        assert!(!c.get_at(1));
        c.fill(true);
        assert!(dump(&c).iter().all(|&b| b));
    }

    #[test]
    fn test_bitset_writer_sets_and_clears() {
        let mut c = BitsetCube::new(&[70]);
        c.fill(true);
        {
            let w = c.writer();
            w.set(0, false);
            w.set(33, false);
            w.write_flat(&[false, true, false], 64);
        }
        assert!(!c.get_at(0));
        assert!(c.get_at(1));
        assert!(!c.get_at(33));
        assert_eq!(dump(&c)[64..67], [false, true, false]);
    }

    #[test]
    fn test_dense_bulk_io() {
        let c = DenseCube::from_vec(&[2, 2], vec![1i32, 2, 3, 4]).unwrap();
        let mut buf = [0i32; 4];
        c.to_flat(1, &mut buf, 0, 3).unwrap();
        assert_eq!(&buf[..3], &[2, 3, 4]);
        assert_eq!(c.length(1), 2);
        assert_eq!(c.ndim(), 2);
        assert!(DenseCube::from_vec(&[2, 2], vec![1i32]).is_err());
    }

    #[test]
    fn test_object_level_missing() {
        let c = DenseCube::from_slice(&[1.0f64, f64::NAN]);
        assert_eq!(c.get_object_at(0), Some(1.0));
        assert_eq!(c.get_object_at(1), None);
        let mut d = DenseCube::from_slice(&[0.0f64]);
        d.set_object_at(0, None);
        assert!(d.get_at(0).is_nan());
    }

    #[test]
    fn test_settings_are_sane() {
        let s = settings().unwrap();
        assert!(s.staging_size >= 1 && s.staging_size <= STAGING_SIZE);
    }
}

#[cfg(test)]
mod test_math {
    use super::test_helpers::*;
    use crate::*;

    #[test]
    fn test_named_wrappers_route_to_dispatch() {
        let a = DenseCube::from_slice(&[1.0f64, 4.0, 9.0]);
        let b = DenseCube::from_slice(&[1.0f64, 2.0, 3.0]);
        assert_eq!(
            dump(math::add(&a, &b).unwrap().as_cube()),
            vec![2.0, 6.0, 12.0]
        );
        assert_eq!(
            dump(math::divide(&a, &b).unwrap().as_cube()),
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(
            dump(math::negative(&b).unwrap().as_cube()),
            vec![-1.0, -2.0, -3.0]
        );
        assert_eq!(
            dump(math::greater(&a, &b).unwrap().as_cube()),
            vec![false, true, true]
        );
        assert_eq!(math::sum(&b).unwrap(), 6.0);
        assert_eq!(math::min(&a).unwrap(), 1.0);
        assert_eq!(math::max(&a).unwrap(), 9.0);
        assert!(math::any(&b).unwrap());
        assert!(math::all(&b).unwrap());
    }

    #[test]
    fn test_named_axis_wrappers() {
        let a = DenseCube::from_vec(&[2, 3], vec![1i64, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(
            dump(math::sum_over_axes(&a, &[1]).unwrap().as_cube()),
            vec![6, 15]
        );
        assert_eq!(
            dump(math::max_over_axes(&a, &[0]).unwrap().as_cube()),
            vec![4, 5, 6]
        );
        let z = DenseCube::from_vec(&[2, 2], vec![0i64, 1, 1, 1]).unwrap();
        assert_eq!(
            dump(math::all_over_axes(&z, &[1]).unwrap().as_cube()),
            vec![false, true]
        );
    }

    #[test]
    fn test_nansum_wrapper() {
        let a = DenseCube::from_slice(&[1.0f32, f32::NAN, 2.5]);
        assert!(math::sum(&a).unwrap().is_nan());
        assert_eq!(math::nansum(&a).unwrap(), 3.5);
        assert_eq!(
            dump(math::isnan(&a).unwrap().as_cube()),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_dimension_accessors() {
        let a = DenseCube::from_vec(&[4, 3], (0..12i32).collect()).unwrap();
        let rows = dim(&a, 0);
        let cols = dim(&a, 1);
        assert_eq!(rows.length, 4);
        assert!(rows.at(4).is_err());
        let view = SliceCube::new(&a, &[rows.at(1).unwrap(), cols.full()]).unwrap();
        assert_eq!(dump(&view), vec![3, 4, 5]);
        let window = SliceCube::new(&a, &[rows.range(0, 2).unwrap(), cols.at(0).unwrap()])
            .unwrap();
        assert_eq!(dump(&window), vec![0, 3]);
    }
}

#[cfg(test)]
mod test_scenarios {
    use super::test_helpers::*;
    use crate::*;

    // The worked end-to-end examples, kept together.

    #[test]
    fn test_vector_add() {
        let a = DenseCube::from_slice(&[1.0f64, 2.0, 3.0]);
        let b = DenseCube::from_slice(&[10.0f64, 20.0, 30.0]);
        let r = binary_op(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(dump(r.as_cube()), vec![11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_masked_where_application() {
        let a = DenseCube::from_slice(&[1.0f64, 2.0, 3.0, 4.0]);
        let b = DenseCube::from_slice(&[1.0f64, 1.0, 1.0, 1.0]);
        let w = BitsetCube::from_slice(&[true, true, false, false]);
        let mut r = DenseCube::from_slice(&[9.0f64, 9.0, 9.0, 9.0]);
        binary_op_into(BinaryOp::Add, &a, &b, &mut r, Some(&w)).unwrap();
        assert_eq!(dump(r.as_cube()), vec![2.0, 3.0, 9.0, 9.0]);
    }

    #[test]
    fn test_min_le_max_without_nans() {
        let a = DenseCube::from_slice(&[0.5f64, -1.25, 8.0, 3.5]);
        let min = associative_op(AssociativeOp::Min, &a, None, None).unwrap();
        let max = associative_op(AssociativeOp::Max, &a, None, None).unwrap();
        assert!(min <= max);
        let single = DenseCube::from_slice(&[4.25f64]);
        assert_eq!(
            associative_op(AssociativeOp::Min, &single, None, None).unwrap(),
            4.25
        );
        assert_eq!(
            associative_op(AssociativeOp::Max, &single, None, None).unwrap(),
            4.25
        );
    }
}
