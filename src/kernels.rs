// Licensed under the MIT and Apache-2.0 licenses.

//! One chunk-staged kernel per operation family, generic over [`Element`].
//!
//! Every kernel has the same two-tier shape: a fast path that stages
//! operand chunks into stack buffers and runs the element type's vector
//! body, and an elementwise scalar path the range is restarted on when a
//! container reports [`BulkIoUnsupported`]. The scalar path is also where
//! missing values are honored; the fast path inherits whatever the raw
//! primitive does (NaN propagation for floats, nothing for integers).

use std::ops::Range;

use crate::cast::CastTo;
use crate::config::{self, STAGING_SIZE};
use crate::cube::{Cube, CubeMut, ParWriter};
use crate::dtype::Element;
use crate::error::{BulkIoUnsupported, CubeError, Result};
use crate::ops::{AssociativeOp, BinaryOp, ComparisonOp, PredicateOp, ReductiveLogicOp, UnaryOp};
use crate::pool;

/// Fast-path outcome: `Bulk` means "restart this range on the scalar
/// path", anything else is a real error.
enum FastErr {
    Bulk,
    Real(CubeError),
}

impl From<BulkIoUnsupported> for FastErr {
    fn from(_: BulkIoUnsupported) -> Self {
        FastErr::Bulk
    }
}

type Fast<T> = std::result::Result<T, FastErr>;

fn chunk_len() -> Result<usize> {
    Ok(config::settings()?.staging_size)
}

////////////////////////////////////////////////////////////////////////////////
// Binary
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn binary<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let total = a.size();
    let chunk = chunk_len()?;
    let plan = pool::plan(total)?;
    let writer = dst.writer();
    let wtr: &dyn ParWriter<T> = &*writer;
    match plan {
        Some(buckets) => pool::run(buckets, |_, r| binary_range(op, a, b, wtr, w, r, chunk)),
        None => binary_range(op, a, b, wtr, w, 0..total, chunk),
    }
}

fn binary_range<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Result<()> {
    match binary_fast(op, a, b, wtr, w, range.clone(), chunk) {
        Ok(()) => Ok(()),
        Err(FastErr::Real(e)) => Err(e),
        Err(FastErr::Bulk) => {
            tracing::debug!(op = op.name(), "bulk staging unavailable, scalar fallback");
            binary_scalar(op, a, b, wtr, w, range)
        }
    }
}

fn binary_fast<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Fast<()> {
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut ab = [T::ZERO; STAGING_SIZE];
    let mut ar = [T::ZERO; STAGING_SIZE];
    let mut aw = [false; STAGING_SIZE];
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        a.to_flat(base, &mut aa, 0, len)?;
        b.to_flat(base, &mut ab, 0, len)?;
        if let Some(w) = w {
            w.to_flat(base, &mut aw, 0, len)?;
        }
        if !T::vec_binary(op, &aa[..len], &ab[..len], &mut ar[..len]) {
            for j in 0..len {
                ar[j] = T::apply_binary(op, aa[j], ab[j]).map_err(FastErr::Real)?;
            }
        }
        if w.is_none() {
            wtr.write_flat(&ar[..len], base);
        } else {
            // Masked writes go element-by-element: the destination may be
            // a packed bitset whose bulk writer cannot honor a mask.
            for j in 0..len {
                if aw[j] {
                    wtr.set(base + j, ar[j]);
                }
            }
        }
        base += len;
    }
    Ok(())
}

fn binary_scalar<T: Element>(
    op: BinaryOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
) -> Result<()> {
    for i in range {
        if let Some(w) = w {
            if !w.get_at(i) {
                continue;
            }
        }
        match (a.get_object_at(i), b.get_object_at(i)) {
            (Some(x), Some(y)) => wtr.set(i, T::apply_binary(op, x, y)?),
            _ => wtr.set(i, T::MISSING),
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Unary
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn unary<T: Element>(
    op: UnaryOp,
    a: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let total = a.size();
    let chunk = chunk_len()?;
    let plan = pool::plan(total)?;
    let writer = dst.writer();
    let wtr: &dyn ParWriter<T> = &*writer;
    match plan {
        Some(buckets) => pool::run(buckets, |_, r| unary_range(op, a, wtr, w, r, chunk)),
        None => unary_range(op, a, wtr, w, 0..total, chunk),
    }
}

fn unary_range<T: Element>(
    op: UnaryOp,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Result<()> {
    match unary_fast(op, a, wtr, w, range.clone(), chunk) {
        Ok(()) => Ok(()),
        Err(FastErr::Real(e)) => Err(e),
        Err(FastErr::Bulk) => {
            tracing::debug!(op = op.name(), "bulk staging unavailable, scalar fallback");
            unary_scalar(op, a, wtr, w, range)
        }
    }
}

fn unary_fast<T: Element>(
    op: UnaryOp,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Fast<()> {
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut ar = [T::ZERO; STAGING_SIZE];
    let mut aw = [false; STAGING_SIZE];
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        a.to_flat(base, &mut aa, 0, len)?;
        if let Some(w) = w {
            w.to_flat(base, &mut aw, 0, len)?;
        }
        if !T::vec_unary(op, &aa[..len], &mut ar[..len]) {
            for j in 0..len {
                ar[j] = T::apply_unary(op, aa[j]).map_err(FastErr::Real)?;
            }
        }
        if w.is_none() {
            wtr.write_flat(&ar[..len], base);
        } else {
            for j in 0..len {
                if aw[j] {
                    wtr.set(base + j, ar[j]);
                }
            }
        }
        base += len;
    }
    Ok(())
}

fn unary_scalar<T: Element>(
    op: UnaryOp,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
) -> Result<()> {
    for i in range {
        if let Some(w) = w {
            if !w.get_at(i) {
                continue;
            }
        }
        match a.get_object_at(i) {
            Some(x) => wtr.set(i, T::apply_unary(op, x)?),
            None => wtr.set(i, T::MISSING),
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Comparison
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn compare<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    dst: &mut dyn CubeMut<bool>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let total = a.size();
    let chunk = chunk_len()?;
    let plan = pool::plan(total)?;
    let writer = dst.writer();
    let wtr: &dyn ParWriter<bool> = &*writer;
    match plan {
        Some(buckets) => pool::run(buckets, |_, r| compare_range(op, a, b, wtr, w, r, chunk)),
        None => compare_range(op, a, b, wtr, w, 0..total, chunk),
    }
}

fn compare_range<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    wtr: &dyn ParWriter<bool>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Result<()> {
    match compare_fast(op, a, b, wtr, w, range.clone(), chunk) {
        Ok(()) => Ok(()),
        Err(FastErr::Real(e)) => Err(e),
        Err(FastErr::Bulk) => {
            tracing::debug!(op = op.name(), "bulk staging unavailable, scalar fallback");
            compare_scalar(op, a, b, wtr, w, range)
        }
    }
}

fn compare_fast<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    wtr: &dyn ParWriter<bool>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Fast<()> {
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut ab = [T::ZERO; STAGING_SIZE];
    let mut ar = [false; STAGING_SIZE];
    let mut aw = [false; STAGING_SIZE];
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        a.to_flat(base, &mut aa, 0, len)?;
        b.to_flat(base, &mut ab, 0, len)?;
        if let Some(w) = w {
            w.to_flat(base, &mut aw, 0, len)?;
        }
        T::vec_compare(op, &aa[..len], &ab[..len], &mut ar[..len]);
        if w.is_none() {
            wtr.write_flat(&ar[..len], base);
        } else {
            for j in 0..len {
                if aw[j] {
                    wtr.set(base + j, ar[j]);
                }
            }
        }
        base += len;
    }
    Ok(())
}

fn compare_scalar<T: Element>(
    op: ComparisonOp,
    a: &dyn Cube<T>,
    b: &dyn Cube<T>,
    wtr: &dyn ParWriter<bool>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
) -> Result<()> {
    for i in range {
        if let Some(w) = w {
            if !w.get_at(i) {
                continue;
            }
        }
        // Missing operands compare false, except Ne which is true.
        let r = match (a.get_object_at(i), b.get_object_at(i)) {
            (Some(x), Some(y)) => T::compare(op, x, y),
            _ => matches!(op, ComparisonOp::Ne),
        };
        wtr.set(i, r);
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Predicates
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn predicate<T: Element>(
    op: PredicateOp,
    a: &dyn Cube<T>,
    dst: &mut dyn CubeMut<bool>,
    w: Option<&dyn Cube<bool>>,
) -> Result<()> {
    let total = a.size();
    let chunk = chunk_len()?;
    let plan = pool::plan(total)?;
    let writer = dst.writer();
    let wtr: &dyn ParWriter<bool> = &*writer;
    match plan {
        Some(buckets) => pool::run(buckets, |_, r| predicate_range(op, a, wtr, w, r, chunk)),
        None => predicate_range(op, a, wtr, w, 0..total, chunk),
    }
}

fn predicate_range<T: Element>(
    op: PredicateOp,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<bool>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Result<()> {
    match predicate_fast(op, a, wtr, w, range.clone(), chunk) {
        Ok(()) => Ok(()),
        Err(FastErr::Real(e)) => Err(e),
        Err(FastErr::Bulk) => predicate_scalar(op, a, wtr, w, range),
    }
}

fn predicate_fast<T: Element>(
    op: PredicateOp,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<bool>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Fast<()> {
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut ar = [false; STAGING_SIZE];
    let mut aw = [false; STAGING_SIZE];
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        a.to_flat(base, &mut aa, 0, len)?;
        if let Some(w) = w {
            w.to_flat(base, &mut aw, 0, len)?;
        }
        if !T::vec_predicate(op, &aa[..len], &mut ar[..len]) {
            for j in 0..len {
                ar[j] = T::apply_predicate(op, aa[j]).map_err(FastErr::Real)?;
            }
        }
        if w.is_none() {
            wtr.write_flat(&ar[..len], base);
        } else {
            for j in 0..len {
                if aw[j] {
                    wtr.set(base + j, ar[j]);
                }
            }
        }
        base += len;
    }
    Ok(())
}

fn predicate_scalar<T: Element>(
    op: PredicateOp,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<bool>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
) -> Result<()> {
    for i in range {
        if let Some(w) = w {
            if !w.get_at(i) {
                continue;
            }
        }
        wtr.set(i, T::apply_predicate(op, a.get_at(i))?);
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Associative reduction
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn reduce<T: Element>(
    op: AssociativeOp,
    a: &dyn Cube<T>,
    init: Option<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<T> {
    let total = a.size();
    let chunk = chunk_len()?;
    let seed = match init {
        Some(v) => v,
        None => T::reduce_init(op)?,
    };
    match pool::plan(total)? {
        Some(buckets) => {
            let partials = pool::run_map(buckets, |r| reduce_range(op, a, w, r, chunk))?;
            Ok(partials
                .into_iter()
                .fold(seed, |acc, p| T::combine(op, acc, p)))
        }
        None => {
            let partial = reduce_range(op, a, w, 0..total, chunk)?;
            Ok(T::combine(op, seed, partial))
        }
    }
}

/// NaN poisons Add/Min/Max, so those stop early once the accumulator goes
/// missing; NanAdd keeps going by definition.
fn poisoned<T: Element>(op: AssociativeOp, acc: T) -> bool {
    !matches!(op, AssociativeOp::NanAdd) && acc.is_missing()
}

fn reduce_range<T: Element>(
    op: AssociativeOp,
    a: &dyn Cube<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Result<T> {
    // A where-mask forces the scalar path.
    if w.is_none() {
        match reduce_fast(op, a, range.clone(), chunk) {
            Ok(v) => return Ok(v),
            Err(FastErr::Real(e)) => return Err(e),
            Err(FastErr::Bulk) => {
                tracing::debug!(op = op.name(), "bulk staging unavailable, scalar fallback");
            }
        }
    }
    let mut acc = T::reduce_init(op)?;
    for i in range {
        if let Some(w) = w {
            if !w.get_at(i) {
                continue;
            }
        }
        acc = T::reduce_scalar(op, acc, a.get_at(i));
        if poisoned(op, acc) {
            break;
        }
    }
    Ok(acc)
}

fn reduce_fast<T: Element>(
    op: AssociativeOp,
    a: &dyn Cube<T>,
    range: Range<usize>,
    chunk: usize,
) -> Fast<T> {
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut acc = T::reduce_init(op).map_err(FastErr::Real)?;
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        a.to_flat(base, &mut aa, 0, len)?;
        acc = T::vec_reduce(op, acc, &aa[..len]);
        if poisoned(op, acc) {
            break;
        }
        base += len;
    }
    Ok(acc)
}

////////////////////////////////////////////////////////////////////////////////
// Reductive logic
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn logic<T: Element>(
    op: ReductiveLogicOp,
    a: &dyn Cube<T>,
    w: Option<&dyn Cube<bool>>,
) -> Result<bool> {
    let total = a.size();
    let chunk = chunk_len()?;
    match pool::plan(total)? {
        Some(buckets) => {
            let partials = pool::run_map(buckets, |r| logic_range(op, a, w, r, chunk))?;
            Ok(partials.into_iter().fold(
                matches!(op, ReductiveLogicOp::All),
                |acc, p| match op {
                    ReductiveLogicOp::Any => acc | p,
                    ReductiveLogicOp::All => acc & p,
                },
            ))
        }
        None => logic_range(op, a, w, 0..total, chunk),
    }
}

fn logic_range<T: Element>(
    op: ReductiveLogicOp,
    a: &dyn Cube<T>,
    w: Option<&dyn Cube<bool>>,
    range: Range<usize>,
    chunk: usize,
) -> Result<bool> {
    // The mask is only honored on the scalar path.
    if w.is_none() {
        match logic_fast(op, a, range.clone(), chunk) {
            Ok(v) => return Ok(v),
            Err(FastErr::Real(e)) => return Err(e),
            Err(FastErr::Bulk) => {}
        }
    }
    let mut acc = matches!(op, ReductiveLogicOp::All);
    for i in range {
        if let Some(w) = w {
            if !w.get_at(i) {
                continue;
            }
        }
        let t = a.get_at(i).truthy();
        match op {
            ReductiveLogicOp::Any => {
                acc |= t;
                if acc {
                    break;
                }
            }
            ReductiveLogicOp::All => {
                acc &= t;
                if !acc {
                    break;
                }
            }
        }
    }
    Ok(acc)
}

fn logic_fast<T: Element>(
    op: ReductiveLogicOp,
    a: &dyn Cube<T>,
    range: Range<usize>,
    chunk: usize,
) -> Fast<bool> {
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut acc = matches!(op, ReductiveLogicOp::All);
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        a.to_flat(base, &mut aa, 0, len)?;
        match op {
            ReductiveLogicOp::Any => {
                acc |= aa[..len].iter().any(|v| v.truthy());
                if acc {
                    break;
                }
            }
            ReductiveLogicOp::All => {
                acc &= aa[..len].iter().all(|v| v.truthy());
                if !acc {
                    break;
                }
            }
        }
        base += len;
    }
    Ok(acc)
}

////////////////////////////////////////////////////////////////////////////////
// Popcount and extract
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn popcount(c: &dyn Cube<bool>) -> Result<usize> {
    let total = c.size();
    let chunk = chunk_len()?;
    match pool::plan(total)? {
        Some(buckets) => {
            let partials = pool::run_map(buckets, |r| popcount_range(c, r, chunk))?;
            Ok(partials.into_iter().sum())
        }
        None => popcount_range(c, 0..total, chunk),
    }
}

fn popcount_range(c: &dyn Cube<bool>, range: Range<usize>, chunk: usize) -> Result<usize> {
    let mut ac = [false; STAGING_SIZE];
    let mut count = 0usize;
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        if c.to_flat(base, &mut ac, 0, len).is_err() {
            // Scalar restart of the whole range.
            return Ok(range.clone().filter(|&i| c.get_at(i)).count());
        }
        count += ac[..len].iter().filter(|&&b| b).count();
        base += len;
    }
    Ok(count)
}

/// Boolean-mask gather. The destination is written in the flattened order
/// of `a`; when bucketed, each bucket's write offset is the popcount of
/// `c` over all earlier buckets, computed sequentially before submission
/// so concurrent writers never overlap. That offset rule is load-bearing:
/// it is the only thing keeping bucket output regions disjoint.
pub(crate) fn extract_into<T: Element>(
    c: &dyn Cube<bool>,
    a: &dyn Cube<T>,
    dst: &mut dyn CubeMut<T>,
) -> Result<()> {
    let total = a.size();
    let chunk = chunk_len()?;
    let plan = pool::plan(total)?;
    let writer = dst.writer();
    let wtr: &dyn ParWriter<T> = &*writer;
    match plan {
        Some(buckets) => {
            let mut offsets = Vec::with_capacity(buckets.len());
            let mut acc = 0usize;
            for bucket in &buckets {
                offsets.push(acc);
                acc += popcount_range(c, bucket.clone(), chunk)?;
            }
            pool::run(buckets, |idx, r| {
                extract_range(c, a, wtr, r, offsets[idx], chunk)
            })
        }
        None => extract_range(c, a, wtr, 0..total, 0, chunk),
    }
}

fn extract_range<T: Element>(
    c: &dyn Cube<bool>,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    range: Range<usize>,
    write_off: usize,
    chunk: usize,
) -> Result<()> {
    match extract_fast(c, a, wtr, range.clone(), write_off, chunk) {
        Ok(()) => Ok(()),
        Err(FastErr::Real(e)) => Err(e),
        Err(FastErr::Bulk) => {
            // Restart the whole range; rewrites are idempotent.
            let mut woff = write_off;
            for i in range {
                if c.get_at(i) {
                    wtr.set(woff, a.get_at(i));
                    woff += 1;
                }
            }
            Ok(())
        }
    }
}

fn extract_fast<T: Element>(
    c: &dyn Cube<bool>,
    a: &dyn Cube<T>,
    wtr: &dyn ParWriter<T>,
    range: Range<usize>,
    write_off: usize,
    chunk: usize,
) -> Fast<()> {
    let mut ac = [false; STAGING_SIZE];
    let mut aa = [T::ZERO; STAGING_SIZE];
    let mut ar = [T::ZERO; STAGING_SIZE];
    let mut woff = write_off;
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        c.to_flat(base, &mut ac, 0, len)?;
        a.to_flat(base, &mut aa, 0, len)?;
        let mut k = 0usize;
        for j in 0..len {
            if ac[j] {
                ar[k] = aa[j];
                k += 1;
            }
        }
        wtr.write_flat(&ar[..k], woff);
        woff += k;
        base += len;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Cast / copy
////////////////////////////////////////////////////////////////////////////////

pub(crate) fn cast<S, D>(src: &dyn Cube<S>, dst: &mut dyn CubeMut<D>) -> Result<()>
where
    S: Element + CastTo<D>,
    D: Element,
{
    let total = src.size();
    let chunk = chunk_len()?;
    let plan = pool::plan(total)?;
    let writer = dst.writer();
    let wtr: &dyn ParWriter<D> = &*writer;
    match plan {
        Some(buckets) => pool::run(buckets, |_, r| cast_range(src, wtr, r, chunk)),
        None => cast_range(src, wtr, 0..total, chunk),
    }
}

fn cast_range<S, D>(
    src: &dyn Cube<S>,
    wtr: &dyn ParWriter<D>,
    range: Range<usize>,
    chunk: usize,
) -> Result<()>
where
    S: Element + CastTo<D>,
    D: Element,
{
    let mut aa = [S::ZERO; STAGING_SIZE];
    let mut ar = [D::ZERO; STAGING_SIZE];
    let mut base = range.start;
    while base < range.end {
        let len = chunk.min(range.end - base);
        if src.to_flat(base, &mut aa, 0, len).is_err() {
            // Scalar restart of the whole range.
            for i in range.clone() {
                wtr.set(i, src.get_at(i).cast());
            }
            return Ok(());
        }
        for j in 0..len {
            ar[j] = aa[j].cast();
        }
        wtr.write_flat(&ar[..len], base);
        base += len;
    }
    Ok(())
}
