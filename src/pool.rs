// Licensed under the MIT and Apache-2.0 licenses.

use std::ops::Range;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::config;
use crate::error::{CubeError, Result};

// Process-wide pool, built lazily from the configured thread count and
// never constructed when parallelism is disabled. Teardown is rayon's
// process-exit teardown.
static POOL: Lazy<Option<rayon::ThreadPool>> = Lazy::new(|| {
    let settings = config::settings().ok()?;
    if settings.num_threads <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(settings.num_threads)
        .thread_name(|i| format!("ndcube-worker-{i}"))
        .build()
    {
        Ok(pool) => {
            tracing::debug!(num_threads = settings.num_threads, "worker pool started");
            Some(pool)
        }
        Err(e) => {
            tracing::error!(error = %e, "worker pool construction failed");
            None
        }
    }
});

/// Splits `total` elements into at most `pieces` contiguous buckets.
/// Bucket length is rounded up to a 32-element boundary for cache-line
/// and bitset-word alignment; the last bucket may be shorter.
pub(crate) fn split(total: usize, pieces: usize) -> Vec<Range<usize>> {
    let per = total.div_ceil(pieces.max(1)).div_ceil(32).max(1) * 32;
    let mut buckets = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + per).min(total);
        buckets.push(start..end);
        start = end;
    }
    buckets
}

/// Bucket plan for an operation of `total` elements: `None` means run
/// inline (pool disabled, or below the threading threshold).
pub(crate) fn plan(total: usize) -> Result<Option<Vec<Range<usize>>>> {
    let settings = config::settings()?;
    if total > 0 && total >= settings.threading_threshold && POOL.is_some() {
        Ok(Some(split(total, settings.num_threads)))
    } else {
        Ok(None)
    }
}

/// Runs one closure per bucket on the pool and blocks until all complete.
/// The first error any bucket produces is captured and re-raised after
/// the join; the remaining buckets still run to completion.
pub(crate) fn run<F>(buckets: Vec<Range<usize>>, f: F) -> Result<()>
where
    F: Fn(usize, Range<usize>) -> Result<()> + Sync,
{
    let pool = POOL.as_ref().expect("pool exists when a plan was produced");
    let first_err: Mutex<Option<CubeError>> = Mutex::new(None);
    pool.scope(|scope| {
        for (idx, bucket) in buckets.into_iter().enumerate() {
            let f = &f;
            let first_err = &first_err;
            scope.spawn(move |_| {
                if let Err(e) = f(idx, bucket) {
                    let mut slot = first_err.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            });
        }
    });
    match first_err.into_inner().unwrap() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// As [`run`], but collects each bucket's value, in bucket order.
pub(crate) fn run_map<R, F>(buckets: Vec<Range<usize>>, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(Range<usize>) -> Result<R> + Sync,
{
    let pool = POOL.as_ref().expect("pool exists when a plan was produced");
    let first_err: Mutex<Option<CubeError>> = Mutex::new(None);
    let slots: Vec<Mutex<Option<R>>> = buckets.iter().map(|_| Mutex::new(None)).collect();
    pool.scope(|scope| {
        for (idx, bucket) in buckets.into_iter().enumerate() {
            let f = &f;
            let first_err = &first_err;
            let slots = &slots;
            scope.spawn(move |_| match f(bucket) {
                Ok(v) => *slots[idx].lock().unwrap() = Some(v),
                Err(e) => {
                    let mut slot = first_err.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            });
        }
    });
    if let Some(e) = first_err.into_inner().unwrap() {
        return Err(e);
    }
    Ok(slots
        .into_iter()
        .map(|m| m.into_inner().unwrap().expect("bucket completed"))
        .collect())
}
