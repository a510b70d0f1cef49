use std::ops::Range;

/// Allocates `len` values with the first `warm` painted `NaN` and the rest zeroed.
#[inline]
pub fn alloc_with_nan_prefix(len: usize, warm: usize) -> Vec<f64> {
    let warm = warm.min(len);
    let mut v = Vec::with_capacity(len);
    v.resize(warm, f64::NAN);
    v.resize(len, 0.0);
    v
}

#[inline]
pub fn first_valid_index(data: &[f64]) -> Option<usize> {
    data.iter().position(|x| !x.is_nan())
}

/// Maximal runs of consecutive non-`NaN` values, in order.
pub fn valid_runs(data: &[f64]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, x) in data.iter().enumerate() {
        match (x.is_nan(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..data.len());
    }
    runs
}

#[inline]
pub fn longest_valid_run(data: &[f64]) -> usize {
    valid_runs(data).iter().map(|r| r.len()).max().unwrap_or(0)
}

/// Runs `kernel` on every gap-free segment holding at least `needed` values,
/// handing it the matching window of `out`. Everything else in `out` is left
/// as the caller allocated it.
pub fn for_each_valid_run<F>(data: &[f64], needed: usize, out: &mut [f64], mut kernel: F)
where
    F: FnMut(&[f64], &mut [f64]),
{
    for run in valid_runs(data) {
        if run.len() >= needed {
            kernel(&data[run.clone()], &mut out[run]);
        }
    }
}

/// Expands an inclusive `(start, end, step)` axis. `step == 0` or `start == end`
/// yields the single value `start`.
#[inline]
pub fn expand_axis((start, end, step): (usize, usize, usize)) -> Vec<usize> {
    if step == 0 || start == end {
        return vec![start];
    }
    if start > end {
        return Vec::new();
    }
    (start..=end).step_by(step).collect()
}
