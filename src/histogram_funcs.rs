// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Locating the step between two brightness plateaus.
//!
//! The brightness values of a disk's pixels, sorted ascending, form two
//! plateaus: healthy tissue is dark and necrotic tissue is light. The
//! transition between them shows up as a spike in the smoothed first
//! derivative. The spike's apex is where the second derivative crosses zero
//! going down, i.e. the minimum of the third derivative.
//!
//! This only works when there is exactly one dominant step. A disk with no
//! necrosis (one plateau) or with several distinct tissue shades still
//! produces a global minimum somewhere, and thus a misleading transition.

use crate::config::TransitionSmoothing;
use crate::regression::index_slope;

/// Window length for smoothing a series of `data_len` values. At least 2,
/// the minimum for fitting a slope.
pub fn chunk_length(data_len: usize, smoothing_factor: f64) -> usize {
    std::cmp::max((data_len as f64 * smoothing_factor).round() as usize, 2)
}

/// Slope of the least-squares line over each window of `data`. Windows are
/// `chunk_length()` long and start every `step` positions (fractional steps
/// are truncated to the containing index), up to `(1 - smoothing_factor)` of
/// the way through `data`. Windows shortened by the end of `data` to fewer
/// than two values are skipped.
pub fn smoothed_derivative(data: &[f64], smoothing_factor: f64, step: f64)
                           -> Vec<f64> {
    debug_assert!(step > 0.0);
    let chunk_size = chunk_length(data.len(), smoothing_factor);
    let end = data.len() as f64 * (1.0 - smoothing_factor);
    let mut slopes = Vec::<f64>::new();
    let mut position = 0.0;
    while position <= end {
        let start = position as usize;
        let stop = std::cmp::min(start + chunk_size, data.len());
        if stop < start + 2 {
            break;
        }
        slopes.push(index_slope(&data[start..stop]));
        position += step;
    }
    slopes
}

/// Maps index `i` of a smoothed derivative back to the position in the
/// original series at the center of the corresponding window.
pub fn scale_array_index(i: f64, original_len: usize, smoothing_factor: f64,
                         step: f64) -> f64 {
    let chunk_size = chunk_length(original_len, smoothing_factor);
    i * step + (chunk_size as f64 - 1.0) / 2.0
}

// Returns the position within `data` of its central spike (not necessarily
// the maximum value). None if `data` is too short to differentiate twice.
fn find_peak(data: &[f64], smoothing: &TransitionSmoothing) -> Option<f64> {
    // Second derivative of the original series: positive rising into the
    // spike, negative after it.
    let slopes = smoothed_derivative(data, smoothing.peak, 1.0);
    // Where that falls through zero is the steepest descent, a minimum here.
    let slope_derivative = smoothed_derivative(&slopes, smoothing.trough, 1.0);
    if slope_derivative.is_empty() {
        return None;
    }
    let mut min_index = 0;
    for (i, value) in slope_derivative.iter().enumerate() {
        if *value < slope_derivative[min_index] {
            min_index = i;
        }
    }
    let x_intercept_index = scale_array_index(min_index as f64, slopes.len(),
                                              smoothing.trough, 1.0);
    Some(scale_array_index(x_intercept_index, data.len(), smoothing.peak, 1.0))
}

/// Given brightness values sorted ascending, returns the index of the first
/// value at or past the transition between the dark and light plateaus.
/// Values from that index on are the light plateau. Returns None if `sorted`
/// is too short to locate a transition.
pub fn find_transition_index(sorted: &[f64], smoothing: &TransitionSmoothing)
                             -> Option<usize> {
    if sorted.len() < 4 {
        return None;
    }
    // Sample the first derivative at about `target_samples` points so the
    // cost does not grow with disk size.
    let step = sorted.len() as f64 / smoothing.target_samples as f64;
    let slopes = smoothed_derivative(sorted, smoothing.slope, step);
    let peak = find_peak(&slopes, smoothing)?;
    let index = scale_array_index(peak, sorted.len(), smoothing.slope, step).round();
    Some(index.clamp(0.0, sorted.len() as f64) as usize)
}

// mod tests.
