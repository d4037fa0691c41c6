// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Dose-response analysis: per-row necrotic rates regressed against the log
//! of each row's oxalic acid concentration.
//!
//! Three rate measures are reported, each fitted on its own:
//!
//! * [Measure::PixelArea]: necrotic portion of the disk's pixels times the
//!   physical disk area.
//! * [Measure::RingWidth]: width of the necrotic ring, from the disk edge in
//!   to the refined necrotic inner circle.
//! * [Measure::CircleArea]: disk area minus the area of the refined inner
//!   circle.
//!
//! All measures are per hour of soaking. The two circle measures need
//! `necrotic_inner_radius`; disks without it do not contribute to them.
//!
//! [compute_susceptibility()] only reads the rows, so it can be re-run
//! whenever the user edits a concentration.

use std::time::Instant;

use log::{debug, info};

use crate::config::AssayParameters;
use crate::disk_funcs::Disk;
use crate::error::AssayError;
use crate::regression::{linear_regression, LinearRegression, RegressionError};
use crate::row_funcs::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    PixelArea,
    RingWidth,
    CircleArea,
}

impl Measure {
    pub const ALL: [Measure; 3] =
        [Measure::PixelArea, Measure::RingWidth, Measure::CircleArea];

    pub fn name(&self) -> &'static str {
        match self {
            Measure::PixelArea => "necrotic area (pixel count)",
            Measure::RingWidth => "necrotic ring width (circle)",
            Measure::CircleArea => "necrotic area (circle)",
        }
    }

    fn index(&self) -> usize {
        match self {
            Measure::PixelArea => 0,
            Measure::RingWidth => 1,
            Measure::CircleArea => 2,
        }
    }
}

/// Necrotic rates of one disk, in physical units per hour. Indexed by
/// [Measure]; None where the measure is not available for the disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskRates {
    pub rates: [Option<f64>; 3],
}

impl DiskRates {
    pub fn get(&self, measure: Measure) -> Option<f64> {
        self.rates[measure.index()]
    }
}

/// Computes the necrotic rates of `disk`.
pub fn disk_rates(disk: &Disk, params: &AssayParameters) -> DiskRates {
    let disk_area = params.disk_area();
    let hours = params.hours_soaked;
    let pixel_area = disk.necrotic_portion * disk_area / hours;

    let pixel_diameter = disk.pixel_diameter();
    let inner_radius = match disk.necrotic_inner_radius {
        Some(r) if pixel_diameter > 0.0 =>
            Some(r as f64 * params.disk_diameter / pixel_diameter),
        _ => None,
    };
    let ring_width = inner_radius.map(
        |inner| (params.disk_diameter / 2.0 - inner) / hours);
    let circle_area = inner_radius.map(
        |inner| (disk_area - std::f64::consts::PI * inner * inner) / hours);
    DiskRates{rates: [Some(pixel_area), ring_width, circle_area]}
}

/// Per-row summary.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRates {
    pub concentration: f64,
    pub disk_count: usize,

    /// Mean over the row's disks of each measure. None for an empty row, or
    /// when no disk of the row has the measure.
    pub mean_rates: [Option<f64>; 3],
}

impl RowRates {
    pub fn mean(&self, measure: Measure) -> Option<f64> {
        self.mean_rates[measure.index()]
    }
}

/// One measure's dose-response data and fitted line.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    pub measure: Measure,

    /// (log10(concentration), mean rate) per contributing row, top to
    /// bottom.
    pub points: Vec<(f64, f64)>,

    pub regression: Result<LinearRegression, RegressionError>,
}

impl RateSeries {
    /// The fitted line, with a fitting failure as an [AssayError].
    pub fn fit(&self) -> Result<LinearRegression, AssayError> {
        Ok(self.regression?)
    }

    /// (min, max) of the x values; None if there are no points.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        extent(self.points.iter().map(|p| p.0))
    }

    /// (min, max) of the y values; None if there are no points.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        extent(self.points.iter().map(|p| p.1))
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SusceptibilityReport {
    /// Parallel to the input rows.
    pub rows: Vec<RowRates>,

    /// One per [Measure], in [Measure::ALL] order.
    pub series: Vec<RateSeries>,
}

impl SusceptibilityReport {
    pub fn series(&self, measure: Measure) -> &RateSeries {
        &self.series[measure.index()]
    }
}

fn validate(rows: &[Row], params: &AssayParameters, concentrations: &[f64])
            -> Result<(), AssayError> {
    if !(params.disk_diameter.is_finite() && params.disk_diameter > 0.0) {
        return Err(AssayError::InvalidParameter(
            format!("disk diameter must be positive, got {}", params.disk_diameter)));
    }
    if !(params.hours_soaked.is_finite() && params.hours_soaked > 0.0) {
        return Err(AssayError::InvalidParameter(
            format!("hours soaked must be positive, got {}", params.hours_soaked)));
    }
    if concentrations.len() != rows.len() {
        return Err(AssayError::InvalidParameter(
            format!("{} concentrations given for {} rows",
                    concentrations.len(), rows.len())));
    }
    if let Some(bad) = concentrations.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
        return Err(AssayError::InvalidParameter(
            format!("concentration must be positive, got {}", bad)));
    }
    Ok(())
}

/// Averages each row's disk rates and fits one line per [Measure] against
/// log10 of the row concentrations. `concentrations` is parallel to `rows`.
///
/// Parameter problems are returned as [AssayError::InvalidParameter]. A
/// measure whose line cannot be fitted (e.g. fewer than two usable rows, or
/// equal concentrations) carries its [RegressionError] in its series rather
/// than failing the whole report.
pub fn compute_susceptibility(rows: &[Row], params: &AssayParameters,
                              concentrations: &[f64])
                              -> Result<SusceptibilityReport, AssayError> {
    let analysis_start = Instant::now();
    validate(rows, params, concentrations)?;

    let mut row_rates = Vec::<RowRates>::with_capacity(rows.len());
    for (row, &concentration) in rows.iter().zip(concentrations) {
        let mut sums = [0.0; 3];
        let mut counts = [0_usize; 3];
        for disk in &row.disks {
            let rates = disk_rates(disk, params);
            for (i, rate) in rates.rates.iter().enumerate() {
                if let Some(rate) = rate {
                    sums[i] += rate;
                    counts[i] += 1;
                }
            }
        }
        let mut mean_rates = [None; 3];
        for i in 0..3 {
            if counts[i] > 0 {
                mean_rates[i] = Some(sums[i] / counts[i] as f64);
            }
        }
        debug!("Row at {:?}, concentration {}: {} disks, mean rates {:?}",
               row.top(), concentration, row.len(), mean_rates);
        row_rates.push(RowRates{concentration, disk_count: row.len(), mean_rates});
    }

    let series: Vec<RateSeries> = Measure::ALL.iter().map(|&measure| {
        let points: Vec<(f64, f64)> = row_rates.iter()
            .filter_map(|r| r.mean(measure).map(|y| (r.concentration.log10(), y)))
            .collect();
        let regression = linear_regression(&points);
        RateSeries{measure, points, regression}
    }).collect();

    info!("Computed susceptibility over {} rows in {:?}",
          rows.len(), analysis_start.elapsed());
    Ok(SusceptibilityReport{rows: row_rates, series})
}

// mod tests.
