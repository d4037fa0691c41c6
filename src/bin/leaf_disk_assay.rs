// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use env_logger;
use image::ImageReader;
use log::{info, warn};

use leaf_disk_assay::algorithm::analyze_leaf_disks;
use leaf_disk_assay::analyzer::Measure;
use leaf_disk_assay::config::{AssayConfig, AssayParameters, NecrosisMethod,
                              RowGrouping, TransitionSmoothing, VeinSuppression};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// Red exceeds green, with vein suppression.
    Channel,
    /// Brightness plateau transition.
    Brightness,
}

/// Measures leaf disk necrosis in photograph(s) of an oxalic acid assay and
/// writes a labeled image for each.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Path of the file or directory to process.
    #[arg(short, long)]
    input: String,

    /// Directory where labeled image(s) are written.
    #[arg(short, long)]
    output: String,

    /// Disk diameter, e.g. in mm.
    #[arg(short, long, default_value_t = 15.875)]
    diameter: f64,

    /// Hours the disks soaked in oxalic acid.
    #[arg(long, default_value_t = 24.0)]
    hours: f64,

    /// Oxalic acid concentration of each row, top to bottom.
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![8.0, 12.0, 14.0, 16.0])]
    concentrations: Vec<f64>,

    /// Pixels with all channels below this are dark.
    #[arg(long, default_value_t = leaf_disk_assay::config::DEFAULT_DARK_THRESHOLD)]
    dark_threshold: u8,

    /// Rule used to label necrotic pixels.
    #[arg(short, long, value_enum, default_value_t = Method::Channel)]
    method: Method,

    /// Group rows by chains of vertical overlap rather than overlap with
    /// each row's first disk.
    #[arg(short, long, default_value_t = false)]
    transitive_rows: std::primitive::bool,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let input_metadata = fs::metadata(&args.input).unwrap_or_else(|e| {
        panic!("Input file/dir '{}' does not exist? {:?}", args.input, e);
    });
    let output_metadata = fs::metadata(&args.output).unwrap_or_else(|e| {
        panic!("Output dir '{}' does not exist? {:?}", args.output, e);
    });
    assert!(output_metadata.is_dir(),
            "Output '{}' must be a directory", args.output);
    if input_metadata.is_dir() {
        for entry in fs::read_dir(&args.input).unwrap() {
            let path = entry.unwrap().path();
            if path.is_file() {
                process_file(path.to_str().unwrap(), &args);
            }
        }
    } else {
        assert!(input_metadata.is_file());
        process_file(args.input.as_str(), &args);
    }
}

fn assay_config(args: &Args) -> AssayConfig {
    let necrosis_method = match args.method {
        Method::Channel => NecrosisMethod::ChannelThreshold(VeinSuppression::default()),
        Method::Brightness =>
            NecrosisMethod::BrightnessTransition(TransitionSmoothing::default()),
    };
    let row_grouping = if args.transitive_rows {
        RowGrouping::Transitive
    } else {
        RowGrouping::FirstMember
    };
    AssayConfig{dark_threshold: args.dark_threshold, row_grouping, necrosis_method,
                ..AssayConfig::default()}
}

fn process_file(file: &str, args: &Args) {
    info!("Processing {}", file);
    let input_path = PathBuf::from(&file);
    let mut output_path = PathBuf::from(&args.output);
    output_path.push(input_path.file_name().unwrap());
    output_path.set_extension("png");

    let img = match ImageReader::open(&input_path).unwrap().decode() {
        Ok(img) => img,
        Err(e) => {
            warn!("Skipping {:?} due to: {:?}", input_path, e);
            return;
        },
    };
    let img_rgb = img.into_rgb8();
    let (width, height) = img_rgb.dimensions();

    let analysis_start = Instant::now();
    let analysis = analyze_leaf_disks(&img_rgb, &assay_config(args)).unwrap();
    let elapsed = analysis_start.elapsed();
    info!("WxH: {}x{}; {} disks in {} rows found in {:?}",
          width, height, analysis.disk_count(), analysis.rows.len(), elapsed);
    if let Err(e) = analysis.check_segmentation() {
        warn!("{}", e);
    }
    for (row_index, row) in analysis.rows.iter().enumerate() {
        for (disk_index, disk) in row.disks.iter().enumerate() {
            info!("Row {} disk {}: necrotic portion {:.3}, inner radius {:?} of {:.1}",
                  row_index, disk_index, disk.necrotic_portion,
                  disk.necrotic_inner_radius, disk.estimated_radius());
        }
    }

    // Use as many concentrations as there are rows.
    let concentrations: Vec<f64> =
        args.concentrations.iter().copied().take(analysis.rows.len()).collect();
    let params = AssayParameters{disk_diameter: args.diameter, hours_soaked: args.hours};
    match analysis.susceptibility(&params, &concentrations) {
        Ok(report) => {
            for measure in Measure::ALL {
                match report.series(measure).fit() {
                    Ok(fit) => info!("{}: slope {:.4} intercept {:.4} R^2 {:.4}",
                                     measure.name(), fit.slope, fit.y_intercept,
                                     fit.r_squared),
                    Err(e) => warn!("{}: {}", measure.name(), e),
                }
            }
        },
        Err(e) => warn!("Susceptibility not computed: {}", e),
    }

    analysis.render().save(output_path).unwrap();
}
