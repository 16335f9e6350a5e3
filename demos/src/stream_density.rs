// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Streams a sample file through a wavelet density estimator.
//!
//! ```text
//! stream_density --config density.toml -v
//! stream_density --wavelet-dir wavedens/tests/data/wavelets --samples samples.txt
//! ```
//!
//! The settings file may contain:
//!
//! ```toml
//! wavelet_dir = "data/wavelets"
//! sample_file = "samples.txt"
//!
//! [estimator]
//! wavelet = "db6"
//! start_level = 1
//! stop_level = 2
//!
//! [estimator.aging]
//! kind = "windowed"
//! size = 1400
//!
//! [runner]
//! update_frequency = 100
//! ```
//!
//! The final density curve is printed to stdout as `x,y` lines.

use std::fs;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wavedens::estimator::EstimatorConfig;
use wavedens::estimator::SharedEstimator;
use wavedens::estimator::WaveletDensityEstimator;
use wavedens::runner::DensityRunner;
use wavedens::runner::RunnerSettings;
use wavedens::sample::LineSampleSource;

/// Streaming wavelet density estimation over a sample file.
#[derive(Parser)]
#[command(name = "stream_density")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding `<wavelet>_{domain,phi,psi}.csv`; overrides the settings file.
    #[arg(short, long)]
    wavelet_dir: Option<PathBuf>,

    /// File with one sample per line; overrides the settings file.
    #[arg(short, long)]
    samples: Option<PathBuf>,

    /// Wavelet identifier, e.g. `db6`; overrides the settings file.
    #[arg(long)]
    wavelet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    wavelet_dir: Option<PathBuf>,
    sample_file: Option<PathBuf>,
    #[serde(default)]
    estimator: EstimatorConfig,
    #[serde(default)]
    runner: RunnerSettings,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let default_filter = format!("wavedens={level},stream_density={level}");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings {}", path.display()))?;
            toml::from_str::<Settings>(&text)
                .with_context(|| format!("failed to parse settings {}", path.display()))?
        }
        None => Settings::default(),
    };
    if let Some(dir) = &cli.wavelet_dir {
        settings.wavelet_dir = Some(dir.clone());
    }
    if let Some(file) = &cli.samples {
        settings.sample_file = Some(file.clone());
    }
    if let Some(wavelet) = &cli.wavelet {
        settings.estimator = settings.estimator.to_builder().wavelet(wavelet.clone()).build();
    }
    Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let wavelet_dir = settings
        .wavelet_dir
        .context("no wavelet folder given; pass --wavelet-dir or set wavelet_dir")?;
    let sample_file = settings
        .sample_file
        .context("no sample file given; pass --samples or set sample_file")?;

    let estimator = WaveletDensityEstimator::from_dir(wavelet_dir);
    let shared = SharedEstimator::new(estimator);
    shared
        .reset(settings.estimator)
        .context("failed to configure the estimator")?;

    let source = LineSampleSource::open(&sample_file)?;
    let handle = DensityRunner::spawn(shared.clone(), source, settings.runner, |n, curve| {
        if curve.is_converged() {
            info!(samples = n, iterations = curve.iterations(), "snapshot");
        } else {
            warn!(samples = n, residual = curve.residual(), "snapshot not normalized");
        }
    })?;
    let summary = handle.join()?;
    info!(samples = summary.samples, "stream finished");

    let curve = shared.snapshot();
    let mut out = BufWriter::new(io::stdout().lock());
    for (x, y) in &curve {
        writeln!(out, "{x},{y}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
