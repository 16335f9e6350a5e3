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

#![allow(dead_code)]

use std::path::PathBuf;

use wavedens::estimator::AgingPolicy;
use wavedens::estimator::EstimatorConfig;
use wavedens::estimator::WaveletDensityEstimator;
use wavedens::wavelet::DirectoryLoader;

/// Directory holding the tabulated `db2` fixture.
pub fn wavelet_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("wavelets")
}

pub fn db2_loader() -> DirectoryLoader {
    DirectoryLoader::new(wavelet_data_dir())
}

/// A `db2` configuration on `[-4, 4]` at the scaling level only.
pub fn db2_config(level: i32, aging: AgingPolicy) -> EstimatorConfig {
    EstimatorConfig::builder()
        .wavelet("db2")
        .levels(level, level)
        .aging(aging)
        .density_range(-4.0, 4.0)
        .discretization(0.01)
        .wavelet_detail(false)
        .build()
}

pub fn db2_estimator(config: EstimatorConfig) -> WaveletDensityEstimator {
    WaveletDensityEstimator::with_config(db2_loader(), config).unwrap()
}
