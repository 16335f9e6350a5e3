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

//! Streaming probability density estimation with multiresolution wavelet series.
//!
//! Samples are folded one at a time into scaling and wavelet coefficients, so the
//! estimate is refreshed in time proportional to the basis support rather than the
//! history length, and can be reconstructed on demand as a normalized density curve.
//!
//! - [`wavelet`]: tabulated scaling and wavelet functions and how to load them.
//! - [`estimator`]: the streaming estimator, its configuration and aging policies.
//! - [`sample`]: sources of scalar samples.
//! - [`runner`]: a background loop driving an estimator from a sample source.

pub mod error;
pub mod estimator;
pub mod runner;
pub mod sample;
pub mod wavelet;

mod codec;
