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

//! Finite-support wavelet bases backed by lookup tables.
//!
//! A basis is identified by a family and an order (`db6`, `sym4`, `coif2`, `dmey`). The
//! family fixes the support interval of the scaling function phi and the wavelet function
//! psi; the curves themselves are read from tabulated files and linearly interpolated.
//!
//! # Usage
//!
//! ```rust
//! # use wavedens::wavelet::{WaveletBasis, WaveletFamily};
//! let family = WaveletFamily::parse("db1").unwrap();
//! let basis = WaveletBasis::from_tables(
//!     family,
//!     vec![0.0, 0.5, 1.0],
//!     vec![1.0, 1.0, 1.0],
//!     vec![1.0, 0.0, -1.0],
//! )
//! .unwrap();
//! assert_eq!(basis.phi_at(0.25), 1.0);
//! assert_eq!(basis.psi_at(0.75), -0.5);
//! assert_eq!(basis.phi_at(2.0), 0.0);
//! ```

mod basis;
mod family;
mod loader;

pub use self::basis::BasisTable;
pub use self::basis::WaveletBasis;
pub use self::family::SUPPORTED_WAVELETS;
pub use self::family::Support;
pub use self::family::WaveletFamily;
pub use self::loader::BasisLoader;
pub use self::loader::DirectoryLoader;
pub use self::loader::MemoryLoader;
