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

use crate::error::Error;
use crate::wavelet::Support;
use crate::wavelet::WaveletFamily;

/// Selects which tabulated curve of a basis to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisTable {
    /// The scaling function phi.
    Phi,
    /// The wavelet function psi.
    Psi,
}

/// Tabulated scaling and wavelet functions of one wavelet family.
///
/// The three tables are aligned: `phi[i]` and `psi[i]` are the function values at
/// `domain[i]`. Values between nodes are linearly interpolated and values outside
/// the tabulated domain are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletBasis {
    family: WaveletFamily,
    support: Support,
    domain: Vec<f64>,
    phi: Vec<f64>,
    psi: Vec<f64>,
}

impl WaveletBasis {
    /// Builds a basis from aligned lookup tables.
    ///
    /// Returns a [`DataLoad`](crate::error::ErrorKind::DataLoad) error if the tables are
    /// empty, of different lengths, or if the domain is not strictly increasing.
    pub fn from_tables(
        family: WaveletFamily,
        domain: Vec<f64>,
        phi: Vec<f64>,
        psi: Vec<f64>,
    ) -> Result<Self, Error> {
        if domain.is_empty() {
            return Err(Error::data_load("wavelet tables are empty").with_context("wavelet", family));
        }
        if domain.len() != phi.len() || domain.len() != psi.len() {
            return Err(Error::data_load("wavelet table lengths disagree")
                .with_context("wavelet", family)
                .with_context("domain", domain.len())
                .with_context("phi", phi.len())
                .with_context("psi", psi.len()));
        }
        if let Some(bad) = domain.iter().position(|x| !x.is_finite()) {
            return Err(Error::data_load("domain node is not finite")
                .with_context("wavelet", family)
                .with_context("index", bad));
        }
        if let Some(bad) = domain.windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::data_load("domain is not strictly increasing")
                .with_context("wavelet", family)
                .with_context("index", bad + 1));
        }

        Ok(Self {
            family,
            support: family.support(),
            domain,
            phi,
            psi,
        })
    }

    /// Returns the wavelet family of this basis.
    pub fn family(&self) -> WaveletFamily {
        self.family
    }

    /// Returns the support interval of the basis functions.
    pub fn support(&self) -> Support {
        self.support
    }

    /// Returns the tabulated abscissas.
    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    /// Returns true if `x` lies in the support interval.
    pub fn in_support(&self, x: f64) -> bool {
        self.support.contains(x)
    }

    /// Returns the value of the selected table at `x`.
    ///
    /// Exact on domain nodes, linearly interpolated between the two bracketing nodes,
    /// and zero outside `[domain[0], domain[last]]`.
    pub fn value_at(&self, table: BasisTable, x: f64) -> f64 {
        let values = match table {
            BasisTable::Phi => &self.phi,
            BasisTable::Psi => &self.psi,
        };
        interpolate(&self.domain, values, x)
    }

    /// Returns the scaling function value at `x`.
    pub fn phi_at(&self, x: f64) -> f64 {
        self.value_at(BasisTable::Phi, x)
    }

    /// Returns the wavelet function value at `x`.
    pub fn psi_at(&self, x: f64) -> f64 {
        self.value_at(BasisTable::Psi, x)
    }
}

fn interpolate(domain: &[f64], values: &[f64], x: f64) -> f64 {
    let first = domain[0];
    let last = domain[domain.len() - 1];
    // NaN fails both comparisons and falls through to zero as well
    if !(first <= x && x <= last) {
        return 0.0;
    }

    let upper = domain.partition_point(|node| *node < x);
    if domain[upper] == x {
        return values[upper];
    }
    let lower = upper - 1;
    let (x0, x1) = (domain[lower], domain[upper]);
    let (y0, y1) = (values[lower], values[upper]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
