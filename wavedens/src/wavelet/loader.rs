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

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Error;
use crate::wavelet::WaveletBasis;
use crate::wavelet::WaveletFamily;

/// Source of wavelet lookup tables.
pub trait BasisLoader {
    /// Loads the tabulated basis for the given family.
    fn load(&self, family: WaveletFamily) -> Result<WaveletBasis, Error>;
}

/// Loads tables from a folder holding `<id>_domain.csv`, `<id>_phi.csv` and
/// `<id>_psi.csv`, one number per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    /// Creates a loader rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the folder tables are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of one table file for a family.
    pub fn table_path(&self, family: WaveletFamily, table: &str) -> PathBuf {
        self.dir.join(format!("{family}_{table}.csv"))
    }
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl BasisLoader for DirectoryLoader {
    fn load(&self, family: WaveletFamily) -> Result<WaveletBasis, Error> {
        let domain = read_table(&self.table_path(family, "domain"))?;
        let phi = read_table(&self.table_path(family, "phi"))?;
        let psi = read_table(&self.table_path(family, "psi"))?;
        debug!(
            wavelet = %family,
            dir = %self.dir.display(),
            nodes = domain.len(),
            "loaded wavelet tables"
        );
        WaveletBasis::from_tables(family, domain, phi, psi)
    }
}

/// Serves bases that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    bases: Vec<WaveletBasis>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a basis, replacing any previous basis of the same family.
    pub fn with_basis(mut self, basis: WaveletBasis) -> Self {
        self.bases.retain(|b| b.family() != basis.family());
        self.bases.push(basis);
        self
    }
}

impl BasisLoader for MemoryLoader {
    fn load(&self, family: WaveletFamily) -> Result<WaveletBasis, Error> {
        self.bases
            .iter()
            .find(|b| b.family() == family)
            .cloned()
            .ok_or_else(|| {
                Error::data_load("no wavelet tables registered").with_context("wavelet", family)
            })
    }
}

impl<L: BasisLoader + ?Sized> BasisLoader for &L {
    fn load(&self, family: WaveletFamily) -> Result<WaveletBasis, Error> {
        (**self).load(family)
    }
}

fn read_table(path: &Path) -> Result<Vec<f64>, Error> {
    let content = fs::read_to_string(path).map_err(|err| {
        Error::data_load("failed to read wavelet table")
            .with_context("path", path.display())
            .set_source(err)
    })?;

    let mut values = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line.parse::<f64>().map_err(|err| {
            Error::data_load("wavelet table record is not a number")
                .with_context("path", path.display())
                .with_context("line", index + 1)
                .set_source(err)
        })?;
        values.push(value);
    }
    Ok(values)
}
