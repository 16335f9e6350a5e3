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

mod common;

use std::fs;

use common::db2_loader;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;
use googletest::prelude::near;
use wavedens::error::ErrorKind;
use wavedens::wavelet::BasisLoader;
use wavedens::wavelet::BasisTable;
use wavedens::wavelet::DirectoryLoader;
use wavedens::wavelet::SUPPORTED_WAVELETS;
use wavedens::wavelet::WaveletFamily;

#[test]
fn test_db2_support() {
    let family = WaveletFamily::parse("db2").unwrap();
    assert_eq!(family, WaveletFamily::Daubechies(2));
    assert_eq!(family.support().start(), 0);
    assert_eq!(family.support().end(), 3);

    let basis = db2_loader().load(family).unwrap();
    assert_eq!(basis.support(), family.support());
    assert!(basis.in_support(0.0));
    assert!(basis.in_support(3.0));
    assert!(!basis.in_support(3.0001));
    assert!(!basis.in_support(-0.0001));
}

#[test]
fn test_supports_of_other_families() {
    let support = |id: &str| {
        let s = WaveletFamily::parse(id).unwrap().support();
        (s.start(), s.end())
    };
    assert_eq!(support("db6"), (0, 11));
    assert_eq!(support("sym4"), (0, 7));
    assert_eq!(support("coif1"), (0, 5));
    assert_eq!(support("coif5"), (0, 29));
    assert_eq!(support("dmey"), (0, 101));
}

#[test]
fn test_every_listed_wavelet_parses() {
    for id in SUPPORTED_WAVELETS {
        let family = WaveletFamily::parse(id).unwrap();
        assert_eq!(family.to_string(), id);
    }
}

#[test]
fn test_unsupported_wavelets() {
    for id in ["foo3", "db", "db0", "db2x", "haar", "", "sym-4", "dmey2"] {
        let err = WaveletFamily::parse(id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedWavelet, "{id:?}");
    }
}

#[test]
fn test_table_lookup() {
    let basis = db2_loader()
        .load(WaveletFamily::parse("db2").unwrap())
        .unwrap();
    let domain = basis.domain();
    assert_eq!(domain.len(), 97);
    assert_eq!(domain[0], 0.0);
    assert_eq!(domain[96], 3.0);

    // exact on nodes
    assert_eq!(basis.phi_at(1.0), 1.3660254037844386);
    assert_that!(basis.phi_at(2.0), near(-0.3660254037844386, 1e-12));
    assert_eq!(basis.psi_at(0.0), 0.0);
    assert_that!(basis.psi_at(1.0), near(-0.3660254037844387, 1e-12));

    // linear between nodes
    let (left, right) = (domain[40], domain[41]);
    let mid = (left + right) / 2.0;
    let expected = (basis.phi_at(left) + basis.phi_at(right)) / 2.0;
    assert_that!(basis.value_at(BasisTable::Phi, mid), near(expected, 1e-12));

    // no extrapolation
    assert_eq!(basis.phi_at(-0.5), 0.0);
    assert_eq!(basis.psi_at(3.5), 0.0);
    assert_eq!(basis.phi_at(f64::NAN), 0.0);
}

#[test]
fn test_scaling_function_integrates_to_one() {
    let basis = db2_loader()
        .load(WaveletFamily::parse("db2").unwrap())
        .unwrap();
    let step = 1.0 / 32.0;
    let integral: f64 = basis.domain().iter().map(|x| basis.phi_at(*x)).sum::<f64>() * step;
    assert_that!(integral, near(1.0, 1e-6));
}

#[test]
fn test_missing_tables() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DirectoryLoader::new(dir.path());
    let err = loader
        .load(WaveletFamily::parse("db4").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataLoad);
    assert_that!(err.message(), contains_substring("failed to read"));
    let path = err.context_value("path").unwrap();
    assert_that!(path, contains_substring("db4_domain.csv"));
}

#[test]
fn test_mismatched_tables() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("db3_domain.csv"), "0\n1\n2\n").unwrap();
    fs::write(dir.path().join("db3_phi.csv"), "0\n1\n").unwrap();
    fs::write(dir.path().join("db3_psi.csv"), "0\n1\n2\n").unwrap();

    let err = DirectoryLoader::new(dir.path())
        .load(WaveletFamily::parse("db3").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataLoad);
    assert_that!(err.message(), contains_substring("lengths disagree"));
    assert_that!(err.context_value("phi"), eq(Some("2")));
}

#[test]
fn test_malformed_table_record() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sym4_domain.csv"), "0\n\nnot-a-number\n").unwrap();
    fs::write(dir.path().join("sym4_phi.csv"), "0\n1\n").unwrap();
    fs::write(dir.path().join("sym4_psi.csv"), "0\n1\n").unwrap();

    let err = DirectoryLoader::new(dir.path())
        .load(WaveletFamily::parse("sym4").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataLoad);
    assert_that!(err.context_value("line"), eq(Some("3")));
}

#[test]
fn test_blank_lines_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("db1_domain.csv"), "0\n\n0.5\n1\n\n").unwrap();
    fs::write(dir.path().join("db1_phi.csv"), "1\n1\n\n1\n").unwrap();
    fs::write(dir.path().join("db1_psi.csv"), "1\n0\n-1\n").unwrap();

    let basis = DirectoryLoader::new(dir.path())
        .load(WaveletFamily::parse("db1").unwrap())
        .unwrap();
    assert_eq!(basis.domain(), &[0.0, 0.5, 1.0]);
    assert_eq!(basis.psi_at(0.25), 0.5);
}
