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

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Wavelet identifiers offered to users when configuring an estimator.
pub const SUPPORTED_WAVELETS: [&str; 22] = [
    "coif1", "coif2", "coif3", "coif4", "coif5", "db2", "db3", "db4", "db5", "db6", "db7", "db8",
    "db9", "db10", "sym4", "sym5", "sym6", "sym7", "sym8", "sym9", "sym10", "dmey",
];

/// A compactly supported orthogonal wavelet family together with its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveletFamily {
    /// Daubechies wavelet `db{n}`.
    Daubechies(u32),
    /// Symlet `sym{n}`.
    Symlet(u32),
    /// Coiflet `coif{n}`.
    Coiflet(u32),
    /// Discrete approximation of the Meyer wavelet, `dmey`.
    DiscreteMeyer,
}

impl WaveletFamily {
    /// Parses a wavelet identifier such as `"db6"`, `"sym4"`, `"coif2"` or `"dmey"`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavedens::wavelet::WaveletFamily;
    /// let family = WaveletFamily::parse("db2").unwrap();
    /// assert_eq!(family, WaveletFamily::Daubechies(2));
    /// assert!(WaveletFamily::parse("foo3").is_err());
    /// ```
    pub fn parse(id: &str) -> Result<Self, Error> {
        let id = id.trim();
        if id == "dmey" {
            return Ok(WaveletFamily::DiscreteMeyer);
        }

        let split = id.find(|c: char| c.is_ascii_digit()).unwrap_or(id.len());
        let (prefix, digits) = id.split_at(split);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::unsupported_wavelet(id));
        }
        let order = match digits.parse::<u32>() {
            Ok(order) if order > 0 => order,
            _ => return Err(Error::unsupported_wavelet(id)),
        };

        match prefix {
            "db" => Ok(WaveletFamily::Daubechies(order)),
            "sym" => Ok(WaveletFamily::Symlet(order)),
            "coif" => Ok(WaveletFamily::Coiflet(order)),
            _ => Err(Error::unsupported_wavelet(id)),
        }
    }

    /// Returns the order, or `None` for families without one.
    pub fn order(&self) -> Option<u32> {
        match self {
            WaveletFamily::Daubechies(n) | WaveletFamily::Symlet(n) | WaveletFamily::Coiflet(n) => {
                Some(*n)
            }
            WaveletFamily::DiscreteMeyer => None,
        }
    }

    /// Returns the closed support interval shared by the scaling and wavelet functions.
    pub fn support(&self) -> Support {
        let end = match self {
            WaveletFamily::Daubechies(n) | WaveletFamily::Symlet(n) => 2 * *n as i64 - 1,
            WaveletFamily::Coiflet(n) => 6 * *n as i64 - 1,
            WaveletFamily::DiscreteMeyer => 101,
        };
        Support::new(0, end)
    }
}

impl FromStr for WaveletFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveletFamily::parse(s)
    }
}

impl fmt::Display for WaveletFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveletFamily::Daubechies(n) => write!(f, "db{n}"),
            WaveletFamily::Symlet(n) => write!(f, "sym{n}"),
            WaveletFamily::Coiflet(n) => write!(f, "coif{n}"),
            WaveletFamily::DiscreteMeyer => write!(f, "dmey"),
        }
    }
}

/// Closed integer interval `[start, end]` outside of which a basis function vanishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Support {
    start: i64,
    end: i64,
}

impl Support {
    /// Creates a support interval.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`.
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start <= end, "support start must not exceed end: [{start}, {end}]");
        Self { start, end }
    }

    /// Returns the lower bound of the support.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Returns the upper bound of the support.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Returns true if `x` lies in the closed interval.
    pub fn contains(&self, x: f64) -> bool {
        self.start as f64 <= x && x <= self.end as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_orders() {
        assert_eq!(WaveletFamily::parse("db10").unwrap(), WaveletFamily::Daubechies(10));
        assert_eq!(WaveletFamily::parse("sym4").unwrap(), WaveletFamily::Symlet(4));
        assert_eq!(WaveletFamily::parse("coif3").unwrap(), WaveletFamily::Coiflet(3));
        assert_eq!(WaveletFamily::parse(" dmey ").unwrap(), WaveletFamily::DiscreteMeyer);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for id in ["", "db", "db0", "db2x", "2db", "haar", "dmey2", "DB2", "sym-1"] {
            let err = WaveletFamily::parse(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedWavelet, "{id}");
        }
    }

    #[test]
    fn test_display_matches_identifier() {
        for id in SUPPORTED_WAVELETS {
            assert_eq!(WaveletFamily::parse(id).unwrap().to_string(), id);
        }
    }

    #[test]
    fn test_support_bounds() {
        let support = WaveletFamily::Coiflet(2).support();
        assert_eq!((support.start(), support.end()), (0, 11));
        assert!(support.contains(0.0));
        assert!(support.contains(11.0));
        assert!(!support.contains(11.0001));
        assert!(!support.contains(f64::NAN));
    }
}
