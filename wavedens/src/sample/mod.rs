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

//! Sources of scalar samples.
//!
//! A source yields one `f64` at a time. Text sources hold one number per line; blank
//! lines are skipped and a line that does not parse is reported as
//! [`ErrorKind::MalformedSample`](crate::error::ErrorKind::MalformedSample) with its
//! 1-based line number under the `line` context key. Whether the caller skips such a
//! line or aborts is up to the caller; the source itself moves on to the next line.
//!
//! # Usage
//!
//! ```rust
//! # use wavedens::sample::{LineSampleSource, SampleSource};
//! let mut source = LineSampleSource::new("0.5\n\n-1.25\n".as_bytes());
//! let mut samples = vec![];
//! while source.has_next() {
//!     samples.push(source.next_sample().unwrap());
//! }
//! assert_eq!(samples, vec![0.5, -1.25]);
//! ```

mod buffered;
mod line;

pub use self::buffered::BufferedSampleSource;
pub use self::line::LineSampleSource;

use crate::error::Error;

/// A stream of scalar samples.
pub trait SampleSource {
    /// Returns true if [`next_sample`](Self::next_sample) has something to return,
    /// either a sample or an error.
    fn has_next(&mut self) -> bool;

    /// Returns the next sample.
    ///
    /// Fails with `MalformedSample` for an unparsable record and with `SampleRead` on
    /// I/O failure or when the source is exhausted.
    fn next_sample(&mut self) -> Result<f64, Error>;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn has_next(&mut self) -> bool {
        (**self).has_next()
    }

    fn next_sample(&mut self) -> Result<f64, Error> {
        (**self).next_sample()
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn has_next(&mut self) -> bool {
        (**self).has_next()
    }

    fn next_sample(&mut self) -> Result<f64, Error> {
        (**self).next_sample()
    }
}

pub(crate) fn parse_sample(line: usize, text: &str) -> Result<f64, Error> {
    text.trim()
        .parse::<f64>()
        .map_err(|err| Error::malformed_sample(line, text.trim()).set_source(err))
}
