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

use std::path::Path;

use crate::error::Error;
use crate::sample::LineSampleSource;
use crate::sample::SampleSource;

/// Samples pre-loaded into memory.
///
/// By default each value is produced once, in order. A repeating source wraps around
/// to the first value after the last and never runs dry.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedSampleSource {
    values: Vec<f64>,
    position: usize,
    repeat: bool,
}

impl BufferedSampleSource {
    /// Creates a source over the given values.
    pub fn from_values(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
            repeat: false,
        }
    }

    /// Reads every sample of a line-oriented file up front.
    ///
    /// Fails on the first malformed line.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut source = LineSampleSource::open(path)?;
        let mut values = vec![];
        while source.has_next() {
            values.push(source.next_sample()?);
        }
        Ok(Self::from_values(values))
    }

    /// Makes the source wrap around after the last value.
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Returns the buffered values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of buffered values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no buffered values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the index of the next value to be produced.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Starts over from the first value.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl SampleSource for BufferedSampleSource {
    fn has_next(&mut self) -> bool {
        if self.repeat {
            !self.values.is_empty()
        } else {
            self.position < self.values.len()
        }
    }

    fn next_sample(&mut self) -> Result<f64, Error> {
        if !self.has_next() {
            return Err(Error::sample_read("no more samples")
                .with_context("position", self.position));
        }
        let value = self.values[self.position];
        self.position += 1;
        if self.repeat && self.position == self.values.len() {
            self.position = 0;
        }
        Ok(value)
    }
}
