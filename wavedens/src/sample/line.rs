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

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::sample::SampleSource;
use crate::sample::parse_sample;

/// Reads samples lazily from line-oriented text, one number per line.
#[derive(Debug)]
pub struct LineSampleSource<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    pending: Option<Result<f64, Error>>,
    finished: bool,
}

impl LineSampleSource<BufReader<File>> {
    /// Opens a sample file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::sample_read("failed to open sample file")
                .with_context("path", path.display())
                .set_source(err)
        })?;
        debug!(path = %path.display(), "opened sample file");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSampleSource<R> {
    /// Creates a source over any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            pending: None,
            finished: false,
        }
    }

    /// Returns the number of lines consumed so far, blank lines included.
    pub fn lines_read(&self) -> usize {
        self.line
    }

    fn fill(&mut self) {
        while self.pending.is_none() && !self.finished {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    debug!(lines = self.line, "sample stream exhausted");
                    self.finished = true;
                }
                Ok(_) => {
                    self.line += 1;
                    // a line that is not UTF-8 is malformed; the stream goes on
                    match std::str::from_utf8(&self.buf) {
                        Ok(text) if text.trim().is_empty() => {}
                        Ok(text) => self.pending = Some(parse_sample(self.line, text)),
                        Err(err) => {
                            let text = String::from_utf8_lossy(&self.buf);
                            self.pending = Some(Err(Error::malformed_sample(
                                self.line,
                                text.trim(),
                            )
                            .set_source(err)));
                        }
                    }
                }
                Err(err) => {
                    self.finished = true;
                    self.pending = Some(Err(Error::sample_read("failed to read sample")
                        .with_context("line", self.line + 1)
                        .set_source(err)));
                }
            }
        }
    }
}

impl<R: BufRead> SampleSource for LineSampleSource<R> {
    fn has_next(&mut self) -> bool {
        self.fill();
        self.pending.is_some()
    }

    fn next_sample(&mut self) -> Result<f64, Error> {
        self.fill();
        match self.pending.take() {
            Some(result) => result,
            None => Err(Error::sample_read("no more samples").with_context("line", self.line)),
        }
    }
}
