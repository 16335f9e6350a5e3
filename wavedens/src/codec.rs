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

use std::io;
use std::io::Cursor;
use std::io::Read;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;

pub(crate) mod family;

/// Little-endian output buffer for serialized estimator state.
pub(crate) struct StateBytes {
    bytes: Vec<u8>,
}

impl StateBytes {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    pub fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    pub fn write_u32_le(&mut self, n: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_i32_le(&mut self, n: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_u64_le(&mut self, n: u64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_f64_le(&mut self, n: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, n);
        self.write(&buf);
    }

    /// Writes a length prefix followed by the values.
    pub fn write_f64_slice_le(&mut self, values: &[f64]) {
        self.write_u32_le(values.len() as u32);
        for value in values {
            self.write_f64_le(*value);
        }
    }
}

/// Little-endian reader over serialized estimator state.
pub(crate) struct StateSlice<'a> {
    slice: Cursor<&'a [u8]>,
}

impl StateSlice<'_> {
    pub fn new(slice: &[u8]) -> StateSlice<'_> {
        StateSlice {
            slice: Cursor::new(slice),
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.slice.read_exact(buf)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.slice.read_u8()
    }

    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        self.slice.read_u32::<LittleEndian>()
    }

    pub fn read_i32_le(&mut self) -> io::Result<i32> {
        self.slice.read_i32::<LittleEndian>()
    }

    pub fn read_u64_le(&mut self) -> io::Result<u64> {
        self.slice.read_u64::<LittleEndian>()
    }

    pub fn read_f64_le(&mut self) -> io::Result<f64> {
        self.slice.read_f64::<LittleEndian>()
    }

    /// Reads a length prefix followed by that many values.
    pub fn read_f64_vec_le(&mut self) -> io::Result<Vec<f64>> {
        let len = self.read_u32_le()? as usize;
        let remaining = self.remaining();
        if len.saturating_mul(8) > remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "declared length exceeds remaining bytes",
            ));
        }
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.read_f64_le()?);
        }
        Ok(values)
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        let len = self.slice.get_ref().len();
        len.saturating_sub(self.slice.position() as usize)
    }
}
