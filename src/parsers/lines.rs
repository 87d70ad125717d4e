//! Logical line reader
//!
//! Reads whole lines regardless of length so that the parser only ever sees
//! complete lines. Invalid UTF-8 is logged and replaced rather than aborting.

use crate::error::Result;
use log::warn;
use std::io::BufRead;

/// Iterator over `(line_number, line)` pairs, line numbers starting at 1
pub struct LogicalLines<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> LogicalLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(1024),
            line_number: 0,
        }
    }

    fn read_next(&mut self) -> Result<Option<(usize, String)>> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }

        let line = match std::str::from_utf8(&self.buffer) {
            Ok(s) => s.to_string(),
            Err(e) => {
                warn!("Line {}: invalid UTF-8 ({}), replacing bad bytes", self.line_number, e);
                String::from_utf8_lossy(&self.buffer).into_owned()
            }
        };

        Ok(Some((self.line_number, line)))
    }
}

impl<R: BufRead> Iterator for LogicalLines<R> {
    type Item = Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
