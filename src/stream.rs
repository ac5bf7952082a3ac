//! Line-oriented record framing shared by both formats.
//!
//! A record is one physical line, or, when a special record delimiter is configured,
//! one delimiter-terminated segment of a line. [`RecordReader`] hands the current record
//! to a field codec character by character and supports one record of pushback;
//! [`RecordWriter`] counts fields and terminates records.

use crate::options::{LineFilter, RbfOptions};
use crate::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// Position of the reader, for diagnostics. Both numbers are 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputPosition {
    pub line_number: usize,
    pub column_number: usize,
}

/// Reads records from a buffered character stream.
pub struct RecordReader<R> {
    reader: R,
    special_record_delimiter: Option<char>,
    line_filter: Option<Arc<dyn LineFilter>>,
    filtered_lines: Vec<String>,
    /// Current physical line, plus any continuation lines joined with `\n`.
    buffer: Vec<char>,
    /// Start of the current record in `buffer`.
    start: usize,
    cursor: usize,
    /// Start of the current physical line in `buffer`.
    line_offset: usize,
    line_number: usize,
    has_record: bool,
    unread: bool,
    eof: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, options: &RbfOptions) -> Self {
        RecordReader {
            reader,
            special_record_delimiter: options.special_record_delimiter,
            line_filter: options.line_filter.clone(),
            filtered_lines: Vec::new(),
            buffer: Vec::new(),
            start: 0,
            cursor: 0,
            line_offset: 0,
            line_number: 0,
            has_record: false,
            unread: false,
            eof: false,
        }
    }

    /// Advances to the next record, skipping blank and filtered lines.
    ///
    /// Returns `false` at the end of the stream. After [`unread_record`](Self::unread_record)
    /// the same record is returned again, positioned at its first character.
    pub fn read_next_record(&mut self) -> Result<bool> {
        if self.unread {
            self.unread = false;
            self.cursor = self.start;
            return Ok(self.has_record);
        }

        if self.has_record && self.next_segment() {
            return Ok(true);
        }

        loop {
            let line = match self.read_physical_line()? {
                Some(line) => line,
                None => {
                    self.has_record = false;
                    self.buffer.clear();
                    self.start = 0;
                    self.cursor = 0;
                    self.line_offset = 0;
                    return Ok(false);
                }
            };

            if let Some(filter) = &self.line_filter {
                if filter.filter(&line, self.line_number) {
                    debug!(line_number = self.line_number, "line dropped by filter");
                    self.filtered_lines.push(line);
                    continue;
                }
            }
            if line.is_empty() {
                continue;
            }

            self.buffer = line.chars().collect();
            self.start = 0;
            self.cursor = 0;
            self.line_offset = 0;
            self.skip_empty_segments();
            if self.start < self.buffer.len() {
                self.has_record = true;
                return Ok(true);
            }
        }
    }

    /// Pushes the current record back; the next [`read_next_record`](Self::read_next_record)
    /// returns it again.
    pub fn unread_record(&mut self) {
        if self.has_record {
            self.unread = true;
            self.cursor = self.start;
        }
    }

    /// Joins the next physical line to the current record with a `\n`.
    ///
    /// Used by quoted values spanning several lines. Returns `false` at the end of the stream.
    pub fn continue_record(&mut self) -> Result<bool> {
        match self.read_physical_line()? {
            Some(line) => {
                self.buffer.push('\n');
                self.line_offset = self.buffer.len();
                self.buffer.extend(line.chars());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Moves past the current record's special delimiter to the following segment, if any.
    fn next_segment(&mut self) -> bool {
        let delimiter = match self.special_record_delimiter {
            Some(delimiter) => delimiter,
            None => return false,
        };
        let rest = self.buffer[self.cursor.min(self.buffer.len())..]
            .iter()
            .position(|&c| c == delimiter);
        match rest {
            Some(offset) => {
                self.start = self.cursor + offset + 1;
                self.cursor = self.start;
                self.skip_empty_segments();
                self.start < self.buffer.len()
            }
            None => false,
        }
    }

    fn skip_empty_segments(&mut self) {
        if let Some(delimiter) = self.special_record_delimiter {
            while self.buffer.get(self.start) == Some(&delimiter) {
                self.start += 1;
            }
            self.cursor = self.start;
        }
    }

    fn read_physical_line(&mut self) -> Result<Option<String>> {
        if self.eof {
            return Ok(None);
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            self.eof = true;
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.line_number += 1;
        Ok(Some(line))
    }

    /// The character under the cursor, including a special record delimiter.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.buffer.get(self.cursor).copied()
    }

    /// Consumes the character under the cursor.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.cursor += 1;
        }
        c
    }

    /// True when the cursor is at the end of the line or on the special record delimiter.
    #[must_use]
    pub fn at_record_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) => Some(c) == self.special_record_delimiter,
        }
    }

    /// Consumes up to `count` characters, stopping at the end of the record.
    pub fn take(&mut self, count: usize) -> String {
        let mut taken = String::new();
        while taken.chars().count() < count && !self.at_record_end() {
            if let Some(c) = self.next_char() {
                taken.push(c);
            }
        }
        taken
    }

    /// Text of the current record, for diagnostics.
    #[must_use]
    pub fn record_text(&self) -> String {
        let end = match self.special_record_delimiter {
            Some(delimiter) => self.buffer[self.start..]
                .iter()
                .position(|&c| c == delimiter)
                .map_or(self.buffer.len(), |offset| self.start + offset),
            None => self.buffer.len(),
        };
        self.buffer[self.start..end].iter().collect()
    }

    #[must_use]
    pub fn special_record_delimiter(&self) -> Option<char> {
        self.special_record_delimiter
    }

    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    #[must_use]
    pub fn position(&self) -> InputPosition {
        InputPosition {
            line_number: self.line_number,
            column_number: self.cursor.saturating_sub(self.line_offset) + 1,
        }
    }

    /// Lines dropped by the line filter so far.
    #[must_use]
    pub fn filtered_lines(&self) -> &[String] {
        &self.filtered_lines
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writes records to a character stream.
pub struct RecordWriter<W> {
    writer: W,
    line_break: String,
    special_record_delimiter: Option<char>,
    field_count: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, options: &RbfOptions) -> Self {
        RecordWriter {
            writer,
            line_break: options.line_break.clone(),
            special_record_delimiter: options.special_record_delimiter,
            field_count: 0,
        }
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn write_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    /// Registers a new field in the current record; returns true for the first one.
    pub fn begin_field(&mut self) -> bool {
        self.field_count += 1;
        self.field_count == 1
    }

    /// Number of fields written to the current record.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Terminates the current record with the special delimiter or the line break.
    pub fn finish_record(&mut self) -> Result<()> {
        match self.special_record_delimiter {
            Some(delimiter) => self.write_char(delimiter)?,
            None => {
                let line_break = std::mem::take(&mut self.line_break);
                let result = self.write_str(&line_break);
                self.line_break = line_break;
                result?;
            }
        }
        self.field_count = 0;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
