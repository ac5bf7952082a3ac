//! The delimited (CSV) field codec.
//!
//! Wire shape: `field (delimiter field)* [delimiter]`, one record per line.
//!
//! | Quote mode | Write | Read |
//! |------------|-------|------|
//! | `Always` | value wrapped in quotes, quotes escaped | quoted value; unquoted text accepted as is |
//! | `OnDemand` | quoted only when the value contains the delimiter, a quote, the escape character, a line break or the special record delimiter (or is empty) | quoted or raw |
//! | `Never` | raw, with the delimiter, escape character and line breaks preceded by the escape character | raw, escapes resolved |
//!
//! Quoted values may span physical lines; the embedded line break decodes as `\n`.

use super::FieldCodec;
use crate::mapping::{FieldLayout, FieldMapping};
use crate::options::{CsvOptions, EscapeMode, QuoteMode, RbfOptions};
use crate::stream::{RecordReader, RecordWriter};
use crate::{Error, Result};
use std::io::{BufRead, Write};

#[derive(Clone, Debug, Default)]
pub struct CsvCodec {
    options: CsvOptions,
}

impl CsvCodec {
    pub fn new(options: CsvOptions) -> Self {
        CsvCodec { options }
    }

    #[must_use]
    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    fn quote_mode(&self, layout: &FieldLayout) -> QuoteMode {
        layout.quote_mode.unwrap_or(self.options.default_quote_mode)
    }

    fn needs_quotes(&self, text: &str) -> bool {
        let special = self.options.rbf.special_record_delimiter;
        text.is_empty()
            || text.chars().any(|c| {
                c == self.options.field_delimiter
                    || c == self.options.quote_character
                    || c == self.options.escape_character
                    || c == '\n'
                    || c == '\r'
                    || Some(c) == special
            })
    }

    fn quoted(&self, text: &str) -> String {
        let quote = self.options.quote_character;
        let escape = self.options.escape_character;
        let mut result = String::with_capacity(text.len() + 2);
        result.push(quote);
        for c in text.chars() {
            match self.options.escape_mode {
                EscapeMode::Doubling if c == quote => {
                    result.push(quote);
                    result.push(quote);
                }
                EscapeMode::EscapeCharacter if c == quote || c == escape => {
                    result.push(escape);
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
        result.push(quote);
        result
    }

    fn escaped(&self, text: &str) -> String {
        let escape = self.options.escape_character;
        let special = self.options.rbf.special_record_delimiter;
        let mut result = String::with_capacity(text.len());
        for c in text.chars() {
            if c == self.options.field_delimiter || c == escape || Some(c) == special {
                result.push(escape);
                result.push(c);
            } else if c == '\n' {
                result.push(escape);
                result.push_str(&self.options.rbf.line_break);
            } else if c == '\r' {
                result.push(escape);
                result.push('r');
            } else {
                result.push(c);
            }
        }
        result
    }

    fn read_quoted<R: BufRead>(&self, input: &mut RecordReader<R>) -> Result<String> {
        let quote = self.options.quote_character;
        let escape = self.options.escape_character;
        let mut text = String::new();
        input.next_char();

        loop {
            let c = match input.next_char() {
                Some(c) => c,
                None => {
                    if input.continue_record()? {
                        continue;
                    }
                    return Err(self.error(input, "unterminated quoted value at end of stream"));
                }
            };

            if self.options.escape_mode == EscapeMode::EscapeCharacter && c == escape {
                match input.next_char() {
                    Some(escaped) => text.push(escaped),
                    None => {
                        if !input.continue_record()? {
                            return Err(self.error(input, "unterminated quoted value at end of stream"));
                        }
                    }
                }
            } else if c == quote {
                if self.options.escape_mode == EscapeMode::Doubling && input.peek() == Some(quote) {
                    input.next_char();
                    text.push(quote);
                } else {
                    return Ok(text);
                }
            } else {
                text.push(c);
            }
        }
    }

    fn read_raw<R: BufRead>(&self, input: &mut RecordReader<R>, resolve_escapes: bool) -> Result<String> {
        let escape = self.options.escape_character;
        let mut text = String::new();

        while !input.at_record_end() && input.peek() != Some(self.options.field_delimiter) {
            let c = match input.next_char() {
                Some(c) => c,
                None => break,
            };
            if !resolve_escapes || c != escape {
                text.push(c);
                continue;
            }
            match input.next_char() {
                Some('r') => text.push('\r'),
                Some(escaped) => text.push(escaped),
                None => {
                    if input.continue_record()? {
                        input.next_char();
                        text.push('\n');
                    }
                }
            }
        }
        Ok(text)
    }

    fn error<R: BufRead>(&self, input: &RecordReader<R>, msg: &str) -> Error {
        let position = input.position();
        Error::deserialization(position.line_number, position.column_number, msg)
    }
}

impl FieldCodec for CsvCodec {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn rbf_options(&self) -> &RbfOptions {
        &self.options.rbf
    }

    fn validate_layout(&self, _owner: &str, _field: &FieldMapping) -> Result<()> {
        Ok(())
    }

    fn write_prefix<W: Write>(&self, out: &mut RecordWriter<W>, prefix: &str) -> Result<()> {
        self.write_field(out, Some(prefix), &FieldLayout::default())
    }

    fn write_field<W: Write>(
        &self,
        out: &mut RecordWriter<W>,
        text: Option<&str>,
        layout: &FieldLayout,
    ) -> Result<()> {
        if !out.begin_field() {
            out.write_char(self.options.field_delimiter)?;
        }
        let text = match text {
            Some(text) => text,
            None => return Ok(()),
        };
        match self.quote_mode(layout) {
            QuoteMode::Always => out.write_str(&self.quoted(text)),
            QuoteMode::OnDemand if self.needs_quotes(text) => out.write_str(&self.quoted(text)),
            QuoteMode::OnDemand => out.write_str(text),
            QuoteMode::Never => out.write_str(&self.escaped(text)),
        }
    }

    fn finish_record<W: Write>(&self, out: &mut RecordWriter<W>) -> Result<()> {
        if self.options.use_delimiter_after_last_field && out.field_count() > 0 {
            out.write_char(self.options.field_delimiter)?;
        }
        out.finish_record()
    }

    fn read_prefix<R: BufRead>(&self, input: &mut RecordReader<R>, _length: usize) -> Result<Option<String>> {
        self.read_field(input, &FieldLayout::default())
    }

    fn read_field<R: BufRead>(&self, input: &mut RecordReader<R>, layout: &FieldLayout) -> Result<Option<String>> {
        if input.at_record_end() {
            return Ok(None);
        }

        let mode = self.quote_mode(layout);
        let quoted = mode != QuoteMode::Never && input.peek() == Some(self.options.quote_character);
        let text = if quoted {
            self.read_quoted(input)?
        } else {
            self.read_raw(input, mode == QuoteMode::Never)?
        };

        if input.peek() == Some(self.options.field_delimiter) {
            input.next_char();
        } else if !input.at_record_end() {
            return Err(self.error(input, "unexpected character after closing quote"));
        }

        if text.is_empty() && !quoted {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn skip_record<R: BufRead>(&self, input: &mut RecordReader<R>) {
        // Field by field, so quoted delimiters and line breaks stay inside their value.
        let layout = FieldLayout::default();
        while !input.at_record_end() {
            if self.read_field(input, &layout).is_err() {
                break;
            }
        }
    }
}
