//! The fixed-length (FLR) field codec.
//!
//! Fields are concatenated without delimiters; each occupies exactly its declared
//! length. Shorter values are padded on the side opposite their alignment, longer
//! values are truncated. A field consisting only of pad characters reads as absent.

use super::FieldCodec;
use crate::mapping::{FieldLayout, FieldMapping};
use crate::options::{Align, FlrOptions, RbfOptions};
use crate::stream::{RecordReader, RecordWriter};
use crate::{Error, Result};
use std::io::{BufRead, Write};

#[derive(Clone, Debug, Default)]
pub struct FlrCodec {
    options: FlrOptions,
}

impl FlrCodec {
    pub fn new(options: FlrOptions) -> Self {
        FlrCodec { options }
    }

    #[must_use]
    pub fn options(&self) -> &FlrOptions {
        &self.options
    }

    /// Pads or truncates `text` to `length` characters.
    #[must_use]
    pub fn fit(text: &str, length: usize, align: Align, pad: char) -> String {
        let count = text.chars().count();
        if count >= length {
            return text.chars().take(length).collect();
        }
        let padding: String = std::iter::repeat(pad).take(length - count).collect();
        match align {
            Align::Left => format!("{}{}", text, padding),
            Align::Right => format!("{}{}", padding, text),
        }
    }

    fn align(&self, layout: &FieldLayout) -> Align {
        layout.align.unwrap_or(self.options.default_align)
    }

    fn pad(&self, layout: &FieldLayout) -> char {
        layout.pad_character.unwrap_or(self.options.default_pad_character)
    }
}

impl FieldCodec for FlrCodec {
    fn name(&self) -> &'static str {
        "flr"
    }

    fn rbf_options(&self) -> &RbfOptions {
        &self.options.rbf
    }

    fn validate_layout(&self, owner: &str, field: &FieldMapping) -> Result<()> {
        match field.layout.length {
            Some(length) if length > 0 => Ok(()),
            _ => Err(Error::configuration(format!(
                "fixed-length field {}.{} requires a positive length",
                owner, field.field_name
            ))),
        }
    }

    fn write_prefix<W: Write>(&self, out: &mut RecordWriter<W>, prefix: &str) -> Result<()> {
        out.begin_field();
        out.write_str(prefix)
    }

    fn write_field<W: Write>(
        &self,
        out: &mut RecordWriter<W>,
        text: Option<&str>,
        layout: &FieldLayout,
    ) -> Result<()> {
        let length = layout
            .length
            .ok_or_else(|| Error::serialization("fixed-length field without length"))?;
        let text = text.unwrap_or_default();
        if let Some(delimiter) = self.options.rbf.special_record_delimiter {
            if text.contains(delimiter) {
                return Err(Error::serialization(format!(
                    "value {:?} contains the special record delimiter {:?}",
                    text, delimiter
                )));
            }
        }
        out.begin_field();
        let fitted = Self::fit(text, length, self.align(layout), self.pad(layout));
        out.write_str(&fitted)
    }

    fn read_prefix<R: BufRead>(&self, input: &mut RecordReader<R>, length: usize) -> Result<Option<String>> {
        let prefix = input.take(length);
        Ok(if prefix.is_empty() { None } else { Some(prefix) })
    }

    fn read_field<R: BufRead>(&self, input: &mut RecordReader<R>, layout: &FieldLayout) -> Result<Option<String>> {
        let length = match layout.length {
            Some(length) => length,
            None => {
                let position = input.position();
                return Err(Error::deserialization(
                    position.line_number,
                    position.column_number,
                    "fixed-length field without length",
                ));
            }
        };
        let raw = input.take(length);
        let pad = self.pad(layout);
        let text = match self.align(layout) {
            Align::Left => raw.trim_end_matches(pad),
            Align::Right => raw.trim_start_matches(pad),
        };
        Ok(if text.is_empty() { None } else { Some(text.to_string()) })
    }
}
