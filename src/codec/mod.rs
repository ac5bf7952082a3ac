//! Field codecs: the character-level half of a record-based format.
//!
//! The engines in [`ser`](crate::ser) and [`de`](crate::de) decide which fields and
//! records to write or read; a [`FieldCodec`] decides how one field's text looks on the
//! wire. [`CsvCodec`] separates fields with a delimiter and quotes them as needed,
//! [`FlrCodec`] places them at fixed widths.

pub mod csv;
pub mod flr;

pub use self::csv::CsvCodec;
pub use self::flr::FlrCodec;

use crate::mapping::{FieldLayout, FieldMapping};
use crate::options::RbfOptions;
use crate::stream::{RecordReader, RecordWriter};
use crate::Result;
use std::io::{BufRead, Write};

pub trait FieldCodec {
    /// Short format name used in log events and error messages.
    fn name(&self) -> &'static str;

    fn rbf_options(&self) -> &RbfOptions;

    /// Rejects field layouts this format cannot encode.
    fn validate_layout(&self, owner: &str, field: &FieldMapping) -> Result<()>;

    /// Writes a record prefix as the first field of a record.
    fn write_prefix<W: Write>(&self, out: &mut RecordWriter<W>, prefix: &str) -> Result<()>;

    /// Writes one field; `None` writes the format's "no value" text.
    fn write_field<W: Write>(
        &self,
        out: &mut RecordWriter<W>,
        text: Option<&str>,
        layout: &FieldLayout,
    ) -> Result<()>;

    /// Terminates the current record.
    fn finish_record<W: Write>(&self, out: &mut RecordWriter<W>) -> Result<()> {
        out.finish_record()
    }

    /// Reads a prefix of `length` characters from the start of the current record.
    fn read_prefix<R: BufRead>(&self, input: &mut RecordReader<R>, length: usize) -> Result<Option<String>>;

    /// Reads one field; `None` when the field is empty or the record has no more fields.
    fn read_field<R: BufRead>(&self, input: &mut RecordReader<R>, layout: &FieldLayout) -> Result<Option<String>>;

    /// Consumes whatever is left of the current record: undeclared trailing fields, or
    /// the body of a record that is skipped.
    fn skip_record<R: BufRead>(&self, input: &mut RecordReader<R>) {
        while !input.at_record_end() {
            input.next_char();
        }
    }
}
