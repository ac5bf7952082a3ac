//! Configuration options for the record-based formats.
//!
//! - [`RbfOptions`]: settings shared by both formats (line break, special record delimiter, line filter)
//! - [`CsvOptions`]: delimiter, quoting and escaping of the delimited format
//! - [`FlrOptions`]: default padding and alignment of the fixed-length format
//!
//! Per-field settings ([`QuoteMode`], length, [`Align`], pad character) are declared on the
//! field's [`FieldLayout`](crate::mapping::FieldLayout); these options only supply defaults.
//!
//! ## Examples
//!
//! ```rust
//! use rbf_codec::{CsvOptions, EscapeMode, QuoteMode};
//!
//! let options = CsvOptions::new()
//!     .with_field_delimiter(',')
//!     .with_escape_mode(EscapeMode::EscapeCharacter)
//!     .with_default_quote_mode(QuoteMode::Always)
//!     .with_delimiter_after_last_field(true);
//! assert_eq!(options.field_delimiter, ',');
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a delimited field is quoted on write and recognized on read.
///
/// ```rust
/// use rbf_codec::QuoteMode;
///
/// assert_eq!(QuoteMode::default(), QuoteMode::OnDemand);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Every value is wrapped in quote characters.
    Always,
    /// Values are quoted only when they contain a character that would break the record.
    #[default]
    OnDemand,
    /// Values are never quoted; special characters are escaped in place.
    Never,
}

/// How a quote character inside a quoted value is escaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeMode {
    /// The quote character is doubled (`"a""b"`).
    #[default]
    Doubling,
    /// The quote character is preceded by the escape character (`"a\"b"`).
    EscapeCharacter,
}

/// Alignment of a fixed-length value inside its field; padding goes to the opposite side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Decides whether a physical line is dropped before it reaches the record layer.
///
/// Returning `true` drops the line. Dropped lines are kept by the deserializer and can be
/// inspected with [`RbfDeserializer::filtered_lines`](crate::RbfDeserializer::filtered_lines).
/// Any `Fn(&str, usize) -> bool` closure is a line filter.
///
/// ```rust
/// use rbf_codec::LineFilter;
///
/// let comments = |line: &str, _line_number: usize| line.starts_with('#');
/// assert!(comments.filter("# generated", 1));
/// assert!(!comments.filter("AB;1", 2));
/// ```
pub trait LineFilter: Send + Sync {
    fn filter(&self, line: &str, line_number: usize) -> bool;
}

impl<F> LineFilter for F
where
    F: Fn(&str, usize) -> bool + Send + Sync,
{
    fn filter(&self, line: &str, line_number: usize) -> bool {
        self(line, line_number)
    }
}

/// Drops the first `n` physical lines of a stream (header lines).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderLines(pub usize);

impl LineFilter for HeaderLines {
    fn filter(&self, _line: &str, line_number: usize) -> bool {
        line_number <= self.0
    }
}

/// Options shared by the delimited and the fixed-length format.
#[derive(Clone, Serialize, Deserialize)]
pub struct RbfOptions {
    /// Written after each record unless a special record delimiter is set.
    pub line_break: String,
    /// When set, records are terminated by this character instead of a line break,
    /// so several records may share one physical line.
    pub special_record_delimiter: Option<char>,
    #[serde(skip)]
    pub line_filter: Option<Arc<dyn LineFilter>>,
}

impl Default for RbfOptions {
    fn default() -> Self {
        RbfOptions {
            line_break: "\n".to_string(),
            special_record_delimiter: None,
            line_filter: None,
        }
    }
}

impl fmt::Debug for RbfOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbfOptions")
            .field("line_break", &self.line_break)
            .field("special_record_delimiter", &self.special_record_delimiter)
            .field("line_filter", &self.line_filter.as_ref().map(|_| ".."))
            .finish()
    }
}

impl RbfOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_line_break(mut self, line_break: impl Into<String>) -> Self {
        self.line_break = line_break.into();
        self
    }

    #[must_use]
    pub fn with_special_record_delimiter(mut self, delimiter: char) -> Self {
        self.special_record_delimiter = Some(delimiter);
        self
    }

    #[must_use]
    pub fn with_line_filter(mut self, filter: impl LineFilter + 'static) -> Self {
        self.line_filter = Some(Arc::new(filter));
        self
    }
}

/// Configuration of the delimited (CSV) format.
///
/// Defaults: `;` as field delimiter, `"` as quote character, `\` as escape character,
/// doubling of quote characters, on-demand quoting, no delimiter after the last field.
///
/// # Examples
///
/// ```rust
/// use rbf_codec::{CsvOptions, QuoteMode};
///
/// let options = CsvOptions::new();
/// assert_eq!(options.field_delimiter, ';');
/// assert_eq!(options.default_quote_mode, QuoteMode::OnDemand);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CsvOptions {
    #[serde(default)]
    pub rbf: RbfOptions,
    pub field_delimiter: char,
    pub quote_character: char,
    pub escape_character: char,
    pub escape_mode: EscapeMode,
    pub default_quote_mode: QuoteMode,
    pub use_delimiter_after_last_field: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            rbf: RbfOptions::default(),
            field_delimiter: ';',
            quote_character: '"',
            escape_character: '\\',
            escape_mode: EscapeMode::default(),
            default_quote_mode: QuoteMode::default(),
            use_delimiter_after_last_field: false,
        }
    }
}

impl CsvOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rbf(mut self, rbf: RbfOptions) -> Self {
        self.rbf = rbf;
        self
    }

    #[must_use]
    pub fn with_field_delimiter(mut self, delimiter: char) -> Self {
        self.field_delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_quote_character(mut self, quote: char) -> Self {
        self.quote_character = quote;
        self
    }

    #[must_use]
    pub fn with_escape_character(mut self, escape: char) -> Self {
        self.escape_character = escape;
        self
    }

    #[must_use]
    pub fn with_escape_mode(mut self, mode: EscapeMode) -> Self {
        self.escape_mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_quote_mode(mut self, mode: QuoteMode) -> Self {
        self.default_quote_mode = mode;
        self
    }

    /// Writes a field delimiter after the last field of every record.
    #[must_use]
    pub fn with_delimiter_after_last_field(mut self, enabled: bool) -> Self {
        self.use_delimiter_after_last_field = enabled;
        self
    }
}

/// Configuration of the fixed-length (FLR) format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlrOptions {
    #[serde(default)]
    pub rbf: RbfOptions,
    pub default_pad_character: char,
    pub default_align: Align,
}

impl Default for FlrOptions {
    fn default() -> Self {
        FlrOptions {
            rbf: RbfOptions::default(),
            default_pad_character: ' ',
            default_align: Align::default(),
        }
    }
}

impl FlrOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rbf(mut self, rbf: RbfOptions) -> Self {
        self.rbf = rbf;
        self
    }

    #[must_use]
    pub fn with_default_pad_character(mut self, pad: char) -> Self {
        self.default_pad_character = pad;
        self
    }

    #[must_use]
    pub fn with_default_align(mut self, align: Align) -> Self {
        self.default_align = align;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lines_filter() {
        let filter = HeaderLines(2);
        assert!(filter.filter("id;name", 1));
        assert!(filter.filter("--;--", 2));
        assert!(!filter.filter("1;Alice", 3));
    }

    #[test]
    fn test_rbf_defaults() {
        let options = RbfOptions::new();
        assert_eq!(options.line_break, "\n");
        assert!(options.special_record_delimiter.is_none());
        assert!(options.line_filter.is_none());
    }

    #[test]
    fn test_flr_builder() {
        let options = FlrOptions::new()
            .with_default_pad_character('0')
            .with_default_align(Align::Right);
        assert_eq!(options.default_pad_character, '0');
        assert_eq!(options.default_align, Align::Right);
    }
}
