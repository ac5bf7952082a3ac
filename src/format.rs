//! Record-Based Format Specification
//!
//! This module documents the two record-based formats as implemented by this library.
//!
//! # Overview
//!
//! A stream is a sequence of *records*. A record is one physical line or, when a special
//! record delimiter is configured, one delimiter-terminated segment of a line. Each
//! record holds the fields of exactly one object.
//!
//! ## Design Philosophy
//!
//! - **Flat records**: nested objects either flatten into their parent's record or get
//!   records of their own; there is no nesting syntax
//! - **Prefix dispatch**: a short token at the start of a record tells the reader which
//!   type it holds
//! - **Positional fields**: fields carry no names; their order is the schema's order
//! - **Lenient field counts**: missing trailing fields read as absent, extra ones are ignored
//!
//! # Record Structure
//!
//! ## Prefixes
//!
//! Streams with several entry points are *prefixed*: every record starts with a prefix.
//! Sub-records and list items always start with one.
//!
//! ```text
//! OR;4711;2024-03-01       <- entry point "order", prefix OR
//! CU;Miller                <- sub-record "customer", prefix CU
//! IT;bolt;100              <- list item of type Item, prefix IT
//! CM;deliver before noon   <- list item of type Comment, prefix CM
//! OR;4712;2024-03-02       <- next order
//! ```
//!
//! **Rules**:
//! - Prefixes in one sibling context (the entry points; the records of one type) share a length
//! - A prefix may not repeat any prefix used by an earlier sibling or anywhere below it
//! - An entry point's prefix may not appear below any entry point, its own included
//! - Records with a prefix that names no entry point are skipped at the top level
//!
//! ## Record Order
//!
//! An object's record is followed by its sub-records in declared order, each followed by
//! its own descendants. A list contributes one record per item. Absent sub-records and
//! lists contribute nothing.
//!
//! ## Flattened Fields
//!
//! A field whose type is complex contributes its own fields, in order, to the parent's
//! record. An absent nested object contributes one empty field per leaf, so positions
//! stay aligned.
//!
//! # Delimited Format (CSV)
//!
//! ```text
//! record := field (delimiter field)* [delimiter] line-break
//! ```
//!
//! | Setting | Default |
//! |---------|---------|
//! | Field delimiter | `;` |
//! | Quote character | `"` |
//! | Escape character | `\` |
//! | Escape mode | doubling |
//! | Quote mode | on demand |
//!
//! ## Quoting
//!
//! | Mode | Written as |
//! |------|------------|
//! | Always | `"value"` |
//! | On demand | `"value"` if the value is empty or contains the delimiter, the quote or escape character, a line break or the special record delimiter; `value` otherwise |
//! | Never | `value` with the delimiter, escape character, line breaks and special record delimiter preceded by the escape character |
//!
//! Inside quotes the quote character is doubled (`"a""b"`) or escaped (`"a\"b"`), per
//! escape mode. With the escape character mode the escape character is escaped as well.
//!
//! ## Line Breaks in Values
//!
//! A quoted value may contain real line breaks and so span several physical lines; the
//! reader joins them and decodes the break as `\n`. In `Never` mode an escape character
//! at the end of a physical line stands for a line break in the value.
//!
//! ## Empty Values
//!
//! | Text | Reads as |
//! |------|----------|
//! | (nothing) | absent |
//! | `""` | empty string |
//!
//! # Fixed-Length Format (FLR)
//!
//! ```text
//! record := prefix? field* line-break
//! ```
//!
//! Every field has a declared length. Values are aligned left or right and padded with
//! the pad character (default: space) on the other side:
//!
//! ```text
//! abc####   <- "abc", length 7, left aligned, pad '#'
//! 0000042   <- "42", length 7, right aligned, pad '0'
//! 1234567   <- "12345678", length 7: truncated
//! ```
//!
//! On read, the pad character is stripped from the side opposite the alignment; a field
//! of pad characters only is absent. A line shorter than its fields reads the missing
//! fields as absent.
//!
//! # Limitations
//!
//! - **Empty strings**: only the delimited format with quoting keeps them apart from absent values
//! - **Lists**: list fields read back as empty lists when no item record follows
//! - **Recursive lists**: a type with a list of itself reads greedily, so an item's trailing
//!   siblings attach to the deepest open list
//! - **Pad characters**: a fixed-length value made only of pad characters reads as absent
//! - **Special record delimiter**: fixed-length values may not contain it; writing such a
//!   value is a serialization error

// This module contains only documentation; no implementation code
