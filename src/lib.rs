//! # rbf_codec
//!
//! Schema-driven serialization of object graphs into record-based text formats.
//!
//! ## What is a record-based format?
//!
//! A record-based format (RBF) stores one object per line. Nested objects either sit
//! inline as further fields of their parent's record, or get records of their own,
//! introduced by a short *prefix* naming their type. Two formats share one engine:
//!
//! - **Delimited (CSV)**: `field (delimiter field)*`, quoted and escaped as needed
//! - **Fixed-length (FLR)**: fields at fixed widths, padded or truncated
//!
//! ## Key Features
//!
//! - **One engine, two codecs**: [`RbfSerializer`] and [`RbfDeserializer`] interpret a
//!   [`TypeMappingRegistry`](mapping::TypeMappingRegistry); a [`FieldCodec`](codec::FieldCodec)
//!   decides how a single field looks on the wire
//! - **Several record types per stream**: entry points are told apart by their prefix,
//!   records with unknown prefixes are skipped
//! - **Validated schemas**: field cycles, prefix collisions and inconsistent prefix
//!   lengths are rejected when a factory is built, before any I/O
//! - **Fault tolerant reading**: a record that fails to decode does not stop the stream
//! - **Serde bridge**: typed Rust values convert to and from the dynamic [`Value`] model
//!
//! ## Quick Start
//!
//! ```rust
//! use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, ListTypeMapping, TypeMappingRegistry};
//! use rbf_codec::{record, CsvIoFactory, CsvOptions};
//!
//! let mut registry = TypeMappingRegistry::with_standard_types();
//! registry.register(
//!     ComplexTypeMapping::new("invoice", "Invoice")
//!         .with_field("number", "string")
//!         .with_record("customer", "customer", "CU")
//!         .with_list("positions", "positions"),
//! ).unwrap();
//! registry.register(ComplexTypeMapping::new("customer", "Customer").with_field("name", "string")).unwrap();
//! registry.register(ListTypeMapping::new("positions").with_item("PO", "position", "Position")).unwrap();
//! registry.register(
//!     ComplexTypeMapping::new("position", "Position")
//!         .with_field("article", "string")
//!         .with_field("amount", "int"),
//! ).unwrap();
//!
//! let factory = CsvIoFactory::csv(
//!     registry,
//!     vec![EntryPoint::prefixed("invoice", "IN")],
//!     CsvOptions::new(),
//! ).unwrap();
//!
//! let invoice = record!("Invoice" {
//!     "number": "2024-001",
//!     "customer": record!("Customer" { "name": "Miller; Sons" }),
//!     "positions": [
//!         record!("Position" { "article": "bolt", "amount": 100 }),
//!         record!("Position" { "article": "nut", "amount": 250 })
//!     ]
//! });
//!
//! let text = factory.to_string(&[invoice.clone()]).unwrap();
//! assert_eq!(text, "IN;2024-001\nCU;\"Miller; Sons\"\nPO;bolt;100\nPO;nut;250\n");
//! assert_eq!(factory.from_str(&text).unwrap(), vec![invoice]);
//! ```
//!
//! ### Typed values
//!
//! [`to_string`] and [`from_str`] go through [`to_value`] and [`from_value`], so any
//! `Serialize`/`Deserialize` type whose struct names match the registered object types
//! can be written directly:
//!
//! ```rust
//! use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, FieldLayout, TypeMappingRegistry};
//! use rbf_codec::{from_str, to_string, FlrIoFactory, FlrOptions};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Account { iban: String, balance: i64 }
//!
//! let mut registry = TypeMappingRegistry::with_standard_types();
//! registry.register(
//!     ComplexTypeMapping::new("account", "Account")
//!         .with_field_layout("iban", "string", FieldLayout::fixed(8))
//!         .with_field_layout("balance", "int", FieldLayout::fixed(6)),
//! ).unwrap();
//! let factory = FlrIoFactory::flr(registry, vec![EntryPoint::new("account")], FlrOptions::new()).unwrap();
//!
//! let accounts = vec![Account { iban: "DE01".to_string(), balance: 1500 }];
//! let text = to_string(&factory, &accounts).unwrap();
//! assert_eq!(text, "DE01    1500  \n");
//! let back: Vec<Account> = from_str(&factory, &text).unwrap();
//! assert_eq!(back, accounts);
//! ```
//!
//! ## Format Specification
//!
//! See the [`format`] module for both wire formats in detail.
//!
//! ## Demos
//!
//! The `demos/` directory holds runnable programs:
//!
//! - **`csv_records.rs`** - orders with customers and polymorphic order lines
//! - **`fixed_length.rs`** - a fixed-length payment file with header and detail records
//!
//! Run any demo with: `cargo run --example <name>`

pub mod access;
pub mod codec;
pub mod convert;
pub mod de;
pub mod error;
pub mod factory;
pub mod format;
pub mod macros;
pub mod map;
pub mod mapping;
pub mod options;
pub mod ser;
pub mod stream;
pub mod value;

pub use codec::{CsvCodec, FieldCodec, FlrCodec};
pub use de::RbfDeserializer;
pub use error::{Error, Result};
pub use factory::{
    CsvDeserializer, CsvIoFactory, CsvSerializer, FlrDeserializer, FlrIoFactory, FlrSerializer,
    RbfIoFactory,
};
pub use map::FieldMap;
pub use options::{Align, CsvOptions, EscapeMode, FlrOptions, HeaderLines, LineFilter, QuoteMode, RbfOptions};
pub use ser::RbfSerializer;
pub use stream::InputPosition;
pub use value::{from_value, to_value, Number, Object, ObjectRef, Value, ValueSerializer};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Serialize typed values into records with the given factory.
///
/// Each value is converted with [`to_value`] first, so its struct name must be an
/// object type known to the factory's entry points.
///
/// # Errors
///
/// Returns an error if a value cannot be converted or written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T, C>(factory: &RbfIoFactory<C>, values: &[T]) -> Result<String>
where
    T: Serialize,
    C: FieldCodec + Clone,
{
    let mut output = Vec::with_capacity(64 * values.len());
    to_writer(factory, &mut output, values)?;
    String::from_utf8(output).map_err(Error::serialization)
}

/// Serialize typed values into records written to `writer`.
///
/// # Errors
///
/// Returns an error if a value cannot be converted or the writer fails.
pub fn to_writer<W, T, C>(factory: &RbfIoFactory<C>, writer: W, values: &[T]) -> Result<()>
where
    W: io::Write,
    T: Serialize,
    C: FieldCodec + Clone,
{
    let mut serializer = factory.serializer(writer);
    for value in values {
        serializer.write(&to_value(value)?)?;
    }
    serializer.flush()
}

/// Deserialize every record of `text` into typed values.
///
/// Records that produce no content are skipped.
///
/// # Errors
///
/// Returns the first error raised by a record or by the conversion into `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T, C>(factory: &RbfIoFactory<C>, text: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    C: FieldCodec + Clone,
{
    from_reader(factory, text.as_bytes())
}

/// Deserialize every record read from `reader` into typed values.
///
/// # Errors
///
/// Returns the first error raised by a record or by the conversion into `T`.
pub fn from_reader<R, T, C>(factory: &RbfIoFactory<C>, reader: R) -> Result<Vec<T>>
where
    R: io::BufRead,
    T: DeserializeOwned,
    C: FieldCodec + Clone,
{
    let mut deserializer = factory.deserializer(reader);
    let mut values = Vec::new();
    while deserializer.has_next()? {
        if let Some(value) = deserializer.next()? {
            values.push(from_value(value)?);
        }
    }
    Ok(values)
}
