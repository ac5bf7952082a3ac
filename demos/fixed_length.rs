//! A fixed-length payment file with header and detail records.
//!
//! Run with: cargo run --example fixed_length

use chrono::{DateTime, TimeZone, Utc};
use rbf_codec::convert::{DateTimeConverter, EnumConverter};
use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, FieldLayout, SimpleTypeMapping, TypeMappingRegistry};
use rbf_codec::{from_value, to_value, Align, Error, FlrIoFactory, FlrOptions, HeaderLines, RbfOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    sender: String,
    created: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
enum Status {
    Booked,
    Pending,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payment {
    payee: String,
    amount: i64,
    status: Status,
    urgent: bool,
}

fn schema() -> Result<TypeMappingRegistry, Error> {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry.register(
        SimpleTypeMapping::new("day", "Date", DateTimeConverter).with_format(["%Y%m%d"]),
    )?;
    registry.register(
        SimpleTypeMapping::new("status", "Status", EnumConverter).with_format(["Booked=B", "Pending=P"]),
    )?;
    registry.register(
        SimpleTypeMapping::new("flag", "Boolean", rbf_codec::convert::BooleanConverter).with_format(["Y", "N"]),
    )?;
    registry.register(
        ComplexTypeMapping::new("header", "Header")
            .with_field_layout("sender", "string", FieldLayout::fixed(16))
            .with_field_layout("created", "day", FieldLayout::fixed(8)),
    )?;
    registry.register(
        ComplexTypeMapping::new("payment", "Payment")
            .with_field_layout("payee", "string", FieldLayout::fixed(16))
            .with_field_layout(
                "amount",
                "int",
                FieldLayout::fixed(10).with_align(Align::Right).with_pad_character('0'),
            )
            .with_field_layout("status", "status", FieldLayout::fixed(1))
            .with_field_layout("urgent", "flag", FieldLayout::fixed(1)),
    )?;
    Ok(registry)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let entry_points = vec![
        EntryPoint::prefixed("header", "HD"),
        EntryPoint::prefixed("payment", "PM"),
    ];
    let factory = FlrIoFactory::flr(schema()?, entry_points.clone(), FlrOptions::new())?;

    let mut serializer = factory.serializer(Vec::new());
    serializer.write(&to_value(&Header {
        sender: "ACME Treasury".to_string(),
        created: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().ok_or("invalid date")?,
    })?)?;
    for (payee, amount, status, urgent) in [
        ("Globex", 129_900, Status::Booked, false),
        ("Initech", 4_250, Status::Pending, true),
    ] {
        serializer.write(&to_value(&Payment {
            payee: payee.to_string(),
            amount,
            status,
            urgent,
        })?)?;
    }
    let body = serializer.close(false)?.unwrap_or_default();
    let body = String::from_utf8(body)?;

    let file = format!("PAYMENT FILE V1\n{}", body);
    println!("File:\n{}", file);

    // The first physical line is a free-form title, not a record
    let reader = FlrIoFactory::flr(
        schema()?,
        entry_points,
        FlrOptions::new().with_rbf(RbfOptions::new().with_line_filter(HeaderLines(1))),
    )?;
    let mut deserializer = reader.deserializer(file.as_bytes());
    while deserializer.has_next()? {
        let Some(value) = deserializer.next()? else { continue };
        let object_type = value.as_object().map(|o| o.object_type()).unwrap_or_default();
        match object_type.as_str() {
            "Header" => println!("{:?}", from_value::<Header>(value)?),
            _ => println!("{:?}", from_value::<Payment>(value)?),
        }
    }
    println!("Filtered lines: {:?}", deserializer.filtered_lines());

    Ok(())
}
