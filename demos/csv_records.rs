//! Orders with customers and polymorphic order lines in the delimited format.
//!
//! Run with: cargo run --example csv_records

use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, ListTypeMapping, TypeMappingRegistry};
use rbf_codec::{from_value, to_string, CsvIoFactory, CsvOptions, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Customer {
    name: String,
    city: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    sku: String,
    qty: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Comment {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
enum Line {
    Item(Item),
    Comment(Comment),
}

#[derive(Debug, Serialize, Deserialize)]
struct Order {
    id: u32,
    customer: Option<Customer>,
    lines: Vec<Line>,
}

fn schema() -> Result<TypeMappingRegistry, Error> {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry.register(
        ComplexTypeMapping::new("order", "Order")
            .with_field("id", "int")
            .with_record("customer", "customer", "CU")
            .with_list("lines", "lines"),
    )?;
    registry.register(
        ComplexTypeMapping::new("customer", "Customer")
            .with_field("name", "string")
            .with_field("city", "string"),
    )?;
    registry.register(
        ListTypeMapping::new("lines")
            .with_item("IT", "item", "Item")
            .with_item("CM", "comment", "Comment"),
    )?;
    registry.register(
        ComplexTypeMapping::new("item", "Item")
            .with_field("sku", "string")
            .with_field("qty", "int"),
    )?;
    registry.register(ComplexTypeMapping::new("comment", "Comment").with_field("text", "string"))?;
    Ok(registry)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let factory = CsvIoFactory::csv(schema()?, vec![EntryPoint::prefixed("order", "OR")], CsvOptions::new())?;

    let orders = vec![
        Order {
            id: 4711,
            customer: Some(Customer {
                name: "Miller; Sons".to_string(),
                city: "Bremen".to_string(),
            }),
            lines: vec![
                Line::Item(Item {
                    sku: "BOLT".to_string(),
                    qty: 100,
                }),
                Line::Comment(Comment {
                    text: "deliver \"before noon\"".to_string(),
                }),
            ],
        },
        Order {
            id: 4712,
            customer: None,
            lines: vec![Line::Item(Item {
                sku: "NUT".to_string(),
                qty: 250,
            })],
        },
    ];

    let text = to_string(&factory, &orders)?;
    println!("Written:\n{}", text);

    // A damaged record in the middle does not stop the stream
    let damaged = text.replace("IT;NUT;250", "IT;NUT;lots");
    let tampered = format!("{}OR;4713\n", damaged);
    println!("Reading back a damaged copy:");
    let mut deserializer = factory.deserializer(tampered.as_bytes());
    while deserializer.has_next()? {
        match deserializer.next() {
            Ok(Some(value)) => {
                let order: Order = from_value(value)?;
                println!("  {:?}", order);
            }
            Ok(None) => println!("  (empty record)"),
            Err(err) => println!("  skipped: {}", err),
        }
    }

    Ok(())
}
