use rbf_codec::{record, Number, ObjectRef, Value};

#[test]
fn test_record_macro_scalars() {
    let value = record!("Reading" {
        "sensor": "t1",
        "value": 21.5,
        "count": 3,
        "ok": true
    });

    let reading = value.as_object().unwrap();
    assert_eq!(reading.object_type(), "Reading");
    assert_eq!(reading.get("sensor"), Value::String("t1".to_string()));
    assert_eq!(reading.get("value"), Value::Number(Number::Float(21.5)));
    assert_eq!(reading.get("count"), Value::Number(Number::Integer(3)));
    assert_eq!(reading.get("ok"), Value::Bool(true));
}

#[test]
fn test_record_macro_negative_and_expressions() {
    let base = 40;
    let value = record!("Account" {
        "balance": -123,
        "limit": base + 2,
        "owner": format!("{}-{}", "acct", base)
    });

    let account = value.as_object().unwrap();
    assert_eq!(account.get("balance"), Value::from(-123));
    assert_eq!(account.get("limit"), Value::from(42));
    assert_eq!(account.get("owner"), Value::from("acct-40"));
}

#[test]
fn test_record_macro_null_matches_missing() {
    let with_null = record!("Person" { "name": "Alice", "nickname": null });
    let without = record!("Person" { "name": "Alice" });

    assert!(with_null.as_object().unwrap().get("nickname").is_null());
    assert_eq!(with_null, without);
}

#[test]
fn test_record_macro_lists() {
    let value = record!("Order" {
        "id": 1,
        "empty": [],
        "tags": ["a", "b",],
        "lines": [
            record!("Item" { "sku": "A1", "qty": 2 }),
            record!("Comment" { "text": "fragile" })
        ]
    });

    let order = value.as_object().unwrap();
    assert_eq!(order.get("empty"), Value::List(vec![]));
    assert_eq!(
        order.get("tags"),
        Value::List(vec![Value::from("a"), Value::from("b")])
    );

    let lines = order.get("lines");
    let lines = lines.as_list().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].as_object().unwrap().object_type(), "Item");
    assert_eq!(lines[1].as_object().unwrap().object_type(), "Comment");
}

#[test]
fn test_record_macro_nested() {
    let value = record!("Invoice" {
        "number": "2024-001",
        "customer": record!("Customer" {
            "name": "Miller",
            "address": record!("Address" { "city": "Bremen" })
        })
    });

    let city = value
        .as_object()
        .unwrap()
        .get("customer")
        .as_object()
        .unwrap()
        .get("address")
        .as_object()
        .unwrap()
        .get("city");
    assert_eq!(city, Value::from("Bremen"));
}

#[test]
fn test_record_macro_equals_builder() {
    let built = ObjectRef::new("Payment")
        .with_field("payee", "ACME")
        .with_field("amount", 990);
    assert_eq!(
        record!("Payment" { "payee": "ACME", "amount": 990 }),
        Value::Object(built)
    );
}

#[test]
fn test_record_macro_objects_are_distinct() {
    let a = record!("Item" { "sku": "A1" });
    let b = record!("Item" { "sku": "A1" });

    let (a, b) = (a.as_object().unwrap(), b.as_object().unwrap());
    assert_eq!(a, b);
    assert!(!a.ptr_eq(b));
    assert_ne!(a.id(), b.id());
}
