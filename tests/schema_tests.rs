//! Schema validation through the public factories.
//!
//! Every rejected schema must fail when the factory is built, before any record is
//! written or read.

use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, FieldLayout, ListTypeMapping, TypeMappingRegistry};
use rbf_codec::{CsvIoFactory, CsvOptions, Error, FlrIoFactory, FlrOptions};

fn csv(registry: TypeMappingRegistry, entry_points: Vec<EntryPoint>) -> Result<CsvIoFactory, Error> {
    CsvIoFactory::csv(registry, entry_points, CsvOptions::new())
}

fn assert_rejected(result: Result<CsvIoFactory, Error>, needle: &str) {
    match result {
        Ok(_) => panic!("schema should be rejected ({})", needle),
        Err(err) => {
            assert!(err.is_configuration(), "unexpected error kind: {:?}", err);
            assert!(err.to_string().contains(needle), "{} does not mention {}", err, needle);
        }
    }
}

#[test]
fn test_duplicate_record_prefix() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("invoice", "Invoice")
                .with_field("number", "string")
                .with_record("billing", "address", "AD")
                .with_record("shipping", "address", "AD"),
        )
        .unwrap();
    registry
        .register(ComplexTypeMapping::new("address", "Address").with_field("city", "string"))
        .unwrap();

    assert_rejected(
        csv(registry, vec![EntryPoint::prefixed("invoice", "IN")]),
        "not contextually unique",
    );
}

#[test]
fn test_entry_prefix_reused_below_earlier_entry() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("invoice", "Invoice")
                .with_field("number", "string")
                .with_record("note", "note", "NO"),
        )
        .unwrap();
    registry
        .register(ComplexTypeMapping::new("note", "Note").with_field("text", "string"))
        .unwrap();

    assert_rejected(
        csv(
            registry,
            vec![EntryPoint::prefixed("invoice", "IN"), EntryPoint::prefixed("note", "NO")],
        ),
        "is not unique",
    );
}

#[test]
fn test_entry_prefix_reused_below_later_entry() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("invoice", "Invoice")
                .with_field("number", "string")
                .with_record("note", "note", "NO"),
        )
        .unwrap();
    registry
        .register(ComplexTypeMapping::new("note", "Note").with_field("text", "string"))
        .unwrap();

    assert_rejected(
        csv(
            registry,
            vec![EntryPoint::prefixed("note", "NO"), EntryPoint::prefixed("invoice", "IN")],
        ),
        "prefix NO of entry point note is not unique",
    );
}

#[test]
fn test_entry_prefix_reused_below_itself() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry.reserve("node").unwrap();
    registry
        .register(
            ComplexTypeMapping::new("node", "Node")
                .with_field("label", "string")
                .with_list("children", "nodes"),
        )
        .unwrap();
    registry
        .register(ListTypeMapping::new("nodes").with_item("ND", "node", "Node"))
        .unwrap();

    assert_rejected(
        csv(registry, vec![EntryPoint::prefixed("node", "ND")]),
        "prefix ND of entry point node is not unique",
    );
}

#[test]
fn test_self_field_rejected() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry.reserve("node").unwrap();
    registry
        .register(
            ComplexTypeMapping::new("node", "Node")
                .with_field("label", "string")
                .with_field("next", "node"),
        )
        .unwrap();

    assert_rejected(csv(registry, vec![EntryPoint::new("node")]), "cyclic field node.next");
}

#[test]
fn test_record_list_of_self_accepted() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry.reserve("folder").unwrap();
    registry
        .register(
            ComplexTypeMapping::new("folder", "Folder")
                .with_field("name", "string")
                .with_list("children", "folders"),
        )
        .unwrap();
    registry
        .register(ListTypeMapping::new("folders").with_item("FO", "folder", "Folder"))
        .unwrap();

    let factory = csv(registry, vec![EntryPoint::prefixed("folder", "RT")]).unwrap();
    assert_eq!(factory.entry_points().len(), 1);
}

#[test]
fn test_inconsistent_entry_prefix_lengths() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(ComplexTypeMapping::new("a", "A").with_field("x", "string"))
        .unwrap();
    registry
        .register(ComplexTypeMapping::new("b", "B").with_field("y", "string"))
        .unwrap();

    assert_rejected(
        csv(registry, vec![EntryPoint::prefixed("a", "A1"), EntryPoint::prefixed("b", "B22")]),
        "differs in length",
    );
}

#[test]
fn test_unknown_data_type() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(ComplexTypeMapping::new("a", "A").with_field("x", "money"))
        .unwrap();

    let err = csv(registry, vec![EntryPoint::new("a")]).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("money"));
}

#[test]
fn test_unknown_entry_point() {
    let registry = TypeMappingRegistry::with_standard_types();
    let err = csv(registry, vec![EntryPoint::new("missing")]).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_no_entry_points() {
    assert_rejected(
        csv(TypeMappingRegistry::with_standard_types(), vec![]),
        "at least one entry point",
    );
}

#[test]
fn test_empty_list_rejected() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("order", "Order")
                .with_field("id", "int")
                .with_list("lines", "lines"),
        )
        .unwrap();
    registry.register(ListTypeMapping::new("lines")).unwrap();

    assert_rejected(
        csv(registry, vec![EntryPoint::prefixed("order", "OR")]),
        "declares no member types",
    );
}

#[test]
fn test_duplicate_registration_rejected() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(ComplexTypeMapping::new("a", "A").with_field("x", "string"))
        .unwrap();
    let err = registry
        .register(ComplexTypeMapping::new("a", "A").with_field("y", "string"))
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_fixed_length_fields_need_length() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("account", "Account")
                .with_field_layout("iban", "string", FieldLayout::fixed(22))
                .with_field("owner", "string"),
        )
        .unwrap();

    let err = FlrIoFactory::flr(registry, vec![EntryPoint::new("account")], FlrOptions::new()).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("account.owner requires a positive length"));
}

#[test]
fn test_same_schema_serves_both_formats() {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("account", "Account")
                .with_field_layout("iban", "string", FieldLayout::fixed(22))
                .with_field_layout("owner", "string", FieldLayout::fixed(30)),
        )
        .unwrap();
    let registry = std::sync::Arc::new(registry);

    assert!(CsvIoFactory::csv(registry.clone(), vec![EntryPoint::new("account")], CsvOptions::new()).is_ok());
    assert!(FlrIoFactory::flr(registry, vec![EntryPoint::new("account")], FlrOptions::new()).is_ok());
}
