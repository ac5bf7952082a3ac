//! Property-based tests - codec and stream roundtrip guarantees
//!
//! These tests complement the integration tests by checking the quoting, padding and
//! record framing rules across a wide range of generated inputs.

use proptest::prelude::*;
use rbf_codec::codec::{CsvCodec, FieldCodec, FlrCodec};
use rbf_codec::mapping::{ComplexTypeMapping, EntryPoint, FieldLayout, ListTypeMapping, TypeMappingRegistry};
use rbf_codec::stream::{RecordReader, RecordWriter};
use rbf_codec::{Align, CsvIoFactory, CsvOptions, EscapeMode, ObjectRef, QuoteMode, Value};

fn quote_modes() -> impl Strategy<Value = QuoteMode> {
    prop_oneof![
        Just(QuoteMode::Always),
        Just(QuoteMode::OnDemand),
        Just(QuoteMode::Never)
    ]
}

fn escape_modes() -> impl Strategy<Value = EscapeMode> {
    prop_oneof![Just(EscapeMode::Doubling), Just(EscapeMode::EscapeCharacter)]
}

/// Writes `value` followed by a sentinel field, then reads both back.
fn csv_roundtrip(value: &str, quote_mode: QuoteMode, escape_mode: EscapeMode) -> (Option<String>, Option<String>) {
    let codec = CsvCodec::new(CsvOptions::new().with_escape_mode(escape_mode));
    let layout = FieldLayout::new().with_quote_mode(quote_mode);

    let mut out = RecordWriter::new(Vec::new(), codec.rbf_options());
    codec.write_field(&mut out, Some(value), &layout).unwrap();
    codec.write_field(&mut out, Some("end"), &layout).unwrap();
    codec.finish_record(&mut out).unwrap();
    let text = out.into_inner();

    let mut input = RecordReader::new(text.as_slice(), codec.rbf_options());
    assert!(input.read_next_record().unwrap());
    let first = codec.read_field(&mut input, &layout).unwrap();
    let second = codec.read_field(&mut input, &layout).unwrap();
    assert!(!input.read_next_record().unwrap());
    (first, second)
}

proptest! {
    #[test]
    fn prop_csv_quoting_roundtrip(
        value in "[a-z ;\"\\\\\n]{0,16}",
        quote_mode in quote_modes(),
        escape_mode in escape_modes(),
    ) {
        let (first, second) = csv_roundtrip(&value, quote_mode, escape_mode);
        let expected = if value.is_empty() && quote_mode == QuoteMode::Never {
            None
        } else {
            Some(value.clone())
        };
        prop_assert_eq!(first, expected);
        prop_assert_eq!(second, Some("end".to_string()));
    }

    #[test]
    fn prop_flr_fits_length(
        value in "[a-z0-9]{0,20}",
        length in 1usize..12,
        right in any::<bool>(),
        pad in prop_oneof![Just(' '), Just('#'), Just('_')],
    ) {
        let align = if right { Align::Right } else { Align::Left };
        let fitted = FlrCodec::fit(&value, length, align, pad);
        prop_assert_eq!(fitted.chars().count(), length);

        if value.len() >= length {
            prop_assert_eq!(fitted.as_str(), &value[..length]);
        } else if right {
            prop_assert!(fitted.ends_with(value.as_str()));
            prop_assert!(fitted.starts_with(pad));
        } else {
            prop_assert!(fitted.starts_with(value.as_str()));
            prop_assert!(fitted.ends_with(pad));
        }
    }

    #[test]
    fn prop_flr_read_strips_padding(
        value in "[a-z0-9]{1,10}",
        right in any::<bool>(),
    ) {
        let codec = FlrCodec::default();
        let align = if right { Align::Right } else { Align::Left };
        let layout = FieldLayout::fixed(10).with_align(align).with_pad_character('*');
        let line = FlrCodec::fit(&value, 10, align, '*');

        let mut input = RecordReader::new(line.as_bytes(), codec.rbf_options());
        prop_assert!(input.read_next_record().unwrap());
        prop_assert_eq!(codec.read_field(&mut input, &layout).unwrap(), Some(value));
    }
}

fn order_factory() -> CsvIoFactory {
    let mut registry = TypeMappingRegistry::with_standard_types();
    registry
        .register(
            ComplexTypeMapping::new("order", "Order")
                .with_field("id", "int")
                .with_field("note", "string")
                .with_list("lines", "lines"),
        )
        .unwrap();
    registry
        .register(ListTypeMapping::new("lines").with_item("LI", "line", "Line"))
        .unwrap();
    registry
        .register(
            ComplexTypeMapping::new("line", "Line")
                .with_field("sku", "string")
                .with_field("qty", "int"),
        )
        .unwrap();
    CsvIoFactory::csv(registry, vec![EntryPoint::prefixed("order", "OR")], CsvOptions::new()).unwrap()
}

fn arb_order() -> impl Strategy<Value = Value> {
    (
        any::<i64>(),
        proptest::option::of("[A-Za-z0-9 ;\"\n]{0,12}"),
        prop::collection::vec(("[A-Z0-9]{1,6}", 0i64..1000), 0..4),
    )
        .prop_map(|(id, note, lines)| {
            let lines = lines
                .into_iter()
                .map(|(sku, qty)| Value::from(ObjectRef::new("Line").with_field("sku", sku).with_field("qty", qty)))
                .collect::<Vec<_>>();
            Value::from(
                ObjectRef::new("Order")
                    .with_field("id", id)
                    .with_field("note", note)
                    .with_field("lines", lines),
            )
        })
}

proptest! {
    #[test]
    fn prop_order_stream_roundtrip(orders in prop::collection::vec(arb_order(), 0..6)) {
        let factory = order_factory();
        let text = factory.to_string(&orders).unwrap();
        prop_assert_eq!(factory.from_str(&text).unwrap(), orders);
    }
}
