//! Integration tests for `#[derive(Bind)]`.
//!
//! Checks that serde renames, `#[bind(...)]` keys and skipped fields reach
//! both decoders and the field-error messages.

use archimedes_bind::{
    bind_json, bind_map, bind_query, Bind, BindContextBuilder, BindOptions, FieldKind, Nested,
    TargetShape, ValueMap,
};
use http::Uri;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Address {
    city: String,
}

#[derive(Debug, Deserialize, Bind, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Signup {
    user_name: String,
    #[bind(key = "years")]
    age: u8,
    address: Address,
    nickname: Option<String>,
    #[serde(skip)]
    token: String,
}

fn map(value: serde_json::Value) -> ValueMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn shape_fields() -> Vec<(&'static str, Option<&'static str>, FieldKind)> {
    match Signup::shape() {
        TargetShape::Record(fields) => fields.iter().map(|f| (f.name, f.key, f.kind)).collect(),
        TargetShape::Opaque => panic!("derived targets are records"),
    }
}

/// The derive records serde names, bound keys and declared kinds.
#[test]
fn test_descriptors() {
    assert_eq!(
        shape_fields(),
        vec![
            ("userName", Some("userName"), FieldKind::String),
            ("age", Some("years"), FieldKind::Uint),
            ("address", Some("address"), FieldKind::Named("Address", Nested::NONE)),
            ("nickname", Some("nickname"), FieldKind::String),
            ("token", None, FieldKind::String),
        ]
    );
}

/// Bound keys feed the renamed fields on the strict JSON path.
#[test]
fn test_strict_json_with_keys() {
    let mut ctx = BindContextBuilder::new()
        .content_type("application/json")
        .body(r#"{"userName":"ann","years":30,"address":{"city":"Oslo"}}"#)
        .build();

    let signup: Signup = bind_json(&mut ctx, None).unwrap();

    assert_eq!(signup.user_name, "ann");
    assert_eq!(signup.age, 30);
    assert_eq!(signup.address.city, "Oslo");
    assert_eq!(signup.nickname, None);
    assert!(signup.token.is_empty());
}

/// The same request binds through the generic decoder.
#[test]
fn test_generic_with_keys() {
    let values = json!({
        "USERNAME": "ann",
        "years": "30",
        "address": {"city": "Oslo"},
        "nickname": "a",
    });

    let options = BindOptions::new().weakly_typed_input(true);
    let signup: Signup = bind_map(map(values), Some(options)).unwrap();

    assert_eq!(signup.user_name, "ann");
    assert_eq!(signup.age, 30);
    assert_eq!(signup.nickname.as_deref(), Some("a"));
}

/// Skipped fields and serde names are not bindable keys.
#[test]
fn test_skipped_and_unbound_names_are_unexpected() {
    let values = json!({
        "userName": "ann",
        "years": 1,
        "address": {"city": "x"},
        "token": "t",
        "age": 2,
    });

    let err = bind_map::<Signup>(map(values), None).unwrap_err();
    let errors = err.into_field_errors().unwrap();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors.get("token"), Some("unexpected"));
    assert_eq!(errors.get("age"), Some("unexpected"));
}

/// A skipped field sent in a JSON body is reported by the strict decoder.
#[test]
fn test_strict_rejects_skipped_field() {
    let mut ctx = BindContextBuilder::new()
        .content_type("application/json")
        .body(r#"{"userName":"ann","years":1,"address":{"city":"x"},"token":"t"}"#)
        .build();

    let err = bind_json::<Signup>(&mut ctx, None).unwrap_err();
    assert_eq!(err.field_errors().unwrap().get("token"), Some("unexpected"));
}

/// Mismatches are keyed by the bound key and labelled by the declared type.
#[test]
fn test_mismatch_messages_use_keys_and_labels() {
    let err = bind_map::<Signup>(
        map(json!({"userName": "ann", "years": "x", "address": {"city": "x"}})),
        None,
    )
    .unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("years"),
        Some("uint type expected")
    );

    let err = bind_map::<Signup>(
        map(json!({"userName": "ann", "years": 3, "address": "nowhere"})),
        None,
    )
    .unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("address"),
        Some("Address type expected")
    );
}

/// A strict-path type error on a renamed field is reported under its key.
#[test]
fn test_strict_mismatch_on_renamed_field() {
    let mut ctx = BindContextBuilder::new()
        .content_type("application/json")
        .body(r#"{"userName":"ann","years":"old","address":{"city":"x"}}"#)
        .build();

    let err = bind_json::<Signup>(&mut ctx, None).unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("years"),
        Some("uint type expected")
    );
}

#[derive(Debug, Deserialize, Bind, PartialEq)]
struct Home {
    zip: u32,
    #[bind(key = "st")]
    street: String,
}

#[derive(Debug, Deserialize, Bind, PartialEq)]
struct Household {
    #[serde(default)]
    ids: Vec<u32>,
    home: Option<Home>,
    #[serde(default)]
    past: Vec<Home>,
}

fn json_body(body: &'static str) -> archimedes_bind::BindContext {
    BindContextBuilder::new()
        .content_type("application/json")
        .body(body)
        .build()
}

/// Derived records link their nested records' descriptors.
#[test]
fn test_nested_record_descriptors() {
    let TargetShape::Record(fields) = Household::shape() else {
        panic!("derived targets are records");
    };

    assert_eq!(fields[0].kind, FieldKind::Array(&FieldKind::Uint));
    let home = fields[1].kind.nested_fields().unwrap();
    assert_eq!(home[1].key, Some("st"));
    match fields[2].kind {
        FieldKind::Array(element) => assert_eq!(element.nested_fields().map(<[_]>::len), Some(2)),
        other => panic!("unexpected kind: {other:?}"),
    }
}

/// Weak typing converts sequence elements and nested record values.
#[test]
fn test_weak_typing_reaches_nested_values() {
    let ctx = BindContextBuilder::new()
        .uri(Uri::from_static("/?ids=7"))
        .build();
    let weak = Some(BindOptions::new().weakly_typed_input(true));

    let household: Household = bind_query(&ctx, weak).unwrap();
    assert_eq!(household.ids, vec![7]);

    let household: Household = bind_map(
        map(json!({"home": {"zip": "123", "ST": "Main"}, "past": [{"zip": "9", "st": "Old"}]})),
        weak,
    )
    .unwrap();
    assert_eq!(
        household.home,
        Some(Home {
            zip: 123,
            street: "Main".into(),
        })
    );
    assert_eq!(household.past[0].zip, 9);

    let mut ctx = json_body(r#"{"home":{"zip":"123","st":"Main"}}"#);
    let household: Household = bind_json(&mut ctx, weak).unwrap();
    assert_eq!(household.home.map(|home| home.zip), Some(123));
}

/// Nested mismatches are reported under their key path.
#[test]
fn test_nested_mismatch_paths() {
    let err = bind_map::<Household>(
        map(json!({"ids": [1, "x"], "home": {"zip": "123", "st": "Main"}})),
        None,
    )
    .unwrap_err();
    let errors = err.into_field_errors().unwrap();

    assert_eq!(errors.get("ids[1]"), Some("uint type expected"));
    assert_eq!(errors.get("home.zip"), Some("uint type expected"));

    let mut ctx = json_body(r#"{"home":{"zip":1,"st":2}}"#);
    let err = bind_json::<Household>(&mut ctx, None).unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("home.st"),
        Some("string type expected")
    );
}

/// Unknown keys inside nested records are rejected on both decoders.
#[test]
fn test_nested_unknown_keys_rejected() {
    let body = r#"{"home":{"zip":1,"st":"a","bogus":2},"past":[{"zip":1,"st":"b","extra":3}]}"#;

    let err = bind_json::<Household>(&mut json_body(body), None).unwrap_err();
    let errors = err.into_field_errors().unwrap();
    assert_eq!(errors.get("home.bogus"), Some("unexpected"));

    let values: serde_json::Value = serde_json::from_str(body).unwrap();
    let err = bind_map::<Household>(map(values.clone()), None).unwrap_err();
    let errors = err.into_field_errors().unwrap();
    assert_eq!(errors.get("home.bogus"), Some("unexpected"));
    assert_eq!(errors.get("past[0].extra"), Some("unexpected"));

    let lenient = Some(BindOptions::new().reject_unknown_keys(false));
    let household: Household = bind_map(map(values), lenient).unwrap();
    assert_eq!(household.past[0].street, "b");
}
