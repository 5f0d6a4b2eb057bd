//! End-to-end binding tests.
//!
//! These drive the public entry points with derived targets the way a route
//! handler would, covering source precedence, both decoder pipelines and the
//! field-error vocabulary.

use archimedes_bind::{
    bind, bind_form, bind_json, bind_map, bind_path, bind_query, Bind, BindConfig, BindContext,
    BindContextBuilder, BindError, BindOptions, Binder, Bound, ConstructionError, FieldDescriptor,
    FromRequest, Json, MapDecoder, ValueMap,
};
use http::{Method, Uri};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize, Bind, PartialEq)]
struct UpdateUser {
    id: String,
    name: String,
    age: i64,
}

#[derive(Debug, Deserialize, Bind, PartialEq)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize, Bind, PartialEq)]
struct Person {
    age: i64,
}

/// Routes the crate's tracing output to the test harness. Set `RUST_LOG`
/// (for example `archimedes_bind=trace`) to see it.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn weak() -> Option<BindOptions> {
    Some(BindOptions::new().weakly_typed_input(true))
}

fn json_ctx(uri: &'static str, body: &'static str) -> BindContext {
    BindContextBuilder::new()
        .method(Method::POST)
        .uri(Uri::from_static(uri))
        .content_type("application/json")
        .body(body)
        .build()
}

fn map(value: serde_json::Value) -> ValueMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn test_merged_binding_scenario() {
    init_tracing();
    let mut ctx = BindContextBuilder::new()
        .method(Method::PUT)
        .uri(Uri::from_static("/users/abc?name=Q&age=99"))
        .content_type("application/json")
        .body(r#"{"name":"J","age":"10"}"#)
        .path_param("id", "abc")
        .build();

    let user: UpdateUser = bind(&mut ctx, weak()).unwrap();

    assert_eq!(
        user,
        UpdateUser {
            id: "abc".into(),
            name: "J".into(),
            age: 10,
        }
    );
}

#[test]
fn test_path_wins_over_query_and_json() {
    let mut ctx = BindContextBuilder::new()
        .uri(Uri::from_static("/users/from-path?id=from-query"))
        .content_type("application/json")
        .body(r#"{"id":"from-json","name":"n","age":1}"#)
        .path_param("id", "from-path")
        .build();

    let user: UpdateUser = bind(&mut ctx, None).unwrap();
    assert_eq!(user.id, "from-path");
}

#[test]
fn test_json_and_form_bodies_both_override_query() {
    let mut json = json_ctx("/?name=query", r#"{"name":"json"}"#);
    let mut form = BindContextBuilder::new()
        .uri(Uri::from_static("/?name=query"))
        .content_type("application/x-www-form-urlencoded")
        .body("name=form")
        .build();

    let from_json: Named = bind(&mut json, None).unwrap();
    let from_form: Named = bind(&mut form, None).unwrap();

    assert_eq!(from_json.name, "json");
    assert_eq!(from_form.name, "form");
}

#[test]
fn test_merged_without_body_media_uses_query_and_path() {
    let mut ctx = BindContextBuilder::new()
        .uri(Uri::from_static("/users/abc?name=Q&age=99"))
        .body("this is not parsed")
        .path_param("id", "abc")
        .build();

    let user: UpdateUser = bind(&mut ctx, weak()).unwrap();
    assert_eq!(user.name, "Q");
    assert_eq!(user.age, 99);
    assert!(ctx.has_body());
}

#[test]
fn test_strict_json_unknown_key() {
    init_tracing();
    let err = bind_json::<Named>(&mut json_ctx("/", r#"{"name":"a","x":1}"#), None).unwrap_err();

    let errors = err.into_field_errors().unwrap();
    assert_eq!(serde_json::to_value(&errors).unwrap(), json!({"x": "unexpected"}));
}

#[test]
fn test_strict_json_repeated_key_in_other_case() {
    let err = bind_json::<Named>(&mut json_ctx("/", r#"{"name":"a","NAME":"b"}"#), None)
        .unwrap_err();

    let errors = err.into_field_errors().unwrap();
    assert_eq!(serde_json::to_value(&errors).unwrap(), json!({"NAME": "unexpected"}));
}

#[test]
fn test_unknown_keys_reported_verbatim() {
    let err = bind_map::<Named>(
        map(json!({"name": "a", "o'brien": 1, "back\\slash": 1, "tab\tkey": 1})),
        None,
    )
    .unwrap_err();

    let errors = err.into_field_errors().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors.get("o'brien"), Some("unexpected"));
    assert_eq!(errors.get("back\\slash"), Some("unexpected"));
    assert_eq!(errors.get("tab\tkey"), Some("unexpected"));
}

#[test]
fn test_generic_type_mismatch() {
    let err = bind_map::<Person>(map(json!({"age": "x"})), None).unwrap_err();

    let errors = err.into_field_errors().unwrap();
    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({"age": "int type expected"})
    );
}

#[test]
fn test_generic_reports_every_problem() {
    init_tracing();
    let err = bind_map::<UpdateUser>(
        map(json!({"id": 1, "name": "n", "age": true, "extra": 1, "more": 2})),
        None,
    )
    .unwrap_err();

    let errors = err.into_field_errors().unwrap();
    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({
            "id": "string type expected",
            "age": "int type expected",
            "extra": "unexpected",
            "more": "unexpected",
        })
    );
}

#[test]
fn test_weak_typing_toggle() {
    let values = json!({"age": "42"});

    let person: Person = bind_map(map(values.clone()), weak()).unwrap();
    assert_eq!(person.age, 42);

    let err = bind_map::<Person>(map(values), None).unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("age"),
        Some("int type expected")
    );
}

#[test]
fn test_unknown_key_rejection_toggle() {
    let values = json!({"age": 1, "nickname": "al"});

    let err = bind_map::<Person>(map(values.clone()), None).unwrap_err();
    assert_eq!(err.field_errors().unwrap().get("nickname"), Some("unexpected"));

    let lenient = Some(BindOptions::new().reject_unknown_keys(false));
    let person: Person = bind_map(map(values), lenient).unwrap();
    assert_eq!(person.age, 1);
}

#[test]
fn test_keys_match_ignoring_case() {
    let ctx = BindContextBuilder::new()
        .uri(Uri::from_static("/?NAME=upper"))
        .build();

    let named: Named = bind_query(&ctx, None).unwrap();
    assert_eq!(named.name, "upper");

    let named: Named = bind_json(&mut json_ctx("/", r#"{"Name":"json"}"#), None).unwrap();
    assert_eq!(named.name, "json");
}

#[test]
fn test_path_and_form_entry_points() {
    let ctx = BindContextBuilder::new().path_param("name", "p").build();
    let named: Named = bind_path(&ctx, None).unwrap();
    assert_eq!(named.name, "p");

    let mut ctx = BindContextBuilder::new()
        .content_type("application/x-www-form-urlencoded")
        .body("name=f&name=ignored")
        .build();
    let named: Named = bind_form(&mut ctx, None).unwrap();
    assert_eq!(named.name, "f");
}

#[test]
fn test_second_body_read_fails() {
    let mut ctx = json_ctx("/", r#"{"name":"a"}"#);

    let _: Named = bind_json(&mut ctx, None).unwrap();
    let err = bind_json::<Named>(&mut ctx, None).unwrap_err();
    assert!(matches!(err, BindError::BodyConsumed));

    ctx.reset_body(r#"{"name":"b"}"#);
    let named: Named = bind_json(&mut ctx, None).unwrap();
    assert_eq!(named.name, "b");
}

#[test]
fn test_malformed_json_is_not_translated() {
    let err = bind_json::<Named>(&mut json_ctx("/", r#"{"name": "a""#), None).unwrap_err();
    assert!(matches!(err, BindError::MalformedJson(_)));
    assert_eq!(err.error_code(), "MALFORMED_JSON");

    let err = bind::<Named>(&mut json_ctx("/", "[1]"), None).unwrap_err();
    assert!(matches!(err, BindError::Decode(_)));
}

#[test]
fn test_missing_field_passes_through() {
    let err = bind_map::<UpdateUser>(map(json!({"id": "a"})), None).unwrap_err();

    assert!(err.field_errors().is_none());
    assert!(err.to_string().contains("missing field"));
}

#[test]
fn test_failing_decoder_factory() {
    init_tracing();
    fn failing(
        _: &'static [FieldDescriptor],
        _: BindOptions,
    ) -> Result<MapDecoder, ConstructionError> {
        Err(ConstructionError::Custom("decoder unavailable".into()))
    }

    let binder = Binder::new().with_decoder_factory(failing);
    let mut ctx = json_ctx("/?name=q", "{}");

    let err = binder.bind::<Named>(&mut ctx, None).unwrap_err();
    assert!(matches!(err, BindError::Construction(_)));
    assert_eq!(err.error_code(), "DECODER_CONSTRUCTION_FAILED");

    // Other binders are unaffected.
    let named: Named = Binder::new()
        .bind_map(map(json!({"name": "ok"})), None)
        .unwrap();
    assert_eq!(named.name, "ok");
}

#[test]
fn test_payload_too_large() {
    let config = BindConfig::from_toml_str("max_body_size = 16").unwrap();
    let binder = Binder::from_config(&config);

    let err = binder
        .bind_json::<Named>(
            &mut json_ctx("/", r#"{"name":"a very long name indeed"}"#),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BindError::PayloadTooLarge {
            limit: 16,
            actual: 34
        }
    ));
}

#[test]
fn test_config_defaults_drive_binder() {
    let config = BindConfig::from_toml_str("weakly_typed_input = true").unwrap();
    let binder = Binder::from_config(&config);

    let person: Person = binder.bind_map(map(json!({"age": "7"})), None).unwrap();
    assert_eq!(person.age, 7);
}

#[test]
fn test_bound_extractor() {
    let mut ctx = BindContextBuilder::new()
        .uri(Uri::from_static("/users/abc?age=5"))
        .content_type("application/json")
        .body(r#"{"name":"J","age":5}"#)
        .path_param("id", "abc")
        .build();

    let Bound(user) = Bound::<UpdateUser>::from_request(&mut ctx).unwrap();
    assert_eq!(user.id, "abc");
    assert_eq!(user.age, 5);
}

#[test]
fn test_result_extractor_surfaces_field_errors() {
    let mut ctx = json_ctx("/", r#"{"name":1}"#);

    let result = <Result<Json<Named>, BindError>>::from_request(&mut ctx).unwrap();
    let err = result.unwrap_err();
    assert_eq!(
        err.field_errors().unwrap().get("name"),
        Some("string type expected")
    );
}
