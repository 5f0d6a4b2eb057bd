//! # Archimedes Bind
//!
//! Request data binding for the Archimedes HTTP framework.
//!
//! This crate turns the parts of an HTTP request (matched path parameters,
//! query string, form body, JSON body) into typed records, and reports decode
//! failures as field-level errors that handlers can render directly.
//!
//! ## Sources and extractors
//!
//! | Extractor | Binder method | Source |
//! |-----------|---------------|--------|
//! | [`Path<T>`] | [`Binder::bind_path`] | Matched path parameters |
//! | [`Query<T>`] | [`Binder::bind_query`] | URL query string |
//! | [`Form<T>`] | [`Binder::bind_form`] | Url-encoded or multipart body |
//! | [`Json<T>`] | [`Binder::bind_json`] | JSON body |
//! | [`Bound<T>`] | [`Binder::bind`] | All of the above, merged |
//! | | [`Binder::bind_map`] | A caller-supplied [`ValueMap`] |
//!
//! Merged binding applies a fixed precedence, lowest to highest: query, form
//! body, JSON body, path.
//!
//! ## Targets
//!
//! Records derive [`Bind`] alongside serde's `Deserialize`; the derive records
//! each field's external key and declared type at compile time. Scalars,
//! sequences, string-keyed maps and [`serde_json::Value`] bind as opaque
//! targets, deserialized directly.
//!
//! ## Strictness
//!
//! [`BindOptions`] has two knobs: weak typing (`"10"` binds into an integer)
//! and unknown-key rejection. The default is strict on both counts.
//!
//! ## Example
//!
//! ```rust
//! use archimedes_bind::{Bind, BindContextBuilder, BindOptions, Binder};
//! use http::Uri;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, Bind)]
//! struct UpdateUser {
//!     id: String,
//!     name: String,
//!     age: i64,
//! }
//!
//! let mut ctx = BindContextBuilder::new()
//!     .uri(Uri::from_static("/users/abc?name=Q&age=99"))
//!     .content_type("application/json")
//!     .body(r#"{"name": "J", "age": "10"}"#)
//!     .path_param("id", "abc")
//!     .build();
//!
//! let options = BindOptions::new().weakly_typed_input(true);
//! let user: UpdateUser = Binder::new().bind(&mut ctx, Some(options)).unwrap();
//!
//! assert_eq!(user.id, "abc");
//! assert_eq!(user.name, "J");
//! assert_eq!(user.age, 10);
//! ```
//!
//! ## Error Handling
//!
//! Every entry point returns [`BindError`]. Failures attributable to fields
//! arrive as [`BindError::Fields`]; anything else (unreadable bodies,
//! malformed JSON, unrecognized decoder failures) is passed through.
//!
//! ```rust
//! use archimedes_bind::{Bind, BindContextBuilder, BindError};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, Bind)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! let mut ctx = BindContextBuilder::new()
//!     .content_type("application/json")
//!     .body(r#"{"name": "a", "x": 1}"#)
//!     .build();
//!
//! match archimedes_bind::bind_json::<CreateUser>(&mut ctx, None) {
//!     Err(BindError::Fields(errors)) => assert_eq!(errors.get("x"), Some("unexpected")),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/archimedes-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Lets `#[derive(Bind)]` output refer to `::archimedes_bind` inside this crate.
extern crate self as archimedes_bind;

mod binder;
mod body;
mod config;
mod context;
pub mod decode;
mod descriptor;
mod error;
mod extractor;
mod form;
mod json;
mod media;
mod merge;
mod multipart;
mod options;
mod params;
mod path;
mod query;
pub mod translate;

pub use binder::{bind, bind_form, bind_json, bind_map, bind_path, bind_query, Binder};
pub use config::{
    BindConfig, BodyLimits, ConfigError, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_MULTIPART_FIELDS,
};
pub use context::{BindContext, BindContextBuilder};
pub use decode::{ConstructionError, DecodeError, DecodeFailure, DecoderFactory, MapDecoder};
pub use descriptor::{
    find_field, Bind, FieldDescriptor, FieldKind, Nested, TargetShape, ValueMap,
};
pub use error::{BindError, BindSource, FieldErrors};
pub use extractor::FromRequest;
pub use form::{collect_form, Form};
pub use json::{collect_json, Json};
pub use media::MediaKind;
pub use merge::{merge_sources, Bound};
pub use options::BindOptions;
pub use params::Params;
pub use path::{collect_path, Path};
pub use query::{collect_query, Query};

/// Derives [`Bind`] for a struct with named fields.
#[cfg(feature = "derive")]
pub use archimedes_bind_macros::Bind;

#[doc(hidden)]
pub mod __private {
    use std::marker::PhantomData;

    use crate::{Bind, TargetShape};

    pub use serde::de::DeserializeOwned;

    /// Stand-in for a field type while its shape is looked up.
    ///
    /// `(&&ShapeTag::<T>::new()).shape_of()` picks [`BindShape`] when `T`
    /// implements [`Bind`] and falls back to [`OpaqueShape`] otherwise.
    pub struct ShapeTag<T: ?Sized>(PhantomData<T>);

    impl<T: ?Sized> ShapeTag<T> {
        /// Creates the tag.
        #[must_use]
        pub const fn new() -> Self {
            Self(PhantomData)
        }
    }

    /// Shape of a field type implementing [`Bind`].
    pub trait BindShape {
        /// Returns the type's shape.
        fn shape_of(&self) -> TargetShape;
    }

    impl<T: Bind> BindShape for &ShapeTag<T> {
        fn shape_of(&self) -> TargetShape {
            T::shape()
        }
    }

    /// Shape of any other field type.
    pub trait OpaqueShape {
        /// Returns [`TargetShape::Opaque`].
        fn shape_of(&self) -> TargetShape;
    }

    impl<T: ?Sized> OpaqueShape for ShapeTag<T> {
        fn shape_of(&self) -> TargetShape {
            TargetShape::Opaque
        }
    }
}
