//! Procedural macros for `archimedes-bind`.
//!
//! `#[derive(Bind)]` turns a serde-deserializable record into a bind target
//! by generating its field descriptor list at compile time. Use it through
//! the `archimedes_bind::Bind` re-export.
//!
//! # Example
//!
//! ```rust,ignore
//! use archimedes_bind::Bind;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Bind)]
//! #[serde(rename_all = "camelCase")]
//! struct CreateUser {
//!     display_name: String,        // key "displayName"
//!     #[bind(key = "years")]
//!     age: u8,                     // key "years"
//!     #[bind(key = "-")]
//!     internal_note: Option<String>, // never bound
//! }
//! ```
//!
//! # Attributes
//!
//! - `#[bind(key = "...")]`: external key matched against request keys
//!   (defaults to the serde field name). `"-"` means never bind.
//! - `#[bind(skip)]`: never bind.
//! - serde's `rename`, `rename_all`, `skip` and `skip_deserializing` are honored.

mod derive;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `archimedes_bind::Bind` for a struct with named fields.
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::expand_bind(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
