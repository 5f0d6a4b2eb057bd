//! Core extractor trait.
//!
//! The [`FromRequest`] trait is the foundation for all extractors.

use crate::{BindContext, BindError};

/// Trait for types that can be extracted from an HTTP request.
///
/// Extraction takes the context mutably because the body can be read only
/// once: the first body extractor takes it, later ones fail with
/// [`BindError::BodyConsumed`].
///
/// # Implementing `FromRequest`
///
/// ```rust
/// use archimedes_bind::{BindContext, BindError, BindSource, FromRequest};
///
/// // Custom extractor for a specific header
/// struct ApiVersion(u32);
///
/// impl FromRequest for ApiVersion {
///     fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
///         let version = ctx
///             .headers()
///             .get("x-api-version")
///             .and_then(|v| v.to_str().ok())
///             .ok_or_else(|| BindError::read(BindSource::Merged, "missing x-api-version"))?;
///
///         version
///             .parse()
///             .map(ApiVersion)
///             .map_err(|_| BindError::read(BindSource::Merged, "expected integer version"))
///     }
/// }
/// ```
///
/// # Tuple Extractors
///
/// Tuples of extractors are extractors, run left to right:
///
/// ```rust
/// use archimedes_bind::{Bind, BindContextBuilder, FromRequest, Json, Path};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Bind)]
/// struct UserPath {
///     id: String,
/// }
///
/// #[derive(Deserialize, Bind)]
/// struct Rename {
///     name: String,
/// }
///
/// let mut ctx = BindContextBuilder::new()
///     .path_param("id", "u1")
///     .content_type("application/json")
///     .body(r#"{"name":"ann"}"#)
///     .build();
///
/// let (Path(user), Json(body)) = <(Path<UserPath>, Json<Rename>)>::from_request(&mut ctx).unwrap();
/// assert_eq!(user.id, "u1");
/// assert_eq!(body.name, "ann");
/// ```
pub trait FromRequest: Sized {
    /// Extracts this type from the request context.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] if extraction fails.
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError>;
}

// Optional extraction: None if it fails
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        Ok(T::from_request(ctx).ok())
    }
}

// Lets handlers inspect the error inline
impl<T: FromRequest> FromRequest for Result<T, BindError> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        Ok(T::from_request(ctx))
    }
}

macro_rules! impl_from_request_for_tuple {
    ($($T:ident),*) => {
        impl<$($T: FromRequest),*> FromRequest for ($($T,)*) {
            fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
                Ok(($($T::from_request(ctx)?,)*))
            }
        }
    };
}

impl_from_request_for_tuple!(T1);
impl_from_request_for_tuple!(T1, T2);
impl_from_request_for_tuple!(T1, T2, T3);
impl_from_request_for_tuple!(T1, T2, T3, T4);
impl_from_request_for_tuple!(T1, T2, T3, T4, T5);
impl_from_request_for_tuple!(T1, T2, T3, T4, T5, T6);

impl FromRequest for () {
    fn from_request(_ctx: &mut BindContext) -> Result<Self, BindError> {
        Ok(())
    }
}
