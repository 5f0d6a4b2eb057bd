//! Path parameter collection and the [`Path`] extractor.

use std::ops::Deref;

use serde_json::Value;

use crate::{Bind, BindContext, BindError, FromRequest, ValueMap};

/// Collects the matched path parameters as string values.
///
/// Route patterns cannot repeat a parameter name, so every key appears once.
#[must_use]
pub fn collect_path(ctx: &BindContext) -> ValueMap {
    let values: ValueMap = ctx
        .path_params()
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    tracing::debug!(source = "path", keys = values.len(), "collected values");
    values
}

/// Extractor binding the matched path parameters into `T`.
///
/// Path values are always text, so numeric fields need weak typing; use
/// [`Binder::bind_path`](crate::Binder::bind_path) with options for that.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{Bind, BindContextBuilder, FromRequest, Path};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Bind)]
/// struct UserPath {
///     user_id: String,
/// }
///
/// let mut ctx = BindContextBuilder::new().path_param("user_id", "u-42").build();
///
/// let Path(path) = Path::<UserPath>::from_request(&mut ctx).unwrap();
/// assert_eq!(path.user_id, "u-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<T>(pub T);

impl<T> Path<T> {
    /// Consumes the Path and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Bind> FromRequest for Path<T> {
    fn from_request(ctx: &mut BindContext) -> Result<Self, BindError> {
        crate::bind_path(ctx, None).map(Path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BindContextBuilder;
    use serde_json::json;

    #[test]
    fn test_collect_path() {
        let ctx = BindContextBuilder::new()
            .path_param("user_id", "42")
            .path_param("post_id", "abc")
            .build();

        let values = collect_path(&ctx);

        assert_eq!(values.len(), 2);
        assert_eq!(values["user_id"], json!("42"));
        assert_eq!(values["post_id"], json!("abc"));
    }

    #[test]
    fn test_collect_path_empty() {
        let ctx = BindContextBuilder::new().build();
        assert!(collect_path(&ctx).is_empty());
    }

    #[test]
    fn test_path_deref() {
        let path = Path(String::from("42"));
        assert_eq!(path.len(), 2);
        assert_eq!(path.into_inner(), "42");
    }
}
