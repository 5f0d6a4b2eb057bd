//! Content-Type classification for body collectors and the merger.

use mime::Mime;

/// How a request body is encoded, as far as binding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// Any `multipart/*` type.
    Multipart,
    /// `application/json` or any `+json` vendor subtype.
    Json,
    /// Missing, unparsable or unrelated media type.
    Other,
}

impl MediaKind {
    /// Classifies a `Content-Type` header value.
    ///
    /// Parameters such as `charset` or `boundary` are ignored.
    ///
    /// ```rust
    /// use archimedes_bind::MediaKind;
    ///
    /// assert_eq!(MediaKind::from_content_type(Some("application/json; charset=utf-8")), MediaKind::Json);
    /// assert_eq!(MediaKind::from_content_type(Some("application/vnd.api+json")), MediaKind::Json);
    /// assert_eq!(MediaKind::from_content_type(Some("multipart/form-data; boundary=x")), MediaKind::Multipart);
    /// assert_eq!(MediaKind::from_content_type(Some("text/plain")), MediaKind::Other);
    /// assert_eq!(MediaKind::from_content_type(None), MediaKind::Other);
    /// ```
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(mime) = content_type.and_then(|ct| ct.parse::<Mime>().ok()) else {
            return Self::Other;
        };

        if mime.type_() == mime::MULTIPART {
            Self::Multipart
        } else if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Self::UrlEncoded
        } else if mime.essence_str() == mime::APPLICATION_JSON.essence_str()
            || mime.suffix() == Some(mime::JSON)
        {
            Self::Json
        } else {
            Self::Other
        }
    }

    /// True for url-encoded and multipart bodies.
    #[must_use]
    pub fn is_form(self) -> bool {
        matches!(self, Self::UrlEncoded | Self::Multipart)
    }

    /// True for JSON-family bodies.
    #[must_use]
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}
