//! Binding entry points.
//!
//! Every entry point collects values from its source, inspects the target's
//! [`TargetShape`] once, and runs exactly one of two pipelines:
//!
//! - records go through the [`MapDecoder`] (or, for JSON bodies with default
//!   options, the streaming decoder), with failures translated into
//!   [`FieldErrors`](crate::FieldErrors);
//! - opaque targets are deserialized directly.

use std::any::type_name;

use serde_json::Value;

use crate::body::take_body;
use crate::decode::{decode_strict, DecodeError, DecoderFactory, MapDecoder};
use crate::translate::translate;
use crate::{
    collect_form, collect_json, collect_path, collect_query, merge_sources, Bind, BindConfig,
    BindContext, BindError, BindOptions, BindSource, BodyLimits, FieldDescriptor, TargetShape,
    ValueMap,
};

/// Binds request data into typed targets.
///
/// A `Binder` carries the default [`BindOptions`], the body limits and the
/// constructor used for the [`MapDecoder`]. It holds no per-request state and
/// can be shared freely.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{Bind, BindContextBuilder, BindOptions, Binder};
/// use http::Uri;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Bind)]
/// struct Page {
///     page: u32,
///     per_page: u32,
/// }
///
/// let binder = Binder::new().with_options(BindOptions::new().weakly_typed_input(true));
/// let ctx = BindContextBuilder::new()
///     .uri(Uri::from_static("/items?page=2&per_page=50"))
///     .build();
///
/// let page: Page = binder.bind_query(&ctx, None).unwrap();
/// assert_eq!(page.page, 2);
/// assert_eq!(page.per_page, 50);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Binder {
    options: BindOptions,
    limits: BodyLimits,
    decoder_factory: DecoderFactory,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// Creates a binder with default options and limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: BindOptions::default(),
            limits: BodyLimits::default(),
            decoder_factory: MapDecoder::new,
        }
    }

    /// Creates a binder from loaded configuration.
    #[must_use]
    pub fn from_config(config: &BindConfig) -> Self {
        Self::new()
            .with_options(config.options())
            .with_limits(config.limits())
    }

    /// Sets the options used when a call passes `None`.
    #[must_use]
    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the body limits.
    #[must_use]
    pub fn with_limits(mut self, limits: BodyLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the [`MapDecoder`] constructor.
    ///
    /// ```rust
    /// use archimedes_bind::{
    ///     Bind, BindError, BindOptions, Binder, ConstructionError, FieldDescriptor, MapDecoder,
    ///     ValueMap,
    /// };
    /// use serde::Deserialize;
    ///
    /// fn failing(
    ///     _: &'static [FieldDescriptor],
    ///     _: BindOptions,
    /// ) -> Result<MapDecoder, ConstructionError> {
    ///     Err(ConstructionError::Custom("boom".into()))
    /// }
    ///
    /// #[derive(Debug, Deserialize, Bind)]
    /// struct Empty {}
    ///
    /// let binder = Binder::new().with_decoder_factory(failing);
    /// let err = binder.bind_map::<Empty>(ValueMap::new(), None).unwrap_err();
    /// assert!(matches!(err, BindError::Construction(_)));
    /// ```
    #[must_use]
    pub fn with_decoder_factory(mut self, factory: DecoderFactory) -> Self {
        self.decoder_factory = factory;
        self
    }

    /// Returns the default options.
    #[must_use]
    pub fn options(&self) -> BindOptions {
        self.options
    }

    /// Returns the body limits.
    #[must_use]
    pub fn limits(&self) -> BodyLimits {
        self.limits
    }

    /// Binds the matched path parameters.
    pub fn bind_path<T: Bind>(
        &self,
        ctx: &BindContext,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        self.decode_map(collect_path(ctx), BindSource::Path, options)
    }

    /// Binds the URL query string.
    pub fn bind_query<T: Bind>(
        &self,
        ctx: &BindContext,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        self.decode_map(collect_query(ctx)?, BindSource::Query, options)
    }

    /// Binds a url-encoded or multipart form body. Takes the body.
    pub fn bind_form<T: Bind>(
        &self,
        ctx: &mut BindContext,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        self.decode_map(collect_form(ctx, self.limits)?, BindSource::Form, options)
    }

    /// Binds the JSON body. Takes the body.
    ///
    /// Records bound with default options, and all opaque targets, use the
    /// streaming decoder, which stops at the first problem. Records bound
    /// with any other options go through the value map and report every
    /// problem.
    pub fn bind_json<T: Bind>(
        &self,
        ctx: &mut BindContext,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        let options = options.unwrap_or(self.options);
        let fields = match T::shape() {
            TargetShape::Record(fields) if !options.is_default() => {
                let map = collect_json(ctx, self.limits)?;
                return self.decode_record(map, fields, options, BindSource::Json);
            }
            TargetShape::Record(fields) => Some(fields),
            TargetShape::Opaque => None,
        };

        let body = take_body(ctx, BindSource::Json, self.limits.max_body_size)?;
        tracing::debug!(
            source = %BindSource::Json,
            target_type = type_name::<T>(),
            len = body.len(),
            "streaming decode"
        );
        decode_strict(&body, fields).map_err(|err| translate(err, fields.unwrap_or_default()))
    }

    /// Binds a caller-supplied value map.
    pub fn bind_map<T: Bind>(
        &self,
        map: ValueMap,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        self.decode_map(map, BindSource::Map, options)
    }

    /// Binds every source merged by precedence. Takes the body when it is a
    /// form or JSON body.
    ///
    /// See [`merge_sources`] for the precedence rules.
    pub fn bind<T: Bind>(
        &self,
        ctx: &mut BindContext,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        self.decode_map(merge_sources(ctx, self.limits)?, BindSource::Merged, options)
    }

    fn decode_map<T: Bind>(
        &self,
        map: ValueMap,
        source: BindSource,
        options: Option<BindOptions>,
    ) -> Result<T, BindError> {
        let options = options.unwrap_or(self.options);
        match T::shape() {
            TargetShape::Record(fields) => self.decode_record(map, fields, options, source),
            TargetShape::Opaque => {
                tracing::debug!(%source, target_type = type_name::<T>(), "direct decode");
                serde_path_to_error::deserialize(Value::Object(map))
                    .map_err(|err| translate(DecodeError::Value(err).into(), &[]))
            }
        }
    }

    fn decode_record<T: Bind>(
        &self,
        map: ValueMap,
        fields: &'static [FieldDescriptor],
        options: BindOptions,
        source: BindSource,
    ) -> Result<T, BindError> {
        tracing::debug!(
            %source,
            target_type = type_name::<T>(),
            keys = map.len(),
            weakly_typed_input = options.weakly_typed_input,
            reject_unknown_keys = options.reject_unknown_keys,
            "map decode"
        );
        let decoder = (self.decoder_factory)(fields, options).map_err(|err| {
            tracing::debug!(target_type = type_name::<T>(), error = %err, "decoder construction failed");
            BindError::from(err)
        })?;
        decoder
            .decode(map)
            .map_err(|err| translate(err.into(), fields))
    }
}

/// Binds the matched path parameters with a default [`Binder`].
pub fn bind_path<T: Bind>(ctx: &BindContext, options: Option<BindOptions>) -> Result<T, BindError> {
    Binder::new().bind_path(ctx, options)
}

/// Binds the URL query string with a default [`Binder`].
pub fn bind_query<T: Bind>(
    ctx: &BindContext,
    options: Option<BindOptions>,
) -> Result<T, BindError> {
    Binder::new().bind_query(ctx, options)
}

/// Binds a form body with a default [`Binder`].
pub fn bind_form<T: Bind>(
    ctx: &mut BindContext,
    options: Option<BindOptions>,
) -> Result<T, BindError> {
    Binder::new().bind_form(ctx, options)
}

/// Binds the JSON body with a default [`Binder`].
pub fn bind_json<T: Bind>(
    ctx: &mut BindContext,
    options: Option<BindOptions>,
) -> Result<T, BindError> {
    Binder::new().bind_json(ctx, options)
}

/// Binds a caller-supplied value map with a default [`Binder`].
pub fn bind_map<T: Bind>(map: ValueMap, options: Option<BindOptions>) -> Result<T, BindError> {
    Binder::new().bind_map(map, options)
}

/// Binds every source merged by precedence with a default [`Binder`].
pub fn bind<T: Bind>(ctx: &mut BindContext, options: Option<BindOptions>) -> Result<T, BindError> {
    Binder::new().bind(ctx, options)
}
