//! Decoding strictness knobs.

/// Options controlling how a value map is decoded into a record.
///
/// The default is strict: no type coercion, unknown keys rejected. Only the
/// default combination is eligible for the streaming JSON decoder.
///
/// ```rust
/// use archimedes_bind::BindOptions;
///
/// let options = BindOptions::default();
/// assert!(!options.weakly_typed_input);
/// assert!(options.reject_unknown_keys);
/// assert!(options.is_default());
///
/// let lenient = BindOptions::new().weakly_typed_input(true);
/// assert!(!lenient.is_default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindOptions {
    /// Allow textual conversions such as `"10"` to `10` or `"yes"` to `true`.
    pub weakly_typed_input: bool,
    /// Fail when the input holds a key that matches no field.
    pub reject_unknown_keys: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            weakly_typed_input: false,
            reject_unknown_keys: true,
        }
    }
}

impl BindOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets weak-type coercion.
    #[must_use]
    pub fn weakly_typed_input(mut self, enabled: bool) -> Self {
        self.weakly_typed_input = enabled;
        self
    }

    /// Sets unknown-key rejection.
    #[must_use]
    pub fn reject_unknown_keys(mut self, enabled: bool) -> Self {
        self.reject_unknown_keys = enabled;
        self
    }

    /// True when both knobs hold their default values.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
