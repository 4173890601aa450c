//! Per-producer input parameters.

use indexmap::IndexMap;

/// Input parameters of one producer instance.
///
/// Supports the name-indirection used by
/// [`DeclareContext::declare`](crate::DeclareContext::declare): a
/// parameter key maps to the real property name, so the name a producer
/// computes under can be configured without touching its code. Also
/// carries the optional declaration suffix (appended to every declared
/// name so multiple instances of one producer type do not collide) and
/// the `compute` flag.
#[derive(Clone, Debug)]
pub struct ProducerParams {
    names: IndexMap<String, String>,
    suffix: Option<String>,
    compute: bool,
}

impl ProducerParams {
    /// Empty parameter table; `compute` defaults to `true`.
    pub fn new() -> Self {
        Self {
            names: IndexMap::new(),
            suffix: None,
            compute: true,
        }
    }

    /// Map parameter `key` to property name `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.names.insert(key.into(), value.into());
        self
    }

    /// Set the declaration suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Set the `compute` flag. Producers with `compute = false` are not
    /// evaluated; their declared properties are reset instead.
    pub fn with_compute(mut self, compute: bool) -> Self {
        self.compute = compute;
        self
    }

    /// The property name `key` maps to, if configured.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Resolve `key` through the table: the mapped name if configured,
    /// otherwise `key` itself.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    /// The declaration suffix, if configured.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Whether this producer is evaluated.
    pub fn compute(&self) -> bool {
        self.compute
    }
}

impl Default for ProducerParams {
    fn default() -> Self {
        Self::new()
    }
}
