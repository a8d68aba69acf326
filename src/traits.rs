use crate::types::{ConfigKey, ValueSource};

/// Anything that can answer "where does this configuration value live?".
///
/// Implementations return a reference to the value, never the value itself:
/// a parameter lookup yields a [`ValueSource::Parameter`] the provisioning
/// engine resolves later, so a source never fails synthesis because a stored
/// value is absent or unreadable.
pub trait ConfigSource {
    /// The value source configured for `key`, or `None` if the key is not
    /// configured at all.
    fn lookup(&self, key: ConfigKey) -> Option<ValueSource>;

    /// Human-readable name for log output, e.g. `"parameter-store"`.
    fn source_name(&self) -> &str {
        "config"
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn lookup(&self, key: ConfigKey) -> Option<ValueSource> {
        (**self).lookup(key)
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}
