/// Resolution engine configuration.
///
/// Controls how endpoint calls for independent fields are scheduled. Output
/// never depends on these settings.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Issue the endpoint calls of independent fields (and the nested
    /// resolutions of independent parent records) concurrently instead of
    /// one after another. Defaults to `false` for deterministic call order.
    pub parallel_fetch: bool,
}

impl EngineConfig {
    /// Configuration with concurrent fetching enabled.
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            parallel_fetch: true,
        }
    }
}
