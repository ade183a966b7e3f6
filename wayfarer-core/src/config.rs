/// Timing configuration of the planning engines
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a resolved question catalog is reused without asking the server
    pub catalog_ttl_in_seconds: u64,
    /// How long cached draft answers survive on a member's device
    pub answer_cache_ttl_in_seconds: u64,
    /// How long fetched suggestions are served from the cache
    pub suggestion_cache_ttl_in_seconds: u64,
    /// How long after the last interaction a member stops counting as editing a question
    pub edit_quiescence_in_ms: u64,
    /// How often consolidated results are re-aggregated while someone watches them
    pub results_refresh_in_seconds: u64,
}

impl Config {
    pub fn catalog_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.catalog_ttl_in_seconds as i64)
    }

    pub fn answer_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.answer_cache_ttl_in_seconds as i64)
    }

    pub fn suggestion_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.suggestion_cache_ttl_in_seconds as i64)
    }

    pub fn edit_quiescence(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.edit_quiescence_in_ms as i64)
    }

    pub fn results_refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.results_refresh_in_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_ttl_in_seconds: 60 * 5,
            answer_cache_ttl_in_seconds: 60 * 60 * 24,
            suggestion_cache_ttl_in_seconds: 60 * 10,
            // Long enough to outlast the gap between keystrokes
            edit_quiescence_in_ms: 100,
            results_refresh_in_seconds: 5,
        }
    }
}
