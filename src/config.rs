/// Tunables for the assignment engine and the service around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How many receiver shuffles a partial mass reassignment tries before it
    /// falls back to a full regeneration.
    pub reassign_attempts: usize,
    /// How many times a mutation is retried after losing a compare-and-swap race.
    pub conflict_retries: usize,
}

impl EngineConfig {
    pub const DEFAULT_REASSIGN_ATTEMPTS: usize = 100;
    pub const DEFAULT_CONFLICT_RETRIES: usize = 5;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reassign_attempts: Self::DEFAULT_REASSIGN_ATTEMPTS,
            conflict_retries: Self::DEFAULT_CONFLICT_RETRIES,
        }
    }
}
