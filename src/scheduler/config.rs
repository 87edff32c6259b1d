//! Scheduler configuration.

/// What a flush does with its remaining jobs after one fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Keep running the rest of the flush.
    #[default]
    Continue,
    /// Stop the flush and carry the unrun jobs over to the next one.
    Abort,
}

/// Scheduler settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub error_policy: ErrorPolicy,
    /// Max runs of one job across a chain of back-to-back flushes.
    pub recursion_limit: usize,
}

impl SchedulerConfig {
    pub const DEFAULT_RECURSION_LIMIT: usize = 100;

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Continue,
            recursion_limit: Self::DEFAULT_RECURSION_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.error_policy, ErrorPolicy::Continue);
        assert_eq!(config.recursion_limit, 100);
    }

    #[test]
    fn test_builders() {
        let config = SchedulerConfig::default()
            .with_error_policy(ErrorPolicy::Abort)
            .with_recursion_limit(3);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert_eq!(config.recursion_limit, 3);
    }
}
