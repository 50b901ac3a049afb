/// Size bounds acting as admission control for the power-reduction and
/// rational-function tactics. Constructed once at startup and passed into the
/// integration entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegrationLimits {
    /// Largest integer power the reduction-formula tactic will unwind.
    pub max_power: u32,
    /// Largest polynomial degree the rational-function tactic accepts.
    pub max_degree: u32,
}

impl Default for IntegrationLimits {
    fn default() -> Self {
        IntegrationLimits {
            max_power: 8,
            max_degree: 24,
        }
    }
}

impl IntegrationLimits {
    /// Resolve both bounds from an external key/value source. A missing or
    /// unparsable entry resolves to `0`, which disables the gated tactic
    /// entirely rather than guessing a limit.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bound = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(0)
        };
        IntegrationLimits {
            max_power: bound("max-integrable-power"),
            max_degree: bound("max-polynomial-degree"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_bounds() {
        let limits = IntegrationLimits::from_lookup(|key| match key {
            "max-integrable-power" => Some("6".to_string()),
            "max-polynomial-degree" => Some("12".to_string()),
            _ => None,
        });
        assert_eq!(limits.max_power, 6);
        assert_eq!(limits.max_degree, 12);
    }

    #[test]
    fn missing_or_bad_entries_fail_closed() {
        let limits = IntegrationLimits::from_lookup(|_| None);
        assert_eq!(limits.max_power, 0);
        assert_eq!(limits.max_degree, 0);

        let limits = IntegrationLimits::from_lookup(|_| Some("many".to_string()));
        assert_eq!(limits.max_power, 0);
    }
}
