use crate::scoring::{ScoringConfig, ScoringProfile};
use crate::state::GameRules;
use std::net::SocketAddr;

/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub scoring_profile: ScoringProfile,
    pub rules: GameRules,
}

impl ServerConfig {
    /// Load config from the environment. Every variable is optional and
    /// falls back to a sensible default.
    ///
    /// - `HIFDH_BIND`: listen address (default `0.0.0.0:7862`)
    /// - `HIFDH_SCORING`: `low` or `high` point scale (default `low`)
    /// - `HIFDH_MAX_RANKED_SLOTS`, `HIFDH_FIRST_BUZZ_THRESHOLD`,
    ///   `HIFDH_SCOREBOARD_LIMIT`: gameplay rule overrides
    pub fn from_env() -> Self {
        let bind = std::env::var("HIFDH_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 7862)));

        let scoring_profile = match std::env::var("HIFDH_SCORING").as_deref() {
            Ok("high") => ScoringProfile::HighScale,
            Ok("low") | Err(_) => ScoringProfile::LowScale,
            Ok(other) => {
                tracing::warn!("Unknown HIFDH_SCORING value {:?}, using low scale", other);
                ScoringProfile::LowScale
            }
        };

        let defaults = GameRules::default();
        let rules = GameRules {
            max_ranked_slots: env_u32("HIFDH_MAX_RANKED_SLOTS", defaults.max_ranked_slots),
            consecutive_first_buzz_threshold: env_u32(
                "HIFDH_FIRST_BUZZ_THRESHOLD",
                defaults.consecutive_first_buzz_threshold,
            ),
            default_scoreboard_limit: env_u32(
                "HIFDH_SCOREBOARD_LIMIT",
                defaults.default_scoreboard_limit as u32,
            ) as usize,
        };

        Self {
            bind,
            scoring_profile,
            rules,
        }
    }

    pub fn scoring(&self) -> ScoringConfig {
        ScoringConfig::for_profile(self.scoring_profile)
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring non-numeric {}={:?}", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "HIFDH_BIND",
        "HIFDH_SCORING",
        "HIFDH_MAX_RANKED_SLOTS",
        "HIFDH_FIRST_BUZZ_THRESHOLD",
        "HIFDH_SCOREBOARD_LIMIT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_env_is_unset() {
        clear_env();
        let config = ServerConfig::from_env();
        assert_eq!(config.bind.port(), 7862);
        assert_eq!(config.scoring_profile, ScoringProfile::LowScale);
        assert_eq!(config.rules.max_ranked_slots, 3);
        assert_eq!(config.rules.consecutive_first_buzz_threshold, 3);
        assert_eq!(config.rules.default_scoreboard_limit, 5);
    }

    #[test]
    #[serial]
    fn env_overrides_are_applied() {
        clear_env();
        std::env::set_var("HIFDH_BIND", "127.0.0.1:9000");
        std::env::set_var("HIFDH_SCORING", "high");
        std::env::set_var("HIFDH_MAX_RANKED_SLOTS", "5");

        let config = ServerConfig::from_env();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.scoring_profile, ScoringProfile::HighScale);
        assert_eq!(config.rules.max_ranked_slots, 5);
        assert_eq!(config.scoring().fast_threshold_seconds, 7.0);

        clear_env();
    }

    #[test]
    #[serial]
    fn garbage_values_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("HIFDH_BIND", "not-an-address");
        std::env::set_var("HIFDH_SCOREBOARD_LIMIT", "many");

        let config = ServerConfig::from_env();
        assert_eq!(config.bind.port(), 7862);
        assert_eq!(config.rules.default_scoreboard_limit, 5);

        clear_env();
    }
}
