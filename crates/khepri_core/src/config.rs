//! # Configuration
//!
//! Capacity hints for a world, loaded once at startup. None of these
//! are hard limits - every structure grows on demand - but sizing them
//! to the simulation keeps the first ticks free of growth allocations.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Capacity hints for [`World`](crate::World) construction.
///
/// # Example
///
/// ```rust
/// use khepri_core::WorldConfig;
///
/// let config = WorldConfig::from_toml_str(
///     r#"
///     entity_capacity = 10000
///     component_kinds = 32
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.entity_capacity, 10_000);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Simultaneous entities to pre-size for.
    pub entity_capacity: usize,
    /// Distinct component kinds to pre-size for.
    pub component_kinds: usize,
    /// Structural changes per tick to pre-size the queues for.
    pub queue_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 4096,
            component_kinds: 64,
            queue_capacity: 256,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a configuration from TOML text. Missing
    /// keys fall back to defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// [`CoreError::ConfigParse`] for malformed TOML,
    /// [`CoreError::InvalidConfig`] for values that fail validation.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| CoreError::ConfigParse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every capacity hint is usable.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> CoreResult<()> {
        if self.entity_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "entity_capacity must be greater than zero".into(),
            ));
        }
        if self.component_kinds == 0 {
            return Err(CoreError::InvalidConfig(
                "component_kinds must be greater than zero".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "queue_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = WorldConfig::from_toml_str("entity_capacity = 128").unwrap();
        assert_eq!(config.entity_capacity, 128);
        assert_eq!(config.component_kinds, WorldConfig::default().component_kinds);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = WorldConfig::from_toml_str("entity_budget = 128");
        assert!(matches!(result, Err(CoreError::ConfigParse(_))));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = WorldConfig::from_toml_str("queue_capacity = 0");
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let result = WorldConfig::from_toml_str("entity_capacity = ");
        assert!(matches!(result, Err(CoreError::ConfigParse(_))));
    }
}
