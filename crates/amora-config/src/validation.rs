// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation that runs after deserialization.
//!
//! Figment plus `deny_unknown_fields` catches shape errors; these checks
//! reject values that parse but cannot work at runtime.

use amora_core::AmoraError;

use crate::model::AmoraConfig;

/// Validate semantic constraints on a loaded configuration.
pub fn validate(config: &AmoraConfig) -> Result<(), AmoraError> {
    if config.matching.max_daily_likes == 0 {
        return Err(AmoraError::Config(
            "matching.max_daily_likes must be at least 1".to_string(),
        ));
    }
    if !(-23..=23).contains(&config.matching.day_offset_hours) {
        return Err(AmoraError::Config(format!(
            "matching.day_offset_hours must be within -23..=23, got {}",
            config.matching.day_offset_hours
        )));
    }
    if config.lock.hold_timeout_secs == 0 {
        return Err(AmoraError::Config(
            "lock.hold_timeout_secs must be at least 1".to_string(),
        ));
    }
    if config.lock.poll_interval_ms == 0 {
        return Err(AmoraError::Config(
            "lock.poll_interval_ms must be at least 1".to_string(),
        ));
    }
    if config.rate_limit.requests_per_window == 0 {
        return Err(AmoraError::Config(
            "rate_limit.requests_per_window must be at least 1".to_string(),
        ));
    }
    if config.rate_limit.window_secs == 0 {
        return Err(AmoraError::Config(
            "rate_limit.window_secs must be at least 1".to_string(),
        ));
    }
    let known_levels = ["trace", "debug", "info", "warn", "error"];
    if !known_levels.contains(&config.service.log_level.as_str()) {
        return Err(AmoraError::Config(format!(
            "service.log_level must be one of {known_levels:?}, got {:?}",
            config.service.log_level
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AmoraConfig;

    #[test]
    fn default_config_is_valid() {
        validate(&AmoraConfig::default()).unwrap();
    }

    #[test]
    fn zero_daily_likes_is_rejected() {
        let mut config = AmoraConfig::default();
        config.matching.max_daily_likes = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("max_daily_likes"));
    }

    #[test]
    fn out_of_range_day_offset_is_rejected() {
        let mut config = AmoraConfig::default();
        config.matching.day_offset_hours = 26;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = AmoraConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }
}
