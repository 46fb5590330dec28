use crate::config::types::{CaptchaConfig, Config, PacingConfig, StoreEntry};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_workers(config)?;
    validate_retry(config)?;
    validate_paths(config)?;
    validate_stores(&config.stores)?;
    validate_pacing(&config.pacing)?;
    validate_captcha(&config.captcha)?;
    Ok(())
}

/// Validates worker pool and timeout settings
fn validate_workers(config: &Config) -> Result<(), ConfigError> {
    if config.num_processes < 1 || config.num_processes > 64 {
        return Err(ConfigError::Validation(format!(
            "num_processes must be between 1 and 64, got {}",
            config.num_processes
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry and backoff settings
fn validate_retry(config: &Config) -> Result<(), ConfigError> {
    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be a non-negative number, got {}",
            config.backoff_factor
        )));
    }

    if config.retry_count > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_count must be <= 10, got {}",
            config.retry_count
        )));
    }

    Ok(())
}

fn validate_paths(config: &Config) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.logs_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "logs_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates store entries
///
/// Store types are not checked against the extraction registry here: an
/// unsupported store is reported per job, not as a setup failure.
fn validate_stores(stores: &[StoreEntry]) -> Result<(), ConfigError> {
    for (index, store) in stores.iter().enumerate() {
        if store.store_type.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "stores[{}] has an empty type",
                index
            )));
        }

        if let Some(referer) = &store.referer {
            url::Url::parse(referer).map_err(|e| {
                ConfigError::Validation(format!(
                    "Invalid referer '{}' for store '{}': {}",
                    referer, store.store_type, e
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_pacing(pacing: &PacingConfig) -> Result<(), ConfigError> {
    for (name, [min, max]) in [
        ("warmup_pause_ms", pacing.warmup_pause_ms),
        ("request_delay_ms", pacing.request_delay_ms),
    ] {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "pacing.{} must be [min, max] with min <= max, got [{}, {}]",
                name, min, max
            )));
        }
    }

    Ok(())
}

fn validate_captcha(captcha: &CaptchaConfig) -> Result<(), ConfigError> {
    if !captcha.enabled {
        return Ok(());
    }

    if captcha.markers.iter().all(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "captcha.markers must contain at least one non-empty term".to_string(),
        ));
    }

    Ok(())
}
