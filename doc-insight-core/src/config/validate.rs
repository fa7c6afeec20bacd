//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.backend.base_url.trim().is_empty() {
        errors.push("backend.base_url must not be empty".to_string());
    }
    if config.backend.key_name.trim().is_empty() {
        errors.push("backend.key_name must not be empty".to_string());
    }
    if config.backend.timeout_s == 0 {
        errors.push("backend.timeout_s must be > 0".to_string());
    }

    match config.logging.format.as_str() {
        "text" | "json" => {}
        other => errors.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            other
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        let config = Config::default();
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_s = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("backend.timeout_s"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "yaml".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }
}
