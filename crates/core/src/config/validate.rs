use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - TTLs and sweep interval are non-zero
/// - Default image quality is within 1-100
/// - At least one conversion may run at a time
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let lifecycle = &config.lifecycle;
    if lifecycle.input_ttl_secs == 0 || lifecycle.output_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "lifecycle TTLs must be greater than 0".to_string(),
        ));
    }
    if lifecycle.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "lifecycle.sweep_interval_secs cannot be 0".to_string(),
        ));
    }

    let quality = config.conversion.default_image_quality;
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::ValidationError(format!(
            "conversion.default_image_quality must be between 1 and 100, got {}",
            quality
        )));
    }
    if config.conversion.max_parallel_conversions == 0 {
        return Err(ConfigError::ValidationError(
            "conversion.max_parallel_conversions cannot be 0".to_string(),
        ));
    }

    if config.cors.allowed_origins.is_empty() {
        return Err(ConfigError::ValidationError(
            "cors.allowed_origins cannot be empty (use \"*\" to allow any origin)".to_string(),
        ));
    }

    Ok(())
}
