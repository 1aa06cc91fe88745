use crate::config::types::{BrowserConfig, Config, OutputConfig, SiteConfig, TimingConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the session pool; each session is a browser tab
const MAX_SESSIONS_LIMIT: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_config(&config.browser)?;
    validate_timing_config(&config.timing)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the start URL
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start-url '{}': {}", config.start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start-url '{}' must use http or https",
            config.start_url
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url '{}' has no host",
            config.start_url
        )));
    }

    Ok(())
}

/// Validates browser pool configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.max_sessions < 1 || config.max_sessions > MAX_SESSIONS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-sessions must be between 1 and {}, got {}",
            MAX_SESSIONS_LIMIT, config.max_sessions
        )));
    }

    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates wait bounds
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.ready_timeout == 0 {
        return Err(ConfigError::Validation(
            "ready-timeout must be > 0ms".to_string(),
        ));
    }

    if config.poll_interval == 0 {
        return Err(ConfigError::Validation(
            "poll-interval must be > 0ms".to_string(),
        ));
    }

    if config.poll_interval > config.ready_timeout {
        return Err(ConfigError::Validation(format!(
            "poll-interval ({}ms) cannot exceed ready-timeout ({}ms)",
            config.poll_interval, config.ready_timeout
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.xml_path.is_empty() {
        return Err(ConfigError::Validation(
            "xml-path cannot be empty".to_string(),
        ));
    }

    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if config.xml_path == config.csv_path {
        return Err(ConfigError::Validation(format!(
            "xml-path and csv-path must differ, both are '{}'",
            config.xml_path
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            site: SiteConfig {
                start_url: "https://www.example.com".to_string(),
            },
            browser: BrowserConfig::default(),
            timing: TimingConfig::default(),
            output: OutputConfig {
                xml_path: "site.xml".to_string(),
                csv_path: "emails.csv".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_validate_start_url() {
        let mut config = create_test_config();
        config.site.start_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.site.start_url = "ftp://example.com/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.site.start_url = "http://example.com:8080/".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_max_sessions() {
        let mut config = create_test_config();
        config.browser.max_sessions = 0;
        assert!(validate(&config).is_err());

        config.browser.max_sessions = 17;
        assert!(validate(&config).is_err());

        config.browser.max_sessions = 16;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_timing() {
        let mut config = create_test_config();
        config.timing.ready_timeout = 0;
        assert!(validate(&config).is_err());

        config.timing.ready_timeout = 50;
        config.timing.poll_interval = 100;
        assert!(validate(&config).is_err());

        config.timing = TimingConfig::immediate();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_output_paths() {
        let mut config = create_test_config();
        config.output.csv_path = String::new();
        assert!(validate(&config).is_err());

        config.output.csv_path = "site.xml".to_string();
        assert!(validate(&config).is_err());
    }
}
