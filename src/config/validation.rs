use crate::config::types::{BoardEntry, Config, CrawlerConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_boards(&config.boards)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1 second".to_string(),
        ));
    }

    if config.poll_interval < 1 {
        return Err(ConfigError::Validation(
            "poll-interval must be >= 1 second".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if !config.age_cookie.contains('=') {
        return Err(ConfigError::Validation(format!(
            "age-cookie must look like 'name=value', got '{}'",
            config.age_cookie
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates board entries
fn validate_boards(boards: &[BoardEntry]) -> Result<(), ConfigError> {
    if boards.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[board]] entry is required".to_string(),
        ));
    }

    for board in boards {
        validate_board_name(&board.name)?;

        match (board.start_page, board.end_page) {
            (Some(start), Some(end)) => {
                if start == 0 || end == 0 {
                    return Err(ConfigError::Validation(format!(
                        "Board '{}': page indices start at 1",
                        board.name
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "Board '{}': start-page and end-page must be set together",
                    board.name
                )));
            }
        }
    }

    Ok(())
}

/// Validates a board name; it is interpolated into URL paths verbatim
pub fn validate_board_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "board name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "board name must contain only ASCII letters, digits, '-' or '_', got '{}'",
            name
        )));
    }

    Ok(())
}
