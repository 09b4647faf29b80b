use crate::config::types::{Config, CrawlerConfig, Settings, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_crawler_config(&config.crawler)?;
    if let Some(scope) = &config.scope {
        validate_scope(scope)?;
    }
    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    match config.kind.as_str() {
        "redis" | "memory" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "store kind must be \"redis\" or \"memory\", got \"{}\"",
                other
            )));
        }
    }

    if config.kind == "redis" && !config.url.starts_with("redis://") {
        return Err(ConfigError::Validation(format!(
            "store url must start with redis://, got \"{}\"",
            config.url
        )));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.max_in_flight < 1 {
        return Err(ConfigError::Validation(
            "max-in-flight must be >= 1".to_string(),
        ));
    }

    if config.max_block_errors < 1 {
        return Err(ConfigError::Validation(
            "max-block-errors must be >= 1".to_string(),
        ));
    }

    if config.stats_interval < 1 {
        return Err(ConfigError::Validation(
            "stats-interval must be >= 1 second".to_string(),
        ));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(
            "poll-interval must be >= 10 milliseconds".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        if !proxy.starts_with("socks5://") {
            return Err(ConfigError::Validation(format!(
                "proxy must be a socks5:// URL, got \"{}\"",
                proxy
            )));
        }
    }

    Ok(())
}

fn validate_scope(scope: &Settings) -> Result<(), ConfigError> {
    if scope.base_url.is_empty() {
        return Err(ConfigError::Validation(
            "scope base-url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&scope.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must be http or https, got \"{}\"",
            url.scheme()
        )));
    }

    for keyword in scope
        .keywords_exclude
        .iter()
        .chain(scope.keywords_include.iter())
    {
        if keyword.is_empty() {
            return Err(ConfigError::Validation(
                "keyword filters cannot contain empty strings".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            store: StoreConfig::default(),
            crawler: CrawlerConfig::default(),
            scope: Some(Settings {
                base_url: "http://example.com".to_string(),
                ..Settings::default()
            }),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_unknown_store_kind() {
        let mut config = base_config();
        config.store.kind = "sqlite".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = base_config();
        config.crawler.workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = base_config();
        config.scope.as_mut().unwrap().base_url.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let mut config = base_config();
        config.scope.as_mut().unwrap().base_url = "ftp://example.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let mut config = base_config();
        config
            .scope
            .as_mut()
            .unwrap()
            .keywords_exclude
            .push(String::new());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_proxy_rejected() {
        let mut config = base_config();
        config.crawler.proxy = Some("http://127.0.0.1:8080".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_scope_is_fine() {
        let mut config = base_config();
        config.scope = None;
        assert!(validate(&config).is_ok());
    }
}
