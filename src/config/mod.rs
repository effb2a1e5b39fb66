use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub catalog: CatalogConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Paging bounds for the video-facing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub list_default_limit: i32,
    pub list_max_limit: i32,
    pub shorts_default_take: i32,
    pub shorts_max_take: i32,
    pub similar_limit: i32,
    pub history_limit: i32,
    pub max_children_per_account: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<i32>,
    pub max_nested_depth: u32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
    pub session_cookie: String,
    pub active_child_cookie: String,
    pub active_child_max_age_days: i64,
    pub locale_cookie: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        let catalog = &mut self.catalog;
        env_override("CATALOG_LIST_DEFAULT_LIMIT", &mut catalog.list_default_limit);
        env_override("CATALOG_LIST_MAX_LIMIT", &mut catalog.list_max_limit);
        env_override("CATALOG_SHORTS_DEFAULT_TAKE", &mut catalog.shorts_default_take);
        env_override("CATALOG_SHORTS_MAX_TAKE", &mut catalog.shorts_max_take);
        env_override("CATALOG_SIMILAR_LIMIT", &mut catalog.similar_limit);
        env_override("CATALOG_HISTORY_LIMIT", &mut catalog.history_limit);
        env_override("CATALOG_MAX_CHILDREN_PER_ACCOUNT", &mut catalog.max_children_per_account);

        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        env_override("FILTER_MAX_NESTED_DEPTH", &mut self.filter.max_nested_depth);
        env_override("FILTER_DEBUG_LOGGING", &mut self.filter.debug_logging);

        env_override("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        env_override("DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);
        env_override("DATABASE_ENABLE_QUERY_LOGGING", &mut self.database.enable_query_logging);

        // PORT is what container platforms set
        env_override("PORT", &mut self.api.port);
        env_override("BILIMTUBE_API_PORT", &mut self.api.port);
        env_override("API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);

        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        env_override("SECURITY_SECURE_COOKIES", &mut self.security.secure_cookies);
        env_override("SECURITY_ACTIVE_CHILD_MAX_AGE_DAYS", &mut self.security.active_child_max_age_days);

        self
    }

    fn catalog_defaults() -> CatalogConfig {
        CatalogConfig {
            list_default_limit: 10,
            list_max_limit: 50,
            shorts_default_take: 5,
            shorts_max_take: 12,
            similar_limit: 10,
            history_limit: 30,
            max_children_per_account: 5,
        }
    }

    fn cookie_defaults(secure_cookies: bool, cors_origins: Vec<String>) -> SecurityConfig {
        SecurityConfig {
            cors_origins,
            secure_cookies,
            session_cookie: "session_token".to_string(),
            active_child_cookie: "active_child_id".to_string(),
            active_child_max_age_days: 30,
            locale_cookie: "locale".to_string(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            catalog: Self::catalog_defaults(),
            filter: FilterConfig {
                max_limit: Some(1000),
                max_nested_depth: 10,
                debug_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: Self::cookie_defaults(
                false,
                vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            ),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            catalog: Self::catalog_defaults(),
            filter: FilterConfig {
                max_limit: Some(500),
                max_nested_depth: 5,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: Self::cookie_defaults(true, vec!["https://staging.bilimtube.kz".to_string()]),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            catalog: Self::catalog_defaults(),
            filter: FilterConfig {
                max_limit: Some(100),
                max_nested_depth: 5,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: Self::cookie_defaults(true, vec!["https://bilimtube.kz".to_string()]),
        }
    }
}

/// Replace `target` with the parsed value of `key`; unset or unparseable keeps it
fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
