/// Configuration management for the social client
///
/// Loads configuration from environment variables.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use storage_utils::StorageConfig;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend project and collection settings
    pub backend: BackendConfig,
    /// File storage settings
    pub storage: StorageConfig,
    /// Feed paging
    pub feed: FeedConfig,
    /// Like/save behaviour
    pub interactions: InteractionConfig,
}

/// Backend project, database, and collection ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API endpoint including the version prefix
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub post_collection_id: String,
    pub saves_collection_id: String,
    pub user_collection_id: String,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Posts per infinite-feed page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Posts returned by the recent-posts query
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recent_limit: default_recent_limit(),
        }
    }
}

/// What the interaction manager does with local state when a write fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Restore the last server-confirmed value
    Revert,
    /// Leave the optimistic value in place and only log the failure
    KeepOptimistic,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revert" => Ok(FailurePolicy::Revert),
            "keep_optimistic" | "keep" => Ok(FailurePolicy::KeepOptimistic),
            other => Err(anyhow!("unknown failure policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    pub failure_policy: FailurePolicy,
    /// Issue writes for the same post one at a time, in call order
    #[serde(default = "default_serialize_writes")]
    pub serialize_writes: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Revert,
            serialize_writes: default_serialize_writes(),
        }
    }
}

// Default values
fn default_request_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> u32 {
    crate::services::feed::DEFAULT_PAGE_SIZE
}

fn default_recent_limit() -> u32 {
    crate::services::queries::DEFAULT_RECENT_LIMIT
}

fn default_serialize_writes() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("APPWRITE_ENDPOINT")
            .unwrap_or_else(|_| "https://cloud.appwrite.io/v1".to_string());

        let backend = BackendConfig {
            endpoint: endpoint.clone(),
            project_id: std::env::var("APPWRITE_PROJECT_ID")
                .context("APPWRITE_PROJECT_ID environment variable not set")?,
            database_id: std::env::var("APPWRITE_DATABASE_ID")
                .context("APPWRITE_DATABASE_ID environment variable not set")?,
            post_collection_id: std::env::var("APPWRITE_POST_COLLECTION_ID")
                .unwrap_or_else(|_| "posts".to_string()),
            saves_collection_id: std::env::var("APPWRITE_SAVES_COLLECTION_ID")
                .unwrap_or_else(|_| "saves".to_string()),
            user_collection_id: std::env::var("APPWRITE_USER_COLLECTION_ID")
                .unwrap_or_else(|_| "users".to_string()),
            request_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_request_timeout_secs),
        };

        let mut storage = StorageConfig::from_env();
        storage.endpoint = endpoint;
        storage.project_id = backend.project_id.clone();

        let feed = FeedConfig {
            page_size: std::env::var("FEED_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or_else(default_page_size),
            recent_limit: std::env::var("FEED_RECENT_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or_else(default_recent_limit),
        };

        let failure_policy = match std::env::var("INTERACTION_FAILURE_POLICY") {
            Ok(raw) => raw
                .parse::<FailurePolicy>()
                .context("INTERACTION_FAILURE_POLICY must be 'revert' or 'keep_optimistic'")?,
            Err(_) => FailurePolicy::Revert,
        };

        let interactions = InteractionConfig {
            failure_policy,
            serialize_writes: std::env::var("INTERACTION_SERIALIZE_WRITES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_serialize_writes),
        };

        Ok(Config {
            backend,
            storage,
            feed,
            interactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_optional() {
        for key in [
            "APPWRITE_ENDPOINT",
            "APPWRITE_POST_COLLECTION_ID",
            "FEED_PAGE_SIZE",
            "HTTP_TIMEOUT_SECS",
            "INTERACTION_FAILURE_POLICY",
            "INTERACTION_SERIALIZE_WRITES",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_optional();
        std::env::set_var("APPWRITE_PROJECT_ID", "snapgram");
        std::env::set_var("APPWRITE_DATABASE_ID", "main");

        let config = Config::from_env().unwrap();

        assert_eq!(config.backend.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(config.backend.post_collection_id, "posts");
        assert_eq!(config.backend.request_timeout_secs, 15);
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.recent_limit, 20);
        assert_eq!(config.interactions.failure_policy, FailurePolicy::Revert);
        assert!(config.interactions.serialize_writes);
        assert_eq!(config.storage.project_id, "snapgram");
    }

    #[test]
    #[serial]
    fn test_missing_project_is_an_error() {
        clear_optional();
        std::env::remove_var("APPWRITE_PROJECT_ID");
        std::env::set_var("APPWRITE_DATABASE_ID", "main");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("APPWRITE_PROJECT_ID"));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_optional();
        std::env::set_var("APPWRITE_PROJECT_ID", "snapgram");
        std::env::set_var("APPWRITE_DATABASE_ID", "main");
        std::env::set_var("FEED_PAGE_SIZE", "0");
        std::env::set_var("INTERACTION_FAILURE_POLICY", "keep_optimistic");
        std::env::set_var("INTERACTION_SERIALIZE_WRITES", "false");

        let config = Config::from_env().unwrap();

        assert_eq!(config.feed.page_size, 10);
        assert_eq!(
            config.interactions.failure_policy,
            FailurePolicy::KeepOptimistic
        );
        assert!(!config.interactions.serialize_writes);

        std::env::set_var("INTERACTION_FAILURE_POLICY", "shrug");
        assert!(Config::from_env().is_err());
        clear_optional();
    }
}
