pub mod amadeus;
pub mod app_config;
pub mod database;
pub mod result_repo;
pub mod rule_repo;
pub mod token;
pub mod token_repo;
pub mod watch_repo;

pub use amadeus::AmadeusClient;
pub use app_config::Config;
pub use database::DbClient;
pub use result_repo::SqliteResultStore;
pub use rule_repo::SqliteRuleStore;
pub use token::{CachedTokenProvider, OAuthTokenIssuer, TokenIssuer};
pub use token_repo::SqliteTokenStore;
pub use watch_repo::SqliteWatchStore;

use flightwatch_core::CoreError;

pub(crate) fn storage(e: sqlx::Error) -> CoreError {
    CoreError::Storage(e.to_string())
}
