//! Head-to-head box-score analysis for NBA matchups: recent meetings,
//! per-player form, replacement patterns and prop-leg suggestions.

pub mod aggregate;
pub mod config;
pub mod demo_feed;
pub mod error;
pub mod export;
pub mod feed;
pub mod game_log;
pub mod http_cache;
pub mod http_client;
pub mod legs;
pub mod logging;
pub mod matchup;
pub mod patterns;
pub mod report;
pub mod schedule;
pub mod snapshot;
pub mod state;
pub mod stats_feed;
pub mod store;
pub mod teams;
pub mod trend;
