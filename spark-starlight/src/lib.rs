pub mod alert;
pub mod config;
pub mod detect;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod replay;

use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// Installs the fmt subscriber, which also picks up `log` records. Unknown
/// levels fall back to INFO; a second call is a no-op.
pub fn log_init(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}
