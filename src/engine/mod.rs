//! Engine module: cache persistence, locale lease, progress reporting and the CLI.

pub mod arg_parser;
pub mod cache;
pub mod cli;
pub mod locale;
pub mod progress;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cache::{load_cache, read_cache, save_cache};
pub use cli::handle_run;
pub use locale::LocaleLease;
pub use progress::{KdamProgress, ProgressSink, SharedProgress};
