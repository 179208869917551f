pub mod config;
pub mod logger;
pub mod partcat_toml;
pub mod tempfiles;

pub use config::*;
pub use logger::setup_logging;
pub use partcat_toml::{PartcatToml, apply_file_to_opts, load_partcat_toml};
pub use tempfiles::{rename_temp_to_final, temp_path_for};
