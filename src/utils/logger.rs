use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Last path segment of a log target, e.g. `partcat::pipeline::enumerate` -> `enumerate`.
/// Pipeline warnings then read `[partcat WARN enumerate] [Lib3] ...`.
fn module_tag(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Install the process logger. Dependencies log at warn; partcat at info, or debug when
/// `verbose`. `RUST_LOG` is honored. Safe to call more than once (tests, `load_dir`).
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let tag = module_tag(record.target());
            let line = match record.level() {
                Level::Error => format!("[{} {} {}] {}", name, "ERROR".red(), tag, record.args()),
                Level::Warn => format!(
                    "[{} {} {}] {}",
                    name,
                    "WARN".yellow(),
                    tag,
                    record.args()
                ),
                Level::Debug | Level::Trace => format!(
                    "[{} {}] {}",
                    name,
                    tag.dimmed(),
                    record.args().to_string().dimmed()
                ),
                Level::Info => format!("[{}] {}", name, record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
