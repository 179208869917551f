//! partcat CLI: scan part libraries into a sorted catalog, reusing the cache when fresh.

use anyhow::Result;
use clap::Parser;
use partcat::engine::arg_parser::Cli;
use partcat::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
