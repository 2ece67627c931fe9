mod cli;
mod config;
mod distro;
mod error;
mod pm;
mod registry;
mod runner;

use anyhow::Result;

fn main() -> Result<()> {
    let code = cli::run()?;
    std::process::exit(code)
}
