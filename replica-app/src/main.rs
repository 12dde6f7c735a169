// SPDX-License-Identifier: GPL-3.0-only

//! replica: find media volumes across mount points, link storages to each
//! other and write rclone scripts that replicate libraries between them

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod logging;
mod script;

use cli::Cli;
use commands::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    tracing::debug!("replica v{}", env!("CARGO_PKG_VERSION"));

    let context = Context::new(cli.config, cli.threads);
    commands::run(&context, cli.command)
}
