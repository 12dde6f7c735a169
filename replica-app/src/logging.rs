// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::{EnvFilter, fmt};

const CRATES: [&str; 3] = ["replica_app", "replica_sys", "replica_library"];

/// Level applied to workspace crates when `RUST_LOG` is unset
pub fn default_level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

pub fn default_directives(verbose: u8, quiet: bool) -> String {
    let level = default_level(verbose, quiet);
    let mut directives: Vec<String> = CRATES
        .iter()
        .map(|name| format!("{name}={level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Logs go to stderr so listings on stdout stay clean
pub fn init(verbose: u8, quiet: bool) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, quiet))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_flags_pick_the_level() {
        assert_eq!(default_level(0, false), "info");
        assert_eq!(default_level(1, false), "debug");
        assert_eq!(default_level(3, false), "trace");
        assert_eq!(default_level(0, true), "warn");
    }

    #[test]
    fn directives_cover_every_workspace_crate() {
        assert_eq!(
            default_directives(1, false),
            "replica_app=debug,replica_sys=debug,replica_library=debug,warn"
        );
    }
}
