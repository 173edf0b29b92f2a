use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI parser for the `luxe` binary.
#[derive(Debug, Parser)]
#[command(name = "luxe", version, about = "Luxe admin server - database dumps and restores")]
pub struct Cli {
    /// Config file (defaults to ./luxe.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, overrides server.bind
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "luxe",
            "--config",
            "/etc/luxe.toml",
            "-b",
            "127.0.0.1:9000",
            "-v",
        ])
        .expect("cli should parse");

        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/luxe.toml")));
        assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9000"));
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["luxe", "-q", "-v"]).is_err());
    }
}
