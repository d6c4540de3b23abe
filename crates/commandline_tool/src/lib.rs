pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "react-migrate")]
#[command(version = "0.1")]
#[command(about = "Convert framework-based ReAct agents to direct OpenAI-compatible clients", long_about = None)]
pub struct Cli {
    #[arg(long, short = 'd', global = true, help = "show debug log")]
    pub debug: bool,

    /// Configuration file (default: config/config.toml when present)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every matching agent program in place
    Convert {
        /// Directory to search (repeatable; overrides [batch].roots)
        #[arg(long, short, value_name = "DIR")]
        root: Vec<PathBuf>,

        /// File name glob (overrides [batch].pattern)
        #[arg(long, short, value_name = "GLOB")]
        pattern: Option<String>,

        /// Files converted concurrently (overrides [batch].concurrent_limit)
        #[arg(long, short, value_name = "N")]
        jobs: Option<usize>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what would be extracted and generated for one file
    Preview {
        #[arg(long, short, value_name = "FILE", required = true)]
        file: PathBuf,

        /// Print the complete generated program
        #[arg(long)]
        full: bool,
    },

    /// Run one echo task against an inference endpoint
    CheckEndpoint {
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        #[arg(long, value_name = "NAME")]
        model: Option<String>,

        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_flags() {
        let cli = Cli::try_parse_from([
            "react-migrate",
            "-d",
            "convert",
            "--root",
            "agents",
            "--root",
            "more",
            "--jobs",
            "8",
            "--dry-run",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Convert {
                root,
                pattern,
                jobs,
                dry_run,
            } => {
                assert_eq!(root, vec![PathBuf::from("agents"), PathBuf::from("more")]);
                assert_eq!(pattern, None);
                assert_eq!(jobs, Some(8));
                assert!(dry_run);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_preview_requires_file() {
        assert!(Cli::try_parse_from(["react-migrate", "preview"]).is_err());
        let cli =
            Cli::try_parse_from(["react-migrate", "preview", "--file", "react_a.py", "--full"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Preview { full: true, .. }));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["react-migrate", "check-endpoint", "-c", "cfg.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
    }
}
