use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "layerdiff",
    about = "Structural diff and patch for JSON documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the delta between two documents
    Diff(DiffArgs),
    /// Apply a delta to a document
    Patch(PatchArgs),
    /// Undo a delta on a document
    Unpatch(PatchArgs),
    /// Print the delta that undoes a delta
    Reverse(ReverseArgs),
    /// Print the default diff options as TOML
    Options,
}

#[derive(Args)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    /// TOML file with diff options
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Match array elements by this property
    #[arg(long)]
    pub object_hash: Option<String>,
    #[arg(long)]
    pub no_detect_move: bool,
    /// Diff long strings as character edits
    #[arg(long)]
    pub text: bool,
}

#[derive(Args)]
pub struct PatchArgs {
    pub value: PathBuf,
    pub delta: PathBuf,
}

#[derive(Args)]
pub struct ReverseArgs {
    pub delta: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["layerdiff", "diff", "a.json", "b.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.left, PathBuf::from("a.json"));
            assert_eq!(args.right, PathBuf::from("b.json"));
            assert!(!args.no_detect_move);
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_diff_options() {
        let cli = Cli::try_parse_from([
            "layerdiff",
            "diff",
            "a.json",
            "b.json",
            "--object-hash",
            "id",
            "--no-detect-move",
            "--text",
            "--config",
            "diff.toml",
        ])
        .unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.object_hash, Some("id".into()));
            assert!(args.no_detect_move);
            assert!(args.text);
            assert_eq!(args.config, Some(PathBuf::from("diff.toml")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_unpatch() {
        let cli = Cli::try_parse_from(["layerdiff", "unpatch", "v.json", "d.json"]).unwrap();
        assert!(matches!(cli.command, Command::Unpatch(_)));
    }

    #[test]
    fn parse_reverse_json() {
        let cli =
            Cli::try_parse_from(["layerdiff", "--format", "json", "reverse", "d.json"]).unwrap();
        assert!(matches!(cli.command, Command::Reverse(_)));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["layerdiff", "-v", "options"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn patch_needs_a_delta() {
        assert!(Cli::try_parse_from(["layerdiff", "patch", "v.json"]).is_err());
    }
}
