use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use ragstack_orchestrations::registry::Selection;

use crate::output::OutputFormat;

/// Ragstack - deploy the LocalAI / Qdrant / AnythingLLM RAG stack on Kubernetes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command; they override the environment
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Target namespace (default: "ragstack")
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Registry YAML to use instead of the shipped stack
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Wait timeout per component operation, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install or upgrade components in dependency order
    Deploy {
        /// Only these components (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Also deploy optional components (e.g. colqwen2)
        #[arg(long)]
        include_optional: bool,
    },

    /// Remove components in reverse dependency order
    Teardown {
        /// Only these components (comma-separated)
        #[arg(long, value_delimiter = ',', conflicts_with = "all")]
        only: Vec<String>,

        /// Every component in the registry
        #[arg(long)]
        all: bool,

        /// Also delete persistent volume claims
        #[arg(long)]
        delete_storage: bool,

        /// Skip the storage deletion confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show whether components are installed and ready
    Status {
        /// Only these components (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
    },
}

pub fn deploy_selection(only: Vec<String>, include_optional: bool) -> Selection {
    if only.is_empty() {
        Selection::Default { include_optional }
    } else {
        Selection::Only(only)
    }
}

/// `None` means the operator picks from a menu
pub fn teardown_selection(only: Vec<String>, all: bool) -> Option<Selection> {
    if all {
        Some(Selection::All)
    } else if only.is_empty() {
        None
    } else {
        Some(Selection::Only(only))
    }
}

pub fn status_selection(only: Vec<String>) -> Selection {
    if only.is_empty() {
        Selection::All
    } else {
        Selection::Only(only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy() {
        let args = Args::try_parse_from([
            "ragstack",
            "deploy",
            "--only",
            "qdrant,localai",
            "--namespace",
            "ai",
            "--timeout",
            "300",
        ])
        .unwrap();

        assert_eq!(args.global.namespace.as_deref(), Some("ai"));
        assert_eq!(args.global.timeout, Some(300));
        assert_eq!(args.global.output, OutputFormat::Table);
        match args.command {
            Command::Deploy {
                only,
                include_optional,
            } => {
                assert_eq!(only, vec!["qdrant", "localai"]);
                assert!(!include_optional);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_teardown_flags() {
        let args = Args::try_parse_from([
            "ragstack",
            "teardown",
            "--all",
            "--delete-storage",
            "-y",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(args.global.output, OutputFormat::Json);
        match args.command {
            Command::Teardown {
                only,
                all,
                delete_storage,
                yes,
            } => {
                assert!(only.is_empty());
                assert!(all && delete_storage && yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_only_conflicts_with_all() {
        let err = Args::try_parse_from(["ragstack", "teardown", "--all", "--only", "qdrant"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        assert!(Args::try_parse_from(["ragstack", "status", "--output", "yaml"]).is_err());
    }

    #[test]
    fn test_selections() {
        assert_eq!(
            deploy_selection(vec![], true),
            Selection::Default {
                include_optional: true
            }
        );
        assert_eq!(
            deploy_selection(vec!["colqwen2".into()], false),
            Selection::Only(vec!["colqwen2".into()])
        );
        assert_eq!(teardown_selection(vec![], true), Some(Selection::All));
        assert_eq!(teardown_selection(vec![], false), None);
        assert_eq!(status_selection(vec![]), Selection::All);
    }
}
