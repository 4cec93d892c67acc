//! Command-line interface.
//!
//! The binary resolves a set of targets against the tree rooted at
//! `--root-dir` and prints the resulting graph, either as an annotated text
//! listing or as JSON for tooling. Verbosity of diagnostic logging is
//! raised with repeated `-v`; user-facing progress always goes to stdout.

use std::collections::HashSet;

use anyhow::Result;
use clap::{Parser as ClapParser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::graph::Parser;
use crate::input::Input;
use crate::nodes::registry::NodeBuilderSet;
use crate::source::DiskSource;

#[derive(Debug, ClapParser)]
#[command(
    name = "polybuild",
    version,
    about = "Polyglot build-description parser and dependency-graph resolver"
)]
pub struct Cli {
    /// Targets to resolve, e.g. //app:main
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Root of the source tree
    #[arg(long, default_value = ".")]
    pub root_dir: String,

    /// Directory for compiled objects
    #[arg(long, default_value = ".gen-obj")]
    pub object_dir: String,

    /// Directory for generated files
    #[arg(long, default_value = ".gen-files")]
    pub genfile_dir: String,

    /// Extra C compiler flag (repeatable)
    #[arg(long = "cc-flag", value_name = "FLAG")]
    pub cc_flags: Vec<String>,

    /// Extra C++ compiler flag (repeatable)
    #[arg(long = "cxx-flag", value_name = "FLAG")]
    pub cxx_flags: Vec<String>,

    /// Extra linker flag (repeatable)
    #[arg(long = "ld-flag", value_name = "FLAG")]
    pub ld_flags: Vec<String>,

    /// Output format for the resolved graph
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Raise diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One node in the machine-readable graph listing.
#[derive(Debug, Serialize)]
struct NodeSummary {
    target: String,
    kind: String,
    deps: Vec<String>,
    input: bool,
}

impl Cli {
    pub fn execute(&self) -> Result<()> {
        self.init_tracing();

        let mut input = Input::new(&self.root_dir, &self.object_dir, &self.genfile_dir);
        for target in &self.targets {
            input.add_build_target(target)?;
        }
        for flag in &self.cc_flags {
            input.add_c_flag(flag);
        }
        for flag in &self.cxx_flags {
            input.add_cxx_flag(flag);
        }
        for flag in &self.ld_flags {
            input.add_ld_flag(flag);
        }

        let builders = NodeBuilderSet::default_set();
        let source = DiskSource::new(&self.root_dir);
        let mut parser = Parser::new(&builders, &source);
        parser.parse(input)?;

        let inputs: HashSet<&str> = parser.input_nodes().iter().map(String::as_str).collect();
        let summaries: Vec<NodeSummary> = parser
            .nodes()
            .map(|node| {
                let target = node.common().target().full_path().to_string();
                NodeSummary {
                    input: inputs.contains(target.as_str()),
                    kind: node.kind().to_string(),
                    deps: node.common().dependency_nodes().to_vec(),
                    target,
                }
            })
            .collect();

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
            OutputFormat::Text => {
                println!("Resolved {} targets:", summaries.len());
                for summary in &summaries {
                    let marker = if summary.input { " [input]" } else { "" };
                    println!("  {} ({}){}", summary.target, summary.kind, marker);
                    for dep in &summary.deps {
                        println!("    -> {dep}");
                    }
                }
            }
        }
        Ok(())
    }

    fn init_tracing(&self) {
        let default_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_flags() {
        let cli = Cli::parse_from([
            "polybuild",
            "//app:main",
            "--cxx-flag",
            "-O2",
            "--format",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.targets, ["//app:main"]);
        assert_eq!(cli.cxx_flags, ["-O2"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn requires_at_least_one_target() {
        assert!(Cli::try_parse_from(["polybuild"]).is_err());
    }
}
