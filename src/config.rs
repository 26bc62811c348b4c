use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tx_handler::SelectionPolicy;

/// Trait for reading configuration parameters
pub trait Config {
    fn input_path(&self) -> &Path;
    fn policy(&self) -> SelectionPolicy;
    fn report(&self) -> Report;
}

/// Conflict resolution strategy exposed on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    Greedy,
    Exact,
}

/// What gets written to stdout
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Final entry set
    Ledger,
    /// Accepted transactions per round
    Accepted,
}

/// CLI configuration
#[derive(Parser, Debug)]
#[command(
    name = "fee-ledger",
    about = "Replays rounds of candidate transactions against an unspent-output set, keeping the highest-fee consistent subset",
    version
)]
pub struct CliConfig {
    /// Path to the scenario CSV file
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// How conflicting candidates are resolved
    #[arg(long, value_enum, default_value_t = PolicyArg::Greedy)]
    policy: PolicyArg,

    /// Largest conflict component solved exactly under the exact policy
    #[arg(long, default_value_t = SelectionPolicy::DEFAULT_MAX_COMPONENT)]
    max_component: usize,

    /// Report written to stdout
    #[arg(long, value_enum, default_value_t = Report::Ledger)]
    report: Report,
}

impl Config for CliConfig {
    fn input_path(&self) -> &Path {
        &self.input_file
    }

    fn policy(&self) -> SelectionPolicy {
        match self.policy {
            PolicyArg::Greedy => SelectionPolicy::Greedy,
            PolicyArg::Exact => SelectionPolicy::Exact {
                max_component: self.max_component,
            },
        }
    }

    fn report(&self) -> Report {
        self.report
    }
}
