//! Command host adapters

mod git_cli;

pub use git_cli::GitCliHost;
