//! Command-line interface orchestration for the cohort engines.
//!
//! Each command reads a JSON adjacency object (`{"a": {"b": 1.0}}`) from a
//! file, runs one engine and returns an [`ExecutionSummary`] that
//! [`render_summary`] prints as text or JSON.

mod commands;

pub use commands::{
    Cli, CliError, Command, CutArgs, CutSelection, ExecutionSummary, HierarchyCommand,
    HierarchySummary, ModularityCommand, OutputFormat, PropagateCommand, PropagationMode,
    PropagationSummary, render_summary, run_cli,
};
