//! seqkit: the command dispatcher of a FASTA/Q toolkit.
//!
//! Builds the command tree once, resolves the process-wide flag defaults,
//! renders grouped help, and maps every failure to one exit status.
//! Sequence-processing subcommands plug in as [`CommandNode`]s.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod genautocomplete;
pub mod logging;
pub mod options;
pub mod registry;
pub mod usage;
pub mod version;

pub use command::{CommandNode, CommandRef, FlagSpec, FlagValues, Group, Invocation};
pub use config::Defaults;
pub use dispatch::{App, EXIT_FAILURE, EXIT_SUCCESS};
pub use error::RegistryError;
pub use options::GlobalOptions;
pub use registry::{build_root_command, CommandRegistry};

/// Subcommands shipped with the dispatcher itself.
pub fn commands() -> Vec<CommandNode> {
    vec![genautocomplete::command(), version::command()]
}
