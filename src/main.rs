//! seqkit: FASTA/Q toolkit CLI
//!
//! Subcommands:
//! - `version`: print version information
//! - `genautocomplete`: generate shell autocompletion scripts

use std::process::ExitCode;

use seqkit::{build_root_command, commands, App, Defaults, EXIT_FAILURE};

fn main() -> ExitCode {
    let defaults = Defaults::from_env();
    let root = match build_root_command(&defaults, commands()) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    ExitCode::from(App::new(root).run(std::env::args_os()))
}
