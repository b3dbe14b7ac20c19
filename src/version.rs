//! `seqkit version`: print version information.

use std::io::Write;

use anyhow::Result;

use crate::command::{CommandNode, Invocation};

pub fn command() -> CommandNode {
    CommandNode::new("version")
        .short("print version information")
        .long("print version information")
        .group("misc")
        .run(run)
}

/// Execute the `version` subcommand.
pub fn run(_inv: &Invocation<'_>, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "seqkit v{}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
