//! Shell completion scripts (`genautocomplete`).
//!
//! The script is generated by `clap_complete` from the same tree the
//! dispatcher parses with, so it always matches the registered commands and
//! flags.
//!
//! ### Example
//! ```text
//! seqkit genautocomplete --shell bash --file ~/.bash_completion.d/seqkit.sh
//! ```

use std::fs::File;
use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clap_complete::Shell;

use crate::command::{CommandNode, FlagSpec, Invocation};
use crate::dispatch::clap_command;
use crate::registry::ROOT_NAME;

const SHELLS: &[&str] = &["bash", "zsh", "fish", "powershell", "elvish"];

pub fn command() -> CommandNode {
    CommandNode::new("genautocomplete")
        .short("generate shell autocompletion scripts")
        .long(
            "generate shell autocompletion scripts

Supported shell: bash|zsh|fish|powershell|elvish

Bash:

    # generate completion shell
    seqkit genautocomplete --shell bash --file ~/.bash_completion.d/seqkit.sh

    # configure if never did.
    # install bash-completion if the \"complete\" command is not found.
    echo \"for bcfile in ~/.bash_completion.d/* ; do source \\$bcfile; done\" >> ~/.bash_completion
    echo \"source ~/.bash_completion\" >> ~/.bashrc

Zsh:

    # generate completion shell
    seqkit genautocomplete --shell zsh --file ~/.zfunc/_seqkit
",
        )
        .group("misc")
        .flag(FlagSpec::string(
            "file",
            "-",
            "autocompletion file (\"-\" for stdout)",
        ))
        .flag(FlagSpec::choice(
            "shell",
            SHELLS,
            "bash",
            "autocompletion type (bash|zsh|fish|powershell|elvish)",
        ))
        .run(run)
}

/// Execute the `genautocomplete` subcommand.
pub fn run(inv: &Invocation<'_>, out: &mut dyn Write) -> Result<()> {
    let shell_name = inv.flags.get_str("shell")?;
    let shell: Shell = shell_name
        .parse()
        .map_err(|e: String| anyhow!("unsupported shell: {} ({})", shell_name, e))?;
    let file = inv.flags.get_str("file")?;

    let mut cmd = clap_command(inv.root);
    if file == "-" {
        clap_complete::generate(shell, &mut cmd, ROOT_NAME, out);
        return Ok(());
    }

    let mut fh = File::create(file)
        .with_context(|| format!("fail to create autocompletion file: {}", file))?;
    clap_complete::generate(shell, &mut cmd, ROOT_NAME, &mut fh);
    fh.flush()?;
    tracing::info!("{} completion file for seqkit saved to {}", shell_name, file);
    Ok(())
}
