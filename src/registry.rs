//! Building and validating the command tree.
//!
//! [`build_root_command`] is the one composition step of the process: it
//! registers the help groups and the persistent flags on the root, attaches
//! the subcommands handed in by their modules, and checks the whole tree
//! before anything is dispatched.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;

use crate::command::{CommandNode, CommandRef, FlagSpec, Invocation};
use crate::config::Defaults;
use crate::error::RegistryError;
use crate::options::SeqType;
use crate::usage;

pub const ROOT_NAME: &str = "seqkit";
pub const HELP_COMMAND: &str = "help";
pub const HELP_FLAG: &str = "help";

/// Help groups of the root, in display order.
pub const GROUPS: &[(&str, &str)] = &[
    ("basic", "Commands for Basic Operation:"),
    ("format", "Commands for Format Conversion:"),
    ("search", "Commands for Searching:"),
    ("set", "Commands for Set Operation:"),
    ("edit", "Commands for Edit:"),
    ("order", "Commands for Ordering:"),
    ("bam", "Commands for BAM Processing:"),
    ("misc", "Commands for Miscellaneous:"),
];

/// Accumulates a root node, then validates it into a finished tree.
pub struct CommandRegistry {
    root: CommandNode,
}

impl CommandRegistry {
    pub fn new(root: CommandNode) -> Self {
        Self { root }
    }

    pub fn group(mut self, id: &str, title: &str) -> Self {
        self.root = self.root.add_group(id, title);
        self
    }

    pub fn persistent_flag(mut self, spec: FlagSpec) -> Self {
        self.root = self.root.flag(spec.persistent());
        self
    }

    pub fn command(mut self, child: CommandNode) -> Self {
        self.root = self.root.subcommand(child);
        self
    }

    /// Install the help machinery and check every invariant of the tree.
    pub fn build(mut self) -> Result<CommandNode, RegistryError> {
        if self.root.child(HELP_COMMAND).is_none() {
            self.root = self.root.subcommand(help_command());
        }
        add_help_flags(&mut self.root);
        validate(&self.root)?;
        tracing::debug!(
            commands = self.root.children.len(),
            groups = self.root.groups.len(),
            "command tree built"
        );
        Ok(self.root)
    }
}

/// Compose the `seqkit` root with its groups, persistent flags and `children`.
pub fn build_root_command(
    defaults: &Defaults,
    children: Vec<CommandNode>,
) -> Result<CommandNode, RegistryError> {
    let root = CommandNode::new(ROOT_NAME)
        .short("a cross-platform and ultrafast toolkit for FASTA/Q file manipulation")
        .long(root_long());

    let mut registry = CommandRegistry::new(root);
    for (id, title) in GROUPS {
        registry = registry.group(id, title);
    }
    for spec in persistent_flags(defaults) {
        registry = registry.persistent_flag(spec);
    }
    for child in children {
        registry = registry.command(child);
    }
    registry.build()
}

fn persistent_flags(defaults: &Defaults) -> Vec<FlagSpec> {
    let seq_types: Vec<&str> = SeqType::value_variants()
        .iter()
        .map(SeqType::as_str)
        .collect();

    vec![
        FlagSpec::choice(
            "seq-type",
            &seq_types,
            SeqType::Auto.as_str(),
            "sequence type (dna|rna|protein|unlimit|auto) (for auto, it automatically detect by the first sequence)",
        )
        .short('t'),
        FlagSpec::int(
            "threads",
            defaults.threads as i64,
            "number of CPUs. can also set with environment variable SEQKIT_THREADS)",
        )
        .short('j'),
        FlagSpec::int(
            "line-width",
            defaults.line_width,
            "line width when outputting FASTA format (0 for no wrap)",
        )
        .short('w'),
        FlagSpec::string(
            "id-regexp",
            &defaults.id_regexp,
            "regular expression for parsing ID",
        ),
        FlagSpec::bool(
            "id-ncbi",
            "FASTA head is NCBI-style, e.g. >gi|110645304|ref|NC_002516.2| Pseud...",
        ),
        FlagSpec::string(
            "out-file",
            &defaults.out_file,
            "out file (\"-\" for stdout, suffix .gz for gzipped out)",
        )
        .short('o'),
        FlagSpec::bool("quiet", "be quiet and do not show extra information"),
        FlagSpec::int(
            "alphabet-guess-seq-length",
            defaults.alphabet_guess_seq_length,
            "length of sequence prefix of the first FASTA record based on which seqkit guesses the sequence type (0 for whole seq)",
        ),
        FlagSpec::string(
            "infile-list",
            "",
            "file of input files list (one file per line), if given, they are appended to files from cli arguments",
        )
        .short('X'),
        FlagSpec::int(
            "compress-level",
            defaults.compress_level,
            "compression level for gzip, zstd, xz and bzip2. type \"seqkit -h\" for the range and default value for each format",
        ),
    ]
}

fn root_long() -> String {
    format!(
        "SeqKit -- a cross-platform and ultrafast toolkit for FASTA/Q file manipulation

Version: {}

Author: Wei Shen <shenwei356@gmail.com>

Documents  : http://bioinf.shenwei.me/seqkit
Source code: https://github.com/shenwei356/seqkit
Please cite: https://doi.org/10.1371/journal.pone.0163962


Seqkit utlizies the pgzip (https://github.com/klauspost/pgzip) package to
read and write gzip file, and the outputted gzip file would be slighty
larger than files generated by GNU gzip.

Seqkit writes gzip files very fast, much faster than the multi-threaded pigz,
therefore there's no need to pipe the result to gzip/pigz.

Seqkit also supports reading and writing xz (.xz) and zstd (.zst) formats since v2.2.0.
Bzip2 format is supported since v2.4.0.

Compression level:
  format   range   default  comment
  gzip     1-9     5        https://github.com/klauspost/pgzip sets 5 as the default value.
  xz       NA      NA       https://github.com/ulikunitz/xz does not support.
  zstd     1-4     2        roughly equals to zstd 1, 3, 7, 11, respectively.
  bzip     1-9     6        https://github.com/dsnet/compress
",
        env!("CARGO_PKG_VERSION")
    )
}

/// The built-in `help` command: hidden from listings, still invocable.
fn help_command() -> CommandNode {
    CommandNode::new(HELP_COMMAND)
        .short("Help about any command")
        .long(format!(
            "Help provides help for any command in the application.\nSimply type {} help [path to command] for full details.",
            ROOT_NAME
        ))
        .hidden()
        .run(run_help)
}

fn run_help(inv: &Invocation<'_>, out: &mut dyn Write) -> Result<()> {
    let root = CommandRef::root(inv.root);
    match root.descend(&inv.args) {
        Some(target) => write!(out, "{}", usage::render_help(&target))?,
        None => {
            writeln!(out, "Unknown help topic {:?}", inv.args)?;
            write!(out, "{}", usage::render_usage(&root, ""))?;
        }
    }
    Ok(())
}

/// Give every node a local `-h, --help` flag.
fn add_help_flags(node: &mut CommandNode) {
    let usage = format!("help for {}", node.name);
    node.flags.push(FlagSpec::bool(HELP_FLAG, &usage).short('h'));
    for child in &mut node.children {
        add_help_flags(child);
    }
}

/// Check the tree: unique sibling names, resolvable groups, unique flags.
pub fn validate(root: &CommandNode) -> Result<(), RegistryError> {
    validate_node(root, &[])
}

fn validate_node(node: &CommandNode, inherited: &[&FlagSpec]) -> Result<(), RegistryError> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut shorts: HashMap<char, &str> = HashMap::new();
    for f in inherited.iter().copied().chain(node.flags.iter()) {
        if !names.insert(&f.name) {
            return Err(RegistryError::DuplicateFlag {
                command: node.name.clone(),
                flag: f.name.clone(),
            });
        }
        if let Some(c) = f.shorthand {
            if let Some(first) = shorts.insert(c, &f.name) {
                return Err(RegistryError::DuplicateShorthand {
                    command: node.name.clone(),
                    shorthand: c,
                    first: first.to_string(),
                    second: f.name.clone(),
                });
            }
        }
    }

    let mut group_ids: HashSet<&str> = HashSet::new();
    for g in &node.groups {
        if !group_ids.insert(&g.id) {
            return Err(RegistryError::DuplicateGroup {
                command: node.name.clone(),
                group: g.id.clone(),
            });
        }
    }

    let mut child_names: HashSet<&str> = HashSet::new();
    for child in &node.children {
        for name in std::iter::once(&child.name).chain(child.aliases.iter()) {
            if !child_names.insert(name) {
                return Err(RegistryError::DuplicateCommand {
                    parent: node.name.clone(),
                    name: name.clone(),
                });
            }
        }
        if let Some(group) = &child.group {
            if !group_ids.contains(group.as_str()) {
                return Err(RegistryError::UnknownGroup {
                    command: child.name.clone(),
                    group: group.clone(),
                });
            }
        }
    }

    let mut passed_down: Vec<&FlagSpec> = inherited.to_vec();
    passed_down.extend(node.flags.iter().filter(|f| f.is_persistent()));
    for child in &node.children {
        validate_node(child, &passed_down)?;
    }
    Ok(())
}
