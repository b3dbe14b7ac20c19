//! Running the command tree against process arguments.
//!
//! The tree is lowered into a `clap::Command` for parsing only; help comes
//! from [`crate::usage`], and the deepest matched node's callback receives the
//! resolved flag values. Any failure is printed once, to standard output, and
//! turned into [`EXIT_FAILURE`].

use std::ffi::OsString;
use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use clap::builder::PossibleValuesParser;
use clap::error::{ContextKind, ErrorKind};
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::command::{CommandNode, CommandRef, FlagKind, FlagSpec, FlagValue, FlagValues, Invocation};
use crate::logging;
use crate::registry::HELP_FLAG;
use crate::usage;

pub const EXIT_SUCCESS: u8 = 0;
/// The `-1` the tool has always exited with, as the host reports it.
pub const EXIT_FAILURE: u8 = 255;

/// Id of the positional arguments accepted by runnable commands.
const ARGS_ID: &str = "ARGS";

/// Lower a node and everything below it into a clap command.
pub fn clap_command(node: &CommandNode) -> Command {
    let mut cmd = Command::new(node.name.clone())
        .about(node.short.clone())
        .aliases(node.aliases.clone())
        .hide(node.hidden)
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .disable_version_flag(true)
        .args_override_self(true);
    for flag in &node.flags {
        cmd = cmd.arg(clap_arg(flag));
    }
    if node.is_runnable() {
        cmd = cmd.arg(
            Arg::new(ARGS_ID)
                .value_name("ARGS")
                .num_args(1..)
                .action(ArgAction::Append),
        );
    }
    for child in &node.children {
        cmd = cmd.subcommand(clap_command(child));
    }
    cmd
}

fn clap_arg(flag: &FlagSpec) -> Arg {
    let mut arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .help(flag.usage.clone())
        .global(flag.is_persistent());
    if let Some(c) = flag.shorthand {
        arg = arg.short(c);
    }
    match &flag.kind {
        FlagKind::Bool => arg
            .action(ArgAction::Set)
            .value_parser(value_parser!(bool))
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        FlagKind::Int => arg
            .action(ArgAction::Set)
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true),
        FlagKind::Str => arg.action(ArgAction::Set),
        FlagKind::Choice(values) => arg
            .action(ArgAction::Set)
            .value_parser(PossibleValuesParser::new(values.clone())),
    }
}

/// Read every flag that applies to `cmd` out of its matches.
fn collect_flags(cmd: &CommandRef<'_>, matches: &ArgMatches) -> FlagValues {
    let mut values = FlagValues::new();
    for flag in cmd.all_flags() {
        let name = flag.name.as_str();
        let parsed = match flag.kind {
            FlagKind::Bool => matches.get_one::<bool>(name).copied().map(FlagValue::Bool),
            FlagKind::Int => matches.get_one::<i64>(name).copied().map(FlagValue::Int),
            FlagKind::Str | FlagKind::Choice(_) => {
                matches.get_one::<String>(name).cloned().map(FlagValue::Str)
            }
        };
        let changed = matches.value_source(name) == Some(ValueSource::CommandLine);
        let value = match parsed {
            Some(v) if changed => v,
            _ => flag.default.clone(),
        };
        values.insert(name, value, changed);
    }
    values
}

/// Best guess at the command `args` address, for usage after a parse error.
fn locate<'a>(root: &CommandRef<'a>, args: &[OsString]) -> CommandRef<'a> {
    let mut cur = root.clone();
    let mut tokens = args.iter().map(|a| a.to_string_lossy().into_owned());
    while let Some(tok) = tokens.next() {
        if tok == "--" {
            break;
        }
        if let Some(long) = tok.strip_prefix("--") {
            if !long.contains('=') && cur.find_flag(long).is_some_and(|f| f.kind != FlagKind::Bool) {
                tokens.next();
            }
        } else if let Some(shorts) = tok.strip_prefix('-').filter(|s| !s.is_empty()) {
            // the first value-taking letter consumes the rest, or the next token
            for (i, c) in shorts.char_indices() {
                if cur.find_shorthand(c).is_some_and(|f| f.kind != FlagKind::Bool) {
                    if i + c.len_utf8() == shorts.len() {
                        tokens.next();
                    }
                    break;
                }
            }
        } else if let Some(child) = cur.child(&tok) {
            cur = child;
        }
    }
    cur
}

/// Describe a parse failure the way users of the tool are used to reading it.
fn parse_error_message(err: &clap::Error, target: &CommandRef<'_>, args: &[OsString]) -> String {
    let context = |kind: ContextKind| err.get(kind).map(|v| v.to_string());
    match err.kind() {
        ErrorKind::UnknownArgument => match context(ContextKind::InvalidArg) {
            Some(arg) if arg.starts_with("--") => format!("unknown flag: {}", arg),
            Some(arg) => {
                let letter = arg.trim_start_matches('-').chars().next().unwrap_or('-');
                format!("unknown shorthand flag: '{}' in {}", letter, arg)
            }
            None => fallback_message(err),
        },
        ErrorKind::InvalidSubcommand => match context(ContextKind::InvalidSubcommand) {
            Some(name) => format!(
                "unknown command {:?} for {:?}",
                name,
                target.command_path()
            ),
            None => fallback_message(err),
        },
        ErrorKind::InvalidValue | ErrorKind::ValueValidation => {
            let (Some(arg), Some(value)) = (
                context(ContextKind::InvalidArg),
                context(ContextKind::InvalidValue),
            ) else {
                return fallback_message(err);
            };
            let flag = flag_for_arg(&arg, target);
            if value.is_empty() && err.kind() == ErrorKind::InvalidValue {
                if let Some(f) = flag {
                    return missing_value_message(f, args);
                }
            }
            let display = match flag {
                Some(f) => match f.shorthand {
                    Some(c) => format!("-{}, --{}", c, f.name),
                    None => format!("--{}", f.name),
                },
                None => arg.clone(),
            };
            let reason = match err.kind() {
                ErrorKind::InvalidValue => context(ContextKind::ValidValue)
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("possible values: {}", v)),
                _ => std::error::Error::source(err).map(|e| e.to_string()),
            };
            match reason {
                Some(reason) => format!(
                    "invalid argument {:?} for {:?} flag: {}",
                    value, display, reason
                ),
                None => format!("invalid argument {:?} for {:?} flag", value, display),
            }
        }
        _ => fallback_message(err),
    }
}

/// The flag behind clap's rendering of an arg, e.g. `-j, --threads <threads>`.
fn flag_for_arg<'a>(arg: &str, target: &CommandRef<'a>) -> Option<&'a FlagSpec> {
    let token = arg
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_start_matches('-')
        .trim_end_matches(',');
    let mut letters = token.chars();
    match (letters.next(), letters.next()) {
        (Some(c), None) => target.find_shorthand(c),
        _ => target.find_flag(token),
    }
}

/// Name the flag the way it was typed: `'j' in -qj` or `--threads`.
fn missing_value_message(flag: &FlagSpec, args: &[OsString]) -> String {
    let long = format!("--{}", flag.name);
    for tok in args.iter().rev().map(|a| a.to_string_lossy()) {
        if tok == long {
            break;
        }
        if let Some(c) = flag.shorthand {
            if tok.len() > 1 && tok.starts_with('-') && !tok.starts_with("--") && tok.ends_with(c) {
                return format!("flag needs an argument: '{}' in {}", c, tok);
            }
        }
    }
    format!("flag needs an argument: {}", long)
}

fn fallback_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// The immutable command tree plus the execute/error/exit contract.
pub struct App {
    root: CommandNode,
}

impl App {
    pub fn new(root: CommandNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Run against `argv` (program name first) on the real stdout/stderr.
    pub fn run<I, T>(&self, argv: I) -> u8
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.run_with(argv, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Run with explicit sinks; returns the process exit status.
    pub fn run_with<I, T>(&self, argv: I, out: &mut dyn Write, err: &mut dyn Write) -> u8
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        match self.execute(argv, out, err) {
            Ok(()) => {
                let _ = out.flush();
                EXIT_SUCCESS
            }
            Err(e) => {
                let _ = writeln!(out, "{:#}", e);
                let _ = out.flush();
                EXIT_FAILURE
            }
        }
    }

    /// Parse, pick the deepest matching command and run it.
    pub fn execute<I, T>(&self, argv: I, out: &mut dyn Write, err: &mut dyn Write) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let root = CommandRef::root(&self.root);

        let matches = match clap_command(&self.root).try_get_matches_from(&argv) {
            Ok(m) => m,
            Err(e) => {
                let args = argv.get(1..).unwrap_or_default();
                let target = locate(&root, args);
                let msg = parse_error_message(&e, &target, args);
                writeln!(err, "Error: {}", msg)?;
                write!(err, "{}", usage::render_usage(&target, ""))?;
                return Err(anyhow!(msg));
            }
        };

        let mut cmd = root;
        let mut sub = &matches;
        while let Some((name, next)) = sub.subcommand() {
            cmd = cmd
                .child(name)
                .with_context(|| format!("unknown command {:?}", name))?;
            sub = next;
        }

        let flags = collect_flags(&cmd, sub);
        logging::init(flags.get_bool("quiet").unwrap_or(false));

        let node = cmd.node();
        if flags.get_bool(HELP_FLAG).unwrap_or(false) {
            write!(out, "{}", usage::render_help(&cmd))?;
            return Ok(());
        }
        if let Some(msg) = &node.deprecated {
            writeln!(err, "Command {:?} is deprecated, {}", node.name, msg)?;
        }
        let Some(run) = node.runner() else {
            write!(out, "{}", usage::render_help(&cmd))?;
            return Ok(());
        };

        let args: Vec<String> = sub
            .get_many::<String>(ARGS_ID)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        let inv = Invocation {
            root: &self.root,
            path: cmd.names(),
            flags,
            args,
        };
        tracing::debug!(
            command = %inv.command_path(),
            threads = inv.flags.get_int("threads").unwrap_or_default(),
            args = inv.args.len(),
            "dispatching"
        );
        run(&inv, out)
    }
}
