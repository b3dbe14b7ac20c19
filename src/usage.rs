//! Help and usage text.
//!
//! Every section is a separate pure function over a [`CommandRef`], so the
//! layout can be checked piece by piece. Nothing here writes to a stream.
//!
//! ```text
//! Usage:
//!   seqkit [command]
//!
//! Commands for Basic Operation:
//!
//! ...
//!
//! Commands for Miscellaneous:
//!   genautocomplete generate shell autocompletion scripts
//!   version         print version information
//!
//! Flags:
//!   ...
//! ```

use crate::command::{CommandNode, CommandRef, FlagKind, FlagSpec};

/// Column at which flag descriptions are wrapped.
pub const FLAG_USAGE_WIDTH: usize = 110;

const MIN_NAME_PADDING: usize = 11;
const MIN_PATH_PADDING: usize = 11;
const MIN_WRAP: usize = 24;

/// Full help: description, a blank line, then the usage block.
pub fn render_help(cmd: &CommandRef<'_>) -> String {
    let node = cmd.node();
    let mut out = String::new();
    let about = if node.long.is_empty() {
        &node.short
    } else {
        &node.long
    };
    let about = about.trim_end();
    if !about.is_empty() {
        out.push_str(about);
        out.push_str("\n\n");
    }
    if node.is_runnable() || node.has_subcommands() {
        out.push_str(&render_usage(cmd, ""));
    }
    out
}

/// The usage block; `extra` is appended after the usage lines, separated by
/// one space. With no `extra` the usage lines carry no trailing space.
pub fn render_usage(cmd: &CommandRef<'_>, extra: &str) -> String {
    let mut out = usage_section(cmd);
    if !extra.is_empty() {
        out.push(' ');
        out.push_str(extra);
    }
    let sections = [
        aliases_section(cmd),
        examples_section(cmd),
        commands_section(cmd),
        local_flags_section(cmd),
        inherited_flags_section(cmd),
        help_topics_section(cmd),
        help_hint(cmd),
    ];
    for section in sections.into_iter().flatten() {
        out.push_str("\n\n");
        out.push_str(&section);
    }
    out.push('\n');
    out
}

/// `seqkit version [flags]`, or the bare path when there are no flags.
pub fn use_line(cmd: &CommandRef<'_>) -> String {
    let path = cmd.command_path();
    if cmd.all_flags().is_empty() {
        path
    } else {
        format!("{} [flags]", path)
    }
}

fn usage_section(cmd: &CommandRef<'_>) -> String {
    let node = cmd.node();
    let mut out = String::from("Usage:");
    if node.is_runnable() {
        out.push_str("\n  ");
        out.push_str(&use_line(cmd));
    }
    if node.has_available_subcommands() {
        out.push_str(&format!("\n  {} [command]", cmd.command_path()));
    }
    out
}

fn aliases_section(cmd: &CommandRef<'_>) -> Option<String> {
    let node = cmd.node();
    if node.aliases.is_empty() {
        return None;
    }
    let mut names = vec![node.name.as_str()];
    names.extend(node.aliases.iter().map(String::as_str));
    Some(format!("Aliases:\n  {}", names.join(", ")))
}

fn examples_section(cmd: &CommandRef<'_>) -> Option<String> {
    let example = &cmd.node().example;
    if example.is_empty() {
        return None;
    }
    Some(format!("Examples:\n{}", example))
}

/// Shown in a commands listing. `help` is exempt from the availability rule
/// as long as it is not hidden.
fn is_listed(c: &CommandNode) -> bool {
    c.is_available() || (c.name == "help" && !c.hidden)
}

fn name_padding(node: &CommandNode) -> usize {
    node.children
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max(MIN_NAME_PADDING)
}

fn command_line(c: &CommandNode, pad: usize) -> String {
    format!("  {:<pad$} {}", c.name, c.short, pad = pad)
        .trim_end()
        .to_string()
}

/// Subcommands, flat or split by group.
pub fn commands_section(cmd: &CommandRef<'_>) -> Option<String> {
    let node = cmd.node();
    if !node.has_available_subcommands() {
        return None;
    }
    let pad = name_padding(node);
    let mut listed: Vec<&CommandNode> = node.children.iter().filter(|c| is_listed(c)).collect();
    listed.sort_by(|a, b| a.name.cmp(&b.name));

    let render = |title: &str, members: &[&CommandNode]| -> String {
        let mut s = title.to_string();
        for c in members {
            s.push('\n');
            s.push_str(&command_line(c, pad));
        }
        s
    };

    if !node.children.iter().any(|c| c.group.is_some()) {
        return Some(render("Available Commands:", &listed));
    }

    let mut sections = Vec::new();
    for group in &node.groups {
        let members: Vec<&CommandNode> = listed
            .iter()
            .copied()
            .filter(|c| c.group.as_deref() == Some(group.id.as_str()))
            .collect();
        sections.push(render(&group.title, &members));
    }
    let ungrouped: Vec<&CommandNode> = listed.iter().copied().filter(|c| c.group.is_none()).collect();
    if !ungrouped.is_empty() {
        sections.push(render("Additional Commands:", &ungrouped));
    }
    Some(sections.join("\n\n"))
}

fn local_flags_section(cmd: &CommandRef<'_>) -> Option<String> {
    let flags = cmd.local_flags();
    if flags.is_empty() {
        return None;
    }
    Some(format!("Flags:\n{}", flag_table(&flags, FLAG_USAGE_WIDTH).trim_end()))
}

fn inherited_flags_section(cmd: &CommandRef<'_>) -> Option<String> {
    let local = cmd.local_flags();
    let flags: Vec<&FlagSpec> = cmd
        .inherited_flags()
        .into_iter()
        .filter(|f| !local.iter().any(|l| l.name == f.name))
        .collect();
    if flags.is_empty() {
        return None;
    }
    Some(format!(
        "Global Flags:\n{}",
        flag_table(&flags, FLAG_USAGE_WIDTH).trim_end()
    ))
}

fn help_topics_section(cmd: &CommandRef<'_>) -> Option<String> {
    let node = cmd.node();
    if !node.has_help_topics() {
        return None;
    }
    let base = cmd.command_path();
    let pad = node
        .children
        .iter()
        .map(|c| base.len() + 1 + c.name.len())
        .max()
        .unwrap_or(0)
        .max(MIN_PATH_PADDING);
    let mut s = String::from("Additional help topics:");
    for c in node.children.iter().filter(|c| c.is_help_topic()) {
        let path = format!("{} {}", base, c.name);
        s.push('\n');
        s.push_str(format!("  {:<pad$} {}", path, c.short, pad = pad).trim_end());
    }
    Some(s)
}

fn help_hint(cmd: &CommandRef<'_>) -> Option<String> {
    if !cmd.node().has_available_subcommands() {
        return None;
    }
    Some(format!(
        "Use \"{} [command] --help\" for more information about a command.",
        cmd.command_path()
    ))
}

/// Aligned flag table, sorted by name, descriptions wrapped at `width`.
pub fn flag_table(flags: &[&FlagSpec], width: usize) -> String {
    let mut sorted: Vec<&FlagSpec> = flags.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let rows: Vec<(String, String)> = sorted
        .iter()
        .map(|f| {
            let mut left = match f.shorthand {
                Some(c) => format!("  -{}, --{}", c, f.name),
                None => format!("      --{}", f.name),
            };
            if f.kind != FlagKind::Bool {
                left.push(' ');
                left.push_str(f.kind.type_name());
            }
            let mut usage = f.usage.clone();
            if let Some(default) = f.default_text() {
                usage.push_str(&format!(" (default {})", default));
            }
            (left, usage)
        })
        .collect();

    // one column of slack after the widest left side, then two spaces
    let col = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 1;
    let mut out = String::new();
    for (left, usage) in rows {
        let line = format!(
            "{:<col$}  {}",
            left,
            wrap(col + 2, width, &usage),
            col = col
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Greedy word wrap for text starting at column `indent`. Continuation lines
/// are indented to `indent`. Too narrow a column disables wrapping.
fn wrap(indent: usize, width: usize, text: &str) -> String {
    let pad = format!("\n{}", " ".repeat(indent));
    let avail = width.saturating_sub(indent);
    if avail < MIN_WRAP {
        return text.replace('\n', &pad);
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut cur = String::new();
        for word in paragraph.split_whitespace() {
            if !cur.is_empty() && cur.len() + 1 + word.len() > avail {
                lines.push(std::mem::take(&mut cur));
            }
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
        }
        lines.push(cur);
    }
    lines.join(&pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, short: &str) -> CommandNode {
        CommandNode::new(name).short(short).run(|_, _| Ok(()))
    }

    fn grouped_root() -> CommandNode {
        CommandNode::new("seqkit")
            .short("toolkit")
            .add_group("basic", "Commands for Basic Operation:")
            .add_group("search", "Commands for Searching:")
            .add_group("misc", "Commands for Miscellaneous:")
            .flag(FlagSpec::int("threads", 4, "number of CPUs").short('j').persistent())
            .subcommand(leaf("grep", "search sequences").group("search"))
            .subcommand(leaf("seq", "transform sequences").group("basic"))
            .subcommand(leaf("stats", "simple statistics").group("basic"))
            .subcommand(leaf("extra", "not grouped"))
            .subcommand(leaf("secret", "hidden").group("misc").hidden())
    }

    #[test]
    fn groups_render_in_registration_order_with_fallback_last() {
        let root = grouped_root();
        let text = commands_section(&CommandRef::root(&root)).unwrap();
        assert_eq!(
            text,
            "Commands for Basic Operation:\n\
             \x20 seq         transform sequences\n\
             \x20 stats       simple statistics\n\
             \n\
             Commands for Searching:\n\
             \x20 grep        search sequences\n\
             \n\
             Commands for Miscellaneous:\n\
             \n\
             Additional Commands:\n\
             \x20 extra       not grouped"
        );
    }

    #[test]
    fn groups_without_listed_members_still_show_their_title() {
        let root = grouped_root();
        let text = render_usage(&CommandRef::root(&root), "");
        assert!(text.contains("\n\nCommands for Miscellaneous:\n\nAdditional Commands:\n"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn flat_listing_when_nothing_is_grouped() {
        let root = CommandNode::new("seqkit")
            .add_group("basic", "Commands for Basic Operation:")
            .subcommand(leaf("version", "print version"))
            .subcommand(leaf("a-very-long-command", "long"));
        let text = commands_section(&CommandRef::root(&root)).unwrap();
        assert_eq!(
            text,
            "Available Commands:\n  a-very-long-command long\n  version             print version"
        );
    }

    #[test]
    fn non_hidden_help_is_listed_even_when_not_runnable() {
        let root = CommandNode::new("seqkit")
            .subcommand(leaf("seq", "transform"))
            .subcommand(CommandNode::new("help").short("Help about any command"));
        let text = commands_section(&CommandRef::root(&root)).unwrap();
        assert!(text.contains("  help        Help about any command"));
    }

    #[test]
    fn usage_lines_and_hint() {
        let root = grouped_root();
        let r = CommandRef::root(&root);
        let text = render_usage(&r, "");
        assert!(text.starts_with("Usage:\n  seqkit [command]\n\n"));
        assert!(text.ends_with(
            "Use \"seqkit [command] --help\" for more information about a command.\n"
        ));

        let seq = r.child("seq").unwrap();
        let text = render_usage(&seq, "");
        assert!(text.starts_with("Usage:\n  seqkit seq [flags]\n\nGlobal Flags:\n"));
        assert!(!text.contains("[command]"));
        assert!(!text.contains("for more information"));
    }

    #[test]
    fn extra_suffix_follows_usage_lines() {
        let root = grouped_root();
        let text = render_usage(&CommandRef::root(&root), "\n\nExample:\n  seqkit seq -h");
        assert!(text.starts_with("Usage:\n  seqkit [command] \n\nExample:\n  seqkit seq -h\n\n"));
    }

    #[test]
    fn aliases_and_examples() {
        let root = CommandNode::new("seqkit").subcommand(
            leaf("subseq", "get subsequences")
                .alias("sub")
                .example("  seqkit subseq -r 1:12 in.fa"),
        );
        let text = render_usage(&CommandRef::root(&root).child("sub").unwrap(), "");
        assert!(text.contains("\n\nAliases:\n  subseq, sub\n\nExamples:\n  seqkit subseq -r 1:12 in.fa"));
    }

    #[test]
    fn flag_table_aligns_and_shows_defaults() {
        let a = FlagSpec::int("threads", 4, "number of CPUs").short('j');
        let b = FlagSpec::bool("quiet", "be quiet");
        let c = FlagSpec::string("out-file", "-", "out file").short('o');
        let table = flag_table(&[&a, &b, &c], FLAG_USAGE_WIDTH);
        assert_eq!(
            table,
            "  -o, --out-file string   out file (default \"-\")\n\
             \x20     --quiet             be quiet\n\
             \x20 -j, --threads int       number of CPUs (default 4)\n"
        );
    }

    #[test]
    fn long_usage_wraps_under_description_column() {
        let f = FlagSpec::string("infile-list", "", &"word ".repeat(40)).short('X');
        let table = flag_table(&[&f], 60);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines.len() > 1);
        let column = "  -X, --infile-list string   ".len();
        for line in &lines[1..] {
            assert!(line.starts_with(&" ".repeat(column)));
            assert!(line.len() <= 60);
        }
    }

    #[test]
    fn help_starts_with_long_description() {
        let root = grouped_root().long("SeqKit -- long text\n\n");
        let text = render_help(&CommandRef::root(&root));
        assert!(text.starts_with("SeqKit -- long text\n\nUsage:"));
    }

    #[test]
    fn help_topics_are_listed_with_their_path() {
        let root = CommandNode::new("seqkit")
            .subcommand(leaf("seq", "transform"))
            .subcommand(CommandNode::new("formats").short("supported file formats"));
        let text = render_usage(&CommandRef::root(&root), "");
        assert!(text.contains("Additional help topics:\n  seqkit formats supported file formats"));
    }
}
