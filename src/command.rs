//! The command tree data model.
//!
//! A [`CommandNode`] is built once at startup and never mutated afterwards.
//! Subcommand implementations live outside this module and are attached as
//! opaque [`RunFn`] callbacks.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Write;

use anyhow::Result;

use crate::error::FlagError;
use crate::options::GlobalOptions;

/// Callback invoked for a matched command with its resolved flags and output sink.
pub type RunFn = Box<dyn Fn(&Invocation<'_>, &mut dyn Write) -> Result<()> + Send + Sync>;

/// A help-text category for subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub title: String,
}

impl Group {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Whether a flag is inherited by all descendants or belongs to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagScope {
    Persistent,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagKind {
    Str,
    Int,
    Bool,
    /// A string restricted to the listed values.
    Choice(Vec<String>),
}

impl FlagKind {
    /// Type word shown in help tables and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FlagKind::Str | FlagKind::Choice(_) => "string",
            FlagKind::Int => "int",
            FlagKind::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl FlagValue {
    fn type_name(&self) -> &'static str {
        match self {
            FlagValue::Str(_) => "string",
            FlagValue::Int(_) => "int",
            FlagValue::Bool(_) => "bool",
        }
    }
}

/// Declaration of a single flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    pub shorthand: Option<char>,
    pub kind: FlagKind,
    pub default: FlagValue,
    pub usage: String,
    pub scope: FlagScope,
}

impl FlagSpec {
    fn new(name: &str, kind: FlagKind, default: FlagValue, usage: &str) -> Self {
        Self {
            name: name.to_string(),
            shorthand: None,
            kind,
            default,
            usage: usage.to_string(),
            scope: FlagScope::Local,
        }
    }

    pub fn string(name: &str, default: &str, usage: &str) -> Self {
        Self::new(name, FlagKind::Str, FlagValue::Str(default.to_string()), usage)
    }

    pub fn int(name: &str, default: i64, usage: &str) -> Self {
        Self::new(name, FlagKind::Int, FlagValue::Int(default), usage)
    }

    pub fn bool(name: &str, usage: &str) -> Self {
        Self::new(name, FlagKind::Bool, FlagValue::Bool(false), usage)
    }

    pub fn choice(name: &str, values: &[&str], default: &str, usage: &str) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        Self::new(
            name,
            FlagKind::Choice(values),
            FlagValue::Str(default.to_string()),
            usage,
        )
    }

    /// One-letter alias, e.g. `-j` for `--threads`.
    pub fn short(mut self, c: char) -> Self {
        self.shorthand = Some(c);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.scope = FlagScope::Persistent;
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.scope == FlagScope::Persistent
    }

    /// Default as shown in help, or `None` for a zero value.
    pub fn default_text(&self) -> Option<String> {
        match &self.default {
            FlagValue::Str(s) if s.is_empty() => None,
            FlagValue::Str(s) => Some(format!("{:?}", s)),
            FlagValue::Int(0) => None,
            FlagValue::Int(n) => Some(n.to_string()),
            FlagValue::Bool(false) => None,
            FlagValue::Bool(true) => Some("true".to_string()),
        }
    }
}

/// One node of the command tree.
pub struct CommandNode {
    pub name: String,
    pub short: String,
    pub long: String,
    pub example: String,
    pub aliases: Vec<String>,
    /// Id of a [`Group`] registered on the parent.
    pub group: Option<String>,
    /// Groups classifying this node's own children, in display order.
    pub groups: Vec<Group>,
    pub flags: Vec<FlagSpec>,
    pub children: Vec<CommandNode>,
    pub hidden: bool,
    pub deprecated: Option<String>,
    run: Option<RunFn>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: String::new(),
            long: String::new(),
            example: String::new(),
            aliases: Vec::new(),
            group: None,
            groups: Vec::new(),
            flags: Vec::new(),
            children: Vec::new(),
            hidden: false,
            deprecated: None,
            run: None,
        }
    }

    pub fn short(mut self, s: impl Into<String>) -> Self {
        self.short = s.into();
        self
    }

    pub fn long(mut self, s: impl Into<String>) -> Self {
        self.long = s.into();
        self
    }

    pub fn example(mut self, s: impl Into<String>) -> Self {
        self.example = s.into();
        self
    }

    pub fn alias(mut self, a: impl Into<String>) -> Self {
        self.aliases.push(a.into());
        self
    }

    pub fn group(mut self, id: impl Into<String>) -> Self {
        self.group = Some(id.into());
        self
    }

    pub fn add_group(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.groups.push(Group::new(id, title));
        self
    }

    pub fn flag(mut self, spec: FlagSpec) -> Self {
        self.flags.push(spec);
        self
    }

    pub fn subcommand(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self, msg: impl Into<String>) -> Self {
        self.deprecated = Some(msg.into());
        self
    }

    pub fn run<F>(mut self, f: F) -> Self
    where
        F: Fn(&Invocation<'_>, &mut dyn Write) -> Result<()> + Send + Sync + 'static,
    {
        self.run = Some(Box::new(f));
        self
    }

    pub fn runner(&self) -> Option<&RunFn> {
        self.run.as_ref()
    }

    pub fn is_runnable(&self) -> bool {
        self.run.is_some()
    }

    pub fn has_subcommands(&self) -> bool {
        !self.children.is_empty()
    }

    /// Listed in help: not hidden, not deprecated, and doing something.
    pub fn is_available(&self) -> bool {
        if self.hidden || self.deprecated.is_some() {
            return false;
        }
        self.is_runnable() || self.has_available_subcommands()
    }

    pub fn has_available_subcommands(&self) -> bool {
        self.children.iter().any(CommandNode::is_available)
    }

    /// A pure documentation entry: nothing to run, nothing below it.
    pub fn is_help_topic(&self) -> bool {
        !self.is_runnable()
            && !self.has_available_subcommands()
            && !self.hidden
            && self.deprecated.is_none()
            && self.name != "help"
    }

    pub fn has_help_topics(&self) -> bool {
        self.children.iter().any(CommandNode::is_help_topic)
    }

    /// Find a direct child by name or alias.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children
            .iter()
            .find(|c| c.name == name || c.aliases.iter().any(|a| a == name))
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("groups", &self.groups)
            .field("flags", &self.flags)
            .field("children", &self.children)
            .field("hidden", &self.hidden)
            .field("runnable", &self.is_runnable())
            .finish()
    }
}

/// A node together with its ancestors, root first.
#[derive(Debug, Clone)]
pub struct CommandRef<'a> {
    chain: Vec<&'a CommandNode>,
}

impl<'a> CommandRef<'a> {
    pub fn root(node: &'a CommandNode) -> Self {
        Self { chain: vec![node] }
    }

    pub fn node(&self) -> &'a CommandNode {
        self.chain[self.chain.len() - 1]
    }

    pub fn parent(&self) -> Option<&'a CommandNode> {
        self.chain.len().checked_sub(2).map(|i| self.chain[i])
    }

    pub fn is_root(&self) -> bool {
        self.chain.len() == 1
    }

    pub fn child(&self, name: &str) -> Option<Self> {
        let child = self.node().child(name)?;
        let mut chain = self.chain.clone();
        chain.push(child);
        Some(Self { chain })
    }

    /// Walk down `path`; `None` as soon as a segment does not match.
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<Self> {
        let mut cur = self.clone();
        for seg in path {
            cur = cur.child(seg.as_ref())?;
        }
        Some(cur)
    }

    /// Names from the root down, e.g. `["seqkit", "version"]`.
    pub fn names(&self) -> Vec<String> {
        self.chain.iter().map(|n| n.name.clone()).collect()
    }

    pub fn command_path(&self) -> String {
        self.names().join(" ")
    }

    /// Persistent flags declared on ancestors, nearest ancestor last.
    pub fn inherited_flags(&self) -> Vec<&'a FlagSpec> {
        self.chain[..self.chain.len() - 1]
            .iter()
            .flat_map(|n| n.flags.iter().filter(|f| f.is_persistent()))
            .collect()
    }

    /// Flags declared on this node, whatever their scope.
    pub fn local_flags(&self) -> Vec<&'a FlagSpec> {
        self.node().flags.iter().collect()
    }

    /// Every flag that applies when this node is invoked.
    pub fn all_flags(&self) -> Vec<&'a FlagSpec> {
        let mut flags = self.inherited_flags();
        flags.extend(self.local_flags());
        flags
    }

    pub fn find_flag(&self, name: &str) -> Option<&'a FlagSpec> {
        self.all_flags().into_iter().find(|f| f.name == name)
    }

    pub fn find_shorthand(&self, c: char) -> Option<&'a FlagSpec> {
        self.all_flags()
            .into_iter()
            .find(|f| f.shorthand == Some(c))
    }
}

/// Parsed flag values of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagValues {
    values: HashMap<String, FlagValue>,
    changed: HashSet<String>,
}

impl FlagValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; `changed` marks it as given on the command line.
    pub fn insert(&mut self, name: &str, value: FlagValue, changed: bool) {
        self.values.insert(name.to_string(), value);
        if changed {
            self.changed.insert(name.to_string());
        } else {
            self.changed.remove(name);
        }
    }

    fn lookup(&self, name: &str) -> Result<&FlagValue, FlagError> {
        self.values
            .get(name)
            .ok_or_else(|| FlagError::Undefined(name.to_string()))
    }

    pub fn get_str(&self, name: &str) -> Result<&str, FlagError> {
        match self.lookup(name)? {
            FlagValue::Str(s) => Ok(s),
            other => Err(FlagError::WrongType {
                flag: name.to_string(),
                expected: "string",
                actual: other.type_name(),
            }),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, FlagError> {
        match self.lookup(name)? {
            FlagValue::Int(n) => Ok(*n),
            other => Err(FlagError::WrongType {
                flag: name.to_string(),
                expected: "int",
                actual: other.type_name(),
            }),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, FlagError> {
        match self.lookup(name)? {
            FlagValue::Bool(b) => Ok(*b),
            other => Err(FlagError::WrongType {
                flag: name.to_string(),
                expected: "bool",
                actual: other.type_name(),
            }),
        }
    }

    /// Whether the user set this flag explicitly.
    pub fn changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }
}

/// What a command callback receives.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub root: &'a CommandNode,
    /// Matched command names, root first.
    pub path: Vec<String>,
    pub flags: FlagValues,
    /// Positional arguments, in order.
    pub args: Vec<String>,
}

impl<'a> Invocation<'a> {
    pub fn command_path(&self) -> String {
        self.path.join(" ")
    }

    /// Typed, validated view of the persistent flags.
    pub fn options(&self) -> Result<GlobalOptions> {
        GlobalOptions::from_flags(&self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> CommandNode {
        CommandNode::new("seqkit")
            .flag(FlagSpec::int("threads", 4, "number of CPUs").short('j').persistent())
            .flag(FlagSpec::bool("local-only", "root only"))
            .subcommand(
                CommandNode::new("seq")
                    .alias("sequence")
                    .flag(FlagSpec::bool("reverse", "reverse sequence").short('r'))
                    .run(|_, _| Ok(())),
            )
            .subcommand(CommandNode::new("docs").short("documentation topic"))
    }

    #[test]
    fn command_ref_walks_names_and_aliases() {
        let root = tree();
        let r = CommandRef::root(&root);
        let seq = r.descend(&["sequence"]).unwrap();
        assert_eq!(seq.command_path(), "seqkit seq");
        assert_eq!(seq.parent().unwrap().name, "seqkit");
        assert!(r.descend(&["nope"]).is_none());
    }

    #[test]
    fn inherited_flags_skip_local_ancestor_flags() {
        let root = tree();
        let seq = CommandRef::root(&root).child("seq").unwrap();
        let inherited: Vec<_> = seq.inherited_flags().iter().map(|f| f.name.clone()).collect();
        assert_eq!(inherited, vec!["threads"]);
        assert_eq!(seq.find_shorthand('j').unwrap().name, "threads");
        assert!(seq.find_flag("local-only").is_none());
    }

    #[test]
    fn availability_and_help_topics() {
        let root = tree();
        assert!(root.child("seq").unwrap().is_available());
        let docs = root.child("docs").unwrap();
        assert!(!docs.is_available());
        assert!(docs.is_help_topic());
        assert!(root.has_help_topics());
        assert!(!CommandNode::new("x").hidden().run(|_, _| Ok(())).is_available());
    }

    #[test]
    fn default_text_hides_zero_values() {
        assert_eq!(FlagSpec::string("out-file", "-", "").default_text(), Some("\"-\"".into()));
        assert_eq!(FlagSpec::string("infile-list", "", "").default_text(), None);
        assert_eq!(FlagSpec::int("compress-level", -1, "").default_text(), Some("-1".into()));
        assert_eq!(FlagSpec::int("n", 0, "").default_text(), None);
        assert_eq!(FlagSpec::bool("quiet", "").default_text(), None);
    }

    #[test]
    fn flag_values_are_typed() {
        let mut values = FlagValues::new();
        values.insert("threads", FlagValue::Int(8), true);
        values.insert("quiet", FlagValue::Bool(false), false);
        assert_eq!(values.get_int("threads"), Ok(8));
        assert!(values.changed("threads"));
        assert!(!values.changed("quiet"));
        assert_eq!(
            values.get_bool("threads"),
            Err(FlagError::WrongType {
                flag: "threads".into(),
                expected: "bool",
                actual: "int",
            })
        );
        assert_eq!(values.get_str("nope"), Err(FlagError::Undefined("nope".into())));
    }
}
