//! Error types.
//!
//! Tree construction failures are [`RegistryError`]s and abort startup.
//! Everything that goes wrong while running a command is an `anyhow::Error`
//! caught once by the dispatcher.

use thiserror::Error;

/// A misconfigured command tree, detected while it is being built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command \"{name}\" is registered twice under \"{parent}\"")]
    DuplicateCommand { parent: String, name: String },

    #[error("command \"{command}\" refers to unknown group \"{group}\"")]
    UnknownGroup { command: String, group: String },

    #[error("group \"{group}\" is registered twice on \"{command}\"")]
    DuplicateGroup { command: String, group: String },

    #[error("flag \"--{flag}\" is declared twice for \"{command}\"")]
    DuplicateFlag { command: String, flag: String },

    #[error("shorthand \"-{shorthand}\" is used by both \"--{first}\" and \"--{second}\" in \"{command}\"")]
    DuplicateShorthand {
        command: String,
        shorthand: char,
        first: String,
        second: String,
    },
}

/// A callback asked for a flag value that does not exist or has another type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("flag accessed but not defined: {0}")]
    Undefined(String),

    #[error("trying to get {expected} value of flag of type {actual}: {flag}")]
    WrongType {
        flag: String,
        expected: &'static str,
        actual: &'static str,
    },
}
