//! Integration tests for the `seqkit` binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn seqkit() -> Command {
    let mut cmd = Command::new(cargo_bin("seqkit"));
    cmd.env_remove("SEQKIT_THREADS").env_remove("RUST_LOG");
    cmd
}

#[test]
fn cli_shows_grouped_help() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("SeqKit -- a cross-platform"))
        .stdout(predicate::str::contains("Commands for Miscellaneous:"))
        .stdout(predicate::str::contains("  genautocomplete generate shell autocompletion scripts"))
        .stdout(predicate::str::contains("  version         print version information"))
        .stdout(predicate::str::contains(
            "Commands for Searching:\n\nCommands for Set Operation:\n",
        ))
        .stdout(predicate::str::contains("Commands for BAM Processing:\n\n"))
        .stdout(predicate::str::contains("Help about any command").not())
        .stdout(predicate::str::contains(
            "Use \"seqkit [command] --help\" for more information about a command.",
        ));
    Ok(())
}

#[test]
fn cli_without_arguments_prints_help() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:\n  seqkit [command]"));
    Ok(())
}

#[test]
fn cli_threads_default_follows_environment() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .env("SEQKIT_THREADS", "3")
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("SEQKIT_THREADS) (default 3)"));
    Ok(())
}

#[test]
fn cli_malformed_threads_environment_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .env("SEQKIT_THREADS", "lots")
        .arg("version")
        .assert()
        .success();
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("seqkit v{}\n", env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_subcommand_help_lists_global_flags() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .args(["version", "-h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:\n  seqkit version [flags]"))
        .stdout(predicate::str::contains("Flags:\n  -h, --help   help for version"))
        .stdout(predicate::str::contains("Global Flags:"))
        .stdout(predicate::str::contains("  -X, --infile-list string"))
        .stdout(predicate::str::contains("(default \"-\")"));
    Ok(())
}

#[test]
fn cli_help_command_is_invocable() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .args(["help", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:\n  seqkit version [flags]"));
    Ok(())
}

#[test]
fn cli_unknown_flag_exits_255_with_message_on_stdout() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .args(["version", "--no-such-flag"])
        .assert()
        .code(255)
        .stdout("unknown flag: --no-such-flag\n")
        .stderr(predicate::str::starts_with(
            "Error: unknown flag: --no-such-flag\nUsage:\n  seqkit version [flags]",
        ));
    Ok(())
}

#[test]
fn cli_unknown_command_fails() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .arg("fx3tab")
        .assert()
        .code(255)
        .stdout("unknown command \"fx3tab\" for \"seqkit\"\n");
    Ok(())
}

#[test]
fn cli_bad_threads_value_fails() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .args(["-j", "x", "version"])
        .assert()
        .code(255)
        .stdout(predicate::str::starts_with(
            "invalid argument \"x\" for \"-j, --threads\" flag",
        ));
    Ok(())
}

#[test]
fn cli_flag_without_value_fails() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .args(["version", "-j"])
        .assert()
        .code(255)
        .stdout("flag needs an argument: 'j' in -j\n");
    seqkit()
        .args(["version", "--threads"])
        .assert()
        .code(255)
        .stdout("flag needs an argument: --threads\n");
    Ok(())
}

#[test]
fn cli_bool_flags_accept_explicit_values() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .args(["version", "--quiet=false", "--id-ncbi=true"])
        .assert()
        .success()
        .stdout(format!("seqkit v{}\n", env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_help_documents_compression_levels() -> Result<(), Box<dyn std::error::Error>> {
    seqkit()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Seqkit utlizies the pgzip"))
        .stdout(predicate::str::contains(
            "  zstd     1-4     2        roughly equals to zstd 1, 3, 7, 11, respectively.",
        ));
    Ok(())
}

#[test]
fn cli_writes_completion_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.path().join("seqkit.fish");
    seqkit()
        .args(["genautocomplete", "--shell", "fish", "--file"])
        .arg(&path)
        .assert()
        .success();
    let script = fs::read_to_string(&path)?;
    assert!(script.contains("complete -c seqkit"));
    Ok(())
}
