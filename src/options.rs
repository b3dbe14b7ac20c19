//! Typed view of the persistent flags, for subcommand callbacks.
//!
//! Parsing only checks that values have the right shape; the range checks
//! and derived settings below mirror what every subcommand needs before it
//! touches any input.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use regex::Regex;

use crate::command::FlagValues;
use crate::config::NCBI_ID_REGEXP;

/// Alphabet of the sequences being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeqType {
    Dna,
    Rna,
    Protein,
    Unlimit,
    Auto,
}

impl SeqType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeqType::Dna => "dna",
            SeqType::Rna => "rna",
            SeqType::Protein => "protein",
            SeqType::Unlimit => "unlimit",
            SeqType::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        <SeqType as ValueEnum>::from_str(s, true).map_err(|_| {
            anyhow!("unsupported sequence type: {} (dna|rna|protein|unlimit|auto)", s)
        })
    }
}

/// Compression applied to the output, chosen by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCodec {
    Plain,
    Gzip,
    Xz,
    Zstd,
    Bzip2,
}

impl OutputCodec {
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".gz") {
            OutputCodec::Gzip
        } else if lower.ends_with(".xz") {
            OutputCodec::Xz
        } else if lower.ends_with(".zst") {
            OutputCodec::Zstd
        } else if lower.ends_with(".bz2") {
            OutputCodec::Bzip2
        } else {
            OutputCodec::Plain
        }
    }

    /// Valid level range and default, or `None` when levels do not apply.
    pub fn level_range(&self) -> Option<(i64, i64, i64)> {
        match self {
            OutputCodec::Gzip => Some((1, 9, 5)),
            OutputCodec::Zstd => Some((1, 4, 2)),
            OutputCodec::Bzip2 => Some((1, 9, 6)),
            OutputCodec::Xz | OutputCodec::Plain => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputCodec::Plain => "plain",
            OutputCodec::Gzip => "gzip",
            OutputCodec::Xz => "xz",
            OutputCodec::Zstd => "zstd",
            OutputCodec::Bzip2 => "bzip2",
        }
    }

    /// Resolve `--compress-level`: -1 picks the codec default.
    pub fn resolve_level(&self, level: i64) -> Result<Option<u32>> {
        let Some((min, max, default)) = self.level_range() else {
            return Ok(None);
        };
        if level == -1 {
            return Ok(Some(default as u32));
        }
        if level < min || level > max {
            bail!(
                "invalid compression level for {}: {} (valid range {}-{})",
                self.name(),
                level,
                min,
                max
            );
        }
        Ok(Some(level as u32))
    }
}

/// Where the output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: String,
    pub codec: OutputCodec,
    pub level: Option<u32>,
}

impl OutputTarget {
    pub fn is_stdout(&self) -> bool {
        self.path == "-"
    }
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub seq_type: SeqType,
    pub threads: usize,
    pub line_width: usize,
    pub id_regexp: Regex,
    pub id_ncbi: bool,
    pub out_file: OutputTarget,
    pub quiet: bool,
    pub alphabet_guess_seq_length: usize,
    pub infile_list: Option<PathBuf>,
}

impl GlobalOptions {
    pub fn from_flags(flags: &FlagValues) -> Result<Self> {
        let seq_type = SeqType::parse(flags.get_str("seq-type")?)?;

        let threads = flags.get_int("threads")?;
        if threads < 1 {
            bail!("value of -j/--threads should be greater than 0");
        }

        let line_width = flags.get_int("line-width")?;
        if line_width < 0 {
            bail!("value of -w/--line-width should not be negative");
        }

        let guess_len = flags.get_int("alphabet-guess-seq-length")?;
        if guess_len < 0 {
            bail!("value of --alphabet-guess-seq-length should not be negative");
        }

        let id_ncbi = flags.get_bool("id-ncbi")?;
        let pattern = if id_ncbi {
            NCBI_ID_REGEXP
        } else {
            flags.get_str("id-regexp")?
        };
        let id_regexp =
            Regex::new(pattern).with_context(|| format!("fail to compile regexp: {}", pattern))?;

        let path = flags.get_str("out-file")?.to_string();
        let codec = OutputCodec::from_path(&path);
        let level = codec.resolve_level(flags.get_int("compress-level")?)?;

        let infile_list = match flags.get_str("infile-list")? {
            "" => None,
            p => Some(PathBuf::from(p)),
        };

        Ok(Self {
            seq_type,
            threads: threads as usize,
            line_width: line_width as usize,
            id_regexp,
            id_ncbi,
            out_file: OutputTarget { path, codec, level },
            quiet: flags.get_bool("quiet")?,
            alphabet_guess_seq_length: guess_len as usize,
            infile_list,
        })
    }

    /// Positional inputs plus those listed in `--infile-list`; stdin if none.
    pub fn input_files(&self, args: &[String]) -> Result<Vec<String>> {
        input_files(args, self.infile_list.as_deref())
    }
}

/// Positional files followed by the non-empty lines of `list`, or `["-"]`.
pub fn input_files(args: &[String], list: Option<&Path>) -> Result<Vec<String>> {
    let mut files: Vec<String> = args.to_vec();
    if let Some(list) = list {
        let text = fs::read_to_string(list)
            .with_context(|| format!("fail to read infile list: {}", list.display()))?;
        let before = files.len();
        files.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
        tracing::debug!(
            count = files.len() - before,
            list = %list.display(),
            "read input files from list"
        );
    }
    if files.is_empty() {
        files.push("-".to_string());
    }
    Ok(files)
}
