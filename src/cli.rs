use std::{fs, path::PathBuf, str::FromStr};

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a citation template from one or more metadata sources
    Cite {
        #[arg(value_name = "SRC")]
        from: Vec<Source>,
        /// Page URL: fills |url= and applies per-site fixed fields
        #[arg(long, value_name = "URL")]
        url: Option<String>,
        /// Existing template text to fold the fresh fields into
        #[arg(long, value_name = "FILE")]
        merge: Option<PathBuf>,
        /// With --merge: drop parameters the fresh record no longer carries
        #[arg(long, requires = "merge")]
        replace: bool,
        /// Look up a Wayback Machine snapshot of the page URL
        #[arg(long)]
        archive: bool,
        /// One parameter per line instead of a single line
        #[arg(long)]
        pretty: bool,
        /// Template identifier to emit
        #[arg(long, value_name = "IDENT", default_value = "citation")]
        template: String,
    },
    /// Parse citation template text back into a JSON record
    Parse {
        #[arg(value_name = "SRC")]
        from: Source,
    },
}

#[derive(Clone, Debug)]
/// Where source text comes from: a file on disk, or the argument itself
/// (a JSON record, a structured-data blob, raw HTML, or template text).
pub enum Source {
    File(PathBuf),
    Inline(String),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // No validation at the CLI layer; sniffing out what the text
        // actually holds happens when it is read.

        // Is this a path?
        if let Ok(path) = fs::canonicalize(s) {
            Ok(Source::File(path))
        }
        // No? Treat the argument itself as the document.
        else {
            Ok(Source::Inline(s.to_string()))
        }
    }
}

impl Source {
    pub fn read(&self) -> anyhow::Result<String> {
        match self {
            Source::File(path) => fs::read_to_string(path)
                .with_context(|| format!("read source file {}", path.display())),
            Source::Inline(text) => Ok(text.clone()),
        }
    }
}
