use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use owo_colors::{OwoColorize, Stream};

use crate::{
    citation::MergeMode,
    cli::{Cli, Command, Source},
    metadata::MetaData,
};

mod archive;
mod assemble;
mod citation;
mod cli;
mod date;
mod metadata;
mod name;
mod overrides;
mod schema;
mod template;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Cite {
            from,
            url,
            merge,
            replace,
            archive,
            pretty,
            template,
        } => run_cite(&from, url, merge, replace, archive, pretty, &template),
        Command::Parse { from } => run_parse(&from),
    }
}

fn run_cite(
    sources: &[Source],
    url: Option<String>,
    merge_file: Option<PathBuf>,
    replace: bool,
    archive: bool,
    pretty: bool,
    ident: &str,
) -> anyhow::Result<()> {
    let mut ok = 0usize;
    let mut failed = 0usize;

    // Argument order is precedence order: later sources overwrite earlier
    // ones field by field, and a broken source only costs its own fields.
    let mut combined = MetaData::default();
    for source in sources {
        match read_metadata(source) {
            Ok(partial) => {
                combined = MetaData::merge(combined, partial);
                ok += 1;
            }
            Err(err) => {
                failed += 1;
                eprintln!(
                    "{} {err:#}",
                    "✗".if_supports_color(Stream::Stderr, |t| t.red())
                );
            }
        }
    }

    let page_url = url.or_else(|| combined.url.clone());
    let mut citation = assemble::to_citation(&combined);
    if let Some(u) = &page_url {
        citation.set("url", u.as_str());
        citation = assemble::apply_site_overrides(citation, u);
    }

    if archive {
        let target = page_url
            .as_deref()
            .context("--archive needs --url or a source that carries a url")?;
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("querying the Wayback Machine");
        spinner.enable_steady_tick(Duration::from_millis(80));
        let result = archive::closest_snapshot(target);
        spinner.finish_and_clear();
        match result {
            Ok(Some(snapshot)) => {
                citation = citation::merge(
                    &citation,
                    &archive::citation_fields(&snapshot),
                    MergeMode::Keep,
                );
            }
            Ok(None) => eprintln!("no snapshot archived for {target}"),
            Err(err) => {
                failed += 1;
                eprintln!(
                    "{} {err:#}",
                    "✗".if_supports_color(Stream::Stderr, |t| t.red())
                );
            }
        }
    }

    // User edits come first; freshly derived fields win on conflict. With
    // --replace, parameters only the old template carried are dropped too.
    if let Some(path) = merge_file {
        let existing = fs::read_to_string(&path)
            .with_context(|| format!("read merge target {}", path.display()))?;
        let mode = if replace {
            MergeMode::Replace
        } else {
            MergeMode::Keep
        };
        citation = citation::merge(&template::parse(&existing), &citation, mode);
    }

    println!("{}", template::generate(&citation, ident, pretty));
    eprintln!(
        "{} {}  {} {}",
        "✓".if_supports_color(Stream::Stderr, |t| t.green()),
        ok,
        "✗".if_supports_color(Stream::Stderr, |t| t.red()),
        failed
    );
    Ok(())
}

/// Reads one source and figures out what it holds: raw HTML (harvest its
/// structured-data blocks), a structured-data document, a single normalized
/// metadata record, or an array of partial records to merge.
fn read_metadata(source: &Source) -> anyhow::Result<MetaData> {
    let text = source.read()?;
    let metadata = if text.trim_start().starts_with('<') {
        let blobs = schema::harvest(&text);
        if blobs.is_empty() {
            anyhow::bail!("no structured data blocks in HTML source");
        }
        schema::scrape_all(&blobs)
    } else {
        let value: serde_json::Value =
            serde_json::from_str(&text).context("unrecognised source: neither HTML nor JSON")?;
        decode_value(&value)
    };
    anyhow::ensure!(!metadata.is_empty(), "no recognizable metadata in source");
    Ok(metadata)
}

fn decode_value(value: &serde_json::Value) -> MetaData {
    match value {
        serde_json::Value::Array(items) if items.iter().any(is_structured_node) => {
            schema::scrape_value(value)
        }
        serde_json::Value::Array(items) => items
            .iter()
            .map(MetaData::from_json)
            .fold(MetaData::default(), MetaData::merge),
        _ if is_structured_node(value) => schema::scrape_value(value),
        _ => MetaData::from_json(value),
    }
}

fn is_structured_node(value: &serde_json::Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.contains_key("@context") || obj.contains_key("@graph") || obj.contains_key("@type")
    })
}

fn run_parse(source: &Source) -> anyhow::Result<()> {
    let text = source.read()?;
    let citation = template::parse(&text);
    for (key, _) in citation.entries() {
        if !citation::KNOWN_PARAMS.contains(&key) {
            eprintln!(
                "{} unknown parameter: {key}",
                "!".if_supports_color(Stream::Stderr, |t| t.yellow())
            );
        }
    }
    let mut map = serde_json::Map::new();
    for (key, value) in citation.entries() {
        map.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(map))?
    );
    Ok(())
}
