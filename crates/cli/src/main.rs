// ABOUTME: CLI binary for the web2api locator engine.
// ABOUTME: Matches a locator path against an HTML file, or queries a configured host page.

mod telemetry;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use web2api_locator::{
    HostRegistry, HtmlTree, LocatorPath, ParseMode, PathMatcher, Session, TrustModel,
    DEFAULT_HOST_FILE_EXT,
};

#[derive(Parser, Debug)]
#[command(name = "web2api")]
#[command(about = "Locate page elements by fuzzy ancestor paths and print them as JSON")]
struct Args {
    /// Output compact JSON instead of pretty
    #[arg(long, global = true)]
    compact: bool,

    /// Print elapsed time in ms to stderr
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match one locator path against a local HTML file
    Match {
        /// Locator path, e.g. "<href><a>,product-link<li>,item"
        #[arg(long)]
        path: String,

        /// JSON file holding the trust model parameters
        #[arg(long)]
        rating: PathBuf,

        /// HTML file to search
        #[arg(long)]
        html: PathBuf,

        /// Reject malformed paths instead of dropping what cannot be parsed
        #[arg(long)]
        strict: bool,
    },
    /// Run a page query against a host loaded from a config directory
    Query {
        /// Directory holding host config files
        #[arg(long)]
        hosts: PathBuf,

        /// Host config file extension
        #[arg(long, default_value = DEFAULT_HOST_FILE_EXT)]
        ext: String,

        /// Host name or URL of the site
        hostname: String,

        /// Page id within the host
        page_id: String,

        /// Use this HTML file instead of fetching (requires --url)
        #[arg(long, requires = "url")]
        html: Option<PathBuf>,

        /// Address the HTML file was saved from
        #[arg(long)]
        url: Option<String>,
    },
}

/// One accepted node, as printed by `match`.
#[derive(Debug, Serialize)]
struct MatchOutput {
    tag: String,
    id: String,
    class: String,
    depth: usize,
    trust: f64,
    value: Option<String>,
}

fn run_match(path: &str, rating: &Path, html: &Path, strict: bool) -> Result<serde_json::Value> {
    let mode = if strict {
        ParseMode::Strict
    } else {
        ParseMode::Permissive
    };
    let path = LocatorPath::parse_with(path, mode)?;

    let rating = fs::read_to_string(rating)
        .with_context(|| format!("reading rating file {}", rating.display()))?;
    let rating: serde_json::Value = serde_json::from_str(&rating).context("parsing rating file")?;
    let model = TrustModel::from_value(&rating)?;

    let html = fs::read_to_string(html)
        .with_context(|| format!("reading HTML file {}", html.display()))?;
    let tree = HtmlTree::parse_document(&html);

    let outputs: Vec<MatchOutput> = PathMatcher::new(&model)
        .find_all(&tree, &path)
        .into_iter()
        .filter_map(|m| {
            let node = tree.node(m.node)?;
            Some(MatchOutput {
                tag: node.tag().to_string(),
                id: node.id().to_string(),
                class: node.class_value().to_string(),
                depth: node.depth(),
                trust: m.trust,
                value: tree.resolve(m.node, path.target()),
            })
        })
        .collect();
    info!(path = %path, matches = outputs.len(), "match finished");
    Ok(serde_json::to_value(outputs)?)
}

async fn run_query(
    hosts: &Path,
    ext: &str,
    hostname: &str,
    page_id: &str,
    html: Option<&Path>,
    url: Option<&str>,
) -> Result<serde_json::Value> {
    let mut registry = HostRegistry::new();
    registry.load_dir(hosts, ext)?;
    let host = registry.host(hostname)?;
    info!(
        domain = %host.domain(),
        page = page_id,
        offline = html.is_some(),
        "running page query"
    );

    let result = match (html, url) {
        (Some(html), Some(url)) => {
            let html = fs::read_to_string(html)
                .with_context(|| format!("reading HTML file {}", html.display()))?;
            host.query_html(page_id, url, &html)?
        }
        (Some(_), None) => bail!("--url is required when using --html"),
        _ => {
            let session = Session::builder().build()?;
            host.query(&session, page_id).await?
        }
    };
    Ok(serde_json::to_value(result)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let args = Args::parse();

    let start = Instant::now();
    let result = match &args.command {
        Command::Match {
            path,
            rating,
            html,
            strict,
        } => run_match(path, rating, html, *strict),
        Command::Query {
            hosts,
            ext,
            hostname,
            page_id,
            html,
            url,
        } => {
            run_query(
                hosts,
                ext,
                hostname,
                page_id,
                html.as_deref(),
                url.as_deref(),
            )
            .await
        }
    };
    let elapsed = start.elapsed();

    let code = match result.and_then(|value| {
        if args.compact {
            Ok(serde_json::to_string(&value)?)
        } else {
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    };

    if args.timing {
        eprintln!("elapsed: {}ms", elapsed.as_millis());
    }
    code
}
