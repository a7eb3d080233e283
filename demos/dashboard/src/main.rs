//! Dashboard Example
//!
//! A command-line stand-in for the web dashboard: the user picks a backend
//! by name and supplies its options as JSON, or runs the queries configured
//! in `qfactory.toml`.
//!
//! The CouchDB and HTTP JSON plugins are linked in below; they become
//! available without the core knowing about them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package qfactory-dashboard -- --list
//! cargo run --package qfactory-dashboard -- --backend bigquery \
//!     --options '{"sql_statement": "select count(*) as the_number from `orders`"}'
//! cargo run --package qfactory-dashboard -- --config qfactory.toml --all
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use qfactory::prelude::*;

use qfactory_plugin_couchdb as _;
use qfactory_plugin_http_json as _;

#[derive(Parser, Debug)]
#[command(version, about = "Fill dashboard metrics through qfactory backends")]
struct Args {
    /// Backend to run, e.g. "mongodb", "bigquery", "couchdb"
    #[arg(short, long, conflicts_with_all = ["query", "all"])]
    backend: Option<String>,

    /// Backend options as a JSON object
    #[arg(short, long, default_value = "{}", requires = "backend")]
    options: String,

    /// Run a query configured under [queries.<name>]
    #[arg(short, long, conflicts_with = "all")]
    query: Option<String>,

    /// Run every configured query
    #[arg(short, long)]
    all: bool,

    /// List the available backends and plugin discovery results
    #[arg(short, long)]
    list: bool,

    /// Configuration file (defaults to qfactory.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_options(raw: &str) -> Result<Configuration> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--options is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => bail!("--options must be a JSON object, got {other}"),
    }
}

fn print_backends(runtime: &QueryRuntime) {
    println!("Backends:");
    for name in runtime.factory().backends() {
        println!("  {name}");
    }

    let report = runtime.report();
    println!("{report}");
    for failure in &report.failed {
        println!("  failed: {failure}");
    }
    for skipped in &report.skipped {
        println!("  skipped: {skipped}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = QueryRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build().context("failed to load configuration")?;

    if args.list {
        print_backends(&runtime);
    }

    if let Some(backend) = &args.backend {
        let options = parse_options(&args.options)?;
        let value = runtime.run(backend, &options).await?;
        println!("{backend}: {value}");
    } else if let Some(query) = &args.query {
        let value = runtime.run_query(query).await?;
        println!("{query}: {value}");
    } else if args.all {
        let mut failed = 0;
        for (name, result) in runtime.run_all().await {
            match result {
                Ok(value) => println!("{name}: {value}"),
                Err(e) => {
                    failed += 1;
                    eprintln!("{name}: {e}");
                }
            }
        }
        if failed > 0 {
            bail!("{failed} quer{} failed", if failed == 1 { "y" } else { "ies" });
        }
    } else if !args.list {
        bail!("nothing to do; pass --backend, --query, --all or --list");
    }

    Ok(())
}
