//! CLI binary for scan2facturae.
//!
//! A thin shim over the library crate that maps CLI flags to the workflow
//! entry points and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use scan2facturae::{
    map_invoice, run, to_xml, ExtractedFieldSet, HttpActivities, IssuerConfig, RawFieldSet,
    RunState, ServiceEndpoints, WorkflowInstance, XmlDeclaration,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the full pipeline against the configured services
  scan2facturae --issuer issuer.json --endpoints endpoints.json \
      https://storage.example/inbox/invoice-0127.pdf

  # Reconstruct the invoice XML offline from an extracted-fields JSON dump
  scan2facturae --map-only --issuer issuer.json extracted.json -o invoice.xml

  # Verbose logging
  RUST_LOG=scan2facturae=debug scan2facturae --issuer issuer.json \
      --endpoints endpoints.json https://storage.example/inbox/invoice.pdf

CONFIG FILES:
  issuer.json      the operator's identity: tax number, corporate name,
                   registration data, address, signing certificate name
  endpoints.json   base URLs of the storage facade, analysis service,
                   company/model registry and signing service
"#;

/// Turn a scanned Spanish invoice into a signed Facturae 3.2 artifact.
#[derive(Parser, Debug)]
#[command(name = "scan2facturae", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Document URL for a full run, or a path to an extracted-fields JSON
    /// file with --map-only.
    input: String,

    /// Issuer configuration file (JSON).
    #[arg(long, env = "SCAN2FACTURAE_ISSUER")]
    issuer: PathBuf,

    /// Service endpoints file (JSON). Required unless --map-only.
    #[arg(long, env = "SCAN2FACTURAE_ENDPOINTS")]
    endpoints: Option<PathBuf>,

    /// Skip the workflow: reconstruct the invoice XML from a local
    /// extracted-fields JSON file. No service needs to be reachable.
    #[arg(long)]
    map_only: bool,

    /// Write the reconstructed XML here instead of stdout (--map-only).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("scan2facturae=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let issuer: IssuerConfig = read_json(&cli.issuer)
        .with_context(|| format!("reading issuer config '{}'", cli.issuer.display()))?;

    if cli.map_only {
        map_offline(&cli, &issuer)
    } else {
        run_pipeline(&cli, issuer).await
    }
}

/// Reconstruct the invoice XML from a local extracted-fields dump.
fn map_offline(cli: &Cli, issuer: &IssuerConfig) -> Result<()> {
    let raw: RawFieldSet = read_json(PathBuf::from(&cli.input).as_path())
        .with_context(|| format!("reading extracted fields '{}'", cli.input))?;
    let fields = ExtractedFieldSet::from_raw(raw);

    let outcome = map_invoice(&fields, issuer).context("mapping failed")?;
    for warning in &outcome.warnings {
        eprintln!("{} {warning}", yellow("⚠"));
    }

    let xml = to_xml(&outcome.document, XmlDeclaration::Include)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, &xml)
                .with_context(|| format!("writing '{}'", path.display()))?;
            eprintln!("{} wrote {}", green("✔"), path.display());
        }
        None => println!("{xml}"),
    }
    Ok(())
}

/// Drive the full five-stage workflow.
async fn run_pipeline(cli: &Cli, issuer: IssuerConfig) -> Result<()> {
    let endpoints_path = cli
        .endpoints
        .as_ref()
        .context("--endpoints is required unless --map-only is set")?;
    let endpoints: ServiceEndpoints = read_json(endpoints_path)
        .with_context(|| format!("reading endpoints '{}'", endpoints_path.display()))?;

    let activities = HttpActivities::new(endpoints, issuer)?;
    let mut instance = WorkflowInstance::start(cli.input.clone());
    eprintln!("started workflow instance {}", instance.instance_id());

    let result = run(&mut instance, &activities).await;

    match (result, instance.state()) {
        (Ok(()), RunState::Completed) => {
            eprintln!(
                "{} instance {} completed",
                green("✔"),
                instance.instance_id()
            );
            Ok(())
        }
        (Err(e), _) => {
            eprintln!(
                "{} instance {} failed at {:?}: {e}",
                red("✘"),
                instance.instance_id(),
                instance.current_stage()
            );
            Err(e.into())
        }
        (Ok(()), state) => {
            // run() returning Ok implies the instance completed.
            anyhow::bail!("instance ended in unexpected state {state:?}")
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
