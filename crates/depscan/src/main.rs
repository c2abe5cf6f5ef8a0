//! depscan — static Python dependency discovery.
//!
//! Scans a project tree for import statements, classifies each import
//! (stdlib / project-local / external), resolves the external names against
//! PyPI into a version-pinned transitive dependency set, and prints the
//! dependency DAG plus a native-build ordering.

mod git;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Parser;
use depscan_imports::{guessed_package_names, scan_project};
use depscan_pypi::{AcceptancePolicy, PyPiRegistry, PythonTarget};
use depscan_resolve::{DepGraph, build_order, resolve_dependencies};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "depscan", version, about = "Discover a Python project's PyPI dependencies by scanning its imports")]
struct Cli {
    /// Project directory to scan.
    project_dir: PathBuf,

    /// Directory to write scanned_import.txt and scanned_dependencies.txt
    /// into. Nothing is written when omitted.
    output_dir: Option<PathBuf>,

    /// Target Python version, e.g. "3" or "3.9".
    #[arg(long, default_value = "3")]
    python_version: String,

    /// Only accept releases uploaded at or before this time
    /// (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS). Defaults to the project's
    /// latest commit time, or now.
    #[arg(long)]
    cutoff: Option<String>,

    /// Package index base URL.
    #[arg(long, default_value = PyPiRegistry::DEFAULT_BASE_URL)]
    registry_url: String,

    /// Verbose logging (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if !cli.project_dir.is_dir() {
        bail!("{} is not a directory", cli.project_dir.display());
    }

    let target = PythonTarget::parse(&cli.python_version)
        .with_context(|| format!("invalid --python-version {:?}", cli.python_version))?;
    let cutoff = resolve_cutoff(&cli)?;

    // Phase 1: static scan.
    let report = scan_project(&cli.project_dir);
    println!("Not resolved imports: {:?}", report.unresolved);
    let guesses = guessed_package_names(&report.unresolved);
    println!("Guess: {:?}", guesses);

    // Phase 2: registry resolution.
    let policy = AcceptancePolicy::new(target, cutoff);
    let registry = PyPiRegistry::with_base_url(&cli.registry_url);
    let outcome = resolve_dependencies(&guesses, &registry, &policy);

    println!("Found in pypi: {:?}", outcome.seeded);
    println!(
        "Failed: {:?}",
        outcome.failed.iter().collect::<Vec<_>>()
    );
    let pinned: Vec<String> = outcome
        .dependencies
        .iter()
        .map(|meta| format!("{}=={}", meta.info.name, meta.info.version))
        .collect();
    println!("Dependencies: {:?}", pinned);

    // Phase 3: graph views over the acceptable subset.
    let accepted = outcome.dependencies.accepted(&policy);
    let graph = DepGraph::build(&accepted);
    let rendered = graph.render();
    if !rendered.is_empty() {
        println!("Dependency graph:");
        print!("{}", rendered);
    }

    let order = build_order(&accepted);
    if !order.is_empty() {
        println!("Build order: {}", order.join(" -> "));
    }

    if let Some(output_dir) = &cli.output_dir {
        write_outputs(output_dir, &outcome.seeded, &accepted)?;
    }

    Ok(())
}

fn resolve_cutoff(cli: &Cli) -> anyhow::Result<NaiveDateTime> {
    if let Some(raw) = &cli.cutoff {
        return parse_cutoff(raw).with_context(|| format!("invalid --cutoff {:?}", raw));
    }
    if let Some(commit_time) = git::latest_commit_time(&cli.project_dir) {
        return Ok(commit_time);
    }
    Ok(Local::now().naive_local())
}

fn parse_cutoff(raw: &str) -> anyhow::Result<NaiveDateTime> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(datetime);
        }
    }
    bail!("expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS");
}

fn write_outputs(
    output_dir: &std::path::Path,
    seeded: &std::collections::BTreeSet<String>,
    accepted: &depscan_resolve::DependencySet,
) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let imports_path = output_dir.join("scanned_import.txt");
    let mut lines = seeded.iter().cloned().collect::<Vec<_>>().join("\n");
    if !lines.is_empty() {
        lines.push('\n');
    }
    fs::write(&imports_path, lines)
        .with_context(|| format!("writing {}", imports_path.display()))?;

    let deps_path = output_dir.join("scanned_dependencies.txt");
    let json = serde_json::to_string_pretty(accepted).context("serializing dependency set")?;
    fs::write(&deps_path, json)
        .with_context(|| format!("writing {}", deps_path.display()))?;

    Ok(())
}
