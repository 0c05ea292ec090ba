//! xlint: Command-line linter for X.509 certificates.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xlint_lib::{CertificateData, Engine, LintOptions, Report, Severity};

#[derive(Parser)]
#[command(
    name = "xlint",
    about = "A fast, memory-safe linter for X.509 certificates",
    long_about = "xlint runs a set of RFC 5280 and CA/Browser Forum Baseline Requirements\n\
                  checks against X.509 certificates and reports every finding.\n\n\
                  Input format (PEM vs DER) is auto-detected unless --pem or --der\n\
                  is specified. Reads from stdin when no file is given. PEM input may\n\
                  contain several certificates; each one is linted.",
    after_help = "EXAMPLES:\n\
                  \n  xlint lint cert.pem\
                  \n  xlint lint --json cert.pem\
                  \n  xlint lint --errors-only --recurse certs/\
                  \n  xlint checks\
                  \n  cat cert.pem | xlint lint"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG is used otherwise.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint certificates (exit code 0 = clean, 1 = error findings)
    #[command(after_help = "EXAMPLES:\n\
                      \n  xlint lint cert.pem\
                      \n  xlint lint cert.der\
                      \n  xlint lint --json bundle.pem\
                      \n  xlint lint --parallel --recurse /etc/ssl/certs")]
    Lint {
        /// Certificate file (PEM or DER) or directory. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Only report findings of severity error
        #[arg(long)]
        errors_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
        /// Evaluate the checks of each certificate in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// List the registered checks
    Checks {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Maximum file size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse every certificate in the input. PEM input may be a bundle.
fn parse_input(input: &[u8], der: bool, pem: bool) -> Result<Vec<CertificateData>> {
    if der {
        Ok(vec![xlint_lib::parse_der(input)?])
    } else if pem || xlint_lib::is_pem(input) {
        Ok(xlint_lib::parse_pem_bundle(input)?)
    } else {
        Ok(vec![xlint_lib::parse_der(input)?])
    }
}

/// Check if a path has a certificate file extension (.pem, .der, .crt, .cer).
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Options shared by every lint invocation.
struct LintSettings {
    der: bool,
    pem: bool,
    errors_only: bool,
}

/// Lint every certificate in `input`, labelling reports with `label`.
///
/// Bundles get a `label[index]` label per certificate.
fn lint_input(
    engine: &Engine,
    label: &str,
    input: &[u8],
    settings: &LintSettings,
) -> Result<Vec<Report>> {
    let certs = parse_input(input, settings.der, settings.pem)?;
    let many = certs.len() > 1;
    let reports = certs
        .iter()
        .enumerate()
        .map(|(i, cert)| {
            let source = if many {
                format!("{}[{}]", label, i)
            } else {
                label.to_string()
            };
            let mut report = Report::new(cert, engine.lint(cert)).with_source(source);
            if settings.errors_only {
                report.retain_at_least(Severity::Error);
            }
            report
        })
        .collect();
    Ok(reports)
}

/// A single file's outcome from batch processing.
struct BatchResult {
    path: String,
    outcome: Result<Vec<Report>>,
}

/// Lint certificate files in parallel. Results keep the order of `files`.
fn run_batch(engine: &Engine, files: &[PathBuf], settings: &LintSettings) -> Vec<BatchResult> {
    files
        .par_iter()
        .map(|f| {
            let path = f.display().to_string();
            let outcome =
                read_input(Some(f)).and_then(|input| lint_input(engine, &path, &input, settings));
            BatchResult { path, outcome }
        })
        .collect()
}

/// Print reports and return the number of failed inputs and certificates
/// with error findings.
fn print_results(results: Vec<BatchResult>, json: bool) -> Result<usize> {
    let mut failures = 0;
    let mut all_reports = Vec::new();

    for result in results {
        match result.outcome {
            Ok(reports) => {
                failures += reports.iter().filter(|r| r.has_errors()).count();
                all_reports.extend(reports);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: FAIL ({:#})", result.path, e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&all_reports)?);
    } else {
        for report in &all_reports {
            print!("{}", report);
        }
    }
    Ok(failures)
}

fn print_checks(engine: &Engine, json: bool) -> Result<()> {
    let filter_label = |filter: Option<&xlint_lib::Filter>| match filter {
        Some(f) if !f.is_empty() => f.types().map(|t| t.label()).collect::<Vec<_>>().join(","),
        _ => "all".to_string(),
    };

    if json {
        let certificate: Vec<_> = engine
            .certificate_checks()
            .iter()
            .map(|c| serde_json::json!({ "name": c.name(), "filter": filter_label(c.filter()) }))
            .collect();
        let extension: Vec<_> = engine
            .extension_checks()
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name(),
                    "oid": c.oid(),
                    "filter": filter_label(c.filter()),
                })
            })
            .collect();
        let out = serde_json::json!({ "certificate": certificate, "extension": extension });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Certificate checks:");
    for check in engine.certificate_checks().iter() {
        println!("  {} [{}]", check.name(), filter_label(check.filter()));
    }
    println!("Extension checks:");
    for check in engine.extension_checks().iter() {
        println!(
            "  {} ({}) [{}]",
            check.name(),
            check.oid(),
            filter_label(check.filter())
        );
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let env_filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Route panic reports through tracing instead of the default stderr hook.
///
/// Panicking checks are contained by the engine and reported as findings;
/// the default hook would still print a raw `thread '...' panicked` line.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::warn!(%location, "panic: {}", panic_payload(info.payload()));
    }));
}

fn panic_payload(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string payload"
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    install_panic_hook();

    match &cli.command {
        Commands::Lint {
            file,
            der,
            pem,
            json,
            errors_only,
            recurse,
            parallel,
        } => {
            let engine = Engine::with_builtin_checks(LintOptions {
                parallel: *parallel,
            });
            let settings = LintSettings {
                der: *der,
                pem: *pem,
                errors_only: *errors_only,
            };

            let results = match file {
                Some(path) if path.is_dir() => {
                    let files = find_cert_files(path, *recurse);
                    if files.is_empty() {
                        anyhow::bail!("No certificate files found in {}", path.display());
                    }
                    tracing::info!(files = files.len(), "linting directory");
                    run_batch(&engine, &files, &settings)
                }
                _ => {
                    let input = read_input(file.as_ref())?;
                    let label = file
                        .as_ref()
                        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
                    let reports = lint_input(&engine, &label, &input, &settings)?;
                    vec![BatchResult {
                        path: label,
                        outcome: Ok(reports),
                    }]
                }
            };

            let failures = print_results(results, *json)?;
            if failures > 0 {
                std::process::exit(1);
            }
        }

        Commands::Checks { json } => {
            print_checks(&Engine::builtin(), *json)?;
        }
    }

    Ok(())
}
