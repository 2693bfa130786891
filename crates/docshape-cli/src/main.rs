use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use docshape_core::config::CONFIG_FILE_NAME;
use docshape_core::{Config, Diagnostic, DiagnosticCode, EmitFormat, Location, Report, Severity};
use docshape_engine::{Translation, Translator};

/// docshape - Translate documentation record notation into typed declarations
#[derive(Parser)]
#[command(name = "docshape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: docshape.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate one document
    Translate {
        /// Input document (stdin when omitted or `-`)
        input: Option<PathBuf>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunOptions,
    },

    /// Translate every matching document under a directory
    Batch {
        /// Directory to scan
        dir: PathBuf,

        /// Directory receiving one output per input
        #[arg(long)]
        out: PathBuf,

        /// Extension of the documents to translate
        #[arg(long, default_value = "txt")]
        extension: String,

        #[command(flatten)]
        run: RunOptions,
    },

    /// List the rewrite rules in pipeline order
    Rules,
}

#[derive(Args, Debug, Clone, Default)]
struct RunOptions {
    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    emit: Option<EmitArg>,

    /// Write a JSON report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Exit with status 1 when any error diagnostic is produced
    #[arg(long)]
    strict: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum EmitArg {
    Canonical,
    Rust,
}

impl From<EmitArg> for EmitFormat {
    fn from(arg: EmitArg) -> Self {
        match arg {
            EmitArg::Canonical => EmitFormat::Canonical,
            EmitArg::Rust => EmitFormat::Rust,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    if cli.verbose {
        eprintln!("{} emit: {}", "Using".cyan(), config.emit);
    }

    match cli.command {
        Commands::Translate { input, output, run } => {
            translate_command(&config, input.as_deref(), output.as_deref(), &run, cli.verbose)
        }
        Commands::Batch { dir, out, extension, run } => {
            batch_command(&config, &dir, &out, &extension, &run, cli.verbose)
        }
        Commands::Rules => rules_command(&config),
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "loading config");
        return Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let default_path = Path::new(CONFIG_FILE_NAME);
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "loading config");
        return Config::from_file(default_path)
            .with_context(|| format!("Failed to load config from {}", default_path.display()));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

/// Apply command-line overrides on top of the loaded config
fn effective_config(config: &Config, run: &RunOptions) -> Config {
    let mut config = config.clone();
    if let Some(emit) = run.emit {
        config.emit = emit.into();
    }
    config.strict |= run.strict;
    config
}

/// Read the whole input document; `None` or `-` means stdin
fn read_input(input: Option<&Path>) -> Result<(String, Option<String>)> {
    match input {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((text, Some(path.display().to_string())))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read standard input")?;
            Ok((text, None))
        }
    }
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes()).context("Failed to write output")?;
            stdout.flush().context("Failed to flush output")
        }
    }
}

/// Translate command - one document to stdout or a file
fn translate_command(
    config: &Config,
    input: Option<&Path>,
    output: Option<&Path>,
    run: &RunOptions,
    verbose: bool,
) -> Result<()> {
    let translator = Translator::new(effective_config(config, run))?;
    let (text, label) = read_input(input)?;

    let translation = translator
        .translate(&text, label.as_deref())
        .context("Rewrite rule table hit a span it does not handle")?;

    write_output(output, &translation.output)?;
    print_diagnostics(&translation.diagnostics);

    if verbose {
        eprintln!(
            "{} {} rules applied, output {}",
            "Translated".green(),
            translation.applied.len(),
            translation.format
        );
    }

    if let Some(path) = &run.report {
        translation
            .report()
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    if translator.config().strict && translation.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Output path for one batch input
fn batch_output_path(out: &Path, relative: &Path, translation: &Translation) -> PathBuf {
    let path = out.join(relative);
    match translation.format {
        EmitFormat::Rust => path.with_extension("rs"),
        EmitFormat::Canonical => path,
    }
}

/// Batch command - translate a directory tree
fn batch_command(
    config: &Config,
    dir: &Path,
    out: &Path,
    extension: &str,
    run: &RunOptions,
    verbose: bool,
) -> Result<()> {
    let translator = Translator::new(effective_config(config, run))?;
    let mut report = Report::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        let path = entry.path();
        let matches = path.extension().and_then(|e| e.to_str()) == Some(extension);
        if !entry.file_type().is_file() || !matches {
            continue;
        }

        let label = path.display().to_string();
        tracing::debug!(file = %label, "batch input");
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                let message = format!("Failed to read: {}", e);
                report.add_diagnostic(
                    Diagnostic::new(DiagnosticCode::InputReadError, Severity::Error, message)
                        .with_location(Location::new(label)),
                );
                continue;
            }
        };

        let translation = translator.translate(&text, Some(&label)).with_context(|| {
            format!("Rewrite rule table hit a span it does not handle in {}", label)
        })?;

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let target = batch_output_path(out, relative, &translation);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, &translation.output)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        if verbose {
            let status = if translation.validated { "✓".green() } else { "✗".red() };
            eprintln!("  {} {} -> {}", status, label, target.display());
        }

        report.record_document(translation.validated);
        for diagnostic in translation.diagnostics {
            report.add_diagnostic(diagnostic);
        }
    }

    let report = report.with_metadata(serde_json::json!({
        "root": dir.display().to_string(),
        "out": out.display().to_string(),
        "extension": extension,
    }));

    if let Some(path) = &run.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_batch_summary(&report);

    if translator.config().strict && report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Rules command - print the rule table
fn rules_command(config: &Config) -> Result<()> {
    let translator = Translator::new(config.clone())?;
    let mut current = None;

    for rule in translator.rules().rules() {
        if current != Some(rule.stage()) {
            current = Some(rule.stage());
            println!("{}", format!("{:>2}. {}", rule.stage().number(), rule.stage()).bold());
        }
        println!("    {} {}", format!("{:<24}", rule.name()).green(), rule.description());
    }

    Ok(())
}

/// Print diagnostics to stderr
fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let severity = match diag.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warn => "warn".yellow().bold(),
            Severity::Info => "info".cyan(),
        };

        eprintln!("{}[{}]: {}", severity, diag.code, diag.message);

        if let Some(loc) = &diag.location {
            eprintln!("  {} {}", "-->".bright_blue(), loc);
        }
        if let Some(exp) = &diag.expected {
            eprintln!("    Expected: {}", exp);
        }
        if let Some(act) = &diag.actual {
            eprintln!("    Found:    {}", act);
        }
    }
}

/// Print batch summary to stdout
fn print_batch_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "docshape Batch Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{}", "Summary:".bold());
    println!("  Documents: {}", report.summary.documents);
    println!("  Validated: {}", report.summary.validated);

    if report.summary.errors > 0 {
        println!("  Errors:    {}", report.summary.errors.to_string().red().bold());
    } else {
        println!("  Errors:    {}", report.summary.errors.to_string().green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings:  {}", report.summary.warnings.to_string().yellow());
    } else {
        println!("  Warnings:  {}", report.summary.warnings.to_string().green());
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ All documents translated cleanly".green().bold());
    } else {
        print_diagnostics(&report.diagnostics);
    }

    println!("{}", "=".repeat(60).bright_blue());
}
