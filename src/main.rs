use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use jabberwocky::{
    config::Settings, diagnostics, engine::EngineContext, logging::init_logging, server::run_server,
};
use tower_lsp::lsp_types::{ClientCapabilities, Diagnostic, DiagnosticSeverity};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serve the language server over stdio when no command is given
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every entity file of a mod folder
    Check {
        /// Path to the mod root
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Language of the localized text to check against
        #[arg(short, long)]
        language: Option<String>,

        /// Directory of the game's JSON schemas
        #[arg(short, long)]
        schema_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        None => {
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(run_server());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Check {
            dir,
            language,
            schema_dir,
        }) => check(dir, language, schema_dir),
    }
}

fn check(
    dir: PathBuf,
    language: Option<String>,
    schema_dir: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("no such directory: {}", dir.display()))?;

    let mut settings = Settings::new(&dir, &ClientCapabilities::default())?;
    if let Some(language) = language {
        settings.language = language;
    }
    if let Some(schema_dir) = schema_dir {
        settings.schema_dir = schema_dir.to_string_lossy().to_string();
    }

    let engine = EngineContext::build(&dir, settings);
    let mut errors = 0;

    for (path, diags) in diagnostics::check_workspace(&engine) {
        let shown = pathdiff::diff_paths(&path, &dir).unwrap_or(path);
        for diagnostic in diags {
            if diagnostic.severity == Some(DiagnosticSeverity::ERROR) {
                errors += 1;
            }
            println!("{}", format_diagnostic(&shown.to_string_lossy(), &diagnostic));
        }
    }

    if errors > 0 {
        eprintln!("{} error(s)", errors);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// `path:line:col: severity: message`, one-based like compiler output.
fn format_diagnostic(path: &str, diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Some(DiagnosticSeverity::ERROR) => "error",
        Some(DiagnosticSeverity::WARNING) => "warning",
        Some(DiagnosticSeverity::INFORMATION) => "info",
        _ => "hint",
    };
    format!(
        "{}:{}:{}: {}: {}",
        path,
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1,
        severity,
        diagnostic.message
    )
}
