//! Toolman CLI: compiles one root `.tm` file and reports its diagnostics.
//!
//! Flag precedence for log verbosity follows the same resolution order as
//! the rest of the ambient stack: an explicit `-q`/`-v` flag wins, then
//! `RUST_LOG`, then a quiet-by-default fallback.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use toolman::diagnostic::{Diagnostic, Diagnostics};
use toolman::module::Compiler;

/// Target language for code generation. Selecting one only changes which
/// stub message is printed; no back end ships in this crate.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    Go,
    Typescript,
    Java,
}

impl Target {
    fn stub_name(self) -> &'static str {
        match self {
            Target::Go => "go",
            Target::Typescript => "typescript",
            Target::Java => "java",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "toolman",
    version,
    about = "Toolman schema compiler: resolves a .tm file into a typed document"
)]
struct Cli {
    /// Root `.tm` file to compile.
    root: PathBuf,

    /// Code-generation back end to select. No generator ships in this crate;
    /// this only determines which stub message is printed on success.
    #[arg(long, value_enum)]
    target: Option<Target>,

    /// Print diagnostics as a JSON array instead of human-readable text.
    #[arg(long)]
    emit_json: bool,

    /// Suppress info-level logs (errors and warnings only).
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug-level logs for the compiler.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct JsonDiagnostic {
    level: &'static str,
    location: String,
    message: String,
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        JsonDiagnostic {
            level: match d.level {
                toolman::diagnostic::Level::Note => "note",
                toolman::diagnostic::Level::Warning => "warning",
                toolman::diagnostic::Level::Fatal => "fatal",
            },
            location: d.location.to_string(),
            message: d.message(),
        }
    }
}

fn init_logging(cli: &Cli) {
    let directive = if cli.verbose {
        "toolman=debug"
    } else if cli.quiet {
        "toolman=warn"
    } else {
        "toolman=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_diagnostics(diagnostics: &Diagnostics, emit_json: bool) {
    if emit_json {
        let rendered: Vec<JsonDiagnostic> = diagnostics.iter().map(JsonDiagnostic::from).collect();
        match serde_json::to_string_pretty(&rendered) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("failed to render diagnostics as json: {err}"),
        }
    } else {
        for diagnostic in diagnostics.iter() {
            eprintln!("{diagnostic}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let base_dir = cli
        .root
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut compiler = Compiler::new(base_dir);

    let (diagnostics, has_fatal) = match compiler.compile(&cli.root) {
        Ok((document, diagnostics)) => {
            tracing::info!(
                structs = document.structs.len(),
                enums = document.enums.len(),
                api_groups = document.api_groups.len(),
                "compiled {}",
                cli.root.display()
            );
            if let Some(target) = cli.target {
                println!(
                    "no {} code generator is bundled with this compiler; document resolved successfully",
                    target.stub_name()
                );
            }
            let has_fatal = diagnostics.has_fatal();
            (diagnostics, has_fatal)
        }
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    print_diagnostics(&diagnostics, cli.emit_json);

    if has_fatal {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
