use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use protocol_guard::{
    AnalysisResult, CheckerConfig, Embedder, HashingEmbedder, ProtocolChecker,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Report,
    Json,
    Both,
}

#[derive(Parser)]
#[command(
    name = "protocol-guard",
    about = "Score tutoring transcripts against protocol guidelines",
    version
)]
struct Cli {
    /// Transcript files to analyze (reads stdin if none provided)
    files: Vec<PathBuf>,

    /// JSON file mapping category names to exemplar phrases
    #[arg(short, long)]
    protocol: PathBuf,

    /// JSON checker configuration (weights, thresholds, violation categories)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local sentence-transformer directory (requires the `neural` feature)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// What to print to stdout
    #[arg(short, long, value_enum, default_value_t = Format::Report)]
    format: Format,

    /// Also save <name>_results.json and <name>_report.txt here
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => CheckerConfig::from_path(path)?,
        None => CheckerConfig::default(),
    };
    let embedder = build_embedder(cli.model_dir.as_deref())?;
    let checker = ProtocolChecker::from_path(&cli.protocol, embedder, config)?;

    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)?;
    }

    if cli.files.is_empty() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        process(&checker, cli, "stdin", &input)?;
    } else {
        for path in &cli.files {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "transcript".to_string());
            process(&checker, cli, &stem, &text)?;
        }
    }
    Ok(())
}

#[cfg(feature = "neural")]
fn build_embedder(model_dir: Option<&Path>) -> Result<Arc<dyn Embedder>, Box<dyn std::error::Error>> {
    Ok(match model_dir {
        Some(dir) => Arc::new(protocol_guard::SentenceEmbedder::load(dir)?),
        None => hashing_embedder(),
    })
}

#[cfg(not(feature = "neural"))]
fn build_embedder(model_dir: Option<&Path>) -> Result<Arc<dyn Embedder>, Box<dyn std::error::Error>> {
    if let Some(dir) = model_dir {
        return Err(format!(
            "--model-dir {} requires a build with the `neural` feature",
            dir.display()
        )
        .into());
    }
    Ok(hashing_embedder())
}

/// Feature hashing only sees shared words, so semantic scores are approximate.
fn hashing_embedder() -> Arc<dyn Embedder> {
    let embedder = HashingEmbedder::new();
    tracing::warn!(
        backend = embedder.name(),
        "no sentence model configured; semantic scores reflect word overlap only"
    );
    Arc::new(embedder)
}

fn process(
    checker: &ProtocolChecker,
    cli: &Cli,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = checker
        .analyze_text(text)
        .map_err(|e| format!("{name}: {e}"))?;
    let report = checker.generate_report(&result);

    match cli.format {
        Format::Report => println!("{report}"),
        Format::Json => println!("{}", result.to_json_pretty()?),
        Format::Both => {
            println!("{report}");
            println!();
            println!("{}", result.to_json_pretty()?);
        }
    }

    if let Some(dir) = &cli.out_dir {
        save(dir, name, &result, &report)?;
    }
    Ok(())
}

fn save(
    dir: &Path,
    name: &str,
    result: &AnalysisResult,
    report: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let results_path = dir.join(format!("{name}_results.json"));
    std::fs::write(&results_path, result.to_json_pretty()?)?;
    let report_path = dir.join(format!("{name}_report.txt"));
    std::fs::write(&report_path, report)?;
    tracing::info!(
        results = %results_path.display(),
        report = %report_path.display(),
        "analysis saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn missing_model_dir_warns_about_hashing_backend() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let embedder = tracing::subscriber::with_default(subscriber, || {
            build_embedder(None).unwrap()
        });

        assert_eq!(embedder.name(), "feature-hashing");
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"), "expected a warning, got {logs:?}");
        assert!(logs.contains("word overlap only"), "got {logs:?}");
    }
}
