use anyhow::Context;
use buildlens_log::{grep, report, AnalyzerConfig, LogAnalyzer, ReportStyle};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(about = "Locate and explain errors in Maven/Java build logs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a build log and render a report, or search it with --grep
    Analyze {
        /// Path to the build log
        #[arg(value_name = "LOG")]
        log: PathBuf,

        /// Where to write the report (also printed to stdout)
        #[arg(value_name = "REPORT")]
        report: Option<PathBuf>,

        /// Search for a keyword instead of scanning for errors
        #[arg(long, value_name = "KEYWORD")]
        grep: Option<String>,

        /// Maximum number of grep matches to print
        #[arg(short = 'n', long, value_name = "N")]
        max_matches: Option<usize>,

        /// Report style
        #[arg(long, value_enum)]
        style: Option<StyleArg>,

        /// Print the last N lines when no errors are found
        #[arg(long, value_name = "N")]
        tail: Option<usize>,

        #[command(flatten)]
        options: ScanOptions,
    },
    /// Scan a build log and emit the detected entries as JSON
    Scan {
        /// Path to the build log
        #[arg(value_name = "LOG")]
        log: PathBuf,

        #[command(flatten)]
        options: ScanOptions,
    },
}

#[derive(Args, Default)]
struct ScanOptions {
    /// Maximum number of errors to extract
    #[arg(short = 'm', long, value_name = "N")]
    max_errors: Option<usize>,

    /// Context lines per error (before and after a match in grep mode)
    #[arg(short = 'c', long, value_name = "N")]
    context: Option<usize>,

    /// File encoding (e.g. utf-8, gbk); detected when omitted
    #[arg(short = 'e', long, value_name = "LABEL")]
    encoding: Option<String>,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    /// Condensed bug report for the first error
    Bug,
    /// Every error with context, stack trace and diagnosis
    Full,
}

impl From<StyleArg> for ReportStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Bug => ReportStyle::Bug,
            StyleArg::Full => ReportStyle::Full,
        }
    }
}

fn build_config(options: &ScanOptions) -> anyhow::Result<AnalyzerConfig> {
    let mut config = match &options.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(max_errors) = options.max_errors {
        config.max_errors = max_errors;
    }
    if let Some(context) = options.context {
        config.context_lines = context;
    }
    if let Some(encoding) = &options.encoding {
        config.encoding = Some(encoding.clone());
    }
    Ok(config)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_tail<W: Write>(out: &mut W, analyzer: &mut LogAnalyzer, n: usize) -> anyhow::Result<()> {
    let lines = analyzer.tail(n)?;
    writeln!(out, "\n[*] Last {} line(s):\n", lines.len())?;
    for line in &lines {
        out.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Scans `log`, writes the report to `report_path` when given and to `out`.
fn analyze<W: Write>(
    out: &mut W,
    log: &Path,
    report_path: Option<&Path>,
    tail: Option<usize>,
    config: AnalyzerConfig,
) -> anyhow::Result<()> {
    let mut analyzer = LogAnalyzer::new(log, config)?;
    log::info!("Analyzing log: {}", log.display());

    let found = analyzer
        .analyze()
        .with_context(|| format!("failed to analyze {}", log.display()))?
        .len();
    if found == 0 {
        log::warn!("No obvious errors found in {}", log.display());
    } else {
        log::info!("Found {found} error(s)");
    }

    let rendered = analyzer.report();
    if let Some(path) = report_path {
        report::save_report(path, &rendered)?;
    }
    writeln!(out, "{rendered}")?;

    if found == 0 {
        if let Some(n) = tail {
            print_tail(out, &mut analyzer, n)?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            log,
            report,
            grep: keyword,
            max_matches,
            style,
            tail,
            options,
        } => {
            let mut config = build_config(&options)?;
            if let Some(max_matches) = max_matches {
                config.max_matches = max_matches;
            }
            if let Some(style) = style {
                config.report_style = style.into();
            }

            if let Some(keyword) = keyword {
                let mut analyzer = LogAnalyzer::new(&log, config)?;
                let outcome = analyzer
                    .grep(&keyword)
                    .with_context(|| format!("failed to search {}", log.display()))?;
                grep::render(&outcome, &mut io::stdout().lock())?;
            } else {
                analyze(&mut io::stdout().lock(), &log, report.as_deref(), tail, config)?;
            }
        }
        Commands::Scan { log, options } => {
            let config = build_config(&options)?;
            let mut analyzer = LogAnalyzer::new(&log, config)?;
            let errors = analyzer
                .analyze()
                .with_context(|| format!("failed to analyze {}", log.display()))?;
            println!("{}", serde_json::to_string_pretty(errors)?);
        }
    }
    Ok(())
}
