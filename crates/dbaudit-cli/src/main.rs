mod input;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dbaudit_core::{AnalyzeReport, Config, RuleLevel};
use dbaudit_engine::{all_rules, analyze_database, into_report, AnalyzeInput};

const DEFAULT_CONFIG: &str = "dbaudit.toml";

/// dbaudit - Database schema and usage analysis
#[derive(Parser)]
#[command(name = "dbaudit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: dbaudit.toml)
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
    /// Analyze a database snapshot with every rule
    Analyze {
        /// Database snapshot (JSON)
        #[arg(short, long)]
        database: PathBuf,

        /// Observed queries with their statistics (JSON array)
        #[arg(short, long)]
        queries: Option<PathBuf>,

        /// Previous snapshot (JSON), can be repeated
        #[arg(long)]
        history: Vec<PathBuf>,

        /// Directory of previous snapshots (report_*.json)
        #[arg(long)]
        history_dir: Option<PathBuf>,

        /// Previous report whose violations are acknowledged
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Only run these rules (id, alias or name), can be repeated
        #[arg(long = "rule")]
        rules: Vec<String>,

        /// Analysis time, RFC 3339 (default: current time)
        #[arg(long)]
        now: Option<String>,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },

    /// List available rules
    Rules {
        /// Print default confs as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "dbaudit_engine=debug,dbaudit_cli=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };
    tracing::debug!(rules = config.rules.len(), "config loaded");

    match cli.command {
        Commands::Analyze {
            database,
            queries,
            history,
            history_dir,
            reference,
            rules,
            now,
            output,
            markdown,
        } => {
            let inputs = AnalyzeFiles {
                database,
                queries,
                history,
                history_dir,
                reference,
            };
            let now = parse_now(now.as_deref())?;
            let report = analyze_command(&config, &inputs, &rules, now, cli.verbose)?;
            write_report(&report, &output, markdown.as_deref(), cli.verbose)?;
            print_report_summary(&report);

            if report.has_blocking() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Rules { json } => rules_command(json),
    }
}

/// Input files of the analyze command
struct AnalyzeFiles {
    database: PathBuf,
    queries: Option<PathBuf>,
    history: Vec<PathBuf>,
    history_dir: Option<PathBuf>,
    reference: Option<PathBuf>,
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(value) => Ok(DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("Invalid --now date: {}", value))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Analyze command - run the rules on the loaded snapshot
fn analyze_command(
    config: &Config,
    files: &AnalyzeFiles,
    rules: &[String],
    now: DateTime<Utc>,
    verbose: bool,
) -> Result<AnalyzeReport> {
    if verbose {
        eprintln!("{} {}", "Loading database from:".cyan(), files.database.display());
    }
    let database = input::load_database(&files.database)?;

    let queries = match &files.queries {
        Some(path) => input::load_queries(path)?,
        None => Vec::new(),
    };
    let history = input::load_history(&files.history, files.history_dir.as_deref())?;
    let reference = match &files.reference {
        Some(path) => input::load_reference(path)?,
        None => BTreeMap::new(),
    };
    tracing::debug!(rules = reference.len(), "reference violations loaded");

    if verbose {
        eprintln!(
            "{} {} entities, {} relations, {} queries, {} history snapshots",
            "Analyzing".cyan(),
            database.entities.len(),
            database.relations.len(),
            queries.len(),
            history.len()
        );
    }

    let input = AnalyzeInput {
        now,
        database: &database,
        queries: &queries,
        history: &history,
        reference: &reference,
    };
    let results = analyze_database(config, input, rules);
    Ok(into_report(results, now))
}

fn write_report(report: &AnalyzeReport, output: &Path, markdown: Option<&Path>, verbose: bool) -> Result<()> {
    report
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), output.display());
    }

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(report))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }
    Ok(())
}

/// Rules command - list registered rules
fn rules_command(json: bool) -> Result<()> {
    let rules = all_rules();

    if json {
        let confs: BTreeMap<&str, serde_json::Value> = rules.iter().map(|r| (r.id(), r.default_conf())).collect();
        println!("{}", serde_json::to_string_pretty(&confs)?);
        return Ok(());
    }

    for rule in &rules {
        let info = rule.info();
        println!("{} {} {}", level_label(rule.default_level()), info.id.bold(), format!("({})", info.name).dimmed());
        if !info.aliases.is_empty() {
            println!("    aliases: {}", info.aliases.join(", "));
        }
        println!("    {}", info.description);
    }
    Ok(())
}

fn level_label(level: RuleLevel) -> colored::ColoredString {
    let label = format!("[{:6}]", level.as_str().to_uppercase());
    match level {
        RuleLevel::High => label.red().bold(),
        RuleLevel::Medium => label.yellow().bold(),
        RuleLevel::Low => label.yellow(),
        RuleLevel::Hint => label.cyan(),
        RuleLevel::Off => label.dimmed(),
    }
}

/// Print report summary to stdout
fn print_report_summary(report: &AnalyzeReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Database Analysis Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Rules:  {}", report.summary.rules);
    println!("  Total violations: {}", report.summary.total);
    if report.summary.high > 0 {
        println!("  High:   {}", report.summary.high.to_string().red().bold());
    } else {
        println!("  High:   {}", report.summary.high.to_string().green());
    }
    println!("  Medium: {}", report.summary.medium);
    println!("  Low:    {}", report.summary.low);
    println!("  Hint:   {}", report.summary.hint);
    println!();

    if report.summary.total == 0 {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Violations:".bold());
        for level in RuleLevel::ENABLED {
            for violation in report.violations().filter(|v| v.rule_level == level) {
                println!("  {} {}: {}", level_label(level), violation.rule_id, violation.message);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report, grouped by rule
fn generate_markdown_report(report: &AnalyzeReport) -> String {
    let mut md = String::new();

    md.push_str("# Database Analysis Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Total violations: {}\n", report.summary.total));
    for level in RuleLevel::ENABLED {
        md.push_str(&format!("- {}: {}\n", level, report.summary.count(level)));
    }
    md.push('\n');

    if report.summary.total == 0 {
        md.push_str("✅ **No issues found!**\n");
        return md;
    }

    md.push_str("## Rules\n\n");
    for (id, rule) in report.rules.iter().filter(|(_, r)| !r.violations.is_empty()) {
        md.push_str(&format!("### {} `{}` ({})\n\n", rule.name, id, rule.level));
        for violation in &rule.violations {
            md.push_str(&format!("- {}\n", violation.message));
        }
        md.push('\n');
    }

    md
}
