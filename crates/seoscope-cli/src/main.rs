//! seoscope — rule-based SEO audits from the command line

use anyhow::{Context as _, Result, anyhow};
use seoscope_core::ai::{AiClient, AiConfig, Locale, recommendations};
use seoscope_core::{
    AnalysisDepth, AnalysisReport, HealthBand, RecommendationSet, analyze, health_band, store,
};

const APP_NAME: &str = "seoscope";
const VERSION: &str = env!("CARGO_PKG_VERSION");

struct CliOptions {
    url: String,
    depth: AnalysisDepth,
    json: bool,
    locale: Locale,
    recommend: bool,
    store_path: Option<String>,
}

enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut url: Option<String> = None;
    let mut depth = AnalysisDepth::Meta;
    let mut json = false;
    let mut locale = Locale::En;
    let mut recommend = false;
    let mut store_path: Option<String> = None;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-v" | "--version" => return Ok(CliCommand::Version),
            "-j" | "--json" => {
                json = true;
                i += 1;
            }
            "-r" | "--recommend" => {
                recommend = true;
                i += 1;
            }
            "-d" | "--depth" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--depth requires a value"))?;
                depth = value.parse()?;
                i += 2;
            }
            "-l" | "--locale" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--locale requires a value"))?;
                locale = Locale::from_tag(value);
                i += 2;
            }
            "--store" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--store requires a database path"))?;
                store_path = Some(value.clone());
                i += 2;
            }
            other if other.starts_with('-') => {
                return Err(anyhow!("unknown option: {other}"));
            }
            _ => {
                if url.is_some() {
                    return Err(anyhow!("only one URL may be supplied"));
                }
                url = Some(arg.clone());
                i += 1;
            }
        }
    }

    let Some(url) = url else {
        return Ok(CliCommand::Help);
    };

    Ok(CliCommand::Run(CliOptions {
        url,
        depth,
        json,
        locale,
        recommend,
        store_path,
    }))
}

fn print_help() {
    println!(
        r#"{APP_NAME} — rule-based SEO audits from the command line

Usage: {APP_NAME} [OPTIONS] <URL>

Options:
  -d, --depth <DEPTH>    Analysis depth: meta, partial, complete, deep (default: meta)
  -j, --json             Print the report as JSON
  -r, --recommend        Also generate AI recommendations for the findings
  -l, --locale <TAG>     Response language for recommendations (en, fr)
      --store <PATH>     Persist the report to a SQLite database at PATH
  -h, --help             Show this help
  -v, --version          Show the version

Environment:
  SEOSCOPE_AI_API_KEY    Enables the semantic pass and AI recommendations
  SEOSCOPE_AI_BASE_URL   Override the chat API base URL
  SEOSCOPE_AI_MODEL      Override the chat model"#
    );
}

fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_arguments(&args)? {
        CliCommand::Help => print_help(),
        CliCommand::Version => println!("{APP_NAME} {VERSION}"),
        CliCommand::Run(options) => run(options).await?,
    }

    Ok(())
}

async fn run(options: CliOptions) -> Result<()> {
    let ai = match AiConfig::from_env() {
        Some(config) => Some(AiClient::new(config)?),
        None => None,
    };

    let report = analyze(&options.url, options.depth, ai.as_ref()).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if options.recommend {
        let set = recommendations(
            ai.as_ref(),
            &report.url,
            report.depth,
            &report.findings,
            options.locale,
        )
        .await;
        if options.json {
            println!("{}", serde_json::to_string_pretty(&set)?);
        } else {
            print_recommendations(&set);
        }
    }

    if let Some(path) = &options.store_path {
        let mut conn = store::open(path).with_context(|| format!("open database: {path}"))?;
        let id = store::insert_analysis(&mut conn, "cli", &report, chrono::Utc::now())?;
        eprintln!("stored analysis {id}");
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let band = match health_band(report.overall_score) {
        HealthBand::Good => "good",
        HealthBand::Fair => "fair",
        HealthBand::Poor => "poor",
    };

    println!("{} ({} analysis)", report.url, report.depth);
    println!("Overall score: {}/100 ({band})", report.overall_score);
    for (category, score) in &report.category_scores {
        println!("  {category}: {score}/100");
    }
    println!();

    for finding in &report.findings {
        println!(
            "[{:^7}] {}/{}: {}",
            finding.status.as_str(),
            finding.category,
            finding.component,
            finding.description
        );
        if !finding.recommendation.is_empty() {
            println!("          {}", finding.recommendation);
        }
    }
}

fn print_recommendations(set: &RecommendationSet) {
    println!();
    println!("Summary: {}", set.summary);

    if !set.priorities.is_empty() {
        println!("Priorities:");
        for priority in &set.priorities {
            println!("  - {priority}");
        }
    }

    for recommendation in &set.recommendations {
        println!();
        println!("{}: {}", recommendation.title, recommendation.description);
        for step in &recommendation.steps {
            println!("  * {step}");
        }
    }

    if !set.insights.is_empty() {
        println!();
        println!("Insights: {}", set.insights);
    }
}
