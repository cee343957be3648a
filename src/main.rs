use anyhow::{Context, Result};
use clap::Parser;
use egrastats::analysis::{student_profile, AnalysisConfig, ComparisonReport};
use egrastats::catalog::MetricCatalog;
use egrastats::cli::{Cli, OutputFormat};
use egrastats::config::AppConfig;
use egrastats::csv_output::{student_to_csv, CsvOutput};
use egrastats::dataset::Dataset;
use egrastats::json_output::{JsonOutput, StudentJsonOutput};
use egrastats::narrative::{narrator, NarrativeSummary};
use egrastats::text_output::{StudentCard, TextReport};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let app_config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    let catalog = app_config.catalog().context("Invalid metric catalog")?;
    let config = args.analysis_config(app_config.analysis.clone());

    let dataset = Dataset::from_path(&args.dataset)?;
    tracing::debug!(
        "Loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.columns().len(),
        args.dataset.display()
    );

    if let Some(id) = &args.student {
        return print_student(&args, &dataset, &catalog, &config, id);
    }

    let report = ComparisonReport::build(&dataset, &config, &catalog)
        .with_context(|| format!("Cannot analyse {}", args.dataset.display()))?;

    let narrative = args.narrative.map(|kind| {
        let summary = NarrativeSummary::from_report(&report, &catalog, args.locale);
        narrator(kind, args.seed).generate(&summary)
    });

    match args.format {
        OutputFormat::Text => {
            print!("{}", TextReport::new(&report, &catalog, args.locale).render());
            if let Some(text) = narrative {
                println!("\n📝 Interpretation:\n{}", text);
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new(&report, &catalog, args.locale);
            if let Some(text) = narrative {
                output.set_narrative(text);
            }
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            if narrative.is_some() {
                tracing::warn!("Narrative is not included in CSV output");
            }
            print!("{}", CsvOutput::from_report(&report).to_csv());
        }
    }

    Ok(())
}

/// Report card for one student, compared with their `group_by` peers
fn print_student(
    args: &Cli,
    dataset: &Dataset,
    catalog: &MetricCatalog,
    config: &AnalysisConfig,
    id: &str,
) -> Result<()> {
    let profile = student_profile(dataset, catalog, &args.id_column, id, &config.group_by)
        .with_context(|| format!("Cannot profile student in {}", args.dataset.display()))?;

    let narrative = args.narrative.map(|kind| {
        let summary = NarrativeSummary::from_profile(&profile, catalog, args.locale);
        narrator(kind, args.seed).generate(&summary)
    });

    match args.format {
        OutputFormat::Text => {
            print!("{}", StudentCard::new(&profile, catalog, args.locale).render());
            if let Some(text) = narrative {
                println!("\n📝 Interpretation:\n{}", text);
            }
        }
        OutputFormat::Json => {
            let mut output = StudentJsonOutput::new(&profile, catalog, args.locale);
            if let Some(text) = narrative {
                output.set_narrative(text);
            }
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            if narrative.is_some() {
                tracing::warn!("Narrative is not included in CSV output");
            }
            print!("{}", student_to_csv(&profile));
        }
    }

    Ok(())
}
