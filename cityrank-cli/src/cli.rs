use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};

use cityrank_core::{
    Config, JsonFileWriter, Pipeline, ResultWriter, TracingObserver, YandexForecastApi,
};

use crate::report;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityrank", version, about = "Rank cities by travel weather")]
pub struct Cli {
    /// Log debug events (RUST_LOG overrides this).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch forecasts, rank the cities and print the report.
    Run {
        /// Only rank these cities (repeatable); defaults to every configured city.
        #[arg(long = "city", value_name = "NAME")]
        cities: Vec<String>,

        /// Max forecast requests in flight.
        #[arg(long)]
        fetch_workers: Option<usize>,

        /// Reduce pool size.
        #[arg(long)]
        reduce_workers: Option<usize>,

        /// Directory for aggregated.json and ranking.json.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip writing result files.
        #[arg(long)]
        no_save: bool,
    },

    /// List configured cities and their forecast URLs.
    Cities,

    /// Interactively edit the saved configuration.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run { cities, fetch_workers, reduce_workers, output_dir, no_save } => {
                let mut config = Config::load()?;
                if let Some(n) = fetch_workers {
                    config.max_fetch_workers = n;
                }
                if reduce_workers.is_some() {
                    config.max_reduce_workers = reduce_workers;
                }
                if output_dir.is_some() {
                    config.output_dir = output_dir;
                }
                config.validate()?;
                tracing::debug!(?config, "configuration loaded");

                let cities = if cities.is_empty() { config.city_names() } else { cities };
                run_pipeline(&config, &cities, !no_save).await?;
            }
            Command::Cities => {
                let config = Config::load()?;
                for (city, url) in &config.cities {
                    println!("{city:<14} {url}");
                }
            }
            Command::Configure => configure()?,
        }

        Ok(())
    }
}

async fn run_pipeline(config: &Config, cities: &[String], save: bool) -> anyhow::Result<()> {
    let source = YandexForecastApi::new(config.request_timeout())
        .context("Failed to create forecast HTTP client")?;

    let pipeline = Pipeline::new(
        Arc::new(source),
        config.directory(),
        config.reducer(),
        Arc::new(TracingObserver),
        config.pipeline_settings(),
    )
    .context("Failed to set up forecast pipeline")?;

    let output = pipeline.run(cities).await;

    if save {
        let writer = JsonFileWriter::new(config.output_dir()?);
        writer.write_aggregated(&output.aggregated)?;
        writer.write_ranked(&output.ranked)?;
    }

    print!("{}", report::render(&output).context("Failed to render report")?);
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let workers = CustomType::<usize>::new("Max concurrent forecast requests:")
        .with_default(config.max_fetch_workers)
        .with_error_message("Please enter a whole number")
        .prompt()?;

    let current_dir = config.output_dir()?.display().to_string();
    let output_dir = Text::new("Directory for result files:")
        .with_default(&current_dir)
        .prompt()?;

    config.max_fetch_workers = workers;
    config.output_dir = Some(PathBuf::from(output_dir));
    config.validate()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
