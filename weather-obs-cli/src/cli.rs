use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::Select;
use serde_json::Value;
use tracing::{debug, info};
use weather_obs_core::{Config, OutputFormat, RawObservation, WeatherObservation};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-obs", version, about = "Validate weather observations")]
pub struct Cli {
    /// Output format, overriding the configured one ("pretty" or "compact").
    #[arg(long, global = true)]
    pub format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate raw observation JSON (one object or an array) and print the clean form.
    Validate {
        /// JSON file to read; stdin when absent.
        path: Option<PathBuf>,
    },

    /// Build a single observation from flags.
    New {
        #[command(flatten)]
        fields: ObservationFlags,

        /// Print the debug representation instead of JSON.
        #[arg(long)]
        debug: bool,
    },

    /// Choose the default output format.
    Configure {
        /// "pretty" or "compact"; prompts when absent.
        output: Option<String>,
    },
}

/// Observation fields as typed on the command line. Numbers stay text until
/// the builder coerces them.
#[derive(Debug, Args)]
pub struct ObservationFlags {
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub country: String,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,
    #[arg(long, allow_hyphen_values = true)]
    pub temp: String,
    #[arg(long, allow_hyphen_values = true)]
    pub wind: String,
    /// Observation timestamp; defaults to the current UTC time.
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl ObservationFlags {
    /// Build the observation, stamping it with `now` when no `--time` was given.
    pub fn into_observation(self, now: DateTime<Utc>) -> Result<WeatherObservation> {
        let time = self
            .time
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));

        WeatherObservation::builder()
            .city(self.city)
            .country(self.country)
            .latitude(self.lat)
            .longitude(self.lon)
            .temperature_c(self.temp)
            .windspeed_kmh(self.wind)
            .observation_time(time)
            .maybe_notes(self.notes)
            .build()
            .context("Invalid observation")
    }
}

impl Cli {
    /// `--format` wins over the configured output format.
    pub fn output_format(&self, config: &Config) -> Result<OutputFormat> {
        match self.format.as_deref() {
            Some(f) => OutputFormat::try_from(f),
            None => Ok(config.output),
        }
    }

    pub fn run(self, mut config: Config) -> Result<()> {
        let format = self.output_format(&config)?;

        match self.command {
            Command::Validate { path } => {
                let input = read_input(path.as_ref())?;
                let (observations, batch) = validate_json(&input)?;
                info!(count = observations.len(), "validated observations");

                println!("{}", render_observations(&observations, batch, format)?);
            }
            Command::New { fields, debug } => {
                let obs = fields.into_observation(Utc::now())?;
                println!("{}", render_observation(&obs, debug, format)?);
            }
            Command::Configure { output } => {
                let chosen = match output {
                    Some(f) => OutputFormat::try_from(f.as_str())?,
                    None => Select::new("Default output format:", OutputFormat::all().to_vec())
                        .prompt()
                        .context("Failed to read output format")?,
                };

                config.output = chosen;
                config.save()?;
                println!("Default output format set to {chosen}.");
            }
        }

        Ok(())
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Parse one raw observation or an array of them, validating each in order.
///
/// The flag is `true` when the input was an array, whatever its length.
fn validate_json(input: &str) -> Result<(Vec<WeatherObservation>, bool)> {
    let value: Value = serde_json::from_str(input).context("Input is not valid JSON")?;

    let (items, batch) = match value {
        Value::Array(items) => (items, true),
        other @ Value::Object(_) => (vec![other], false),
        _ => return Err(anyhow!("Expected a JSON object or an array of objects")),
    };

    let observations = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let label = if batch {
                format!("Record {idx}")
            } else {
                "Record".to_string()
            };
            debug!(idx, "validating record");

            let raw: RawObservation = serde_json::from_value(item)
                .with_context(|| format!("{label} does not have the observation fields"))?;
            WeatherObservation::try_from(raw).with_context(|| format!("{label} is invalid"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((observations, batch))
}

/// Arrays in, arrays out: a lone object is only printed bare when the input was one.
fn render_observations(
    observations: &[WeatherObservation],
    batch: bool,
    format: OutputFormat,
) -> Result<String> {
    match (batch, observations) {
        (false, [single]) => format.render(single),
        _ => format.render(observations),
    }
}

fn render_observation(
    obs: &WeatherObservation,
    debug: bool,
    format: OutputFormat,
) -> Result<String> {
    if debug {
        Ok(format!("{obs:?}"))
    } else {
        format.render(obs)
    }
}
