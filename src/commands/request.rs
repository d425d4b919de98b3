//! Pipeline request parsed from CLI arguments

use std::path::PathBuf;

use clap::ArgMatches;
use log::{debug, info};

use crate::api::{parse_date, validate_coordinates};
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};

/// Everything a command needs to start the pipeline
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub lat: f64,
    pub lon: f64,
    /// Validated `YYYY-MM-DD` upper bound on capture date
    pub before_date: Option<String>,
    /// STAC ItemCollection documents to search
    pub catalogs: Vec<PathBuf>,
    pub config: PipelineConfig,
}

impl PipelineRequest {
    /// Reads and validates the shared arguments
    ///
    /// Command-line options override values from the `--config` file.
    pub fn from_matches(args: &ArgMatches) -> PipelineResult<Self> {
        let lat = parse_coordinate(args, "lat")?;
        let lon = parse_coordinate(args, "lon")?;
        validate_coordinates(lat, lon)?;

        let before_date = args.get_one::<String>("date").cloned();
        if let Some(date) = &before_date {
            parse_date(date)?;
        }

        let catalogs: Vec<PathBuf> = args.get_many::<String>("catalog")
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_default();
        if catalogs.is_empty() {
            return Err(PipelineError::InvalidInput("At least one --catalog document is required".to_string()));
        }

        let mut config = match args.get_one::<String>("config") {
            Some(path) => {
                info!("Loading configuration from {}", path);
                PipelineConfig::from_file(path)?
            },
            None => PipelineConfig::default(),
        };

        if let Some(dir) = args.get_one::<String>("output") {
            config.render.output_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = args.get_one::<String>("timeout") {
            let secs = timeout.parse::<u64>()
                .map_err(|_| PipelineError::InvalidInput(format!("Invalid timeout: {}", timeout)))?;
            config.retry.deadline_secs = Some(secs);
        }
        config.search.show_progress = true;
        config.validate()?;

        debug!("Request: {}, {} before {:?} over {:?}", lat, lon, before_date, catalogs);
        Ok(PipelineRequest { lat, lon, before_date, catalogs, config })
    }
}

fn parse_coordinate(args: &ArgMatches, name: &str) -> PipelineResult<f64> {
    let raw = args.get_one::<String>(name)
        .ok_or_else(|| PipelineError::InvalidInput(format!("Missing {}", name)))?;
    raw.parse::<f64>()
        .map_err(|_| PipelineError::InvalidInput(format!("Invalid {}: {}", name, raw)))
}
