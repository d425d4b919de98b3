//! CLI command implementations
//!
//! This module contains the argument definition and the commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod request;
pub mod run_command;
pub mod locate_command;

pub use command_traits::{Command, CommandFactory};
pub use request::PipelineRequest;
pub use run_command::RunCommand;
pub use locate_command::LocateCommand;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use crate::utils::logger::Logger;
use crate::errors::PipelineResult;

/// Command-line definition of the `thermalkit` binary
pub fn cli() -> ClapCommand {
    ClapCommand::new("ThermalKit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render the most recent locally cloud-free thermal image of a point")
        .arg(
            Arg::new("lat")
                .help("Latitude in degrees")
                .required(true)
                .allow_negative_numbers(true)
                .index(1),
        )
        .arg(
            Arg::new("lon")
                .help("Longitude in degrees")
                .required(true)
                .allow_negative_numbers(true)
                .index(2),
        )
        .arg(
            Arg::new("date")
                .help("Only use scenes captured on or before this date (YYYY-MM-DD)")
                .required(false)
                .index(3),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .help("STAC ItemCollection JSON document to search (repeatable)")
                .value_name("FILE")
                .action(ArgAction::Append)
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output directory for rendered images")
                .value_name("DIR")
                .required(false),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Overall deadline for the run in seconds")
                .value_name("SECS")
                .required(false),
        )
        .arg(
            Arg::new("locate-only")
                .long("locate-only")
                .help("Select a scene and print its summary without rendering")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-preview")
                .long("no-preview")
                .help("Do not print the terminal preview")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Factory for creating command instances based on CLI arguments
pub struct ThermalkitCommandFactory;

impl ThermalkitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        ThermalkitCommandFactory
    }
}

impl<'a> CommandFactory<'a> for ThermalkitCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> PipelineResult<Box<dyn Command + 'a>> {
        if args.get_flag("locate-only") {
            Ok(Box::new(LocateCommand::new(args, logger)?))
        } else {
            Ok(Box::new(RunCommand::new(args, logger)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;

    fn parse(args: &[&str]) -> ArgMatches {
        cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn test_negative_coordinates_and_overrides() {
        let args = parse(&[
            "thermalkit", "44.43", "-110.59", "2025-10-06",
            "--catalog", "a.json", "--catalog", "b.json",
            "--output", "/tmp/thermal", "--timeout", "90",
        ]);
        let request = PipelineRequest::from_matches(&args).unwrap();
        assert_eq!(request.lat, 44.43);
        assert_eq!(request.lon, -110.59);
        assert_eq!(request.before_date.as_deref(), Some("2025-10-06"));
        assert_eq!(request.catalogs.len(), 2);
        assert_eq!(request.config.render.output_dir, std::path::PathBuf::from("/tmp/thermal"));
        assert_eq!(request.config.retry.deadline_secs, Some(90));
        assert!(request.config.search.show_progress);
    }

    #[test]
    fn test_invalid_request_values() {
        let args = parse(&["thermalkit", "abc", "10", "--catalog", "a.json"]);
        assert!(matches!(PipelineRequest::from_matches(&args), Err(PipelineError::InvalidInput(_))));

        let args = parse(&["thermalkit", "10", "10", "2025/10/06", "--catalog", "a.json"]);
        assert!(matches!(PipelineRequest::from_matches(&args), Err(PipelineError::InvalidInput(_))));

        let args = parse(&["thermalkit", "10", "200", "--catalog", "a.json"]);
        assert!(matches!(PipelineRequest::from_matches(&args), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_catalog_is_required() {
        assert!(cli().try_get_matches_from(["thermalkit", "10", "10"]).is_err());
    }

    #[test]
    fn test_factory_selects_locate_command() {
        let logger = Logger::capturing();
        let factory = ThermalkitCommandFactory::new();
        let args = parse(&["thermalkit", "10", "10", "--catalog", "a.json", "--locate-only"]);
        assert!(factory.create_command(&args, &logger).is_ok());
    }
}
