//! Full pipeline command
//!
//! Selects a scene, renders the thermal image and prints a terminal
//! preview of its centre.

use clap::ArgMatches;
use log::info;

use crate::api::ThermalKit;
use crate::commands::command_traits::Command;
use crate::commands::request::PipelineRequest;
use crate::errors::PipelineResult;
use crate::render::print_preview;
use crate::utils::logger::Logger;

/// Command running the whole pipeline for one point
pub struct RunCommand<'a> {
    request: PipelineRequest,
    /// Whether to print the terminal preview
    preview: bool,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> RunCommand<'a> {
    /// Create a new run command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new RunCommand instance or an error
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> PipelineResult<Self> {
        let request = PipelineRequest::from_matches(args)?;
        let preview = !args.get_flag("no-preview");
        Ok(RunCommand { request, preview, logger })
    }
}

impl<'a> Command for RunCommand<'a> {
    fn execute(&self) -> PipelineResult<()> {
        let request = &self.request;
        let kit = ThermalKit::open_local(request.config.clone(), &request.catalogs, self.logger)?;
        let output = kit.run(request.lat, request.lon, request.before_date.as_deref())?;

        info!(
            "Scene {} ({}), {:.0}% clear locally",
            output.scene.id(), output.scene.candidate.platform, output.scene.local_clear
        );
        println!("{}", output.image_path.display());

        if self.preview {
            let img = image::open(&output.image_path)?.to_rgb8();
            print_preview(&img);
        }
        Ok(())
    }
}
