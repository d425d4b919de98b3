//! Scene selection command

use clap::ArgMatches;

use crate::api::ThermalKit;
use crate::commands::command_traits::Command;
use crate::commands::request::PipelineRequest;
use crate::errors::PipelineResult;
use crate::scene::SelectedScene;
use crate::utils::logger::Logger;

/// Command that only selects a scene and prints its summary
pub struct LocateCommand<'a> {
    request: PipelineRequest,
    logger: &'a Logger,
}

impl<'a> LocateCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> PipelineResult<Self> {
        Ok(LocateCommand { request: PipelineRequest::from_matches(args)?, logger })
    }
}

/// Multi-line description of a selected scene
pub fn scene_summary(scene: &SelectedScene) -> String {
    let candidate = &scene.candidate;
    let bbox = &scene.bbox;
    let mut summary = format!("Scene: {}\n", candidate.id);
    summary.push_str(&format!("  Captured: {}\n", candidate.datetime.format("%Y-%m-%d %H:%M UTC")));
    summary.push_str(&format!("  Platform: {}\n", candidate.platform));
    summary.push_str(&format!("  Scene cloud cover: {}%\n", candidate.cloud_label()));
    summary.push_str(&format!("  Local clear: {:.1}%\n", scene.local_clear));
    summary.push_str(&format!("  Thermal band: {} ({})\n", candidate.thermal_key, candidate.thermal_href));
    summary.push_str(&format!(
        "  Quality band: {}\n",
        candidate.quality_href.as_deref().unwrap_or("none")
    ));
    summary.push_str(&format!(
        "  Bounds: {:.5}, {:.5}, {:.5}, {:.5}",
        bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
    ));
    summary
}

impl<'a> Command for LocateCommand<'a> {
    fn execute(&self) -> PipelineResult<()> {
        let request = &self.request;
        let kit = ThermalKit::open_local(request.config.clone(), &request.catalogs, self.logger)?;
        let scene = kit.locate(request.lat, request.lon, request.before_date.as_deref())?;
        println!("{}", scene_summary(&scene));
        Ok(())
    }
}
