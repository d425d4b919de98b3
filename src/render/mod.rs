//! Colorizing, overlay and output of normalized thermal grids

pub mod colormap;
pub mod overlay;
pub mod preview;
mod renderer;

pub use colormap::{apply_colormap, sample_ramp, THERMAL_STOPS};
pub use overlay::{draw_overlay, overlay_font, OverlayContent, OverlayLayout};
pub use preview::{preview_lines, print_preview};
pub use renderer::{output_file_name, RenderedImage, ThermalRenderer};
