//! I/O modules for reading scene metadata and reading/writing rasters

pub mod metadata;
pub mod raster;

pub use metadata::{read_calibration, read_scene_timing};
pub use raster::{output_paths, GdalRasterSink, GdalRasterSource};
