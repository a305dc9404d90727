//! toa-convert: top-of-atmosphere radiance and reflectance for high-resolution
//! optical imagery (WorldView-2/3, QuickBird-2, GeoEye-1).
//!
//! Raw DNs are converted band by band using the absolute calibration factor and
//! effective bandwidth from the scene metadata, the satellite's solar spectral
//! irradiance, and the Earth-Sun distance and solar zenith angle at acquisition.

pub mod types;
pub mod config;
pub mod io;
pub mod core;

use std::path::{Path, PathBuf};

// Re-export main types and functions for easier access
pub use types::{
    BandCalibration, BandTag, CalibrationMetadata, RawCalibrationMapping, SceneGeometry,
    SceneTiming, ToaError, ToaResult, ToaSample, NODATA_SENTINEL,
};
pub use config::{EarthSunDistanceModel, ToaConfig};
pub use crate::core::{ProcessingSummary, Satellite, SolarIrradiances, ToaProcessor};
pub use io::{GdalRasterSink, GdalRasterSource};

/// Input files of one scene
#[derive(Debug, Clone)]
pub struct ToaRequest {
    pub image: PathBuf, // NITF or GeoTIFF
    pub imd: PathBuf,
    pub xml: PathBuf,
}

/// Result of a completed conversion
#[derive(Debug, Clone)]
pub struct ToaOutputs {
    pub radiance_path: PathBuf,
    pub reflectance_path: PathBuf,
    pub geometry: SceneGeometry,
    pub satellite: Satellite,
    pub summary: ProcessingSummary,
}

fn require_file(path: &Path) -> ToaResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ToaError::Config("input path is empty".to_string()));
    }
    if !path.is_file() {
        return Err(ToaError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Convert a scene to TOA radiance and reflectance GeoTIFFs.
///
/// Metadata is read and validated before any output is created; once the
/// outputs exist, a failure leaves them partially written on disk.
pub fn convert_scene(request: &ToaRequest, config: &ToaConfig) -> ToaResult<ToaOutputs> {
    config.validate()?;
    require_file(&request.image)?;
    require_file(&request.imd)?;
    require_file(&request.xml)?;

    // Step 1: solar geometry from the IMD timing lines
    let timing = io::read_scene_timing(&request.imd)?;
    let geometry = crate::core::derive_geometry_with(
        &timing.timestamp_line,
        &timing.sun_elevation_line,
        config.earth_sun_model,
    )?;

    // Step 2: calibration entries and irradiance table
    let calibration = io::read_calibration(&request.imd, &request.xml)?;
    let satellite: Satellite = calibration.satellite_id.parse()?;
    log::info!("Satellite: {}", satellite);

    // Step 3: stream the raster into both outputs
    let source = GdalRasterSource::open(&request.image)?;
    let dims = crate::core::RasterSource::dimensions(&source);
    let (radiance_path, reflectance_path) = io::output_paths(&request.image, config);
    let geo_transform = source.geo_transform();
    let projection = source.projection();

    let mut radiance_sink = GdalRasterSink::create(
        &radiance_path,
        dims,
        geo_transform.as_ref(),
        &projection,
        &config.output_driver,
        config.overwrite_existing,
    )?;
    let mut reflectance_sink = GdalRasterSink::create(
        &reflectance_path,
        dims,
        geo_transform.as_ref(),
        &projection,
        &config.output_driver,
        config.overwrite_existing,
    )?;

    let processor = ToaProcessor::new(geometry, satellite.irradiances());
    let summary = processor.process(
        &source,
        &mut radiance_sink,
        &mut reflectance_sink,
        &calibration.mapping,
    )?;

    log::info!("TOA radiances written to {}", radiance_path.display());
    log::info!("TOA reflectances written to {}", reflectance_path.display());

    Ok(ToaOutputs {
        radiance_path,
        reflectance_path,
        geometry,
        satellite,
        summary,
    })
}
