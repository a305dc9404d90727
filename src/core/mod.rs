//! Radiometric calibration engine

pub mod irradiance;
pub mod band_resolver;
pub mod geometry;
pub mod radiometry;
pub mod pipeline;

// Re-export main types
pub use irradiance::{Satellite, SolarIrradiances, UNSUPPORTED_BAND};
pub use band_resolver::{parse_calibration_key, resolve_band, CalibrationEntry, CalibrationField, KeyParseError};
pub use geometry::{derive_geometry, derive_geometry_with, parse_acquisition_time, AcquisitionTime};
pub use radiometry::{radiometric_transform, transform_scanline};
pub use pipeline::{BandSummary, ProcessingSummary, RasterSink, RasterSource, ToaProcessor};
