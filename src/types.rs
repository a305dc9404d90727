use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output value for NoData, unsupported bands and invalid pixels
pub const NODATA_SENTINEL: f32 = -9999.0;

/// Raw calibration fields keyed `<bandIndex>__<bandTag>__<FIELD>`
pub type RawCalibrationMapping = BTreeMap<String, String>;

/// Solar geometry of one scene, shared by every pixel of the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneGeometry {
    pub earth_sun_distance: f64, // astronomical units
    pub solar_zenith_angle: f64, // degrees
}

/// Spectral band tags used by DigitalGlobe/Maxar metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum BandTag {
    BAND_P,  // panchromatic
    BAND_C,  // coastal
    BAND_B,  // blue
    BAND_G,  // green
    BAND_Y,  // yellow
    BAND_R,  // red
    BAND_N,  // near infrared
    BAND_N2, // near infrared 2
    BAND_RE, // red edge
}

impl BandTag {
    pub const ALL: [BandTag; 9] = [
        BandTag::BAND_P,
        BandTag::BAND_C,
        BandTag::BAND_B,
        BandTag::BAND_G,
        BandTag::BAND_Y,
        BandTag::BAND_R,
        BandTag::BAND_N,
        BandTag::BAND_N2,
        BandTag::BAND_RE,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BandTag::BAND_P => "BAND_P",
            BandTag::BAND_C => "BAND_C",
            BandTag::BAND_B => "BAND_B",
            BandTag::BAND_G => "BAND_G",
            BandTag::BAND_Y => "BAND_Y",
            BandTag::BAND_R => "BAND_R",
            BandTag::BAND_N => "BAND_N",
            BandTag::BAND_N2 => "BAND_N2",
            BandTag::BAND_RE => "BAND_RE",
        }
    }
}

impl std::fmt::Display for BandTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BandTag {
    type Err = ToaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BandTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| ToaError::UnknownBandTag(s.to_string()))
    }
}

/// Calibration record for a single band of the input raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandCalibration {
    pub band_index: usize, // 1-based, GDAL convention
    pub band_name: BandTag,
    pub abs_cal_factor: f64,
    pub effective_bandwidth: f64,
    pub solar_irradiance: f64,
}

/// Radiance and reflectance computed for one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToaSample {
    pub radiance: f32,
    pub reflectance: f32,
}

impl ToaSample {
    pub const NODATA: ToaSample = ToaSample {
        radiance: NODATA_SENTINEL,
        reflectance: NODATA_SENTINEL,
    };
}

/// Calibration fields and satellite id extracted from scene metadata
#[derive(Debug, Clone, Default)]
pub struct CalibrationMetadata {
    pub satellite_id: String,
    pub mapping: RawCalibrationMapping,
}

impl CalibrationMetadata {
    /// Number of distinct band indices present in the mapping
    pub fn band_count(&self) -> usize {
        let mut indices: Vec<&str> = self
            .mapping
            .keys()
            .filter_map(|key| key.split('_').next())
            .filter(|prefix| !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len()
    }
}

/// Raw timing lines from the IMD file
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTiming {
    pub timestamp_line: String,
    pub sun_elevation_line: String,
}

/// Raster shape: rows, columns and band count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterDimensions {
    pub rows: usize,
    pub cols: usize,
    pub bands: usize,
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl From<[f64; 6]> for GeoTransform {
    fn from(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(gt: GeoTransform) -> Self {
        [
            gt.top_left_x,
            gt.pixel_width,
            gt.rotation_x,
            gt.top_left_y,
            gt.rotation_y,
            gt.pixel_height,
        ]
    }
}

/// Error types for TOA conversion
#[derive(Debug, thiserror::Error)]
pub enum ToaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Metadata error: {0}")]
    MetadataParse(String),

    #[error("Satellite not recognized: {0}")]
    UnknownSatellite(String),

    #[error("Unable to get solar irradiance for band: {0}")]
    UnknownBandTag(String),

    #[error("Raster I/O error: {0}")]
    RasterIo(String),

    #[error("Unable to remove existing output {}: {source}", path.display())]
    OutputCollision {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),
}

/// Result type for TOA operations
pub type ToaResult<T> = Result<T, ToaError>;
