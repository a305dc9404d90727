//! Per-satellite top-of-atmosphere solar spectral irradiance (W/m²/μm)

use crate::types::{BandTag, ToaError, ToaResult};

/// Irradiance value for a band the satellite does not carry
pub const UNSUPPORTED_BAND: f64 = -9999.0;

/// GeoEye-1 irradiances are published in mW/cm²/μm
const GE01_UNIT_SCALE: f64 = (1.0 / 1000.0) * (1.0 / 0.0001);

/// Supported satellites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Satellite {
    WV03, // WorldView-3
    WV02, // WorldView-2
    QB02, // QuickBird-2
    GE01, // GeoEye-1
}

impl Satellite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Satellite::WV03 => "WV03",
            Satellite::WV02 => "WV02",
            Satellite::QB02 => "QB02",
            Satellite::GE01 => "GE01",
        }
    }

    /// Solar irradiance table for this satellite
    pub fn irradiances(&self) -> SolarIrradiances {
        match self {
            // Radiometric Use of WorldView-3 Imagery, v2
            Satellite::WV03 => SolarIrradiances {
                band_p: 1583.58,
                band_c: 1743.81,
                band_b: 1971.48,
                band_g: 1856.26,
                band_y: 1749.4,
                band_r: 1555.11,
                band_n: 1071.98,
                band_n2: 863.296,
                band_re: 1343.95,
            },
            // Radiometric Use of WorldView-2 Imagery
            Satellite::WV02 => SolarIrradiances {
                band_p: 1580.8140,
                band_c: 1758.2229,
                band_b: 1974.2416,
                band_g: 1856.4104,
                band_y: 1738.4791,
                band_r: 1559.4555,
                band_n: 1069.7302,
                band_n2: 861.2866,
                band_re: 1342.0695,
            },
            Satellite::QB02 => SolarIrradiances {
                band_p: 1381.79,
                band_c: UNSUPPORTED_BAND,
                band_b: 1924.59,
                band_g: 1843.08,
                band_y: UNSUPPORTED_BAND,
                band_r: 1574.77,
                band_n: 1113.71,
                band_n2: UNSUPPORTED_BAND,
                band_re: UNSUPPORTED_BAND,
            },
            // GeoEye-1 radiance-at-aperture note
            Satellite::GE01 => SolarIrradiances {
                band_p: 161.7 * GE01_UNIT_SCALE,
                band_c: UNSUPPORTED_BAND,
                band_b: 196.0 * GE01_UNIT_SCALE,
                band_g: 185.3 * GE01_UNIT_SCALE,
                band_y: UNSUPPORTED_BAND,
                band_r: 150.5 * GE01_UNIT_SCALE,
                band_n: 103.9 * GE01_UNIT_SCALE,
                band_n2: UNSUPPORTED_BAND,
                band_re: UNSUPPORTED_BAND,
            },
        }
    }
}

impl std::fmt::Display for Satellite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Satellite {
    type Err = ToaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "WV03" => Ok(Satellite::WV03),
            "WV02" => Ok(Satellite::WV02),
            "QB02" => Ok(Satellite::QB02),
            "GE01" => Ok(Satellite::GE01),
            other => Err(ToaError::UnknownSatellite(other.to_string())),
        }
    }
}

/// Solar irradiance for each of the nine band tags of one satellite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarIrradiances {
    pub band_p: f64,
    pub band_c: f64,
    pub band_b: f64,
    pub band_g: f64,
    pub band_y: f64,
    pub band_r: f64,
    pub band_n: f64,
    pub band_n2: f64,
    pub band_re: f64,
}

impl SolarIrradiances {
    /// Look up the irradiance table by satellite identifier (e.g. "WV02")
    pub fn lookup(satellite_id: &str) -> ToaResult<Self> {
        let satellite: Satellite = satellite_id.parse()?;
        log::debug!("Using solar irradiance table for {}", satellite);
        Ok(satellite.irradiances())
    }

    pub fn for_band(&self, band: BandTag) -> f64 {
        match band {
            BandTag::BAND_P => self.band_p,
            BandTag::BAND_C => self.band_c,
            BandTag::BAND_B => self.band_b,
            BandTag::BAND_G => self.band_g,
            BandTag::BAND_Y => self.band_y,
            BandTag::BAND_R => self.band_r,
            BandTag::BAND_N => self.band_n,
            BandTag::BAND_N2 => self.band_n2,
            BandTag::BAND_RE => self.band_re,
        }
    }

    pub fn supports(&self, band: BandTag) -> bool {
        self.for_band(band) >= 1.0
    }
}
