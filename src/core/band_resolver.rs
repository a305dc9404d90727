//! Band calibration resolution from flattened metadata keys
//!
//! Metadata ingest flattens each band element into entries keyed
//! `<bandIndex>__<bandTag>__<FIELD>`, e.g. `1__BAND_C__ABSCALFACTOR`. All key
//! handling lives in [`parse_calibration_key`] so malformed keys surface as
//! typed [`KeyParseError`]s.

use crate::core::irradiance::SolarIrradiances;
use crate::types::{BandCalibration, BandTag, RawCalibrationMapping, ToaError, ToaResult};

const KEY_DELIMITER: &str = "__";

/// Which calibration quantity an entry carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationField {
    AbsCalFactor,
    EffectiveBandwidth,
    Other(String),
}

/// One parsed `<bandIndex>__<bandTag>__<FIELD>` entry
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationEntry<'a> {
    pub band_index: usize,
    pub tag: &'a str,
    pub field: CalibrationField,
    pub value: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("key does not start with a band index")]
    NotBandMetadata,

    #[error("invalid band index prefix '{0}'")]
    InvalidBandIndex(String),

    #[error("missing '__' delimiter")]
    MissingDelimiter,

    #[error("empty band tag")]
    EmptyTag,
}

/// Band index encoded in the leading digits of a key, up to the first `_`
pub fn band_index_of(key: &str) -> Result<usize, KeyParseError> {
    if !key.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(KeyParseError::NotBandMetadata);
    }
    let prefix = key.split('_').next().unwrap_or(key);
    prefix
        .parse::<usize>()
        .map_err(|_| KeyParseError::InvalidBandIndex(prefix.to_string()))
}

/// Parse a calibration key and pair it with its raw value
pub fn parse_calibration_key<'a>(
    key: &'a str,
    value: &'a str,
) -> Result<CalibrationEntry<'a>, KeyParseError> {
    let band_index = band_index_of(key)?;

    let segments: Vec<&str> = key.split(KEY_DELIMITER).collect();
    if segments.len() < 2 {
        return Err(KeyParseError::MissingDelimiter);
    }

    let tag = segments[1].trim();
    if tag.is_empty() {
        return Err(KeyParseError::EmptyTag);
    }

    let field = if key.contains("ABSCALFACTOR") {
        CalibrationField::AbsCalFactor
    } else if key.contains("EFFECTIVEBANDWIDTH") {
        CalibrationField::EffectiveBandwidth
    } else {
        CalibrationField::Other(segments.get(2).map(|s| s.trim().to_string()).unwrap_or_default())
    };

    Ok(CalibrationEntry {
        band_index,
        tag,
        field,
        value,
    })
}

fn parse_value(key: &str, value: &str) -> ToaResult<f64> {
    value.trim().parse::<f64>().map_err(|e| {
        ToaError::MetadataParse(format!("invalid value '{}' for {}: {}", value, key, e))
    })
}

/// Resolve the calibration record for one (1-based) band of the raster
pub fn resolve_band(
    band_index: usize,
    mapping: &RawCalibrationMapping,
    irradiances: &SolarIrradiances,
) -> ToaResult<BandCalibration> {
    let mut band_name: Option<&str> = None;
    let mut abs_cal_factor: Option<f64> = None;
    let mut effective_bandwidth: Option<f64> = None;

    for (key, value) in mapping {
        match band_index_of(key) {
            Ok(index) if index == band_index => {}
            Ok(_) | Err(KeyParseError::NotBandMetadata) => continue,
            Err(e) => {
                log::debug!("Skipping key '{}': {}", key, e);
                continue;
            }
        }

        let entry = parse_calibration_key(key, value).map_err(|e| {
            ToaError::MetadataParse(format!("malformed calibration key '{}': {}", key, e))
        })?;

        band_name = Some(entry.tag);
        match entry.field {
            CalibrationField::AbsCalFactor => abs_cal_factor = Some(parse_value(key, entry.value)?),
            CalibrationField::EffectiveBandwidth => {
                effective_bandwidth = Some(parse_value(key, entry.value)?)
            }
            CalibrationField::Other(_) => {}
        }
    }

    let band_name = band_name.ok_or_else(|| {
        ToaError::MetadataParse(format!("no calibration entries for band {}", band_index))
    })?;
    let band_tag: BandTag = band_name.parse()?;

    let abs_cal_factor = abs_cal_factor.ok_or_else(|| {
        ToaError::MetadataParse(format!("missing ABSCALFACTOR for band {} ({})", band_index, band_tag))
    })?;
    let effective_bandwidth = effective_bandwidth.ok_or_else(|| {
        ToaError::MetadataParse(format!(
            "missing EFFECTIVEBANDWIDTH for band {} ({})",
            band_index, band_tag
        ))
    })?;
    if !(effective_bandwidth > 0.0) {
        return Err(ToaError::MetadataParse(format!(
            "effective bandwidth must be positive for band {} ({}), got {}",
            band_index, band_tag, effective_bandwidth
        )));
    }

    let calibration = BandCalibration {
        band_index,
        band_name: band_tag,
        abs_cal_factor,
        effective_bandwidth,
        solar_irradiance: irradiances.for_band(band_tag),
    };
    log::debug!("Resolved band {}: {:?}", band_index, calibration);
    Ok(calibration)
}
