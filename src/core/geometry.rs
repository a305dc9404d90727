//! Earth-Sun distance and solar zenith angle from IMD scene timing
//!
//! The Earth-Sun distance follows the Julian-day approximation from the
//! DigitalGlobe radiometric technical notes. [`EarthSunDistanceModel::Reference`]
//! reproduces the reference tool exactly, including two quirks: the UTC term
//! adds `month / 60` where minutes belong, and the mean anomaly `g` is passed
//! to `cos()` in degrees. [`EarthSunDistanceModel::Corrected`] fixes both.

use crate::config::EarthSunDistanceModel;
use crate::types::{SceneGeometry, ToaError, ToaResult};
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Date and time fields of the scene acquisition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub seconds: f64, // seconds with fractional part
}

/// Value to the right of `=` on an IMD line, or the whole input if there is none
fn imd_value(line: &str) -> &str {
    let value = match line.find('=') {
        Some(pos) => &line[pos + 1..],
        None => line,
    };
    value.trim().trim_end_matches(';').trim()
}

/// Parse an ISO-like acquisition timestamp, e.g. `2021-10-27T11:41:57.133850Z`.
///
/// Accepts the bare timestamp or a full IMD line such as
/// `firstLineTime = 2021-10-27T11:41:57.133850Z;`.
pub fn parse_acquisition_time(timestamp: &str) -> ToaResult<AcquisitionTime> {
    let value = imd_value(timestamp);
    let normalized = value.trim_end_matches('Z').replace('T', " ");

    let datetime = NaiveDateTime::parse_from_str(normalized.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| {
            ToaError::MetadataParse(format!("unable to parse acquisition time '{}': {}", value, e))
        })?;

    Ok(AcquisitionTime {
        year: datetime.year(),
        month: datetime.month(),
        day: datetime.day(),
        hour: datetime.hour(),
        minute: datetime.minute(),
        seconds: datetime.second() as f64 + datetime.nanosecond() as f64 / 1e9,
    })
}

/// Earth-Sun distance in astronomical units
pub fn earth_sun_distance(time: &AcquisitionTime, model: EarthSunDistanceModel) -> f64 {
    let mut year = time.year as f64;
    let mut month = time.month as f64;
    let day = time.day as f64;
    let hour = time.hour as f64;

    // January and February count as months 13 and 14 of the previous year
    if time.month == 1 || time.month == 2 {
        year -= 1.0;
        month += 12.0;
    }

    let utc = match model {
        EarthSunDistanceModel::Reference => hour + month / 60.0 + time.seconds / 3600.0,
        EarthSunDistanceModel::Corrected => {
            hour + time.minute as f64 / 60.0 + time.seconds / 3600.0
        }
    };

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    let julian_day = (365.25 * (year + 4716.0)).floor()
        + (30.6001 * (month + 1.0)).floor()
        + day
        + utc / 24.0
        + b
        - 1524.5;
    let d = julian_day - 2451545.0;
    let g = 357.529 + 0.98560028 * d;

    let g = match model {
        EarthSunDistanceModel::Reference => g,
        EarthSunDistanceModel::Corrected => g.to_radians(),
    };

    log::debug!(
        "Earth-Sun distance inputs: JD={:.5}, D={:.5}, g={:.5}, UTC={:.5}",
        julian_day,
        d,
        g,
        utc
    );

    1.00014 - 0.01671 * g.cos() - 0.00014 * (2.0 * g).cos()
}

/// Solar zenith angle in degrees from a `meanSunEl = 32.1;` line
pub fn solar_zenith_angle(sun_elevation_line: &str) -> ToaResult<f64> {
    let value = imd_value(sun_elevation_line);
    let elevation = value.parse::<f64>().map_err(|e| {
        ToaError::MetadataParse(format!(
            "unable to parse sun elevation from '{}': {}",
            sun_elevation_line.trim(),
            e
        ))
    })?;
    Ok(90.0 - elevation)
}

/// Scene geometry using the reference Earth-Sun distance model
pub fn derive_geometry(timestamp: &str, sun_elevation_line: &str) -> ToaResult<SceneGeometry> {
    derive_geometry_with(timestamp, sun_elevation_line, EarthSunDistanceModel::Reference)
}

pub fn derive_geometry_with(
    timestamp: &str,
    sun_elevation_line: &str,
    model: EarthSunDistanceModel,
) -> ToaResult<SceneGeometry> {
    if timestamp.trim().is_empty() {
        return Err(ToaError::MetadataParse("missing acquisition time".to_string()));
    }
    if sun_elevation_line.trim().is_empty() {
        return Err(ToaError::MetadataParse("missing sun elevation".to_string()));
    }

    let time = parse_acquisition_time(timestamp)?;
    let geometry = SceneGeometry {
        earth_sun_distance: earth_sun_distance(&time, model),
        solar_zenith_angle: solar_zenith_angle(sun_elevation_line)?,
    };

    log::info!(
        "Scene geometry ({:?} model): Earth-Sun distance {:.6} AU, solar zenith {:.3}°",
        model,
        geometry.earth_sun_distance,
        geometry.solar_zenith_angle
    );
    Ok(geometry)
}
