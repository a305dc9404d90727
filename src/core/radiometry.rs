use crate::types::{BandCalibration, SceneGeometry, ToaSample, NODATA_SENTINEL};
use std::f64::consts::PI;

/// Convert one DN to TOA radiance and reflectance.
///
/// Radiance is computed in single precision. Reflectance is the sentinel for
/// bands whose solar irradiance is below 1 (unsupported on this satellite).
/// A DN equal to the band's NoData value yields the sentinel for both outputs
/// whatever the earlier steps produced.
pub fn radiometric_transform(
    dn: i64,
    no_data: Option<i64>,
    calibration: &BandCalibration,
    geometry: &SceneGeometry,
) -> ToaSample {
    let radiance = (dn as f32 * calibration.abs_cal_factor as f32)
        / calibration.effective_bandwidth as f32;

    let reflectance = if calibration.solar_irradiance < 1.0 {
        NODATA_SENTINEL
    } else {
        let zenith = geometry.solar_zenith_angle.to_radians();
        let d2 = geometry.earth_sun_distance * geometry.earth_sun_distance;
        ((radiance as f64 * d2 * PI) / (calibration.solar_irradiance * zenith.cos())) as f32
    };

    if no_data == Some(dn) {
        return ToaSample::NODATA;
    }

    ToaSample {
        radiance,
        reflectance,
    }
}

/// Apply [`radiometric_transform`] across one scanline into reusable buffers
pub fn transform_scanline(
    dns: &[i64],
    no_data: Option<i64>,
    calibration: &BandCalibration,
    geometry: &SceneGeometry,
    radiance: &mut [f32],
    reflectance: &mut [f32],
) {
    debug_assert_eq!(dns.len(), radiance.len());
    debug_assert_eq!(dns.len(), reflectance.len());

    for ((&dn, rad), refl) in dns.iter().zip(radiance.iter_mut()).zip(reflectance.iter_mut()) {
        let sample = radiometric_transform(dn, no_data, calibration, geometry);
        *rad = sample.radiance;
        *refl = sample.reflectance;
    }
}
