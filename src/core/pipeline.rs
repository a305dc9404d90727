use crate::core::band_resolver::resolve_band;
use crate::core::irradiance::SolarIrradiances;
use crate::core::radiometry::transform_scanline;
use crate::types::{
    BandCalibration, BandTag, RasterDimensions, RawCalibrationMapping, SceneGeometry, ToaError,
    ToaResult, NODATA_SENTINEL,
};

/// Band-interleaved raster of integer DNs, read one scanline at a time
pub trait RasterSource {
    fn dimensions(&self) -> RasterDimensions;

    /// NoData value of a 1-based band, if the raster defines one
    fn no_data_value(&self, band: usize) -> ToaResult<Option<i64>>;

    /// Fill `buffer` with the `row`-th scanline of a 1-based band
    fn read_scanline(&self, band: usize, row: usize, buffer: &mut Vec<i64>) -> ToaResult<()>;
}

/// Float32 raster written one scanline at a time
pub trait RasterSink {
    fn write_scanline(&mut self, band: usize, row: usize, data: &[f32]) -> ToaResult<()>;
}

/// Per-band processing statistics
#[derive(Debug, Clone, PartialEq)]
pub struct BandSummary {
    pub band_index: usize,
    pub band_name: BandTag,
    pub valid_pixels: usize,
    pub nodata_pixels: usize,
    pub min_radiance: f32,
    pub max_radiance: f32,
    pub reflectance_supported: bool,
}

impl BandSummary {
    fn new(calibration: &BandCalibration, reflectance_supported: bool) -> Self {
        Self {
            band_index: calibration.band_index,
            band_name: calibration.band_name,
            valid_pixels: 0,
            nodata_pixels: 0,
            min_radiance: f32::INFINITY,
            max_radiance: f32::NEG_INFINITY,
            reflectance_supported,
        }
    }

    fn accumulate(&mut self, dns: &[i64], no_data: Option<i64>, radiance: &[f32]) {
        for (&dn, &value) in dns.iter().zip(radiance) {
            if no_data == Some(dn) {
                self.nodata_pixels += 1;
            } else {
                self.valid_pixels += 1;
                self.min_radiance = self.min_radiance.min(value);
                self.max_radiance = self.max_radiance.max(value);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingSummary {
    pub bands: Vec<BandSummary>,
}

impl ProcessingSummary {
    pub fn total_pixels(&self) -> usize {
        self.bands
            .iter()
            .map(|b| b.valid_pixels + b.nodata_pixels)
            .sum()
    }
}

/// Streams a raster through the radiometric transform, band by band and row by row
pub struct ToaProcessor {
    geometry: SceneGeometry,
    irradiances: SolarIrradiances,
}

impl ToaProcessor {
    pub fn new(geometry: SceneGeometry, irradiances: SolarIrradiances) -> Self {
        Self {
            geometry,
            irradiances,
        }
    }

    /// Convert every band of `source`, writing radiance and reflectance scanlines.
    ///
    /// The first read, write or calibration failure aborts the run; scanlines
    /// already written stay in the sinks.
    pub fn process<S, W>(
        &self,
        source: &S,
        radiance_sink: &mut W,
        reflectance_sink: &mut W,
        mapping: &RawCalibrationMapping,
    ) -> ToaResult<ProcessingSummary>
    where
        S: RasterSource + ?Sized,
        W: RasterSink + ?Sized,
    {
        let dims = source.dimensions();
        log::info!(
            "Converting {} band(s) of {} x {} pixels to TOA radiance/reflectance",
            dims.bands,
            dims.cols,
            dims.rows
        );

        let mut dns: Vec<i64> = Vec::with_capacity(dims.cols);
        let mut radiance = vec![NODATA_SENTINEL; dims.cols];
        let mut reflectance = vec![NODATA_SENTINEL; dims.cols];
        let mut summary = ProcessingSummary::default();

        for band in 1..=dims.bands {
            let calibration = resolve_band(band, mapping, &self.irradiances)?;
            let no_data = source.no_data_value(band)?;
            log::info!(
                "Band {} ({}): absCalFactor={:e}, effectiveBandwidth={:e}, irradiance={}, NoData={:?}",
                band,
                calibration.band_name,
                calibration.abs_cal_factor,
                calibration.effective_bandwidth,
                calibration.solar_irradiance,
                no_data
            );
            let mut band_summary = BandSummary::new(
                &calibration,
                self.irradiances.supports(calibration.band_name),
            );
            if !band_summary.reflectance_supported {
                log::info!(
                    "Band {} ({}) has no solar irradiance for this satellite; reflectance set to {}",
                    band,
                    calibration.band_name,
                    NODATA_SENTINEL
                );
            }

            for row in 0..dims.rows {
                dns.clear();
                source.read_scanline(band, row, &mut dns)?;
                if dns.len() != dims.cols {
                    return Err(ToaError::RasterIo(format!(
                        "band {} row {}: expected {} samples, read {}",
                        band,
                        row,
                        dims.cols,
                        dns.len()
                    )));
                }

                transform_scanline(
                    &dns,
                    no_data,
                    &calibration,
                    &self.geometry,
                    &mut radiance,
                    &mut reflectance,
                );
                band_summary.accumulate(&dns, no_data, &radiance);

                radiance_sink.write_scanline(band, row, &radiance)?;
                reflectance_sink.write_scanline(band, row, &reflectance)?;
            }

            log::info!(
                "Band {} ({}) completed: {} valid, {} NoData. Radiance range: {:.3} to {:.3}",
                band,
                band_summary.band_name,
                band_summary.valid_pixels,
                band_summary.nodata_pixels,
                band_summary.min_radiance,
                band_summary.max_radiance
            );
            summary.bands.push(band_summary);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::irradiance::Satellite;
    use crate::core::radiometry::radiometric_transform;

    struct MemorySource {
        dims: RasterDimensions,
        no_data: Option<i64>,
        data: Vec<Vec<Vec<i64>>>, // band, row, col
    }

    impl RasterSource for MemorySource {
        fn dimensions(&self) -> RasterDimensions {
            self.dims
        }

        fn no_data_value(&self, _band: usize) -> ToaResult<Option<i64>> {
            Ok(self.no_data)
        }

        fn read_scanline(&self, band: usize, row: usize, buffer: &mut Vec<i64>) -> ToaResult<()> {
            buffer.extend_from_slice(&self.data[band - 1][row]);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Vec<(usize, usize, Vec<f32>)>,
    }

    impl RasterSink for MemorySink {
        fn write_scanline(&mut self, band: usize, row: usize, data: &[f32]) -> ToaResult<()> {
            self.rows.push((band, row, data.to_vec()));
            Ok(())
        }
    }

    fn mapping() -> RawCalibrationMapping {
        [
            ("SatelliteID", "WV03"),
            ("1__BAND_C__ABSCALFACTOR", "0.01397474"),
            ("1__BAND_C__EFFECTIVEBANDWIDTH", "0.0405"),
            ("2__BAND_B__ABSCALFACTOR", "0.01260825"),
            ("2__BAND_B__EFFECTIVEBANDWIDTH", "0.0543"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn geometry() -> SceneGeometry {
        SceneGeometry {
            earth_sun_distance: 0.99,
            solar_zenith_angle: 30.0,
        }
    }

    #[test]
    fn test_process_two_bands() {
        let source = MemorySource {
            dims: RasterDimensions { rows: 2, cols: 3, bands: 2 },
            no_data: Some(0),
            data: vec![
                vec![vec![0, 100, 200], vec![300, 400, 500]],
                vec![vec![10, 20, 30], vec![0, 0, 60]],
            ],
        };
        let processor = ToaProcessor::new(geometry(), Satellite::WV03.irradiances());
        let mut radiance = MemorySink::default();
        let mut reflectance = MemorySink::default();

        let summary = processor
            .process(&source, &mut radiance, &mut reflectance, &mapping())
            .unwrap();

        assert_eq!(radiance.rows.len(), 4);
        assert_eq!(reflectance.rows.len(), 4);
        assert_eq!(radiance.rows[0].0, 1);
        assert_eq!(radiance.rows[3].0, 2);
        assert_eq!(radiance.rows[3].1, 1);

        let band1 = resolve_band(1, &mapping(), &Satellite::WV03.irradiances()).unwrap();
        let expected = radiometric_transform(500, Some(0), &band1, &geometry());
        assert_eq!(radiance.rows[1].2[2], expected.radiance);
        assert_eq!(reflectance.rows[1].2[2], expected.reflectance);
        assert_eq!(radiance.rows[0].2[0], NODATA_SENTINEL);
        assert_eq!(reflectance.rows[3].2[..2], [NODATA_SENTINEL, NODATA_SENTINEL]);

        assert_eq!(summary.bands.len(), 2);
        assert_eq!(summary.bands[0].nodata_pixels, 1);
        assert_eq!(summary.bands[1].nodata_pixels, 2);
        assert_eq!(summary.bands[1].band_name, BandTag::BAND_B);
        assert_eq!(summary.total_pixels(), 12);
        assert_eq!(summary.bands[0].max_radiance, expected.radiance);
        assert!(summary.bands.iter().all(|b| b.reflectance_supported));
    }

    #[test]
    fn test_band_without_irradiance_has_sentinel_reflectance() {
        let source = MemorySource {
            dims: RasterDimensions { rows: 1, cols: 3, bands: 2 },
            no_data: Some(0),
            data: vec![vec![vec![100, 200, 300]], vec![vec![100, 200, 300]]],
        };
        // QuickBird-2 has no coastal band
        let processor = ToaProcessor::new(geometry(), Satellite::QB02.irradiances());
        let mut radiance = MemorySink::default();
        let mut reflectance = MemorySink::default();

        let summary = processor
            .process(&source, &mut radiance, &mut reflectance, &mapping())
            .unwrap();

        assert!(!summary.bands[0].reflectance_supported);
        assert!(summary.bands[1].reflectance_supported);
        assert_eq!(reflectance.rows[0].2, vec![NODATA_SENTINEL; 3]);
        assert!(radiance.rows[0].2.iter().all(|&v| v > 0.0));
        assert!(reflectance.rows[1].2.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_short_scanline_is_fatal() {
        let source = MemorySource {
            dims: RasterDimensions { rows: 1, cols: 3, bands: 1 },
            no_data: None,
            data: vec![vec![vec![1, 2]]],
        };
        let processor = ToaProcessor::new(geometry(), Satellite::WV03.irradiances());
        let mut radiance = MemorySink::default();
        let mut reflectance = MemorySink::default();

        let result = processor.process(&source, &mut radiance, &mut reflectance, &mapping());
        assert!(matches!(result, Err(ToaError::RasterIo(_))));
        assert!(radiance.rows.is_empty());
    }

    #[test]
    fn test_unresolvable_band_aborts_after_earlier_bands() {
        let source = MemorySource {
            dims: RasterDimensions { rows: 1, cols: 1, bands: 3 },
            no_data: None,
            data: vec![vec![vec![1]], vec![vec![2]], vec![vec![3]]],
        };
        let processor = ToaProcessor::new(geometry(), Satellite::WV03.irradiances());
        let mut radiance = MemorySink::default();
        let mut reflectance = MemorySink::default();

        let result = processor.process(&source, &mut radiance, &mut reflectance, &mapping());
        assert!(matches!(result, Err(ToaError::MetadataParse(_))));
        // bands 1 and 2 were already written
        assert_eq!(radiance.rows.len(), 2);
    }
}
