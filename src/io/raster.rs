use crate::config::ToaConfig;
use crate::core::pipeline::{RasterSink, RasterSource};
use crate::types::{GeoTransform, RasterDimensions, ToaError, ToaResult};
use gdal::raster::{Buffer, GdalDataType, GdalType, RasterBand};
use gdal::{Dataset, DriverManager};
use std::path::{Path, PathBuf};

/// Input raster (GeoTIFF, NITF, ...) opened read-only through GDAL
pub struct GdalRasterSource {
    dataset: Dataset,
    path: PathBuf,
    dims: RasterDimensions,
}

impl GdalRasterSource {
    pub fn open<P: AsRef<Path>>(path: P) -> ToaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ToaError::FileNotFound(path.to_path_buf()));
        }

        log::info!("Opening raster: {}", path.display());
        let dataset = Dataset::open(path)?;
        let (cols, rows) = dataset.raster_size();
        let bands = dataset.raster_count().max(0) as usize;
        log::debug!("Raster size: {} cols x {} rows x {} bands", cols, rows, bands);

        Ok(Self {
            dataset,
            path: path.to_path_buf(),
            dims: RasterDimensions { rows, cols, bands },
        })
    }

    /// Affine geotransform, if the raster is georeferenced
    pub fn geo_transform(&self) -> Option<GeoTransform> {
        self.dataset.geo_transform().ok().map(GeoTransform::from)
    }

    /// Projection as WKT; empty when none is set
    pub fn projection(&self) -> String {
        self.dataset.projection()
    }

    fn band(&self, band: usize) -> ToaResult<RasterBand<'_>> {
        self.dataset.rasterband(band as isize).map_err(|e| {
            ToaError::RasterIo(format!(
                "unable to access band {} of {}: {}",
                band,
                self.path.display(),
                e
            ))
        })
    }

    fn read_row_as<T>(
        &self,
        band: &RasterBand<'_>,
        band_index: usize,
        row: usize,
        buffer: &mut Vec<i64>,
    ) -> ToaResult<()>
    where
        T: GdalType + Copy + Into<i64>,
    {
        let cols = self.dims.cols;
        let data = band
            .read_as::<T>((0, row as isize), (cols, 1), (cols, 1), None)
            .map_err(|e| {
                ToaError::RasterIo(format!(
                    "unable to read band {} row {} of {}: {}",
                    band_index,
                    row,
                    self.path.display(),
                    e
                ))
            })?;
        buffer.extend(data.data.into_iter().map(Into::into));
        Ok(())
    }
}

/// NaN or infinite NoData (float rasters) cannot match an integer DN
fn nodata_as_dn(no_data: Option<f64>) -> Option<i64> {
    no_data.filter(|v| v.is_finite()).map(|v| v as i64)
}

impl RasterSource for GdalRasterSource {
    fn dimensions(&self) -> RasterDimensions {
        self.dims
    }

    fn no_data_value(&self, band: usize) -> ToaResult<Option<i64>> {
        Ok(nodata_as_dn(self.band(band)?.no_data_value()))
    }

    fn read_scanline(&self, band: usize, row: usize, buffer: &mut Vec<i64>) -> ToaResult<()> {
        let raster_band = self.band(band)?;
        match raster_band.band_type() {
            GdalDataType::UInt8 => self.read_row_as::<u8>(&raster_band, band, row, buffer),
            GdalDataType::UInt16 => self.read_row_as::<u16>(&raster_band, band, row, buffer),
            GdalDataType::Int16 => self.read_row_as::<i16>(&raster_band, band, row, buffer),
            GdalDataType::UInt32 => self.read_row_as::<u32>(&raster_band, band, row, buffer),
            // GDAL converts anything wider or non-integer on read
            _ => self.read_row_as::<i32>(&raster_band, band, row, buffer),
        }
    }
}

/// Float32 output raster created through a GDAL driver
pub struct GdalRasterSink {
    dataset: Dataset,
    path: PathBuf,
    cols: usize,
}

impl GdalRasterSink {
    /// Create the output, removing any existing file at `path` first
    pub fn create<P: AsRef<Path>>(
        path: P,
        dims: RasterDimensions,
        geo_transform: Option<&GeoTransform>,
        projection: &str,
        driver_name: &str,
        overwrite_existing: bool,
    ) -> ToaResult<Self> {
        let path = path.as_ref();
        remove_existing_output(path, overwrite_existing)?;

        log::info!("Creating {} output: {}", driver_name, path.display());
        let driver = DriverManager::get_driver_by_name(driver_name)?;
        let mut dataset = driver.create_with_band_type::<f32, _>(
            path,
            dims.cols as isize,
            dims.rows as isize,
            dims.bands as isize,
        )?;

        if let Some(gt) = geo_transform {
            let coefficients: [f64; 6] = (*gt).into();
            dataset.set_geo_transform(&coefficients)?;
        }
        if !projection.is_empty() {
            dataset.set_projection(projection)?;
        }

        Ok(Self {
            dataset,
            path: path.to_path_buf(),
            cols: dims.cols,
        })
    }
}

impl RasterSink for GdalRasterSink {
    fn write_scanline(&mut self, band: usize, row: usize, data: &[f32]) -> ToaResult<()> {
        if data.len() != self.cols {
            return Err(ToaError::RasterIo(format!(
                "scanline for {} has {} samples, expected {}",
                self.path.display(),
                data.len(),
                self.cols
            )));
        }

        let mut raster_band = self.dataset.rasterband(band as isize)?;
        let buffer = Buffer::new((self.cols, 1), data.to_vec());
        raster_band
            .write((0, row as isize), (self.cols, 1), &buffer)
            .map_err(|e| {
                ToaError::RasterIo(format!(
                    "unable to write scanline {} of band {} into {}: {}",
                    row,
                    band,
                    self.path.display(),
                    e
                ))
            })
    }
}

/// Delete a pre-existing output so it can be recreated
pub fn remove_existing_output(path: &Path, overwrite_existing: bool) -> ToaResult<()> {
    if !path.exists() {
        return Ok(());
    }
    if !overwrite_existing {
        return Err(ToaError::OutputCollision {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "output exists and overwriting is disabled",
            ),
        });
    }

    log::info!("Removing existing output: {}", path.display());
    std::fs::remove_file(path).map_err(|source| ToaError::OutputCollision {
        path: path.to_path_buf(),
        source,
    })
}

/// Radiance and reflectance output paths: the input with its 4-character
/// extension replaced by the configured suffixes
pub fn output_paths<P: AsRef<Path>>(input: P, config: &ToaConfig) -> (PathBuf, PathBuf) {
    let input = input.as_ref().to_string_lossy();
    let keep = input.chars().count().saturating_sub(4);
    let stem: String = input.chars().take(keep).collect();

    (
        PathBuf::from(format!("{}{}", stem, config.radiance_suffix)),
        PathBuf::from(format!("{}{}", stem, config.reflectance_suffix)),
    )
}
