use crate::types::{ToaError, ToaResult};
use serde::{Deserialize, Serialize};

/// Which Earth-Sun distance formula to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EarthSunDistanceModel {
    /// Reproduces the reference tool's numbers: month/60 in the UTC term and the
    /// mean anomaly fed to `cos()` in degrees
    #[default]
    Reference,
    /// Minutes/60 in the UTC term and the mean anomaly converted to radians
    Corrected,
}

/// Configuration for a TOA conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToaConfig {
    pub earth_sun_model: EarthSunDistanceModel,
    pub output_driver: String,       // GDAL driver for both outputs
    pub radiance_suffix: String,     // appended to the input stem
    pub reflectance_suffix: String,
    pub overwrite_existing: bool,    // delete pre-existing outputs without asking
}

impl Default for ToaConfig {
    fn default() -> Self {
        Self {
            earth_sun_model: EarthSunDistanceModel::Reference,
            output_driver: "GTiff".to_string(),
            radiance_suffix: "_TOA_RADIANCES.TIF".to_string(),
            reflectance_suffix: "_TOA_REFLECTANCES.TIF".to_string(),
            overwrite_existing: true,
        }
    }
}

impl ToaConfig {
    pub fn validate(&self) -> ToaResult<()> {
        if self.output_driver.trim().is_empty() {
            return Err(ToaError::Config("output driver name is empty".to_string()));
        }
        if self.radiance_suffix.is_empty() || self.reflectance_suffix.is_empty() {
            return Err(ToaError::Config("output suffixes must not be empty".to_string()));
        }
        if self.radiance_suffix == self.reflectance_suffix {
            return Err(ToaError::Config(format!(
                "radiance and reflectance outputs would share the suffix {}",
                self.radiance_suffix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ToaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.earth_sun_model, EarthSunDistanceModel::Reference);
        assert!(config.overwrite_existing);
    }

    #[test]
    fn test_invalid_configs() {
        let config = ToaConfig {
            output_driver: "  ".to_string(),
            ..ToaConfig::default()
        };
        assert!(matches!(config.validate(), Err(ToaError::Config(_))));

        let config = ToaConfig {
            reflectance_suffix: "_TOA_RADIANCES.TIF".to_string(),
            ..ToaConfig::default()
        };
        assert!(matches!(config.validate(), Err(ToaError::Config(_))));
    }
}
