//! Engine configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! worker_threads = 4
//! auto_resubmit_suffix = "_LPF"
//!
//! [interpolation.idw]
//! power = 3.0
//!
//! [hillshade]
//! intensity = 0.7
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use surveygrid_algorithms::interpolation::InterpolationSettings;
use surveygrid_algorithms::postprocess::{AnalyticSignalParams, HillshadeParams, SmoothingParams};
use surveygrid_colormap::{PaletteType, Spectrum, DEFAULT_NUM_BARS};
use surveygrid_core::{Error, Result};

/// Settings shared by the gridding service, the coordinator and renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads for gridding jobs; 0 lets rayon pick
    pub worker_threads: usize,
    /// Bars in legend histograms
    pub histogram_bars: usize,
    /// Filtered series whose name ends with this are regridded without an
    /// explicit apply
    pub auto_resubmit_suffix: String,
    pub palette: PaletteType,
    pub spectrum: Spectrum,
    pub interpolation: InterpolationSettings,
    pub smoothing: SmoothingParams,
    pub hillshade: HillshadeParams,
    pub analytic_signal: AnalyticSignalParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            histogram_bars: DEFAULT_NUM_BARS,
            auto_resubmit_suffix: "_LPF".to_string(),
            palette: PaletteType::default(),
            spectrum: Spectrum::default(),
            interpolation: InterpolationSettings::default(),
            smoothing: SmoothingParams::default(),
            hillshade: HillshadeParams::default(),
            analytic_signal: AnalyticSignalParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.histogram_bars == 0 {
            return Err(Error::Config("histogram_bars must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.hillshade.intensity) {
            return Err(Error::Config(format!(
                "hillshade.intensity must be in [0, 1], got {}",
                self.hillshade.intensity
            )));
        }
        if !(0.0..0.5).contains(&self.analytic_signal.percentile) {
            return Err(Error::Config(format!(
                "analytic_signal.percentile must be in [0, 0.5), got {}",
                self.analytic_signal.percentile
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.histogram_bars, 128);
        assert_eq!(c.auto_resubmit_suffix, "_LPF");
        assert_eq!(c.smoothing.radius, 7);
        assert_eq!(c.hillshade.azimuth, 180.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let c = EngineConfig::from_toml_str(
            r#"
            worker_threads = 2
            spectrum = "rainbow"
            palette = "quantile"

            [interpolation.idw]
            power = 3.0

            [hillshade]
            intensity = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(c.worker_threads, 2);
        assert_eq!(c.spectrum, Spectrum::Rainbow);
        assert_eq!(c.palette, PaletteType::Quantile);
        assert_eq!(c.interpolation.idw.power, 3.0);
        assert_eq!(c.interpolation.idw.min_points, 4);
        assert_eq!(c.hillshade.intensity, 0.25);
        assert_eq!(c.hillshade.altitude, 45.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EngineConfig::from_toml_str("histogram_bars = 0").is_err());
        assert!(EngineConfig::from_toml_str("[hillshade]\nintensity = 2.0").is_err());
        assert!(EngineConfig::from_toml_str("worker_threads = \"many\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let c = EngineConfig::default();
        let text = c.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), c);
    }
}
