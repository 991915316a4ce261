//! User-facing gridding parameters and post-processing switches

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Upper bound for cell size and blanking distance, in metres
pub const MAX_DISTANCE_M: f64 = 100.0;

/// Interpolation strategy for turning samples into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Tensioned lattice spline; best for dense data and small cells
    #[default]
    Splines,
    /// Inverse distance weighting; avoids ringing on sparse data
    Idw,
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Splines => write!(f, "splines"),
            Self::Idw => write!(f, "idw"),
        }
    }
}

impl FromStr for InterpolationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "splines" | "spline" => Ok(Self::Splines),
            "idw" => Ok(Self::Idw),
            _ => Err(Error::InvalidParameter {
                name: "method",
                value: s.to_string(),
                reason: "expected 'splines' or 'idw'".into(),
            }),
        }
    }
}

/// Validated gridding parameters.
///
/// Both distances are in metres and lie in `(0, 100]`; construction is the
/// only place that check happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GriddingParams {
    cell_size: f64,
    blanking_distance: f64,
    method: InterpolationMethod,
}

impl GriddingParams {
    pub fn new(cell_size: f64, blanking_distance: f64, method: InterpolationMethod) -> Result<Self> {
        check_distance("cell_size", cell_size)?;
        check_distance("blanking_distance", blanking_distance)?;
        Ok(Self {
            cell_size,
            blanking_distance,
            method,
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn blanking_distance(&self) -> f64 {
        self.blanking_distance
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    pub fn with_method(self, method: InterpolationMethod) -> Self {
        Self { method, ..self }
    }
}

impl<'de> Deserialize<'de> for GriddingParams {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            cell_size: f64,
            blanking_distance: f64,
            #[serde(default)]
            method: InterpolationMethod,
        }

        let raw = Raw::deserialize(deserializer)?;
        GriddingParams::new(raw.cell_size, raw.blanking_distance, raw.method)
            .map_err(serde::de::Error::custom)
    }
}

fn check_distance(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value <= MAX_DISTANCE_M {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: format!("must be in (0, {MAX_DISTANCE_M}]"),
        })
    }
}

/// Independent post-processing switches applied when rendering a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessingFlags {
    pub analytic_signal: bool,
    pub hill_shading: bool,
    pub smoothing: bool,
}

impl PostProcessingFlags {
    pub fn new(analytic_signal: bool, hill_shading: bool, smoothing: bool) -> Self {
        Self {
            analytic_signal,
            hill_shading,
            smoothing,
        }
    }

    /// Whether two flag sets produce different rendered values.
    /// Hill-shading only modulates colour.
    pub fn values_differ(&self, other: &Self) -> bool {
        self.analytic_signal != other.analytic_signal || self.smoothing != other.smoothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params() {
        let p = GriddingParams::new(10.0, 100.0, InterpolationMethod::Idw).unwrap();
        assert_eq!(p.cell_size(), 10.0);
        assert_eq!(p.blanking_distance(), 100.0);
        assert_eq!(p.method(), InterpolationMethod::Idw);
    }

    #[test]
    fn test_params_bounds() {
        for bad in [0.0, -1.0, 100.0001, f64::NAN, f64::INFINITY] {
            assert!(
                GriddingParams::new(bad, 10.0, InterpolationMethod::Splines).is_err(),
                "cell size {} accepted",
                bad
            );
            assert!(
                GriddingParams::new(10.0, bad, InterpolationMethod::Splines).is_err(),
                "blanking distance {} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GriddingParams =
            serde_json::from_str(r#"{"cell_size": 5.0, "blanking_distance": 20.0, "method": "idw"}"#)
                .unwrap();
        assert_eq!(ok.method(), InterpolationMethod::Idw);
        let bad = serde_json::from_str::<GriddingParams>(r#"{"cell_size": 500.0, "blanking_distance": 20.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("IDW".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Idw);
        assert_eq!("splines".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Splines);
        assert!("kriging".parse::<InterpolationMethod>().is_err());
    }

    #[test]
    fn test_flags_value_difference() {
        let base = PostProcessingFlags::default();
        assert!(!base.values_differ(&PostProcessingFlags::new(false, true, false)));
        assert!(base.values_differ(&PostProcessingFlags::new(false, false, true)));
        assert!(base.values_differ(&PostProcessingFlags::new(true, false, false)));
    }
}
