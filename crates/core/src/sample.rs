//! Geotagged survey readings: sample points, records, lines and files

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::{GeoBounds, LatLon};

/// A single scalar reading at a position. `value` may be NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl SamplePoint {
    pub const fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
        }
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_nan()
    }
}

/// Identity of an open survey file; changes when the file is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileKey(PathBuf);

impl FileKey {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for FileKey {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for FileKey {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

/// One row of a survey file: an optional position and named readings.
///
/// A `null` reading deserializes as `None` and is read back as NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(default)]
    pub position: Option<LatLon>,
    /// Seconds since the Unix epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl GeoRecord {
    pub fn new(position: Option<LatLon>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, series: impl Into<String>, value: f64) -> Self {
        self.values
            .insert(series.into(), (!value.is_nan()).then_some(value));
        self
    }

    /// Reading for `series`: `None` if the record has no such column, NaN if it is empty.
    pub fn value(&self, series: &str) -> Option<f64> {
        self.values.get(series).map(|v| v.unwrap_or(f64::NAN))
    }
}

/// Records collected along one survey line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyLine {
    #[serde(default)]
    pub line: u32,
    pub records: Vec<GeoRecord>,
}

/// A parsed survey data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyFile {
    #[serde(skip)]
    path: PathBuf,
    /// Column template shared by files of the same kind
    #[serde(default)]
    pub template: Option<String>,
    pub lines: Vec<SurveyLine>,
}

impl SurveyFile {
    pub fn new(path: impl Into<PathBuf>, template: Option<String>, lines: Vec<SurveyLine>) -> Self {
        Self {
            path: path.into(),
            template,
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    pub fn key(&self) -> FileKey {
        FileKey::new(self.path.clone())
    }

    pub fn records(&self) -> impl Iterator<Item = &GeoRecord> {
        self.lines.iter().flat_map(|l| l.records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.lines.iter().map(|l| l.records.len()).sum()
    }

    /// Every series name appearing in any record
    pub fn series_names(&self) -> BTreeSet<String> {
        self.records()
            .flat_map(|r| r.values.keys().cloned())
            .collect()
    }

    pub fn has_series(&self, series: &str) -> bool {
        self.records().any(|r| r.values.contains_key(series))
    }

    /// Sample points for `series`, skipping records without a position.
    ///
    /// Returns `None` when no record carries the series. Records lacking the
    /// column while others have it contribute a NaN reading.
    pub fn samples(&self, series: &str) -> Option<Vec<SamplePoint>> {
        if !self.has_series(series) {
            return None;
        }
        Some(
            self.records()
                .filter_map(|r| {
                    let p = r.position.filter(LatLon::is_finite)?;
                    let v = r.value(series).unwrap_or(f64::NAN);
                    Some(SamplePoint::new(p.latitude, p.longitude, v))
                })
                .collect(),
        )
    }

    /// Bounds of all positioned records
    pub fn bounds(&self) -> Option<GeoBounds> {
        let positions: Vec<LatLon> = self
            .records()
            .filter_map(|r| r.position.filter(LatLon::is_finite))
            .collect();
        GeoBounds::from_positions(&positions)
    }

    /// Store a derived series, one value per record in file order.
    pub fn insert_series(&mut self, series: &str, values: &[f64]) -> Result<()> {
        let count = self.record_count();
        if values.len() != count {
            return Err(Error::InvalidParameter {
                name: "values",
                value: values.len().to_string(),
                reason: format!("expected one value per record ({count})"),
            });
        }
        let records = self.lines.iter_mut().flat_map(|l| l.records.iter_mut());
        for (record, &v) in records.zip(values) {
            record
                .values
                .insert(series.to_string(), (!v.is_nan()).then_some(v));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> SurveyFile {
        let line = SurveyLine {
            line: 10,
            records: vec![
                GeoRecord::new(Some(LatLon::new(1.0, 2.0))).with_value("mag", 5.0),
                GeoRecord::new(None).with_value("mag", 6.0),
                GeoRecord::new(Some(LatLon::new(1.5, 2.5))).with_value("mag", f64::NAN),
                GeoRecord::new(Some(LatLon::new(2.0, 3.0))).with_value("alt", 100.0),
            ],
        };
        SurveyFile::new("a.json", Some("mag-template".into()), vec![line])
    }

    #[test]
    fn test_samples_skip_missing_positions() {
        let samples = file().samples("mag").unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], SamplePoint::new(1.0, 2.0, 5.0));
        assert!(samples[1].value.is_nan());
        // record without the column
        assert!(samples[2].value.is_nan());
    }

    #[test]
    fn test_missing_series() {
        assert!(file().samples("gamma").is_none());
        assert!(!file().has_series("gamma"));
    }

    #[test]
    fn test_series_names_and_bounds() {
        let f = file();
        let names: Vec<_> = f.series_names().into_iter().collect();
        assert_eq!(names, vec!["alt".to_string(), "mag".to_string()]);
        let b = f.bounds().unwrap();
        assert_eq!(b.min, LatLon::new(1.0, 2.0));
        assert_eq!(b.max, LatLon::new(2.0, 3.0));
    }

    #[test]
    fn test_insert_series() {
        let mut f = file();
        f.insert_series("mag_LPF", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let samples = f.samples("mag_LPF").unwrap();
        assert_eq!(samples.iter().map(|s| s.value).collect::<Vec<_>>(), vec![1.0, 3.0, 4.0]);
        assert!(f.insert_series("bad", &[1.0]).is_err());
    }

    #[test]
    fn test_deserialize_null_reading() {
        let json = r#"{
            "template": "t",
            "lines": [{"line": 1, "records": [
                {"position": {"lat": 1.0, "lon": 2.0}, "values": {"mag": null}}
            ]}]
        }"#;
        let f: SurveyFile = serde_json::from_str(json).unwrap();
        assert!(f.samples("mag").unwrap()[0].value.is_nan());
        assert_eq!(f.template.as_deref(), Some("t"));
    }
}
