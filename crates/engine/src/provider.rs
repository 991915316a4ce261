//! Sources of sample series.
//!
//! The engine never inspects concrete file types. Anything that can list its
//! series and hand out sample points for one of them can be gridded.

use std::collections::BTreeSet;

use surveygrid_core::{FileKey, SamplePoint, SurveyFile};

/// A file-like source of named sample series.
pub trait SeriesProvider: Send + Sync {
    /// Identity used as the cache key
    fn file_key(&self) -> FileKey;

    /// Template name shared by files with the same column layout
    fn template(&self) -> Option<&str>;

    fn series_names(&self) -> BTreeSet<String>;

    /// Samples of `series`, or `None` if the series does not exist.
    /// Samples without a position are skipped; missing values are NaN.
    fn samples(&self, series: &str) -> Option<Vec<SamplePoint>>;
}

impl SeriesProvider for SurveyFile {
    fn file_key(&self) -> FileKey {
        self.key()
    }

    fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    fn series_names(&self) -> BTreeSet<String> {
        SurveyFile::series_names(self)
    }

    fn samples(&self, series: &str) -> Option<Vec<SamplePoint>> {
        SurveyFile::samples(self, series)
    }
}

/// Template grouping key: files without a template form their own group.
pub(crate) fn template_of(provider: &dyn SeriesProvider) -> String {
    provider
        .template()
        .map(str::to_string)
        .unwrap_or_else(|| provider.file_key().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveygrid_core::{GeoRecord, LatLon, SurveyLine};

    fn file(template: Option<&str>) -> SurveyFile {
        let records = vec![
            GeoRecord::new(Some(LatLon::new(1.0, 2.0))).with_value("mag", 5.0),
            GeoRecord::new(None).with_value("mag", 6.0),
        ];
        SurveyFile::new(
            "a.json",
            template.map(str::to_string),
            vec![SurveyLine { line: 0, records }],
        )
    }

    #[test]
    fn test_survey_file_provider() {
        let f = file(Some("mag-survey"));
        let p: &dyn SeriesProvider = &f;
        assert_eq!(p.file_key(), FileKey::new("a.json"));
        assert_eq!(p.template(), Some("mag-survey"));
        assert!(p.series_names().contains("mag"));
        assert_eq!(p.samples("mag").unwrap().len(), 1);
        assert!(p.samples("gamma").is_none());
    }

    #[test]
    fn test_template_fallback() {
        assert_eq!(template_of(&file(Some("t"))), "t");
        assert_eq!(template_of(&file(None)), "a.json");
    }
}
