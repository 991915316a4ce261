//! Recompute coordination for open files.
//!
//! The coordinator owns the file registry, the [`ResultCache`] and the
//! per-(template, series) display filters. Gridding runs on a rayon pool;
//! workers report back over a channel and their results are merged by
//! [`RecomputeCoordinator::pump`] on the owner's thread, so all cache writes
//! happen in one place. Post-processing for display happens on the owner's
//! thread too and never waits for a gridding worker.
//!
//! Per-file states:
//!
//! ```text
//! NoResult -> Recomputing -> Fresh <-> StaleParams -> Recomputing -> Fresh ...
//! ```
//!
//! While recomputing, the previous result stays in the cache and visible.
//! When several jobs for one file overlap, the last one to complete wins.
//! Results for a file that was closed or renamed in the meantime are
//! dropped on merge.

use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use surveygrid_core::{Error, FileKey, GriddingParams, Range, Result};

use crate::cache::{CacheOp, ResultCache};
use crate::config::EngineConfig;
use crate::events::{
    classify, ChangeSource, DataChange, EngineEvent, ParameterChange, Reaction, RedrawScheduler,
    ViewEvent,
};
use crate::provider::{template_of, SeriesProvider};
use crate::result::{GriddingFilter, GriddingResult, RenderedGrid};
use crate::service::GriddingService;

/// Lifecycle of one open file's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Never gridded
    NoResult,
    /// At least one job outstanding
    Recomputing,
    /// Cached result matches the current inputs
    Fresh,
    /// Cached result was made from different inputs than the current ones
    StaleParams,
}

/// Handle to one submitted gridding job.
#[derive(Debug)]
pub struct JobHandle {
    file: FileKey,
    rx: Receiver<Result<Arc<GriddingResult>>>,
}

impl JobHandle {
    pub fn file(&self) -> &FileKey {
        &self.file
    }

    /// Whether the worker has finished. The result may not be merged into
    /// the cache yet; that happens on the next [`RecomputeCoordinator::pump`].
    pub fn is_finished(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> Result<Arc<GriddingResult>> {
        self.rx.recv().map_err(|_| Error::WorkerDisconnected)?
    }
}

/// Worker-to-coordinator report
enum WorkerMessage {
    Finished {
        key: FileKey,
        generation: u64,
        outcome: std::result::Result<Arc<GriddingResult>, String>,
        elapsed: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TemplateSeriesKey {
    template: String,
    series: String,
}

struct OpenFile {
    provider: Arc<dyn SeriesProvider>,
    template: String,
    series: Option<String>,
    /// Changes on open and rename; results from older generations are dropped
    generation: u64,
    state: FileState,
    pending: usize,
}

pub struct RecomputeCoordinator {
    config: EngineConfig,
    service: Arc<GriddingService>,
    pool: rayon::ThreadPool,
    files: BTreeMap<FileKey, OpenFile>,
    selected: Option<FileKey>,
    params: Option<GriddingParams>,
    cache: ResultCache,
    filters: HashMap<TemplateSeriesKey, GriddingFilter>,
    rendered: HashMap<FileKey, Arc<RenderedGrid>>,
    next_generation: u64,
    worker_tx: Sender<WorkerMessage>,
    worker_rx: Receiver<WorkerMessage>,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
    redraw: RedrawScheduler,
}

impl RecomputeCoordinator {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("surveygrid-worker-{i}"))
            .build()
            .map_err(|e| Error::Other(format!("failed to build worker pool: {e}")))?;
        let (worker_tx, worker_rx) = crossbeam_channel::unbounded();
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let redraw = RedrawScheduler::new(events_tx.clone());

        info!(workers = pool.current_num_threads(), "recompute coordinator started");
        Ok(Self {
            service: Arc::new(GriddingService::new(&config)),
            config,
            pool,
            files: BTreeMap::new(),
            selected: None,
            params: None,
            cache: ResultCache::new(),
            filters: HashMap::new(),
            rendered: HashMap::new(),
            next_generation: 0,
            worker_tx,
            worker_rx,
            events_tx,
            events_rx,
            redraw,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Output events. Receivers are clones of one queue, so each event is
    /// delivered to a single receiver.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events_rx.clone()
    }

    pub fn redraw_scheduler(&self) -> RedrawScheduler {
        self.redraw.clone()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    // ─── Event handling ────────────────────────────────────────────────

    /// Apply a view event and report how it was classified.
    pub fn handle(&mut self, event: ViewEvent) -> Result<Reaction> {
        let reaction = classify(&event, &self.config.auto_resubmit_suffix);
        debug!(?event, ?reaction, "view event");

        match event {
            ViewEvent::FileOpened(provider) => {
                self.open_file(provider);
            }
            ViewEvent::FileSelected(key) => self.select_file(key)?,
            ViewEvent::FileClosed(key) => {
                self.close_file(&key);
            }
            ViewEvent::FileRenamed { file, old } => self.rename_file(file, &old)?,
            ViewEvent::SeriesSelected { file, series } => self.select_series(&file, series)?,
            ViewEvent::ParametersChanged(change) => self.on_parameters_changed(change)?,
            ViewEvent::DataChanged(change) => self.on_data_changed(change, reaction)?,
        }

        if reaction == Reaction::RedrawOnly {
            self.redraw.request();
        }
        Ok(reaction)
    }

    fn on_parameters_changed(&mut self, change: ParameterChange) -> Result<()> {
        if let Some(range) = change.range {
            check_range(range)?;
        }
        let target = self.selected.clone().and_then(|key| {
            let series = self.selected_series(&key)?.to_string();
            Some((key, series))
        });

        // Display settings of an edit stick even while a distance field
        // holds an invalid value.
        if change.source == ChangeSource::Edit {
            if let Some((key, series)) = &target {
                self.store_display_settings(key, series, &change)?;
            }
        }

        let params = GriddingParams::new(change.cell_size, change.blanking_distance, change.method)?;
        self.params = Some(params);

        let Some((selected, series)) = target else {
            match &self.selected {
                Some(key) if change.source == ChangeSource::Apply => {
                    warn!(file = %key, "apply without a selected series")
                }
                Some(_) => {}
                None => debug!("parameters changed with no file selected"),
            }
            return Ok(());
        };

        match change.source {
            ChangeSource::Apply => {
                self.store_display_settings(&selected, &series, &change)?;
                let targets = if change.apply_to_all {
                    self.files_sharing_template(&selected)
                } else {
                    vec![selected]
                };
                self.run_gridding(&targets, &series, params, change.range)?;
            }
            ChangeSource::Edit => {
                let differs = self
                    .cache
                    .get(&selected)
                    .is_some_and(|r| !r.matches(&series, &params));
                if differs {
                    self.mark_stale(&selected);
                }
            }
        }
        Ok(())
    }

    fn on_data_changed(&mut self, change: DataChange, reaction: Reaction) -> Result<()> {
        match change {
            DataChange::Zoom | DataChange::Pan | DataChange::Resize => Ok(()),
            DataChange::RangeChanged(range) => {
                check_range(range)?;
                let Some(selected) = self.selected.clone() else {
                    return Ok(());
                };
                let Some(series) = self.selected_series(&selected).map(str::to_string) else {
                    return Ok(());
                };
                let filter = GriddingFilter {
                    range: Some(range),
                    ..self.filter(&selected, &series)
                };
                self.set_filter(&selected, &series, filter)
            }
            DataChange::SeriesValuesFiltered { source, series } => {
                let key = source.file_key();
                let Some(file) = self.files.get_mut(&key) else {
                    debug!(file = %key, "values changed for a file that is not open");
                    return Ok(());
                };
                file.provider = source;

                let Some(result) = self.cache.get(&key).filter(|r| r.series_name() == series)
                else {
                    return Ok(());
                };
                if reaction == Reaction::Recompute {
                    info!(file = %key, series = %series, "resubmitting filtered series");
                    self.run_gridding(&[key], &series, *result.params(), None)?;
                } else {
                    self.mark_stale(&key);
                }
                Ok(())
            }
        }
    }

    // ─── Files ─────────────────────────────────────────────────────────

    /// Register an open file. Opening a key that is already open replaces
    /// its data source.
    pub fn open_file(&mut self, provider: Arc<dyn SeriesProvider>) -> FileKey {
        let key = provider.file_key();
        let template = template_of(provider.as_ref());
        if let Some(file) = self.files.get_mut(&key) {
            debug!(file = %key, "file reopened");
            file.provider = provider;
            file.template = template;
            return key;
        }

        let generation = self.bump_generation();
        info!(file = %key, template = %template, "file opened");
        self.files.insert(
            key.clone(),
            OpenFile {
                provider,
                template,
                series: None,
                generation,
                state: FileState::NoResult,
                pending: 0,
            },
        );
        key
    }

    /// Forget a file and its result. Closing the last open file clears the
    /// whole cache. Returns whether the file was open.
    pub fn close_file(&mut self, key: &FileKey) -> bool {
        if self.files.remove(key).is_none() {
            return false;
        }
        info!(file = %key, "file closed");

        self.cache.apply(CacheOp::Evict(key.clone()));
        self.rendered.remove(key);
        if self.selected.as_ref() == Some(key) {
            self.selected = None;
        }
        if self.files.is_empty() {
            self.cache.clear();
            self.rendered.clear();
        }

        let _ = self.events_tx.send(EngineEvent::GridUpdated {
            file: key.clone(),
            grid: None,
        });
        self.redraw.request();
        true
    }

    /// Move a file from `old` to the key of `file`. The cached result moves
    /// with it unchanged; jobs still running for the old key are dropped and
    /// the file is left stale. Renaming onto another open file is an error.
    pub fn rename_file(&mut self, file: Arc<dyn SeriesProvider>, old: &FileKey) -> Result<()> {
        if !self.files.contains_key(old) {
            return Err(Error::UnknownFile(old.path().to_path_buf()));
        }
        let new_key = file.file_key();
        if &new_key != old && self.files.contains_key(&new_key) {
            return Err(Error::FileAlreadyOpen(new_key.path().to_path_buf()));
        }
        let mut entry = self
            .files
            .remove(old)
            .ok_or_else(|| Error::UnknownFile(old.path().to_path_buf()))?;
        info!(from = %old, to = %new_key, "file renamed");

        entry.template = template_of(file.as_ref());
        entry.provider = file;
        entry.generation = self.bump_generation();
        entry.pending = 0;
        if entry.state == FileState::Recomputing {
            entry.state = if self.cache.contains(old) {
                FileState::StaleParams
            } else {
                FileState::NoResult
            };
        }
        self.files.insert(new_key.clone(), entry);

        self.cache.apply(CacheOp::Rename {
            from: old.clone(),
            to: new_key.clone(),
        });
        self.rendered.remove(old);
        if self.selected.as_ref() == Some(old) {
            self.selected = Some(new_key.clone());
        }

        let _ = self.events_tx.send(EngineEvent::GridUpdated {
            file: old.clone(),
            grid: None,
        });
        if self.cache.contains(&new_key) {
            self.refresh_rendered(&new_key);
        }
        self.redraw.request();
        Ok(())
    }

    /// Make `key` the file drawn on top. Nothing is recomputed.
    pub fn select_file(&mut self, key: FileKey) -> Result<()> {
        if !self.files.contains_key(&key) {
            return Err(Error::UnknownFile(key.path().to_path_buf()));
        }
        self.selected = Some(key);
        self.redraw.request();
        Ok(())
    }

    pub fn selected_file(&self) -> Option<&FileKey> {
        self.selected.as_ref()
    }

    /// Choose the series to grid for `key`. A fresh result for another
    /// series becomes stale.
    pub fn select_series(&mut self, key: &FileKey, series: String) -> Result<()> {
        let file = self
            .files
            .get_mut(key)
            .ok_or_else(|| Error::UnknownFile(key.path().to_path_buf()))?;
        file.series = Some(series.clone());

        let differs = self
            .cache
            .get(key)
            .is_some_and(|r| r.series_name() != series);
        if differs {
            self.mark_stale(key);
        }
        Ok(())
    }

    pub fn selected_series(&self, key: &FileKey) -> Option<&str> {
        self.files.get(key).and_then(|f| f.series.as_deref())
    }

    pub fn open_files(&self) -> impl Iterator<Item = &FileKey> {
        self.files.keys()
    }

    pub fn file_state(&self, key: &FileKey) -> Option<FileState> {
        self.files.get(key).map(|f| f.state)
    }

    /// Whether a job for `key` is still outstanding
    pub fn is_pending(&self, key: &FileKey) -> bool {
        self.files.get(key).is_some_and(|f| f.pending > 0)
    }

    /// Outstanding jobs over all open files
    pub fn pending_jobs(&self) -> usize {
        self.files.values().map(|f| f.pending).sum()
    }

    /// Parameters from the last parameter change, if any
    pub fn current_params(&self) -> Option<&GriddingParams> {
        self.params.as_ref()
    }

    // ─── Results ───────────────────────────────────────────────────────

    pub fn get_result(&self, key: &FileKey) -> Option<Arc<GriddingResult>> {
        self.cache.get(key)
    }

    /// Post-processed grid of the selected file.
    pub fn current_grid(&mut self) -> Result<Option<Arc<RenderedGrid>>> {
        match self.selected.clone() {
            Some(key) => self.rendered_grid(&key),
            None => Ok(None),
        }
    }

    /// Post-processed grid of `key`, memoised until its result or filter
    /// changes.
    pub fn rendered_grid(&mut self, key: &FileKey) -> Result<Option<Arc<RenderedGrid>>> {
        let Some(result) = self.cache.get(key) else {
            return Ok(None);
        };
        let filter = self.filter(key, result.series_name());
        let previous = self.rendered.get(key).cloned();
        if let Some(memo) = &previous {
            if memo.is_current(&result, &filter) {
                return Ok(previous);
            }
        }

        // Runs on the caller's thread; the worker pool may be busy gridding.
        let grid = Arc::new(RenderedGrid::build(
            &result,
            filter,
            &self.config,
            previous.as_deref(),
        )?);
        self.rendered.insert(key.clone(), Arc::clone(&grid));
        Ok(Some(grid))
    }

    /// Display filter for a file's series; defaults come from the config.
    pub fn filter(&self, key: &FileKey, series: &str) -> GriddingFilter {
        self.files
            .get(key)
            .and_then(|f| {
                self.filters.get(&TemplateSeriesKey {
                    template: f.template.clone(),
                    series: series.to_string(),
                })
            })
            .copied()
            .unwrap_or_else(|| {
                GriddingFilter::new(Default::default(), None)
                    .with_palette(self.config.palette, self.config.spectrum)
            })
    }

    /// Store display settings for the file's (template, series) without
    /// recomputing. Every open file of that template showing `series` is
    /// re-rendered.
    pub fn set_filter(&mut self, key: &FileKey, series: &str, filter: GriddingFilter) -> Result<()> {
        let template = self
            .files
            .get(key)
            .map(|f| f.template.clone())
            .ok_or_else(|| Error::UnknownFile(key.path().to_path_buf()))?;
        self.filters.insert(
            TemplateSeriesKey {
                template: template.clone(),
                series: series.to_string(),
            },
            filter,
        );

        let affected: Vec<FileKey> = self
            .files
            .iter()
            .filter(|(k, f)| {
                f.template == template
                    && self.cache.get(k).is_some_and(|r| r.series_name() == series)
            })
            .map(|(k, _)| k.clone())
            .collect();
        for k in &affected {
            self.refresh_rendered(k);
        }
        self.redraw.request();
        Ok(())
    }

    // ─── Gridding ──────────────────────────────────────────────────────

    /// Submit one gridding job per file. Returns immediately with a handle
    /// per file; results are merged by [`pump`](Self::pump).
    ///
    /// Every key must be open. A job that fails is logged and leaves the
    /// other jobs of the batch untouched.
    pub fn run_gridding(
        &mut self,
        files: &[FileKey],
        series: &str,
        params: GriddingParams,
        range_override: Option<Range>,
    ) -> Result<Vec<JobHandle>> {
        if let Some(unknown) = files.iter().find(|k| !self.files.contains_key(k)) {
            return Err(Error::UnknownFile(unknown.path().to_path_buf()));
        }
        info!(
            files = files.len(),
            series,
            cell_size = params.cell_size(),
            blanking_distance = params.blanking_distance(),
            method = %params.method(),
            "submitting gridding"
        );
        files
            .iter()
            .map(|key| self.submit(key, series, params, range_override))
            .collect()
    }

    fn submit(
        &mut self,
        key: &FileKey,
        series: &str,
        params: GriddingParams,
        range_override: Option<Range>,
    ) -> Result<JobHandle> {
        let flags = self.filter(key, series).flags;
        let file = self
            .files
            .get_mut(key)
            .ok_or_else(|| Error::UnknownFile(key.path().to_path_buf()))?;
        file.pending += 1;
        file.state = FileState::Recomputing;
        let provider = Arc::clone(&file.provider);
        let generation = file.generation;

        let service = Arc::clone(&self.service);
        let tx = self.worker_tx.clone();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let job_key = key.clone();
        let series = series.to_string();

        self.pool.spawn(move || {
            let start = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                service.run(provider.as_ref(), &series, &params, flags, range_override)
            }))
            .unwrap_or_else(|_| Err(Error::Algorithm(format!("gridding of {job_key} panicked"))))
            .map(Arc::new);

            let report = match &outcome {
                Ok(result) => Ok(Arc::clone(result)),
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(WorkerMessage::Finished {
                key: job_key,
                generation,
                outcome: report,
                elapsed: start.elapsed(),
            });
            let _ = done_tx.send(outcome);
        });

        Ok(JobHandle {
            file: key.clone(),
            rx: done_rx,
        })
    }

    /// Merge finished jobs without blocking. Returns how many reports were
    /// processed, including dropped ones.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Ok(msg) = self.worker_rx.try_recv() {
            self.merge(msg);
            n += 1;
        }
        n
    }

    /// Block until no job for an open file is outstanding.
    pub fn wait_idle(&mut self) -> Result<usize> {
        let mut n = self.pump();
        while self.pending_jobs() > 0 {
            let msg = self
                .worker_rx
                .recv()
                .map_err(|_| Error::WorkerDisconnected)?;
            self.merge(msg);
            n += 1;
        }
        Ok(n)
    }

    fn merge(&mut self, msg: WorkerMessage) {
        let WorkerMessage::Finished {
            key,
            generation,
            outcome,
            elapsed,
        } = msg;

        let Some(file) = self
            .files
            .get_mut(&key)
            .filter(|f| f.generation == generation)
        else {
            debug!(file = %key, "dropping result for a closed or renamed file");
            return;
        };
        file.pending = file.pending.saturating_sub(1);
        let idle = file.pending == 0;

        match outcome {
            Ok(result) => {
                if idle {
                    file.state = FileState::Fresh;
                }
                debug!(
                    file = %key,
                    series = result.series_name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "merging result"
                );
                self.cache.apply(CacheOp::Submit(result));
                self.refresh_rendered(&key);
                self.redraw.request();
            }
            Err(message) => {
                if idle {
                    file.state = if self.cache.contains(&key) {
                        FileState::StaleParams
                    } else {
                        FileState::NoResult
                    };
                }
                error!(file = %key, error = %message, "gridding failed");
            }
        }
    }

    // ─── Helpers ───────────────────────────────────────────────────────

    fn store_display_settings(
        &mut self,
        key: &FileKey,
        series: &str,
        change: &ParameterChange,
    ) -> Result<()> {
        let filter = GriddingFilter {
            flags: change.flags,
            range: change.range,
            ..self.filter(key, series)
        };
        self.set_filter(key, series, filter)
    }

    fn refresh_rendered(&mut self, key: &FileKey) {
        let grid = match self.rendered_grid(key) {
            Ok(grid) => grid,
            Err(e) => {
                error!(file = %key, error = %e, "post-processing failed");
                self.rendered.remove(key);
                None
            }
        };
        let _ = self.events_tx.send(EngineEvent::GridUpdated {
            file: key.clone(),
            grid,
        });
    }

    fn mark_stale(&mut self, key: &FileKey) {
        if let Some(file) = self.files.get_mut(key) {
            if file.state == FileState::Fresh {
                debug!(file = %key, "result is stale");
                file.state = FileState::StaleParams;
            }
        }
    }

    fn files_sharing_template(&self, key: &FileKey) -> Vec<FileKey> {
        let Some(template) = self.files.get(key).map(|f| &f.template) else {
            return Vec::new();
        };
        self.files
            .iter()
            .filter(|(_, f)| &f.template == template)
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

fn check_range(range: Range) -> Result<()> {
    if range.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: "range",
            value: range.to_string(),
            reason: "bounds must be finite".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveygrid_core::{GeoRecord, InterpolationMethod, LatLon, SurveyFile, SurveyLine};

    fn survey(path: &str, template: &str) -> Arc<dyn SeriesProvider> {
        let mut records = Vec::new();
        for line in 0..4 {
            for i in 0..20 {
                let pos = LatLon::new(0.0001 * i as f64, 0.0001 * line as f64);
                records.push(GeoRecord::new(Some(pos)).with_value("mag", (i + line) as f64));
            }
        }
        Arc::new(SurveyFile::new(
            path,
            Some(template.to_string()),
            vec![SurveyLine { line: 1, records }],
        ))
    }

    fn coordinator() -> RecomputeCoordinator {
        let config = EngineConfig {
            worker_threads: 2,
            ..Default::default()
        };
        RecomputeCoordinator::new(config).unwrap()
    }

    fn params() -> GriddingParams {
        GriddingParams::new(5.0, 30.0, InterpolationMethod::Idw).unwrap()
    }

    #[test]
    fn test_open_registers_without_result() {
        let mut c = coordinator();
        let key = c.open_file(survey("a.json", "t"));
        assert_eq!(c.file_state(&key), Some(FileState::NoResult));
        assert!(c.get_result(&key).is_none());
        assert!(!c.is_pending(&key));
        assert_eq!(c.open_files().count(), 1);
    }

    #[test]
    fn test_unknown_files_rejected() {
        let mut c = coordinator();
        let missing = FileKey::new("nope.json");
        assert!(matches!(c.select_file(missing.clone()), Err(Error::UnknownFile(_))));
        assert!(c.select_series(&missing, "mag".into()).is_err());
        assert!(c.run_gridding(&[missing.clone()], "mag", params(), None).is_err());
        assert!(!c.close_file(&missing));
    }

    #[test]
    fn test_submit_then_merge() {
        let mut c = coordinator();
        let key = c.open_file(survey("a.json", "t"));
        let handles = c.run_gridding(&[key.clone()], "mag", params(), None).unwrap();
        assert!(c.is_pending(&key));
        assert_eq!(c.file_state(&key), Some(FileState::Recomputing));

        let result = handles.into_iter().next().unwrap().wait().unwrap();
        assert_eq!(result.series_name(), "mag");
        c.wait_idle().unwrap();

        assert_eq!(c.file_state(&key), Some(FileState::Fresh));
        assert!(Arc::ptr_eq(&c.get_result(&key).unwrap(), &result));
        assert_eq!(c.pending_jobs(), 0);
    }

    #[test]
    fn test_failed_job_without_result() {
        let mut c = coordinator();
        let key = c.open_file(survey("a.json", "t"));
        let handle = c
            .run_gridding(&[key.clone()], "gravity", params(), None)
            .unwrap()
            .pop()
            .unwrap();
        assert!(matches!(handle.wait(), Err(Error::MissingSeries { .. })));
        c.wait_idle().unwrap();
        assert_eq!(c.file_state(&key), Some(FileState::NoResult));
        assert!(c.cache().is_empty());
    }

    #[test]
    fn test_default_filter_from_config() {
        let mut config = EngineConfig::default();
        config.palette = surveygrid_colormap::PaletteType::Quantile;
        let mut c = RecomputeCoordinator::new(config).unwrap();
        let key = c.open_file(survey("a.json", "t"));
        let filter = c.filter(&key, "mag");
        assert_eq!(filter.palette, surveygrid_colormap::PaletteType::Quantile);
        assert_eq!(filter.range, None);
    }

    #[test]
    fn test_filters_shared_by_template() {
        let mut c = coordinator();
        let a = c.open_file(survey("a.json", "t"));
        let b = c.open_file(survey("b.json", "t"));
        let other = c.open_file(survey("c.json", "u"));

        let filter = GriddingFilter::new(Default::default(), Some(Range::new(1.0, 2.0)));
        c.set_filter(&a, "mag", filter).unwrap();
        assert_eq!(c.filter(&b, "mag"), filter);
        assert_ne!(c.filter(&other, "mag"), filter);
        assert_ne!(c.filter(&a, "other"), filter);
    }

    #[test]
    fn test_close_selected_clears_selection() {
        let mut c = coordinator();
        let key = c.open_file(survey("a.json", "t"));
        c.select_file(key.clone()).unwrap();
        assert!(c.close_file(&key));
        assert!(c.selected_file().is_none());
        assert!(c.current_grid().unwrap().is_none());
    }
}
