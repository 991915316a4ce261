//! Events consumed and produced by the coordinator.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use surveygrid_core::{FileKey, InterpolationMethod, PostProcessingFlags, Range};

use crate::provider::SeriesProvider;
use crate::result::RenderedGrid;

/// Where a parameter change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// The user pressed apply
    Apply,
    /// A field or checkbox was edited but not applied
    Edit,
}

/// Gridding and display settings from the parameter panel.
///
/// Distances are unvalidated here; the coordinator rejects out-of-range
/// values before anything is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChange {
    pub cell_size: f64,
    pub blanking_distance: f64,
    pub method: InterpolationMethod,
    pub flags: PostProcessingFlags,
    pub range: Option<Range>,
    pub source: ChangeSource,
    /// Target every open file sharing the selected file's template
    pub apply_to_all: bool,
}

/// Kinds of data or view change.
#[derive(Clone)]
pub enum DataChange {
    Zoom,
    Pan,
    Resize,
    /// The display range of the selected series was moved
    RangeChanged(Range),
    /// Sample values of a series changed upstream; `source` is the updated file
    SeriesValuesFiltered {
        source: Arc<dyn SeriesProvider>,
        series: String,
    },
}

impl fmt::Debug for DataChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zoom => write!(f, "Zoom"),
            Self::Pan => write!(f, "Pan"),
            Self::Resize => write!(f, "Resize"),
            Self::RangeChanged(r) => write!(f, "RangeChanged({})", r),
            Self::SeriesValuesFiltered { source, series } => f
                .debug_struct("SeriesValuesFiltered")
                .field("file", &source.file_key())
                .field("series", series)
                .finish(),
        }
    }
}

/// Input events from the view layer.
#[derive(Clone)]
pub enum ViewEvent {
    FileOpened(Arc<dyn SeriesProvider>),
    FileSelected(FileKey),
    FileClosed(FileKey),
    /// `file` now lives under a new key; its old key was `old`
    FileRenamed {
        file: Arc<dyn SeriesProvider>,
        old: FileKey,
    },
    SeriesSelected {
        file: FileKey,
        series: String,
    },
    ParametersChanged(ParameterChange),
    DataChanged(DataChange),
}

impl fmt::Debug for ViewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileOpened(p) => write!(f, "FileOpened({})", p.file_key()),
            Self::FileSelected(k) => write!(f, "FileSelected({})", k),
            Self::FileClosed(k) => write!(f, "FileClosed({})", k),
            Self::FileRenamed { file, old } => {
                write!(f, "FileRenamed({} -> {})", old, file.file_key())
            }
            Self::SeriesSelected { file, series } => {
                write!(f, "SeriesSelected({}, {})", file, series)
            }
            Self::ParametersChanged(p) => f.debug_tuple("ParametersChanged").field(p).finish(),
            Self::DataChanged(d) => f.debug_tuple("DataChanged").field(d).finish(),
        }
    }
}

/// What an event requires of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Submit new gridding jobs
    Recompute,
    /// Cached results no longer match the inputs; wait for an explicit apply
    MarkStale,
    /// Re-render from cached results
    RedrawOnly,
    /// Bookkeeping only
    Ignore,
}

/// Classify an event without touching any state.
///
/// `auto_resubmit_suffix` marks derived series that are regridded as soon as
/// their values change.
pub fn classify(event: &ViewEvent, auto_resubmit_suffix: &str) -> Reaction {
    match event {
        ViewEvent::FileOpened(_) => Reaction::Ignore,
        ViewEvent::FileSelected(_) | ViewEvent::FileClosed(_) | ViewEvent::FileRenamed { .. } => {
            Reaction::RedrawOnly
        }
        ViewEvent::SeriesSelected { .. } => Reaction::MarkStale,
        ViewEvent::ParametersChanged(change) => match change.source {
            ChangeSource::Apply => Reaction::Recompute,
            ChangeSource::Edit => Reaction::RedrawOnly,
        },
        ViewEvent::DataChanged(change) => match change {
            DataChange::Zoom | DataChange::Pan | DataChange::Resize | DataChange::RangeChanged(_) => {
                Reaction::RedrawOnly
            }
            DataChange::SeriesValuesFiltered { series, .. } => {
                if !auto_resubmit_suffix.is_empty() && series.ends_with(auto_resubmit_suffix) {
                    Reaction::Recompute
                } else {
                    Reaction::MarkStale
                }
            }
        },
    }
}

/// Output events for renderers and legends.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The rendered grid of a file changed; `None` once it has no result
    GridUpdated {
        file: FileKey,
        grid: Option<Arc<RenderedGrid>>,
    },
    /// Something visible changed; draw again
    RedrawRequested,
}

/// Coalesces redraw requests.
///
/// Any number of requests between two draw passes produce a single
/// [`EngineEvent::RedrawRequested`]. The renderer calls
/// [`begin_draw`](Self::begin_draw) when it starts a pass.
#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    pending: Arc<AtomicBool>,
    tx: Sender<EngineEvent>,
}

impl RedrawScheduler {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Ask for a redraw. Returns `true` if this request emitted the event.
    pub fn request(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.tx.send(EngineEvent::RedrawRequested);
        true
    }

    /// Mark the start of a draw pass; returns whether a redraw was pending.
    pub fn begin_draw(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
