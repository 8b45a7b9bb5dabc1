//! Core library for the Fuel Mix Animator.
//!
//! Turns an ordered list of labelled generation-mix snapshots (one per year,
//! season or trailing window) into the flat frame list an animation renderer
//! draws: each period held on screen for its pause, with interpolated frames
//! easing into the next. Loading and drawing stay outside the crate behind
//! [`PeriodManifest`] and the [`FrameRenderer`] trait.

pub mod config;
pub mod error;
pub mod interpolate;
pub mod record;
pub mod render;
pub mod snapshot;
pub mod timeline;

pub use config::AppConfig;
pub use error::{FuelMixError, Result};
pub use interpolate::{blend_fraction, interpolate, Easing, EasingCurve};
pub use record::{Recorder, RecordingSettings};
pub use render::{render_sequence, ChartStyle, FrameRenderer, SequenceHeader};
pub use snapshot::{FuelSource, Period, PeriodManifest, Snapshot};
pub use timeline::{
    Frame, FrameKind, PauseSchedule, PlaybackClock, SegmentPlan, Sequence, Sequencer,
    TimingConfig, TitleStyle,
};
