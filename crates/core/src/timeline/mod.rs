use std::{borrow::Cow, collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    interpolate::{interpolate, EasingCurve},
    FuelMixError, Period, Result, Snapshot,
};

/// Longest run of frames a single pause or transition may expand to.
pub const MAX_SEGMENT_FRAMES: usize = i32::MAX as usize;

/// Playback position in whole frames at a fixed frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    fps: f64,
    frame: usize,
}

impl PlaybackClock {
    pub fn new(fps: f64) -> Self {
        Self { fps, frame: 0 }
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    /// Steps one frame forward.
    pub fn advance(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }

    /// Moves to the frame on screen at `time_seconds`. Negative times clamp to
    /// the first frame.
    pub fn seek(&mut self, time_seconds: f64) {
        self.frame = (time_seconds.max(0.0) * self.fps).floor() as usize;
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn time_seconds(&self) -> f64 {
        self.frame as f64 / self.fps
    }
}

/// How long each period is held on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseSchedule {
    /// Used for every label without an override.
    pub default_seconds: f64,
    pub overrides: BTreeMap<String, f64>,
}

impl Default for PauseSchedule {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl PauseSchedule {
    pub fn uniform(seconds: f64) -> Self {
        Self {
            default_seconds: seconds,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, label: impl Into<String>, seconds: f64) -> Self {
        self.overrides.insert(label.into(), seconds);
        self
    }

    pub fn seconds_for(&self, label: &str) -> f64 {
        self.overrides
            .get(label)
            .copied()
            .unwrap_or(self.default_seconds)
    }

    fn validate(&self) -> Result<()> {
        check_duration("pause_seconds", self.default_seconds)?;
        for (label, seconds) in &self.overrides {
            if !seconds.is_finite() || *seconds < 0.0 {
                return Err(FuelMixError::timing(
                    "pause_seconds",
                    format!("override for `{label}` must be a finite, non-negative duration, got {seconds}"),
                ));
            }
        }
        Ok(())
    }
}

/// Title shown on transition frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStyle {
    /// Keep the label of the period being left: `2020`.
    Source,
    /// Name both ends: `2020 → 2021`.
    #[default]
    Composite,
}

impl TitleStyle {
    pub fn transition_title(self, from: &str, to: &str) -> String {
        match self {
            TitleStyle::Source => from.to_string(),
            TitleStyle::Composite => format!("{from} → {to}"),
        }
    }
}

impl fmt::Display for TitleStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleStyle::Source => f.write_str("source"),
            TitleStyle::Composite => f.write_str("composite"),
        }
    }
}

impl FromStr for TitleStyle {
    type Err = FuelMixError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(TitleStyle::Source),
            "composite" => Ok(TitleStyle::Composite),
            other => Err(FuelMixError::msg(format!(
                "unknown title style `{other}` (expected source or composite)"
            ))),
        }
    }
}

/// Frame cadence and durations for one animation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub fps: f64,
    pub transition_seconds: f64,
    pub pause: PauseSchedule,
    pub title_style: TitleStyle,
    pub easing: EasingCurve,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            transition_seconds: 1.5,
            pause: PauseSchedule::default(),
            title_style: TitleStyle::default(),
            easing: EasingCurve::default(),
        }
    }
}

impl TimingConfig {
    /// Rejects non-positive frame rates, negative or non-finite durations and
    /// durations too long to count in frames.
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(FuelMixError::timing(
                "fps",
                format!("must be a finite, positive frame rate, got {}", self.fps),
            ));
        }
        check_duration("transition_seconds", self.transition_seconds)?;
        self.pause.validate()?;

        self.transition_frames()?;
        self.frames_for("pause_seconds", self.pause.default_seconds)?;
        for seconds in self.pause.overrides.values() {
            self.frames_for("pause_seconds", *seconds)?;
        }
        Ok(())
    }

    pub fn held_frames(&self, label: &str) -> Result<usize> {
        self.frames_for("pause_seconds", self.pause.seconds_for(label))
    }

    pub fn transition_frames(&self) -> Result<usize> {
        self.frames_for("transition_seconds", self.transition_seconds)
    }

    /// `round(seconds * fps)`, refusing counts above [`MAX_SEGMENT_FRAMES`].
    fn frames_for(&self, parameter: &'static str, seconds: f64) -> Result<usize> {
        let frames = (seconds * self.fps).round();
        if frames.is_finite() && frames <= MAX_SEGMENT_FRAMES as f64 {
            Ok(frames as usize)
        } else {
            Err(FuelMixError::timing(
                parameter,
                format!(
                    "{seconds} s at {} fps is more than {MAX_SEGMENT_FRAMES} frames",
                    self.fps
                ),
            ))
        }
    }
}

fn check_duration(parameter: &'static str, seconds: f64) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(FuelMixError::timing(
            parameter,
            format!("must be a finite, non-negative duration, got {seconds}"),
        ))
    }
}

/// Frame budget of one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentPlan {
    pub label: String,
    pub held_frames: usize,
    /// Zero for the last period.
    pub transition_frames: usize,
}

impl SegmentPlan {
    pub fn frame_count(&self) -> usize {
        self.held_frames + self.transition_frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Held,
    Transition,
}

/// One snapshot to draw, with its title.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Borrowed from the input for held frames, owned for transitions.
    pub snapshot: Cow<'a, Snapshot>,
    pub title: String,
    pub kind: FrameKind,
    /// Position of the originating period in the input.
    pub period: usize,
}

/// Ordered frames ready to be handed to a renderer.
#[derive(Debug, Clone)]
pub struct Sequence<'a> {
    columns: Vec<String>,
    frames: Vec<Frame<'a>>,
    fps: f64,
}

impl<'a> Sequence<'a> {
    /// Canonical column order shared by every frame.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn frames(&self) -> &[Frame<'a>] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame<'a>> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }

    /// Tallest stack across all frames, for a fixed y-axis.
    pub fn max_stack_total(&self) -> Option<f64> {
        self.frames
            .iter()
            .map(|frame| frame.snapshot.max_total())
            .reduce(f64::max)
    }

    /// A clock at this sequence's frame rate, on the first frame.
    pub fn clock(&self) -> PlaybackClock {
        PlaybackClock::new(self.fps)
    }

    /// Frame on screen at the clock's position. Without looping, `None` once
    /// playback has run past the last frame.
    pub fn frame_index_at(&self, clock: &PlaybackClock, looping: bool) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let index = if clock.fps() == self.fps {
            clock.frame()
        } else {
            (clock.time_seconds() * self.fps).floor() as usize
        };
        if looping {
            Some(index % self.frames.len())
        } else if index < self.frames.len() {
            Some(index)
        } else {
            None
        }
    }
}

/// Expands labelled periods into held and transition frames.
#[derive(Debug, Clone)]
pub struct Sequencer {
    timing: TimingConfig,
}

impl Sequencer {
    pub fn new(timing: TimingConfig) -> Result<Self> {
        timing.validate()?;
        Ok(Self { timing })
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Checks the periods line up and returns the per-period frame budget.
    pub fn plan(&self, periods: &[Period]) -> Result<Vec<SegmentPlan>> {
        self.align(periods)?;
        let (plan, _) = self.segments(periods)?;
        Ok(plan)
    }

    /// Builds every frame. Nothing is returned unless all periods align.
    pub fn build<'a>(&self, periods: &'a [Period]) -> Result<Sequence<'a>> {
        let aligned = self.align(periods)?;
        let (plan, total) = self.segments(periods)?;

        let mut frames = Vec::new();
        for (position, (period, segment)) in periods.iter().zip(&plan).enumerate() {
            let snapshot = &aligned[position];
            for _ in 0..segment.held_frames {
                frames.push(Frame {
                    snapshot: snapshot.clone(),
                    title: period.label().to_string(),
                    kind: FrameKind::Held,
                    period: position,
                });
            }

            let Some(next) = periods.get(position + 1) else {
                continue;
            };
            let title = self
                .timing
                .title_style
                .transition_title(period.label(), next.label());
            let between = interpolate(
                snapshot,
                &aligned[position + 1],
                segment.transition_frames,
                &self.timing.easing,
            )?;
            frames.extend(between.into_iter().map(|snapshot| Frame {
                snapshot: Cow::Owned(snapshot),
                title: title.clone(),
                kind: FrameKind::Transition,
                period: position,
            }));
        }

        debug_assert_eq!(frames.len(), total);
        tracing::debug!(
            periods = periods.len(),
            frames = frames.len(),
            fps = self.timing.fps,
            "built frame sequence"
        );

        Ok(Sequence {
            columns: periods[0].order().to_vec(),
            frames,
            fps: self.timing.fps,
        })
    }

    /// Per-period budget and the total frame count, which must be non-zero.
    fn segments(&self, periods: &[Period]) -> Result<(Vec<SegmentPlan>, usize)> {
        let transition_frames = self.timing.transition_frames()?;
        let mut plan = Vec::with_capacity(periods.len());
        let mut total = 0usize;

        for (position, period) in periods.iter().enumerate() {
            let segment = SegmentPlan {
                label: period.label().to_string(),
                held_frames: self.timing.held_frames(period.label())?,
                transition_frames: if position + 1 < periods.len() {
                    transition_frames
                } else {
                    0
                },
            };
            total = total
                .checked_add(segment.frame_count())
                .ok_or_else(|| {
                    FuelMixError::timing(
                        "fps",
                        format!("{} periods need more frames than can be counted", periods.len()),
                    )
                })?;
            plan.push(segment);
        }

        if total == 0 {
            return Err(FuelMixError::EmptySequence {
                periods: periods.len(),
                fps: self.timing.fps,
            });
        }
        Ok((plan, total))
    }

    /// Realigns every snapshot to the first period's order.
    fn align<'a>(&self, periods: &'a [Period]) -> Result<Vec<Cow<'a, Snapshot>>> {
        let first = periods.first().ok_or(FuelMixError::EmptyInput)?;
        let canonical = first.order();

        periods
            .iter()
            .map(|period| {
                let snapshot = period.snapshot().realign_to(canonical, period.label())?;
                if snapshot.rows() != first.snapshot().rows() {
                    return Err(FuelMixError::ShapeMismatch {
                        left: first.label().to_string(),
                        right: period.label().to_string(),
                        detail: format!(
                            "{} rows against {}",
                            snapshot.rows(),
                            first.snapshot().rows()
                        ),
                    });
                }
                if snapshot.index() != first.snapshot().index() {
                    tracing::warn!(
                        label = period.label(),
                        reference = first.label(),
                        "index keys differ; transition frames reuse the earlier period's index"
                    );
                }
                Ok(snapshot)
            })
            .collect()
    }
}
