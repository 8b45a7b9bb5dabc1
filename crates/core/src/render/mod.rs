use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{timeline::Frame, FuelMixError, FuelSource, Result, Sequence};

/// Presentation settings handed to renderers. The sequencer never reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    /// Fill colour per series name.
    pub palette: BTreeMap<String, String>,
    /// Used for series missing from the palette.
    pub fallback_colour: String,
    pub background: String,
    pub title_colour: String,
    pub axis_colour: String,
    pub font_family: String,
    pub fallback_font: String,
    /// Width and height in inches.
    pub figure_size: (f64, f64),
    /// Raw values are divided by this before drawing (MW to GW by default).
    pub value_divisor: f64,
    pub value_unit: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            palette: FuelSource::STACK_ORDER
                .iter()
                .map(|source| (source.name().to_string(), source.default_colour().to_string()))
                .collect(),
            fallback_colour: "#9E9E9E".to_string(),
            background: "#FAFAFA".to_string(),
            title_colour: "#333333".to_string(),
            axis_colour: "#777777".to_string(),
            font_family: "Montserrat".to_string(),
            fallback_font: "DejaVu Sans".to_string(),
            figure_size: (8.0, 8.0),
            value_divisor: 1000.0,
            value_unit: "GW".to_string(),
        }
    }
}

impl ChartStyle {
    pub fn validate(&self) -> Result<()> {
        if !self.value_divisor.is_finite() || self.value_divisor <= 0.0 {
            return Err(FuelMixError::msg(format!(
                "style value_divisor must be finite and positive, got {}",
                self.value_divisor
            )));
        }
        Ok(())
    }

    pub fn colour_for(&self, column: &str) -> &str {
        self.palette
            .get(column)
            .map(String::as_str)
            .unwrap_or(self.fallback_colour.as_str())
    }

    pub fn scale(&self, value: f64) -> f64 {
        value / self.value_divisor
    }
}

/// Everything a renderer needs to know before the first frame.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceHeader<'s> {
    pub columns: &'s [String],
    /// Row keys shared by every frame.
    pub index: &'s [String],
    pub colours: Vec<&'s str>,
    pub fps: f64,
    pub frame_count: usize,
    pub duration_seconds: f64,
    /// Tallest stack in display units, for a y-axis that stays put.
    pub y_max: Option<f64>,
    pub value_divisor: f64,
    pub unit: &'s str,
}

impl<'s> SequenceHeader<'s> {
    pub fn new(sequence: &'s Sequence<'_>, style: &'s ChartStyle) -> Self {
        Self {
            columns: sequence.columns(),
            index: sequence
                .frames()
                .first()
                .map(|frame| frame.snapshot.index())
                .unwrap_or(&[]),
            colours: sequence
                .columns()
                .iter()
                .map(|column| style.colour_for(column))
                .collect(),
            fps: sequence.fps(),
            frame_count: sequence.len(),
            duration_seconds: sequence.duration_seconds(),
            y_max: sequence.max_stack_total().map(|total| style.scale(total)),
            value_divisor: style.value_divisor,
            unit: &style.value_unit,
        }
    }
}

/// Per-frame drawing callback.
///
/// `begin` is the explicit setup step: it runs once, before any frame, and is
/// where fonts, figures or output files get prepared.
pub trait FrameRenderer {
    fn begin(&mut self, header: &SequenceHeader<'_>) -> Result<()>;

    fn draw(&mut self, index: usize, time_seconds: f64, frame: &Frame<'_>) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Feeds every frame of `sequence` to `renderer`, in order.
pub fn render_sequence<R>(sequence: &Sequence<'_>, style: &ChartStyle, renderer: &mut R) -> Result<usize>
where
    R: FrameRenderer + ?Sized,
{
    let header = SequenceHeader::new(sequence, style);
    renderer.begin(&header)?;

    let mut clock = sequence.clock();
    while let Some(index) = sequence.frame_index_at(&clock, false) {
        renderer.draw(index, clock.time_seconds(), &sequence.frames()[index])?;
        clock.advance();
    }

    renderer.finish()?;
    tracing::info!(
        frames = sequence.len(),
        seconds = sequence.duration_seconds(),
        "rendered sequence"
    );
    Ok(sequence.len())
}
