use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{
    render::{FrameRenderer, SequenceHeader},
    timeline::{Frame, FrameKind},
    FuelMixError, Result,
};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub output_path: PathBuf,
    /// Write every frame's values, not just its title and timing.
    pub include_values: bool,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("frames.jsonl"),
            include_values: true,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ManifestLine<'a> {
    Header(&'a SequenceHeader<'a>),
    Frame(FrameLine<'a>),
}

#[derive(Serialize)]
struct FrameLine<'a> {
    index: usize,
    time_seconds: f64,
    title: &'a str,
    kind: FrameKind,
    period: usize,
    /// One series per header column, in display units.
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Vec<f64>>>,
}

/// Writes the frame sequence as a JSON-lines manifest: one header line, then
/// one line per frame, for an external plotting or video tool to replay.
#[derive(Debug)]
pub struct Recorder<W: Write> {
    settings: RecordingSettings,
    writer: W,
    value_divisor: f64,
    is_recording: bool,
    frames_written: usize,
}

impl Recorder<BufWriter<File>> {
    /// Creates (or truncates) the file named in the settings.
    pub fn create(settings: RecordingSettings) -> Result<Self> {
        let file = File::create(&settings.output_path)?;
        Ok(Self::new(settings, BufWriter::new(file)))
    }
}

impl<W: Write> Recorder<W> {
    pub fn new(settings: RecordingSettings, writer: W) -> Self {
        Self {
            settings,
            writer,
            value_divisor: 1.0,
            is_recording: false,
            frames_written: 0,
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &ManifestLine<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> FrameRenderer for Recorder<W> {
    fn begin(&mut self, header: &SequenceHeader<'_>) -> Result<()> {
        if self.is_recording {
            return Err(FuelMixError::msg("recorder has already been started"));
        }
        self.value_divisor = header.value_divisor;
        self.frames_written = 0;
        self.write_line(&ManifestLine::Header(header))?;
        self.is_recording = true;
        Ok(())
    }

    fn draw(&mut self, index: usize, time_seconds: f64, frame: &Frame<'_>) -> Result<()> {
        if !self.is_recording {
            return Err(FuelMixError::msg("recorder received a frame before begin"));
        }

        let values: Option<Vec<Vec<f64>>> = self.settings.include_values.then(|| {
            frame
                .snapshot
                .columns()
                .iter()
                .filter_map(|column| frame.snapshot.series(column))
                .map(|series| series.iter().map(|v| v / self.value_divisor).collect::<Vec<f64>>())
                .collect()
        });

        self.write_line(&ManifestLine::Frame(FrameLine {
            index,
            time_seconds,
            title: &frame.title,
            kind: frame.kind,
            period: frame.period,
            values,
        }))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.is_recording = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{render::render_sequence, ChartStyle, PauseSchedule, Period, Sequencer, Snapshot, TimingConfig};

    fn sequence_periods() -> Vec<Period> {
        vec![
            Period::new(
                "2024",
                Snapshot::from_columns(
                    vec!["06:00".into(), "12:00".into()],
                    [("Solar", vec![0.0, 2000.0]), ("Gas", vec![4000.0, 1000.0])],
                )
                .unwrap(),
            ),
            Period::new(
                "2025",
                Snapshot::from_columns(
                    vec!["06:00".into(), "12:00".into()],
                    [("Solar", vec![0.0, 4000.0]), ("Gas", vec![2000.0, 1000.0])],
                )
                .unwrap(),
            ),
        ]
    }

    fn lines(bytes: &[u8]) -> Vec<Value> {
        std::str::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn writes_header_then_frames() {
        let periods = sequence_periods();
        let sequence = Sequencer::new(TimingConfig {
            fps: 2.0,
            transition_seconds: 0.5,
            pause: PauseSchedule::uniform(0.5),
            ..TimingConfig::default()
        })
        .unwrap()
        .build(&periods)
        .unwrap();

        let mut recorder = Recorder::new(RecordingSettings::default(), Vec::new());
        render_sequence(&sequence, &ChartStyle::default(), &mut recorder).unwrap();
        assert_eq!(recorder.frames_written(), 3);
        assert!(!recorder.is_recording());

        let lines = lines(&recorder.into_inner());
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["type"], "header");
        assert_eq!(lines[0]["frame_count"], 3);
        assert_eq!(lines[0]["columns"][1], "Gas");
        assert_eq!(lines[0]["index"][1], "12:00");
        assert_eq!(lines[0]["y_max"], 5.0);

        assert_eq!(lines[2]["type"], "frame");
        assert_eq!(lines[2]["kind"], "transition");
        assert_eq!(lines[2]["title"], "2024 → 2025");
        assert_eq!(lines[2]["values"][0][1], 3.0);
        assert_eq!(lines[2]["values"][1][0], 3.0);
        assert_eq!(lines[3]["time_seconds"], 1.0);
    }

    #[test]
    fn values_can_be_omitted() {
        let periods = sequence_periods();
        let sequence = Sequencer::new(TimingConfig::default())
            .unwrap()
            .build(&periods[..1])
            .unwrap();
        let settings = RecordingSettings {
            include_values: false,
            ..RecordingSettings::default()
        };

        let mut recorder = Recorder::new(settings, Vec::new());
        render_sequence(&sequence, &ChartStyle::default(), &mut recorder).unwrap();

        let lines = lines(&recorder.into_inner());
        assert_eq!(lines.len(), 31);
        assert!(lines[1].get("values").is_none());
    }

    #[test]
    fn refuses_frames_before_begin() {
        let periods = sequence_periods();
        let sequence = Sequencer::new(TimingConfig::default())
            .unwrap()
            .build(&periods)
            .unwrap();

        let mut recorder = Recorder::new(RecordingSettings::default(), Vec::new());
        let frame = sequence.frame(0).unwrap();
        assert!(recorder.draw(0, 0.0, frame).is_err());
    }
}
