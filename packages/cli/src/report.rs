//! Run summaries.

use std::collections::BTreeSet;
use std::fmt;

use color_world_history::PlaceHistory;
use color_world_models::{Coordinate, PlaceId, SampledColor};
use color_world_session::{FrameOutput, SampleOutcome};

/// Palette entries printed at the end of a run.
const PALETTE_PREVIEW: usize = 12;

/// Counters gathered over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub frames: u64,
    pub recorded: usize,
    pub rejected: usize,
    pub misses: usize,
    pub pending: usize,
    pub max_visible: usize,
    pub city_labels: BTreeSet<String>,
    pub final_center: Option<Coordinate>,
    pub place: Option<PlaceId>,
    pub palette: Vec<SampledColor>,
    pub average: Option<SampledColor>,
}

impl RunReport {
    /// Folds one frame into the counters.
    pub fn observe(&mut self, output: &FrameOutput) {
        self.frames += 1;
        self.recorded += output.recorded;
        self.max_visible = self.max_visible.max(output.points.len());
        self.final_center = Some(output.center);

        if let Some(label) = output.city_label.as_deref().filter(|l| !l.is_empty()) {
            self.city_labels.insert(label.to_string());
        }

        for finger in &output.fingers {
            match finger.outcome {
                SampleOutcome::Rejected => self.rejected += 1,
                SampleOutcome::Miss => self.misses += 1,
                SampleOutcome::Pending => self.pending += 1,
                SampleOutcome::Accepted(_) => {}
            }
        }
    }

    /// Copies the collected palette of `place` out of `history`.
    pub fn finish(&mut self, place: PlaceId, history: &PlaceHistory) {
        self.place = Some(place);
        self.palette = history.entries(place).map(|entry| entry.color).collect();
        self.average = history.average_color(place);
    }
}

/// `#rrggbb`.
#[must_use]
pub fn hex(color: SampledColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames:          {}", self.frames)?;
        writeln!(f, "Max visible:     {}", self.max_visible)?;
        if let Some(center) = self.final_center {
            writeln!(f, "Final center:    {center}")?;
        }
        if !self.city_labels.is_empty() {
            let labels: Vec<&str> = self.city_labels.iter().map(String::as_str).collect();
            writeln!(f, "Cities seen:     {}", labels.join(", "))?;
        }
        writeln!(
            f,
            "Samples:         {} recorded, {} rejected, {} missed, {} pending",
            self.recorded, self.rejected, self.misses, self.pending
        )?;
        if let Some(place) = self.place {
            writeln!(f, "Palette ({place}): {} colors", self.palette.len())?;
        }
        if let Some(average) = self.average {
            writeln!(f, "Average color:   {}", hex(average))?;
        }

        let skip = self.palette.len().saturating_sub(PALETTE_PREVIEW);
        let preview: Vec<String> = self.palette.iter().skip(skip).copied().map(hex).collect();
        if !preview.is_empty() {
            writeln!(f, "Latest:          {}", preview.join(" "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_world_models::{HistoryEntry, ScreenPoint};
    use color_world_session::FingerSample;

    fn output(recorded: usize, label: Option<&str>, outcomes: &[SampleOutcome]) -> FrameOutput {
        FrameOutput {
            center: Coordinate::new(-122.4194, 37.7749),
            center_screen: ScreenPoint::new(0.0, 0.0),
            points: Vec::new(),
            city_label: label.map(str::to_string),
            street_labels: Vec::new(),
            fingers: outcomes
                .iter()
                .enumerate()
                .map(|(slot, &outcome)| FingerSample {
                    slot,
                    screen: ScreenPoint::new(0.0, 0.0),
                    location: Coordinate::new(-122.4194, 37.7749),
                    outcome,
                    color: None,
                    height: None,
                })
                .collect(),
            recorded,
            playback: None,
        }
    }

    #[test]
    fn counts_outcomes_and_labels() {
        let mut report = RunReport::default();
        report.observe(&output(0, Some("San Francisco"), &[SampleOutcome::Miss]));
        report.observe(&output(
            2,
            Some(""),
            &[SampleOutcome::Rejected, SampleOutcome::Pending],
        ));
        report.observe(&output(1, Some("San Francisco"), &[]));

        assert_eq!(report.frames, 3);
        assert_eq!(report.recorded, 3);
        assert_eq!(report.misses, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.pending, 1);
        assert_eq!(
            report.city_labels.iter().collect::<Vec<_>>(),
            vec!["San Francisco"]
        );
    }

    #[test]
    fn finish_copies_the_palette() {
        let mut history = PlaceHistory::new(4);
        for color in [[255, 0, 0], [0, 0, 255]] {
            history.append(
                PlaceId(0),
                HistoryEntry {
                    color: SampledColor::from(color),
                    location: Coordinate::new(0.0, 0.0),
                    height_metric: 10.0,
                },
            );
        }

        let mut report = RunReport::default();
        report.finish(PlaceId(0), &history);
        assert_eq!(report.palette.len(), 2);

        let text = report.to_string();
        assert!(text.contains("#ff0000 #0000ff"), "{text}");
    }

    #[test]
    fn hex_pads_channels() {
        assert_eq!(hex(SampledColor::new(1, 2, 255)), "#0102ff");
    }
}
