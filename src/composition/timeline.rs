use tracing::{debug, info};

use crate::{
    audio::SceneNarration,
    error::{CompositionError, Result},
    video::{CanonicalClip, ClipOutcome, FrameGeometry},
};

/// Where one clip sits on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSpan {
    pub scene_index: usize,

    /// Timeline position (seconds)
    pub start: f64,
    pub duration: f64,

    pub first_frame: u64,
    pub frame_count: u64,
}

impl ClipSpan {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Scene-ordered clips with their positions
///
/// Frame counts are cumulative: each clip ends on `round(end * fps)`, so
/// rounding never drifts and the total is within one frame of the summed
/// durations. A clip shorter than half a frame still gets one frame, taken
/// from the clip after it.
#[derive(Debug)]
pub struct Timeline {
    clips: Vec<CanonicalClip>,
    spans: Vec<ClipSpan>,
    geometry: FrameGeometry,
    fps: f64,
    skipped: usize,
}

impl Timeline {
    /// Order outcomes by scene index (ties keep input order), drop the
    /// skipped ones and lay the rest end to end.
    pub fn sequence(mut outcomes: Vec<ClipOutcome>, geometry: FrameGeometry, fps: f64) -> Result<Self> {
        outcomes.sort_by_key(ClipOutcome::scene_index);

        let mut clips = Vec::with_capacity(outcomes.len());
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                ClipOutcome::Built(clip) => clips.push(clip),
                ClipOutcome::Skipped { scene_index, reason } => {
                    debug!("Sequencer: scene {} absent ({})", scene_index, reason);
                    skipped += 1;
                }
            }
        }

        if clips.is_empty() {
            return Err(CompositionError::EmptyTimeline.into());
        }

        for clip in &clips {
            if clip.geometry != geometry || (clip.fps - fps).abs() > f64::EPSILON {
                return Err(CompositionError::GeometryMismatch {
                    scene: clip.scene_index,
                    got: format!("{} @ {}fps", clip.geometry, clip.fps),
                    expected: format!("{} @ {}fps", geometry, fps),
                }.into());
            }
        }

        let mut spans = Vec::with_capacity(clips.len());
        let mut start = 0.0;
        let mut next_frame = 0u64;
        for clip in &clips {
            let end = start + clip.duration;
            let first_frame = next_frame;
            // Every clip shows at least one frame; any overshoot is absorbed
            // by the clips after it
            let last_frame = ((end * fps).round() as u64).max(first_frame + 1);
            spans.push(ClipSpan {
                scene_index: clip.scene_index,
                start,
                duration: clip.duration,
                first_frame,
                frame_count: last_frame - first_frame,
            });
            start = end;
            next_frame = last_frame;
        }

        info!("Sequenced {} clips ({} skipped): {:.2}s, {} frames",
              clips.len(), skipped, start, spans.last().map_or(0, |s| s.first_frame + s.frame_count));

        Ok(Self { clips, spans, geometry, fps, skipped })
    }

    /// Sum of clip durations
    pub fn duration(&self) -> f64 {
        self.spans.last().map_or(0.0, ClipSpan::end)
    }

    pub fn total_frames(&self) -> u64 {
        self.spans.iter().map(|s| s.frame_count).sum()
    }

    pub fn spans(&self) -> &[ClipSpan] {
        &self.spans
    }

    pub fn scene_order(&self) -> Vec<usize> {
        self.spans.iter().map(|s| s.scene_index).collect()
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Per-scene narration placed at each clip's start
    pub fn scene_narrations(&self) -> Vec<SceneNarration> {
        self.clips
            .iter()
            .zip(&self.spans)
            .filter_map(|(clip, span)| {
                clip.narration.as_ref().map(|n| SceneNarration {
                    scene_index: clip.scene_index,
                    path: n.path.clone(),
                    offset: span.start,
                })
            })
            .collect()
    }

    /// Hand the clips over for rendering, each with its span
    pub fn into_clips(self) -> impl Iterator<Item = (CanonicalClip, ClipSpan)> {
        self.clips.into_iter().zip(self.spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::{AssetKind, ResolvedNarration},
        error::{AssetError, CompositorError},
        video::{Frame, StillSource},
    };

    const GEOMETRY: FrameGeometry = FrameGeometry { width: 8, height: 4 };

    fn clip(scene: usize, duration: f64) -> CanonicalClip {
        let source = StillSource::new(Frame::new_black(8, 4), None, 24.0);
        CanonicalClip::new(scene, AssetKind::Still, GEOMETRY, 24.0, duration, Box::new(source))
    }

    fn skipped(scene: usize) -> ClipOutcome {
        ClipOutcome::Skipped {
            scene_index: scene,
            reason: AssetError::Missing { scene, path: "gone.png".to_string() }.into(),
        }
    }

    #[test]
    fn test_sequence_orders_by_scene_and_drops_skips() {
        let outcomes = vec![
            ClipOutcome::Built(clip(4, 1.0)),
            ClipOutcome::Built(clip(1, 1.0)),
            skipped(2),
            ClipOutcome::Built(clip(3, 1.0)),
        ];
        let timeline = Timeline::sequence(outcomes, GEOMETRY, 24.0).unwrap();
        assert_eq!(timeline.scene_order(), vec![1, 3, 4]);
        assert_eq!(timeline.skipped(), 1);
        assert_eq!(timeline.duration(), 3.0);
    }

    #[test]
    fn test_equal_scene_indexes_keep_input_order() {
        let outcomes = vec![
            ClipOutcome::Built(clip(1, 1.0)),
            ClipOutcome::Built(clip(1, 2.0)),
            ClipOutcome::Built(clip(0, 3.0)),
        ];
        let timeline = Timeline::sequence(outcomes, GEOMETRY, 24.0).unwrap();
        let durations: Vec<f64> = timeline.spans().iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_frame_budget_within_one_frame() {
        let durations = [1.01, 2.37, 0.55, 4.2];
        let outcomes = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| ClipOutcome::Built(clip(i, d)))
            .collect();
        let timeline = Timeline::sequence(outcomes, GEOMETRY, 24.0).unwrap();

        let expected = durations.iter().sum::<f64>() * 24.0;
        assert!((timeline.total_frames() as f64 - expected).abs() <= 1.0);

        // Spans tile the frame range with no gaps
        let mut next = 0;
        for span in timeline.spans() {
            assert_eq!(span.first_frame, next);
            next += span.frame_count;
        }
    }

    #[test]
    fn test_tiny_clip_still_gets_a_frame() {
        let outcomes = vec![
            ClipOutcome::Built(clip(0, 1.0)),
            ClipOutcome::Built(clip(1, 0.01)),
            ClipOutcome::Built(clip(2, 1.0)),
        ];
        let timeline = Timeline::sequence(outcomes, GEOMETRY, 24.0).unwrap();

        assert!(timeline.spans().iter().all(|s| s.frame_count > 0));
        assert_eq!(timeline.spans()[1].frame_count, 1);
        assert_eq!(timeline.spans()[2].first_frame, 25);
        // The extra frame is taken back from the following clip
        assert_eq!(timeline.spans()[2].frame_count, 23);
        assert_eq!(timeline.total_frames(), 48);
    }

    #[test]
    fn test_empty_is_no_media() {
        let err = Timeline::sequence(vec![skipped(0), skipped(1)], GEOMETRY, 24.0).unwrap_err();
        assert!(err.is_no_media());

        let err = Timeline::sequence(Vec::new(), GEOMETRY, 24.0).unwrap_err();
        assert!(err.is_no_media());
    }

    #[test]
    fn test_geometry_mismatch_rejected() {
        let outcomes = vec![ClipOutcome::Built(clip(0, 1.0))];
        let err = Timeline::sequence(outcomes, FrameGeometry::new(16, 8), 24.0).unwrap_err();
        assert!(matches!(
            err,
            CompositorError::Composition(CompositionError::GeometryMismatch { scene: 0, .. })
        ));
    }

    #[test]
    fn test_scene_narration_offsets() {
        let narrated = clip(2, 3.0).with_narration(Some(ResolvedNarration {
            path: "vo2.wav".into(),
            duration: 3.0,
        }));
        let outcomes = vec![ClipOutcome::Built(clip(1, 2.5)), ClipOutcome::Built(narrated)];
        let timeline = Timeline::sequence(outcomes, GEOMETRY, 24.0).unwrap();

        let narrations = timeline.scene_narrations();
        assert_eq!(narrations.len(), 1);
        assert_eq!(narrations[0].scene_index, 2);
        assert_eq!(narrations[0].offset, 2.5);
    }
}
