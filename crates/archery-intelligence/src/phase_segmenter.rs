// ABOUTME: Five-phase shot segmentation over a pose frame stream with debounced transitions
// ABOUTME: A pure transition function drives the state machine; segments are scored and key-framed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Shot phase segmentation
//!
//! Frames are reduced to [`MotionSample`]s (draw-arm angle, its per-frame
//! change and angular velocity, draw-hand speed) and fed one at a time to
//! [`transition`]:
//!
//! | from        | to            | trigger                                                     |
//! |-------------|---------------|-------------------------------------------------------------|
//! | Preparation | Draw          | angle crosses the trigger and keeps moving in the draw direction for the debounce window |
//! | Draw        | Holding       | angular speed under the stillness threshold for the dwell time |
//! | Holding     | Release       | angular speed or hand speed spike                           |
//! | Release     | FollowThrough | the next frame                                              |
//! | FollowThrough | (stop)      | a frame starting at or past the follow-through limit        |
//!
//! The draw trigger is armed only once a frame on the rest side of the
//! trigger angle has been seen, so a stream that starts past it never draws.
//! The crossing frame must move in the draw direction; later frames may
//! drift back by the noise tolerance, but the angle must keep advancing at
//! least at the stillness speed since the crossing.
//!
//! A transition never begins on the first frame of the current phase, so no
//! segment is empty. A phase whose trigger never fires absorbs the rest of
//! the stream. Debounced transitions place the boundary where the sustained
//! condition began, not where it was confirmed.
//!
//! Each frame owns the span up to the next frame and the final frame owns
//! one more preceding interval, so segment durations add up to the analyzed
//! interval.

use crate::config::intelligence::{PhaseProfile, SegmentationConfig, StabilityMeasure};
use crate::config::IntelligenceConfig;
use crate::statistical_analysis::StatisticalAnalyzer;
use crate::archery_constants::segmentation::MIN_FRAMES;
use archery_core::constants::cancellation::FRAME_CHECK_INTERVAL;
use archery_core::errors::{AppError, AppResult};
use archery_core::models::{PhaseSegment, Point3, PoseFrame, ShotPhase, TrajectorySample};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Draw-arm kinematics at one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Position in the analysed stream
    pub position: usize,
    /// Seconds since the start of the video
    pub timestamp_secs: f64,
    /// Draw-arm joint angle, degrees
    pub draw_angle_deg: f64,
    /// Change in draw-arm angle since the previous frame, 0 on the first frame
    pub angle_delta_deg: f64,
    /// Draw-arm angular velocity, 0 on the first frame
    pub angular_velocity_deg_s: f64,
    /// Draw-hand speed, when the hand was confidently detected on both frames
    pub hand_speed: Option<f64>,
}

/// Start of a condition that must persist before a transition is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingTransition {
    /// Frame the condition started on
    pub start_frame: usize,
    /// Timestamp the condition started at
    pub start_time: f64,
    /// Draw-arm angle on the frame the condition started
    pub start_angle_deg: f64,
}

/// Segmenter state between samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmenterState {
    /// Current phase
    pub phase: ShotPhase,
    /// First frame of the current phase
    pub phase_start_frame: usize,
    /// Start time of the current phase
    pub phase_start_time: f64,
    /// Debounce or dwell timer, when a debounced trigger is being sustained
    pub pending: Option<PendingTransition>,
    /// A frame on the rest side of the draw trigger has been seen
    pub draw_armed: bool,
}

impl SegmenterState {
    /// Initial state: Preparation starting at `sample`
    #[must_use]
    pub const fn start(sample: &MotionSample) -> Self {
        Self {
            phase: ShotPhase::Preparation,
            phase_start_frame: sample.position,
            phase_start_time: sample.timestamp_secs,
            pending: None,
            draw_armed: false,
        }
    }

    const fn enter(phase: ShotPhase, start_frame: usize, start_time: f64) -> Self {
        Self {
            phase,
            phase_start_frame: start_frame,
            phase_start_time: start_time,
            pending: None,
            draw_armed: false,
        }
    }

    const fn with_pending(self, pending: Option<PendingTransition>) -> Self {
        Self { pending, ..self }
    }
}

/// Phase boundary emitted by a transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Phase that begins at the boundary
    pub phase: ShotPhase,
    /// First frame of the new phase
    pub start_frame: usize,
    /// Start time of the new phase
    pub start_time: f64,
}

/// Outcome of feeding one sample to the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// The sample belongs to the analysed interval
    Continue {
        /// State after the sample
        state: SegmenterState,
        /// Boundary opened by the sample, if any
        boundary: Option<Boundary>,
    },
    /// Follow-through limit reached: this and every later sample are excluded
    Finished,
}

/// Advance the segmenter by one sample
#[must_use]
pub fn transition(
    state: SegmenterState,
    sample: &MotionSample,
    config: &SegmentationConfig,
) -> Transition {
    let triggers = &config.triggers;
    // A phase keeps at least its first frame
    let can_leave = sample.position > state.phase_start_frame;

    let sustained = |holds: bool, window: f64, next: ShotPhase| -> Transition {
        if !(holds && can_leave) {
            return Transition::Continue {
                state: state.with_pending(None),
                boundary: None,
            };
        }
        let pending = state.pending.unwrap_or(PendingTransition {
            start_frame: sample.position,
            start_time: sample.timestamp_secs,
            start_angle_deg: sample.draw_angle_deg,
        });
        if sample.timestamp_secs - pending.start_time >= window {
            Transition::Continue {
                state: SegmenterState::enter(next, pending.start_frame, pending.start_time),
                boundary: Some(Boundary {
                    phase: next,
                    start_frame: pending.start_frame,
                    start_time: pending.start_time,
                }),
            }
        } else {
            Transition::Continue {
                state: state.with_pending(Some(pending)),
                boundary: None,
            }
        }
    };

    let immediate = |holds: bool, next: ShotPhase| -> Transition {
        if holds && can_leave {
            Transition::Continue {
                state: SegmenterState::enter(next, sample.position, sample.timestamp_secs),
                boundary: Some(Boundary {
                    phase: next,
                    start_frame: sample.position,
                    start_time: sample.timestamp_secs,
                }),
            }
        } else {
            Transition::Continue {
                state,
                boundary: None,
            }
        }
    };

    match state.phase {
        ShotPhase::Preparation => {
            let sign = config.draw_arm.draw_direction.sign();
            let past_trigger = (sample.draw_angle_deg - triggers.draw_trigger_angle_deg) * sign >= 0.0;
            if !past_trigger {
                return Transition::Continue {
                    state: SegmenterState {
                        draw_armed: true,
                        pending: None,
                        ..state
                    },
                    boundary: None,
                };
            }
            let forward = sample.angle_delta_deg * sign;
            let drawing = state.pending.map_or(forward > 0.0, |pending| {
                let elapsed = sample.timestamp_secs - pending.start_time;
                let progress = (sample.draw_angle_deg - pending.start_angle_deg) * sign;
                forward >= -triggers.angle_noise_tolerance_deg
                    && progress >= triggers.stillness_velocity_deg_s * elapsed
            });
            sustained(
                state.draw_armed && drawing,
                triggers.draw_debounce_secs,
                ShotPhase::Draw,
            )
        }
        ShotPhase::Draw => sustained(
            sample.angular_velocity_deg_s.abs() < triggers.stillness_velocity_deg_s,
            triggers.holding_dwell_secs,
            ShotPhase::Holding,
        ),
        ShotPhase::Holding => {
            let angular_spike =
                sample.angular_velocity_deg_s.abs() > triggers.release_angular_velocity_deg_s;
            let hand_spike = sample
                .hand_speed
                .is_some_and(|speed| speed > triggers.release_position_speed);
            immediate(angular_spike || hand_spike, ShotPhase::Release)
        }
        ShotPhase::Release => immediate(true, ShotPhase::FollowThrough),
        ShotPhase::FollowThrough => {
            if sample.timestamp_secs - state.phase_start_time >= triggers.max_follow_through_secs {
                Transition::Finished
            } else {
                Transition::Continue {
                    state,
                    boundary: None,
                }
            }
        }
    }
}

/// Segments, trajectory, and interval of one analysed frame stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationOutcome {
    /// Ordered, contiguous phase segments
    pub phases: Vec<PhaseSegment>,
    /// One sample per analysed frame
    pub trajectory: Vec<TrajectorySample>,
    /// Start of the analysed interval
    pub interval_start: f64,
    /// End of the analysed interval
    pub interval_end: f64,
    /// Frames excluded after the follow-through limit
    pub frames_trimmed: usize,
}

/// Splits a pose frame stream into scored shot phases
#[derive(Debug, Clone)]
pub struct PhaseSegmenter {
    config: SegmentationConfig,
}

impl Default for PhaseSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseSegmenter {
    /// Create a segmenter using the global configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IntelligenceConfig::global().segmentation.clone(),
        }
    }

    /// Create a segmenter with a custom configuration
    #[must_use]
    pub const fn with_config(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Segment a time-ordered frame stream
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for fewer than two frames, non-increasing
    /// timestamps, non-finite values, confidences outside `[0, 1]`, or a frame
    /// without a derivable draw-arm angle; `Cancelled` when `cancel` fires
    pub fn segment(
        &self,
        frames: &[PoseFrame],
        cancel: &CancellationToken,
    ) -> AppResult<SegmentationOutcome> {
        let samples = self.derive_samples(frames, cancel)?;
        let Some(first) = samples.first() else {
            return Err(AppError::invalid_input("No frames to segment"));
        };

        let mut state = SegmenterState::start(first);
        let mut boundaries = vec![Boundary {
            phase: ShotPhase::Preparation,
            start_frame: first.position,
            start_time: first.timestamp_secs,
        }];
        let mut analyzed = samples.len();

        for sample in &samples {
            if sample.position % FRAME_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(AppError::cancelled("Phase segmentation"));
            }
            match transition(state, sample, &self.config) {
                Transition::Continue { state: next, boundary } => {
                    state = next;
                    boundaries.extend(boundary);
                }
                Transition::Finished => {
                    analyzed = sample.position;
                    break;
                }
            }
        }

        let span_end = |position: usize| -> f64 {
            frames.get(position + 1).map_or_else(
                || {
                    let last = frames[position].timestamp_secs;
                    let previous = frames[position - 1].timestamp_secs;
                    last + (last - previous)
                },
                |next| next.timestamp_secs,
            )
        };
        let interval_start = frames[0].timestamp_secs;
        let interval_end = span_end(analyzed - 1);

        let trajectory = self.trajectory(&frames[..analyzed], &samples[..analyzed]);
        let phases = boundaries
            .iter()
            .enumerate()
            .map(|(index, boundary)| {
                let next = boundaries.get(index + 1);
                let end_frame = next.map_or(analyzed - 1, |b| b.start_frame - 1);
                let end_time = next.map_or(interval_end, |b| b.start_time);
                self.build_segment(
                    boundary,
                    end_frame,
                    end_time,
                    &frames[..analyzed],
                    &samples[..analyzed],
                )
            })
            .collect::<Vec<_>>();

        debug!(
            frames = frames.len(),
            analyzed,
            phases = phases.len(),
            "Segmented pose stream"
        );

        Ok(SegmentationOutcome {
            phases,
            trajectory,
            interval_start,
            interval_end,
            frames_trimmed: frames.len() - analyzed,
        })
    }

    /// Reduce frames to draw-arm kinematics, validating the stream
    ///
    /// # Errors
    ///
    /// See [`PhaseSegmenter::segment`]
    pub fn derive_samples(
        &self,
        frames: &[PoseFrame],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MotionSample>> {
        if frames.len() < MIN_FRAMES {
            return Err(AppError::invalid_input(format!(
                "Motion analysis needs at least {MIN_FRAMES} frames, got {}",
                frames.len()
            )));
        }

        let mut samples: Vec<MotionSample> = Vec::with_capacity(frames.len());
        let mut previous_hand: Option<Point3> = None;

        for (position, frame) in frames.iter().enumerate() {
            if position % FRAME_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(AppError::cancelled("Phase segmentation"));
            }
            validate_frame(frame)?;

            let draw_angle_deg = self.draw_angle(frame)?;
            let hand = self.confident_position(frame, &self.config.draw_arm.hand_keypoint);

            let sample = match samples.last() {
                None => MotionSample {
                    position,
                    timestamp_secs: frame.timestamp_secs,
                    draw_angle_deg,
                    angle_delta_deg: 0.0,
                    angular_velocity_deg_s: 0.0,
                    hand_speed: None,
                },
                Some(prev) => {
                    let dt = frame.timestamp_secs - prev.timestamp_secs;
                    if dt <= 0.0 {
                        return Err(AppError::invalid_input(format!(
                            "Frame timestamps must strictly increase: frame {} at {}s follows {}s",
                            frame.frame_index, frame.timestamp_secs, prev.timestamp_secs
                        )));
                    }
                    let angle_delta_deg = draw_angle_deg - prev.draw_angle_deg;
                    MotionSample {
                        position,
                        timestamp_secs: frame.timestamp_secs,
                        draw_angle_deg,
                        angle_delta_deg,
                        angular_velocity_deg_s: angle_delta_deg / dt,
                        hand_speed: previous_hand
                            .zip(hand)
                            .map(|(from, to)| from.distance_to(to) / dt),
                    }
                }
            };
            samples.push(sample);
            previous_hand = hand;
        }
        Ok(samples)
    }

    /// Named draw-arm angle, or the angle at the middle of the configured keypoints
    fn draw_angle(&self, frame: &PoseFrame) -> AppResult<f64> {
        let arm = &self.config.draw_arm;
        if let Some(angle) = frame.angle(&arm.angle_name) {
            return Ok(angle.degrees);
        }

        let [a, vertex, c] = &arm.keypoints;
        let (Some(a), Some(vertex), Some(c)) =
            (frame.keypoint(a), frame.keypoint(vertex), frame.keypoint(c))
        else {
            return Err(AppError::invalid_input(format!(
                "Frame {} has neither the '{}' angle nor its keypoints",
                frame.frame_index, arm.angle_name
            )));
        };
        vertex_angle(a.position, vertex.position, c.position).ok_or_else(|| {
            AppError::invalid_input(format!(
                "Frame {} has coincident '{}' keypoints",
                frame.frame_index, arm.angle_name
            ))
        })
    }

    fn confident_position(&self, frame: &PoseFrame, name: &str) -> Option<Point3> {
        frame
            .keypoint(name)
            .filter(|keypoint| keypoint.confidence >= self.config.min_keypoint_confidence)
            .map(|keypoint| keypoint.position)
    }

    /// Named angle on `frame`, falling back to the draw-arm angle
    fn angle_or_draw(frame: &PoseFrame, name: Option<&str>, sample: &MotionSample) -> f64 {
        name.and_then(|name| frame.angle(name))
            .map_or(sample.draw_angle_deg, |angle| angle.degrees)
    }

    fn trajectory(&self, frames: &[PoseFrame], samples: &[MotionSample]) -> Vec<TrajectorySample> {
        frames
            .iter()
            .zip(samples)
            .map(|(frame, sample)| TrajectorySample {
                frame: sample.position,
                timestamp_secs: sample.timestamp_secs,
                position: self.confident_position(frame, &self.config.draw_arm.hand_keypoint),
                aiming_angle_deg: Self::angle_or_draw(
                    frame,
                    Some(&self.config.aiming_angle_name),
                    sample,
                ),
            })
            .collect()
    }

    fn build_segment(
        &self,
        boundary: &Boundary,
        end_frame: usize,
        end_time: f64,
        frames: &[PoseFrame],
        samples: &[MotionSample],
    ) -> PhaseSegment {
        let range = boundary.start_frame..=end_frame;
        let duration = end_time - boundary.start_time;
        let score = self.config.scoring.profile(boundary.phase).map_or(0.0, |profile| {
            self.phase_score(profile, duration, &frames[range.clone()], &samples[range])
        });

        PhaseSegment {
            phase: boundary.phase,
            start_frame: boundary.start_frame,
            end_frame,
            start_time: boundary.start_time,
            end_time,
            duration,
            score,
            key_frames: key_frames(
                boundary.start_frame,
                end_frame,
                self.config.key_frames_per_phase,
            ),
        }
    }

    /// `w * stability + (1 - w) * duration fit`, in `[0, 100]`
    fn phase_score(
        &self,
        profile: &PhaseProfile,
        duration: f64,
        frames: &[PoseFrame],
        samples: &[MotionSample],
    ) -> f64 {
        let scoring = &self.config.scoring;
        let (values, scale): (Vec<f64>, f64) = match profile.measure {
            StabilityMeasure::AngleVariance => (
                frames
                    .iter()
                    .zip(samples)
                    .map(|(frame, sample)| {
                        Self::angle_or_draw(frame, profile.dominant_angle.as_deref(), sample)
                    })
                    .collect(),
                scoring.angle_variance_scale,
            ),
            StabilityMeasure::VelocityVariance => (
                samples.iter().map(|s| s.angular_velocity_deg_s).collect(),
                scoring.velocity_variance_scale,
            ),
        };
        let variance = StatisticalAnalyzer::variance(&values).unwrap_or(0.0);
        let stability = 100.0 / (1.0 + variance / scale);
        let fit = duration_fit(
            duration,
            profile.reference_min_secs,
            profile.reference_max_secs,
        );

        scoring
            .stability_weight
            .mul_add(stability, (1.0 - scoring.stability_weight) * fit)
            .clamp(0.0, 100.0)
    }
}

fn validate_frame(frame: &PoseFrame) -> AppResult<()> {
    if !frame.timestamp_secs.is_finite() {
        return Err(AppError::invalid_input(format!(
            "Frame {} has a non-finite timestamp",
            frame.frame_index
        )));
    }
    for keypoint in &frame.keypoints {
        if !keypoint.position.is_finite() {
            return Err(AppError::invalid_input(format!(
                "Keypoint '{}' in frame {} is not finite",
                keypoint.name, frame.frame_index
            )));
        }
        if !(0.0..=1.0).contains(&keypoint.confidence) {
            return Err(AppError::invalid_input(format!(
                "Keypoint '{}' in frame {} has confidence {} outside [0, 1]",
                keypoint.name, frame.frame_index, keypoint.confidence
            )));
        }
    }
    if let Some(angle) = frame.angles.iter().find(|angle| !angle.degrees.is_finite()) {
        return Err(AppError::invalid_input(format!(
            "Angle '{}' in frame {} is not finite",
            angle.name, frame.frame_index
        )));
    }
    Ok(())
}

/// Angle at `vertex` between the rays to `a` and `c`, degrees in `[0, 180]`
fn vertex_angle(a: Point3, vertex: Point3, c: Point3) -> Option<f64> {
    let u = (a.x - vertex.x, a.y - vertex.y, a.z - vertex.z);
    let v = (c.x - vertex.x, c.y - vertex.y, c.z - vertex.z);
    let norms = a.distance_to(vertex) * c.distance_to(vertex);
    if norms <= f64::EPSILON {
        return None;
    }
    let dot = u.2.mul_add(v.2, u.0.mul_add(v.0, u.1 * v.1));
    Some((dot / norms).clamp(-1.0, 1.0).acos().to_degrees())
}

/// 100 inside `[min, max]`, decaying linearly to 0 at zero duration and at twice `max`
fn duration_fit(duration: f64, min: f64, max: f64) -> f64 {
    if duration < min {
        100.0 * duration / min
    } else if duration > max {
        if max <= 0.0 {
            0.0
        } else {
            (100.0 * (1.0 - (duration - max) / max)).max(0.0)
        }
    } else {
        100.0
    }
}

/// Evenly spaced frame positions in `[start, end]`
fn key_frames(start: usize, end: usize, count: usize) -> Vec<usize> {
    let len = end - start + 1;
    if len <= count {
        return (start..=end).collect();
    }
    if count == 1 {
        return vec![start + (len - 1) / 2];
    }
    (0..count)
        .map(|i| start + i * (len - 1) / (count - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_frames_are_evenly_spaced_and_bounded() {
        assert_eq!(key_frames(10, 19, 3), vec![10, 14, 19]);
        assert_eq!(key_frames(0, 1, 3), vec![0, 1]);
        assert_eq!(key_frames(4, 8, 1), vec![6]);
    }

    #[test]
    fn duration_fit_decays_outside_reference_range() {
        assert!((duration_fit(2.0, 1.0, 3.0) - 100.0).abs() < f64::EPSILON);
        assert!((duration_fit(0.5, 1.0, 3.0) - 50.0).abs() < 1e-9);
        assert!((duration_fit(4.5, 1.0, 3.0) - 50.0).abs() < 1e-9);
        assert!(duration_fit(9.0, 1.0, 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn vertex_angle_of_right_angle() {
        let angle = vertex_angle(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert!(angle.is_some_and(|a| (a - 90.0).abs() < 1e-9));
    }
}
