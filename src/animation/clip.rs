//! Keyframe tracks and clips.

use glam::{Quat, Vec3};

/// How values between keyframes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Lerp for vectors, slerp for rotations.
    #[default]
    Linear,
    /// Hold the previous keyframe.
    Step,
    /// Hermite spline; values are stored as (in-tangent, value,
    /// out-tangent) triplets per keyframe.
    CubicSpline,
}

/// Keyframe values of one animated property.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    /// Node translation.
    Translation(Vec<Vec3>),
    /// Node rotation.
    Rotation(Vec<Quat>),
    /// Node scale.
    Scale(Vec<Vec3>),
}

/// One sampled property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    /// Node translation.
    Translation(Vec3),
    /// Node rotation.
    Rotation(Quat),
    /// Node scale.
    Scale(Vec3),
}

/// Keyframes for a single property of a single model node.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Index of the animated node within the loaded model.
    pub target: usize,
    /// Ascending keyframe times in seconds.
    pub times: Vec<f32>,
    /// Keyframe values (three per keyframe for cubic splines).
    pub values: TrackValues,
    /// Interpolation mode.
    pub interpolation: Interpolation,
}

/// Location of `t` between two keyframes.
struct Span {
    lo: usize,
    hi: usize,
    /// Normalised position between `lo` and `hi`.
    s: f32,
    /// Seconds between `lo` and `hi`.
    dt: f32,
}

impl Track {
    /// Time of the last keyframe.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    fn span(&self, t: f32) -> Option<Span> {
        let first = *self.times.first()?;
        let last = *self.times.last()?;
        if t <= first || self.times.len() == 1 {
            return Some(Span {
                lo: 0,
                hi: 0,
                s: 0.0,
                dt: 0.0,
            });
        }
        let end = self.times.len() - 1;
        if t >= last {
            return Some(Span {
                lo: end,
                hi: end,
                s: 0.0,
                dt: 0.0,
            });
        }
        // First keyframe strictly after t.
        let hi = self.times.partition_point(|&k| k <= t).min(end);
        let lo = hi - 1;
        let dt = self.times[hi] - self.times[lo];
        let s = if dt > 0.0 {
            (t - self.times[lo]) / dt
        } else {
            0.0
        };
        Some(Span { lo, hi, s, dt })
    }

    /// Sample the track at `t` seconds, clamping outside the key range.
    #[must_use]
    pub fn sample(&self, t: f32) -> Option<TrackValue> {
        let span = self.span(t)?;
        let value = match &self.values {
            TrackValues::Translation(v) => {
                TrackValue::Translation(self.sample_vec3(v, &span)?)
            }
            TrackValues::Scale(v) => {
                TrackValue::Scale(self.sample_vec3(v, &span)?)
            }
            TrackValues::Rotation(v) => {
                TrackValue::Rotation(self.sample_quat(v, &span)?)
            }
        };
        Some(value)
    }

    fn sample_vec3(&self, values: &[Vec3], span: &Span) -> Option<Vec3> {
        match self.interpolation {
            Interpolation::Step => values.get(span.lo).copied(),
            Interpolation::Linear => {
                let a = *values.get(span.lo)?;
                let b = *values.get(span.hi)?;
                Some(a.lerp(b, span.s))
            }
            Interpolation::CubicSpline => {
                let p0 = *values.get(span.lo * 3 + 1)?;
                let m0 = *values.get(span.lo * 3 + 2)?;
                let p1 = *values.get(span.hi * 3 + 1)?;
                let m1 = *values.get(span.hi * 3)?;
                let [h00, h10, h01, h11] = hermite(span.s);
                Some(
                    p0 * h00
                        + m0 * (h10 * span.dt)
                        + p1 * h01
                        + m1 * (h11 * span.dt),
                )
            }
        }
    }

    fn sample_quat(&self, values: &[Quat], span: &Span) -> Option<Quat> {
        match self.interpolation {
            Interpolation::Step => values.get(span.lo).copied(),
            Interpolation::Linear => {
                let a = *values.get(span.lo)?;
                let b = *values.get(span.hi)?;
                Some(a.slerp(b, span.s))
            }
            Interpolation::CubicSpline => {
                let p0 = *values.get(span.lo * 3 + 1)?;
                let m0 = *values.get(span.lo * 3 + 2)?;
                let p1 = *values.get(span.hi * 3 + 1)?;
                let m1 = *values.get(span.hi * 3)?;
                let [h00, h10, h01, h11] = hermite(span.s);
                let q = p0 * h00
                    + m0 * (h10 * span.dt)
                    + p1 * h01
                    + m1 * (h11 * span.dt);
                Some(q.normalize())
            }
        }
    }
}

/// Cubic Hermite basis at `s`.
fn hermite(s: f32) -> [f32; 4] {
    let s2 = s * s;
    let s3 = s2 * s;
    [
        2.0 * s3 - 3.0 * s2 + 1.0,
        s3 - 2.0 * s2 + s,
        -2.0 * s3 + 3.0 * s2,
        s3 - s2,
    ]
}

/// A named set of tracks played together.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    /// Clip name from the asset (may be empty).
    pub name: String,
    /// Length in seconds: the latest keyframe of any track.
    pub duration: f32,
    /// Property tracks.
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Build a clip; the duration is derived from the tracks.
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::duration).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation_track(interpolation: Interpolation) -> Track {
        Track {
            target: 0,
            times: vec![0.0, 1.0, 3.0],
            values: TrackValues::Translation(vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(3.0, 0.0, 0.0),
            ]),
            interpolation,
        }
    }

    #[test]
    fn linear_interpolates_between_keys() {
        let track = translation_track(Interpolation::Linear);
        assert_eq!(
            track.sample(0.5),
            Some(TrackValue::Translation(Vec3::new(0.5, 0.0, 0.0)))
        );
        assert_eq!(
            track.sample(2.0),
            Some(TrackValue::Translation(Vec3::new(2.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn samples_clamp_outside_key_range() {
        let track = translation_track(Interpolation::Linear);
        assert_eq!(track.sample(-1.0), Some(TrackValue::Translation(Vec3::ZERO)));
        assert_eq!(
            track.sample(10.0),
            Some(TrackValue::Translation(Vec3::new(3.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn step_holds_previous_key() {
        let track = translation_track(Interpolation::Step);
        assert_eq!(track.sample(0.99), Some(TrackValue::Translation(Vec3::ZERO)));
        assert_eq!(track.sample(1.0), Some(TrackValue::Translation(Vec3::X)));
    }

    #[test]
    fn rotation_slerps_and_stays_unit() {
        let track = Track {
            target: 0,
            times: vec![0.0, 1.0],
            values: TrackValues::Rotation(vec![
                Quat::IDENTITY,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ]),
            interpolation: Interpolation::Linear,
        };
        let Some(TrackValue::Rotation(q)) = track.sample(0.5) else {
            panic!("expected a rotation");
        };
        assert!(q.is_normalized());
        assert!(q.abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4), 1e-5));
    }

    #[test]
    fn cubic_spline_hits_keyframe_values() {
        let track = Track {
            target: 0,
            times: vec![0.0, 2.0],
            // (in, value, out) per key; zero tangents.
            values: TrackValues::Scale(vec![
                Vec3::ZERO,
                Vec3::ONE,
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::splat(3.0),
                Vec3::ZERO,
            ]),
            interpolation: Interpolation::CubicSpline,
        };
        assert_eq!(track.sample(0.0), Some(TrackValue::Scale(Vec3::ONE)));
        assert_eq!(track.sample(2.0), Some(TrackValue::Scale(Vec3::splat(3.0))));
        let Some(TrackValue::Scale(mid)) = track.sample(1.0) else {
            panic!("expected a scale");
        };
        assert!((mid - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn clip_duration_is_longest_track() {
        let mut short = translation_track(Interpolation::Linear);
        short.times = vec![0.0, 0.5, 1.0];
        let clip = AnimationClip::new(
            "walk",
            vec![short, translation_track(Interpolation::Linear)],
        );
        assert_eq!(clip.duration, 3.0);
    }

    #[test]
    fn empty_track_samples_nothing() {
        let track = Track {
            target: 0,
            times: Vec::new(),
            values: TrackValues::Translation(Vec::new()),
            interpolation: Interpolation::Linear,
        };
        assert_eq!(track.sample(0.0), None);
    }
}
