use foundation::math::Vec2;
use foundation::time::Time;
use serde::{Deserialize, Serialize};

/// Scale-then-translate camera transform: `screen = world * k + (x, y)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn interpolate(&self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            k: self.k + (to.k - self.k) * t,
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn approx_eq(&self, other: &Self) -> bool {
        const EPS: f64 = 1e-6;
        (self.k - other.k).abs() < EPS
            && (self.x - other.x).abs() < EPS
            && (self.y - other.y).abs() < EPS
    }

    /// Value for an SVG `transform` attribute.
    pub fn to_svg_attr(&self) -> String {
        format!("translate({:.3},{:.3}) scale({:.5})", self.x, self.y, self.k)
    }
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Render-surface side of the camera.
///
/// The camera pushes its transform through this on every animation tick, so
/// the surface does not need to diff anything to follow the animation.
pub trait TransformSink {
    fn apply_transform(&mut self, transform: &ViewTransform);
}

/// Sink that keeps the latest value of an SVG `transform` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvgTransformAttr(pub String);

impl TransformSink for SvgTransformAttr {
    fn apply_transform(&mut self, transform: &ViewTransform) {
        self.0 = transform.to_svg_attr();
    }
}

impl TransformSink for Vec<ViewTransform> {
    fn apply_transform(&mut self, transform: &ViewTransform) {
        self.push(*transform);
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Animation {
    from: ViewTransform,
    to: ViewTransform,
    start: Time,
    duration_ms: u64,
}

impl Animation {
    fn sample(&self, now: Time) -> (ViewTransform, bool) {
        if self.duration_ms == 0 {
            return (self.to, true);
        }
        let t = now.since(self.start) as f64 / self.duration_ms as f64;
        if t >= 1.0 {
            return (self.to, true);
        }
        (self.from.interpolate(&self.to, ease_cubic_in_out(t)), false)
    }
}

/// Owns the map transform and its (single) in-flight animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    current: ViewTransform,
    animation: Option<Animation>,
    duration_ms: u64,
}

impl Camera {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            current: ViewTransform::IDENTITY,
            animation: None,
            duration_ms,
        }
    }

    pub fn current(&self) -> ViewTransform {
        self.current
    }

    /// Where the camera is heading (or resting).
    pub fn destination(&self) -> ViewTransform {
        self.animation.map(|a| a.to).unwrap_or(self.current)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Starts (or retargets) an animation from wherever the camera is at `now`.
    pub fn animate_to(&mut self, target: ViewTransform, now: Time) {
        if let Some(anim) = self.animation {
            self.current = anim.sample(now).0;
        }
        self.animation = Some(Animation {
            from: self.current,
            to: target,
            start: now,
            duration_ms: self.duration_ms,
        });
    }

    /// Advances the animation to `now` and writes the transform to `sink`.
    ///
    /// Returns `true` while the animation is still running.
    pub fn advance(&mut self, now: Time, sink: &mut dyn TransformSink) -> bool {
        let Some(anim) = self.animation else {
            return false;
        };
        let (transform, done) = anim.sample(now);
        self.current = transform;
        if done {
            self.animation = None;
        }
        sink.apply_transform(&self.current);
        !done
    }
}
