//! Animated metaball field.
//!
//! Each ball contributes `r^2 / |p - c|^2`; the field is the sum of all
//! contributions minus one, so a lone ball's surface is the sphere of radius `r`
//! and nearby balls blend into each other.

use crate::{
    field::{Aabb, ScalarField},
    types::{Point, Value, Vector},
};

/// Squared distances are clamped to this so a sample at a centre stays finite.
const MIN_DISTANCE_SQUARED: Value = 1e-8;

/// One blob of a [`MetaBallField`].
///
/// The centre oscillates around `anchor`:
/// ```text
/// center(t) = anchor + amplitude * sin(frequency * t + phase)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MetaBall {
    pub anchor: Point,
    pub radius: Value,
    pub amplitude: Vector,
    /// Angular frequency, radians per unit of field time.
    pub frequency: Value,
    pub phase: Value,
    center: Point,
}

impl MetaBall {
    /// A ball resting at `anchor`.
    pub fn new(anchor: Point, radius: Value) -> Self {
        Self {
            anchor,
            radius,
            amplitude: Vector::zeros(),
            frequency: 0.0,
            phase: 0.0,
            center: anchor,
        }
    }

    /// Makes the ball oscillate along `amplitude`.
    pub fn with_motion(mut self, amplitude: Vector, frequency: Value, phase: Value) -> Self {
        self.amplitude = amplitude;
        self.frequency = frequency;
        self.phase = phase;
        self.center = self.position_at(0.0);
        self
    }

    /// Current centre.
    pub fn center(&self) -> Point {
        self.center
    }

    fn position_at(&self, time: Value) -> Point {
        self.anchor + self.amplitude * (self.frequency * time + self.phase).sin()
    }

    #[inline]
    fn contribution(&self, p: &Point) -> Value {
        let d2 = (p - self.center).norm_squared().max(MIN_DISTANCE_SQUARED);
        self.radius * self.radius / d2
    }
}

/// Sum of [`MetaBall`]s, positive inside the blended surface.
///
/// [`update`](ScalarField::update) advances the internal clock by `time_step`
/// and moves every ball along its motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaBallField {
    pub balls: Vec<MetaBall>,
    pub time_step: Value,
    time: Value,
}

impl Default for MetaBallField {
    fn default() -> Self {
        Self {
            balls: Vec::new(),
            time_step: 1.0 / 60.0,
            time: 0.0,
        }
    }
}

impl MetaBallField {
    pub fn new(balls: Vec<MetaBall>) -> Self {
        Self {
            balls,
            ..Default::default()
        }
    }

    /// Sets how far the clock advances per [`update`](ScalarField::update).
    pub fn with_time_step(mut self, time_step: Value) -> Self {
        self.time_step = time_step;
        self
    }

    /// Three balls drifting through each other, the classic demo scene.
    pub fn demo() -> Self {
        Self::new(vec![
            MetaBall::new(Point::new(-0.6, 0.0, 0.0), 0.5).with_motion(
                Vector::new(0.6, 0.2, 0.0),
                1.3,
                0.0,
            ),
            MetaBall::new(Point::new(0.6, 0.0, 0.0), 0.45).with_motion(
                Vector::new(-0.5, 0.0, 0.3),
                0.9,
                1.0,
            ),
            MetaBall::new(Point::new(0.0, 0.5, 0.0), 0.35).with_motion(
                Vector::new(0.0, -0.6, 0.2),
                1.7,
                2.0,
            ),
        ])
    }

    /// Elapsed field time.
    pub fn time(&self) -> Value {
        self.time
    }
}

impl ScalarField for MetaBallField {
    fn value(&self, p: &Point) -> Value {
        self.balls.iter().map(|b| b.contribution(p)).sum::<Value>() - 1.0
    }

    /// Beyond `sqrt(Σ r^2)` from every centre the sum drops below one, so the
    /// union of those boxes holds the whole positive region.
    fn bounds(&self) -> Aabb {
        let reach = self
            .balls
            .iter()
            .map(|b| b.radius * b.radius)
            .sum::<Value>()
            .sqrt();

        self.balls
            .iter()
            .map(|b| Aabb::around(b.center, reach))
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or(Aabb::new(Point::origin(), Point::origin()))
    }

    fn update(&mut self) {
        self.time += self.time_step;
        let time = self.time;
        for ball in &mut self.balls {
            ball.center = ball.position_at(time);
        }
    }
}
