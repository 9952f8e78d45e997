use crate::types::{CompiledFunction, Point, Value, Vector};

/// Axis-aligned box bounding the region where a field can be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Returns the box of half-extent `radius` around `center`.
    ///
    /// ```text
    ///  min = center - radius
    ///  max = center + radius
    /// ```
    pub fn around(center: Point, radius: Value) -> Self {
        let r = Vector::repeat(radius);
        Self {
            min: center - r,
            max: center + r,
        }
    }

    pub fn min_x(&self) -> Value {
        self.min.x
    }

    pub fn max_x(&self) -> Value {
        self.max.x
    }

    pub fn min_y(&self) -> Value {
        self.min.y
    }

    pub fn max_y(&self) -> Value {
        self.max.y
    }

    pub fn min_z(&self) -> Value {
        self.min.z
    }

    pub fn max_z(&self) -> Value {
        self.max.z
    }

    /// `true` when `max <= min` on any axis (or a bound is NaN).
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| !(self.max[axis] > self.min[axis]))
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grows the box by `margin` on every side.
    pub fn padded(&self, margin: Value) -> Aabb {
        let m = Vector::repeat(margin);
        Aabb {
            min: self.min - m,
            max: self.max + m,
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        (0..3).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }
}

/// A scalar field whose zero-level-set is tessellated.
///
/// Values **strictly above** zero are "inside". The builder calls [`update`](ScalarField::update)
/// exactly once per build, before any sampling, so every sample of one build sees the
/// same field state.
pub trait ScalarField {
    /// Evaluates the field at `p`.
    fn value(&self, p: &Point) -> Value;

    /// Box outside of which the field is never positive.
    fn bounds(&self) -> Aabb;

    /// Advances the field's own state, e.g. moves its sources. No-op by default.
    fn update(&mut self) {}
}

impl<T: ScalarField + ?Sized> ScalarField for Box<T> {
    fn value(&self, p: &Point) -> Value {
        (**self).value(p)
    }

    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }

    fn update(&mut self) {
        (**self).update()
    }
}

/// A static field backed by a closure and fixed bounds.
pub struct FunctionField {
    function: Box<CompiledFunction>,
    bounds: Aabb,
}

impl FunctionField {
    pub fn new<F>(bounds: Aabb, function: F) -> Self
    where
        F: Fn(Point) -> Value + Send + Sync + 'static,
    {
        Self {
            function: Box::new(function),
            bounds,
        }
    }
}

impl ScalarField for FunctionField {
    fn value(&self, p: &Point) -> Value {
        (self.function)(*p)
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// `F(p) = R^2 - |p - c|^2`: positive inside a sphere of radius `R` around `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereField {
    pub center: Point,
    pub radius: Value,
}

impl SphereField {
    pub fn new(center: Point, radius: Value) -> Self {
        Self { center, radius }
    }
}

impl ScalarField for SphereField {
    fn value(&self, p: &Point) -> Value {
        self.radius * self.radius - (p - self.center).norm_squared()
    }

    fn bounds(&self) -> Aabb {
        Aabb::around(self.center, self.radius)
    }
}
