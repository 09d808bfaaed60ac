use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point (or vector) in scene space. `z` points out of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub const ORIGIN: Point3 = Point3::new(0.0, 0.0, 0.0);
pub const UP: Point3 = Point3::new(0.0, 1.0, 0.0);
pub const DOWN: Point3 = Point3::new(0.0, -1.0, 0.0);
pub const LEFT: Point3 = Point3::new(-1.0, 0.0, 0.0);
pub const RIGHT: Point3 = Point3::new(1.0, 0.0, 0.0);
pub const OUT: Point3 = Point3::new(0.0, 0.0, 1.0);
pub const IN: Point3 = Point3::new(0.0, 0.0, -1.0);
pub const UL: Point3 = Point3::new(-1.0, 1.0, 0.0);
pub const UR: Point3 = Point3::new(1.0, 1.0, 0.0);
pub const DL: Point3 = Point3::new(-1.0, -1.0, 0.0);
pub const DR: Point3 = Point3::new(1.0, -1.0, 0.0);

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        ORIGIN
    }

    /// Linear interpolation between two points.
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        Point3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub fn dot(&self, other: &Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(&self) -> Point3 {
        let n = self.norm();
        if n == 0.0 {
            *self
        } else {
            *self * (1.0 / n)
        }
    }

    /// Rotate about the `z` axis through the origin.
    pub fn rotate_z(&self, angle: f64) -> Point3 {
        let (s, c) = angle.sin_cos();
        Point3 {
            x: c * self.x - s * self.y,
            y: s * self.x + c * self.y,
            z: self.z,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Point3 {
    fn add_assign(&mut self, rhs: Point3) {
        *self = *self + rhs;
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;
    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Point3 {
    type Output = Point3;
    fn neg(self) -> Point3 {
        self * -1.0
    }
}

/// Axis-aligned bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds {
    /// Bounds of `points`, or `None` when there are none.
    pub fn of<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Bounds> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min = Point3::new(
                bounds.min.x.min(p.x),
                bounds.min.y.min(p.y),
                bounds.min.z.min(p.z),
            );
            bounds.max = Point3::new(
                bounds.max.x.max(p.x),
                bounds.max.y.max(p.y),
                bounds.max.z.max(p.z),
            );
        }
        Some(bounds)
    }

    pub fn center(&self) -> Point3 {
        self.min.lerp(&self.max, 0.5)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The point of the box furthest along `direction` on each axis
    /// (`RIGHT` gives the middle of the right edge, `UR` the top-right corner).
    pub fn critical_point(&self, direction: Point3) -> Point3 {
        let pick = |d: f64, lo: f64, hi: f64| {
            if d > 0.0 {
                hi
            } else if d < 0.0 {
                lo
            } else {
                (lo + hi) / 2.0
            }
        };
        Point3::new(
            pick(direction.x, self.min.x, self.max.x),
            pick(direction.y, self.min.y, self.max.y),
            pick(direction.z, self.min.z, self.max.z),
        )
    }
}

/// Row-major 3x3 matrix acting on column vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3(pub [[f64; 3]; 3]);

impl Matrix3 {
    pub fn identity() -> Self {
        Matrix3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Embed a 2x2 matrix acting on the xy plane.
    pub fn from_2x2(m: [[f64; 2]; 2]) -> Self {
        Matrix3([
            [m[0][0], m[0][1], 0.0],
            [m[1][0], m[1][1], 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    pub fn apply(&self, p: Point3) -> Point3 {
        let m = &self.0;
        Point3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z,
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z,
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z,
        )
    }
}

impl From<[[f64; 2]; 2]> for Matrix3 {
    fn from(m: [[f64; 2]; 2]) -> Self {
        Matrix3::from_2x2(m)
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(m: [[f64; 3]; 3]) -> Self {
        Matrix3(m)
    }
}

/// Complex number used to treat the xy plane as ℂ.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn from_point(p: Point3) -> Self {
        Self::new(p.x, p.y)
    }

    pub fn to_point(self, z: f64) -> Point3 {
        Point3::new(self.re, self.im, z)
    }

    pub fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }

    pub fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }

    pub fn powi(self, n: u32) -> Complex {
        (0..n).fold(Complex::new(1.0, 0.0), |acc, _| acc.mul(self))
    }

    pub fn exp(self) -> Complex {
        let scale = self.re.exp();
        let (s, c) = self.im.sin_cos();
        Complex::new(scale * c, scale * s)
    }
}

/// Position of a point travelling from `start` to `end` along a circular arc
/// of angle `arc` (radians, counter-clockwise about `OUT`), at progress `t`.
///
/// An arc of zero is a straight line. The arc lies in the xy plane; z moves
/// linearly.
pub fn path_along_arc(start: Point3, end: Point3, arc: f64, t: f64) -> Point3 {
    if arc.abs() < 1e-9 {
        return start.lerp(&end, t);
    }
    let z = start.z + (end.z - start.z) * t;
    let (start, end) = (
        Point3::new(start.x, start.y, 0.0),
        Point3::new(end.x, end.y, 0.0),
    );
    let half = (end - start) * 0.5;
    let mut center = start + half;
    if (arc.abs() - std::f64::consts::PI).abs() > 1e-9 {
        center += OUT.cross(&half) * (1.0 / (arc / 2.0).tan());
    }
    let p = center + (start - center).rotate_z(arc * t);
    Point3::new(p.x, p.y, z)
}
