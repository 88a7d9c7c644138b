//! 2D points in Cartesian (`Complex`) and polar (`Polar`) form.
//!
//! Both forms are plain `Copy` values. `Position` stores one of the two and converts on the way in
//! and out, so a node laid out in polar coordinates stays polar when a Cartesian value is written
//! into it (and vice versa).

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

const TAU: f64 = 2.0 * PI;

/// Normalizes an angle into `[0, 2π)`.
pub fn normalize_angle(theta: f64) -> f64 {
    let t = theta % TAU;
    if t < 0.0 { t + TAU } else { t }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub x: f64,
    pub y: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_polar(self) -> Polar {
        let rho = self.norm();
        let theta = normalize_angle(self.y.atan2(self.x));
        Polar { theta, rho }
    }

    pub fn norm(self) -> f64 {
        self.squared_norm().sqrt()
    }

    pub fn squared_norm(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.x, -self.y)
    }

    pub fn prod(self, other: Complex) -> Self {
        Self::new(
            self.x * other.x - self.y * other.y,
            self.y * other.x + self.x * other.y,
        )
    }

    /// Complex division. Dividing by zero yields non-finite components.
    pub fn div(self, other: Complex) -> Self {
        let d = other.squared_norm();
        Self::new(
            (self.x * other.x + self.y * other.y) / d,
            (self.y * other.x - self.x * other.y) / d,
        )
    }

    /// Disk automorphism `(z + c) / (1 + conj(c) z)`.
    ///
    /// Translations with `|c| >= 1` would leave the unit disk; they leave the point unchanged.
    pub fn moebius(self, c: Complex) -> Self {
        if c.squared_norm() >= 1.0 {
            return self;
        }
        let num = self + c;
        let den = Complex::new(1.0, 0.0) + c.conjugate().prod(self);
        num.div(den)
    }

    pub fn equals(self, other: Complex) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        self.scale(-1.0)
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;

    fn mul(self, rhs: f64) -> Complex {
        self.scale(rhs)
    }
}

/// Polar coordinates; `theta` is kept in `[0, 2π)` by the constructors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Polar {
    pub theta: f64,
    pub rho: f64,
}

impl Polar {
    pub const ORIGIN: Polar = Polar {
        theta: 0.0,
        rho: 0.0,
    };

    pub fn new(theta: f64, rho: f64) -> Self {
        Self {
            theta: normalize_angle(theta),
            rho,
        }
    }

    pub fn to_complex(self) -> Complex {
        Complex::new(self.rho * self.theta.cos(), self.rho * self.theta.sin())
    }

    pub fn add(self, other: Polar) -> Self {
        Polar::new(self.theta + other.theta, self.rho + other.rho)
    }

    pub fn scale(self, s: f64) -> Self {
        Polar::new(self.theta, self.rho * s)
    }

    pub fn is_origin(self) -> bool {
        self.theta == 0.0 && self.rho == 0.0
    }

    /// Interpolates from `self` towards `to`, taking the shorter arc around the circle.
    pub fn interpolate(self, to: Polar, delta: f64) -> Polar {
        let from_theta = self.theta;
        let to_theta = to.theta;
        let theta = if (to_theta - from_theta).abs() > PI {
            if to_theta > from_theta {
                from_theta + ((to_theta - TAU) - from_theta) * delta
            } else {
                from_theta - TAU + (to_theta - (from_theta - TAU)) * delta
            }
        } else {
            from_theta + (to_theta - from_theta) * delta
        };
        let rho = (to.rho - self.rho) * delta + self.rho;
        Polar::new(theta, rho)
    }
}

/// A point stored in either form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Position {
    Complex(Complex),
    Polar(Polar),
}

impl Position {
    pub fn zero(complex: bool) -> Self {
        if complex {
            Position::Complex(Complex::ZERO)
        } else {
            Position::Polar(Polar::ORIGIN)
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Position::Complex(_))
    }

    pub fn getc(&self) -> Complex {
        match *self {
            Position::Complex(c) => c,
            Position::Polar(p) => p.to_complex(),
        }
    }

    pub fn getp(&self) -> Polar {
        match *self {
            Position::Complex(c) => c.to_polar(),
            Position::Polar(p) => p,
        }
    }

    pub fn setc(&mut self, c: Complex) {
        match self {
            Position::Complex(v) => *v = c,
            Position::Polar(v) => *v = c.to_polar(),
        }
    }

    pub fn setp(&mut self, p: Polar) {
        match self {
            Position::Complex(v) => *v = p.to_complex(),
            Position::Polar(v) => *v = Polar::new(p.theta, p.rho),
        }
    }

    /// Copies `other` into `self`, keeping `self`'s representation.
    pub fn set(&mut self, other: Position) {
        match other {
            Position::Complex(c) => self.setc(c),
            Position::Polar(p) => self.setp(p),
        }
    }
}
