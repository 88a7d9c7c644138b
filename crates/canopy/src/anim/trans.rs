//! Easing transitions.
//!
//! A transition maps the elapsed fraction of an animation (`0..1`) to the interpolation delta.
//! Curves are written for the ease-in case; `easeOut` and `easeInOut` are derived from it.
//! The textual form is `linear` or `<Curve>[(<param>)].<ease>`, e.g. `Quart.easeInOut` or
//! `Back(2).easeOut`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Quad,
    Cubic,
    Quart,
    Quint,
    Pow(f64),
    Expo,
    Circ,
    Sine,
    Back(f64),
    Bounce,
    Elastic(f64),
}

impl Curve {
    pub fn eval(self, p: f64) -> f64 {
        match self {
            Curve::Quad => p.powi(2),
            Curve::Cubic => p.powi(3),
            Curve::Quart => p.powi(4),
            Curve::Quint => p.powi(5),
            Curve::Pow(x) => p.powf(x),
            Curve::Expo => 2f64.powf(8.0 * (p - 1.0)),
            Curve::Circ => 1.0 - p.clamp(-1.0, 1.0).acos().sin(),
            Curve::Sine => 1.0 - ((1.0 - p) * PI / 2.0).sin(),
            Curve::Back(x) => p.powi(2) * ((x + 1.0) * p - x),
            Curve::Bounce => bounce(p),
            Curve::Elastic(x) => {
                let q = p - 1.0;
                2f64.powf(10.0 * q) * (20.0 * q * PI * x / 3.0).cos()
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Curve::Quad => "Quad",
            Curve::Cubic => "Cubic",
            Curve::Quart => "Quart",
            Curve::Quint => "Quint",
            Curve::Pow(_) => "Pow",
            Curve::Expo => "Expo",
            Curve::Circ => "Circ",
            Curve::Sine => "Sine",
            Curve::Back(_) => "Back",
            Curve::Bounce => "Bounce",
            Curve::Elastic(_) => "Elastic",
        }
    }

    fn param(self) -> Option<f64> {
        match self {
            Curve::Pow(x) | Curve::Back(x) | Curve::Elastic(x) => Some(x),
            _ => None,
        }
    }

    fn from_parts(name: &str, param: Option<f64>) -> Option<Curve> {
        let curve = match name {
            "Quad" => Curve::Quad,
            "Cubic" => Curve::Cubic,
            "Quart" => Curve::Quart,
            "Quint" => Curve::Quint,
            "Pow" => Curve::Pow(param.unwrap_or(6.0)),
            "Expo" => Curve::Expo,
            "Circ" => Curve::Circ,
            "Sine" => Curve::Sine,
            "Back" => Curve::Back(param.unwrap_or(1.618)),
            "Bounce" => Curve::Bounce,
            "Elastic" => Curve::Elastic(param.unwrap_or(1.0)),
            _ => return None,
        };
        // Only the parametric curves accept a parameter.
        if param.is_some() && curve.param().is_none() {
            return None;
        }
        Some(curve)
    }
}

fn bounce(p: f64) -> f64 {
    let mut a = 0.0;
    let mut b = 1.0;
    // The thresholds bottom out at -1/11; the bound keeps out-of-range input finite.
    for _ in 0..64 {
        if p >= (7.0 - 4.0 * a) / 11.0 {
            return b * b - ((11.0 - 6.0 * a - 11.0 * p) / 4.0).powi(2);
        }
        a += b;
        b /= 2.0;
    }
    0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    In,
    Out,
    InOut,
}

impl Ease {
    fn as_str(self) -> &'static str {
        match self {
            Ease::In => "easeIn",
            Ease::Out => "easeOut",
            Ease::InOut => "easeInOut",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Transition {
    Linear,
    Eased(Curve, Ease),
}

impl Default for Transition {
    fn default() -> Self {
        Transition::Eased(Curve::Quart, Ease::InOut)
    }
}

impl Transition {
    pub fn apply(self, p: f64) -> f64 {
        match self {
            Transition::Linear => p,
            Transition::Eased(curve, Ease::In) => curve.eval(p),
            Transition::Eased(curve, Ease::Out) => 1.0 - curve.eval(1.0 - p),
            Transition::Eased(curve, Ease::InOut) => {
                if p <= 0.5 {
                    curve.eval(2.0 * p) / 2.0
                } else {
                    (2.0 - curve.eval(2.0 * (1.0 - p))) / 2.0
                }
            }
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Linear => f.write_str("linear"),
            Transition::Eased(curve, ease) => {
                f.write_str(curve.name())?;
                if let Some(x) = curve.param() {
                    write!(f, "({x})")?;
                }
                write!(f, ".{}", ease.as_str())
            }
        }
    }
}

impl FromStr for Transition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "linear" {
            return Ok(Transition::Linear);
        }
        let unsupported = || Error::unsupported("transition", s);

        let (curve, ease) = s.rsplit_once('.').ok_or_else(unsupported)?;
        let ease = match ease {
            "easeIn" => Ease::In,
            "easeOut" => Ease::Out,
            "easeInOut" => Ease::InOut,
            _ => return Err(unsupported()),
        };
        let (name, param) = match curve.split_once('(') {
            Some((name, rest)) => {
                let raw = rest.strip_suffix(')').ok_or_else(unsupported)?;
                let x: f64 = raw.trim().parse().map_err(|_| unsupported())?;
                (name, Some(x))
            }
            None => (curve, None),
        };
        let curve = Curve::from_parts(name, param).ok_or_else(unsupported)?;
        Ok(Transition::Eased(curve, ease))
    }
}

impl TryFrom<String> for Transition {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Transition> for String {
    fn from(value: Transition) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn every_eased_curve_starts_at_zero_and_ends_at_one() {
        let curves = [
            Curve::Quad,
            Curve::Cubic,
            Curve::Quart,
            Curve::Quint,
            Curve::Pow(6.0),
            Curve::Circ,
            Curve::Sine,
            Curve::Back(1.618),
            Curve::Bounce,
        ];
        for curve in curves {
            for ease in [Ease::In, Ease::Out, Ease::InOut] {
                let t = Transition::Eased(curve, ease);
                assert!(t.apply(0.0).abs() < 1e-9, "{t} at 0");
                assert!((t.apply(1.0) - 1.0).abs() < 1e-9, "{t} at 1");
            }
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_around_the_midpoint() {
        let t = Transition::default();
        assert!((t.apply(0.5) - 0.5).abs() < EPS);
        assert!((t.apply(0.25) + t.apply(0.75) - 1.0).abs() < EPS);
        // Quart: (2 * 0.25)^4 / 2
        assert!((t.apply(0.25) - 0.03125).abs() < EPS);
    }

    #[test]
    fn bounce_matches_reference_points() {
        assert!((bounce(1.0) - 1.0).abs() < EPS);
        // First touchdown.
        assert!(bounce(7.0 / 11.0).abs() < 1e-9);
        assert!(bounce(0.5).is_finite());
        assert_eq!(bounce(-5.0), 0.0);
    }

    #[test]
    fn expo_and_elastic_are_tiny_at_the_start() {
        assert!(Curve::Expo.eval(0.0) < 0.01);
        assert!((Curve::Expo.eval(1.0) - 1.0).abs() < EPS);
        assert!((Curve::Elastic(1.0).eval(1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn parses_and_prints_the_textual_form() {
        assert_eq!("linear".parse::<Transition>().unwrap(), Transition::Linear);
        assert_eq!(
            "Quart.easeInOut".parse::<Transition>().unwrap(),
            Transition::default()
        );
        let back: Transition = "Back(2).easeOut".parse().unwrap();
        assert_eq!(back, Transition::Eased(Curve::Back(2.0), Ease::Out));
        assert_eq!(back.to_string(), "Back(2).easeOut");
        assert_eq!(
            "Pow.easeIn".parse::<Transition>().unwrap(),
            Transition::Eased(Curve::Pow(6.0), Ease::In)
        );

        for bad in ["Quart", "Quart.easeSideways", "Wobble.easeIn", "Quad(2).easeIn", "Back(x).easeIn"] {
            assert!(bad.parse::<Transition>().is_err(), "{bad}");
        }
    }

    #[test]
    fn serde_uses_the_textual_form() {
        let t: Transition = serde_json::from_str("\"Sine.easeOut\"").unwrap();
        assert_eq!(t, Transition::Eased(Curve::Sine, Ease::Out));
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"Sine.easeOut\"");
        assert!(serde_json::from_str::<Transition>("\"nope\"").is_err());
    }
}
