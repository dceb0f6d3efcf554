//! Geometric detrending.
//!
//! A price series is sheared by subtracting its least-squares drift so that
//! the highest and lowest points are spread over the whole history instead of
//! bunching at one end. Lines fitted in the sheared space are mapped back with
//! [`unshear`] using the coefficient returned by [`shear`].
//!
//! sheared(x) = close(x) - slope * (x - origin)
//!
//! where `x` is [`date_to_num`] of the point's date, `slope` is the
//! regression slope of the whole series and `origin` is the first date.

use crate::domain::price::{date_to_num, PricePoint};
use crate::domain::regression::fit_line;

/// Parameters needed to invert a shear. Only valid for the series it came
/// from; a mismatched coefficient is not detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShearCoefficient {
    pub slope: f64,
    pub origin: f64,
}

impl ShearCoefficient {
    pub const IDENTITY: ShearCoefficient = ShearCoefficient {
        slope: 0.0,
        origin: 0.0,
    };

    fn offset(&self, point: &PricePoint) -> f64 {
        self.slope * (date_to_num(point.date) - self.origin)
    }
}

pub fn shear(points: &[PricePoint]) -> (Vec<PricePoint>, ShearCoefficient) {
    let xs: Vec<f64> = points.iter().map(|p| date_to_num(p.date)).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.close).collect();

    let coeff = match (fit_line(&xs, &ys), xs.first()) {
        (Some(fit), Some(&origin)) => ShearCoefficient {
            slope: fit.slope,
            origin,
        },
        _ => ShearCoefficient::IDENTITY,
    };

    let sheared = points
        .iter()
        .map(|p| PricePoint {
            date: p.date,
            close: p.close - coeff.offset(p),
        })
        .collect();

    (sheared, coeff)
}

pub fn unshear(points: &[PricePoint], coeff: &ShearCoefficient) -> Vec<PricePoint> {
    points
        .iter()
        .map(|p| PricePoint {
            date: p.date,
            close: p.close + coeff.offset(p),
        })
        .collect()
}
