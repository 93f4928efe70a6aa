use super::fixed::{float_to_fixed, FIXED_ONE, FRACTION_MASK};

/// 2D affine transform.
///
/// Maps `(x, y)` to `(m00 * x + m01 * y + m02, m10 * x + m11 * y + m12)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub m00: f32,
    pub m01: f32,
    pub m02: f32,
    pub m10: f32,
    pub m11: f32,
    pub m12: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);

    #[inline]
    pub const fn new(m00: f32, m01: f32, m02: f32, m10: f32, m11: f32, m12: f32) -> Self {
        Self { m00, m01, m02, m10, m11, m12 }
    }

    #[inline]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    #[inline]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Counter-clockwise rotation in a +Y-down space (i.e. clockwise on screen).
    pub fn rotate(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, -sin, 0.0, sin, cos, 0.0)
    }

    /// Returns `self` applied after `first`.
    pub fn then(self, first: Transform) -> Transform {
        let a = self;
        let b = first;
        Transform::new(
            a.m00 * b.m00 + a.m01 * b.m10,
            a.m00 * b.m01 + a.m01 * b.m11,
            a.m00 * b.m02 + a.m01 * b.m12 + a.m02,
            a.m10 * b.m00 + a.m11 * b.m10,
            a.m10 * b.m01 + a.m11 * b.m11,
            a.m10 * b.m02 + a.m11 * b.m12 + a.m12,
        )
    }

    #[inline]
    pub fn map_point(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.m00 * x + self.m01 * y + self.m02,
            self.m10 * x + self.m11 * y + self.m12,
        )
    }

    #[inline]
    pub fn determinant(self) -> f64 {
        self.m00 as f64 * self.m11 as f64 - self.m01 as f64 * self.m10 as f64
    }

    /// Inverse transform, or `None` when the matrix is singular (or not finite).
    pub fn invert(self) -> Option<Transform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let (m00, m01, m02) = (self.m00 as f64, self.m01 as f64, self.m02 as f64);
        let (m10, m11, m12) = (self.m10 as f64, self.m11 as f64, self.m12 as f64);

        Some(Transform::new(
            (m11 * inv) as f32,
            (-m01 * inv) as f32,
            ((m01 * m12 - m11 * m02) * inv) as f32,
            (-m10 * inv) as f32,
            (m00 * inv) as f32,
            ((m10 * m02 - m00 * m12) * inv) as f32,
        ))
    }

    /// Converts every coefficient to S15.16.
    pub fn to_fixed(self) -> FixedTransform {
        FixedTransform {
            m00: float_to_fixed(self.m00),
            m01: float_to_fixed(self.m01),
            m02: float_to_fixed(self.m02),
            m10: float_to_fixed(self.m10),
            m11: float_to_fixed(self.m11),
            m12: float_to_fixed(self.m12),
        }
    }
}

/// Dispatch class of a texture transform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransformKind {
    /// Unit scale, no shear, whole-pixel translation: rows are plain copies.
    Identity,
    /// Unit scale, no shear, fractional translation.
    Translate,
    /// Anything else.
    Generic,
}

/// Affine transform with S15.16 coefficients.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FixedTransform {
    pub m00: i32,
    pub m01: i32,
    pub m02: i32,
    pub m10: i32,
    pub m11: i32,
    pub m12: i32,
}

impl FixedTransform {
    pub fn kind(&self) -> TransformKind {
        let unit = self.m00 == FIXED_ONE
            && self.m11 == FIXED_ONE
            && self.m01 == 0
            && self.m10 == 0;
        if !unit {
            TransformKind::Generic
        } else if self.m02 & FRACTION_MASK == 0 && self.m12 & FRACTION_MASK == 0 {
            TransformKind::Identity
        } else {
            TransformKind::Translate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn invert_round_trips_points() {
        let t = Transform::new(2.0, 0.5, 10.0, -0.25, 1.5, -3.0);
        let inv = t.invert().unwrap();
        for &(x, y) in &[(0.0, 0.0), (3.5, -2.0), (100.0, 42.0)] {
            let (u, v) = t.map_point(x, y);
            assert!(approx(inv.map_point(u, v), (x, y)));
        }
    }

    #[test]
    fn singular_has_no_inverse() {
        assert!(Transform::scale(0.0, 1.0).invert().is_none());
        assert!(Transform::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0).invert().is_none());
    }

    #[test]
    fn then_composes_in_order() {
        let t = Transform::translate(5.0, 0.0).then(Transform::scale(2.0, 2.0));
        assert!(approx(t.map_point(1.0, 1.0), (7.0, 2.0)));
    }

    #[test]
    fn rotate_quarter_turn() {
        let t = Transform::rotate(std::f32::consts::FRAC_PI_2);
        assert!(approx(t.map_point(1.0, 0.0), (0.0, 1.0)));
    }

    #[test]
    fn kind_classification() {
        assert_eq!(Transform::IDENTITY.to_fixed().kind(), TransformKind::Identity);
        assert_eq!(Transform::translate(-3.0, 7.0).to_fixed().kind(), TransformKind::Identity);
        assert_eq!(Transform::translate(0.5, 0.0).to_fixed().kind(), TransformKind::Translate);
        assert_eq!(Transform::scale(2.0, 1.0).to_fixed().kind(), TransformKind::Generic);
        assert_eq!(Transform::rotate(0.3).to_fixed().kind(), TransformKind::Generic);
    }
}
