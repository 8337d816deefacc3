//! Quaternion rotations
//!
//! Everything in here is pure and allocation free; the traversal calls these
//! functions for every tag of every linked model on every frame.

use std::ops::{Mul, Neg};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::matrix::{Mat3, Mat4};
use super::types::Vec3;

/// Above this dot product the two rotations are treated as parallel and
/// SLERP falls back to a normalized linear blend.
pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// Squared norms below this are treated as zero.
const DEGENERATE_NORM_SQ: f32 = 1e-12;

/// Quaternion representation for rotations
///
/// `(x, y, z)` is the rotation axis scaled by `sin(θ/2)` and `w` is `cos(θ/2)`.
/// Only unit quaternions describe rotations; products of unit quaternions drift
/// slowly and are normalized before they are turned into matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a new quaternion
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation
    pub const fn init() -> Self {
        Self::IDENTITY
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize the quaternion
    ///
    /// A zero-length quaternion has no direction to keep, so the identity
    /// rotation is returned instead of dividing by zero.
    pub fn normalize(&self) -> Self {
        let norm_sq = self.dot(self);
        if norm_sq <= DEGENERATE_NORM_SQ || !norm_sq.is_finite() {
            return Self::IDENTITY;
        }

        let inv = 1.0 / norm_sq.sqrt();
        Self {
            x: self.x * inv,
            y: self.y * inv,
            z: self.z * inv,
            w: self.w * inv,
        }
    }

    /// Rotation of `angle_degrees` around `axis`
    ///
    /// The axis does not have to be unit length. A zero axis yields the
    /// identity rotation.
    pub fn from_axis_angle(angle_degrees: f32, axis: Vec3) -> Self {
        let len = axis.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return Self::IDENTITY;
        }

        let half = angle_degrees.to_radians() * 0.5;
        let s = half.sin() / len;
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    /// Rotation matrix with an optional translation column
    pub fn to_matrix4x4(&self, origin: Option<Vec3>) -> Mat4 {
        Mat4::from_rotation_translation(*self, origin.unwrap_or(Vec3::ZERO))
    }

    /// Rotation as three axis rows (MD3 tag layout)
    pub fn to_matrix3x3(&self) -> Mat3 {
        let m = Mat4::from_rotation(*self);
        Mat3::from_rows([
            Vec3::new(m.get(0, 0), m.get(1, 0), m.get(2, 0)),
            Vec3::new(m.get(0, 1), m.get(1, 1), m.get(2, 1)),
            Vec3::new(m.get(0, 2), m.get(1, 2), m.get(2, 2)),
        ])
    }

    /// Extract the rotation from a tag axis matrix
    pub fn from_matrix3x3(m: &Mat3) -> Self {
        Self::from_rotation_elements(|row, col| m.element(row, col))
    }

    /// Extract the rotation part of a 4x4 transform
    pub fn from_matrix4x4(m: &Mat4) -> Self {
        Self::from_rotation_elements(|row, col| m.get(row, col))
    }

    /// Branch on the largest of trace, m00, m11 and m22 so the divisor is
    /// never close to zero, even for rotations near 180 degrees.
    fn from_rotation_elements(m: impl Fn(usize, usize) -> f32) -> Self {
        let (m00, m01, m02) = (m(0, 0), m(0, 1), m(0, 2));
        let (m10, m11, m12) = (m(1, 0), m(1, 1), m(1, 2));
        let (m20, m21, m22) = (m(2, 0), m(2, 1), m(2, 2));
        let trace = m00 + m11 + m22;

        let q = if trace >= m00 && trace >= m11 && trace >= m22 {
            // s = 4w
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 >= m11 && m00 >= m22 {
            // s = 4x
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 >= m22 {
            // s = 4y
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            // s = 4z
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };

        q.normalize()
    }

    /// Spherical linear interpolation
    pub fn slerp(&self, other: &Self, t: f32) -> Self {
        let mut dot = self.dot(other);

        // q and -q are the same rotation; blend along the shorter arc
        let other = if dot < 0.0 {
            dot = -dot;
            -*other
        } else {
            *other
        };

        if dot > SLERP_LINEAR_THRESHOLD {
            return Self {
                x: self.x + t * (other.x - self.x),
                y: self.y + t * (other.y - self.y),
                z: self.z + t * (other.z - self.z),
                w: self.w + t * (other.w - self.w),
            }
            .normalize();
        }

        let theta_0 = dot.acos();
        let sin_theta_0 = theta_0.sin();
        let s0 = ((1.0 - t) * theta_0).sin() / sin_theta_0;
        let s1 = (t * theta_0).sin() / sin_theta_0;

        Self {
            x: s0 * self.x + s1 * other.x,
            y: s0 * self.y + s1 * other.y,
            z: s0 * self.z + s1 * other.z,
            w: s0 * self.w + s1 * other.w,
        }
    }

    /// Rotate a vector by this unit quaternion
    pub fn rotate_vector(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// True when both quaternions describe the same rotation (q or -q)
    pub fn same_rotation(&self, other: &Self, epsilon: f32) -> bool {
        (self.dot(other).abs() - 1.0).abs() <= epsilon
    }

    /// Component-wise comparison within a tolerance
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
            && (self.w - other.w).abs() <= epsilon
    }

    /// Convert to a glam quaternion for easier math operations
    pub fn to_glam(&self) -> glam::Quat {
        glam::Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }

    /// Create from a glam quaternion
    pub fn from_glam(q: glam::Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`
impl Mul for Quat {
    type Output = Self;

    fn mul(self, b: Self) -> Self {
        let a = self;
        Self {
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
    }
}

impl Neg for Quat {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}
