//! 3x3 tag orientations and 4x4 transforms

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::quaternion::Quat;
use super::types::Vec3;

/// Orientation stored as three basis axes, the layout MD3 tags use
///
/// Row `i` is the image of the i-th unit axis, so as a rotation matrix the
/// rows are the columns: `element(r, c) == rows[c][r]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Mat3 {
    pub rows: [Vec3; 3],
}

impl Mat3 {
    pub const IDENTITY: Self = Self {
        rows: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    pub const fn from_rows(rows: [Vec3; 3]) -> Self {
        Self { rows }
    }

    /// Axis row (0 = x axis, 1 = y axis, 2 = z axis)
    pub fn row(&self, index: usize) -> Vec3 {
        self.rows[index]
    }

    /// Rotation matrix element at `row`, `col`
    pub fn element(&self, row: usize, col: usize) -> f32 {
        let axis = self.rows[col];
        match row {
            0 => axis.x,
            1 => axis.y,
            _ => axis.z,
        }
    }

    /// Map a local vector into the parent frame
    pub fn transform(&self, v: Vec3) -> Vec3 {
        self.rows[0] * v.x + self.rows[1] * v.y + self.rows[2] * v.z
    }

    /// Embed into a 4x4 transform with `origin` as translation
    pub fn to_mat4(&self, origin: Vec3) -> Mat4 {
        let [a, b, c] = self.rows;
        Mat4 {
            data: [
                a.x, a.y, a.z, 0.0, // Column 0
                b.x, b.y, b.z, 0.0, // Column 1
                c.x, c.y, c.z, 0.0, // Column 2
                origin.x, origin.y, origin.z, 1.0, // Column 3
            ],
        }
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Column-major 4x4 transform, laid out the way `glMultMatrixf` expects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub data: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Self = Self::from_diagonal(1.0, 1.0, 1.0);

    const fn from_diagonal(x: f32, y: f32, z: f32) -> Self {
        let mut data = [0.0; 16];
        data[0] = x;
        data[5] = y;
        data[10] = z;
        data[15] = 1.0;
        Self { data }
    }

    /// Pure translation, the equivalent of `glTranslatef`
    pub fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.data[12..15].copy_from_slice(&v.to_array());
        m
    }

    /// Per-axis scale, the equivalent of `glScalef`
    pub fn from_scale(v: Vec3) -> Self {
        Self::from_diagonal(v.x, v.y, v.z)
    }

    pub fn from_uniform_scale(s: f32) -> Self {
        Self::from_scale(Vec3::new(s, s, s))
    }

    /// Rotation-only transform
    pub fn from_rotation(q: Quat) -> Self {
        Self::from_rotation_translation(q, Vec3::ZERO)
    }

    /// Rotation of `angle_degrees` around `axis`, the equivalent of `glRotatef`
    pub fn from_axis_angle(angle_degrees: f32, axis: Vec3) -> Self {
        Self::from_rotation(Quat::from_axis_angle(angle_degrees, axis))
    }

    /// Rotation about the origin followed by `translation`
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let x = rotation.x;
        let y = rotation.y;
        let z = rotation.z;
        let w = rotation.w;

        let x2 = x + x;
        let y2 = y + y;
        let z2 = z + z;

        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        Self {
            data: [
                1.0 - (yy + zz),
                xy + wz,
                xz - wy,
                0.0,
                xy - wz,
                1.0 - (xx + zz),
                yz + wx,
                0.0,
                xz + wy,
                yz - wx,
                1.0 - (xx + yy),
                0.0,
                translation.x,
                translation.y,
                translation.z,
                1.0,
            ],
        }
    }

    /// Element at `row`, `col`
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[col * 4 + row]
    }

    /// Translation column
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.data[12], self.data[13], self.data[14])
    }

    /// `self * other`: `other` is applied first
    pub fn mul(&self, other: &Self) -> Self {
        let a = &self.data;
        let b = &other.data;
        let mut out = [0.0f32; 16];

        for col in 0..4 {
            let b0 = b[col * 4];
            let b1 = b[col * 4 + 1];
            let b2 = b[col * 4 + 2];
            let b3 = b[col * 4 + 3];
            for row in 0..4 {
                out[col * 4 + row] =
                    b0 * a[row] + b1 * a[4 + row] + b2 * a[8 + row] + b3 * a[12 + row];
            }
        }

        Self { data: out }
    }

    /// Map a point, translation included
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.apply(p, 1.0)
    }

    /// Map a direction; the translation column is ignored
    pub fn transform_normal(&self, n: Vec3) -> Vec3 {
        self.apply(n, 0.0)
    }

    fn apply(&self, v: Vec3, w: f32) -> Vec3 {
        let column = |c: usize| Vec3::new(self.data[c * 4], self.data[c * 4 + 1], self.data[c * 4 + 2]);
        column(0) * v.x + column(1) * v.y + column(2) * v.z + column(3) * w
    }

    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    pub fn to_glam(&self) -> glam::Mat4 {
        glam::Mat4::from_cols_array(&self.data)
    }

    pub fn from_glam(m: glam::Mat4) -> Self {
        Self {
            data: m.to_cols_array(),
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Mat4::mul(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat4_identity() {
        let m = Mat4::IDENTITY;
        assert_eq!(m.data[0], 1.0);
        assert_eq!(m.data[5], 1.0);
        assert_eq!(m.data[10], 1.0);
        assert_eq!(m.data[15], 1.0);
    }

    #[test]
    fn test_mat4_translation() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let p = m.transform_point(Vec3::ZERO);
        assert!((p.x - 1.0).abs() < 0.001);
        assert!((p.y - 2.0).abs() < 0.001);
        assert!((p.z - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_mat4_scale() {
        let m = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        let p = m.transform_point(Vec3::new(1.0, 1.0, 1.0));
        assert!((p.x - 2.0).abs() < 0.001);
        assert!((p.y - 3.0).abs() < 0.001);
        assert!((p.z - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_mat4_multiply_identity() {
        let a = Mat4::IDENTITY;
        let b = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let c = a.mul(&b);
        assert_eq!(c.data, b.data);
    }

    #[test]
    fn test_mat4_multiply_matches_glam() {
        let a = Mat4::from_axis_angle(35.0, Vec3::new(1.0, 0.5, 0.0))
            * Mat4::from_translation(Vec3::new(1.0, -2.0, 0.5));
        let b = Mat4::from_rotation_translation(
            Quat::from_axis_angle(-70.0, Vec3::Z),
            Vec3::new(4.0, 0.0, 1.0),
        );
        let expected = a.to_glam() * b.to_glam();
        assert!((a * b).abs_diff_eq(&Mat4::from_glam(expected), 1e-5));
    }

    #[test]
    fn test_mat3_rows_are_columns() {
        let m = Mat3::from_rows([Vec3::Y, -Vec3::X, Vec3::Z]);
        // x axis maps onto the first row
        assert_eq!(m.transform(Vec3::X), Vec3::Y);
        assert_eq!(m.element(1, 0), 1.0);
        assert_eq!(m.to_mat4(Vec3::ZERO).transform_point(Vec3::X), Vec3::Y);
    }

    #[test]
    fn test_mat3_to_mat4_translation() {
        let m = Mat3::IDENTITY.to_mat4(Vec3::new(0.0, 0.0, 24.0));
        assert_eq!(m.transform_point(Vec3::ZERO), Vec3::new(0.0, 0.0, 24.0));
    }
}
