//! Rigid transforms exchanged with the tracking platform.

use cgmath::{InnerSpace, Matrix3, Matrix4, Quaternion, SquareMatrix, Vector3};

/// A rigid transform (position + orientation) stored as a column-major 4x4 matrix.
///
/// The platform delivers poses as 16 floats in column-major order, which is also
/// the memory layout of [`cgmath::Matrix4`], so conversions are lossless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    matrix: Matrix4<f32>,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }

    /// Builds a pose from a column-major float array.
    pub fn from_column_major(values: &[f32; 16]) -> Self {
        let v = values;
        Self {
            matrix: Matrix4::new(
                v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8], v[9], v[10], v[11], v[12],
                v[13], v[14], v[15],
            ),
        }
    }

    pub fn from_position_orientation(position: Vector3<f32>, orientation: Quaternion<f32>) -> Self {
        Self {
            matrix: Matrix4::from_translation(position) * Matrix4::from(orientation.normalize()),
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::from_translation(position),
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    pub fn to_column_major(&self) -> [f32; 16] {
        *self.matrix.as_ref()
    }

    /// Translation component
    pub fn position(&self) -> Vector3<f32> {
        self.matrix.w.truncate()
    }

    /// Rotation component with any scale removed from the basis vectors
    pub fn orientation(&self) -> Quaternion<f32> {
        let x = normalize_or(self.matrix.x.truncate(), Vector3::unit_x());
        let y = normalize_or(self.matrix.y.truncate(), Vector3::unit_y());
        let z = normalize_or(self.matrix.z.truncate(), Vector3::unit_z());
        Quaternion::from(Matrix3::from_cols(x, y, z)).normalize()
    }

    /// Direction of the local -Z axis, the viewing direction for viewer poses.
    pub fn forward(&self) -> Vector3<f32> {
        normalize_or(-self.matrix.z.truncate(), -Vector3::unit_z())
    }

    /// Direction of the local +Y axis, the surface normal for hit poses.
    pub fn up(&self) -> Vector3<f32> {
        normalize_or(self.matrix.y.truncate(), Vector3::unit_y())
    }

    pub fn inverse(&self) -> Option<Pose> {
        self.matrix.invert().map(Pose::from_matrix)
    }

    /// Re-expresses this pose (given in world coordinates) relative to `origin`.
    pub fn relative_to(&self, origin: &Pose) -> Option<Pose> {
        origin
            .inverse()
            .map(|inv| Pose::from_matrix(inv.matrix * self.matrix))
    }

    /// Composes `self` followed by `local` (parent * child).
    pub fn then(&self, local: &Pose) -> Pose {
        Pose::from_matrix(self.matrix * local.matrix)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Matrix4<f32>> for Pose {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self::from_matrix(matrix)
    }
}

fn normalize_or(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        fallback
    }
}
