//! Math utilities and types
//!
//! Provides the vector, quaternion and transform types shared by the scene
//! graph and the physics adapters.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Position, rotation and scale of a scene object relative to its parent
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }

    /// Compose a child transform expressed in this transform's space.
    ///
    /// `parent.combine(&child)` yields the child's transform in the space
    /// the parent is expressed in.
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// Express a pose given in this transform's outer space as a local pose.
    ///
    /// Inverse of [`Transform::combine`] for position and rotation. Scale
    /// components of zero map positions to zero on that axis.
    pub fn localize(&self, position: Vec3, rotation: Quat) -> (Vec3, Quat) {
        let inv_rotation = self.rotation.inverse();
        let offset = inv_rotation * (position - self.position);
        let local_position = Vec3::new(
            safe_div(offset.x, self.scale.x),
            safe_div(offset.y, self.scale.y),
            safe_div(offset.z, self.scale.z),
        );
        (local_position, inv_rotation * rotation)
    }

    /// Largest absolute scale component, used to scale radii
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }
}

fn safe_div(value: f32, divisor: f32) -> f32 {
    if divisor == 0.0 { 0.0 } else { value / divisor }
}

/// Math utility functions
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Rotation of `degrees` about the X axis
    pub fn rotation_x_deg(degrees: f32) -> super::Quat {
        super::Quat::from_axis_angle(&super::Vec3::x_axis(), deg_to_rad(degrees))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_combine_applies_parent_scale_and_rotation() {
        let parent = Transform::from_position_rotation(
            Vec3::new(1.0, 0.0, 0.0),
            utils::rotation_x_deg(90.0),
        )
        .with_scale(Vec3::new(2.0, 2.0, 2.0));
        let child = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));

        let world = parent.combine(&child);
        assert_relative_eq!(world.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(world.position.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(world.position.z, 2.0, epsilon = 1e-5);
        assert_relative_eq!(world.scale.y, 2.0);
    }

    #[test]
    fn test_localize_inverts_combine() {
        let parent = Transform::from_position_rotation(
            Vec3::new(3.0, -1.0, 2.0),
            utils::rotation_x_deg(-90.0),
        )
        .with_scale(Vec3::new(1.0, 2.0, 0.5));
        let child = Transform::from_position_rotation(
            Vec3::new(0.5, 0.25, -4.0),
            utils::rotation_x_deg(30.0),
        );

        let world = parent.combine(&child);
        let (position, rotation) = parent.localize(world.position, world.rotation);
        assert_relative_eq!(position.x, 0.5, epsilon = 1e-4);
        assert_relative_eq!(position.y, 0.25, epsilon = 1e-4);
        assert_relative_eq!(position.z, -4.0, epsilon = 1e-4);
        assert_relative_eq!(rotation.angle_to(&child.rotation), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_transform_point_matches_matrix() {
        let t = Transform::from_position_rotation(Vec3::new(0.0, 2.0, 0.0), utils::rotation_x_deg(45.0))
            .with_scale(Vec3::new(1.0, 3.0, 1.0));
        let p = Vec3::new(1.0, 1.0, 1.0);
        let via_matrix = t.to_matrix().transform_point(&Point3::from(p));
        let direct = t.transform_point(p);
        assert_relative_eq!(via_matrix.x, direct.x, epsilon = 1e-5);
        assert_relative_eq!(via_matrix.y, direct.y, epsilon = 1e-5);
        assert_relative_eq!(via_matrix.z, direct.z, epsilon = 1e-5);
    }
}
