//! Debug line geometry
//!
//! Based on Game Engine Architecture 3rd Edition, Section 10.2:
//! "Debug drawing facilities allow programmers to render simple shapes like
//! lines, points, spheres and boxes for debugging and visualization purposes."

use crate::foundation::math::Vec3;
use crate::scene::LineSegment;

/// Corner sign pattern, indexed by the three low bits (x, y, z)
fn corner(center: Vec3, half: Vec3, index: usize) -> Vec3 {
    let sign = |bit: usize| if index & bit == 0 { -1.0 } else { 1.0 };
    center + Vec3::new(half.x * sign(1), half.y * sign(2), half.z * sign(4))
}

/// The 12 edges of an axis-aligned box with full extent `size`
pub fn box_edges(center: Vec3, size: Vec3) -> Vec<LineSegment> {
    let half = size * 0.5;
    let mut edges = Vec::with_capacity(12);
    // Corners differing in exactly one bit share an edge.
    for index in 0..8usize {
        for bit in [1usize, 2, 4] {
            if index & bit == 0 {
                edges.push(LineSegment::new(
                    corner(center, half, index),
                    corner(center, half, index | bit),
                ));
            }
        }
    }
    edges
}
