//! UV sphere generation
//!
//! Vertices are laid out ring by ring from the south pole (`y = -1`) to the
//! north pole, `sectors` vertices per ring, with the seam column duplicated so
//! texture coordinates run the full `[0, 1]` range. Vertex `r * sectors + s`
//! sits on ring `r`, sector `s`.

use super::mesh::{Mesh, Vertex};
use crate::foundation::math::constants::PI;
use crate::render::{RenderError, RenderResult};

/// Build a unit-radius UV sphere
///
/// Each grid cell between adjacent rings and sectors becomes two triangles,
/// wound clockwise when viewed from outside the sphere.
///
/// # Errors
/// `InvalidParameter` if `rings` or `sectors` is below 2, or if the vertex
/// count does not fit a 32-bit index.
pub fn generate_sphere(rings: u32, sectors: u32) -> RenderResult<Mesh> {
    if rings < 2 || sectors < 2 {
        return Err(RenderError::InvalidParameter(format!(
            "sphere needs at least 2 rings and 2 sectors, got {rings}x{sectors}"
        )));
    }
    if rings.checked_mul(sectors).is_none() {
        return Err(RenderError::InvalidParameter(format!(
            "sphere {rings}x{sectors} exceeds 32-bit index range"
        )));
    }

    let ring_step = 1.0 / (rings - 1) as f32;
    let sector_step = 1.0 / (sectors - 1) as f32;

    let mut vertices = Vec::with_capacity((rings * sectors) as usize);
    for r in 0..rings {
        let theta = r as f32 * ring_step;
        let (sin_lat, y) = ((PI * theta).sin(), (-PI / 2.0 + PI * theta).sin());

        for s in 0..sectors {
            let phi = s as f32 * sector_step;
            let x = (2.0 * PI * phi).cos() * sin_lat;
            let z = (2.0 * PI * phi).sin() * sin_lat;
            vertices.push(Vertex::new([x, y, z], [phi, theta]));
        }
    }

    let quads = ((rings - 1) * (sectors - 1)) as usize;
    let mut indices = Vec::with_capacity(quads * 6);
    for r in 0..rings - 1 {
        for s in 0..sectors - 1 {
            let current = r * sectors + s;
            let above = (r + 1) * sectors + s;

            indices.extend_from_slice(&[current, current + 1, above]);
            indices.extend_from_slice(&[above, current + 1, above + 1]);
        }
    }

    log::debug!(
        "Generated sphere {}x{}: {} vertices, {} triangles",
        rings,
        sectors,
        vertices.len(),
        indices.len() / 3
    );

    Ok(Mesh { vertices, indices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_counts() {
        for (rings, sectors) in [(2, 2), (4, 4), (3, 7), (64, 64)] {
            let mesh = generate_sphere(rings, sectors).expect("valid sphere");
            let quads = ((rings - 1) * (sectors - 1)) as usize;
            assert_eq!(mesh.vertices.len(), (rings * sectors) as usize);
            assert_eq!(mesh.triangle_count(), quads * 2);
        }
    }

    #[test]
    fn test_four_by_four() {
        let mesh = generate_sphere(4, 4).expect("valid sphere");
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.triangle_count(), 18);

        let south = Vec3::from(mesh.vertices[0].position);
        assert_abs_diff_eq!(south, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-6);
        assert_eq!(&mesh.indices[0..6], &[0, 1, 4, 4, 1, 5]);
    }

    #[test]
    fn test_indices_in_bounds() {
        let mesh = generate_sphere(17, 9).expect("valid sphere");
        let limit = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < limit));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_positions_on_unit_sphere() {
        let mesh = generate_sphere(32, 24).expect("valid sphere");
        for vertex in &mesh.vertices {
            let norm = Vec3::from(vertex.position).norm();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_texcoords_span_unit_square() {
        let mesh = generate_sphere(5, 9).expect("valid sphere");
        let last = mesh.vertices.last().expect("non-empty");
        assert_eq!(mesh.vertices[0].tex_coord, [0.0, 0.0]);
        assert_abs_diff_eq!(last.tex_coord[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(last.tex_coord[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(last.position[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_triangles_wind_clockwise_from_outside() {
        let mesh = generate_sphere(8, 8).expect("valid sphere");
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(&(c - a));
            // Pole triangles collapse to slivers with zero area
            if normal.norm() < 1e-6 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(&centroid) < 0.0, "triangle {tri:?} faces outward");
        }
    }

    #[test]
    fn test_rejects_degenerate_resolution() {
        assert!(matches!(generate_sphere(1, 8), Err(RenderError::InvalidParameter(_))));
        assert!(matches!(generate_sphere(8, 1), Err(RenderError::InvalidParameter(_))));
        assert!(matches!(generate_sphere(0, 0), Err(RenderError::InvalidParameter(_))));
    }
}
