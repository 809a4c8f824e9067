//! CPU version of what the skinning vertex shader does with the palette.
//! Useful for testing a palette and for picking against the posed mesh.

use crate::vertex::SkinnedVertex;
use nalgebra_glm as glm;

/// Weighted sum of the palette matrices influencing a vertex. Influences
/// with no weight or with a joint outside the palette are ignored. `None`
/// when nothing influences the vertex, which means it should stay rigid.
#[must_use]
pub fn blend_matrix(palette: &[glm::Mat4], vertex: &SkinnedVertex) -> Option<glm::Mat4> {
    let mut total = 0.0;
    let mut m = glm::Mat4::zeros();
    for (joint, weight) in vertex.joints().iter().zip(vertex.weights) {
        if weight <= 0.0 {
            continue;
        }
        if let Some(j) = palette.get(usize::from(*joint)) {
            m += j * weight;
            total += weight;
        }
    }
    (total > 0.0).then_some(m)
}

/// Deforms one vertex. The normal is renormalised.
#[must_use]
pub fn skin_vertex(palette: &[glm::Mat4], vertex: &SkinnedVertex) -> SkinnedVertex {
    let Some(m) = blend_matrix(palette, vertex) else {
        return *vertex;
    };
    let p = vertex.position;
    let n = vertex.normal;
    let position = m * glm::vec4(p[0], p[1], p[2], 1.0);
    let normal = glm::mat4_to_mat3(&m) * glm::vec3(n[0], n[1], n[2]);
    let normal = if glm::length(&normal) > f32::EPSILON {
        glm::normalize(&normal)
    } else {
        normal
    };
    SkinnedVertex {
        position: [position.x, position.y, position.z],
        normal: [normal.x, normal.y, normal.z],
        ..*vertex
    }
}

/// Deforms a whole mesh. An empty palette leaves the mesh rigid.
#[must_use]
pub fn skin_vertices(palette: &[glm::Mat4], vertices: &[SkinnedVertex]) -> Vec<SkinnedVertex> {
    if palette.is_empty() {
        return vertices.to_vec();
    }
    vertices.iter().map(|v| skin_vertex(palette, v)).collect()
}
