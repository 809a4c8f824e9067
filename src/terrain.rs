//! Height of the hill the scene is built on. The ground is a single bicubic
//! Bezier patch covering `[-world_size, world_size]` on X and Z with the edges
//! near zero and a raised middle.

use serde::{Deserialize, Serialize};

/// Shape of the terrain patch
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Terrain {
    /// Half the width of the square patch
    pub world_size: f32,
    pub hill_height: f32,
}

impl Default for Terrain {
    fn default() -> Self {
        Self {
            world_size: 110.0,
            hill_height: 56.25,
        }
    }
}

/// Cubic Bernstein basis
fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

impl Terrain {
    /// Height factors of the 4x4 control grid. Corners sit on the ground,
    /// the other edge points are lifted slightly and the inner four carry
    /// most of the hill.
    const CONTROL: [[f32; 4]; 4] = [
        [0.0, 0.1, 0.1, 0.0],
        [0.1, 0.6, 0.6, 0.1],
        [0.1, 0.6, 0.6, 0.1],
        [0.0, 0.1, 0.1, 0.0],
    ];

    #[must_use]
    pub const fn new(world_size: f32, hill_height: f32) -> Self {
        Self {
            world_size,
            hill_height,
        }
    }

    #[must_use]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        (-self.world_size..=self.world_size).contains(&x)
            && (-self.world_size..=self.world_size).contains(&z)
    }

    /// Ground height at a point, `None` off the edge of the world
    #[must_use]
    pub fn height(&self, x: f32, z: f32) -> Option<f32> {
        if !self.contains(x, z) {
            return None;
        }
        let span = 2.0 * self.world_size;
        let u = ((x + self.world_size) / span).clamp(0.0, 1.0);
        let v = ((z + self.world_size) / span).clamp(0.0, 1.0);

        let bu = bernstein(u);
        let bv = bernstein(v);
        let mut h = 0.0;
        for (i, row) in Self::CONTROL.iter().enumerate() {
            for (j, factor) in row.iter().enumerate() {
                h += factor * bu[i] * bv[j];
            }
        }
        Some(h * self.hill_height)
    }

    /// Height with a fallback for positions off the edge
    #[must_use]
    pub fn height_or(&self, x: f32, z: f32, fallback: f32) -> f32 {
        self.height(x, z).unwrap_or(fallback)
    }
}
