//! Mesh inputs: cell areas, adjacency, and node masks.
//!
//! The filling core does not build grids itself; it consumes a `Mesh`
//! assembled by the driver from whatever discretization is in play. A small
//! raster builder is provided for tests and simple drivers.

use smallvec::SmallVec;

/// Per-node mesh data consumed by the filling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Number of nodes.
    pub nodes: usize,
    /// Cell area at each node (m²).
    pub area: Vec<f32>,
    /// 1-ring neighbor node indices.
    pub n1: Vec<SmallVec<[u32; 6]>>,
    /// Nodes the algorithm must never explore.
    pub closed: Vec<bool>,
    /// Terminal boundary nodes; a lake that reaches one stops rising forever.
    pub draining: Vec<bool>,
}

/// Errors from assembling a mesh.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    /// A per-node field does not match the node count.
    #[error("field `{field}` has length {got}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending field.
        field: &'static str,
        /// Expected length (node count).
        expected: usize,
        /// Actual length supplied.
        got: usize,
    },
    /// An adjacency entry points outside the mesh.
    #[error("neighbor {neighbor} of node {node} is out of range")]
    NeighborOutOfRange {
        /// Node whose adjacency list is invalid.
        node: u32,
        /// The offending neighbor index.
        neighbor: u32,
    },
}

impl Mesh {
    /// Assemble a mesh from per-node arrays, validating lengths and adjacency.
    pub fn from_parts(
        area: Vec<f32>,
        n1: Vec<SmallVec<[u32; 6]>>,
        closed: Vec<bool>,
        draining: Vec<bool>,
    ) -> Result<Self, MeshError> {
        let nodes = area.len();
        if n1.len() != nodes {
            return Err(MeshError::LengthMismatch { field: "n1", expected: nodes, got: n1.len() });
        }
        if closed.len() != nodes {
            return Err(MeshError::LengthMismatch {
                field: "closed",
                expected: nodes,
                got: closed.len(),
            });
        }
        if draining.len() != nodes {
            return Err(MeshError::LengthMismatch {
                field: "draining",
                expected: nodes,
                got: draining.len(),
            });
        }
        for (i, nghbs) in n1.iter().enumerate() {
            for &n in nghbs {
                if n as usize >= nodes {
                    return Err(MeshError::NeighborOutOfRange { node: i as u32, neighbor: n });
                }
            }
        }
        Ok(Self { nodes, area, n1, closed, draining })
    }

    /// Build a 4-connected raster mesh, row-major node ids, uniform cell
    /// area `spacing²`. All masks start false.
    pub fn raster(rows: usize, cols: usize, spacing: f32) -> Self {
        let nodes = rows * cols;
        let mut n1: Vec<SmallVec<[u32; 6]>> = Vec::with_capacity(nodes);
        for r in 0..rows {
            for c in 0..cols {
                let mut nb: SmallVec<[u32; 6]> = SmallVec::new();
                if c + 1 < cols {
                    nb.push((r * cols + c + 1) as u32);
                }
                if r + 1 < rows {
                    nb.push(((r + 1) * cols + c) as u32);
                }
                if c > 0 {
                    nb.push((r * cols + c - 1) as u32);
                }
                if r > 0 {
                    nb.push(((r - 1) * cols + c) as u32);
                }
                n1.push(nb);
            }
        }
        Self {
            nodes,
            area: vec![spacing * spacing; nodes],
            n1,
            closed: vec![false; nodes],
            draining: vec![false; nodes],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_adjacency_counts() {
        let m = Mesh::raster(3, 4, 2.0);
        assert_eq!(m.nodes, 12);
        // corner, edge, interior
        assert_eq!(m.n1[0].len(), 2);
        assert_eq!(m.n1[1].len(), 3);
        assert_eq!(m.n1[5].len(), 4);
        assert!((m.area[0] - 4.0).abs() < 1e-12);
        // adjacency is symmetric
        for i in 0..m.nodes {
            for &j in &m.n1[i] {
                assert!(m.n1[j as usize].contains(&(i as u32)));
            }
        }
    }

    #[test]
    fn from_parts_rejects_bad_lengths() {
        let got =
            Mesh::from_parts(vec![1.0; 4], vec![SmallVec::new(); 3], vec![false; 4], vec![false; 4]);
        assert_eq!(got, Err(MeshError::LengthMismatch { field: "n1", expected: 4, got: 3 }));
    }

    #[test]
    fn from_parts_rejects_out_of_range_neighbor() {
        let mut n1: Vec<SmallVec<[u32; 6]>> = vec![SmallVec::new(); 2];
        n1[0].push(5);
        let got = Mesh::from_parts(vec![1.0; 2], n1, vec![false; 2], vec![false; 2]);
        assert_eq!(got, Err(MeshError::NeighborOutOfRange { node: 0, neighbor: 5 }));
    }
}
