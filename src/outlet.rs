//! Spill-path routing from a lake's overflow point.
//!
//! Once a lake has a declared spill node, the overflow runs down the path of
//! steepest descent until it reaches another lake or leaves the network.
//! Chaining basins together from these paths is the flow router's concern;
//! this module only traces the path.

use crate::lake::{LakeId, NodeClaim};
use crate::mesh::Mesh;

/// Trace steepest descent from `spill_node` (exclusive) downslope.
///
/// The path ends at (and includes) the first node owned by a lake other
/// than `origin` or flagged draining; it ends early where no open lower
/// neighbor exists. `origin` should be a resolved lake handle. Iteration is
/// bounded by the node count to guard against cyclic surfaces.
pub fn trace_spill_path(
    mesh: &Mesh,
    surface: &[f32],
    claims: &[NodeClaim],
    origin: LakeId,
    spill_node: u32,
) -> Vec<u32> {
    let mut path = Vec::new();
    let mut cur = spill_node;
    for _ in 0..mesh.nodes {
        let z = surface[cur as usize];
        let mut best: Option<u32> = None;
        let mut best_z = z;
        for &n in &mesh.n1[cur as usize] {
            if mesh.closed[n as usize] {
                continue;
            }
            if surface[n as usize] < best_z {
                best_z = surface[n as usize];
                best = Some(n);
            }
        }
        let Some(next) = best else {
            break; // local dead end
        };
        path.push(next);
        match claims[next as usize] {
            NodeClaim::Owned(l) if l != origin => return path,
            _ => {}
        }
        if mesh.draining[next as usize] {
            return path;
        }
        cur = next;
    }
    path
}
