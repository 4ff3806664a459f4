//! Volume-constrained level raising: the fill evaluator, the per-lake
//! raising engine, the merge procedure, and the pass driver.
//!
//! The engine works upward in elevation from each lake's current level,
//! raising the surface to the next-lowest frontier node. A raise stops when
//! the lake runs out of volume (resumable after recharge), when the frontier
//! reaches the declared spill of another lake at the same level (the lakes
//! merge and the raise continues under the surviving handle), or when it
//! reaches a sill or a draining node (the lake has spilled). All queue pops,
//! fill decisions and merges happen strictly in sequence; shared pass state
//! lives in one [`FillContext`] owned by the driver.

use log::{debug, trace};

use crate::balance::BalanceTerms;
use crate::lake::{Lake, LakeId, Lakes, NodeClaim};
use crate::mesh::Mesh;
use crate::queue::ElevQueue;

/// Errors from the filling pass.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FillError {
    /// Attempted to merge two lakes whose water levels differ. This is an
    /// invariant violation: contact is only possible at a common level.
    #[error("cannot merge lakes at different levels ({a} vs {b})")]
    LevelMismatch {
        /// Level of the lake being raised.
        a: f64,
        /// Level of the lake it touched.
        b: f64,
    },
    /// A per-node field does not match the mesh's node count.
    #[error("per-node field has length {got}, expected {expected}")]
    FieldLength {
        /// Expected length (mesh node count).
        expected: usize,
        /// Actual length supplied.
        got: usize,
    },
}

/// Water-level equality used as the merge precondition. Levels are raised to
/// exact frontier elevations, so this only needs to absorb float noise.
fn levels_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

/// Shared mutable state for one multi-lake fill pass.
///
/// The driver constructs one context per pass from the mesh, the
/// start-of-step water surface, and the balance terms; registers pits with
/// their incoming volumes; and repeatedly invokes [`raise_lake`] (directly
/// or via [`run_pass`]) as more volume becomes available over time steps.
///
/// [`raise_lake`]: FillContext::raise_lake
/// [`run_pass`]: FillContext::run_pass
#[derive(Debug)]
pub struct FillContext<'a> {
    /// Mesh supplying areas, adjacency, and the closed/draining masks.
    pub mesh: &'a Mesh,
    /// Water-surface elevation per node at the start of the step (m).
    pub surface: Vec<f32>,
    /// Linear volume-balance coefficients for this pass.
    pub terms: BalanceTerms,
    /// Ownership claim per node.
    pub claims: Vec<NodeClaim>,
    /// Lake arena for this pass.
    pub lakes: Lakes,
    /// Cross-lake queue: lakes that reached a sill, ordered by water level.
    pub active: ElevQueue,
}

impl<'a> FillContext<'a> {
    /// Create a pass context. `surface` is the water-surface elevation per
    /// node (equal to topography where no ponding pre-exists).
    pub fn new(
        mesh: &'a Mesh,
        surface: Vec<f32>,
        terms: BalanceTerms,
    ) -> Result<Self, FillError> {
        if surface.len() != mesh.nodes {
            return Err(FillError::FieldLength { expected: mesh.nodes, got: surface.len() });
        }
        Ok(Self {
            mesh,
            surface,
            terms,
            claims: vec![NodeClaim::Unclaimed; mesh.nodes],
            lakes: Lakes::new(),
            active: ElevQueue::new(),
        })
    }

    /// Replace the balance terms (e.g. when the loss model changes between
    /// time steps).
    pub fn set_balance(&mut self, terms: BalanceTerms) {
        self.terms = terms;
    }

    /// Register a pit with its incoming water volume. The lake starts at the
    /// pit's current surface elevation with the pit preloaded on its
    /// frontier.
    pub fn register_pit(&mut self, node: u32, volume: f64) -> LakeId {
        let level = f64::from(self.surface[node as usize]);
        let id = self.lakes.register(node, level, volume);
        self.lakes.get_mut(id).frontier.push(node, level);
        id
    }

    /// The lake for `id`, resolved through merges.
    pub fn lake(&self, id: LakeId) -> &Lake {
        self.lakes.get(self.lakes.resolve(id))
    }

    /// Final binary classification: true where a node is inundated.
    pub fn inundated(&self) -> Vec<bool> {
        self.claims.iter().map(|c| matches!(c, NodeClaim::Owned(_))).collect()
    }

    /// Add volume to a parked lake and clear its full flag so a later raise
    /// resumes from the leftover frontier.
    pub fn recharge(&mut self, id: LakeId, volume: f64) {
        let id = self.lakes.resolve(id);
        let lake = self.lakes.get_mut(id);
        lake.volume += volume;
        lake.full = false;
    }

    /// Withdraw a lake's sill designation so it may grow further (a
    /// capacity-aware caller's decision, when the outflow cannot carry the
    /// incoming flux). The sill node rejoins the frontier as an ordinary
    /// candidate at the lake's level: it was never flooded through, so the
    /// next raise floods it first and counts its area then. A drain spill is
    /// terminal and cannot be withdrawn. Returns whether the designation was
    /// cleared.
    pub fn clear_spill(&mut self, id: LakeId) -> bool {
        let id = self.lakes.resolve(id);
        let Some(s) = self.lakes.get(id).spill_node else {
            return false;
        };
        if self.mesh.draining[s as usize] {
            return false;
        }
        let lake = self.lakes.get_mut(id);
        lake.spill_node = None;
        let level = lake.level;
        lake.frontier.push(s, level);
        self.claims[s as usize] = NodeClaim::Candidate(id);
        true
    }

    /// Pop the lowest-level lake from the cross-lake queue, skipping handles
    /// retired by merges.
    pub fn next_active(&mut self) -> Option<LakeId> {
        while let Some(t) = self.active.pop() {
            let id = LakeId(t);
            if self.lakes.is_live(id) {
                return Some(id);
            }
        }
        None
    }

    /// Load a lake's frontier with its pit's open neighbors, claiming them
    /// as candidates. Idempotent; a no-op once seeded.
    pub fn seed_pit_neighbors(&mut self, id: LakeId) {
        let id = self.lakes.resolve(id);
        if self.lakes.get(id).seeded {
            return;
        }
        let mesh = self.mesh;
        let pit = self.lakes.get(id).pit;
        for &n in &mesh.n1[pit as usize] {
            if mesh.closed[n as usize] {
                continue;
            }
            self.lakes.get_mut(id).frontier.push(n, f64::from(self.surface[n as usize]));
            if !matches!(self.claims[n as usize], NodeClaim::Spill(_)) {
                self.claims[n as usize] = NodeClaim::Candidate(id);
            }
        }
        self.lakes.get_mut(id).seeded = true;
    }

    /// Evaluate one node-fill decision against lake `id`: can the lake rise
    /// by `dz_req` through `node`, and what does that do to its budget?
    ///
    /// The node is marked owned immediately, whatever the outcome. When
    /// `from_empty` is set the node's area joins the lake and its constant
    /// balance term is charged; if that alone drives the budget negative the
    /// fill fails at zero added depth (the node stays owned at the existing
    /// surface) and the spill designation is cleared. Otherwise the rise
    /// consumes `dz·area` adjusted by the accumulated depth-proportional
    /// term; an unaffordable rise yields the exact affordable fraction and
    /// zeroes the budget.
    ///
    /// Returns `(full_fill, dz_achieved)`. Does not move the lake level;
    /// the caller applies `dz_achieved`.
    pub fn fill_node(
        &mut self,
        id: LakeId,
        node: u32,
        dz_req: f64,
        from_empty: bool,
    ) -> (bool, f64) {
        let id = self.lakes.resolve(id);
        let Self { mesh, terms, claims, lakes, .. } = self;
        fill_one_node(lakes.get_mut(id), claims, mesh, terms, id, node, dz_req, from_empty)
    }

    /// Raise lake `id` until it exhausts its volume, merges into or absorbs
    /// another lake, or spills. Returns the surviving handle (which differs
    /// from `id` after a merge into a lower pit).
    ///
    /// Calling this on a lake with a determined spill node is a no-op. The
    /// frontier is assumed preloaded with the restart node: the pit on first
    /// call, or the leftover state from the previous call.
    pub fn raise_lake(&mut self, id: LakeId) -> Result<LakeId, FillError> {
        let mut cpit = self.lakes.resolve(id);
        if self.lakes.get(cpit).spill_node.is_some() {
            return Ok(cpit);
        }
        self.lakes.get_mut(cpit).full = false;

        // The first pop is the node the previous raise stopped at (or the
        // pit itself); it is flooded when the next frontier node is popped.
        let Some(mut cnode) = self.lakes.get_mut(cpit).frontier.pop() else {
            return Ok(cpit);
        };
        let mut stop_after_scan = false;
        while !stop_after_scan {
            let Some(nnode) = self.lakes.get_mut(cpit).frontier.pop() else {
                // Fully explored. Re-park the restart node so the frontier
                // contract still holds for any later call.
                let lake = self.lakes.get_mut(cpit);
                let level = lake.level;
                lake.frontier.push(cnode, level);
                break;
            };
            if matches!(self.claims[nnode as usize], NodeClaim::Owned(_)) {
                // Stale frontier entry; can arise after lakes are merged.
                continue;
            }
            trace!(
                "lake {}: flooding node {} toward node {} at z={}",
                cpit.0,
                cnode,
                nnode,
                self.surface[nnode as usize]
            );
            let from_empty = !matches!(self.claims[cnode as usize], NodeClaim::Owned(_));
            let dz_req = f64::from(self.surface[nnode as usize]) - self.lakes.get(cpit).level;
            let (filled, dz) = {
                let Self { mesh, terms, claims, lakes, .. } = self;
                fill_one_node(
                    lakes.get_mut(cpit),
                    claims,
                    mesh,
                    terms,
                    cpit,
                    cnode,
                    dz_req,
                    from_empty,
                )
            };
            self.lakes.get_mut(cpit).level += dz;

            if !filled {
                // Out of volume. Park the lake with both nodes back on the
                // frontier so a recharge resumes exactly here.
                debug!("lake {}: volume exhausted at node {}", cpit.0, cnode);
                let lake = self.lakes.get_mut(cpit);
                lake.full = true;
                let level = lake.level;
                lake.frontier.push(nnode, f64::from(self.surface[nnode as usize]));
                lake.frontier.push(cnode, level);
                break;
            }

            if let NodeClaim::Spill(other) = self.claims[nnode as usize] {
                let other = self.lakes.resolve(other);
                if other != cpit {
                    // We have risen to the declared spill of another lake:
                    // merge and keep raising the composite.
                    cpit = self.merge_lakes(cpit, other)?;
                    self.claims[nnode as usize] = NodeClaim::Owned(cpit);
                    cnode = nnode;
                    continue;
                }
            }

            if self.mesh.draining[nnode as usize] {
                // Terminal boundary: this lake never rises again.
                debug!("lake {}: reached draining node {}", cpit.0, nnode);
                self.claims[nnode as usize] = NodeClaim::Spill(cpit);
                self.lakes.get_mut(cpit).spill_node = Some(nnode);
                break;
            }

            cnode = nnode;
            let z_c = self.surface[cnode as usize];
            let level = self.lakes.get(cpit).level;
            let mesh = self.mesh;
            for &n in &mesh.n1[cnode as usize] {
                if mesh.closed[n as usize] {
                    continue;
                }
                match self.claims[n as usize] {
                    NodeClaim::Owned(l) | NodeClaim::Candidate(l) if l == cpit => continue,
                    _ => {}
                }
                if self.surface[n as usize] < z_c {
                    // All frontier routes from below are already queued, so a
                    // falling open neighbor makes the current node a true
                    // sill. Claim it, then keep loading the remaining
                    // neighbors so a later recharge can resume cleanly.
                    debug!("lake {}: sill at node {} (drops toward {})", cpit.0, cnode, n);
                    self.claims[cnode as usize] = NodeClaim::Spill(cpit);
                    self.lakes.get_mut(cpit).spill_node = Some(cnode);
                    self.active.push(cpit.0, level);
                    stop_after_scan = true;
                } else {
                    self.lakes
                        .get_mut(cpit)
                        .frontier
                        .push(n, f64::from(self.surface[n as usize]));
                    // A candidate claim never downgrades a declared spill.
                    if !matches!(self.claims[n as usize], NodeClaim::Spill(_)) {
                        self.claims[n as usize] = NodeClaim::Candidate(cpit);
                    }
                }
            }
        }
        Ok(cpit)
    }

    /// Merge two lakes known to sit at the same level and to be in contact.
    ///
    /// The lake whose pit has the lower surface elevation survives: it
    /// absorbs the other's frontier, area, volume, and accumulated loss
    /// term; ownership of the retired lake's nodes transfers; the survivor's
    /// spill designation is cleared for re-derivation. Returns the survivor.
    pub fn merge_lakes(&mut self, a: LakeId, b: LakeId) -> Result<LakeId, FillError> {
        let a = self.lakes.resolve(a);
        let b = self.lakes.resolve(b);
        if a == b {
            return Ok(a);
        }
        let (la, lb) = (self.lakes.get(a).level, self.lakes.get(b).level);
        if !levels_close(la, lb) {
            return Err(FillError::LevelMismatch { a: la, b: lb });
        }
        let z_pit = |id: LakeId| f64::from(self.surface[self.lakes.get(id).pit as usize]);
        let (low, hi) = if z_pit(a) < z_pit(b) { (a, b) } else { (b, a) };
        debug!("merging lake {} into lake {} at level {}", hi.0, low.0, la);

        let hi_lake = self.lakes.get_mut(hi);
        let hi_frontier = std::mem::take(&mut hi_lake.frontier);
        let (h_area, h_vol, h_k) = (hi_lake.area, hi_lake.volume, hi_lake.accum_k);
        hi_lake.area = 0.0;
        hi_lake.volume = 0.0;
        hi_lake.accum_k = 0.0;
        hi_lake.merged_into = Some(low);

        let low_lake = self.lakes.get_mut(low);
        low_lake.frontier.merge(hi_frontier);
        low_lake.area += h_area;
        low_lake.volume += h_vol;
        low_lake.accum_k += h_k;
        low_lake.spill_node = None;

        for c in &mut self.claims {
            if *c == NodeClaim::Owned(hi) {
                *c = NodeClaim::Owned(low);
            }
        }
        Ok(low)
    }

    /// Run one pass over all registered lakes, lowest starting level first:
    /// seed each unseeded pit neighborhood and raise the lake once. Lakes
    /// that spill enter the cross-lake queue; lakes that exhaust park with
    /// `full` set. Re-invocable on later time steps after recharges.
    pub fn run_pass(&mut self) -> Result<(), FillError> {
        let mut order: Vec<(f64, LakeId)> =
            self.lakes.iter_live().map(|(id, l)| (l.level, id)).collect();
        order.sort_by(|x, y| x.0.total_cmp(&y.0));
        for (_, id) in order {
            if !self.lakes.is_live(id) {
                continue; // merged away earlier in this pass
            }
            if self.lakes.get(id).spill_node.is_some() {
                continue;
            }
            self.seed_pit_neighbors(id);
            self.raise_lake(id)?;
        }
        Ok(())
    }
}

/// The fill decision against one lake record; see [`FillContext::fill_node`].
#[allow(clippy::too_many_arguments)]
fn fill_one_node(
    lake: &mut Lake,
    claims: &mut [NodeClaim],
    mesh: &Mesh,
    terms: &BalanceTerms,
    id: LakeId,
    node: u32,
    dz_req: f64,
    from_empty: bool,
) -> (bool, f64) {
    // One way or another, the node is now in the lake.
    claims[node as usize] = NodeClaim::Owned(id);
    let cell_area = f64::from(mesh.area[node as usize]);
    if from_empty {
        lake.area += cell_area;
    }
    let mut v_need = dz_req * lake.area;
    let (c_term, k_term) = terms.at_node(node as usize, cell_area);
    if from_empty {
        lake.volume += c_term;
        if lake.volume < 0.0 {
            // The constant charge alone sank the budget: the node stays
            // flooded at zero added depth.
            lake.spill_node = None;
            return (false, 0.0);
        }
    }
    // A lossy lake needs more volume for the same rise; a gaining one less.
    v_need -= (k_term + lake.accum_k) * dz_req;
    if lake.volume < v_need {
        let frac = lake.volume / v_need;
        lake.spill_node = None;
        lake.volume = 0.0;
        (false, frac * dz_req)
    } else {
        // Fold this node's depth term in so later rises already reflect it.
        lake.accum_k += k_term;
        lake.volume -= v_need;
        (true, dz_req)
    }
}
