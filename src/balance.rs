//! Linear water volume-balance model.
//!
//! Extra volume gained or lost by a flooded node is modeled as
//! `c·area + K·area·depth`: a constant term charged once at first contact,
//! and a depth-proportional term applied per unit of every subsequent rise.
//! Both coefficients may be a single scalar or a per-node array, and both are
//! typically non-positive (evaporation, seepage), though gains are permitted.

/// A model coefficient: one value for the whole mesh, or one per node.
#[derive(Debug, Clone, PartialEq)]
pub enum Coeff {
    /// Single value applied at every node.
    Scalar(f64),
    /// Per-node values, indexed by node id.
    PerNode(Vec<f64>),
}

impl Coeff {
    /// Value of the coefficient at `node`.
    pub fn at(&self, node: usize) -> f64 {
        match self {
            Coeff::Scalar(v) => *v,
            Coeff::PerNode(vs) => vs[node],
        }
    }
}

/// The `(c, K)` coefficient pair of the linear balance model.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceTerms {
    /// Constant term, charged once when a node is first flooded.
    pub c: Coeff,
    /// Depth-proportional term, accumulated over all flooded nodes.
    pub k: Coeff,
}

impl BalanceTerms {
    /// A balance with no gain or loss anywhere.
    pub fn none() -> Self {
        Self { c: Coeff::Scalar(0.0), k: Coeff::Scalar(0.0) }
    }

    /// Area-weighted terms `(c·A, K·A)` at one node. Pure; called once per
    /// node per fill decision.
    pub fn at_node(&self, node: usize, cell_area: f64) -> (f64, f64) {
        (self.c.at(node) * cell_area, self.k.at(node) * cell_area)
    }
}

impl Default for BalanceTerms {
    fn default() -> Self {
        Self::none()
    }
}
