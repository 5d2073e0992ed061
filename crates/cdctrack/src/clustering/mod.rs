//! Hit clustering: connected components over the wire neighborhood and
//! background tagging from cluster shape.
//!
//! Two granularities, both per super-layer: superclusters use a loose
//! neighborhood (adjacent layer, a few cells sideways), clusters refine
//! each supercluster with the tightest neighborhood. Background tagging
//! is a pure function of cluster shape; tagged hits stay in the arena
//! but carry the background flag for later stages to deprioritize.

use serde::{Deserialize, Serialize};

use crate::ca::AutomatonCell;
use crate::eventdata::HitArena;
use crate::topology::{circular_wire_distance, CdcLayout};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Maximum cell-index distance for the supercluster neighborhood.
    pub supercluster_wire_distance: u16,
    /// Maximum cell-index distance for the refined cluster neighborhood.
    pub cluster_wire_distance: u16,
    /// Clusters smaller than this are tagged background outright.
    pub min_cluster_size: usize,
    /// Clusters averaging more hits per occupied layer than this are
    /// tagged background (noise blobs fire many cells per layer).
    pub max_hits_per_layer: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            supercluster_wire_distance: 2,
            cluster_wire_distance: 1,
            min_cluster_size: 3,
            max_hits_per_layer: 4.0,
        }
    }
}

/// A connected component of wire hits within one super-layer.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub superlayer: u8,
    /// Hit arena indices, sorted by (continuous layer, wire).
    pub hits: Vec<usize>,
    pub background: bool,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of distinct continuous layers the cluster touches.
    pub fn layer_span(&self, arena: &HitArena) -> usize {
        let mut layers: Vec<u16> = self.hits.iter().map(|&i| arena.hits[i].clayer).collect();
        layers.sort_unstable();
        layers.dedup();
        layers.len()
    }
}

/// Group the arena's hits into refined clusters and tag background.
///
/// Sets [`AutomatonCell::BACKGROUND`] on every hit of a tagged cluster.
pub fn find_clusters(
    arena: &mut HitArena,
    layout: &CdcLayout,
    config: &ClusteringConfig,
) -> Vec<Cluster> {
    let superclusters = connected_components(
        arena,
        layout,
        &(0..arena.len()).collect::<Vec<_>>(),
        config.supercluster_wire_distance,
    );
    tracing::debug!(n_superclusters = superclusters.len(), "superclusters built");

    let mut clusters = Vec::new();
    for supercluster in &superclusters {
        for hits in connected_components(arena, layout, supercluster, config.cluster_wire_distance)
        {
            let superlayer = arena.hits[hits[0]].wire.superlayer;
            clusters.push(Cluster {
                superlayer,
                hits,
                background: false,
            });
        }
    }

    let mut n_background_hits = 0usize;
    for cluster in &mut clusters {
        cluster.background = is_background_shape(cluster, arena, config);
        if cluster.background {
            for &i in &cluster.hits {
                arena.hits[i].cell.set(AutomatonCell::BACKGROUND);
            }
            n_background_hits += cluster.len();
        }
    }
    tracing::debug!(
        n_clusters = clusters.len(),
        n_background_hits,
        "clusters refined and tagged"
    );
    clusters
}

/// Shape heuristic: tiny fragments and dense multi-hit-per-layer blobs
/// are background-like; a track crossing a super-layer leaves about one
/// hit per layer.
fn is_background_shape(cluster: &Cluster, arena: &HitArena, config: &ClusteringConfig) -> bool {
    if cluster.len() < config.min_cluster_size {
        return true;
    }
    let span = cluster.layer_span(arena).max(1);
    let density = cluster.len() as f64 / span as f64;
    density > config.max_hits_per_layer
}

/// BFS connected components over the given hit indices, restricted to one
/// super-layer each (the neighborhood never crosses super-layer gaps).
fn connected_components(
    arena: &HitArena,
    layout: &CdcLayout,
    indices: &[usize],
    wire_distance: u16,
) -> Vec<Vec<usize>> {
    let mut components = Vec::new();
    let mut visited = vec![false; indices.len()];
    for start in 0..indices.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![indices[start]];
        let mut queue = vec![start];
        while let Some(current) = queue.pop() {
            for other in 0..indices.len() {
                if visited[other] {
                    continue;
                }
                if are_neighbors(arena, layout, indices[current], indices[other], wire_distance) {
                    visited[other] = true;
                    component.push(indices[other]);
                    queue.push(other);
                }
            }
        }
        component.sort_by_key(|&i| (arena.hits[i].clayer, arena.hits[i].wire.wire));
        components.push(component);
    }
    components
}

fn are_neighbors(
    arena: &HitArena,
    layout: &CdcLayout,
    a: usize,
    b: usize,
    wire_distance: u16,
) -> bool {
    let ha = &arena.hits[a];
    let hb = &arena.hits[b];
    if ha.wire.superlayer != hb.wire.superlayer {
        return false;
    }
    if ha.clayer.abs_diff(hb.clayer) > 1 {
        return false;
    }
    let n_wires = layout.superlayer(ha.wire.superlayer).n_wires;
    circular_wire_distance(ha.wire.wire, hb.wire.wire, n_wires) <= wire_distance
}
