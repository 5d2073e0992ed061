//! End-to-end scenarios over the public pipeline API.

use rand::rngs::StdRng;
use rand::SeedableRng;

use cdctrack::clustering::{find_clusters, ClusteringConfig};
use cdctrack::eventdata::{EventRecord, HitArena, HitRecord};
use cdctrack::filters::{FacetFilter, FilterChoice};
use cdctrack::geometry::Helix;
use cdctrack::hough::{crosses_box, ConformalHit};
use cdctrack::segments::{create_facets, FacetConfig};
use cdctrack::sim::{simulate_track, SimConfig};
use cdctrack::topology::{CdcLayout, LayoutSpec, SuperLayerKind, SuperLayerSpec, WireId};
use cdctrack::{TrackFinder, TrackingConfig};

/// Layout with a single wire layer per super-layer: a crossing track
/// leaves exactly one hit per super-layer.
fn sparse_layout_spec() -> LayoutSpec {
    let mut superlayers = Vec::with_capacity(8);
    for isl in 0..8u8 {
        let kind = match isl % 4 {
            0 | 2 => SuperLayerKind::Axial,
            1 => SuperLayerKind::StereoU,
            _ => SuperLayerKind::StereoV,
        };
        superlayers.push(SuperLayerSpec {
            kind,
            n_layers: 1,
            inner_radius: 17.0 + 11.0 * isl as f64,
            layer_spacing: 1.5,
            n_wires: 160 + 32 * isl as u16,
            stereo_angle: 0.07,
            half_length: 110.0,
        });
    }
    LayoutSpec { superlayers }
}

fn sparse_event_config() -> TrackingConfig {
    let mut config = TrackingConfig::default();
    // Four axial hits are all a straight-through track leaves here.
    config.quadtree.min_leaf_hits = 4;
    // Single hits per super-layer must not count as background noise.
    config.clustering.min_cluster_size = 1;
    config
}

#[test]
fn single_straight_track_is_found_with_all_eight_hits() {
    let layout = CdcLayout::new(sparse_layout_spec());
    let helix = Helix::new(0.005, 0.3, 0.0, 0.2, 0.0);
    let mut rng = StdRng::seed_from_u64(101);
    let hits = simulate_track(&helix, 0, &layout, &SimConfig::noiseless(), &mut rng);
    assert_eq!(hits.len(), 8);

    let finder = TrackFinder::new(layout, sparse_event_config()).unwrap();
    let result = finder.process(&EventRecord { hits });
    assert_eq!(result.tracks.len(), 1);
    let track = &result.tracks[0];
    assert_eq!(track.n_hits(), 8);
    assert!(!track.axial_only);
    assert!((track.helix.curvature - 0.005).abs() < 2e-3);
    // Four stereo crossings at half-cell precision constrain the dip
    // only coarsely.
    assert!((track.helix.tan_lambda - 0.2).abs() < 0.2);
    assert!(track.helix.tan_lambda > 0.0);
}

#[test]
fn crossing_tracks_end_up_with_exclusive_hits() {
    let layout = CdcLayout::default();
    let mut rng = StdRng::seed_from_u64(102);
    let sim = SimConfig::noiseless();
    let mut hits = Vec::new();
    hits.extend(simulate_track(
        &Helix::new(0.010, 0.5, 0.0, 0.2, 0.0),
        0,
        &layout,
        &sim,
        &mut rng,
    ));
    hits.extend(simulate_track(
        &Helix::new(-0.012, 0.8, 0.0, -0.3, 1.0),
        1,
        &layout,
        &sim,
        &mut rng,
    ));

    let finder = TrackFinder::new(layout, TrackingConfig::default()).unwrap();
    let result = finder.process(&EventRecord { hits });
    assert_eq!(result.tracks.len(), 2);

    // Every hit is owned by at most one final track.
    let mut seen = std::collections::HashSet::new();
    for track in &result.tracks {
        assert!(track.n_hits() >= 30);
        for &hit in &track.hits {
            assert!(seen.insert(hit), "hit {hit} claimed twice");
        }
    }
}

#[test]
fn empty_event_yields_zero_tracks_without_error() {
    let finder = TrackFinder::new(CdcLayout::default(), TrackingConfig::default()).unwrap();
    let result = finder.process(&EventRecord { hits: vec![] });
    assert!(result.tracks.is_empty());
}

#[test]
fn background_cluster_yields_zero_accepted_facets() {
    let layout = CdcLayout::default();
    // A dense blob: five wires firing on three consecutive layers.
    let mut records = Vec::new();
    for layer in 0..3u8 {
        for wire in 40..45u16 {
            records.push(HitRecord {
                wire: WireId::new(0, layer, wire),
                drift_length: 0.1,
                drift_variance: 1e-4,
                mc_particle: None,
            });
        }
    }
    let mut arena = HitArena::prepare(&EventRecord { hits: records }, &layout);
    let clusters = find_clusters(&mut arena, &layout, &ClusteringConfig::default());
    assert!(clusters.iter().all(|c| c.background));

    let facet_config = FacetConfig::default();
    let filter = FacetFilter::new(FilterChoice::Simple, facet_config.chi2_cut, 3.0);
    for (ci, cluster) in clusters.iter().enumerate() {
        let facets = create_facets(ci, cluster, &arena, &layout, &filter, None, &facet_config);
        assert!(facets.is_empty());
    }
}

#[test]
fn facet_graph_is_acyclic_by_layer_ordering() {
    let layout = CdcLayout::default();
    let mut rng = StdRng::seed_from_u64(104);
    let records = simulate_track(
        &Helix::new(0.008, 1.0, 0.0, 0.1, 0.0),
        0,
        &layout,
        &SimConfig::noiseless(),
        &mut rng,
    );
    let mut arena = HitArena::prepare(&EventRecord { hits: records }, &layout);
    let clusters = find_clusters(&mut arena, &layout, &ClusteringConfig::default());
    let facet_config = FacetConfig::default();
    let filter = FacetFilter::new(FilterChoice::Simple, facet_config.chi2_cut, 3.0);
    let mut n_facets = 0;
    for (ci, cluster) in clusters.iter().enumerate() {
        for facet in create_facets(ci, cluster, &arena, &layout, &filter, None, &facet_config) {
            assert!(arena.hits[facet.end].clayer > arena.hits[facet.start].clayer);
            n_facets += 1;
        }
    }
    assert!(n_facets > 0);
}

#[test]
fn quadtree_subdivision_keeps_every_contained_hit() {
    use rand::Rng;
    let mut rng = StdRng::seed_from_u64(105);
    let hits: Vec<ConformalHit> = (0..200)
        .map(|_| {
            let r = rng.gen_range(17.0..100.0);
            let phi = rng.gen_range(0.0..std::f64::consts::TAU);
            ConformalHit::new(
                nalgebra::Vector2::new(r * f64::cos(phi), r * f64::sin(phi)),
                rng.gen_range(0.0..0.4),
            )
        })
        .collect();

    // Subdivide a few generations of boxes and check the invariant at
    // each: a hit crossing the parent crosses at least one child.
    let mut boxes = vec![((0.0, std::f64::consts::PI), (-0.05, 0.05))];
    for _ in 0..4 {
        let mut next = Vec::new();
        for (theta, curv) in boxes {
            let tm = 0.5 * (theta.0 + theta.1);
            let cm = 0.5 * (curv.0 + curv.1);
            let children = [
                ((theta.0, tm), (curv.0, cm)),
                ((theta.0, tm), (cm, curv.1)),
                ((tm, theta.1), (curv.0, cm)),
                ((tm, theta.1), (cm, curv.1)),
            ];
            for hit in &hits {
                if crosses_box(hit, theta, curv) {
                    assert!(
                        children.iter().any(|&(t, c)| crosses_box(hit, t, c)),
                        "hit lost between depth levels"
                    );
                }
            }
            next.extend(children);
        }
        boxes = next;
    }
}

#[test]
fn noisy_three_track_event_reconstructs_all_tracks() {
    let layout = CdcLayout::default();
    let mut rng = StdRng::seed_from_u64(106);
    let sim = SimConfig::default();
    let helices = [
        Helix::new(0.009, 0.4, 0.1, 0.3, -1.0),
        Helix::new(-0.011, 2.1, -0.1, -0.2, 1.5),
        Helix::new(0.014, 4.0, 0.0, 0.5, 0.0),
    ];
    let mut hits = Vec::new();
    for (particle, helix) in helices.iter().enumerate() {
        hits.extend(simulate_track(helix, particle as u32, &layout, &sim, &mut rng));
    }

    let finder = TrackFinder::new(layout, TrackingConfig::default()).unwrap();
    let result = finder.process(&EventRecord { hits });
    assert_eq!(result.tracks.len(), 3);

    // Each generated curvature is matched by exactly one found track.
    for helix in &helices {
        let matches = result
            .tracks
            .iter()
            .filter(|t| (t.helix.curvature - helix.curvature).abs() < 2e-3)
            .count();
        assert_eq!(matches, 1, "curvature {} unmatched", helix.curvature);
    }
}
