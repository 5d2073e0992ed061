//! Stage orchestration: one [`TrackFinder`] per configuration, one
//! [`TrackingResult`] per event.

mod config;
mod result;

pub use config::{ConfigError, TrackingConfig};
pub use result::{TrackRecord, TrackingResult};

use crate::clustering::find_clusters;
use crate::eventdata::{EventRecord, HitArena};
use crate::filters::{
    FacetFilter, FacetRelationFilter, FilterChoice, McTruth, Recorder, SegmentPairFilter,
    TrackQualityFilter,
};
use crate::hough::find_axial_seeds;
use crate::segments::find_segments;
use crate::topology::CdcLayout;
use crate::tracks::{build_tracks, cleanup_tracks};

/// The assembled pipeline. Construction validates the configuration and
/// wires the filters; processing is per event and strictly sequential.
///
/// One finder must not process events concurrently: the per-event hit
/// state (taken/background flags) is confined to each `process` call,
/// but the recording filter buffers accumulate across calls.
#[derive(Debug)]
pub struct TrackFinder {
    layout: CdcLayout,
    config: TrackingConfig,
    facet_filter: FacetFilter,
    facet_relation_filter: FacetRelationFilter,
    pair_filter: SegmentPairFilter,
    quality_filter: TrackQualityFilter,
    needs_truth: bool,
}

impl TrackFinder {
    /// Build the pipeline, failing fast on configuration problems.
    pub fn new(layout: CdcLayout, config: TrackingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let facet_choice = TrackingConfig::filter_choice("facet", &config.facet.filter)?;
        let relation_choice =
            TrackingConfig::filter_choice("facet_relation", &config.facet_relation.filter)?;
        let pair_choice =
            TrackingConfig::filter_choice("segment_pair", &config.segment_pair.filter)?;
        let quality_choice =
            TrackingConfig::filter_choice("track_quality", &config.track_quality.filter)?;

        let needs_truth = [facet_choice, relation_choice, pair_choice, quality_choice]
            .iter()
            .any(|c| matches!(c, FilterChoice::Truth | FilterChoice::Recording));

        Ok(Self {
            facet_filter: FacetFilter::new(
                facet_choice,
                config.facet.chi2_cut,
                config.facet.weight,
            ),
            facet_relation_filter: FacetRelationFilter::new(
                relation_choice,
                config.facet_relation.max_deflection,
                config.facet_relation.weight,
            ),
            pair_filter: SegmentPairFilter::new(pair_choice, config.segment_pair.max_chi2_ndf),
            quality_filter: TrackQualityFilter::new(
                quality_choice,
                config.track_quality.min_hits,
                config.track_quality.max_chi2_ndf,
            ),
            needs_truth,
            layout,
            config,
        })
    }

    pub fn layout(&self) -> &CdcLayout {
        &self.layout
    }

    // Recording buffers per relation kind, for draining the labeled
    // variable rows after `recording` runs.

    pub fn facet_recorder(&self) -> &Recorder {
        self.facet_filter.recorder()
    }

    pub fn facet_relation_recorder(&self) -> &Recorder {
        self.facet_relation_filter.recorder()
    }

    pub fn pair_recorder(&self) -> &Recorder {
        self.pair_filter.recorder()
    }

    pub fn quality_recorder(&self) -> &Recorder {
        self.quality_filter.recorder()
    }

    /// Run the full pipeline on one event. An event with zero hits or
    /// zero found tracks is a valid outcome, never an error.
    pub fn process(&self, event: &EventRecord) -> TrackingResult {
        let mut arena = HitArena::prepare(event, &self.layout);
        tracing::info!(n_hits = arena.len(), "event prepared");
        if arena.is_empty() {
            return TrackingResult::default();
        }

        let truth = self
            .needs_truth
            .then(|| McTruth::from_arena(&arena));
        let truth = truth.as_ref();

        let clusters = find_clusters(&mut arena, &self.layout, &self.config.clustering);
        let seeds = find_axial_seeds(&arena, &self.layout, &self.config.quadtree);
        let segments = find_segments(
            &clusters,
            &arena,
            &self.layout,
            &self.facet_filter,
            &self.facet_relation_filter,
            truth,
            &self.config.facet,
            &self.config.segment,
        );
        tracing::info!(
            n_clusters = clusters.len(),
            n_seeds = seeds.len(),
            n_segments = segments.len(),
            "local pattern recognition finished"
        );

        let candidates = build_tracks(
            &segments,
            &seeds,
            &arena,
            &self.layout,
            &self.pair_filter,
            truth,
            &self.config.segment_pair,
            &self.config.cleanup,
        );
        let tracks = cleanup_tracks(
            candidates,
            &mut arena,
            &self.layout,
            &self.quality_filter,
            truth,
            &self.config.cleanup,
        );

        TrackingResult {
            tracks: tracks
                .iter()
                .map(|t| TrackRecord::from_track(t, &arena))
                .collect(),
            n_hits: arena.len(),
            n_clusters: clusters.len(),
            n_segments: segments.len(),
            n_seeds: seeds.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_name_fails_at_setup() {
        let mut config = TrackingConfig::default();
        config.facet.filter = "tmva".into();
        let err = TrackFinder::new(CdcLayout::default(), config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFilter { kind: "facet", .. }));
    }

    #[test]
    fn recording_filters_collect_rows_for_every_relation_kind() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut config = TrackingConfig::default();
        config.facet.filter = "recording".into();
        config.facet_relation.filter = "recording".into();
        config.segment_pair.filter = "recording".into();
        config.track_quality.filter = "recording".into();
        let finder = TrackFinder::new(CdcLayout::default(), config).unwrap();

        let helix = crate::geometry::Helix::new(0.009, 0.8, 0.0, 0.2, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let hits = crate::sim::simulate_track(
            &helix,
            0,
            finder.layout(),
            &crate::sim::SimConfig::noiseless(),
            &mut rng,
        );
        let result = finder.process(&EventRecord { hits });
        assert_eq!(result.tracks.len(), 1);

        assert!(!finder.facet_recorder().is_empty());
        assert!(!finder.facet_relation_recorder().is_empty());
        assert!(!finder.pair_recorder().is_empty());
        assert!(!finder.quality_recorder().is_empty());
        // Draining leaves the buffers empty for the next run.
        assert!(!finder.facet_recorder().take_rows().is_empty());
        assert!(finder.facet_recorder().is_empty());
    }

    #[test]
    fn empty_event_yields_zero_tracks() {
        let finder =
            TrackFinder::new(CdcLayout::default(), TrackingConfig::default()).unwrap();
        let result = finder.process(&EventRecord { hits: vec![] });
        assert!(result.tracks.is_empty());
        assert_eq!(result.n_hits, 0);
    }
}
