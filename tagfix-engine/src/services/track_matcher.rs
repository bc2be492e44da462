//! Track alignment
//!
//! Aligns the local tracklist against a source tracklist per disc so diffs
//! can be reported slot-by-slot even when the counts differ. The alignment
//! is strictly positional: tracks are grouped by disc number, sorted by
//! position, and walked index-by-index. This assumes the catalog preserves
//! relative ordering, which holds for well-formed releases; a reordered
//! tracklist will misalign. Known limitation: a similarity-based realignment
//! fallback was considered and deliberately left out.

use crate::models::{
    SourceTrack, TrackChange, TrackDiff, TrackListSummary, TrackRecord, TrackSlot,
};
use crate::services::normalizer::are_equal;
use crate::services::text_diff::diff_parts;
use std::collections::BTreeMap;

/// Align two tracklists and produce per-slot diffs plus rollup counts
///
/// Total for any pair of inputs (both may be empty). Output length is
/// `max(len(current), len(source))` summed per disc; every input track
/// appears in exactly one slot.
pub fn match_tracks(
    current: &[TrackRecord],
    source: &[SourceTrack],
) -> (Vec<TrackDiff>, TrackListSummary) {
    // Group by disc, keeping discs ordered
    let mut discs: BTreeMap<u32, (Vec<&TrackRecord>, Vec<&SourceTrack>)> = BTreeMap::new();
    for track in current {
        discs.entry(track.disc_number).or_default().0.push(track);
    }
    for track in source {
        discs.entry(track.disc_number).or_default().1.push(track);
    }

    let mut diffs = Vec::new();
    let mut summary = TrackListSummary {
        total_current: current.len(),
        total_source: source.len(),
        ..Default::default()
    };

    for (disc_number, (mut current_disc, mut source_disc)) in discs {
        current_disc.sort_by_key(|t| t.position);
        source_disc.sort_by_key(|t| t.position);

        let slots = current_disc.len().max(source_disc.len());
        for index in 0..slots {
            let diff = match (current_disc.get(index), source_disc.get(index)) {
                (Some(cur), Some(src)) => diff_slot(disc_number, cur, src),
                (Some(cur), None) => TrackDiff {
                    disc_number,
                    position: cur.position,
                    change: TrackChange::Removed,
                    current: Some(current_slot(cur)),
                    source: None,
                    current_track_guid: Some(cur.guid),
                    title_parts: None,
                    duration_delta_ms: None,
                },
                (None, Some(src)) => TrackDiff {
                    disc_number,
                    position: src.position,
                    change: TrackChange::Added,
                    current: None,
                    source: Some(source_slot(src)),
                    current_track_guid: None,
                    title_parts: None,
                    duration_delta_ms: None,
                },
                (None, None) => unreachable!("slot index below max of both lengths"),
            };

            match diff.change {
                TrackChange::Match => summary.matching += 1,
                TrackChange::Modified => summary.modified += 1,
                TrackChange::Added => summary.added += 1,
                TrackChange::Removed => summary.removed += 1,
            }
            diffs.push(diff);
        }
    }

    tracing::debug!(
        total_current = summary.total_current,
        total_source = summary.total_source,
        matching = summary.matching,
        modified = summary.modified,
        added = summary.added,
        removed = summary.removed,
        "Track alignment complete"
    );

    (diffs, summary)
}

/// Diff one aligned slot where both sides are present
fn diff_slot(disc_number: u32, cur: &TrackRecord, src: &SourceTrack) -> TrackDiff {
    let titles_equal = are_equal(&cur.title, &src.title);

    let (change, title_parts, duration_delta_ms) = if titles_equal {
        (TrackChange::Match, None, None)
    } else {
        let delta = match (cur.duration_ms, src.duration_ms) {
            (Some(c), Some(s)) if c != s => Some(c.abs_diff(s)),
            _ => None,
        };
        (
            TrackChange::Modified,
            Some(diff_parts(&cur.title, &src.title)),
            delta,
        )
    };

    TrackDiff {
        // Report the slot under the source position; positional alignment
        // means the two sides can disagree on numbering
        disc_number,
        position: src.position,
        change,
        current: Some(current_slot(cur)),
        source: Some(source_slot(src)),
        current_track_guid: Some(cur.guid),
        title_parts,
        duration_delta_ms,
    }
}

fn current_slot(track: &TrackRecord) -> TrackSlot {
    TrackSlot {
        title: track.title.clone(),
        duration_ms: track.duration_ms,
        recording_mbid: track.recording_mbid.clone(),
    }
}

fn source_slot(track: &SourceTrack) -> TrackSlot {
    TrackSlot {
        title: track.title.clone(),
        duration_ms: track.duration_ms,
        recording_mbid: track.recording_mbid.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn local(disc: u32, pos: u32, title: &str) -> TrackRecord {
        TrackRecord {
            guid: Uuid::new_v4(),
            disc_number: disc,
            position: pos,
            title: title.to_string(),
            duration_ms: None,
            recording_mbid: None,
        }
    }

    fn remote(disc: u32, pos: u32, title: &str) -> SourceTrack {
        SourceTrack {
            disc_number: disc,
            position: pos,
            title: title.to_string(),
            duration_ms: None,
            recording_mbid: None,
        }
    }

    #[test]
    fn test_source_adds_a_track() {
        let current = vec![local(1, 1, "Come Together"), local(1, 2, "Something")];
        let source = vec![
            remote(1, 1, "Come Together"),
            remote(1, 2, "Something"),
            remote(1, 3, "Maxwell's Silver Hammer"),
        ];

        let (diffs, summary) = match_tracks(&current, &source);

        assert_eq!(diffs.len(), 3);
        assert_eq!(diffs[0].change, TrackChange::Match);
        assert_eq!(diffs[1].change, TrackChange::Match);
        assert_eq!(diffs[2].change, TrackChange::Added);
        assert_eq!(
            summary,
            TrackListSummary {
                total_current: 2,
                total_source: 3,
                matching: 2,
                modified: 0,
                added: 1,
                removed: 0,
            }
        );
    }

    #[test]
    fn test_current_has_extra_track() {
        let current = vec![local(1, 1, "One"), local(1, 2, "Hidden Bonus")];
        let source = vec![remote(1, 1, "One")];

        let (diffs, summary) = match_tracks(&current, &source);

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[1].change, TrackChange::Removed);
        assert_eq!(summary.removed, 1);
    }

    #[test]
    fn test_modified_title_carries_parts() {
        let current = vec![local(1, 1, "Let It Be")];
        let source = vec![remote(1, 1, "Let It Be (Remastered)")];

        let (diffs, _) = match_tracks(&current, &source);

        assert_eq!(diffs[0].change, TrackChange::Modified);
        let parts = diffs[0].title_parts.as_ref().unwrap();
        assert!(parts.iter().any(|p| p.added && p.value.contains("(Remastered)")));
    }

    #[test]
    fn test_duration_delta_on_modified_slot() {
        let mut cur = local(1, 1, "Octopus's Garden");
        cur.duration_ms = Some(200_000);
        let mut src = remote(1, 1, "Octopus' Garden");
        src.duration_ms = Some(203_500);

        let (diffs, summary) = match_tracks(&[cur], &[src]);

        assert_eq!(diffs[0].change, TrackChange::Modified);
        assert_eq!(diffs[0].duration_delta_ms, Some(3_500));
        assert!(diffs[0].title_parts.is_some());
        assert_eq!(summary.modified, 1);
    }

    #[test]
    fn test_equal_titles_match_even_with_duration_drift() {
        let mut cur = local(1, 1, "Same Title");
        cur.duration_ms = Some(200_000);
        let mut src = remote(1, 1, "Same Title");
        src.duration_ms = Some(203_500);

        let (diffs, _) = match_tracks(&[cur], &[src]);
        assert_eq!(diffs[0].change, TrackChange::Match);
        assert!(diffs[0].duration_delta_ms.is_none());
    }

    #[test]
    fn test_title_match_is_normalized() {
        let current = vec![local(1, 1, "Déjà Vu")];
        let source = vec![remote(1, 1, "deja  vu")];

        let (diffs, _) = match_tracks(&current, &source);
        assert_eq!(diffs[0].change, TrackChange::Match);
    }

    #[test]
    fn test_discs_align_independently() {
        let current = vec![local(1, 1, "D1T1"), local(2, 1, "D2T1")];
        let source = vec![
            remote(1, 1, "D1T1"),
            remote(2, 1, "D2T1"),
            remote(2, 2, "D2T2"),
        ];

        let (diffs, summary) = match_tracks(&current, &source);

        assert_eq!(diffs.len(), 3);
        assert_eq!(summary.matching, 2);
        assert_eq!(summary.added, 1);
        // The added slot belongs to disc 2
        let added = diffs.iter().find(|d| d.change == TrackChange::Added).unwrap();
        assert_eq!(added.disc_number, 2);
        assert_eq!(added.position, 2);
    }

    #[test]
    fn test_empty_inputs_are_total() {
        let (diffs, summary) = match_tracks(&[], &[]);
        assert!(diffs.is_empty());
        assert_eq!(summary, TrackListSummary::default());
    }

    #[test]
    fn test_slot_count_is_max_per_disc() {
        // Disc 1: 3 current vs 1 source; disc 2: 0 current vs 2 source
        let current = vec![local(1, 1, "a"), local(1, 2, "b"), local(1, 3, "c")];
        let source = vec![remote(1, 1, "a"), remote(2, 1, "x"), remote(2, 2, "y")];

        let (diffs, _) = match_tracks(&current, &source);
        assert_eq!(diffs.len(), 3 + 2);

        // Every current track appears exactly once as a current slot
        let current_slots = diffs.iter().filter(|d| d.current.is_some()).count();
        assert_eq!(current_slots, 3);
        let source_slots = diffs.iter().filter(|d| d.source.is_some()).count();
        assert_eq!(source_slots, 3);
    }
}
