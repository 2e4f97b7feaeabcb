use super::engine::MatchReport;
use super::identity::normalize;
use crate::entities::registrations::Registrant;
use rosterlink_sdk::objects::admin::CleanupCategory;
use std::collections::HashSet;

/// Local user ids to unregister for `category`, deduplicated in first-seen
/// order.
///
/// `registrants` must be the list the report was computed from; it is only
/// consulted for [`CleanupCategory::UnmatchedExternal`], which selects
/// registrants whose whole claimed identity equals the display name of an
/// unmatched participant.
pub fn select_for_cleanup(
    report: &MatchReport,
    registrants: &[Registrant],
    category: CleanupCategory,
) -> Vec<i64> {
    let unmatched_internal = || report.unmatched_internal.iter().map(|r| r.local_id);
    let ambiguous = || {
        report
            .ambiguous
            .iter()
            .flat_map(|m| m.candidates.iter().map(|r| r.local_id))
    };

    let selected: Vec<i64> = match category {
        CleanupCategory::UnmatchedInternal => unmatched_internal().collect(),
        CleanupCategory::Ambiguous => ambiguous().collect(),
        CleanupCategory::All => unmatched_internal().chain(ambiguous()).collect(),
        CleanupCategory::UnmatchedExternal => {
            let names: HashSet<String> = report
                .unmatched_external
                .iter()
                .map(|p| normalize(&p.display_name))
                .collect();
            registrants
                .iter()
                .filter(|r| names.contains(&normalize(&r.claimed_identity)))
                .map(|r| r.local_id)
                .collect()
        }
    };

    let mut seen = HashSet::with_capacity(selected.len());
    selected.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::match_participants;
    use rosterlink_sdk::objects::ExternalParticipant;

    fn fixture() -> (Vec<Registrant>, MatchReport) {
        let registrants = vec![
            Registrant::new(1, "ava", "Ava#100"),
            Registrant::new(2, "bo-one", "Bo#1"),
            Registrant::new(3, "bo-two", "Bo#2"),
            Registrant::new(4, "idle", "Idle#4"),
            Registrant::new(5, "bare", "Ghost"),
        ];
        let participants = vec![
            ExternalParticipant::new("Ava", "100", ""),
            ExternalParticipant::new("Bo", "9", ""),
            ExternalParticipant::new("ghost", "55", ""),
        ];
        let report = match_participants(&participants, &registrants);
        (registrants, report)
    }

    #[test]
    fn test_all_is_union_without_duplicates() {
        let (registrants, report) = fixture();
        // "ghost#55" name-matches registrant 5 and consumes it.
        assert_eq!(
            select_for_cleanup(&report, &registrants, CleanupCategory::UnmatchedInternal),
            vec![2, 3, 4]
        );
        assert_eq!(
            select_for_cleanup(&report, &registrants, CleanupCategory::Ambiguous),
            vec![2, 3]
        );
        assert_eq!(
            select_for_cleanup(&report, &registrants, CleanupCategory::All),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn test_unmatched_external_compares_whole_identity() {
        let registrants = vec![
            Registrant::new(7, "hal", "Hal"),
            Registrant::new(8, "hal-tagged", "Hal#1"),
            Registrant::new(9, "hal-too", "Hal#2"),
        ];
        let report = MatchReport {
            unmatched_external: vec![ExternalParticipant::new(" HAL ", "3", "")],
            ..MatchReport::default()
        };
        assert_eq!(
            select_for_cleanup(&report, &registrants, CleanupCategory::UnmatchedExternal),
            vec![7]
        );
    }
}
