//! Multi-tier participant matching.
//!
//! Every participant of a snapshot lands in exactly one of four outcome
//! lists (exact, name-only, ambiguous, unmatched external) unless it is
//! skipped as a data-quality problem. Registrants never consumed by an exact
//! or name-only match are reported as unmatched internal.

use super::identity::{base_name, canonical_identity};
use super::index::IdentityIndex;
use crate::entities::registrations::Registrant;
use crate::quality::DataQualityNote;
use rosterlink_sdk::objects::ExternalParticipant;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A participant paired with exactly one registrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub participant: ExternalParticipant,
    pub registrant: Registrant,
}

/// A participant whose base name is claimed by several registrants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub participant: ExternalParticipant,
    pub candidates: Vec<Registrant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub exact: Vec<MatchedPair>,
    pub name_only: Vec<MatchedPair>,
    pub ambiguous: Vec<AmbiguousMatch>,
    pub unmatched_external: Vec<ExternalParticipant>,
    pub unmatched_internal: Vec<Registrant>,
    pub notes: Vec<DataQualityNote>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    /// Participants that reached an outcome list.
    pub participants: usize,
    pub exact: usize,
    pub name_only: usize,
    pub ambiguous: usize,
    pub unmatched_external: usize,
    pub unmatched_internal: usize,
    pub total_matched: usize,
}

impl MatchReport {
    pub fn summary(&self) -> MatchSummary {
        let exact = self.exact.len();
        let name_only = self.name_only.len();
        let ambiguous = self.ambiguous.len();
        let unmatched_external = self.unmatched_external.len();
        MatchSummary {
            participants: exact + name_only + ambiguous + unmatched_external,
            exact,
            name_only,
            ambiguous,
            unmatched_external,
            unmatched_internal: self.unmatched_internal.len(),
            total_matched: exact + name_only,
        }
    }
}

/// Partition `participants` against `registrants`.
///
/// Participants are visited in snapshot order and the first eligible
/// registrant wins. A participant whose `name#id` identity was already seen
/// is skipped. Pure: no I/O, never fails.
pub fn match_participants(
    participants: &[ExternalParticipant],
    registrants: &[Registrant],
) -> MatchReport {
    let index = IdentityIndex::build(registrants);
    let mut report = MatchReport::default();
    // Keyed on the canonical `name#id`, so two accounts sharing a display
    // name are both matched and only a repeat of the same account is skipped.
    let mut processed: HashSet<String> = HashSet::with_capacity(participants.len());
    let mut consumed: HashSet<i64> = HashSet::new();

    for (position, participant) in participants.iter().enumerate() {
        let display_name = participant.display_name.trim();
        if display_name.is_empty() {
            warn!(position, external_id = %participant.external_id, "Skipping participant with empty display name");
            report.notes.push(DataQualityNote::EmptyParticipantName {
                position,
                external_id: participant.external_id.clone(),
            });
            continue;
        }

        let identity = canonical_identity(display_name, &participant.external_id);
        if !processed.insert(identity.clone()) {
            warn!(%identity, "Skipping participant listed more than once");
            report
                .notes
                .push(DataQualityNote::DuplicateParticipant { identity });
            continue;
        }

        let participant = ExternalParticipant {
            display_name: display_name.to_owned(),
            ..participant.clone()
        };

        if let Some(registrant) = index.exact(&identity) {
            if consumed.insert(registrant.local_id) {
                debug!(%identity, local_id = registrant.local_id, "Exact match");
                report.exact.push(MatchedPair {
                    participant,
                    registrant: registrant.clone(),
                });
                continue;
            }
            debug!(%identity, local_id = registrant.local_id, "Exact candidate already consumed, trying base name");
        }

        let base = base_name(display_name);
        let candidates: Vec<&Registrant> = index
            .by_base(&base)
            .iter()
            .copied()
            .filter(|r| !consumed.contains(&r.local_id))
            .collect();

        match candidates.as_slice() {
            [] => {
                debug!(%identity, "No registrant matches participant");
                report.unmatched_external.push(participant);
            }
            [only] => {
                consumed.insert(only.local_id);
                debug!(%identity, local_id = only.local_id, "Name-only match");
                report.name_only.push(MatchedPair {
                    participant,
                    registrant: (*only).clone(),
                });
            }
            many => {
                info!(%identity, candidates = many.len(), "Ambiguous match");
                report.ambiguous.push(AmbiguousMatch {
                    participant,
                    candidates: many.iter().map(|r| (*r).clone()).collect(),
                });
            }
        }
    }

    report.unmatched_internal = index
        .eligible()
        .iter()
        .filter(|r| !consumed.contains(&r.local_id))
        .map(|r| (*r).clone())
        .collect();

    let summary = report.summary();
    info!(
        participants = participants.len(),
        registrants = index.eligible().len(),
        exact = summary.exact,
        name_only = summary.name_only,
        ambiguous = summary.ambiguous,
        unmatched_external = summary.unmatched_external,
        unmatched_internal = summary.unmatched_internal,
        skipped = report.notes.len(),
        "Matched participant snapshot"
    );

    report
}
