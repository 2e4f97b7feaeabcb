use super::identity::{base_name, normalize};
use crate::entities::registrations::Registrant;
use std::collections::HashMap;

/// Lookup tables over the registrants eligible for matching.
///
/// Built once per match or sync pass and borrowed from the registrant slice.
#[derive(Debug, Default)]
pub struct IdentityIndex<'a> {
    /// Normalised full claimed identity to registrant; later entries win.
    exact: HashMap<String, &'a Registrant>,
    /// Base name to every registrant sharing it, in input order.
    by_base: HashMap<String, Vec<&'a Registrant>>,
    /// Registrants with a non-blank claimed identity, in input order.
    eligible: Vec<&'a Registrant>,
}

impl<'a> IdentityIndex<'a> {
    pub fn build(registrants: &'a [Registrant]) -> Self {
        let mut index = Self::default();
        for registrant in registrants {
            let claimed = registrant.claimed_identity.trim();
            if claimed.is_empty() {
                continue;
            }
            index.exact.insert(normalize(claimed), registrant);
            index
                .by_base
                .entry(base_name(claimed))
                .or_default()
                .push(registrant);
            index.eligible.push(registrant);
        }
        index
    }

    /// Registrant whose claimed identity equals `identity`, ignoring case.
    pub fn exact(&self, identity: &str) -> Option<&'a Registrant> {
        self.exact.get(&normalize(identity)).copied()
    }

    /// Registrants whose claimed identity has the given base name.
    pub fn by_base(&self, base: &str) -> &[&'a Registrant] {
        self.by_base.get(base).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn eligible(&self) -> &[&'a Registrant] {
        &self.eligible
    }

    /// Resolve a team member to a registrant using exact matches only:
    /// `"{display_name}#{external_id}"` first when the id is known, then the
    /// bare display name.
    pub fn resolve_member(
        &self,
        display_name: &str,
        external_id: Option<&str>,
    ) -> Option<&'a Registrant> {
        let with_id = external_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .and_then(|id| self.exact(&format!("{}#{id}", display_name.trim())));
        with_id.or_else(|| self.exact(display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_registrant_wins_exact_slot() {
        let registrants = vec![
            Registrant::new(1, "first", "Ava#100"),
            Registrant::new(2, "second", "ava#100 "),
        ];
        let index = IdentityIndex::build(&registrants);

        assert_eq!(index.exact("AVA#100").map(|r| r.local_id), Some(2));
        assert_eq!(index.by_base("ava").len(), 2);
    }

    #[test]
    fn test_blank_identities_are_not_eligible() {
        let registrants = vec![
            Registrant::new(1, "blank", "   "),
            Registrant::new(2, "ok", "Bo#1"),
        ];
        let index = IdentityIndex::build(&registrants);
        assert_eq!(index.eligible().len(), 1);
        assert_eq!(index.eligible()[0].local_id, 2);
    }

    #[test]
    fn test_resolve_member_prefers_full_identity() {
        let registrants = vec![
            Registrant::new(1, "tagged", "Ava#100"),
            Registrant::new(2, "bare", "Ava"),
        ];
        let index = IdentityIndex::build(&registrants);

        assert_eq!(
            index.resolve_member("Ava", Some("100")).map(|r| r.local_id),
            Some(1)
        );
        assert_eq!(
            index.resolve_member("Ava", Some("999")).map(|r| r.local_id),
            Some(2)
        );
        assert_eq!(index.resolve_member("ava", None).map(|r| r.local_id), Some(2));
        assert!(index.resolve_member("Bo", Some("1")).is_none());
    }
}
