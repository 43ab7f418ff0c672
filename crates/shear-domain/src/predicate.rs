//! Boolean selection of subdomains by tag.

use shear_core::TagSet;

/// An AND/OR over a list of tags.
///
/// `Or` of an empty list selects nothing; `And` of an empty list selects
/// everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagPredicate {
    /// At least one tag is present.
    Or(Vec<String>),
    /// Every tag is present.
    And(Vec<String>),
}

impl TagPredicate {
    /// `Or` over `tags`.
    pub fn any_of(tags: &[&str]) -> Self {
        Self::Or(tags.iter().map(|t| (*t).to_owned()).collect())
    }

    /// `And` over `tags`.
    pub fn all_of(tags: &[&str]) -> Self {
        Self::And(tags.iter().map(|t| (*t).to_owned()).collect())
    }

    /// Selects every subdomain.
    pub fn everything() -> Self {
        Self::And(Vec::new())
    }

    /// Evaluate against a tag set.
    pub fn matches(&self, tags: &TagSet) -> bool {
        match self {
            Self::Or(list) => list.iter().any(|t| tags.contains(t)),
            Self::And(list) => list.iter().all(|t| tags.contains(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> TagSet {
        list.iter().copied().collect()
    }

    #[test]
    fn or_and_semantics() {
        let set = tags(&["volume", "N4"]);
        assert!(TagPredicate::any_of(&["glue-local", "volume"]).matches(&set));
        assert!(!TagPredicate::any_of(&["glue-local"]).matches(&set));
        assert!(TagPredicate::all_of(&["volume", "N4"]).matches(&set));
        assert!(!TagPredicate::all_of(&["volume", "N5"]).matches(&set));
    }

    #[test]
    fn empty_lists() {
        let set = tags(&["volume"]);
        assert!(!TagPredicate::Or(vec![]).matches(&set));
        assert!(TagPredicate::everything().matches(&set));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn all_of_a_subset_matches(
                tags_in in prop::collection::btree_set("[a-z]{1,6}", 1..8),
                take in 0usize..8,
            ) {
                let list: Vec<&str> = tags_in.iter().map(String::as_str).collect();
                let set: TagSet = list.iter().copied().collect();
                let subset = &list[..take.min(list.len())];
                prop_assert!(TagPredicate::all_of(subset).matches(&set));
            }

            #[test]
            fn any_of_matches_iff_some_tag_is_present(
                present in prop::collection::btree_set("[a-m]{1,3}", 0..6),
                wanted in prop::collection::vec("[a-m]{1,3}", 0..6),
            ) {
                let set: TagSet = present.iter().map(String::as_str).collect();
                let refs: Vec<&str> = wanted.iter().map(String::as_str).collect();
                let expected = wanted.iter().any(|t| present.contains(t));
                prop_assert_eq!(TagPredicate::any_of(&refs).matches(&set), expected);
            }
        }
    }
}
