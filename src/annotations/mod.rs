//! Annotated entities (probands) and candidate groups
//!
//! The annotation population maps entity IDs to their ontology term lists.
//! An entity that was never phenotyped is simply absent from the map; an
//! entity with an empty term list was measured and had no findings. The two
//! are deliberately distinct.
use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::term::TermId;
use crate::{Ontology, PhenosimError, SimResult};

/// Ordered map of entity ID → annotation term list
///
/// Backed by a `BTreeMap` so iteration order (and with it complement
/// sampling under a seeded RNG) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    inner: BTreeMap<String, Vec<TermId>>,
}

impl Annotations {
    /// Creates an empty population
    pub fn new() -> Annotations {
        Annotations::default()
    }

    /// Adds (or replaces) the term list of one entity
    pub fn insert<S: Into<String>>(&mut self, entity: S, terms: Vec<TermId>) {
        self.inner.insert(entity.into(), terms);
    }

    /// The term list of an entity, `None` if the entity was never measured
    pub fn get(&self, entity: &str) -> Option<&[TermId]> {
        self.inner.get(entity).map(Vec::as_slice)
    }

    /// Returns `true` if the entity is part of the population
    pub fn contains(&self, entity: &str) -> bool {
        self.inner.contains_key(entity)
    }

    /// Iterates entities and their term lists in ID order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TermId])> {
        self.inner
            .iter()
            .map(|(entity, terms)| (entity.as_str(), terms.as_slice()))
    }

    /// Iterates the entity IDs in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Number of entities in the population
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if no entity was added
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Rewrites every term list against the ontology's resolution tables
    ///
    /// Obsolete terms are dropped (they have no node to attach to) and
    /// alternate IDs are replaced by their canonical term. Unknown terms
    /// are kept as-is; they fail later at tally time, which reports the
    /// offending entity.
    pub fn normalize(&mut self, ontology: &Ontology) {
        for (entity, terms) in self.inner.iter_mut() {
            let before = terms.len();
            terms.retain(|term| !ontology.obsolete_ids().contains(term));
            if terms.len() < before {
                debug!(entity = entity.as_str(), "dropped obsolete annotation terms");
            }
            for term in terms.iter_mut() {
                if let Some(canonical) = ontology.alternate_ids().get(term) {
                    *term = canonical.clone();
                }
            }
        }
    }
}

impl FromIterator<(String, Vec<TermId>)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (String, Vec<TermId>)>>(iter: I) -> Self {
        Annotations {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Ordered map of group label (e.g. a gene symbol) → member entity IDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    inner: BTreeMap<String, Vec<String>>,
}

impl Groups {
    /// Creates an empty group collection
    pub fn new() -> Groups {
        Groups::default()
    }

    /// Adds (or replaces) one candidate group
    pub fn insert<S: Into<String>>(&mut self, label: S, members: Vec<String>) {
        self.inner.insert(label.into(), members);
    }

    /// The members of a group
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.inner.get(label).map(Vec::as_slice)
    }

    /// Iterates groups in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner
            .iter()
            .map(|(label, members)| (label.as_str(), members.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if no group was added
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for Groups {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Groups {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Replaces every group's members with a random sample of outsiders
///
/// Each group keeps its size but receives entities drawn (without
/// replacement) from all group members that do not belong to it. Used to
/// verify that the similarity test produces null-distributed p-values on
/// shuffled input.
pub fn permute_groups<R: Rng + ?Sized>(groups: &Groups, rng: &mut R) -> SimResult<Groups> {
    let all: BTreeSet<&str> = groups
        .iter()
        .flat_map(|(_, members)| members.iter().map(String::as_str))
        .collect();

    let mut permuted = Groups::new();
    for (label, members) in groups.iter() {
        let pool: Vec<&str> = all
            .iter()
            .copied()
            .filter(|entity| !members.iter().any(|m| m == entity))
            .collect();
        if pool.len() < members.len() {
            return Err(PhenosimError::PopulationTooSmall {
                wanted: members.len(),
                available: pool.len(),
            });
        }
        let sample: Vec<String> = pool
            .choose_multiple(rng, members.len())
            .map(|entity| entity.to_string())
            .collect();
        permuted.insert(label, sample);
    }
    Ok(permuted)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn normalize_drops_obsolete_and_rewrites_alternates() {
        let ontology = crate::Ontology::from_obo_file("tests/small.obo").unwrap();
        let mut annotations = Annotations::new();
        annotations.insert(
            "person_01",
            vec![
                TermId::from("XX:0000006"), // obsolete
                TermId::from("XX:0009002"), // alt_id of XX:0000002
                TermId::from("XX:0000005"),
            ],
        );

        annotations.normalize(&ontology);
        assert_eq!(
            annotations.get("person_01"),
            Some(&[TermId::from("XX:0000002"), TermId::from("XX:0000005")][..])
        );
    }

    #[test]
    fn permuted_groups_exclude_own_members() {
        // each group's outsider pool (the other group's members) must be at
        // least as large as the group itself
        let mut groups = Groups::new();
        groups.insert(
            "GENE_A",
            vec![String::from("p1"), String::from("p2"), String::from("p3")],
        );
        groups.insert(
            "GENE_B",
            vec![String::from("p4"), String::from("p5"), String::from("p6")],
        );

        let mut rng = StdRng::seed_from_u64(7);
        let permuted = permute_groups(&groups, &mut rng).unwrap();

        let shuffled = permuted.get("GENE_A").unwrap();
        assert_eq!(shuffled.len(), 3);
        for member in shuffled {
            assert!(member != "p1" && member != "p2" && member != "p3");
        }

        let shuffled = permuted.get("GENE_B").unwrap();
        assert_eq!(shuffled.len(), 3);
        for member in shuffled {
            assert!(member != "p4" && member != "p5" && member != "p6");
        }
    }

    #[test]
    fn permutation_needs_enough_outsiders() {
        let mut groups = Groups::new();
        groups.insert("GENE_A", vec![String::from("p1"), String::from("p2")]);
        groups.insert("GENE_B", vec![String::from("p3")]);

        let mut rng = StdRng::seed_from_u64(7);
        let err = permute_groups(&groups, &mut rng).unwrap_err();
        assert_eq!(
            err,
            PhenosimError::PopulationTooSmall {
                wanted: 2,
                available: 1,
            }
        );
    }
}
