//! Annotation tallies and information-content statistics on the ontology
use std::cell::{OnceCell, RefCell};
use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::annotations::Annotations;
use crate::term::{TermId, TermIdx};
use crate::{Ontology, PhenosimError, SimResult};

/// Set of arena indices, used for ancestor/descendant closures
type IdxSet = HashSet<TermIdx>;

/// The ontology DAG plus per-term usage tallies and memoized statistics
///
/// A `SimilarityGraph` is created from a built [`Ontology`], tallied once
/// with the full entity population and then only read. All caches live on
/// the instance itself, so multiple graphs can coexist in one process
/// without interfering with each other.
///
/// Lifecycle contract: call [`tally`](SimilarityGraph::tally) exactly once,
/// optionally [`precompute`](SimilarityGraph::precompute), then treat the
/// graph as frozen while scoring. Ancestor and descendant closures, term
/// counts and information content are computed on first use and never
/// recomputed; the most-informative-common-ancestor values are cached per
/// unordered term pair.
pub struct SimilarityGraph {
    ontology: Ontology,
    /// entity IDs directly annotated with each term (not descendants)
    annotated: Vec<HashSet<String>>,
    /// total number of entity/term annotation pairs tallied
    total_freq: u64,
    /// ancestor closure per term, including the term itself
    ancestors: Vec<OnceCell<IdxSet>>,
    /// descendant closure per term, excluding the term itself
    descendants: Vec<OnceCell<IdxSet>>,
    /// distinct entities annotated with the term or any descendant
    counts: Vec<OnceCell<u64>>,
    /// -ln(count / total_freq) per term
    ic: Vec<OnceCell<f64>>,
    /// most informative common ancestor IC, keyed by ordered index pair
    mica: RefCell<HashMap<(TermIdx, TermIdx), f64>>,
}

impl SimilarityGraph {
    /// Wraps a built ontology, with all tallies empty
    pub fn new(ontology: Ontology) -> SimilarityGraph {
        let n = ontology.len();
        SimilarityGraph {
            ontology,
            annotated: vec![HashSet::new(); n],
            total_freq: 0,
            ancestors: vec![OnceCell::new(); n],
            descendants: vec![OnceCell::new(); n],
            counts: vec![OnceCell::new(); n],
            ic: vec![OnceCell::new(); n],
            mica: RefCell::new(HashMap::new()),
        }
    }

    /// Read-only access to the underlying ontology
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// Total number of entity/term annotation pairs tallied
    pub fn total_annotations(&self) -> u64 {
        self.total_freq
    }

    /// Tallies the annotations of the full entity population
    ///
    /// Every entity/term pair associates the entity ID with the term's node
    /// and increments the total annotation count. Repeated pairs are
    /// idempotent. Terms are resolved through the alternate-ID table; a
    /// term that still cannot be found fails the whole tally, because
    /// silently dropping it would understate term rarity and bias every
    /// downstream information-content value.
    pub fn tally(&mut self, annotations: &Annotations) -> SimResult<()> {
        for (entity, terms) in annotations.iter() {
            for term in terms {
                let idx = self
                    .ontology
                    .canonical(term)
                    .and_then(|id| self.ontology.idx_of(id))
                    .ok_or_else(|| PhenosimError::UnknownTerm {
                        entity: entity.to_string(),
                        term: term.clone(),
                    })?;
                if self.annotated[idx as usize].insert(entity.to_string()) {
                    self.total_freq += 1;
                }
            }
        }

        // counts and IC derive from the tallies and must not survive a re-tally
        let n = self.ontology.len();
        self.counts = vec![OnceCell::new(); n];
        self.ic = vec![OnceCell::new(); n];
        self.mica.borrow_mut().clear();

        info!(
            entities = annotations.len(),
            annotations = self.total_freq,
            "tallied annotation population"
        );
        Ok(())
    }

    /// Fills every per-term cache so subsequent scoring only reads
    ///
    /// After `precompute` the only remaining lazily written state is the
    /// pairwise common-ancestor cache.
    pub fn precompute(&mut self) {
        for idx in 0..self.ontology.len() as TermIdx {
            self.ancestor_set(idx);
            self.descendant_set(idx);
            self.term_count_idx(idx);
            self.information_content_idx(idx);
        }
    }

    /// The entity IDs directly annotated with exactly this term
    ///
    /// Descendant usage is not included; see
    /// [`term_count`](SimilarityGraph::term_count) for the propagated
    /// count. Terms never tallied (or absent) yield an empty set.
    pub fn annotated_ids(&self, term: &TermId) -> HashSet<&str> {
        match self.ontology.idx_of(term) {
            Some(idx) => self.annotated[idx as usize]
                .iter()
                .map(String::as_str)
                .collect(),
            None => HashSet::new(),
        }
    }

    /// All terms reachable by following edges away from the root
    ///
    /// Terminal terms yield an empty set, as do terms absent from the
    /// graph.
    pub fn descendants(&self, term: &TermId) -> HashSet<&TermId> {
        match self.ontology.idx_of(term) {
            Some(idx) => self
                .descendant_set(idx)
                .iter()
                .map(|d| self.ontology.term_by_idx(*d).id())
                .collect(),
            None => HashSet::new(),
        }
    }

    /// All ancestor terms, including the term itself
    ///
    /// Self-inclusion makes common-ancestor intersection well defined when
    /// both query terms are the same node.
    pub fn ancestors(&self, term: &TermId) -> HashSet<&TermId> {
        match self.ontology.idx_of(term) {
            Some(idx) => self
                .ancestor_set(idx)
                .iter()
                .map(|a| self.ontology.term_by_idx(*a).id())
                .collect(),
            None => HashSet::new(),
        }
    }

    /// Number of distinct entities annotated with this term or any of its
    /// descendants
    ///
    /// Usage propagates up the hierarchy: annotating a leaf counts for the
    /// whole ancestor chain. Terms absent from the graph return 0.
    pub fn term_count(&self, term: &TermId) -> u64 {
        match self.ontology.idx_of(term) {
            Some(idx) => self.term_count_idx(idx),
            None => 0,
        }
    }

    /// The information content of a term: `-ln(termCount / totalFreq)`
    ///
    /// Rarer terms score higher. A term that exists in the graph but was
    /// never used by any tallied entity has an information content of
    /// positive infinity (it is infinitely surprising). Terms absent from
    /// the graph return 0.0 so that scoring degrades gracefully for
    /// cross-references into other ontology releases.
    pub fn information_content(&self, term: &TermId) -> f64 {
        match self.ontology.idx_of(term) {
            Some(idx) => self.information_content_idx(idx),
            None => 0.0,
        }
    }

    /// The common ancestors of two terms (self-inclusive on both sides)
    ///
    /// Returns an empty set when either term is absent from the graph
    /// rather than failing, so out-of-band term sources cannot crash an
    /// analysis run.
    pub fn common_ancestors(&self, a: &TermId, b: &TermId) -> HashSet<&TermId> {
        let (Some(a_idx), Some(b_idx)) = (self.ontology.idx_of(a), self.ontology.idx_of(b)) else {
            return HashSet::new();
        };
        let ancestors_a = self.ancestor_set(a_idx);
        let ancestors_b = self.ancestor_set(b_idx);
        ancestors_a
            .intersection(ancestors_b)
            .map(|idx| self.ontology.term_by_idx(*idx).id())
            .collect()
    }

    /// The highest information content among the common ancestors
    ///
    /// Symmetric in its arguments and cached per unordered term pair.
    /// Terms without common ancestors (including absent terms) yield 0.0.
    pub fn most_informative_common_ancestor(&self, a: &TermId, b: &TermId) -> f64 {
        let (Some(a_idx), Some(b_idx)) = (self.ontology.idx_of(a), self.ontology.idx_of(b)) else {
            return 0.0;
        };
        self.mica_idx(a_idx, b_idx)
    }
}

/// Index-based internals. Traversals use an explicit worklist instead of
/// recursion so stack usage stays bounded for deep ontologies.
impl SimilarityGraph {
    pub(crate) fn idx_of(&self, term: &TermId) -> Option<TermIdx> {
        self.ontology.idx_of(term)
    }

    pub(crate) fn ancestor_set(&self, idx: TermIdx) -> &IdxSet {
        self.ancestors[idx as usize].get_or_init(|| {
            let mut closure = IdxSet::new();
            let mut worklist = vec![idx];
            while let Some(current) = worklist.pop() {
                if !closure.insert(current) {
                    continue;
                }
                if current != idx {
                    // reuse closures that are already memoized
                    if let Some(cached) = self.ancestors[current as usize].get() {
                        closure.extend(cached);
                        continue;
                    }
                }
                worklist.extend(self.ontology.term_by_idx(current).parents());
            }
            closure
        })
    }

    pub(crate) fn descendant_set(&self, idx: TermIdx) -> &IdxSet {
        self.descendants[idx as usize].get_or_init(|| {
            let mut closure = IdxSet::new();
            let mut worklist: Vec<TermIdx> =
                self.ontology.term_by_idx(idx).children().to_vec();
            while let Some(current) = worklist.pop() {
                if !closure.insert(current) {
                    continue;
                }
                if let Some(cached) = self.descendants[current as usize].get() {
                    closure.extend(cached);
                    continue;
                }
                worklist.extend(self.ontology.term_by_idx(current).children());
            }
            closure
        })
    }

    pub(crate) fn term_count_idx(&self, idx: TermIdx) -> u64 {
        *self.counts[idx as usize].get_or_init(|| {
            let mut entities: HashSet<&str> = self.annotated[idx as usize]
                .iter()
                .map(String::as_str)
                .collect();
            for descendant in self.descendant_set(idx) {
                entities.extend(
                    self.annotated[*descendant as usize]
                        .iter()
                        .map(String::as_str),
                );
            }
            entities.len() as u64
        })
    }

    pub(crate) fn information_content_idx(&self, idx: TermIdx) -> f64 {
        *self.ic[idx as usize].get_or_init(|| {
            let count = self.term_count_idx(idx);
            if count == 0 {
                // a term no entity ever used is infinitely surprising;
                // infinity keeps the rarer-is-larger ordering and avoids
                // a log(0) NaN
                return f64::INFINITY;
            }
            -((count as f64 / self.total_freq as f64).ln())
        })
    }

    pub(crate) fn mica_idx(&self, a: TermIdx, b: TermIdx) -> f64 {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(cached) = self.mica.borrow().get(&key) {
            return *cached;
        }
        let value = self
            .ancestor_set(a)
            .intersection(self.ancestor_set(b))
            .map(|ancestor| self.information_content_idx(*ancestor))
            .fold(0.0, f64::max);
        self.mica.borrow_mut().insert(key, value);
        value
    }
}

impl std::fmt::Debug for SimilarityGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SimilarityGraph over {} terms, {} annotations",
            self.ontology.len(),
            self.total_freq
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Ontology;

    const ROOT: &str = "XX:0000001";
    const A: &str = "XX:0000002";
    const B: &str = "XX:0000003";
    const C: &str = "XX:0000004";
    const D: &str = "XX:0000005";

    fn tallied_graph() -> SimilarityGraph {
        let ontology = Ontology::from_obo_file("tests/small.obo").unwrap();
        let mut annotations = Annotations::new();
        annotations.insert("person_01", vec![D.into()]);
        annotations.insert("person_02", vec![A.into(), D.into()]);
        annotations.insert("person_03", vec![B.into(), D.into()]);

        let mut graph = SimilarityGraph::new(ontology);
        graph.tally(&annotations).unwrap();
        graph
    }

    fn id(s: &str) -> TermId {
        TermId::from(s)
    }

    #[test]
    fn ancestors_include_self() {
        let graph = tallied_graph();
        for term in graph.ontology().terms() {
            assert!(graph.ancestors(term.id()).contains(term.id()));
            assert!(graph
                .common_ancestors(term.id(), term.id())
                .contains(term.id()));
        }

        let ancestors = graph.ancestors(&id(D));
        assert_eq!(ancestors.len(), 4);
        assert!(ancestors.contains(&id(B)));
        assert!(ancestors.contains(&id(A)));
        assert!(ancestors.contains(&id(ROOT)));
    }

    #[test]
    fn descendants_exclude_self() {
        let graph = tallied_graph();

        let descendants = graph.descendants(&id(A));
        assert_eq!(descendants.len(), 3);
        assert!(!descendants.contains(&id(A)));

        assert!(graph.descendants(&id(D)).is_empty());
        assert!(graph.descendants(&id("XX:9999999")).is_empty());
    }

    #[test]
    fn tally_is_idempotent_per_entity_and_term() {
        let graph = tallied_graph();
        assert_eq!(graph.total_annotations(), 5);

        let direct = graph.annotated_ids(&id(D));
        assert_eq!(direct.len(), 3);
        assert!(graph.annotated_ids(&id(C)).is_empty());
    }

    #[test]
    fn tally_rejects_unknown_terms() {
        let ontology = Ontology::from_obo_file("tests/small.obo").unwrap();
        let mut annotations = Annotations::new();
        annotations.insert("person_01", vec![id("XX:9999999")]);

        let mut graph = SimilarityGraph::new(ontology);
        let err = graph.tally(&annotations).unwrap_err();
        assert_eq!(
            err,
            PhenosimError::UnknownTerm {
                entity: String::from("person_01"),
                term: id("XX:9999999"),
            }
        );
    }

    #[test]
    fn tally_resolves_alternate_ids() {
        let ontology = Ontology::from_obo_file("tests/small.obo").unwrap();
        let mut annotations = Annotations::new();
        // XX:0009002 is an alt_id of XX:0000002
        annotations.insert("person_01", vec![id("XX:0009002")]);

        let mut graph = SimilarityGraph::new(ontology);
        graph.tally(&annotations).unwrap();
        assert_eq!(graph.term_count(&id(A)), 1);
    }

    #[test]
    fn counts_propagate_upwards() {
        let graph = tallied_graph();

        assert_eq!(graph.term_count(&id(D)), 3);
        assert_eq!(graph.term_count(&id(B)), 3);
        assert_eq!(graph.term_count(&id(A)), 3);
        assert_eq!(graph.term_count(&id(ROOT)), 3);
        assert_eq!(graph.term_count(&id(C)), 0);
        assert_eq!(graph.term_count(&id("XX:9999999")), 0);

        // ancestor counts are never smaller than descendant counts
        for term in graph.ontology().terms() {
            let count = graph.term_count(term.id());
            for ancestor in graph.ancestors(term.id()) {
                assert!(graph.term_count(ancestor) >= count);
            }
        }
    }

    #[test]
    fn information_content_values() {
        let graph = tallied_graph();

        let expected = -(3.0f64 / 5.0).ln();
        assert!((graph.information_content(&id(D)) - expected).abs() < 1e-12);
        assert!((graph.information_content(&id(ROOT)) - expected).abs() < 1e-12);

        // present but never annotated
        assert!(graph.information_content(&id(C)).is_infinite());
        // absent terms get the 0.0 sentinel
        assert_eq!(graph.information_content(&id("XX:9999999")), 0.0);
    }

    #[test]
    fn common_ancestors_tolerate_absent_terms() {
        let graph = tallied_graph();

        let common = graph.common_ancestors(&id(A), &id(D));
        assert_eq!(common.len(), 2);
        assert!(common.contains(&id(A)));
        assert!(common.contains(&id(ROOT)));

        assert!(graph.common_ancestors(&id(A), &id("XX:9999999")).is_empty());
        assert_eq!(
            graph.most_informative_common_ancestor(&id(A), &id("XX:9999999")),
            0.0
        );
    }

    #[test]
    fn mica_is_symmetric() {
        let graph = tallied_graph();
        let terms = [id(ROOT), id(A), id(B), id(C), id(D)];
        for a in &terms {
            for b in &terms {
                assert_eq!(
                    graph.most_informative_common_ancestor(a, b),
                    graph.most_informative_common_ancestor(b, a),
                );
            }
        }

        let expected = -(3.0f64 / 5.0).ln();
        let mica = graph.most_informative_common_ancestor(&id(B), &id(D));
        assert!((mica - expected).abs() < 1e-12);
    }

    #[test]
    fn precompute_freezes_per_term_caches() {
        let mut graph = tallied_graph();
        graph.precompute();
        for idx in 0..graph.ontology().len() as TermIdx {
            assert!(graph.ancestors[idx as usize].get().is_some());
            assert!(graph.descendants[idx as usize].get().is_some());
            assert!(graph.counts[idx as usize].get().is_some());
            assert!(graph.ic[idx as usize].get().is_some());
        }
    }
}
