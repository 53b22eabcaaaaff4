//! The ontology DAG of clinical terms
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::parser::obo::{Header, OboDocument};
use crate::term::{Term, TermId, TermIdx, TermInternal};
use core::fmt::Debug;

mod builder;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A directed acyclic graph of clinical terms
///
/// Nodes are terms keyed by their canonical [`TermId`], edges are `is_a`
/// parent → child relations. The graph is built once from an OBO document
/// and never mutated afterwards.
///
/// Besides the nodes themselves, the ontology carries the two lookup tables
/// needed to resolve externally supplied term identifiers:
/// the alternate-ID table (deprecated IDs absorbed into a canonical term)
/// and the set of obsolete IDs (terms retired from the ontology and
/// excluded from the graph entirely).
///
/// ```mermaid
/// graph TD
///     root --> A
///     A --> B
///     A --> C
///     B --> D
/// ```
#[derive(Default, Clone)]
pub struct Ontology {
    terms: Vec<TermInternal>,
    index: HashMap<TermId, TermIdx>,
    alt_ids: HashMap<TermId, TermId>,
    obsolete: HashSet<TermId>,
    metadata: Header,
}

impl Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ontology with {} terms", self.terms.len())
    }
}

/// Crate-only functions for building and navigating the arena
impl Ontology {
    pub(crate) fn idx_of(&self, id: &TermId) -> Option<TermIdx> {
        self.index.get(id).copied()
    }

    pub(crate) fn term_by_idx(&self, idx: TermIdx) -> &TermInternal {
        &self.terms[idx as usize]
    }

    pub(crate) fn term_by_idx_mut(&mut self, idx: TermIdx) -> &mut TermInternal {
        &mut self.terms[idx as usize]
    }

    /// Returns the arena index of `id`, creating a placeholder node if the
    /// term has not been encountered yet
    pub(crate) fn get_or_insert(&mut self, id: &TermId) -> TermIdx {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = TermIdx::try_from(self.terms.len()).expect("more than u32::MAX terms");
        self.terms.push(TermInternal::new(id.clone()));
        self.index.insert(id.clone(), idx);
        idx
    }

    pub(crate) fn add_parent(&mut self, parent: TermIdx, child: TermIdx) {
        self.term_by_idx_mut(parent).add_child(child);
        self.term_by_idx_mut(child).add_parent(parent);
    }

    pub(crate) fn register_alternate(&mut self, alt: TermId, canonical: TermId) {
        self.alt_ids.insert(alt, canonical);
    }

    pub(crate) fn register_obsolete(&mut self, id: TermId) {
        self.obsolete.insert(id);
    }

    pub(crate) fn set_metadata(&mut self, header: Header) {
        self.metadata = header;
    }
}

/// Public API of the ontology
impl Ontology {
    /// Builds the ontology from an OBO file on disk
    pub fn from_obo_file<P: AsRef<Path>>(path: P) -> crate::SimResult<Ontology> {
        let document = OboDocument::from_file(path)?;
        Ok(Ontology::from_document(document))
    }

    /// Builds the ontology from an already parsed OBO document
    pub fn from_document(document: OboDocument) -> Ontology {
        builder::build(document)
    }

    /// Looks up a term by its canonical identifier
    ///
    /// Alternate IDs do not match here; resolve them first via
    /// [`Ontology::canonical`].
    pub fn term(&self, id: &TermId) -> Option<Term<'_>> {
        self.idx_of(id).map(|idx| Term::new(self, self.term_by_idx(idx)))
    }

    /// Returns `true` if `id` is a node of the graph
    pub fn contains(&self, id: &TermId) -> bool {
        self.index.contains_key(id)
    }

    /// Resolves an externally supplied identifier to the canonical term ID
    ///
    /// Direct hits resolve to themselves; otherwise the alternate-ID table
    /// is consulted. Obsolete and unknown IDs resolve to `None`.
    pub fn canonical<'a>(&'a self, id: &'a TermId) -> Option<&'a TermId> {
        if self.index.contains_key(id) {
            return Some(id);
        }
        self.alt_ids.get(id)
    }

    /// The alternate-ID → canonical-ID resolution table
    pub fn alternate_ids(&self) -> &HashMap<TermId, TermId> {
        &self.alt_ids
    }

    /// The set of term IDs explicitly marked obsolete
    ///
    /// Obsolete terms are not part of the graph; callers must filter them
    /// out of external annotation data before tallying.
    pub fn obsolete_ids(&self) -> &HashSet<TermId> {
        &self.obsolete
    }

    /// Header tag/value metadata of the source document
    pub fn metadata(&self) -> &Header {
        &self.metadata
    }

    /// The number of (non-obsolete) terms in the graph
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the graph has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates all terms in encounter order
    pub fn terms(&self) -> OntologyIterator<'_> {
        OntologyIterator {
            inner: self.terms.iter(),
            ontology: self,
        }
    }
}

/// Iterator over all terms of an [`Ontology`]
pub struct OntologyIterator<'a> {
    inner: std::slice::Iter<'a, TermInternal>,
    ontology: &'a Ontology,
}

impl<'a> Iterator for OntologyIterator<'a> {
    type Item = Term<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|term| Term::new(self.ontology, term))
    }
}

impl<'a> IntoIterator for &'a Ontology {
    type Item = Term<'a>;
    type IntoIter = OntologyIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms()
    }
}
