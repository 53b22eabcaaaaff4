//! Terms of the ontology and their identifiers
use core::fmt::Debug;
use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use crate::Ontology;

pub(crate) mod internal;
pub(crate) use internal::TermInternal;

/// Index of a term within the ontology arena
pub(crate) type TermIdx = u32;

/// The stable identifier of an ontology term, e.g. `XX:0000118`
///
/// `TermId`s are plain strings; no assumption is made about the prefix or
/// the numeric part, so ontologies with arbitrary ID schemes work.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId {
    inner: Box<str>,
}

impl TermId {
    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for TermId {
    fn from(s: &str) -> Self {
        TermId { inner: s.into() }
    }
}

impl From<String> for TermId {
    fn from(s: String) -> Self {
        TermId { inner: s.into() }
    }
}

impl FromStr for TermId {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TermId::from(s))
    }
}

impl Borrow<str> for TermId {
    fn borrow(&self) -> &str {
        &self.inner
    }
}

impl Debug for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TermId({})", self.inner)
    }
}

impl Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl PartialEq<str> for TermId {
    fn eq(&self, other: &str) -> bool {
        &*self.inner == other
    }
}

impl PartialEq<&str> for TermId {
    fn eq(&self, other: &&str) -> bool {
        &*self.inner == *other
    }
}

/// A borrowed view of one ontology term and its attributes
///
/// `Term`s are cheap handles into the [`Ontology`] and give access to the
/// descriptive attributes of a node and to its direct parents and children.
#[derive(Copy, Clone)]
pub struct Term<'a> {
    internal: &'a TermInternal,
    ontology: &'a Ontology,
}

impl<'a> Term<'a> {
    pub(crate) fn new(ontology: &'a Ontology, internal: &'a TermInternal) -> Term<'a> {
        Term { internal, ontology }
    }

    /// The canonical identifier of the term
    pub fn id(&self) -> &'a TermId {
        self.internal.id()
    }

    /// The primary name, or an empty string for placeholder nodes whose
    /// defining record never appeared
    pub fn name(&self) -> &'a str {
        self.internal
            .attributes()
            .names
            .first()
            .map_or("", String::as_str)
    }

    /// The first `def` value, if any
    pub fn definition(&self) -> Option<&'a str> {
        self.internal
            .attributes()
            .definitions
            .first()
            .map(String::as_str)
    }

    /// All `comment` values
    pub fn comments(&self) -> &'a [String] {
        &self.internal.attributes().comments
    }

    /// All `synonym` values
    pub fn synonyms(&self) -> &'a [String] {
        &self.internal.attributes().synonyms
    }

    /// All `xref` values
    pub fn xrefs(&self) -> &'a [String] {
        &self.internal.attributes().xrefs
    }

    /// All `subset` values
    pub fn subsets(&self) -> &'a [String] {
        &self.internal.attributes().subsets
    }

    /// Iterates the direct parent terms
    pub fn parents(&self) -> TermIterator<'a> {
        TermIterator::new(self.ontology, self.internal.parents().iter())
    }

    /// Iterates the direct child terms
    pub fn children(&self) -> TermIterator<'a> {
        TermIterator::new(self.ontology, self.internal.children().iter())
    }
}

impl Debug for Term<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Term({} | {})", self.id(), self.name())
    }
}

/// Iterator over [`Term`]s referenced by their arena index
pub struct TermIterator<'a> {
    ontology: &'a Ontology,
    indices: std::slice::Iter<'a, TermIdx>,
}

impl<'a> TermIterator<'a> {
    pub(crate) fn new(ontology: &'a Ontology, indices: std::slice::Iter<'a, TermIdx>) -> Self {
        TermIterator { ontology, indices }
    }
}

impl<'a> Iterator for TermIterator<'a> {
    type Item = Term<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        self.indices
            .next()
            .map(|idx| Term::new(self.ontology, self.ontology.term_by_idx(*idx)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn termid_from_str() {
        let id = TermId::from("XX:0000118");
        assert_eq!(id.as_str(), "XX:0000118");
        assert_eq!(id, "XX:0000118");
        assert_eq!(format!("{id}"), "XX:0000118");
        assert_eq!(format!("{id:?}"), "TermId(XX:0000118)");
    }

    #[test]
    fn termid_ordering() {
        let a = TermId::from("XX:0000001");
        let b = TermId::from("XX:0000002");
        assert!(a < b);
    }
}
