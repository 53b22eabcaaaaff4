use smallvec::SmallVec;

use crate::term::{TermId, TermIdx};
use crate::{DEFAULT_NUM_CHILDREN, DEFAULT_NUM_PARENTS};

/// Descriptive attributes copied from a term record
///
/// Every attribute is an ordered list because the source tags may repeat.
#[derive(Debug, Clone, Default)]
pub(crate) struct TermAttributes {
    pub names: Vec<String>,
    pub definitions: Vec<String>,
    pub comments: Vec<String>,
    pub synonyms: Vec<String>,
    pub subsets: Vec<String>,
    pub xrefs: Vec<String>,
    pub created_by: Vec<String>,
    pub creation_date: Vec<String>,
}

/// The actual term node stored in the ontology arena
#[derive(Debug, Clone)]
pub(crate) struct TermInternal {
    id: TermId,
    attributes: TermAttributes,
    parents: SmallVec<[TermIdx; DEFAULT_NUM_PARENTS]>,
    children: SmallVec<[TermIdx; DEFAULT_NUM_CHILDREN]>,
    /// `false` until the term's own record has been processed; placeholder
    /// nodes are created when a record references a parent that has not
    /// appeared yet
    defined: bool,
}

impl TermInternal {
    pub fn new(id: TermId) -> TermInternal {
        TermInternal {
            id,
            attributes: TermAttributes::default(),
            parents: SmallVec::new(),
            children: SmallVec::new(),
            defined: false,
        }
    }

    pub fn id(&self) -> &TermId {
        &self.id
    }

    pub fn attributes(&self) -> &TermAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut TermAttributes {
        &mut self.attributes
    }

    pub fn parents(&self) -> &[TermIdx] {
        &self.parents
    }

    pub fn children(&self) -> &[TermIdx] {
        &self.children
    }

    pub fn add_parent(&mut self, parent: TermIdx) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub fn add_child(&mut self, child: TermIdx) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub fn defined(&self) -> bool {
        self.defined
    }

    pub fn mark_defined(&mut self) {
        self.defined = true;
    }
}

impl PartialEq for TermInternal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TermInternal {}
