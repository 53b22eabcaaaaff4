//! Materializes parsed OBO stanzas into an [`Ontology`]
use tracing::{debug, info, warn};

use crate::parser::obo::{OboDocument, Stanza};
use crate::term::TermId;
use crate::Ontology;

/// Builds the ontology graph from a parsed document
///
/// Term records are processed in encounter order. Records flagged
/// `is_obsolete: true` only feed the obsolete-ID set; everything else
/// becomes a node. Parents referenced before their own record are added as
/// placeholder nodes and filled in later, so no edge is ever dropped due to
/// record ordering.
pub(super) fn build(document: OboDocument) -> Ontology {
    let mut ontology = Ontology::default();

    for stanza in document.stanzas() {
        if stanza.name() != "Term" {
            debug!(stanza = stanza.name(), "ignoring non-Term stanza");
            continue;
        }
        let Some(id) = stanza.first_value("id") else {
            warn!("skipping Term stanza without id tag");
            continue;
        };
        let id = TermId::from(id);

        if is_obsolete(stanza) {
            debug!(term = %id, "obsolete term excluded from the graph");
            ontology.register_obsolete(id);
            continue;
        }

        let idx = ontology.get_or_insert(&id);
        if ontology.term_by_idx(idx).defined() {
            warn!(term = %id, "duplicate Term record, keeping the first one");
            continue;
        }
        ontology.term_by_idx_mut(idx).mark_defined();

        if let Some(alternates) = stanza.values("alt_id") {
            for alternate in alternates {
                ontology.register_alternate(TermId::from(alternate.value()), id.clone());
            }
        }

        copy_attributes(&mut ontology, idx, stanza);

        if let Some(parents) = stanza.values("is_a") {
            for parent in parents {
                let Some(parent_id) = parent.value().split_whitespace().next() else {
                    warn!(term = %id, "empty is_a value");
                    continue;
                };
                let parent_idx = ontology.get_or_insert(&TermId::from(parent_id));
                ontology.add_parent(parent_idx, idx);
            }
        }
    }

    ontology.set_metadata(document.header().clone());

    info!(
        terms = ontology.len(),
        alternates = ontology.alternate_ids().len(),
        obsolete = ontology.obsolete_ids().len(),
        "ontology built"
    );
    ontology
}

fn is_obsolete(stanza: &Stanza) -> bool {
    stanza.first_value("is_obsolete") == Some("true")
}

fn copy_attributes(ontology: &mut Ontology, idx: crate::term::TermIdx, stanza: &Stanza) {
    let copy = |tag: &str, target: &mut Vec<String>| {
        if let Some(values) = stanza.values(tag) {
            target.extend(values.iter().map(|v| v.value().to_string()));
        }
    };

    let attributes = ontology.term_by_idx_mut(idx).attributes_mut();
    copy("name", &mut attributes.names);
    copy("def", &mut attributes.definitions);
    copy("comment", &mut attributes.comments);
    copy("synonym", &mut attributes.synonyms);
    copy("subset", &mut attributes.subsets);
    copy("xref", &mut attributes.xrefs);
    copy("created_by", &mut attributes.created_by);
    copy("creation_date", &mut attributes.creation_date);
}
