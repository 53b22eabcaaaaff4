//! Parsers for ontology source data
//!
//! The only format currently supported is the OBO flat-file format, see
//! [`obo`].

pub mod obo;

pub use obo::{Header, OboDocument, Stanza, Value};
