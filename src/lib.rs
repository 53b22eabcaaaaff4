//! Quantify phenotypic similarity between groups of annotated individuals
//!
//! `phenosim` parses a clinical-term ontology from OBO-formatted text into a
//! DAG, tallies how often each term is used across a population of entities
//! (probands), derives information-content statistics from the tallies and
//! scores how similar the annotations of a candidate group are. A Monte Carlo
//! permutation test turns the observed group score into an empirical p-value.
//!
//! The typical pipeline:
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use phenosim::{Ontology, SimilarityGraph, SimilarityMetric};
//! use phenosim::annotations::{Annotations, Groups};
//!
//! # fn main() -> phenosim::SimResult<()> {
//! let ontology = Ontology::from_obo_file("terms.obo")?;
//!
//! let mut annotations = Annotations::new();
//! annotations.insert("person_01", vec!["XX:0000005".into()]);
//! annotations.normalize(&ontology);
//!
//! let mut graph = SimilarityGraph::new(ontology);
//! graph.tally(&annotations)?;
//! graph.precompute();
//!
//! let groups = Groups::new();
//! let mut rng = StdRng::seed_from_u64(42);
//! let results = phenosim::stats::analyse_groups(
//!     &graph,
//!     &annotations,
//!     &groups,
//!     1000,
//!     SimilarityMetric::Resnik,
//!     &mut rng,
//! );
//! # Ok(())
//! # }
//! ```
use thiserror::Error;

pub mod annotations;
pub mod graph;
pub mod ontology;
pub mod parser;
pub mod similarity;
pub mod stats;
pub mod term;
pub mod utils;

pub use graph::SimilarityGraph;
pub use ontology::Ontology;
pub use similarity::SimilarityMetric;
pub use term::{Term, TermId};

pub(crate) const DEFAULT_NUM_PARENTS: usize = 4;
pub(crate) const DEFAULT_NUM_CHILDREN: usize = 8;

/// Default number of permutation iterations, matching the reference tool
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Errors of all `phenosim` operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PhenosimError {
    /// The ontology source text is malformed. Fatal for the whole run.
    #[error("cannot parse ontology: {msg} near line {line}")]
    ParseError {
        /// line number (1-based) of the offending input line
        line: usize,
        /// what went wrong
        msg: String,
    },
    /// An annotation references a term that is absent from the graph even
    /// after alternate-ID resolution. Silently dropping it would bias every
    /// information-content value, so tallying fails instead.
    #[error("entity {entity} is annotated with {term}, which is missing from the ontology")]
    UnknownTerm {
        /// the annotated entity
        entity: String,
        /// the unresolvable term
        term: TermId,
    },
    /// The complement population is too small to draw a random group from
    #[error("cannot sample groups of {wanted} from a population of {available}")]
    PopulationTooSmall {
        /// requested sample size
        wanted: usize,
        /// entities available for sampling
        available: usize,
    },
    /// A similarity metric name that is not one of `resnik`, `lin`, `simgic`
    #[error("unknown similarity metric {0}")]
    UnknownMetric(String),
    /// The ontology file could not be read
    #[error("cannot read ontology file {path}: {msg}")]
    CannotRead {
        /// path of the file
        path: String,
        /// underlying I/O error text
        msg: String,
    },
}

/// Result alias used by all fallible `phenosim` APIs
pub type SimResult<T> = Result<T, PhenosimError>;
