//! Monte Carlo permutation test for group similarity
//!
//! The observed group score by itself says nothing: more severely annotated
//! populations produce larger scores across the board. The permutation test
//! ranks the observed score within a null distribution of scores from
//! equally sized groups drawn at random from the rest of the population,
//! and reports the empirical probability of seeing a score at least as
//! large by chance.
use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::annotations::{Annotations, Groups};
use crate::graph::SimilarityGraph;
use crate::similarity::SimilarityMetric;
use crate::term::TermId;
use crate::{PhenosimError, SimResult};

/// Header line matching [`GroupResult::as_row`]
pub const TABLE_HEADER: &str = "group\tp_value";

/// Outcome of testing one candidate group
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// Empirical probability of a random group scoring at least as high
    PValue(f64),
    /// Fewer than two members with annotations, nothing to compare
    NotTested,
    /// The test could not run for this group
    Failed(String),
}

impl TestOutcome {
    /// The p-value, if the group was testable
    pub fn p_value(&self) -> Option<f64> {
        match self {
            TestOutcome::PValue(p) => Some(*p),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::PValue(p) => write!(f, "{p}"),
            TestOutcome::NotTested => write!(f, "not_tested"),
            TestOutcome::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// The labeled outcome for one candidate group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    label: String,
    outcome: TestOutcome,
}

impl GroupResult {
    /// The group's label, e.g. a gene symbol
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The outcome of the test
    pub fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }

    /// One tab-separated output row; see [`TABLE_HEADER`]
    pub fn as_row(&self) -> String {
        format!("{}\t{}", self.label, self.outcome)
    }
}

/// Runs the permutation test for a single group of entity IDs
///
/// Members without annotations are dropped; a listed ID may appear more
/// than once and then contributes one group slot per occurrence. Groups
/// with fewer than two annotated members return `Ok(None)`.
///
/// The null distribution is built from `iterations` random groups of the
/// same size, drawn without replacement from the annotated entities that
/// are not members of the group. If that complement is smaller than the
/// group, the test cannot run and fails with
/// [`PhenosimError::PopulationTooSmall`].
///
/// The returned p-value is `(n_higher_or_equal) / (iterations + 1)` with a
/// floor of `1 / (iterations + 1)`, so it can never reach an overconfident
/// zero.
pub fn test_group_similarity<R: Rng + ?Sized>(
    graph: &SimilarityGraph,
    annotations: &Annotations,
    members: &[String],
    iterations: u32,
    metric: SimilarityMetric,
    rng: &mut R,
) -> SimResult<Option<f64>> {
    let resolved: Vec<&[TermId]> = members
        .iter()
        .filter_map(|member| annotations.get(member))
        .collect();
    if resolved.len() < members.len() {
        debug!(
            missing = members.len() - resolved.len(),
            "group members without annotations are dropped"
        );
    }
    if resolved.len() < 2 {
        return Ok(None);
    }

    let observed = metric.group_score(graph, &resolved);

    let member_ids: HashSet<&str> = members.iter().map(String::as_str).collect();
    let complement: Vec<&[TermId]> = annotations
        .iter()
        .filter(|(entity, _)| !member_ids.contains(entity))
        .map(|(_, terms)| terms)
        .collect();
    if complement.len() < resolved.len() {
        return Err(PhenosimError::PopulationTooSmall {
            wanted: resolved.len(),
            available: complement.len(),
        });
    }

    let mut scores: Vec<f64> = (0..iterations)
        .map(|_| {
            let sample: Vec<&[TermId]> = complement
                .choose_multiple(rng, resolved.len())
                .copied()
                .collect();
            metric.group_score(graph, &sample)
        })
        .collect();
    scores.sort_unstable_by(f64::total_cmp);

    // rank of the observed score within the null distribution; ties count
    // towards the null, like the observed group itself does
    let below = scores.partition_point(|score| score.total_cmp(&observed).is_lt());
    let n = scores.len() as f64;
    let p = (n - below as f64) / (n + 1.0);
    if p == 0.0 {
        return Ok(Some(1.0 / (n + 1.0)));
    }
    Ok(Some(p))
}

/// Tests every candidate group and collects one result row per group
///
/// Groups are processed in label order. A failing group does not abort the
/// run; its error is recorded in the outcome instead.
pub fn analyse_groups<R: Rng + ?Sized>(
    graph: &SimilarityGraph,
    annotations: &Annotations,
    groups: &Groups,
    iterations: u32,
    metric: SimilarityMetric,
    rng: &mut R,
) -> Vec<GroupResult> {
    groups
        .iter()
        .map(|(label, members)| {
            let outcome =
                match test_group_similarity(graph, annotations, members, iterations, metric, rng)
                {
                    Ok(Some(p)) => TestOutcome::PValue(p),
                    Ok(None) => TestOutcome::NotTested,
                    Err(err) => {
                        warn!(group = label, error = %err, "similarity test failed");
                        TestOutcome::Failed(err.to_string())
                    }
                };
            GroupResult {
                label: label.to_string(),
                outcome,
            }
        })
        .collect()
}
