//! Agreement between an observation's identifications and its community taxon.
//!
//! Only current identifications count. One whose lineage includes the
//! community taxon agrees when its own taxon is still among the observation's
//! leading identification taxa, and otherwise counts neither way. Any other
//! identification is a maverick and counts against.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub is_current: bool,
    pub taxon_id: u64,
    /// Ancestors of `taxon_id`, root first.
    pub ancestor_ids: Vec<u64>,
}

impl Identification {
    /// Whether `taxon` is this identification's taxon or one of its ancestors.
    fn within_lineage_of(&self, taxon: u64) -> bool {
        self.taxon_id == taxon || self.ancestor_ids.contains(&taxon)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub total: u32,
    pub agree: u32,
}

impl std::fmt::Display for ConsensusResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.agree, self.total)
    }
}

/// Score `identifications` against `community_taxon`.
///
/// With no community taxon, both counts are zero.
pub fn score(
    community_taxon: Option<u64>,
    ident_taxon_ids: &HashSet<u64>,
    identifications: &[Identification],
) -> ConsensusResult {
    let Some(community) = community_taxon else {
        return ConsensusResult::default();
    };

    identifications
        .iter()
        .filter(|ident| ident.is_current)
        .fold(ConsensusResult::default(), |mut result, ident| {
            if !ident.within_lineage_of(community) {
                result.total += 1;
            } else if ident_taxon_ids.contains(&ident.taxon_id) {
                result.total += 1;
                result.agree += 1;
            }
            result
        })
}
