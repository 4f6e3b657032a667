// Aggregation data model types for committee attestations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bitlist::Bitlist;
use crate::error::AggregationError;

/// Aggregation strategy selecting how attestations are packed.
///
/// This is a closed set: callers pick a strategy by value, there is no
/// process-wide registry of named algorithms. The string keys used in
/// configuration files are the snake-case variant names.
///
/// # Variants
///
/// ## `MaxCover`
///
/// Greedy Maximum-Coverage selection. Each greedy round picks the attestation
/// adding the most uncovered committee bits and emits it as its own output.
/// Attestations fully covered by earlier picks are dropped.
///
/// ## `MaxCoverCombined`
///
/// Same greedy selection, but every selected attestation (they are pairwise
/// disjoint by construction) is combined into one aggregate through the
/// signature collaborator. Produces the fewest outputs.
///
/// # Examples
///
/// ```
/// use att_agg::AggregationStrategy;
///
/// let strategy: AggregationStrategy = "max_cover".parse().unwrap();
/// assert_eq!(strategy, AggregationStrategy::MaxCover);
/// assert_eq!(AggregationStrategy::MaxCoverCombined.to_string(), "max_cover_combined");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// One output per greedy round
    #[default]
    MaxCover,
    /// All greedy selections combined into one aggregate
    MaxCoverCombined,
}

impl AggregationStrategy {
    /// Configuration key of this strategy.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxCover => "max_cover",
            Self::MaxCoverCombined => "max_cover_combined",
        }
    }
}

impl fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationStrategy {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max_cover" => Ok(Self::MaxCover),
            "max_cover_combined" => Ok(Self::MaxCoverCombined),
            other => Err(AggregationError::ConfigError {
                message: format!("unknown aggregation strategy {other:?}"),
            }),
        }
    }
}

/// Epoch/root pair identifying a checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: [u8; 32],
}

/// Vote content shared by every member of one aggregation bucket.
///
/// The engine never reads these fields. It only copies the data of a group
/// member into the aggregate it produces, trusting the caller that every
/// attestation passed in one call carries identical data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationData {
    /// Slot the vote was cast in
    pub slot: u64,
    /// Committee index within the slot
    pub committee_index: u64,
    /// Head block root seen by the voters
    pub beacon_block_root: [u8; 32],
    /// Justified checkpoint
    pub source: Checkpoint,
    /// Target checkpoint
    pub target: Checkpoint,
}

/// A committee vote with its participation bitlist and (possibly aggregated)
/// signature.
///
/// Generic over the bitlist representation `B` so consensus clients can use
/// their own SSZ bitlists, and over the vote payload `D`, which the engine
/// treats as opaque.
///
/// # Fields
///
/// * `aggregation_bits` - One bit per committee member represented by this vote
/// * `data` - Vote payload, identical across one aggregation call
/// * `signature` - Opaque signature bytes, combined by an external collaborator
///
/// # Examples
///
/// ```
/// use att_agg::{Attestation, AttestationData, Bitfield, Bitlist};
///
/// let att = Attestation::new(
///     "0110".parse::<Bitlist>().unwrap(),
///     AttestationData::default(),
///     vec![0xaa; 96],
/// );
/// assert_eq!(att.aggregation_bits.count_ones(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation<B = Bitlist, D = AttestationData> {
    /// Participation bits (committee members represented)
    pub aggregation_bits: B,
    /// Vote payload
    pub data: D,
    /// Signature bytes
    pub signature: Vec<u8>,
}

impl<B, D> Attestation<B, D> {
    pub const fn new(aggregation_bits: B, data: D, signature: Vec<u8>) -> Self {
        Self {
            aggregation_bits,
            data,
            signature,
        }
    }
}
