//! Attestation Aggregation Library
//!
//! This library packs committee attestations into the smallest set of
//! non-overlapping, maximally covering aggregates using a greedy
//! Maximum-Coverage heuristic.
//!
//! # Overview
//!
//! A block proposer has room for a limited number of attestations. Given many
//! votes for the same committee and checkpoint, each carrying a bitlist of the
//! committee members it represents, `att-agg` selects attestations round by
//! round, always taking the one that adds the most not-yet-covered members and
//! never taking one that would count a member twice.
//!
//! Two strategies are available:
//!
//! - **MaxCover**: One output per greedy round; covered attestations are dropped
//! - **MaxCoverCombined**: Same selection, merged into a single aggregate
//!
//! # Example
//!
//! ```
//! use att_agg::{aggregate, AggregationConfig, AggregationError, Attestation, AttestationData, Bitlist};
//!
//! let att = |bits: &str| {
//!     Attestation::new(bits.parse::<Bitlist>().unwrap(), AttestationData::default(), vec![])
//! };
//!
//! // Signature aggregation is supplied by the caller (BLS in a beacon node).
//! let combine = |sigs: &[&[u8]]| -> Result<Vec<u8>, AggregationError> { Ok(sigs.concat()) };
//!
//! let packed = aggregate(
//!     vec![att("11110000"), att("00111100"), att("00001111")],
//!     &AggregationConfig::default(),
//!     &combine,
//! )
//! .expect("Aggregation failed");
//!
//! // 00111100 is fully covered by the other two and dropped.
//! assert_eq!(packed.len(), 2);
//! ```
//!
//! # Features
//!
//! - Bitlist-agnostic engine behind the [`Bitfield`] capability
//!   (optional `ssz` feature for `ssz_types::BitList`)
//! - Deterministic selection (ties broken by input position)
//! - Optional round cap and per-round cancellation/deadline
//! - Invariant checks that refuse to double-count a committee member

pub mod aggregator;
pub mod bitlist;
pub mod cancel;
pub mod config;
pub mod error;
pub mod max_cover;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use aggregator::{SignatureAggregator, aggregate, aggregate_with, validate};
pub use bitlist::{Bitfield, Bitlist, InvalidBitlistError, ParseBitlistError};
pub use cancel::{CancellationSignal, NeverCancel};
pub use config::AggregationConfig;
pub use error::AggregationError;
pub use max_cover::{Candidate, CandidateList, MaxCoverProblem, MaxCoverSolution, Termination};
pub use types::{AggregationStrategy, Attestation, AttestationData, Checkpoint};
