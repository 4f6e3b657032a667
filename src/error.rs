// Error handling for attestation aggregation

use thiserror::Error;

/// Aggregation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    // Precondition failures. Both are permanent: the caller has to fix its grouping.
    /// Max-Cover problem constructed over zero attestations
    #[error("invalid number of attestations: cannot set up max_cover problem")]
    InvalidAttestationCount,
    /// Two attestations in one call carry bitlists of different declared length
    #[error("bitlists have different length: attestation {index} has {found} bits, expected {expected}")]
    BitsDifferentLength {
        index: usize,
        expected: usize,
        found: usize,
    },

    // Collaborator failures
    /// The signature combiner rejected a group
    #[error("signature aggregation failed: {message}")]
    SignatureAggregation { message: String },

    // Configuration
    /// Configuration could not be parsed
    #[error("invalid aggregation config: {message}")]
    ConfigError { message: String },
}

impl AggregationError {
    /// Whether retrying the same input can ever succeed.
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::InvalidAttestationCount | Self::BitsDifferentLength { .. }
        )
    }
}
