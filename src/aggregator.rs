// Attestation aggregation: validation, Max-Cover selection and result assembly

use tracing::{info, warn};

use crate::bitlist::Bitfield;
use crate::cancel::{CancellationSignal, NeverCancel};
use crate::config::AggregationConfig;
use crate::error::AggregationError;
use crate::max_cover::{MaxCoverProblem, MaxCoverSolution, Termination, check_lengths};
use crate::types::{AggregationStrategy, Attestation};

/// Combines the signatures of a group of disjoint attestations.
///
/// Signature cryptography lives outside this crate. The engine calls the
/// aggregator once per output group with more than one member, passing the
/// member signatures in selection order.
///
/// Any `Fn(&[&[u8]]) -> Result<Vec<u8>, AggregationError>` closure is a
/// `SignatureAggregator`.
pub trait SignatureAggregator {
    fn aggregate_signatures(&self, signatures: &[&[u8]]) -> Result<Vec<u8>, AggregationError>;
}

impl<F> SignatureAggregator for F
where
    F: Fn(&[&[u8]]) -> Result<Vec<u8>, AggregationError>,
{
    fn aggregate_signatures(&self, signatures: &[&[u8]]) -> Result<Vec<u8>, AggregationError> {
        self(signatures)
    }
}

/// Validates that all attestations carry bitlists of the same declared length.
///
/// Only consecutive pairs are compared; the first mismatch is reported with
/// the index of the offending attestation.
///
/// # Returns
///
/// * `Ok(())` - All bitlists share one length (trivially true for 0 or 1 inputs)
/// * `Err(AggregationError::BitsDifferentLength)` - A mismatch was found
///
/// # Examples
///
/// ```
/// use att_agg::{validate, AggregationError, Attestation, AttestationData, Bitlist};
///
/// let atts = vec![
///     Attestation::new(Bitlist::with_length(4), AttestationData::default(), vec![]),
///     Attestation::new(Bitlist::with_length(8), AttestationData::default(), vec![]),
/// ];
///
/// assert!(matches!(
///     validate(&atts),
///     Err(AggregationError::BitsDifferentLength { index: 1, expected: 4, found: 8 })
/// ));
/// ```
pub fn validate<B: Bitfield, D>(attestations: &[Attestation<B, D>]) -> Result<(), AggregationError> {
    check_lengths(attestations.iter().map(|att| &att.aggregation_bits))
}

/// Packs attestations of one committee bucket into as few non-overlapping,
/// maximally covering outputs as the greedy heuristic finds.
///
/// This is the main entry point. It runs to completion; use
/// [`aggregate_with`] to bound the work with a deadline or cancellation flag.
///
/// # Arguments
///
/// * `attestations` - Votes of one committee/slot bucket. All must share the
///   same `data`; only bitlist lengths are checked.
/// * `config` - Strategy and optional round cap
/// * `signatures` - Signature combiner, called once per multi-member group
///
/// # Returns
///
/// Fewer than two inputs are returned unchanged. Otherwise the output is the
/// selected groups in selection order followed by untouched leftovers in
/// input order. Inputs fully covered by the selection are dropped.
///
/// # Errors
///
/// - `BitsDifferentLength` - Input bitlists differ in declared length
/// - `SignatureAggregation` - The combiner failed (combined strategy only)
///
/// # Examples
///
/// ```
/// use att_agg::{aggregate, AggregationConfig, AggregationError, Attestation, AttestationData, Bitlist};
///
/// let att = |bits: &str| Attestation::new(bits.parse::<Bitlist>().unwrap(), AttestationData::default(), vec![]);
/// let combine = |_: &[&[u8]]| -> Result<Vec<u8>, AggregationError> { Ok(vec![]) };
///
/// let packed = aggregate(
///     vec![att("11110000"), att("00001111"), att("11111111")],
///     &AggregationConfig::default(),
///     &combine,
/// )
/// .unwrap();
///
/// assert_eq!(packed.len(), 1);
/// assert_eq!(packed[0].aggregation_bits.to_string(), "0b11111111");
/// ```
pub fn aggregate<B, D, S>(
    attestations: Vec<Attestation<B, D>>,
    config: &AggregationConfig,
    signatures: &S,
) -> Result<Vec<Attestation<B, D>>, AggregationError>
where
    B: Bitfield,
    D: Clone,
    S: SignatureAggregator + ?Sized,
{
    aggregate_with(attestations, config, signatures, &NeverCancel)
}

/// Same as [`aggregate`], polling `signal` once per greedy round.
///
/// When the signal fires the result is still well formed: groups finished
/// before that point, then every attestation that was still a live candidate,
/// untouched (empty bitlists included).
///
/// ```
/// use std::time::Instant;
/// use att_agg::{aggregate_with, AggregationConfig, AggregationError, Attestation, AttestationData, Bitlist};
///
/// let att = |bits: &str| Attestation::new(bits.parse::<Bitlist>().unwrap(), AttestationData::default(), vec![]);
/// let combine = |_: &[&[u8]]| -> Result<Vec<u8>, AggregationError> { Ok(vec![]) };
///
/// // A deadline in the past stops before the first round.
/// let packed = aggregate_with(
///     vec![att("1100"), att("0110")],
///     &AggregationConfig::default(),
///     &combine,
///     &Instant::now(),
/// )
/// .unwrap();
/// assert_eq!(packed.len(), 2);
/// ```
pub fn aggregate_with<B, D, S, C>(
    attestations: Vec<Attestation<B, D>>,
    config: &AggregationConfig,
    signatures: &S,
    signal: &C,
) -> Result<Vec<Attestation<B, D>>, AggregationError>
where
    B: Bitfield,
    D: Clone,
    S: SignatureAggregator + ?Sized,
    C: CancellationSignal + ?Sized,
{
    if attestations.len() < 2 {
        return Ok(attestations);
    }
    validate(&attestations)?;

    let solution = MaxCoverProblem::new(attestations.iter().map(|att| &att.aggregation_bits))?
        .cover(config.max_rounds, &signal);

    if solution.termination == Termination::Cancelled {
        warn!(
            selected = solution.selected.len(),
            leftovers = solution.leftovers.len(),
            "max_cover cancelled, returning partial result"
        );
    }
    info!(
        strategy = %config.strategy,
        inputs = attestations.len(),
        selected = solution.selected.len(),
        leftovers = solution.leftovers.len(),
        dropped = solution.dropped.len(),
        covered = solution.coverage.count_ones(),
        termination = ?solution.termination,
        "aggregated attestations"
    );

    assemble(attestations, &solution, config.strategy, signatures)
}

/// Groups of input indices emitted as one output each.
fn groups(solution: &MaxCoverSolution<impl Bitfield>, strategy: AggregationStrategy) -> Vec<Vec<usize>> {
    match strategy {
        AggregationStrategy::MaxCover => solution.selected.iter().map(|&i| vec![i]).collect(),
        AggregationStrategy::MaxCoverCombined if solution.selected.is_empty() => Vec::new(),
        AggregationStrategy::MaxCoverCombined => vec![solution.selected.clone()],
    }
}

/// Turns a solution into output attestations, consuming the inputs.
fn assemble<B, D, S>(
    attestations: Vec<Attestation<B, D>>,
    solution: &MaxCoverSolution<B>,
    strategy: AggregationStrategy,
    signatures: &S,
) -> Result<Vec<Attestation<B, D>>, AggregationError>
where
    B: Bitfield,
    D: Clone,
    S: SignatureAggregator + ?Sized,
{
    let groups = groups(solution, strategy);
    let mut assembled = Vec::with_capacity(groups.len());
    for group in &groups {
        assembled.push(match group.as_slice() {
            [index] => Output::Original(*index),
            _ => Output::Combined(combine_group(&attestations, group, signatures)?),
        });
    }

    // Singletons and leftovers are moved out of the input, not cloned.
    let mut slots: Vec<Option<Attestation<B, D>>> = attestations.into_iter().map(Some).collect();
    let mut take = |index: usize| {
        slots[index]
            .take()
            .unwrap_or_else(|| panic!("attestation {index} emitted twice"))
    };

    let mut result = Vec::with_capacity(assembled.len() + solution.leftovers.len());
    for output in assembled {
        result.push(match output {
            Output::Original(index) => take(index),
            Output::Combined(att) => att,
        });
    }
    result.extend(solution.leftovers.iter().map(|&index| take(index)));
    Ok(result)
}

enum Output<B, D> {
    Original(usize),
    Combined(Attestation<B, D>),
}

/// ORs the members' bits and combines their signatures. `data` is copied from
/// the first member.
fn combine_group<B, D, S>(
    attestations: &[Attestation<B, D>],
    group: &[usize],
    signatures: &S,
) -> Result<Attestation<B, D>, AggregationError>
where
    B: Bitfield,
    D: Clone,
    S: SignatureAggregator + ?Sized,
{
    let first = &attestations[group[0]];
    let mut bits = first.aggregation_bits.clone();
    for &index in &group[1..] {
        let member = &attestations[index].aggregation_bits;
        assert!(
            !bits.overlaps(member),
            "attestation {index} overlaps its aggregation group"
        );
        bits = bits.or(member);
    }

    let member_signatures: Vec<&[u8]> = group
        .iter()
        .map(|&index| attestations[index].signature.as_slice())
        .collect();
    let signature = signatures.aggregate_signatures(&member_signatures)?;

    Ok(Attestation {
        aggregation_bits: bits,
        data: first.data.clone(),
        signature,
    })
}
