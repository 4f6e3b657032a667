// Greedy Maximum-Coverage selection over participation bitlists

use std::fmt;
use tracing::debug;

use crate::bitlist::Bitfield;
use crate::cancel::CancellationSignal;
use crate::error::AggregationError;

/// One input bitlist under consideration, with its running score.
///
/// `score` is the number of bits of `bits` not yet covered, as of the last
/// rescore. `processed` is set once the candidate has been selected and is
/// never cleared.
#[derive(Debug, Clone)]
pub struct Candidate<'a, B> {
    index: usize,
    bits: &'a B,
    score: usize,
    processed: bool,
}

impl<'a, B: Bitfield> Candidate<'a, B> {
    fn new(index: usize, bits: &'a B) -> Self {
        Self {
            index,
            bits,
            score: bits.count_ones(),
            processed: false,
        }
    }

    /// Position of the attestation in the caller's input.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Participation bits of the attestation.
    pub const fn bits(&self) -> &'a B {
        self.bits
    }

    /// Bits this candidate would add to the current coverage.
    pub const fn score(&self) -> usize {
        self.score
    }

    /// Whether the candidate was already selected in an earlier round.
    pub const fn processed(&self) -> bool {
        self.processed
    }
}

impl<B: fmt::Display> fmt::Display for Candidate<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}, {}, s{}, {}}}",
            self.index, self.bits, self.score, self.processed
        )
    }
}

/// Working set of candidates, mutated in place across greedy rounds.
///
/// Removal swaps with the last element, so no ordering survives
/// [`CandidateList::filter`]; call [`CandidateList::sort`] before reading the
/// best candidate.
#[derive(Debug, Clone)]
pub struct CandidateList<'a, B> {
    candidates: Vec<Candidate<'a, B>>,
}

impl<'a, B: Bitfield> CandidateList<'a, B> {
    /// Builds one candidate per bitlist, indexed by position, scored by its
    /// own population count.
    pub fn new(bits: impl IntoIterator<Item = &'a B>) -> Self {
        Self {
            candidates: bits
                .into_iter()
                .enumerate()
                .map(|(index, bits)| Candidate::new(index, bits))
                .collect(),
        }
    }

    /// Number of live candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` once every candidate was selected or filtered out.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Live candidates in their current (not necessarily sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate<'a, B>> {
        self.candidates.iter()
    }

    /// Highest-scoring candidate, valid right after [`CandidateList::sort`].
    pub fn first(&self) -> Option<&Candidate<'a, B>> {
        self.candidates.first()
    }

    /// Recomputes every score as the number of bits outside `covered`.
    ///
    /// `popcount(bits & !covered)` is computed as
    /// `popcount(bits) - popcount(bits & covered)`.
    pub fn rescore(&mut self, covered: &B) -> &mut Self {
        for candidate in &mut self.candidates {
            let score = candidate.bits.count_ones() - candidate.bits.and(covered).count_ones();
            debug_assert!(
                score <= candidate.score,
                "score of candidate {} increased from {} to {score}",
                candidate.index,
                candidate.score
            );
            candidate.score = score;
        }
        self
    }

    /// Removes processed candidates and candidates overlapping `covered`.
    pub fn filter(&mut self, covered: &B) -> &mut Self {
        let mut cur = 0;
        while cur < self.candidates.len() {
            let candidate = &self.candidates[cur];
            if candidate.processed || covered.overlaps(candidate.bits) {
                self.candidates.swap_remove(cur);
            } else {
                cur += 1;
            }
        }
        self
    }

    /// Orders by score descending, ties broken by ascending input index.
    pub fn sort(&mut self) -> &mut Self {
        self.candidates
            .sort_unstable_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        self
    }
}

/// Why the greedy loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every candidate was either selected or filtered out
    Exhausted,
    /// The best remaining candidate adds no coverage
    NoGain,
    /// The configured round cap was reached
    RoundLimit,
    /// The cancellation signal fired
    Cancelled,
}

impl Termination {
    /// `true` when the loop stopped before running out of useful candidates.
    pub const fn is_early(self) -> bool {
        matches!(self, Self::RoundLimit | Self::Cancelled)
    }
}

/// Outcome of a Max-Cover run, expressed as indices into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxCoverSolution<B> {
    /// Union of every selected bitlist
    pub coverage: B,
    /// Selected indices, one per greedy round, in selection order
    pub selected: Vec<usize>,
    /// Unselected inputs that still carry uncovered bits, ascending. After an
    /// early stop this is every live candidate, empty ones included.
    pub leftovers: Vec<usize>,
    /// Inputs fully covered by the selection (or empty), ascending
    pub dropped: Vec<usize>,
    /// Why the greedy loop stopped
    pub termination: Termination,
}

/// Maximum Coverage problem over the bitlists of one aggregation bucket.
///
/// For the running-time and approximation analysis of this greedy approach see
/// "Analysis of the Greedy Approach in Problems of Maximum k-Coverage" by
/// Hochbaum and Pathria.
#[derive(Debug, Clone)]
pub struct MaxCoverProblem<'a, B> {
    bits: Vec<&'a B>,
    candidates: CandidateList<'a, B>,
}

impl<'a, B: Bitfield> MaxCoverProblem<'a, B> {
    /// Sets up the problem, checking that there is at least one bitlist and
    /// that all bitlists share one declared length.
    pub fn new(bits: impl IntoIterator<Item = &'a B>) -> Result<Self, AggregationError> {
        let bits: Vec<&'a B> = bits.into_iter().collect();
        if bits.is_empty() {
            return Err(AggregationError::InvalidAttestationCount);
        }
        check_lengths(bits.iter().copied())?;

        Ok(Self {
            candidates: CandidateList::new(bits.iter().copied()),
            bits,
        })
    }

    /// Candidates as initially scored, before any round has run.
    pub const fn candidates(&self) -> &CandidateList<'a, B> {
        &self.candidates
    }

    /// Runs the greedy selection until no candidate adds coverage, `max_rounds`
    /// selections were made, or `signal` fires.
    pub fn cover(
        mut self,
        max_rounds: Option<usize>,
        signal: &impl CancellationSignal,
    ) -> MaxCoverSolution<B> {
        let mut coverage = self.bits[0].zeroed();
        let mut selected = Vec::new();

        let termination = loop {
            if self.candidates.is_empty() {
                break Termination::Exhausted;
            }
            if max_rounds.is_some_and(|k| selected.len() >= k) {
                break Termination::RoundLimit;
            }
            if signal.is_cancelled() {
                break Termination::Cancelled;
            }

            self.candidates.sort();
            let best = &mut self.candidates.candidates[0];
            if best.score == 0 {
                break Termination::NoGain;
            }

            assert!(!best.processed, "candidate {} selected twice", best.index);
            assert!(
                !coverage.overlaps(best.bits),
                "candidate {} overlaps existing coverage",
                best.index
            );

            best.processed = true;
            let (index, score, bits) = (best.index, best.score, best.bits);
            coverage = coverage.or(bits);
            selected.push(index);

            debug!(
                round = selected.len(),
                index,
                score,
                live = self.candidates.len(),
                "max_cover selected candidate"
            );

            self.candidates.rescore(&coverage).filter(&coverage);
        };

        let mut leftovers = Vec::new();
        for candidate in self.candidates.iter() {
            assert!(
                !candidate.processed,
                "processed candidate {} left in the working set",
                candidate.index
            );
            let untouched = termination.is_early() || candidate.bits.count_ones() > 0;
            if untouched && !coverage.overlaps(candidate.bits) {
                leftovers.push(candidate.index);
            }
        }
        leftovers.sort_unstable();

        let selected_bits: usize = selected.iter().map(|&i| self.bits[i].count_ones()).sum();
        assert_eq!(
            selected_bits,
            coverage.count_ones(),
            "selected bitlists overlap each other"
        );

        let dropped: Vec<usize> = (0..self.bits.len())
            .filter(|i| !selected.contains(i) && leftovers.binary_search(i).is_err())
            .collect();

        MaxCoverSolution {
            coverage,
            selected,
            leftovers,
            dropped,
            termination,
        }
    }
}

/// Checks consecutive pairs for equal declared length.
pub(crate) fn check_lengths<'a, B: Bitfield + 'a>(
    bits: impl IntoIterator<Item = &'a B>,
) -> Result<(), AggregationError> {
    let mut bits = bits.into_iter();
    let Some(first) = bits.next() else {
        return Ok(());
    };
    let mut previous = first.len();
    for (offset, current) in bits.enumerate() {
        if current.len() != previous {
            return Err(AggregationError::BitsDifferentLength {
                index: offset + 1,
                expected: previous,
                found: current.len(),
            });
        }
        previous = current.len();
    }
    Ok(())
}
