// Bitlist capability used by the Max-Cover engine, plus the default word-packed bitlist

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const WORD_BITS: usize = u64::BITS as usize;

/// Set operations the aggregation engine needs from a participation bitlist.
///
/// The engine never looks at the bit encoding itself. Anything that can report
/// its declared length, count its set bits, and intersect/union with another
/// value of the same declared length can be aggregated.
///
/// Implementations must keep the declared length of `self` for `and`, `or`
/// and `zeroed`. Callers only combine values of equal declared length.
pub trait Bitfield: Clone {
    /// Declared number of bits (committee size), not the byte length.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Population count.
    fn count_ones(&self) -> usize;

    /// Bitwise AND.
    fn and(&self, other: &Self) -> Self;

    /// Bitwise OR.
    fn or(&self, other: &Self) -> Self;

    /// Returns `true` when at least one bit is set in both values.
    fn overlaps(&self, other: &Self) -> bool;

    /// All-zero value with the same declared length.
    fn zeroed(&self) -> Self;
}

/// Error returned when parsing a [`Bitlist`] from a `0`/`1` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bit character {character:?} at position {position}")]
pub struct ParseBitlistError {
    pub character: char,
    pub position: usize,
}

/// Variable-length bitlist with an explicit declared length.
///
/// Bits are packed into `u64` words, bit `i` living in word `i / 64` at
/// position `i % 64`. Bits past `len` in the last word are always zero.
///
/// # Examples
///
/// ```
/// use att_agg::{Bitfield, Bitlist};
///
/// let a: Bitlist = "11110000".parse().unwrap();
/// let b: Bitlist = "00111100".parse().unwrap();
///
/// assert_eq!(a.len(), 8);
/// assert_eq!(a.and(&b).count_ones(), 2);
/// assert!(a.overlaps(&b));
/// assert_eq!(a.or(&b).to_string(), "0b11111100");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitlist")]
pub struct Bitlist {
    len: usize,
    words: Vec<u64>,
}

/// Error returned when decoded words do not form a valid [`Bitlist`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBitlistError {
    #[error("bitlist of length {len} needs {expected} words, found {found}")]
    WordCount {
        len: usize,
        expected: usize,
        found: usize,
    },
    #[error("bitlist of length {len} has bits set past its length")]
    TrailingBits { len: usize },
}

/// Unchecked wire shape of a [`Bitlist`].
#[derive(Deserialize)]
struct RawBitlist {
    len: usize,
    words: Vec<u64>,
}

impl TryFrom<RawBitlist> for Bitlist {
    type Error = InvalidBitlistError;

    fn try_from(raw: RawBitlist) -> Result<Self, Self::Error> {
        let RawBitlist { len, words } = raw;
        let expected = len.div_ceil(WORD_BITS);
        if words.len() != expected {
            return Err(InvalidBitlistError::WordCount {
                len,
                expected,
                found: words.len(),
            });
        }
        let tail = len % WORD_BITS;
        if tail != 0 && words.last().is_some_and(|last| last >> tail != 0) {
            return Err(InvalidBitlistError::TrailingBits { len });
        }
        Ok(Self { len, words })
    }
}

impl Bitlist {
    /// Creates an all-zero bitlist of `len` bits.
    pub fn with_length(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a bitlist of `len` bits with the given indices set.
    ///
    /// Panics if an index is not below `len`.
    pub fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut bits = Self::with_length(len);
        for &index in indices {
            bits.set(index, true);
        }
        bits
    }

    /// Sets or clears bit `index`.
    ///
    /// Panics if `index` is out of range, like slice indexing.
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(
            index < self.len,
            "bit index {index} out of range for bitlist of length {}",
            self.len
        );
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    /// Returns bit `index`, or `None` past the declared length.
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1)
    }

    /// Indices of all set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self.get(i) == Some(true))
    }

    /// Packed little-endian bytes, `ceil(len / 8)` of them.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .take(self.len.div_ceil(8))
            .collect()
    }

    /// Hex dump of [`Bitlist::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn assert_same_length(&self, other: &Self) {
        assert_eq!(
            self.len, other.len,
            "bitlist length mismatch: {} vs {}",
            self.len, other.len
        );
    }

    fn zip_words(&self, other: &Self, op: impl Fn(u64, u64) -> u64) -> Self {
        self.assert_same_length(other);
        Self {
            len: self.len,
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| op(*a, *b))
                .collect(),
        }
    }
}

impl Bitfield for Bitlist {
    fn len(&self) -> usize {
        self.len
    }

    fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn and(&self, other: &Self) -> Self {
        self.zip_words(other, |a, b| a & b)
    }

    fn or(&self, other: &Self) -> Self {
        self.zip_words(other, |a, b| a | b)
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.assert_same_length(other);
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    fn zeroed(&self) -> Self {
        Self::with_length(self.len)
    }
}

impl FromStr for Bitlist {
    type Err = ParseBitlistError;

    /// Parses a string of `0`/`1` characters, index 0 first. An optional `0b`
    /// prefix is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0b").unwrap_or(s);
        let mut bits = Self::with_length(digits.chars().count());
        for (position, character) in digits.chars().enumerate() {
            match character {
                '0' => {}
                '1' => bits.set(position, true),
                _ => return Err(ParseBitlistError { character, position }),
            }
        }
        Ok(bits)
    }
}

impl fmt::Display for Bitlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0b")?;
        for i in 0..self.len {
            f.write_str(if self.get(i) == Some(true) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bitlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitlist({}, len={})", self, self.len)
    }
}

#[cfg(feature = "ssz")]
mod ssz {
    use super::Bitfield;
    use ssz_types::{BitList, typenum::Unsigned};

    impl<N: Unsigned + Clone> Bitfield for BitList<N> {
        fn len(&self) -> usize {
            Self::len(self)
        }

        fn count_ones(&self) -> usize {
            self.num_set_bits()
        }

        fn and(&self, other: &Self) -> Self {
            self.intersection(other)
        }

        fn or(&self, other: &Self) -> Self {
            self.union(other)
        }

        fn overlaps(&self, other: &Self) -> bool {
            !self.intersection(other).is_zero()
        }

        fn zeroed(&self) -> Self {
            Self::with_capacity(Self::len(self))
                .expect("length of an existing list is within its limit")
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use ssz_types::typenum::U64;

        fn bits(pattern: &[bool]) -> BitList<U64> {
            let mut list = BitList::<U64>::with_capacity(pattern.len()).unwrap();
            for (i, bit) in pattern.iter().enumerate() {
                list.set(i, *bit).unwrap();
            }
            list
        }

        #[test]
        fn test_ssz_bitlist_capability() {
            let a = bits(&[true, true, false, false]);
            let b = bits(&[false, true, true, false]);

            assert_eq!(Bitfield::len(&a), 4);
            assert_eq!(Bitfield::count_ones(&a), 2);
            assert_eq!(Bitfield::count_ones(&Bitfield::and(&a, &b)), 1);
            assert_eq!(Bitfield::count_ones(&Bitfield::or(&a, &b)), 3);
            assert!(Bitfield::overlaps(&a, &b));

            let zero = Bitfield::zeroed(&a);
            assert_eq!(Bitfield::len(&zero), 4);
            assert_eq!(Bitfield::count_ones(&zero), 0);
        }

        #[test]
        fn test_ssz_zeroed_at_full_limit() {
            let full = bits(&[true; 64]);
            let zero = Bitfield::zeroed(&full);

            assert_eq!(Bitfield::len(&zero), 64);
            assert_eq!(Bitfield::count_ones(&zero), 0);
            assert!(!Bitfield::overlaps(&zero, &full));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> Bitlist {
        s.parse().expect("valid bit string")
    }

    #[test]
    fn test_with_length_is_zeroed() {
        let list = Bitlist::with_length(130);
        assert_eq!(list.len(), 130);
        assert_eq!(list.count_ones(), 0);
        assert_eq!(list.words.len(), 3);
    }

    #[test]
    fn test_set_and_get() {
        let mut list = Bitlist::with_length(70);
        list.set(0, true);
        list.set(69, true);
        list.set(64, true);
        list.set(64, false);

        assert_eq!(list.get(0), Some(true));
        assert_eq!(list.get(1), Some(false));
        assert_eq!(list.get(64), Some(false));
        assert_eq!(list.get(69), Some(true));
        assert_eq!(list.get(70), None);
        assert_eq!(list.count_ones(), 2);
    }

    #[test]
    #[should_panic]
    fn test_set_out_of_range_panics() {
        let mut list = Bitlist::with_length(8);
        list.set(8, true);
    }

    #[test]
    fn test_and_or_overlap() {
        let x = bits("11110000");
        let y = bits("00111100");
        let z = bits("00001111");

        assert_eq!(x.and(&y), bits("00110000"));
        assert_eq!(x.or(&z), bits("11111111"));
        assert!(x.overlaps(&y));
        assert!(!x.overlaps(&z));
    }

    #[test]
    fn test_or_keeps_declared_length() {
        let a = Bitlist::from_indices(100, &[3, 99]);
        let b = Bitlist::from_indices(100, &[64]);
        let union = a.or(&b);

        assert_eq!(union.len(), 100);
        assert_eq!(union.ones().collect::<Vec<_>>(), vec![3, 64, 99]);
    }

    #[test]
    #[should_panic]
    fn test_or_with_different_length_panics() {
        let _ = bits("1010").or(&bits("10101010"));
    }

    #[test]
    fn test_zeroed_matches_length() {
        let full = bits("111");
        let zero = full.zeroed();
        assert_eq!(zero.len(), 3);
        assert_eq!(zero.count_ones(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "1102".parse::<Bitlist>().unwrap_err();
        assert_eq!(
            err,
            ParseBitlistError {
                character: '2',
                position: 3
            }
        );
        assert_eq!(err.to_string(), "invalid bit character '2' at position 3");
    }

    #[test]
    fn test_display_and_prefix_parse() {
        let list = bits("0b1001");
        assert_eq!(list.to_string(), "0b1001");
        assert_eq!(format!("{list:?}"), "Bitlist(0b1001, len=4)");
    }

    #[test]
    #[should_panic]
    fn test_overlaps_with_different_length_panics() {
        let _ = bits("1010").overlaps(&bits("10101010"));
    }

    #[test]
    fn test_serde_json_round_trip() {
        let list = Bitlist::from_indices(70, &[1, 64, 69]);
        let json = serde_json::to_string(&list).expect("Serialization should succeed");
        let decoded: Bitlist = serde_json::from_str(&json).expect("Deserialization should succeed");
        assert_eq!(decoded, list);
        assert_eq!(decoded.count_ones(), 3);
    }

    #[test]
    fn test_deserialize_rejects_wrong_word_count() {
        let err = serde_json::from_str::<Bitlist>(r#"{"len":8,"words":[0,1]}"#).unwrap_err();
        assert!(err.to_string().contains("needs 1 words, found 2"));

        let err = serde_json::from_str::<Bitlist>(r#"{"len":70,"words":[1]}"#).unwrap_err();
        assert!(err.to_string().contains("needs 2 words, found 1"));
    }

    #[test]
    fn test_deserialize_rejects_bits_past_length() {
        // 17 = 0b10001: bit 4 lies past a declared length of 4
        let err = serde_json::from_str::<Bitlist>(r#"{"len":4,"words":[17]}"#).unwrap_err();
        assert!(err.to_string().contains("bits set past its length"));

        let full: Bitlist =
            serde_json::from_str(r#"{"len":64,"words":[18446744073709551615]}"#)
                .expect("A full final word is valid");
        assert_eq!(full.count_ones(), 64);
    }

    #[test]
    fn test_try_from_raw_words() {
        assert_eq!(
            Bitlist::try_from(RawBitlist {
                len: 0,
                words: vec![0]
            }),
            Err(InvalidBitlistError::WordCount {
                len: 0,
                expected: 0,
                found: 1
            })
        );
        assert_eq!(
            Bitlist::try_from(RawBitlist {
                len: 3,
                words: vec![0b101]
            }),
            Ok(Bitlist::from_indices(3, &[0, 2]))
        );
    }

    #[test]
    fn test_to_bytes_and_hex() {
        let list = Bitlist::from_indices(12, &[0, 8, 11]);
        assert_eq!(list.to_bytes(), vec![0x01, 0x09]);
        assert_eq!(list.to_hex(), "0109");
        assert!(Bitlist::with_length(0).to_bytes().is_empty());
    }
}
