//! Majority-vote decoding of 3-bit readouts.
//!
//! Character `i` of a readout is the measured value of qubit `i`. The
//! majority bit is the value held by at least two characters; when exactly
//! one character disagrees its index is the error position.
//!
//! ```
//! use bitflip_qec::MajorityVote;
//!
//! let vote = MajorityVote::from_bits("101").unwrap();
//! assert_eq!(vote.majority(), '1');
//! assert_eq!(vote.error_position(), Some(1));
//! assert_eq!(vote.corrected().bits, "111");
//! ```

use serde::Serialize;

use bitflip_hal::Counts;

use crate::error::{QecError, QecResult};

/// Number of physical carriers in the repetition code.
pub const CODE_LENGTH: usize = 3;

/// Decoded 3-bit readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MajorityVote {
    bits: String,
    majority: char,
    error_detected: bool,
    error_position: Option<usize>,
}

impl MajorityVote {
    /// Decode a readout such as `"010"`.
    pub fn from_bits(bits: &str) -> QecResult<Self> {
        let chars: Vec<char> = bits.chars().collect();
        if chars.len() != CODE_LENGTH {
            return Err(QecError::invalid(format!(
                "expected {CODE_LENGTH} bits, got {} in '{bits}'",
                chars.len()
            )));
        }
        if let Some(bad) = chars.iter().find(|c| !matches!(c, '0' | '1')) {
            return Err(QecError::invalid(format!(
                "'{bad}' is not a bit in '{bits}'"
            )));
        }

        let zeros = chars.iter().filter(|&&c| c == '0').count();
        let majority = if zeros >= 2 { '0' } else { '1' };
        let error_position = chars.iter().position(|&c| c != majority);

        Ok(Self {
            bits: bits.to_string(),
            majority,
            error_detected: error_position.is_some(),
            error_position,
        })
    }

    /// The readout as given.
    pub fn bits(&self) -> &str {
        &self.bits
    }

    /// Bit held by at least two carriers.
    pub fn majority(&self) -> char {
        self.majority
    }

    /// False only when all three carriers agree.
    pub fn error_detected(&self) -> bool {
        self.error_detected
    }

    /// Index of the single disagreeing carrier.
    pub fn error_position(&self) -> Option<usize> {
        self.error_position
    }

    /// The readout with the minority carrier flipped back.
    pub fn corrected(&self) -> Correction {
        Correction {
            bits: std::iter::repeat_n(self.majority, CODE_LENGTH).collect(),
            position: self.error_position,
            applied: self.error_detected,
        }
    }
}

/// Outcome of majority-vote correction of a readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    /// Corrected readout: all carriers hold the majority bit.
    pub bits: String,
    /// Carrier that was flipped.
    pub position: Option<usize>,
    /// Whether anything was flipped.
    pub applied: bool,
}

/// Every 3-bit pattern, in ascending binary order, with its error position.
///
/// The syndrome correction stage turns each `Some` row into a classically
/// conditioned flip.
pub fn correction_table() -> Vec<(String, Option<usize>)> {
    (0..1u8 << CODE_LENGTH)
        .map(|v| {
            let bits: String = (0..CODE_LENGTH)
                .rev()
                .map(|i| if v & (1 << i) != 0 { '1' } else { '0' })
                .collect();
            let position = MajorityVote::from_bits(&bits)
                .ok()
                .and_then(|vote| vote.error_position());
            (bits, position)
        })
        .collect()
}

/// One distinct outcome of a counts histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRow {
    /// Decoded readout.
    pub vote: MajorityVote,
    /// Number of shots that produced it.
    pub count: u64,
    /// Share of all shots, in percent.
    pub percentage: f64,
}

/// Majority-vote view of a whole histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountsAnalysis {
    /// Rows ordered by descending count.
    pub rows: Vec<OutcomeRow>,
    /// Total shots.
    pub total_shots: u64,
    /// Shots whose readout was a codeword.
    pub clean_shots: u64,
    /// Shots with one disagreeing carrier.
    pub flagged_shots: u64,
}

/// Decode every outcome of a histogram.
#[allow(clippy::cast_precision_loss)]
pub fn analyze_counts(counts: &Counts) -> QecResult<CountsAnalysis> {
    let total_shots = counts.total_shots();
    let mut rows = Vec::with_capacity(counts.len());
    let mut flagged_shots = 0;

    for (bits, &count) in counts.sorted() {
        let vote = MajorityVote::from_bits(bits)?;
        if vote.error_detected() {
            flagged_shots += count;
        }
        let percentage = if total_shots == 0 {
            0.0
        } else {
            count as f64 / total_shots as f64 * 100.0
        };
        rows.push(OutcomeRow {
            vote,
            count,
            percentage,
        });
    }

    Ok(CountsAnalysis {
        rows,
        total_shots,
        clean_shots: total_shots - flagged_shots,
        flagged_shots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_readouts() {
        let vote = MajorityVote::from_bits("000").unwrap();
        assert_eq!(vote.majority(), '0');
        assert!(!vote.error_detected());
        assert_eq!(vote.error_position(), None);

        let vote = MajorityVote::from_bits("010").unwrap();
        assert_eq!(vote.majority(), '0');
        assert!(vote.error_detected());
        assert_eq!(vote.error_position(), Some(1));

        let vote = MajorityVote::from_bits("101").unwrap();
        assert_eq!(vote.majority(), '1');
        assert_eq!(vote.error_position(), Some(1));

        let vote = MajorityVote::from_bits("110").unwrap();
        assert_eq!(vote.error_position(), Some(2));
    }

    #[test]
    fn test_rejects_wrong_length() {
        for bad in ["", "01", "0101"] {
            let err = MajorityVote::from_bits(bad).unwrap_err();
            assert!(err.is_invalid_input(), "{bad}");
        }
    }

    #[test]
    fn test_rejects_non_binary() {
        assert!(MajorityVote::from_bits("0a1").unwrap_err().is_invalid_input());
        assert!(MajorityVote::from_bits("012").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_correction() {
        let fix = MajorityVote::from_bits("001").unwrap().corrected();
        assert_eq!(fix.bits, "000");
        assert_eq!(fix.position, Some(2));
        assert!(fix.applied);

        let fix = MajorityVote::from_bits("111").unwrap().corrected();
        assert_eq!(fix.bits, "111");
        assert!(!fix.applied);
    }

    #[test]
    fn test_correction_table() {
        let table = correction_table();
        assert_eq!(table.len(), 8);
        assert_eq!(table[0], ("000".to_string(), None));
        assert_eq!(table[7], ("111".to_string(), None));
        let flagged: Vec<_> = table.iter().filter(|(_, p)| p.is_some()).collect();
        assert_eq!(flagged.len(), 6);
        assert!(table.contains(&("011".to_string(), Some(0))));
        assert!(table.contains(&("100".to_string(), Some(0))));
    }

    #[test]
    fn test_analyze_counts() {
        let mut counts = Counts::new();
        counts.insert("000", 90);
        counts.insert("010", 10);

        let analysis = analyze_counts(&counts).unwrap();
        assert_eq!(analysis.total_shots, 100);
        assert_eq!(analysis.clean_shots, 90);
        assert_eq!(analysis.flagged_shots, 10);
        assert_eq!(analysis.rows[0].vote.bits(), "000");
        assert!((analysis.rows[1].percentage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_counts_rejects_wide_keys() {
        let mut counts = Counts::new();
        counts.insert("0000", 1);
        assert!(analyze_counts(&counts).is_err());
    }

    #[test]
    fn test_serializes_for_api() {
        let json = serde_json::to_value(MajorityVote::from_bits("100").unwrap()).unwrap();
        assert_eq!(json["majority"], "0");
        assert_eq!(json["error_detected"], true);
        assert_eq!(json["error_position"], 0);
    }

    proptest! {
        #[test]
        fn prop_codewords_have_no_error(bit in prop::bool::ANY) {
            let c = if bit { '1' } else { '0' };
            let bits: String = std::iter::repeat_n(c, 3).collect();
            let vote = MajorityVote::from_bits(&bits).unwrap();
            prop_assert!(!vote.error_detected());
            prop_assert_eq!(vote.majority(), c);
        }

        #[test]
        fn prop_single_disagreement_is_located(bits in prop::array::uniform3(prop::bool::ANY)) {
            let s: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
            let ones = bits.iter().filter(|&&b| b).count();
            let vote = MajorityVote::from_bits(&s).unwrap();

            prop_assert_eq!(vote.error_detected(), ones == 1 || ones == 2);
            if let Some(pos) = vote.error_position() {
                let others: Vec<bool> = (0..3).filter(|&i| i != pos).map(|i| bits[i]).collect();
                prop_assert_eq!(others[0], others[1]);
                prop_assert_ne!(bits[pos], others[0]);
            }
            prop_assert!(vote.corrected().bits.chars().all(|c| c == vote.majority()));
        }
    }
}
