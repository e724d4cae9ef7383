use crate::error::CoreError;

/// Number of unambiguous amino acid residues.
pub const AMINO_ALPHABET_SIZE: usize = 20;
/// Digital code for a gap character.
pub const GAP_RESIDUE: u8 = 20;
/// Digital code for an ambiguous or unknown residue.
pub const AMBIGUOUS_RESIDUE: u8 = 21;
/// Digital code for a missing-data character.
pub const MISSING_RESIDUE: u8 = 22;
/// Full alphabet size: 20 residues plus gap, ambiguous, and missing codes.
pub const MAX_ALPHABET_SIZE: usize = 23;

/// Canonical residue ordering; a residue's digital code is its index here.
pub const AMINO_ALPHABET: [u8; AMINO_ALPHABET_SIZE] = *b"ACDEFGHIKLMNPQRSTVWY";

fn digitize(byte: u8) -> u8 {
    match byte.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'D' => 2,
        b'E' => 3,
        b'F' => 4,
        b'G' => 5,
        b'H' => 6,
        b'I' => 7,
        b'K' => 8,
        b'L' => 9,
        b'M' => 10,
        b'N' => 11,
        b'P' => 12,
        b'Q' => 13,
        b'R' => 14,
        b'S' => 15,
        b'T' => 16,
        b'V' => 17,
        b'W' => 18,
        b'Y' => 19,
        b'-' | b'.' => GAP_RESIDUE,
        b'~' => MISSING_RESIDUE,
        // B, J, O, U, X, Z and anything else unexpected
        _ => AMBIGUOUS_RESIDUE,
    }
}

/// A digitised amino-acid sequence.
///
/// DP code indexes rows from 1, so the residue for row `i` is
/// `digital[i - 1]`.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    pub name: String,
    pub length: usize,
    pub digital: Vec<u8>,
}

impl Sequence {
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, CoreError> {
        let digital: Vec<u8> = bytes
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|&b| digitize(b))
            .collect();

        if digital.is_empty() {
            return Err(CoreError::InvalidShape("empty sequence".into()));
        }

        Ok(Sequence {
            name: String::new(),
            length: digital.len(),
            digital,
        })
    }

    pub fn from_digital(codes: &[u8]) -> Result<Self, CoreError> {
        if codes.is_empty() {
            return Err(CoreError::InvalidShape("empty sequence".into()));
        }
        if let Some(&bad) = codes.iter().find(|&&c| c as usize >= MAX_ALPHABET_SIZE) {
            return Err(CoreError::InvalidShape(format!(
                "digital residue code {bad} out of range"
            )));
        }

        Ok(Sequence {
            name: String::new(),
            length: codes.len(),
            digital: codes.to_vec(),
        })
    }

    /// Residue code for 1-indexed sequence position `idx`.
    #[inline]
    pub fn residue(&self, idx: usize) -> u8 {
        debug_assert!(idx >= 1 && idx <= self.length);
        self.digital[idx - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digitizes_canonical_residues_in_order() {
        let seq = Sequence::from_utf8(b"ACDEFGHIKLMNPQRSTVWY").unwrap();
        let expected: Vec<u8> = (0..20).collect();
        assert_eq!(seq.digital, expected);
        assert_eq!(seq.length, 20);
    }

    #[test]
    fn maps_gaps_and_unknowns() {
        let seq = Sequence::from_utf8(b"A-x.Z").unwrap();
        assert_eq!(
            seq.digital,
            vec![0, GAP_RESIDUE, AMBIGUOUS_RESIDUE, GAP_RESIDUE, AMBIGUOUS_RESIDUE]
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            Sequence::from_utf8(b"  \n"),
            Err(CoreError::InvalidShape(_))
        ));
    }

    #[test]
    fn residue_is_one_indexed() {
        let seq = Sequence::from_utf8(b"ACD").unwrap();
        assert_eq!(seq.residue(1), 0);
        assert_eq!(seq.residue(3), 2);
    }
}
