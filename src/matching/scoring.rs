//! Scoring weights for the match algorithms
//!
//! Scores are only compared within one ranking pass, so the absolute values
//! carry no meaning. What matters is their ordering:
//! - a match on a word boundary beats one in the middle of a word
//! - consecutive matched characters beat scattered ones
//! - a gap costs more to open than to extend

use serde::{Deserialize, Serialize};

/// Character class used to compute positional bonuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    NonWord,
    Lower,
    Upper,
    Letter,
    Number,
}

impl CharClass {
    #[inline]
    pub fn of(c: char) -> Self {
        if c.is_ascii() {
            Self::of_ascii(c)
        } else {
            Self::of_non_ascii(c)
        }
    }

    #[inline]
    pub fn of_ascii(c: char) -> Self {
        match c {
            'a'..='z' => CharClass::Lower,
            'A'..='Z' => CharClass::Upper,
            '0'..='9' => CharClass::Number,
            _ => CharClass::NonWord,
        }
    }

    pub fn of_non_ascii(c: char) -> Self {
        if c.is_lowercase() {
            CharClass::Lower
        } else if c.is_uppercase() {
            CharClass::Upper
        } else if c.is_numeric() {
            CharClass::Number
        } else if c.is_alphabetic() {
            CharClass::Letter
        } else {
            CharClass::NonWord
        }
    }
}

/// Configurable weights for match scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Points for each matched character
    pub score_match: i16,
    /// Penalty for opening a gap (negative)
    pub gap_start: i16,
    /// Penalty for each further character of a gap (negative)
    pub gap_extension: i16,
    /// Bonus for a match right after a non-word character or at the start
    pub bonus_boundary: i16,
    /// Bonus for matching a non-word character
    pub bonus_non_word: i16,
    /// Bonus for camelCase and letter-to-digit transitions
    pub bonus_camel123: i16,
    /// Minimum bonus for characters inside a consecutive run
    pub bonus_consecutive: i16,
    /// Multiplier applied to the bonus of the first pattern character
    pub first_char_multiplier: i16,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let score_match = 16;
        let gap_start = -3;
        let gap_extension = -1;
        let bonus_boundary = score_match / 2;
        Self {
            score_match,
            gap_start,
            gap_extension,
            bonus_boundary,
            bonus_non_word: score_match / 2,
            // No single-character gap accompanies a camelCase transition
            bonus_camel123: bonus_boundary + gap_extension,
            bonus_consecutive: -(gap_start + gap_extension),
            first_char_multiplier: 2,
        }
    }
}

impl ScoringWeights {
    /// Bonus for a character of class `class` preceded by one of `prev`
    #[inline]
    pub fn bonus_for(&self, prev: CharClass, class: CharClass) -> i16 {
        if prev == CharClass::NonWord && class != CharClass::NonWord {
            self.bonus_boundary
        } else if (prev == CharClass::Lower && class == CharClass::Upper)
            || (prev != CharClass::Number && class == CharClass::Number)
        {
            self.bonus_camel123
        } else if class == CharClass::NonWord {
            self.bonus_non_word
        } else {
            0
        }
    }

    /// Check the ordering the algorithms rely on. Used to reject nonsensical
    /// config file values.
    pub fn is_consistent(&self) -> bool {
        self.score_match > 0
            && self.gap_start <= self.gap_extension
            && self.gap_extension <= 0
            && self.bonus_boundary >= self.bonus_camel123
            && self.bonus_consecutive >= 0
            && self.first_char_multiplier >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let w = ScoringWeights::default();
        assert_eq!(w.score_match, 16);
        assert_eq!(w.gap_start, -3);
        assert_eq!(w.gap_extension, -1);
        assert_eq!(w.bonus_boundary, 8);
        assert_eq!(w.bonus_non_word, 8);
        assert_eq!(w.bonus_camel123, 7);
        assert_eq!(w.bonus_consecutive, 4);
        assert_eq!(w.first_char_multiplier, 2);
        assert!(w.is_consistent());
    }

    #[test]
    fn test_char_class() {
        assert_eq!(CharClass::of('a'), CharClass::Lower);
        assert_eq!(CharClass::of('Z'), CharClass::Upper);
        assert_eq!(CharClass::of('5'), CharClass::Number);
        assert_eq!(CharClass::of('/'), CharClass::NonWord);
        assert_eq!(CharClass::of('é'), CharClass::Lower);
        assert_eq!(CharClass::of('É'), CharClass::Upper);
        assert_eq!(CharClass::of('漢'), CharClass::Letter);
    }

    #[test]
    fn test_bonus_ordering() {
        let w = ScoringWeights::default();
        let boundary = w.bonus_for(CharClass::NonWord, CharClass::Lower);
        let camel = w.bonus_for(CharClass::Lower, CharClass::Upper);
        let middle = w.bonus_for(CharClass::Lower, CharClass::Lower);
        assert!(boundary > camel);
        assert!(camel > middle);
        assert_eq!(w.bonus_for(CharClass::Letter, CharClass::Number), w.bonus_camel123);
        assert_eq!(w.bonus_for(CharClass::Lower, CharClass::NonWord), w.bonus_non_word);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let w: ScoringWeights = serde_json::from_str(r#"{"bonus_boundary": 10}"#).unwrap();
        assert_eq!(w.bonus_boundary, 10);
        assert_eq!(w.score_match, 16);
    }
}
