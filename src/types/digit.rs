//! DTMF digit symbols
//!
//! Keypad buttons and physical keys both normalize into `DigitSymbol`
//! before reaching the session controller.

use serde::{Deserialize, Serialize};

/// One symbol of the telephone keypad: `0-9`, `*`, `#`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigitSymbol {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,
    Star,
    Hash,
}

impl DigitSymbol {
    /// Keypad order as laid out on the dialer tab
    pub const ALL: [DigitSymbol; 12] = [
        DigitSymbol::D1,
        DigitSymbol::D2,
        DigitSymbol::D3,
        DigitSymbol::D4,
        DigitSymbol::D5,
        DigitSymbol::D6,
        DigitSymbol::D7,
        DigitSymbol::D8,
        DigitSymbol::D9,
        DigitSymbol::Star,
        DigitSymbol::D0,
        DigitSymbol::Hash,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        let digit = match c {
            '0' => Self::D0,
            '1' => Self::D1,
            '2' => Self::D2,
            '3' => Self::D3,
            '4' => Self::D4,
            '5' => Self::D5,
            '6' => Self::D6,
            '7' => Self::D7,
            '8' => Self::D8,
            '9' => Self::D9,
            '*' => Self::Star,
            '#' => Self::Hash,
            _ => return None,
        };
        Some(digit)
    }

    /// Map a keyboard key name to a symbol.
    ///
    /// Only single-character keys in the keypad set qualify; named keys such
    /// as `Enter` or `F1` never do.
    pub fn from_key(key: &str) -> Option<Self> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::D0 => '0',
            Self::D1 => '1',
            Self::D2 => '2',
            Self::D3 => '3',
            Self::D4 => '4',
            Self::D5 => '5',
            Self::D6 => '6',
            Self::D7 => '7',
            Self::D8 => '8',
            Self::D9 => '9',
            Self::Star => '*',
            Self::Hash => '#',
        }
    }

    /// Suffix used in host command keys (`nv_digit_7`, `nv_digit_star`)
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Self::D0 => "0",
            Self::D1 => "1",
            Self::D2 => "2",
            Self::D3 => "3",
            Self::D4 => "4",
            Self::D5 => "5",
            Self::D6 => "6",
            Self::D7 => "7",
            Self::D8 => "8",
            Self::D9 => "9",
            Self::Star => "star",
            Self::Hash => "hash",
        }
    }

    pub fn from_key_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key_suffix() == suffix)
    }
}

impl std::fmt::Display for DigitSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
