//! Six-character degree-of-freedom codes used by `CONST` records.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub const DOF_CODE_LEN: usize = 6;

/// Component names in code order.
pub const DOF_NAMES: [&str; DOF_CODE_LEN] = ["TX", "TY", "TZ", "RX", "RY", "RZ"];

/// Constrained flags in the order translation X/Y/Z, rotation X/Y/Z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DofCode {
    flags: [bool; DOF_CODE_LEN],
}

impl DofCode {
    pub fn new(flags: [bool; DOF_CODE_LEN]) -> Self {
        Self { flags }
    }

    /// Decode a raw code. Non-digit characters are dropped, then the digits
    /// are truncated or right-padded with `'0'` to six characters. Only
    /// `'1'` counts as constrained.
    pub fn parse(raw: &str) -> Self {
        let mut flags = [false; DOF_CODE_LEN];
        raw.chars()
            .filter(|c| c.is_ascii_digit())
            .take(DOF_CODE_LEN)
            .enumerate()
            .for_each(|(i, c)| flags[i] = c == '1');
        Self { flags }
    }

    pub fn flags(&self) -> [bool; DOF_CODE_LEN] {
        self.flags
    }

    pub fn translations(&self) -> [bool; 3] {
        [self.flags[0], self.flags[1], self.flags[2]]
    }

    pub fn rotations(&self) -> [bool; 3] {
        [self.flags[3], self.flags[4], self.flags[5]]
    }

    pub fn any_rotation(&self) -> bool {
        self.rotations().iter().any(|&f| f)
    }

    pub fn is_free(&self) -> bool {
        self.flags.iter().all(|&f| !f)
    }

    /// Canonical six-character `0`/`1` form.
    pub fn as_code(&self) -> String {
        self.flags
            .iter()
            .map(|&f| if f { '1' } else { '0' })
            .collect()
    }
}

impl Display for DofCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_code_in_component_order() {
        let code = DofCode::parse("110001");
        assert_eq!(code.flags(), [true, true, false, false, false, true]);
        assert_eq!(code.translations(), [true, true, false]);
        assert!(code.any_rotation());
    }

    #[test]
    fn short_codes_are_right_padded() {
        let code = DofCode::parse("11");
        assert_eq!(code.as_code(), "110000");
        assert!(!code.any_rotation());
    }

    #[test]
    fn long_codes_are_truncated() {
        assert_eq!(DofCode::parse("1110001").as_code(), "111000");
        assert_eq!(DofCode::parse("0000001111").as_code(), "000000");
    }

    #[test]
    fn re_encoding_is_idempotent() {
        for raw in ["", "1", "010", "111111", "1010101", " 11 0", "000111"] {
            let once = DofCode::parse(raw);
            let twice = DofCode::parse(&once.as_code());
            assert_eq!(once, twice, "raw code {raw:?}");
            assert_eq!(once.as_code().len(), DOF_CODE_LEN);
        }
    }

    #[test]
    fn empty_code_is_free() {
        assert!(DofCode::parse("").is_free());
        assert!(!DofCode::parse("000001").is_free());
    }
}
