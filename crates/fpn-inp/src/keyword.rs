//! Record keywords and the per-line classifier.
//!
//! Every FPN data line starts with a keyword token followed by the field
//! separator, e.g. `NODE   , 1, 0.0, 0.0, 0.0`. Lines that start with the
//! separator itself carry the tail of a multi-line group command.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub const FIELD_SEPARATOR: char = ',';
pub const COMMENT_MARKER: &str = "$$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Keyword {
    Node,
    Tetra,
    Hexa,
    Penta,
    Line,
    Tria,
    Ctria,
    Quad,
    Cquad,
    Pshell,
    Petruss,
    Miso,
    Matgen,
    Matporo,
    Mnlmc,
    Mset,
    Stage,
    Madd,
    Mdel,
    Ladd,
    Badd,
    Lset,
    Bset,
    Const,
    Pstrst,
}

impl Keyword {
    pub const ALL: [Keyword; 25] = [
        Keyword::Node,
        Keyword::Tetra,
        Keyword::Hexa,
        Keyword::Penta,
        Keyword::Line,
        Keyword::Tria,
        Keyword::Ctria,
        Keyword::Quad,
        Keyword::Cquad,
        Keyword::Pshell,
        Keyword::Petruss,
        Keyword::Miso,
        Keyword::Matgen,
        Keyword::Matporo,
        Keyword::Mnlmc,
        Keyword::Mset,
        Keyword::Stage,
        Keyword::Madd,
        Keyword::Mdel,
        Keyword::Ladd,
        Keyword::Badd,
        Keyword::Lset,
        Keyword::Bset,
        Keyword::Const,
        Keyword::Pstrst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Node => "NODE",
            Keyword::Tetra => "TETRA",
            Keyword::Hexa => "HEXA",
            Keyword::Penta => "PENTA",
            Keyword::Line => "LINE",
            Keyword::Tria => "TRIA",
            Keyword::Ctria => "CTRIA",
            Keyword::Quad => "QUAD",
            Keyword::Cquad => "CQUAD",
            Keyword::Pshell => "PSHELL",
            Keyword::Petruss => "PETRUSS",
            Keyword::Miso => "MISO",
            Keyword::Matgen => "MATGEN",
            Keyword::Matporo => "MATPORO",
            Keyword::Mnlmc => "MNLMC",
            Keyword::Mset => "MSET",
            Keyword::Stage => "STAGE",
            Keyword::Madd => "MADD",
            Keyword::Mdel => "MDEL",
            Keyword::Ladd => "LADD",
            Keyword::Badd => "BADD",
            Keyword::Lset => "LSET",
            Keyword::Bset => "BSET",
            Keyword::Const => "CONST",
            Keyword::Pstrst => "PSTRST",
        }
    }

    /// Look up the keyword for a leading token.
    ///
    /// The whole token is compared, so keywords sharing a prefix
    /// (`TRIA` / `CTRIA`, `MATGEN` / `MATPORO`) never shadow each other.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Keyword::ALL
            .iter()
            .copied()
            .find(|kw| kw.as_str().eq_ignore_ascii_case(token))
    }

    /// Minimum number of comma-separated fields, keyword included.
    pub fn min_fields(self) -> usize {
        match self {
            Keyword::Node => 5,
            Keyword::Tetra => 7,
            Keyword::Hexa => 11,
            Keyword::Penta => 9,
            Keyword::Line => 5,
            Keyword::Tria | Keyword::Ctria => 6,
            Keyword::Quad | Keyword::Cquad => 7,
            Keyword::Pshell | Keyword::Petruss => 3,
            Keyword::Miso | Keyword::Matgen | Keyword::Matporo | Keyword::Mnlmc => 2,
            Keyword::Mset | Keyword::Lset | Keyword::Bset => 2,
            Keyword::Stage => 3,
            Keyword::Madd | Keyword::Mdel | Keyword::Ladd | Keyword::Badd => 3,
            Keyword::Const | Keyword::Pstrst => 4,
        }
    }

    pub fn is_group_command(self) -> bool {
        matches!(
            self,
            Keyword::Madd | Keyword::Mdel | Keyword::Ladd | Keyword::Badd
        )
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single trimmed line is, given whether a group command is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Empty line or `$$` comment.
    Skip,
    Record(Keyword),
    /// Bare-separator line extending the open group command.
    Continuation,
    /// Bare-separator line with no open group command to extend.
    Orphan,
    /// Leading token that is not a known keyword (`VER`, `UNIT`, ...).
    Unrecognized(&'a str),
}

pub fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER)
}

pub fn classify(line: &str, continuation_open: bool) -> LineClass<'_> {
    let line = line.trim();
    if line.is_empty() || is_comment(line) {
        return LineClass::Skip;
    }

    if line.starts_with(FIELD_SEPARATOR) {
        return if continuation_open {
            LineClass::Continuation
        } else {
            LineClass::Orphan
        };
    }

    let token = line
        .split(FIELD_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim();
    match Keyword::from_token(token) {
        Some(keyword) => LineClass::Record(keyword),
        None => LineClass::Unrecognized(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_padded_keyword_tokens() {
        assert_eq!(
            classify("NODE   , 1, 0., 0., 0.", false),
            LineClass::Record(Keyword::Node)
        );
        assert_eq!(
            classify("  CTRIA , 5, 1, 1, 2, 3", false),
            LineClass::Record(Keyword::Ctria)
        );
        assert_eq!(
            classify("TRIA , 5, 1, 1, 2, 3", false),
            LineClass::Record(Keyword::Tria)
        );
        assert_eq!(
            classify("matporo, 3, 1e-8, 0.4", false),
            LineClass::Record(Keyword::Matporo)
        );
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(classify("", true), LineClass::Skip);
        assert_eq!(classify("   ", false), LineClass::Skip);
        assert_eq!(classify("$$ Node", true), LineClass::Skip);
    }

    #[test]
    fn routes_bare_separator_lines_by_cursor() {
        assert_eq!(classify(", 4, 5, 6", true), LineClass::Continuation);
        assert_eq!(classify(", 4, 5, 6", false), LineClass::Orphan);
    }

    #[test]
    fn keyword_line_is_never_a_continuation() {
        assert_eq!(
            classify("MADD   , 2, 1, 7", true),
            LineClass::Record(Keyword::Madd)
        );
    }

    #[test]
    fn unknown_tokens_are_reported() {
        assert_eq!(classify("VER, 2.0.0", false), LineClass::Unrecognized("VER"));
        assert_eq!(
            classify("PSOLID , 1, 3D", false),
            LineClass::Unrecognized("PSOLID")
        );
    }

    #[test]
    fn every_keyword_round_trips_through_its_token() {
        for kw in Keyword::ALL {
            assert_eq!(Keyword::from_token(kw.as_str()), Some(kw));
        }
    }
}
