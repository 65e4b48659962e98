use crate::interner::{Interner, Name};
use crate::source_map::Pos;
use derive_more::IsVariant;
use std::borrow::Cow;

/// Token classification. A token is either a single source character or one
/// of the closed set of compound tags below.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IsVariant)]
pub enum Rune {
    Char(char),

    Identifier,
    IntConst,
    FloatConst,
    CharConst,
    StringLiteral,
    LongCharConst,
    LongStringLiteral,
    PpNumber,

    // Multi-character punctuators.
    PpPaste, // ##
    Ddd,     // ...
    AddAssign,
    AndAnd,
    AndAssign,
    Arrow,
    Dec,
    DivAssign,
    Eq,
    Geq,
    Inc,
    Leq,
    Lsh,
    LshAssign,
    ModAssign,
    MulAssign,
    Neq,
    OrAssign,
    OrOr,
    Rsh,
    RshAssign,
    SubAssign,
    XorAssign,

    // A '#' that opens a logical line.
    Directive,
    // Hide-set bookkeeping marker; never leaves the expander.
    Sentinel,
    // Identifier frozen against re-expansion.
    NonRepl,
    TypedefName,

    Eof,
}

// Compound tags are encoded past the Unicode scalar range.
const TAG_BASE: u32 = 0x11_0000;

const TAGS: &[Rune] = &[
    Rune::Identifier,
    Rune::IntConst,
    Rune::FloatConst,
    Rune::CharConst,
    Rune::StringLiteral,
    Rune::LongCharConst,
    Rune::LongStringLiteral,
    Rune::PpNumber,
    Rune::PpPaste,
    Rune::Ddd,
    Rune::AddAssign,
    Rune::AndAnd,
    Rune::AndAssign,
    Rune::Arrow,
    Rune::Dec,
    Rune::DivAssign,
    Rune::Eq,
    Rune::Geq,
    Rune::Inc,
    Rune::Leq,
    Rune::Lsh,
    Rune::LshAssign,
    Rune::ModAssign,
    Rune::MulAssign,
    Rune::Neq,
    Rune::OrAssign,
    Rune::OrOr,
    Rune::Rsh,
    Rune::RshAssign,
    Rune::SubAssign,
    Rune::XorAssign,
    Rune::Directive,
    Rune::Sentinel,
    Rune::NonRepl,
    Rune::TypedefName,
    Rune::Eof,
];

impl Rune {
    /// Whether tokens of this rune carry an interned value (their spelling
    /// for most, the referenced macro name for `Sentinel`).
    pub fn has_value(self) -> bool {
        matches!(
            self,
            Rune::CharConst
                | Rune::FloatConst
                | Rune::Identifier
                | Rune::IntConst
                | Rune::LongCharConst
                | Rune::LongStringLiteral
                | Rune::NonRepl
                | Rune::PpNumber
                | Rune::StringLiteral
                | Rune::TypedefName
        )
    }

    pub fn fixed_spelling(self) -> Option<&'static str> {
        Some(match self {
            Rune::PpPaste => "##",
            Rune::Ddd => "...",
            Rune::AddAssign => "+=",
            Rune::AndAnd => "&&",
            Rune::AndAssign => "&=",
            Rune::Arrow => "->",
            Rune::Dec => "--",
            Rune::DivAssign => "/=",
            Rune::Eq => "==",
            Rune::Geq => ">=",
            Rune::Inc => "++",
            Rune::Leq => "<=",
            Rune::Lsh => "<<",
            Rune::LshAssign => "<<=",
            Rune::ModAssign => "%=",
            Rune::MulAssign => "*=",
            Rune::Neq => "!=",
            Rune::OrAssign => "|=",
            Rune::OrOr => "||",
            Rune::Rsh => ">>",
            Rune::RshAssign => ">>=",
            Rune::SubAssign => "-=",
            Rune::XorAssign => "^=",
            Rune::Directive => "#",
            _ => return None,
        })
    }

    pub fn code(self) -> u32 {
        match self {
            Rune::Char(c) => c as u32,
            tag => {
                let index = TAGS
                    .iter()
                    .position(|candidate| *candidate == tag)
                    .expect("every compound tag is listed");
                TAG_BASE + index as u32
            }
        }
    }

    pub fn from_code(code: u32) -> Option<Rune> {
        if code < TAG_BASE {
            char::from_u32(code).map(Rune::Char)
        } else {
            TAGS.get((code - TAG_BASE) as usize).copied()
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub rune: Rune,
    pub pos: Pos,
    pub val: Option<Name>,
}

impl Token {
    pub fn new(rune: Rune, pos: Pos) -> Self {
        Self {
            rune,
            pos,
            val: None,
        }
    }

    pub fn with_value(rune: Rune, pos: Pos, val: Name) -> Self {
        Self {
            rune,
            pos,
            val: Some(val),
        }
    }

    pub const EOF: Token = Token {
        rune: Rune::Eof,
        pos: Pos::NONE,
        val: None,
    };

    pub fn is_space(&self) -> bool {
        self.rune == Rune::Char(' ')
    }

    pub fn is_newline(&self) -> bool {
        self.rune == Rune::Char('\n')
    }

    /// Source form of the token. Pasted tokens carry their combined
    /// spelling as a value, which wins over the single-character rune.
    pub fn spelling<'i>(&self, interner: &'i Interner) -> Cow<'i, str> {
        if let Some(fixed) = self.rune.fixed_spelling() {
            return Cow::Borrowed(fixed);
        }

        if let Some(val) = self.val.filter(|_| self.rune != Rune::Sentinel) {
            return Cow::Borrowed(interner.resolve_str(val));
        }

        match self.rune {
            Rune::Char(c) => Cow::Owned(c.to_string()),
            _ => Cow::Borrowed(""),
        }
    }
}

pub fn trim_space(tokens: &[Token]) -> &[Token] {
    let start = tokens.iter().take_while(|t| t.is_space()).count();
    let end = tokens.len() - tokens[start..].iter().rev().take_while(|t| t.is_space()).count();
    &tokens[start..end]
}

pub fn trim_all_space(tokens: &[Token]) -> Vec<Token> {
    tokens.iter().filter(|t| !t.is_space()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rune_codes_round_trip() {
        for tag in TAGS {
            assert_eq!(Rune::from_code(tag.code()), Some(*tag));
        }
        for c in ['\0', ' ', '#', 'ß', '\u{10FFFF}'] {
            assert_eq!(Rune::from_code(Rune::Char(c).code()), Some(Rune::Char(c)));
        }
    }

    #[test]
    fn trim_space_trims_both_ends_only() {
        let sp = Token::new(Rune::Char(' '), Pos(1));
        let id = Token::new(Rune::Identifier, Pos(2));
        let toks = [sp, id, sp, id, sp, sp];
        assert_eq!(trim_space(&toks), &toks[1..4]);
        assert!(trim_space(&[sp, sp]).is_empty());
    }
}
