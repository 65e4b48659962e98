use crate::ucn::{is_ucn_digit, is_ucn_non_digit};
use derive_more::IsVariant;

/// Partition of input runes driving the lexer's state decisions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum CharClass {
    Ascii(u8),
    UcnDigit,
    UcnNonDigit,
    Other,
    Eof,
}

pub fn classify(c: Option<char>) -> CharClass {
    match c {
        None => CharClass::Eof,
        Some(c) if (c as u32) < 128 => CharClass::Ascii(c as u8),
        Some(c) if is_ucn_digit(c) => CharClass::UcnDigit,
        Some(c) if is_ucn_non_digit(c) => CharClass::UcnNonDigit,
        Some(_) => CharClass::Other,
    }
}

pub fn is_identifier_start(c: char) -> bool {
    match classify(Some(c)) {
        CharClass::Ascii(b) => b == b'_' || b.is_ascii_alphabetic(),
        CharClass::UcnNonDigit => true,
        _ => false,
    }
}

pub fn is_identifier_continue(c: char) -> bool {
    match classify(Some(c)) {
        CharClass::Ascii(b) => b == b'_' || b.is_ascii_alphanumeric(),
        CharClass::UcnDigit | CharClass::UcnNonDigit => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_ucn_classes() {
        assert_eq!(classify(Some('a')), CharClass::Ascii(b'a'));
        assert_eq!(classify(None), CharClass::Eof);
        assert_eq!(classify(Some('\u{0660}')), CharClass::UcnDigit);
        assert_eq!(classify(Some('\u{00C0}')), CharClass::UcnNonDigit);
        assert_eq!(classify(Some('\u{FFFD}')), CharClass::Other);

        assert!(is_identifier_start('_'));
        assert!(!is_identifier_start('0'));
        assert!(is_identifier_continue('0'));
        assert!(is_identifier_continue('\u{00C0}'));
    }
}
