use crate::look_ahead::LookAhead;
use crate::source_map::Pos;

/*
   Translates raw file contents into the rune stream the lexer consumes:

   1. CRLF (and lone CR) fold to LF, keeping the starting position.
   2. With trigraphs enabled, the nine ??X sequences fold to their
      replacement character at the position of the first '?'.
   3. A backslash (literal or trigraph-produced) directly before LF is
      deleted together with the LF; following runes keep their original
      positions, so the splice never shifts anything.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ch {
    pub c: char,
    pub pos: Pos,
}

pub struct PrePass<'a> {
    chars: LookAhead<std::str::CharIndices<'a>>,
    base: u32,
    len: u32,
    trigraphs: bool,
}

impl<'a> PrePass<'a> {
    pub fn new(content: &'a str, base: u32, trigraphs: bool) -> Self {
        Self {
            chars: LookAhead::new(content.char_indices()),
            base,
            len: content.len() as u32,
            trigraphs,
        }
    }

    pub fn eof_pos(&self) -> Pos {
        Pos(self.base + self.len)
    }

    fn fold_trigraph(&mut self) -> Option<char> {
        if self.chars.peek().map(|&(_, c)| c) != Some('?') {
            return None;
        }

        let folded = match self.chars.peek_nth(1).map(|&(_, c)| c) {
            Some('=') => '#',
            Some('(') => '[',
            Some(')') => ']',
            Some('<') => '{',
            Some('>') => '}',
            Some('/') => '\\',
            Some('\'') => '^',
            Some('!') => '|',
            Some('-') => '~',
            _ => return None,
        };

        self.chars.next();
        self.chars.next();
        Some(folded)
    }

    // True when the upcoming physical characters are a line ending, which
    // is then consumed.
    fn eat_newline(&mut self) -> bool {
        match self.chars.peek().map(|&(_, c)| c) {
            Some('\n') => {
                self.chars.next();
                true
            }
            Some('\r') => {
                self.chars.next();
                self.chars.next_if(|&(_, c)| c == '\n');
                true
            }
            _ => false,
        }
    }
}

impl Iterator for PrePass<'_> {
    type Item = Ch;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (offset, mut c) = self.chars.next()?;
            let pos = Pos(self.base + offset as u32);

            if c == '\r' {
                self.chars.next_if(|&(_, next)| next == '\n');
                c = '\n';
            } else if c == '?' && self.trigraphs {
                if let Some(folded) = self.fold_trigraph() {
                    c = folded;
                }
            }

            if c == '\\' && self.eat_newline() {
                continue;
            }

            return Some(Ch { c, pos });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runes(src: &str, trigraphs: bool) -> Vec<(char, u32)> {
        PrePass::new(src, 1, trigraphs)
            .map(|ch| (ch.c, ch.pos.0))
            .collect()
    }

    #[test]
    fn trigraphs_off_pass_question_marks_through() {
        assert_eq!(
            runes("0??/1\n", false),
            [('0', 1), ('?', 2), ('?', 3), ('/', 4), ('1', 5), ('\n', 6)]
        );
        assert_eq!(runes("??=", false), [('?', 1), ('?', 2), ('=', 3)]);
    }

    #[test]
    fn trigraphs_collapse_to_first_position() {
        assert_eq!(runes("0??/1\n", true), [('0', 1), ('\\', 2), ('1', 5), ('\n', 6)]);
        assert_eq!(runes("??=??=", true), [('#', 1), ('#', 4)]);
        assert_eq!(runes("???!", true), [('?', 1), ('|', 2)]);
        assert_eq!(runes("????!0", true), [('?', 1), ('?', 2), ('|', 3), ('0', 6)]);
    }

    #[test]
    fn trigraph_backslash_splices() {
        let stream = PrePass::new("0??/\n", 1, true);
        assert_eq!(stream.eof_pos(), Pos(6));
        assert_eq!(runes("0??/\n", true), [('0', 1)]);
        assert_eq!(runes("0??/\n2", true), [('0', 1), ('2', 6)]);
        assert_eq!(runes("???/\n2", true), [('?', 1), ('2', 6)]);
    }

    #[test]
    fn literal_backslash_splices() {
        assert_eq!(runes("0\\\n2", false), [('0', 1), ('2', 4)]);
        assert_eq!(runes("\\\r\n2", false), [('2', 4)]);
        assert_eq!(
            runes("0\\1\n", false),
            [('0', 1), ('\\', 2), ('1', 3), ('\n', 4)]
        );
    }

    #[test]
    fn carriage_returns_fold_to_newline() {
        assert_eq!(runes("\r0", false), [('\n', 1), ('0', 2)]);
        assert_eq!(runes("a\r\nb", false), [('a', 1), ('\n', 2), ('b', 4)]);
    }

    #[test]
    fn nul_bytes_survive() {
        assert_eq!(runes("0\x001", false), [('0', 1), ('\0', 2), ('1', 3)]);
    }
}
