use super::Preprocessor;
use crate::error::{ErrorKind, PreprocessorError};
use crate::macros::Macro;
use crate::source_map::Pos;
use crate::token::{trim_space, Rune, Token};

/*
   subst / glue / stringize of the hide-set algorithm. The replacement list
   is walked once; a single space token between '#'/'##' and their operand
   is tolerated everywhere.
*/

impl Preprocessor {
    pub(super) fn subst(
        &mut self,
        m: &Macro,
        actuals: &[Vec<Token>],
    ) -> Result<Vec<Token>, PreprocessorError> {
        let repl = &m.repl;
        let mut out: Vec<Token> = Vec::new();
        let mut i = 0;

        // Index of the operand after tolerating one space.
        let operand = |i: usize| {
            if repl.get(i + 1).map_or(false, Token::is_space) {
                i + 2
            } else {
                i + 1
            }
        };

        let va_args = self.names.va_args;
        let formal = |token: Option<&Token>| -> Option<Vec<Token>> {
            let token = token?;
            if token.rune != Rune::Identifier {
                return None;
            }
            m.param(actuals, token.val?, va_args)
        };

        while i < repl.len() {
            let t = repl[i];

            // '# X' with X a formal stringizes the actual.
            if t.rune == Rune::Char('#') {
                let j = operand(i);
                if let Some(arg) = formal(repl.get(j)) {
                    let literal = self.stringize(&arg);
                    out.push(literal);
                    i = j + 1;
                    continue;
                }
            }

            if t.rune == Rune::PpPaste {
                let j = operand(i);
                if let Some(arg) = formal(repl.get(j)) {
                    if arg.is_empty() {
                        // '## X' with an empty actual vanishes.
                        i = j + 1;
                        continue;
                    }
                    self.glue(&mut out, &arg, t.pos);
                    i = j + 1;
                    continue;
                }
                if let Some(next) = repl.get(j).copied() {
                    self.glue(&mut out, &[next], t.pos);
                    i = j + 1;
                    continue;
                }
                // A trailing '##' is kept literally.
            }

            if t.rune == Rune::Identifier {
                if let Some(arg) = formal(Some(&t)) {
                    let j = operand(i);
                    if repl.get(j).map(|t| t.rune) == Some(Rune::PpPaste) {
                        if arg.is_empty() {
                            // 'X ##' with X empty drops the pair; what
                            // follows the '##' is handled normally.
                            i = j + 1;
                            continue;
                        }
                        // The actual joins unexpanded; leave '##' for the
                        // next round to glue with whatever follows.
                        out.extend_from_slice(&arg);
                        i = j;
                        continue;
                    }

                    let expanded = self.expands(arg)?;
                    out.extend_from_slice(&expanded);
                    i += 1;
                    continue;
                }
            }

            out.push(t);
            i += 1;
        }

        Ok(trim_space(&out).to_vec())
    }

    // Pastes the last token of `out` with the first of `rs`, interning the
    // combined spelling; the result keeps the left token's position.
    pub(super) fn glue(&mut self, out: &mut Vec<Token>, rs: &[Token], at: Pos) {
        while out.last().map_or(false, Token::is_space) {
            out.pop();
        }

        let rs = {
            let mut rs = rs;
            while rs.first().map_or(false, Token::is_space) {
                rs = &rs[1..];
            }
            rs
        };

        if rs.is_empty() {
            self.diagnostics.error(at, ErrorKind::EmptyTokenPaste);
            return;
        }

        let Some(mut left) = out.pop() else {
            out.extend_from_slice(rs);
            return;
        };
        let right = rs[0];

        if left.rune == Rune::Char('#') && right.rune == Rune::Char('#') {
            left.rune = Rune::PpPaste;
            left.val = None;
        } else {
            let spelling = format!(
                "{}{}",
                left.spelling(&self.interner),
                right.spelling(&self.interner)
            );
            left.val = Some(self.interner.intern_str(&spelling));
        }

        out.push(left);
        out.extend_from_slice(&rs[1..]);
    }

    /// One string literal from the concatenated spellings of the argument
    /// tokens, embedded literals re-escaped; positioned at the first
    /// argument token.
    pub(super) fn stringize(&mut self, arg: &[Token]) -> Token {
        let mut text = String::from("\"");

        for token in arg {
            let spelling = token.spelling(&self.interner);
            match token.rune {
                Rune::CharConst
                | Rune::LongCharConst
                | Rune::StringLiteral
                | Rune::LongStringLiteral => text.push_str(&escape(&spelling)),
                _ => text.push_str(&spelling),
            }
        }

        text.push('"');
        let val = self.interner.intern_str(&text);
        let pos = arg.first().map(|t| t.pos).unwrap_or(Pos::NONE);
        Token::with_value(Rune::StringLiteral, pos, val)
    }
}

fn escape(content: &str) -> String {
    let mut result = String::with_capacity(content.len() + 16);

    for c in content.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\u{07}' => result.push_str("\\a"),
            '\u{08}' => result.push_str("\\b"),
            '\u{0C}' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\u{0B}' => result.push_str("\\v"),
            c => result.push(c),
        }
    }

    result
}
