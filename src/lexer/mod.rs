mod number;

pub use number::{split_integer_suffix, Longness};

use crate::char_class::{is_identifier_continue, is_identifier_start};
use crate::diagnostics::Diagnostics;
use crate::encoding::encode_line;
use crate::error::ErrorKind;
use crate::interner::{Interner, Name};
use crate::look_ahead::LookAhead;
use crate::prepass::{Ch, PrePass};
use crate::source_map::Pos;
use crate::token::{trim_space, Rune, Token};

/*
   Scanner over the pre-passed rune stream. Emits one token per call to
   `scan`: whitespace runs and comments fold to a single ' ' token, '\n' is
   its own token, digraphs collapse to the position of their first rune, and
   keyword recognition is left entirely to downstream consumers.
*/
pub struct Lexer<'a> {
    runes: LookAhead<PrePass<'a>>,
    eof_pos: Pos,
    interner: &'a mut Interner,
    diagnostics: &'a Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(
        content: &'a str,
        base: u32,
        enable_trigraphs: bool,
        interner: &'a mut Interner,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        let prepass = PrePass::new(content, base, enable_trigraphs);
        let eof_pos = prepass.eof_pos();

        Self {
            runes: LookAhead::new(prepass),
            eof_pos,
            interner,
            diagnostics,
        }
    }

    fn peek_char(&mut self, index: usize) -> Option<char> {
        self.runes.peek_nth(index).map(|ch| ch.c)
    }

    fn bump(&mut self) -> Ch {
        self.runes.next().expect("bump follows a successful peek")
    }

    fn eat(&mut self, expected: char) -> bool {
        self.runes.next_if(|ch| ch.c == expected).is_some()
    }

    pub fn scan(&mut self) -> Token {
        let Some(first) = self.runes.next() else {
            return Token::new(Rune::Eof, self.eof_pos);
        };
        let pos = first.pos;

        match first.c {
            ' ' | '\t' | '\u{0B}' | '\u{0C}' => {
                while matches!(self.peek_char(0), Some(' ' | '\t' | '\u{0B}' | '\u{0C}')) {
                    self.bump();
                }
                Token::new(Rune::Char(' '), pos)
            }
            '\n' => Token::new(Rune::Char('\n'), pos),
            '/' if self.peek_char(0) == Some('/') => {
                while !matches!(self.peek_char(0), None | Some('\n')) {
                    self.bump();
                }
                Token::new(Rune::Char(' '), pos)
            }
            '/' if self.peek_char(0) == Some('*') => {
                self.bump();
                loop {
                    match self.runes.next() {
                        None => {
                            self.diagnostics.error(pos, ErrorKind::UnterminatedComment);
                            break;
                        }
                        Some(ch) if ch.c == '*' && self.eat('/') => break,
                        Some(_) => (),
                    }
                }
                Token::new(Rune::Char(' '), pos)
            }
            'L' if self.peek_char(0) == Some('\'') => {
                self.bump();
                self.literal(pos, "L'", '\'', Rune::LongCharConst)
            }
            'L' if self.peek_char(0) == Some('"') => {
                self.bump();
                self.literal(pos, "L\"", '"', Rune::LongStringLiteral)
            }
            '\'' => self.literal(pos, "'", '\'', Rune::CharConst),
            '"' => self.literal(pos, "\"", '"', Rune::StringLiteral),
            c if is_identifier_start(c) => self.identifier(pos, String::from(c)),
            // '\uXXXX' may open an identifier.
            '\\' if matches!(self.peek_char(0), Some('u' | 'U')) => {
                let mut spelling = String::new();
                if self.ucn_escape(pos, &mut spelling) {
                    self.identifier(pos, spelling)
                } else {
                    Token::new(Rune::Char('\\'), pos)
                }
            }
            c if c.is_ascii_digit() => self.pp_number(pos, String::from(c)),
            '.' if self.peek_char(0).map_or(false, |c| c.is_ascii_digit()) => {
                self.pp_number(pos, String::from('.'))
            }
            '.' if self.peek_char(0) == Some('.') && self.peek_char(1) == Some('.') => {
                self.bump();
                self.bump();
                Token::new(Rune::Ddd, pos)
            }
            '%' => {
                if self.eat(':') {
                    if self.peek_char(0) == Some('%') && self.peek_char(1) == Some(':') {
                        self.bump();
                        self.bump();
                        Token::new(Rune::PpPaste, pos)
                    } else {
                        Token::new(Rune::Char('#'), pos)
                    }
                } else if self.eat('=') {
                    Token::new(Rune::ModAssign, pos)
                } else if self.eat('>') {
                    Token::new(Rune::Char('}'), pos)
                } else {
                    Token::new(Rune::Char('%'), pos)
                }
            }
            ':' if self.eat('>') => Token::new(Rune::Char(']'), pos),
            '<' => match self.peek_char(0) {
                Some(':') => {
                    self.bump();
                    Token::new(Rune::Char('['), pos)
                }
                Some('%') => {
                    self.bump();
                    Token::new(Rune::Char('{'), pos)
                }
                Some('<') => {
                    self.bump();
                    if self.eat('=') {
                        Token::new(Rune::LshAssign, pos)
                    } else {
                        Token::new(Rune::Lsh, pos)
                    }
                }
                Some('=') => {
                    self.bump();
                    Token::new(Rune::Leq, pos)
                }
                _ => Token::new(Rune::Char('<'), pos),
            },
            '>' => match self.peek_char(0) {
                Some('>') => {
                    self.bump();
                    if self.eat('=') {
                        Token::new(Rune::RshAssign, pos)
                    } else {
                        Token::new(Rune::Rsh, pos)
                    }
                }
                Some('=') => {
                    self.bump();
                    Token::new(Rune::Geq, pos)
                }
                _ => Token::new(Rune::Char('>'), pos),
            },
            '=' if self.eat('=') => Token::new(Rune::Eq, pos),
            '!' if self.eat('=') => Token::new(Rune::Neq, pos),
            '+' if self.eat('+') => Token::new(Rune::Inc, pos),
            '+' if self.eat('=') => Token::new(Rune::AddAssign, pos),
            '-' if self.eat('-') => Token::new(Rune::Dec, pos),
            '-' if self.eat('>') => Token::new(Rune::Arrow, pos),
            '-' if self.eat('=') => Token::new(Rune::SubAssign, pos),
            '&' if self.eat('&') => Token::new(Rune::AndAnd, pos),
            '&' if self.eat('=') => Token::new(Rune::AndAssign, pos),
            '|' if self.eat('|') => Token::new(Rune::OrOr, pos),
            '|' if self.eat('=') => Token::new(Rune::OrAssign, pos),
            '^' if self.eat('=') => Token::new(Rune::XorAssign, pos),
            '*' if self.eat('=') => Token::new(Rune::MulAssign, pos),
            '/' if self.eat('=') => Token::new(Rune::DivAssign, pos),
            '#' if self.eat('#') => Token::new(Rune::PpPaste, pos),
            c => Token::new(Rune::Char(c), pos),
        }
    }

    fn identifier(&mut self, pos: Pos, mut spelling: String) -> Token {
        loop {
            match self.peek_char(0) {
                Some(c) if is_identifier_continue(c) => {
                    spelling.push(c);
                    self.bump();
                }
                Some('\\') if matches!(self.peek_char(1), Some('u' | 'U')) => {
                    let backslash = self.bump();
                    if !self.ucn_escape(backslash.pos, &mut spelling) {
                        break;
                    }
                }
                _ => break,
            }
        }

        Token::with_value(Rune::Identifier, pos, self.interner.intern_str(&spelling))
    }

    // Consumes the `uXXXX` or `UXXXXXXXX` tail of a universal character
    // name, the backslash already eaten, and appends the escape verbatim to
    // the spelling. Malformed escapes report at `pos` and leave the input
    // after whatever hex digits were present.
    fn ucn_escape(&mut self, pos: Pos, spelling: &mut String) -> bool {
        let marker = self.bump().c;
        let want = if marker == 'u' { 4 } else { 8 };

        let mut hex = String::with_capacity(want);
        for _ in 0..want {
            match self.peek_char(0) {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.bump();
                }
                _ => break,
            }
        }

        let code = u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == want);
        if code.and_then(char::from_u32).is_none() {
            self.diagnostics
                .error(pos, ErrorKind::InvalidUniversalCharacterName);
            return false;
        }

        spelling.push('\\');
        spelling.push(marker);
        spelling.push_str(&hex);
        true
    }

    fn pp_number(&mut self, pos: Pos, mut spelling: String) -> Token {
        loop {
            match self.peek_char(0) {
                Some(c @ ('e' | 'E' | 'p' | 'P'))
                    if matches!(self.peek_char(1), Some('+' | '-')) =>
                {
                    spelling.push(c);
                    self.bump();
                    spelling.push(self.bump().c);
                }
                Some(c) if is_identifier_continue(c) || c == '.' => {
                    spelling.push(c);
                    self.bump();
                }
                _ => break,
            }
        }

        let rune = number::classify(&spelling);
        Token::with_value(rune, pos, self.interner.intern_str(&spelling))
    }

    // Character constants and string literals are captured as opaque runs,
    // quotes and escapes included; they never span a logical line.
    fn literal(&mut self, pos: Pos, prefix: &str, quote: char, rune: Rune) -> Token {
        let mut spelling = String::from(prefix);

        loop {
            match self.peek_char(0) {
                None | Some('\n') => {
                    self.diagnostics.error(
                        pos,
                        if quote == '"' {
                            ErrorKind::UnterminatedStringLiteral
                        } else {
                            ErrorKind::UnterminatedCharacterConstant
                        },
                    );
                    break;
                }
                Some('\\') => {
                    spelling.push('\\');
                    self.bump();
                    if !matches!(self.peek_char(0), None | Some('\n')) {
                        spelling.push(self.bump().c);
                    }
                }
                Some(c) => {
                    spelling.push(c);
                    self.bump();
                    if c == quote {
                        break;
                    }
                }
            }
        }

        Token::with_value(rune, pos, self.interner.intern_str(&spelling))
    }

    /// Drains the whole file into trimmed per-line encoded chunks, the form
    /// cached on the source and replayed by `EncodedReader`.
    pub fn tokenize_lines(mut self, inject_final_newline: bool) -> Vec<Name> {
        let mut chunks = Vec::new();
        let mut line: Vec<Token> = Vec::new();

        loop {
            let token = self.scan();
            match token.rune {
                Rune::Eof => {
                    if !line.is_empty() {
                        if !inject_final_newline {
                            self.diagnostics
                                .error(token.pos, ErrorKind::MissingFinalNewline);
                        }
                        let trimmed = trim_space(&line);
                        if !trimmed.is_empty() {
                            chunks.push(encode_line(trimmed, self.interner));
                        }
                    }
                    return chunks;
                }
                Rune::Char('\n') => {
                    let mut tokens = trim_space(&line).to_vec();
                    tokens.push(token);
                    chunks.push(encode_line(&tokens, self.interner));
                    line.clear();
                }
                _ => {
                    // Adjacent whitespace and comments fold into one space.
                    if !(token.is_space() && line.last().map_or(false, Token::is_space)) {
                        line.push(token);
                    }
                }
            }
        }
    }
}
