use crate::encoding::decode_token;
use crate::interner::{Interner, Name};
use crate::token::{Rune, Token};
use std::collections::VecDeque;

pub trait TokenReader {
    /// Next token, or an EOF token once the stream is exhausted. The
    /// interner is needed by readers that decode cached chunks lazily.
    fn read(&mut self, interner: &Interner) -> Token;

    fn unget(&mut self, token: Token);

    /// Pushes a sequence back so that it is read again front to back.
    fn ungets(&mut self, tokens: &[Token]);
}

pub trait TokenWriter {
    fn write(&mut self, token: Token);

    fn write_all(&mut self, tokens: &[Token]) {
        for token in tokens {
            self.write(*token);
        }
    }
}

// LIFO push-back stack shared by both readers. Ungot tokens bypass
// directive promotion and the look-back, since they were already read once.
#[derive(Debug, Default)]
struct UngetBuffer {
    stack: Vec<Token>,
}

impl UngetBuffer {
    fn read(&mut self) -> Option<Token> {
        self.stack.pop()
    }

    fn unget(&mut self, token: Token) {
        self.stack.push(token);
    }

    fn ungets(&mut self, tokens: &[Token]) {
        self.stack.extend(tokens.iter().rev().copied());
    }
}

// Rewrites '#' to DIRECTIVE when it opens a logical line.
fn promote_directive(token: &mut Token, last: Option<Rune>) {
    if token.rune == Rune::Char('#') && matches!(last, None | Some(Rune::Char('\n'))) {
        token.rune = Rune::Directive;
    }
}

/// Materialised token list; a writer, and a reader with unbounded unget.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    tokens: VecDeque<Token>,
    unget_buffer: UngetBuffer,
    last: Option<Rune>,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Remaining tokens, in read order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.unget_buffer.stack.iter().rev().chain(self.tokens.iter())
    }

    pub fn into_tokens(self) -> Vec<Token> {
        let mut out = self.unget_buffer.stack;
        out.reverse();
        out.extend(self.tokens);
        out
    }
}

impl TokenWriter for TokenBuffer {
    fn write(&mut self, token: Token) {
        self.tokens.push_back(token);
    }
}

impl TokenReader for TokenBuffer {
    fn read(&mut self, _interner: &Interner) -> Token {
        if let Some(token) = self.unget_buffer.read() {
            return token;
        }

        let Some(mut token) = self.tokens.pop_front() else {
            return Token::EOF;
        };

        promote_directive(&mut token, self.last);
        self.last = Some(token.rune);
        token
    }

    fn unget(&mut self, token: Token) {
        self.unget_buffer.unget(token);
    }

    fn ungets(&mut self, tokens: &[Token]) {
        self.unget_buffer.ungets(tokens);
    }
}

/// Reader over cached encoded files, decoding one token at a time. Each
/// element of `files` is one source's ordered chunk list.
#[derive(Debug, Default)]
pub struct EncodedReader {
    files: VecDeque<VecDeque<Name>>,
    chunk: Option<Name>,
    offset: usize,
    prev_pos: u32,
    unget_buffer: UngetBuffer,
    last: Option<Rune>,
}

impl EncodedReader {
    pub fn new(files: impl IntoIterator<Item = Vec<Name>>) -> Self {
        Self {
            files: files.into_iter().map(VecDeque::from).collect(),
            ..Self::default()
        }
    }

    fn next_chunk(&mut self) -> Option<Name> {
        loop {
            let file = self.files.front_mut()?;
            match file.pop_front() {
                Some(chunk) => {
                    self.offset = 0;
                    self.prev_pos = 0;
                    return Some(chunk);
                }
                None => {
                    self.files.pop_front();
                }
            }
        }
    }
}

impl TokenReader for EncodedReader {
    fn read(&mut self, interner: &Interner) -> Token {
        if let Some(token) = self.unget_buffer.read() {
            return token;
        }

        loop {
            let chunk = match self.chunk {
                Some(chunk) => chunk,
                None => match self.next_chunk() {
                    Some(chunk) => {
                        self.chunk = Some(chunk);
                        chunk
                    }
                    None => return Token::EOF,
                },
            };

            match decode_token(interner.resolve(chunk), &mut self.offset, &mut self.prev_pos) {
                Some(mut token) => {
                    promote_directive(&mut token, self.last);
                    self.last = Some(token.rune);
                    return token;
                }
                None => {
                    self.chunk = None;
                }
            }
        }
    }

    fn unget(&mut self, token: Token) {
        self.unget_buffer.unget(token);
    }

    fn ungets(&mut self, tokens: &[Token]) {
        self.unget_buffer.ungets(tokens);
    }
}
