use crate::interner::Name;
use crate::source_map::Pos;
use crate::token::{Rune, Token};
use itertools::Itertools;

/// A `#define`d macro. `def` is the name token from the definition line,
/// kept for diagnostics; `params` are the formal parameter name IDs in
/// declaration order.
#[derive(Clone, Debug)]
pub struct Macro {
    pub def: Token,
    pub params: Vec<Name>,
    pub repl: Vec<Token>,
    pub fn_like: bool,
    pub variadic: bool,
}

impl Macro {
    pub fn new(def: Token, repl: Vec<Token>) -> Self {
        Self {
            def,
            params: Vec::new(),
            repl,
            fn_like: false,
            variadic: false,
        }
    }

    /// Looks `name` up among the formals, yielding the corresponding
    /// actual. `__VA_ARGS__` of a variadic macro collects the surplus
    /// actuals re-joined with `, `.
    pub fn param(&self, actuals: &[Vec<Token>], name: Name, va_args: Name) -> Option<Vec<Token>> {
        if name == va_args {
            if !self.variadic {
                return None;
            }

            let mut out = Vec::new();
            if self.params.len() < actuals.len() {
                for (index, actual) in actuals[self.params.len()..].iter().enumerate() {
                    if index != 0 {
                        let pos = out
                            .last()
                            .map(|t: &Token| t.pos)
                            .or_else(|| actual.first().map(|t| t.pos))
                            .unwrap_or(Pos::NONE);
                        out.push(Token::new(Rune::Char(','), pos));
                        out.push(Token::new(Rune::Char(' '), pos));
                    }
                    out.extend_from_slice(actual);
                }
            }
            return Some(out);
        }

        self.params
            .iter()
            .find_position(|&&param| param == name)
            .map(|(index, _)| actuals.get(index).cloned().unwrap_or_default())
    }

    pub fn identical_to(&self, params: &[Name], repl: &[Token], variadic: bool) -> bool {
        self.params == params
            && self.variadic == variadic
            && self.repl.len() == repl.len()
            && self
                .repl
                .iter()
                .zip(repl)
                .all(|(a, b)| a.rune == b.rune && a.val == b.val)
    }
}
