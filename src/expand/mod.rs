mod directive;
mod expr;
mod subst;
mod value;

pub use directive::{CondLevel, CondStack};
pub use expr::{ConstExpr, ExprParser};
pub use value::{parse_int_const, IntTy, Value};

use crate::diagnostics::Diagnostics;
use crate::error::{ErrorKind, PreprocessorError};
use crate::interner::{Interner, Name};
use crate::lexer::Lexer;
use crate::macros::Macro;
use crate::source::{Source, SourceCache};
use crate::source_map::{Pos, SourceMap};
use crate::stream::{EncodedReader, TokenBuffer, TokenReader, TokenWriter};
use crate::token::{trim_space, Rune, Token};
use crate::Options;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::rc::Rc;

// gcc allows 200 nested includes; the standard asks for 15.
const MAX_INCLUDE_LEVEL: u32 = 200;

// Interned spellings the directive processor keeps comparing against.
#[derive(Debug)]
struct WellKnown {
    define: Name,
    defined: Name,
    elif: Name,
    else_: Name,
    endif: Name,
    error: Name,
    if_: Name,
    ifdef: Name,
    ifndef: Name,
    include: Name,
    one: Name,
    pragma: Name,
    undef: Name,
    va_args: Name,
    warning: Name,
    zero: Name,
}

impl WellKnown {
    fn new(interner: &mut Interner) -> Self {
        Self {
            define: interner.intern_str("define"),
            defined: interner.intern_str("defined"),
            elif: interner.intern_str("elif"),
            else_: interner.intern_str("else"),
            endif: interner.intern_str("endif"),
            error: interner.intern_str("error"),
            if_: interner.intern_str("if"),
            ifdef: interner.intern_str("ifdef"),
            ifndef: interner.intern_str("ifndef"),
            include: interner.intern_str("include"),
            one: interner.intern_str("1"),
            pragma: interner.intern_str("pragma"),
            undef: interner.intern_str("undef"),
            va_args: interner.intern_str("__VA_ARGS__"),
            warning: interner.intern_str("warning"),
            zero: interner.intern_str("0"),
        }
    }
}

/*
   The macro expander of Prosser's algorithm as described by Spinellis
   (https://www.spinellis.gr/blog/20060626/cpp.algo.pdf), with the per-token
   hide sets folded into one counter table: entering a macro increments its
   counter and pushes a SENTINEL token behind the replacement list, and
   consuming the sentinel decrements it again. A macro whose counter is
   positive does not re-expand.
*/
pub struct Preprocessor {
    pub options: Options,
    pub include_paths: Vec<PathBuf>,
    pub sys_include_paths: Vec<PathBuf>,
    interner: Interner,
    source_map: SourceMap,
    diagnostics: Diagnostics,
    macros: HashMap<Name, Macro>,
    hide_set: HashMap<Name, u32>,
    include_level: u32,
    include_cache: Rc<SourceCache>,
    names: WellKnown,
}

impl Preprocessor {
    pub fn new(options: Options) -> Self {
        let mut interner = Interner::new();
        let names = WellKnown::new(&mut interner);

        Self {
            options,
            include_paths: Vec::new(),
            sys_include_paths: Vec::new(),
            interner,
            source_map: SourceMap::new(),
            diagnostics: Diagnostics::new(),
            macros: HashMap::new(),
            hide_set: HashMap::new(),
            include_level: 0,
            include_cache: SourceCache::new(),
            names,
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn include_cache(&self) -> Rc<SourceCache> {
        Rc::clone(&self.include_cache)
    }

    pub fn is_defined(&mut self, name: &str) -> bool {
        let name = self.interner.intern_str(name);
        self.macros.contains_key(&name)
    }

    /// Every hide-set counter must be back to zero once a stream has been
    /// fully expanded.
    pub fn hide_set_is_clear(&self) -> bool {
        self.hide_set.values().all(|&counter| counter == 0)
    }

    /// Tokenises the given sources into cached encoded chunk lists and
    /// returns a reader over their concatenation. Sources that were
    /// tokenised before are replayed from their cache.
    pub fn parse(
        &mut self,
        sources: Vec<Box<dyn Source>>,
    ) -> Result<EncodedReader, PreprocessorError> {
        let mut files = Vec::new();

        for source in sources {
            if let Some(cached) = source.cached() {
                files.push((*cached).clone());
                continue;
            }

            let io_error = |error: std::io::Error, source: &dyn Source| {
                ErrorKind::Io(format!("{}: {}", source.name().display(), error)).at(Pos::NONE)
            };

            let size = source.size().map_err(|e| io_error(e, &*source))?;
            if size > u64::from(u32::MAX) {
                return Err(io_error(
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "file too big"),
                    &*source,
                ));
            }

            let mut contents = String::with_capacity(size as usize);
            source
                .open()
                .and_then(|mut reader| reader.read_to_string(&mut contents))
                .map_err(|e| io_error(e, &*source))?;

            let base = self
                .source_map
                .add(source.name().to_path_buf(), &contents)
                .base();

            let lexer = Lexer::new(
                &contents,
                base,
                self.options.enable_trigraphs,
                &mut self.interner,
                &self.diagnostics,
            );
            let chunks = lexer.tokenize_lines(self.options.inject_final_newline);

            source.cache(Rc::new(chunks.clone()));
            files.push(chunks);
        }

        Ok(EncodedReader::new(files))
    }

    /// Runs the expander over a parsed token stream, writing the fully
    /// preprocessed tokens to `writer`.
    pub fn preprocess(
        &mut self,
        reader: &mut dyn TokenReader,
        writer: &mut dyn TokenWriter,
    ) -> Result<(), PreprocessorError> {
        let cond = self.expand(reader, writer, CondStack::new())?;
        if !cond.balanced() {
            self.diagnostics
                .error(Pos::NONE, ErrorKind::UnbalancedConditional);
        }
        Ok(())
    }

    fn hidden(&self, name: Name) -> bool {
        self.hide_set.get(&name).copied().unwrap_or(0) != 0
    }

    fn enter_macro(&mut self, name: Name) {
        *self.hide_set.entry(name).or_default() += 1;
    }

    pub(super) fn expand(
        &mut self,
        r: &mut dyn TokenReader,
        w: &mut dyn TokenWriter,
        mut cond: CondStack,
    ) -> Result<CondStack, PreprocessorError> {
        loop {
            let mut t = r.read(&self.interner);
            match t.rune {
                Rune::Eof => return Ok(cond),
                Rune::Directive => {
                    cond = self.directive(r, w, cond)?;
                    t.rune = Rune::Char('\n');
                    t.val = None;
                    w.write(t);
                }
                Rune::Identifier => {
                    if !cond.on() {
                        continue;
                    }

                    let Some(name) = t.val else {
                        return Err(ErrorKind::Internal("identifier without a name").at(t.pos));
                    };

                    if self.hidden(name) {
                        w.write(t);
                        continue;
                    }

                    match self.macros.get(&name).cloned() {
                        None => w.write(t),
                        Some(m) if !m.fn_like => {
                            let mut sentinel = t;
                            sentinel.rune = Rune::Sentinel;
                            r.unget(sentinel);

                            let replacement = self.subst(&m, &[])?;
                            self.enter_macro(name);
                            let replacement = self.sanitize(replacement);
                            r.ungets(&replacement);
                        }
                        Some(m) => self.expand_fn_macro(t, name, &m, r, w)?,
                    }
                }
                Rune::Sentinel => {
                    let Some(name) = t.val else {
                        return Err(ErrorKind::Internal("sentinel without a name").at(t.pos));
                    };
                    let counter = self.hide_set.entry(name).or_default();
                    if *counter == 0 {
                        return Err(ErrorKind::Internal("hide-set counter underflow").at(t.pos));
                    }
                    *counter -= 1;
                }
                _ => {
                    if cond.on() {
                        w.write(t);
                    }
                }
            }
        }
    }

    // An invocation only happens when a '(' follows the name, with any
    // whitespace, newlines, and sentinels in between. Skipped sentinels and
    // newlines are replayed after the expansion; skipped spaces are not.
    fn expand_fn_macro(
        &mut self,
        t: Token,
        name: Name,
        m: &Macro,
        r: &mut dyn TokenReader,
        w: &mut dyn TokenWriter,
    ) -> Result<(), PreprocessorError> {
        let mut skipped: Vec<Token> = Vec::new();

        loop {
            let t2 = r.read(&self.interner);
            match t2.rune {
                Rune::Sentinel | Rune::Char('\n') => skipped.push(t2),
                Rune::Char(' ') => (),
                Rune::Char('(') => {
                    let actuals = self.actuals(m, r)?;

                    let mut sentinel = t;
                    sentinel.rune = Rune::Sentinel;

                    let mut replacement = self.subst(m, &actuals)?;
                    replacement.push(sentinel);
                    replacement.extend_from_slice(&skipped);

                    self.enter_macro(name);
                    let replacement = self.sanitize(replacement);
                    r.ungets(&replacement);
                    return Ok(());
                }
                Rune::Eof => {
                    r.ungets(&skipped);
                    w.write(t);
                    return Ok(());
                }
                _ => {
                    // Not an invocation; restore the look-ahead and emit
                    // the bare name.
                    r.unget(t2);
                    r.ungets(&skipped);
                    w.write(t);
                    return Ok(());
                }
            }
        }
    }

    // Collects the actuals of a function-like macro invocation, '(' already
    // consumed. Parentheses nest; commas at depth zero separate; newlines
    // become spaces; each actual is trimmed. Short calls pad with empty
    // actuals.
    fn actuals(
        &mut self,
        m: &Macro,
        r: &mut dyn TokenReader,
    ) -> Result<Vec<Vec<Token>>, PreprocessorError> {
        let mut out: Vec<Vec<Token>> = Vec::new();
        let mut level = 0usize;
        let mut n = 0usize;

        let finish = |out: &mut Vec<Vec<Token>>| {
            for actual in out.iter_mut() {
                *actual = trim_space(actual).to_vec();
            }
            while out.len() < m.params.len() {
                out.push(Vec::new());
            }
        };

        loop {
            let mut t = r.read(&self.interner);
            match t.rune {
                Rune::Eof => {
                    self.diagnostics.error(t.pos, ErrorKind::UnexpectedEof);
                    finish(&mut out);
                    return Ok(out);
                }
                Rune::Char(',') if level == 0 => {
                    n += 1;
                    continue;
                }
                Rune::Char(')') => {
                    if level == 0 {
                        finish(&mut out);
                        return Ok(out);
                    }
                    level -= 1;
                }
                Rune::Char('(') => level += 1,
                _ => (),
            }

            while out.len() <= n {
                out.push(Vec::new());
            }
            if t.rune == Rune::Char('\n') {
                t.rune = Rune::Char(' ');
            }
            out[n].push(t);
        }
    }

    /// Fully expands a detached token sequence with a fresh reader, writer,
    /// and condition stack; used for actuals, `#include` operands, and
    /// `#if` expressions.
    pub(super) fn expands(&mut self, tokens: Vec<Token>) -> Result<Vec<Token>, PreprocessorError> {
        let mut reader = TokenBuffer::from_tokens(tokens);
        let mut writer = TokenBuffer::new();
        self.expand(&mut reader, &mut writer, CondStack::new())?;
        Ok(writer.into_tokens())
    }

    // Identifiers that are hidden right now must never re-expand, even
    // after their sentinel has been consumed; freeze them.
    fn sanitize(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for token in &mut tokens {
            if token.rune == Rune::Identifier
                && token.val.map_or(false, |name| self.hidden(name))
            {
                token.rune = Rune::NonRepl;
            }
        }
        tokens
    }
}
