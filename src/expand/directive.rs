use super::expr::ExprParser;
use super::{Preprocessor, MAX_INCLUDE_LEVEL};
use crate::error::{ErrorKind, PreprocessorError};
use crate::interner::Name;
use crate::macros::Macro;
use crate::source::FileSource;
use crate::stream::{TokenReader, TokenWriter};
use crate::token::{trim_all_space, trim_space, Rune, Token};
use derive_more::IsVariant;
use itertools::Itertools;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum CondLevel {
    /// Base sentinel; never produced by a directive, so popping onto it is
    /// how an unmatched #endif is caught.
    Zero,
    IfOn,
    IfOff,
    IfSkip,
}

#[derive(Clone, Debug)]
pub struct CondStack(Vec<CondLevel>);

impl CondStack {
    pub fn new() -> Self {
        Self(vec![CondLevel::Zero])
    }

    pub fn top(&self) -> CondLevel {
        *self.0.last().expect("condition stack is never empty")
    }

    pub fn on(&self) -> bool {
        matches!(self.top(), CondLevel::Zero | CondLevel::IfOn)
    }

    pub fn balanced(&self) -> bool {
        self.0.len() == 1 && self.top() == CondLevel::Zero
    }

    fn push(&mut self, level: CondLevel) {
        self.0.push(level);
    }

    fn pop(&mut self) {
        debug_assert!(self.0.len() > 1);
        self.0.pop();
    }

    fn swap(&mut self, level: CondLevel) {
        *self.0.last_mut().expect("condition stack is never empty") = level;
    }
}

impl Default for CondStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    // Reads the rest of the logical line, dispatches on the first
    // identifier, and returns the updated condition stack. The conditional
    // directives always participate; everything else is inert while the
    // guard is off.
    pub(super) fn directive(
        &mut self,
        r: &mut dyn TokenReader,
        w: &mut dyn TokenWriter,
        mut cond: CondStack,
    ) -> Result<CondStack, PreprocessorError> {
        let line = self.read_line(r);
        let Some(&first) = line.first() else {
            // Null directive.
            return Ok(cond);
        };

        let name = match first.rune {
            Rune::Identifier => match first.val {
                Some(name) => name,
                None => return Err(ErrorKind::Internal("identifier without a name").at(first.pos)),
            },
            // Line markers the canonical writer emitted earlier.
            Rune::IntConst | Rune::PpNumber => return Ok(cond),
            _ => {
                if cond.on() {
                    self.diagnostics.error(first.pos, ErrorKind::BadDirective);
                }
                return Ok(cond);
            }
        };
        let rest = &line[1..];

        if name == self.names.define {
            if cond.on() {
                if rest.is_empty() {
                    self.diagnostics.error(first.pos, ErrorKind::EmptyDefine);
                } else {
                    self.define(rest);
                }
            }
        } else if name == self.names.undef {
            if cond.on() {
                self.undef(first, rest);
            }
        } else if name == self.names.if_ {
            if !cond.on() {
                cond.push(CondLevel::IfSkip);
            } else if self.const_expr(first, rest)? {
                cond.push(CondLevel::IfOn);
            } else {
                cond.push(CondLevel::IfOff);
            }
        } else if name == self.names.ifdef || name == self.names.ifndef {
            let invert = name == self.names.ifndef;
            if !cond.on() {
                cond.push(CondLevel::IfSkip);
            } else if let Some(tested) = self.single_identifier(first, rest) {
                if self.macros.contains_key(&tested) != invert {
                    cond.push(CondLevel::IfOn);
                } else {
                    cond.push(CondLevel::IfOff);
                }
            }
        } else if name == self.names.elif {
            match cond.top() {
                CondLevel::IfOff => {
                    if self.const_expr(first, rest)? {
                        cond.swap(CondLevel::IfOn);
                    }
                }
                CondLevel::IfOn => cond.swap(CondLevel::IfSkip),
                CondLevel::IfSkip => (),
                CondLevel::Zero => {
                    self.diagnostics
                        .error(first.pos, ErrorKind::UnmatchedConditional);
                }
            }
        } else if name == self.names.else_ {
            match cond.top() {
                CondLevel::IfOff => cond.swap(CondLevel::IfOn),
                CondLevel::IfOn => cond.swap(CondLevel::IfOff),
                CondLevel::IfSkip => (),
                CondLevel::Zero => {
                    self.diagnostics
                        .error(first.pos, ErrorKind::UnmatchedConditional);
                }
            }
        } else if name == self.names.endif {
            if cond.top() == CondLevel::Zero {
                self.diagnostics.error(first.pos, ErrorKind::UnmatchedEndif);
            } else {
                cond.pop();
            }
        } else if name == self.names.include {
            if cond.on() {
                self.directive_include(first, rest, w)?;
            }
        } else if name == self.names.error {
            if cond.on() {
                return Err(ErrorKind::ErrorDirective(self.line_text(rest)).at(first.pos));
            }
        } else if name == self.names.warning {
            if cond.on() {
                let text = self.line_text(rest);
                self.diagnostics
                    .error(first.pos, ErrorKind::WarningDirective(text));
            }
        } else if name == self.names.pragma {
            // Recognised; pragma semantics live outside the core.
        } else if cond.on() {
            self.diagnostics.error(first.pos, ErrorKind::BadDirective);
        }

        Ok(cond)
    }

    fn read_line(&mut self, r: &mut dyn TokenReader) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            let t = r.read(&self.interner);
            match t.rune {
                Rune::Char('\n') | Rune::Eof => break,
                _ => tokens.push(t),
            }
        }

        let leading = tokens.iter().take_while(|t| t.is_space()).count();
        tokens.drain(..leading);
        tokens
    }

    fn line_text(&self, rest: &[Token]) -> String {
        trim_space(rest)
            .iter()
            .map(|t| t.spelling(&self.interner))
            .join("")
    }

    // #define: an object-like macro needs whitespace after its name; a '('
    // directly after the name opens the parameter list.
    fn define(&mut self, rest: &[Token]) {
        let line = if rest.first().map_or(false, Token::is_space) {
            &rest[1..]
        } else {
            rest
        };

        let Some(&name_tok) = line.first() else {
            return;
        };
        let Some(name) = name_tok.val.filter(|_| name_tok.rune == Rune::Identifier) else {
            self.diagnostics
                .error(name_tok.pos, ErrorKind::ExpectedIdentifier);
            return;
        };

        let line = &line[1..];
        match line.first().map(|t| t.rune) {
            None => self.define_object_macro(name_tok, name, Vec::new()),
            Some(Rune::Char(' ')) => {
                self.define_object_macro(name_tok, name, trim_space(&line[1..]).to_vec())
            }
            Some(Rune::Char('(')) => self.define_fn_macro(name_tok, name, &line[1..]),
            Some(_) => self.diagnostics.error(name_tok.pos, ErrorKind::BadDirective),
        }
    }

    fn define_object_macro(&mut self, name_tok: Token, name: Name, repl: Vec<Token>) {
        if let Some(existing) = self.macros.get(&name) {
            // Identical redefinition is allowed.
            if !existing.fn_like && existing.identical_to(&[], &repl, false) {
                return;
            }
            let spelling = self.interner.resolve_str(name).to_string();
            self.diagnostics
                .error(name_tok.pos, ErrorKind::MacroRedefinition(spelling));
            return;
        }

        self.macros
            .insert(name, Macro::new(name_tok, repl));
    }

    fn define_fn_macro(&mut self, name_tok: Token, name: Name, line: &[Token]) {
        let mut params = Vec::new();
        let mut variadic = false;
        let mut expect_ident = true;

        for (i, t) in line.iter().enumerate() {
            match t.rune {
                Rune::Identifier => {
                    if !expect_ident {
                        self.diagnostics
                            .error(t.pos, ErrorKind::MacroParameterSyntax);
                        return;
                    }
                    match t.val {
                        Some(param) => params.push(param),
                        None => return,
                    }
                    expect_ident = false;
                }
                Rune::Char(',') => {
                    if expect_ident {
                        self.diagnostics
                            .error(t.pos, ErrorKind::MacroParameterSyntax);
                        return;
                    }
                    expect_ident = true;
                }
                Rune::Char(' ') => (),
                Rune::Ddd => variadic = true,
                Rune::Char(')') => {
                    let repl = trim_space(&line[i + 1..]).to_vec();

                    if let Some(existing) = self.macros.get(&name) {
                        if existing.fn_like
                            && existing.identical_to(&params, &repl, variadic)
                        {
                            return;
                        }
                        let spelling = self.interner.resolve_str(name).to_string();
                        self.diagnostics
                            .error(name_tok.pos, ErrorKind::MacroRedefinition(spelling));
                        return;
                    }

                    let mut m = Macro::new(name_tok, repl);
                    m.fn_like = true;
                    m.variadic = variadic;
                    m.params = params;
                    self.macros.insert(name, m);
                    return;
                }
                _ => {
                    self.diagnostics
                        .error(t.pos, ErrorKind::MacroParameterSyntax);
                    return;
                }
            }
        }

        self.diagnostics
            .error(name_tok.pos, ErrorKind::MacroParameterSyntax);
    }

    fn undef(&mut self, first: Token, rest: &[Token]) {
        let line = trim_all_space(rest);
        match line.as_slice() {
            [] => self
                .diagnostics
                .error(first.pos, ErrorKind::ExpectedIdentifier),
            [t] if t.rune == Rune::Identifier => {
                if let Some(name) = t.val {
                    self.macros.remove(&name);
                }
            }
            [t] => self.diagnostics.error(t.pos, ErrorKind::ExpectedIdentifier),
            [_, extra, ..] => self.diagnostics.error(extra.pos, ErrorKind::ExtraTokens),
        }
    }

    fn single_identifier(&mut self, first: Token, rest: &[Token]) -> Option<Name> {
        let line = trim_all_space(rest);
        match line.as_slice() {
            [] => {
                self.diagnostics
                    .error(first.pos, ErrorKind::ExpectedIdentifier);
                None
            }
            [t] if t.rune == Rune::Identifier => t.val,
            [t] => {
                self.diagnostics.error(t.pos, ErrorKind::ExpectedIdentifier);
                None
            }
            [_, extra, ..] => {
                self.diagnostics.error(extra.pos, ErrorKind::ExtraTokens);
                None
            }
        }
    }

    fn directive_include(
        &mut self,
        first: Token,
        rest: &[Token],
        w: &mut dyn TokenWriter,
    ) -> Result<(), PreprocessorError> {
        let line = self.expands(trim_all_space(rest))?;

        if self.options.emit_include_filenames {
            w.write_all(&line);
            return Ok(());
        }

        let Some(head) = line.first() else {
            self.diagnostics.error(first.pos, ErrorKind::BadIncludeName);
            return Ok(());
        };

        match head.rune {
            Rune::Char('<') => {
                let mut name = String::new();
                for t in &line[1..] {
                    if t.rune == Rune::Char('>') {
                        return self.include(first, &name, true, w);
                    }
                    name.push_str(&t.spelling(&self.interner));
                }
                self.diagnostics.error(first.pos, ErrorKind::BadIncludeName);
            }
            Rune::StringLiteral => {
                let spelling = match head.val {
                    Some(val) => self.interner.resolve_str(val),
                    None => "",
                };
                let name = spelling
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(spelling)
                    .to_string();
                return self.include(first, &name, false, w);
            }
            _ => self.diagnostics.error(first.pos, ErrorKind::BadIncludeName),
        }

        Ok(())
    }

    // Walks the component-ordered search path; '@' stands for the
    // directory of the file that issued the #include. The included file is
    // expanded against a fresh condition stack.
    fn include(
        &mut self,
        at: Token,
        name: &str,
        system: bool,
        w: &mut dyn TokenWriter,
    ) -> Result<(), PreprocessorError> {
        if self.include_level == MAX_INCLUDE_LEVEL {
            return Err(ErrorKind::IncludeDepthExceeded.at(at.pos));
        }

        let paths = if system {
            &self.sys_include_paths
        } else {
            &self.include_paths
        };

        let mut found = None;
        for path in paths {
            let dir = if path.as_os_str() == "@" {
                self.source_map
                    .file(at.pos)
                    .and_then(|file| file.name().parent())
                    .map(PathBuf::from)
                    .unwrap_or_default()
            } else {
                path.clone()
            };

            let candidate = dir.join(name);
            if candidate.is_file() {
                found = Some(candidate);
                break;
            }
        }

        let Some(path) = found else {
            return Err(ErrorKind::IncludeNotFound(name.to_string()).at(at.pos));
        };

        self.include_level += 1;
        let result = self.include_parsed(at, path, w);
        self.include_level -= 1;
        result
    }

    fn include_parsed(
        &mut self,
        at: Token,
        path: PathBuf,
        w: &mut dyn TokenWriter,
    ) -> Result<(), PreprocessorError> {
        let source = FileSource::new(path, Rc::clone(&self.include_cache));
        let mut reader = self.parse(vec![Box::new(source)])?;

        let cond = self.expand(&mut reader, w, CondStack::new())?;
        if !cond.balanced() {
            self.diagnostics
                .error(at.pos, ErrorKind::UnbalancedConditional);
        }
        Ok(())
    }

    // #if / #elif operand: collapse `defined`, expand what is left, zero
    // any identifier still standing, then parse and evaluate. A malformed
    // expression diagnoses and counts as false.
    fn const_expr(&mut self, first: Token, rest: &[Token]) -> Result<bool, PreprocessorError> {
        let mut tokens = trim_all_space(rest);

        let mut i = 0;
        while i < tokens.len() {
            let is_defined =
                tokens[i].rune == Rune::Identifier && tokens[i].val == Some(self.names.defined);
            if !is_defined {
                i += 1;
                continue;
            }

            if tokens.get(i + 1).map(|t| t.rune) == Some(Rune::Identifier) {
                let tested = tokens[i + 1].val;
                self.collapse_defined(&mut tokens[i], tested);
                tokens[i + 1] = Token::new(Rune::Char(' '), tokens[i + 1].pos);
                i += 2;
            } else if tokens.get(i + 1).map(|t| t.rune) == Some(Rune::Char('('))
                && tokens.get(i + 2).map(|t| t.rune) == Some(Rune::Identifier)
                && tokens.get(i + 3).map(|t| t.rune) == Some(Rune::Char(')'))
            {
                let tested = tokens[i + 2].val;
                self.collapse_defined(&mut tokens[i], tested);
                for blank in &mut tokens[i + 1..i + 4] {
                    *blank = Token::new(Rune::Char(' '), blank.pos);
                }
                i += 4;
            } else {
                i += 1;
            }
        }

        let mut expanded = self.expands(trim_all_space(&tokens))?;
        for t in &mut expanded {
            if matches!(t.rune, Rune::Identifier | Rune::NonRepl) {
                t.rune = Rune::IntConst;
                t.val = Some(self.names.zero);
            }
        }

        match ExprParser::parse(&expanded, &self.interner).and_then(|expr| expr.is_true()) {
            Ok(value) => Ok(value),
            Err(kind) => {
                self.diagnostics.error(first.pos, kind);
                Ok(false)
            }
        }
    }

    fn collapse_defined(&self, token: &mut Token, tested: Option<Name>) {
        let defined = tested.map_or(false, |name| self.macros.contains_key(&name));
        token.rune = Rune::IntConst;
        token.val = Some(if defined {
            self.names.one
        } else {
            self.names.zero
        });
    }
}
