use crate::source_map::{Pos, SourceMap};
use derive_more::IsVariant;
use std::fmt::Display;

/// Everything that can go wrong while preprocessing. One enum serves both
/// the accumulated diagnostics list and fatal `PreprocessorError`s; the
/// call site decides which path a kind takes.
#[derive(Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum ErrorKind {
    // Lexical.
    UnterminatedComment,
    UnterminatedCharacterConstant,
    UnterminatedStringLiteral,
    InvalidUniversalCharacterName,
    MissingFinalNewline,

    // Directive form.
    EmptyDefine,
    ExpectedIdentifier,
    ExtraTokens,
    BadDirective,
    MacroParameterSyntax,

    // Semantic.
    MacroRedefinition(String),
    EmptyTokenPaste,
    UnmatchedEndif,
    UnmatchedConditional,
    UnbalancedConditional,
    BadIncludeName,
    IncludeNotFound(String),
    IncludeDepthExceeded,
    UnexpectedEof,

    // Constant expressions.
    MalformedExpression,
    DivisionByZero,
    IntegerTooLarge,

    // User-driven.
    ErrorDirective(String),
    WarningDirective(String),

    Io(String),
    Internal(&'static str),
}

impl ErrorKind {
    pub fn at(self, pos: Pos) -> PreprocessorError {
        PreprocessorError::new(self, pos)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorKind::WarningDirective(_))
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnterminatedComment => write!(f, "unterminated comment"),
            ErrorKind::UnterminatedCharacterConstant => {
                write!(f, "unterminated character constant")
            }
            ErrorKind::UnterminatedStringLiteral => write!(f, "unterminated string literal"),
            ErrorKind::InvalidUniversalCharacterName => {
                write!(f, "invalid universal character name")
            }
            ErrorKind::MissingFinalNewline => write!(f, "file is missing final newline"),
            ErrorKind::EmptyDefine => write!(f, "empty define not allowed"),
            ErrorKind::ExpectedIdentifier => write!(f, "expected identifier"),
            ErrorKind::ExtraTokens => write!(f, "extra tokens on directive line"),
            ErrorKind::BadDirective => write!(f, "unrecognized directive"),
            ErrorKind::MacroParameterSyntax => write!(f, "malformed macro parameter list"),
            ErrorKind::MacroRedefinition(name) => {
                write!(f, "incompatible redefinition of macro {name}")
            }
            ErrorKind::EmptyTokenPaste => write!(f, "'##' has nothing to paste"),
            ErrorKind::UnmatchedEndif => write!(f, "#endif without matching #if"),
            ErrorKind::UnmatchedConditional => {
                write!(f, "conditional directive without matching #if")
            }
            ErrorKind::UnbalancedConditional => {
                write!(f, "unterminated conditional at end of input")
            }
            ErrorKind::BadIncludeName => write!(f, "invalid include file name specification"),
            ErrorKind::IncludeNotFound(name) => write!(f, "include file not found: {name}"),
            ErrorKind::IncludeDepthExceeded => write!(f, "too many include levels"),
            ErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
            ErrorKind::MalformedExpression => write!(f, "malformed constant expression"),
            ErrorKind::DivisionByZero => write!(f, "division by zero in constant expression"),
            ErrorKind::IntegerTooLarge => write!(f, "integer constant out of range"),
            ErrorKind::ErrorDirective(message) => write!(f, "{message}"),
            ErrorKind::WarningDirective(message) => write!(f, "{message}"),
            ErrorKind::Io(message) => write!(f, "{message}"),
            ErrorKind::Internal(what) => write!(f, "internal error: {what}"),
        }
    }
}

/// A fatal failure; unwinds the expander back to the caller.
#[derive(Clone, Debug)]
pub struct PreprocessorError {
    pub kind: ErrorKind,
    pub pos: Pos,
}

impl PreprocessorError {
    pub fn new(kind: ErrorKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn show(&self, w: &mut dyn std::fmt::Write, map: &SourceMap) -> std::fmt::Result {
        let severity = if self.kind.is_warning() {
            "warning"
        } else {
            "error"
        };

        match map.location(self.pos) {
            Some((file, location)) => write!(
                w,
                "{}:{}: {}: {}",
                file.name().display(),
                location,
                severity,
                self.kind
            ),
            None => write!(w, "{}: {}", severity, self.kind),
        }
    }
}

impl Display for PreprocessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for PreprocessorError {}
