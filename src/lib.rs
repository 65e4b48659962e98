mod char_class;
mod diagnostics;
mod encoding;
mod error;
mod expand;
mod interner;
mod keyword;
mod lexer;
mod line_column;
mod look_ahead;
mod macros;
mod output;
mod prepass;
mod source;
mod source_map;
mod stream;
mod token;
mod ucn;

pub use char_class::{classify, CharClass};
pub use diagnostics::Diagnostics;
pub use error::{ErrorKind, PreprocessorError};
pub use expand::{parse_int_const, CondLevel, CondStack, IntTy, Preprocessor, Value};
pub use interner::{Interner, Name};
pub use keyword::Keyword;
pub use line_column::Location;
pub use macros::Macro;
pub use output::write_canonical;
pub use source::{FileSource, Source, SourceCache, StringSource};
pub use source_map::{Pos, SourceFile, SourceMap};
pub use stream::{EncodedReader, TokenBuffer, TokenReader, TokenWriter};
pub use token::{Rune, Token};
pub use ucn::{is_ucn_digit, is_ucn_non_digit};

/// Behaviour toggles of the preprocessor.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Recognise the nine trigraphs in the character pre-pass.
    pub enable_trigraphs: bool,
    /// Suppress the missing-final-newline diagnostic.
    pub inject_final_newline: bool,
    /// `#include` writes its expanded file-name tokens straight to the
    /// output instead of opening a file; for tests.
    pub emit_include_filenames: bool,
}

#[cfg(test)]
mod tests;
