use crate::interner::Interner;
use crate::source_map::SourceMap;
use crate::stream::TokenReader;
use crate::token::Rune;
use std::path::PathBuf;

/// Serialises a preprocessed token stream to text, inserting a
/// `# <line> <filename>` marker whenever the current file changes, the way
/// canonical cpp output does.
pub fn write_canonical(
    reader: &mut dyn TokenReader,
    interner: &Interner,
    map: &SourceMap,
    out: &mut dyn std::fmt::Write,
) -> std::fmt::Result {
    let mut current_file: Option<PathBuf> = None;

    loop {
        let token = reader.read(interner);
        if token.rune == Rune::Eof {
            return Ok(());
        }

        if let Some((file, location)) = map.location(token.pos) {
            if current_file.as_deref() != Some(file.name()) {
                writeln!(out, "# {} {}", location.line, file.name().display())?;
                current_file = Some(file.name().to_path_buf());
            }
        }

        out.write_str(&token.spelling(interner))?;
    }
}
