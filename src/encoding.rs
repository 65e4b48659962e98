use crate::interner::{Interner, Name};
use crate::source_map::Pos;
use crate::token::{Rune, Token};
use smallvec::SmallVec;

/*
   Wire form of a tokenised line: a sequence of records, each

       uvarint rune-code | uvarint position-delta | [uvarint value ID]

   where the delta is relative to the previous record in the same chunk and
   the value ID is present only for runes in the valued subset. The chunk
   bytes are interned, so a line shared between headers is stored once and
   a cached file is just a list of chunk IDs.
*/

fn put_uvarint(out: &mut SmallVec<[u8; 24]>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_uvarint(bytes: &[u8], offset: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(*offset)?;
        *offset += 1;
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
        shift += 7;
        if shift >= 64 {
            return None;
        }
    }
}

pub fn encode_line(tokens: &[Token], interner: &mut Interner) -> Name {
    let mut chunk = Vec::with_capacity(tokens.len() * 4);
    let mut record = SmallVec::<[u8; 24]>::new();
    let mut prev_pos = 0u32;

    for token in tokens {
        record.clear();
        put_uvarint(&mut record, u64::from(token.rune.code()));
        put_uvarint(&mut record, u64::from(token.pos.0 - prev_pos));
        prev_pos = token.pos.0;
        if token.rune.has_value() {
            let val = token.val.map(Name::as_u32).unwrap_or(0);
            put_uvarint(&mut record, u64::from(val));
        }
        chunk.extend_from_slice(&record);
    }

    interner.intern(&chunk)
}

pub fn decode_token(bytes: &[u8], offset: &mut usize, prev_pos: &mut u32) -> Option<Token> {
    if *offset >= bytes.len() {
        return None;
    }

    let code = read_uvarint(bytes, offset)?;
    let rune = Rune::from_code(u32::try_from(code).ok()?)?;
    let delta = read_uvarint(bytes, offset)?;
    *prev_pos += u32::try_from(delta).ok()?;

    let val = if rune.has_value() {
        Name::from_u32(u32::try_from(read_uvarint(bytes, offset)?).ok()?)
    } else {
        None
    };

    Some(Token {
        rune,
        pos: Pos(*prev_pos),
        val,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_round_trip_with_positions_and_values() {
        let mut interner = Interner::new();
        let name = interner.intern_str("water");
        let number = interner.intern_str("42");

        let line = [
            Token::with_value(Rune::Identifier, Pos(3), name),
            Token::new(Rune::Char(' '), Pos(8)),
            Token::new(Rune::PpPaste, Pos(9)),
            Token::with_value(Rune::IntConst, Pos(200), number),
            Token::new(Rune::Char('\n'), Pos(202)),
        ];

        let chunk = encode_line(&line, &mut interner);
        let bytes = interner.resolve(chunk).to_vec();

        let mut offset = 0;
        let mut pos = 0;
        let mut decoded = Vec::new();
        while let Some(token) = decode_token(&bytes, &mut offset, &mut pos) {
            decoded.push(token);
        }

        assert_eq!(decoded, line);
        assert_eq!(offset, bytes.len());
    }

    #[test]
    fn identical_lines_share_one_chunk() {
        let mut interner = Interner::new();
        let name = interner.intern_str("x");
        let line = [Token::with_value(Rune::Identifier, Pos(1), name)];

        let before = interner.len();
        let a = encode_line(&line, &mut interner);
        let b = encode_line(&line, &mut interner);
        assert_eq!(a, b);
        assert_eq!(interner.len(), before + 1);
    }
}
