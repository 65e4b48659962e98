use crate::token::Rune;

// A scanned pp-number is reclassified here: genuine integer and floating
// constants get their own runes, everything else stays PPNUMBER for later
// phases to reject.
pub fn classify(number: &str) -> Rune {
    if is_integer_constant(number) {
        Rune::IntConst
    } else if is_float_constant(number) {
        Rune::FloatConst
    } else {
        Rune::PpNumber
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Longness {
    Plain,
    Long,
    LongLong,
}

/// Splits the integer suffix off a constant's spelling, yielding the body,
/// the unsignedness, and the requested length. `u`/`U` and `l`/`ll`/`L`/`LL`
/// may appear in either order; a doubled `l` must repeat the same letter.
pub fn split_integer_suffix(number: &str) -> (&str, bool, Longness) {
    let bytes = number.as_bytes();
    let mut end = bytes.len();
    let mut unsigned = false;
    let mut longness = Longness::Plain;

    while end > 0 {
        match bytes[end - 1] {
            b'u' | b'U' if !unsigned => {
                unsigned = true;
                end -= 1;
            }
            b'l' | b'L' if longness == Longness::Plain => {
                longness = Longness::Long;
                end -= 1;
                if end > 0 && bytes[end - 1] == bytes[end] {
                    longness = Longness::LongLong;
                    end -= 1;
                }
            }
            _ => break,
        }
    }

    (&number[..end], unsigned, longness)
}

fn is_integer_constant(number: &str) -> bool {
    let (body, _, _) = split_integer_suffix(number);

    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }

    if let Some(octal) = body.strip_prefix('0') {
        return octal.bytes().all(|b| (b'0'..=b'7').contains(&b));
    }

    !body.is_empty()
        && body.bytes().next().map_or(false, |b| (b'1'..=b'9').contains(&b))
        && body.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_constant(number: &str) -> bool {
    let body = number.strip_suffix(['f', 'F', 'l', 'L']).unwrap_or(number);

    let (mantissa, exponent) = match body.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (body, None),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    let mantissa_ok = match mantissa.split_once('.') {
        Some((whole, fraction)) => {
            all_digits(whole) && all_digits(fraction) && !(whole.is_empty() && fraction.is_empty())
        }
        // Without a dot the exponent is what makes it a float.
        None => exponent.is_some() && !mantissa.is_empty() && all_digits(mantissa),
    };

    if !mantissa_ok {
        return false;
    }

    match exponent {
        None => true,
        Some(exponent) => {
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            !digits.is_empty() && all_digits(digits)
        }
    }
}
