use crate::error::ErrorKind;
use crate::lexer::{split_integer_suffix, Longness};
use num_traits::Zero;

/*
   Integer values as `#if` sees them: a fixed ILP32/LP64-style model with
   32-bit int and 64-bit long/long long. Bits are stored truncated to the
   type's width; signed values sign-extend on the way out.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntTy {
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
}

impl IntTy {
    pub fn is_signed(self) -> bool {
        matches!(self, IntTy::Int | IntTy::Long | IntTy::LongLong)
    }

    // C99 6.3.1.1-1 integer conversion ranks.
    pub fn rank(self) -> u8 {
        match self {
            IntTy::Int | IntTy::UInt => 4,
            IntTy::Long | IntTy::ULong => 5,
            IntTy::LongLong | IntTy::ULongLong => 6,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            IntTy::Int | IntTy::UInt => 32,
            _ => 64,
        }
    }

    pub fn to_unsigned(self) -> IntTy {
        match self {
            IntTy::Int => IntTy::UInt,
            IntTy::Long => IntTy::ULong,
            IntTy::LongLong => IntTy::ULongLong,
            unsigned => unsigned,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Value {
    pub ty: IntTy,
    bits: u64,
}

impl Value {
    pub fn new(ty: IntTy, bits: u64) -> Self {
        Self { ty, bits }.normalize()
    }

    pub fn int(value: i64) -> Self {
        Self::new(IntTy::Int, value as u64)
    }

    pub fn bool(value: bool) -> Self {
        Self::int(i64::from(value))
    }

    // Truncation to the target width with two's-complement semantics.
    fn normalize(mut self) -> Self {
        if self.ty.bits() == 32 {
            self.bits &= 0xFFFF_FFFF;
        }
        self
    }

    pub fn as_u64(self) -> u64 {
        self.bits
    }

    pub fn as_i64(self) -> i64 {
        if self.ty.bits() == 32 && self.ty.is_signed() {
            self.bits as u32 as i32 as i64
        } else {
            self.bits as i64
        }
    }

    pub fn is_zero(self) -> bool {
        self.bits.is_zero()
    }

    // C99 6.3.1.1-2: everything of lesser rank becomes int (the model has
    // no sub-int constants, so this only renames).
    fn promote(self) -> Self {
        self
    }

    fn convert_to(self, ty: IntTy) -> Self {
        let widened = if self.ty.is_signed() {
            self.as_i64() as u64
        } else {
            self.as_u64()
        };
        Value::new(ty, widened)
    }

    // C99 6.3.1.8 usual arithmetic conversions over the integer types.
    pub fn usual_arithmetic_conversions(a: Value, b: Value) -> (Value, Value) {
        let a = a.promote();
        let b = b.promote();

        if a.ty == b.ty {
            return (a, b);
        }

        if a.ty.is_signed() == b.ty.is_signed() {
            let ty = if a.ty.rank() >= b.ty.rank() { a.ty } else { b.ty };
            return (a.convert_to(ty), b.convert_to(ty));
        }

        let (signed, unsigned) = if a.ty.is_signed() { (a, b) } else { (b, a) };
        let ty = if unsigned.ty.rank() >= signed.ty.rank() {
            unsigned.ty
        } else if signed.ty.bits() > unsigned.ty.bits() {
            // The signed type can represent every value of the unsigned one.
            signed.ty
        } else {
            signed.ty.to_unsigned()
        };

        (a.convert_to(ty), b.convert_to(ty))
    }

    fn arith(a: Value, b: Value, f: impl FnOnce(u64, u64) -> u64) -> Value {
        let (a, b) = Value::usual_arithmetic_conversions(a, b);
        Value::new(a.ty, f(a.bits, b.bits))
    }

    pub fn add(a: Value, b: Value) -> Value {
        Value::arith(a, b, u64::wrapping_add)
    }

    pub fn sub(a: Value, b: Value) -> Value {
        Value::arith(a, b, u64::wrapping_sub)
    }

    pub fn mul(a: Value, b: Value) -> Value {
        Value::arith(a, b, u64::wrapping_mul)
    }

    pub fn div(a: Value, b: Value) -> Result<Value, ErrorKind> {
        let (a, b) = Value::usual_arithmetic_conversions(a, b);
        if b.is_zero() {
            return Err(ErrorKind::DivisionByZero);
        }

        Ok(if a.ty.is_signed() {
            Value::new(a.ty, a.as_i64().wrapping_div(b.as_i64()) as u64)
        } else {
            Value::new(a.ty, a.as_u64() / b.as_u64())
        })
    }

    pub fn rem(a: Value, b: Value) -> Result<Value, ErrorKind> {
        let (a, b) = Value::usual_arithmetic_conversions(a, b);
        if b.is_zero() {
            return Err(ErrorKind::DivisionByZero);
        }

        Ok(if a.ty.is_signed() {
            Value::new(a.ty, a.as_i64().wrapping_rem(b.as_i64()) as u64)
        } else {
            Value::new(a.ty, a.as_u64() % b.as_u64())
        })
    }

    pub fn bit_and(a: Value, b: Value) -> Value {
        Value::arith(a, b, |a, b| a & b)
    }

    pub fn bit_or(a: Value, b: Value) -> Value {
        Value::arith(a, b, |a, b| a | b)
    }

    pub fn bit_xor(a: Value, b: Value) -> Value {
        Value::arith(a, b, |a, b| a ^ b)
    }

    // Shifts keep the promoted left operand's type; counts are masked to
    // the width so the evaluator cannot trap.
    pub fn shl(a: Value, b: Value) -> Value {
        let a = a.promote();
        let amount = b.as_u64() as u32 & (a.ty.bits() - 1);
        Value::new(a.ty, a.bits.wrapping_shl(amount))
    }

    pub fn shr(a: Value, b: Value) -> Value {
        let a = a.promote();
        let amount = b.as_u64() as u32 & (a.ty.bits() - 1);
        if a.ty.is_signed() {
            Value::new(a.ty, (a.as_i64() >> amount) as u64)
        } else {
            Value::new(a.ty, a.as_u64() >> amount)
        }
    }

    fn compare(a: Value, b: Value, signed: impl FnOnce(i64, i64) -> bool, unsigned: impl FnOnce(u64, u64) -> bool) -> Value {
        let (a, b) = Value::usual_arithmetic_conversions(a, b);
        Value::bool(if a.ty.is_signed() {
            signed(a.as_i64(), b.as_i64())
        } else {
            unsigned(a.as_u64(), b.as_u64())
        })
    }

    pub fn lt(a: Value, b: Value) -> Value {
        Value::compare(a, b, |a, b| a < b, |a, b| a < b)
    }

    pub fn le(a: Value, b: Value) -> Value {
        Value::compare(a, b, |a, b| a <= b, |a, b| a <= b)
    }

    pub fn gt(a: Value, b: Value) -> Value {
        Value::compare(a, b, |a, b| a > b, |a, b| a > b)
    }

    pub fn ge(a: Value, b: Value) -> Value {
        Value::compare(a, b, |a, b| a >= b, |a, b| a >= b)
    }

    pub fn eq(a: Value, b: Value) -> Value {
        Value::compare(a, b, |a, b| a == b, |a, b| a == b)
    }

    pub fn ne(a: Value, b: Value) -> Value {
        Value::compare(a, b, |a, b| a != b, |a, b| a != b)
    }

    pub fn neg(self) -> Value {
        let v = self.promote();
        Value::new(v.ty, v.bits.wrapping_neg())
    }

    pub fn bit_not(self) -> Value {
        let v = self.promote();
        Value::new(v.ty, !v.bits)
    }

    pub fn logical_not(self) -> Value {
        Value::bool(self.is_zero())
    }
}

/// Parses an integer constant's spelling (base prefix plus suffix) into a
/// typed value, picking the first type in the C99 6.4.4.1 candidate list
/// that can represent it.
pub fn parse_int_const(spelling: &str) -> Result<Value, ErrorKind> {
    let (body, unsigned, longness) = split_integer_suffix(spelling);

    let (digits, radix) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (hex, 16)
    } else if body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8)
    } else {
        (body, 10)
    };

    let value = u64::from_str_radix(digits, radix).map_err(|_| ErrorKind::IntegerTooLarge)?;

    use IntTy::*;
    let candidates: &[IntTy] = match (radix == 10, unsigned, longness) {
        (true, false, Longness::Plain) => &[Int, Long, LongLong],
        (true, false, Longness::Long) => &[Long, LongLong],
        (true, false, Longness::LongLong) => &[LongLong],
        (true, true, Longness::Plain) => &[UInt, ULong, ULongLong],
        (true, true, Longness::Long) => &[ULong, ULongLong],
        (true, true, Longness::LongLong) => &[ULongLong],
        (false, false, Longness::Plain) => &[Int, UInt, Long, ULong, LongLong, ULongLong],
        (false, false, Longness::Long) => &[Long, ULong, LongLong, ULongLong],
        (false, false, Longness::LongLong) => &[LongLong, ULongLong],
        (false, true, Longness::Plain) => &[UInt, ULong, ULongLong],
        (false, true, Longness::Long) => &[ULong, ULongLong],
        (false, true, Longness::LongLong) => &[ULongLong],
    };

    for &ty in candidates {
        let fits = match ty {
            Int => value <= i32::MAX as u64,
            UInt => value <= u32::MAX as u64,
            Long | LongLong => value <= i64::MAX as u64,
            ULong | ULongLong => true,
        };
        if fits {
            return Ok(Value::new(ty, value));
        }
    }

    Err(ErrorKind::IntegerTooLarge)
}

/// Integer value of a character constant's spelling, quotes included.
pub fn parse_char_const(spelling: &str) -> Result<Value, ErrorKind> {
    let inner = spelling
        .strip_prefix('L')
        .unwrap_or(spelling)
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or(ErrorKind::MalformedExpression)?;

    let mut chars = inner.chars();
    let value = match chars.next() {
        None => return Err(ErrorKind::MalformedExpression),
        Some('\\') => match chars.next() {
            Some('n') => '\n' as u32,
            Some('t') => '\t' as u32,
            Some('r') => '\r' as u32,
            Some('a') => 0x07,
            Some('b') => 0x08,
            Some('f') => 0x0C,
            Some('v') => 0x0B,
            Some('\\') => '\\' as u32,
            Some('\'') => '\'' as u32,
            Some('"') => '"' as u32,
            Some('?') => '?' as u32,
            Some('x') => u32::from_str_radix(chars.as_str(), 16)
                .map_err(|_| ErrorKind::MalformedExpression)?,
            Some(c @ '0'..='7') => {
                let mut value = c as u32 - '0' as u32;
                for c in chars.by_ref() {
                    match c.to_digit(8) {
                        Some(digit) => value = value * 8 + digit,
                        None => return Err(ErrorKind::MalformedExpression),
                    }
                }
                value
            }
            _ => return Err(ErrorKind::MalformedExpression),
        },
        Some(c) => c as u32,
    };

    Ok(Value::int(i64::from(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_constants_stay_signed() {
        assert_eq!(parse_int_const("1").unwrap().ty, IntTy::Int);
        assert_eq!(parse_int_const("2147483647").unwrap().ty, IntTy::Int);
        assert_eq!(parse_int_const("2147483648").unwrap().ty, IntTy::Long);
        assert_eq!(parse_int_const("1u").unwrap().ty, IntTy::UInt);
        assert_eq!(parse_int_const("1ll").unwrap().ty, IntTy::LongLong);
        assert!(parse_int_const("99999999999999999999").is_err());
    }

    #[test]
    fn hex_constants_fall_over_to_unsigned() {
        assert_eq!(parse_int_const("0x7FFFFFFF").unwrap().ty, IntTy::Int);
        assert_eq!(parse_int_const("0xFFFFFFFF").unwrap().ty, IntTy::UInt);
        assert_eq!(parse_int_const("0x1FFFFFFFF").unwrap().ty, IntTy::Long);
        assert_eq!(
            parse_int_const("0xFFFFFFFFFFFFFFFF").unwrap().ty,
            IntTy::ULong
        );
        assert_eq!(parse_int_const("010").unwrap().as_i64(), 8);
    }

    #[test]
    fn unsigned_wins_when_ranks_tie() {
        let minus_one = Value::int(-1);
        let zero_u = Value::new(IntTy::UInt, 0);

        // (unsigned)-1 is a huge value, so -1 < 0u is false.
        assert!(Value::lt(minus_one, zero_u).is_zero());

        // But a 64-bit signed type absorbs a 32-bit unsigned one.
        let minus_one_long = Value::new(IntTy::Long, -1i64 as u64);
        let (a, b) = Value::usual_arithmetic_conversions(minus_one_long, zero_u);
        assert_eq!(a.ty, IntTy::Long);
        assert_eq!(b.ty, IntTy::Long);
        assert!(!Value::lt(a, b).is_zero());

        // Same width on both sides goes to the unsigned counterpart.
        let (a, _) = Value::usual_arithmetic_conversions(
            Value::new(IntTy::LongLong, 1),
            Value::new(IntTy::ULong, 1),
        );
        assert_eq!(a.ty, IntTy::ULongLong);
    }

    #[test]
    fn arithmetic_truncates_to_width() {
        let big = Value::new(IntTy::UInt, 0xFFFF_FFFF);
        let one = Value::new(IntTy::UInt, 1);
        assert_eq!(Value::add(big, one).as_u64(), 0);

        let max_int = Value::int(i32::MAX as i64);
        assert_eq!(Value::add(max_int, Value::int(1)).as_i64(), i32::MIN as i64);
    }

    #[test]
    fn division_guards() {
        assert_eq!(
            Value::div(Value::int(7), Value::int(0)),
            Err(ErrorKind::DivisionByZero)
        );
        assert_eq!(
            Value::div(Value::int(-7), Value::int(2)).unwrap().as_i64(),
            -3
        );
        assert_eq!(
            Value::rem(Value::int(-7), Value::int(2)).unwrap().as_i64(),
            -1
        );
    }

    #[test]
    fn shifts_mask_their_counts() {
        assert_eq!(Value::shl(Value::int(1), Value::int(200)).as_i64(), 1 << 8);
        assert_eq!(Value::shr(Value::int(-8), Value::int(1)).as_i64(), -4);
    }

    #[test]
    fn char_constants() {
        assert_eq!(parse_char_const("'a'").unwrap().as_i64(), 97);
        assert_eq!(parse_char_const(r"'\n'").unwrap().as_i64(), 10);
        assert_eq!(parse_char_const(r"'\x41'").unwrap().as_i64(), 65);
        assert_eq!(parse_char_const(r"'\101'").unwrap().as_i64(), 65);
        assert_eq!(parse_char_const("L'b'").unwrap().as_i64(), 98);
        assert!(parse_char_const("''").is_err());
    }
}
