use super::value::{parse_char_const, parse_int_const, Value};
use crate::error::ErrorKind;
use crate::interner::Interner;
use crate::look_ahead::LookAhead;
use crate::token::{Rune, Token};

/*
   Constant expressions for #if / #elif. By the time tokens arrive here,
   `defined` has been collapsed, macros have been expanded, and leftover
   identifiers have been zeroed, so this is a plain conditional-expression
   grammar over typed integer constants.
*/

#[derive(Clone, Debug)]
pub enum ConstExpr {
    Constant(Value),
    UnaryOperation(Box<UnaryOperation>),
    BinaryOperation(Box<BinaryOperation>),
    Ternary(Box<Ternary>),
}

impl ConstExpr {
    pub fn evaluate(&self) -> Result<Value, ErrorKind> {
        match self {
            ConstExpr::Constant(value) => Ok(*value),
            ConstExpr::UnaryOperation(unary) => unary.evaluate(),
            ConstExpr::BinaryOperation(binary) => binary.evaluate(),
            ConstExpr::Ternary(ternary) => ternary.evaluate(),
        }
    }

    pub fn is_true(&self) -> Result<bool, ErrorKind> {
        Ok(!self.evaluate()?.is_zero())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Positive,
    Negative,
    BitComplement,
    Not,
}

#[derive(Clone, Debug)]
pub struct UnaryOperation {
    pub operator: UnaryOperator,
    pub inner: ConstExpr,
}

impl UnaryOperation {
    pub fn evaluate(&self) -> Result<Value, ErrorKind> {
        let inner = self.inner.evaluate()?;
        Ok(match self.operator {
            UnaryOperator::Positive => inner,
            UnaryOperator::Negative => inner.neg(),
            UnaryOperator::BitComplement => inner.bit_not(),
            UnaryOperator::Not => inner.logical_not(),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    LogicalOr,
    LogicalAnd,
    InclusiveOr,
    ExclusiveOr,
    BitwiseAnd,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanEq,
    GreaterThanEq,
    LeftShift,
    RightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

impl BinaryOperator {
    fn precedence(self) -> u8 {
        use BinaryOperator::*;
        match self {
            LogicalOr => 1,
            LogicalAnd => 2,
            InclusiveOr => 3,
            ExclusiveOr => 4,
            BitwiseAnd => 5,
            Equals | NotEquals => 6,
            LessThan | GreaterThan | LessThanEq | GreaterThanEq => 7,
            LeftShift | RightShift => 8,
            Add | Subtract => 9,
            Multiply | Divide | Modulus => 10,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BinaryOperation {
    pub operator: BinaryOperator,
    pub left: ConstExpr,
    pub right: ConstExpr,
}

impl BinaryOperation {
    pub fn evaluate(&self) -> Result<Value, ErrorKind> {
        use BinaryOperator::*;

        // && and || must not evaluate their dead side.
        match self.operator {
            LogicalOr => {
                return Ok(Value::bool(
                    self.left.is_true()? || self.right.is_true()?,
                ))
            }
            LogicalAnd => {
                return Ok(Value::bool(
                    self.left.is_true()? && self.right.is_true()?,
                ))
            }
            _ => (),
        }

        let left = self.left.evaluate()?;
        let right = self.right.evaluate()?;

        Ok(match self.operator {
            LogicalOr | LogicalAnd => unreachable!("handled above"),
            InclusiveOr => Value::bit_or(left, right),
            ExclusiveOr => Value::bit_xor(left, right),
            BitwiseAnd => Value::bit_and(left, right),
            Equals => Value::eq(left, right),
            NotEquals => Value::ne(left, right),
            LessThan => Value::lt(left, right),
            GreaterThan => Value::gt(left, right),
            LessThanEq => Value::le(left, right),
            GreaterThanEq => Value::ge(left, right),
            LeftShift => Value::shl(left, right),
            RightShift => Value::shr(left, right),
            Add => Value::add(left, right),
            Subtract => Value::sub(left, right),
            Multiply => Value::mul(left, right),
            Divide => Value::div(left, right)?,
            Modulus => Value::rem(left, right)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Ternary {
    pub condition: ConstExpr,
    pub when_true: ConstExpr,
    pub when_false: ConstExpr,
}

impl Ternary {
    pub fn evaluate(&self) -> Result<Value, ErrorKind> {
        if self.condition.is_true()? {
            self.when_true.evaluate()
        } else {
            self.when_false.evaluate()
        }
    }
}

pub struct ExprParser<'a> {
    input: LookAhead<std::vec::IntoIter<Token>>,
    interner: &'a Interner,
}

impl<'a> ExprParser<'a> {
    pub fn parse(tokens: &[Token], interner: &'a Interner) -> Result<ConstExpr, ErrorKind> {
        let significant: Vec<Token> = tokens
            .iter()
            .filter(|t| !t.is_space() && !t.is_newline())
            .copied()
            .collect();

        let mut parser = Self {
            input: LookAhead::new(significant.into_iter()),
            interner,
        };

        let expr = parser.parse_expr()?;
        if parser.input.next().is_some() {
            return Err(ErrorKind::MalformedExpression);
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<ConstExpr, ErrorKind> {
        let condition = self.parse_operator_expr(0)?;

        if !self.eat(Rune::Char('?')) {
            return Ok(condition);
        }

        let when_true = self.parse_expr()?;
        if !self.eat(Rune::Char(':')) {
            return Err(ErrorKind::MalformedExpression);
        }
        let when_false = self.parse_expr()?;

        Ok(ConstExpr::Ternary(Box::new(Ternary {
            condition,
            when_true,
            when_false,
        })))
    }

    fn parse_operator_expr(&mut self, min_precedence: u8) -> Result<ConstExpr, ErrorKind> {
        let mut left = self.parse_expr_primary()?;

        while let Some(operator) = self.peek_binary_operator() {
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }

            self.input.next();
            let right = self.parse_operator_expr(precedence + 1)?;
            left = ConstExpr::BinaryOperation(Box::new(BinaryOperation {
                operator,
                left,
                right,
            }));
        }

        Ok(left)
    }

    fn peek_binary_operator(&mut self) -> Option<BinaryOperator> {
        use BinaryOperator::*;

        Some(match self.input.peek()?.rune {
            Rune::OrOr => LogicalOr,
            Rune::AndAnd => LogicalAnd,
            Rune::Char('|') => InclusiveOr,
            Rune::Char('^') => ExclusiveOr,
            Rune::Char('&') => BitwiseAnd,
            Rune::Eq => Equals,
            Rune::Neq => NotEquals,
            Rune::Char('<') => LessThan,
            Rune::Char('>') => GreaterThan,
            Rune::Leq => LessThanEq,
            Rune::Geq => GreaterThanEq,
            Rune::Lsh => LeftShift,
            Rune::Rsh => RightShift,
            Rune::Char('+') => Add,
            Rune::Char('-') => Subtract,
            Rune::Char('*') => Multiply,
            Rune::Char('/') => Divide,
            Rune::Char('%') => Modulus,
            _ => return None,
        })
    }

    fn eat(&mut self, rune: Rune) -> bool {
        self.input.next_if(|t| t.rune == rune).is_some()
    }

    fn parse_expr_primary(&mut self) -> Result<ConstExpr, ErrorKind> {
        let Some(token) = self.input.next() else {
            return Err(ErrorKind::MalformedExpression);
        };

        let unary = |operator, parser: &mut Self| {
            Ok(ConstExpr::UnaryOperation(Box::new(UnaryOperation {
                operator,
                inner: parser.parse_expr_primary()?,
            })))
        };

        match token.rune {
            Rune::Char('!') => unary(UnaryOperator::Not, self),
            Rune::Char('~') => unary(UnaryOperator::BitComplement, self),
            Rune::Char('-') => unary(UnaryOperator::Negative, self),
            Rune::Char('+') => unary(UnaryOperator::Positive, self),
            Rune::Char('(') => {
                let expr = self.parse_expr()?;
                if !self.eat(Rune::Char(')')) {
                    return Err(ErrorKind::MalformedExpression);
                }
                Ok(expr)
            }
            Rune::IntConst => {
                let spelling = token
                    .val
                    .map(|val| self.interner.resolve_str(val))
                    .ok_or(ErrorKind::MalformedExpression)?;
                Ok(ConstExpr::Constant(parse_int_const(spelling)?))
            }
            Rune::CharConst | Rune::LongCharConst => {
                let spelling = token
                    .val
                    .map(|val| self.interner.resolve_str(val))
                    .ok_or(ErrorKind::MalformedExpression)?;
                Ok(ConstExpr::Constant(parse_char_const(spelling)?))
            }
            // Any identifier still standing evaluates as zero.
            Rune::Identifier | Rune::NonRepl => Ok(ConstExpr::Constant(Value::int(0))),
            _ => Err(ErrorKind::MalformedExpression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::Lexer;

    fn eval(src: &str) -> Result<Value, ErrorKind> {
        let mut interner = Interner::new();
        let diagnostics = Diagnostics::new();
        let mut lexer = Lexer::new(src, 1, false, &mut interner, &diagnostics);

        let mut tokens = Vec::new();
        loop {
            let token = lexer.scan();
            if token.rune == Rune::Eof {
                break;
            }
            tokens.push(token);
        }

        ExprParser::parse(&tokens, &interner)?.evaluate()
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval("1 + 2 * 3").unwrap().as_i64(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap().as_i64(), 9);
        assert_eq!(eval("1 << 4 | 1").unwrap().as_i64(), 17);
        assert_eq!(eval("7 % 3 + 1").unwrap().as_i64(), 2);
        assert_eq!(eval("1 < 2 == 4 > 3").unwrap().as_i64(), 1);
    }

    #[test]
    fn unary_and_ternary() {
        assert_eq!(eval("!0").unwrap().as_i64(), 1);
        assert_eq!(eval("~0").unwrap().as_i64(), -1);
        assert_eq!(eval("-(3)").unwrap().as_i64(), -3);
        assert_eq!(eval("1 ? 2 : 3").unwrap().as_i64(), 2);
        assert_eq!(eval("0 ? 2 : 1 ? 4 : 5").unwrap().as_i64(), 4);
    }

    #[test]
    fn short_circuits_protect_dead_operands() {
        assert_eq!(eval("0 && 1 / 0").unwrap().as_i64(), 0);
        assert_eq!(eval("1 || 1 / 0").unwrap().as_i64(), 1);
        assert_eq!(eval("1 && 1 / 0"), Err(ErrorKind::DivisionByZero));
        assert_eq!(eval("0 ? 1 / 0 : 9").unwrap().as_i64(), 9);
    }

    #[test]
    fn character_constants_and_identifiers() {
        assert_eq!(eval("'a' == 97").unwrap().as_i64(), 1);
        assert_eq!(eval("unknown + 1").unwrap().as_i64(), 1);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for src in ["", "1 +", "(1", "1 ? 2", "1 2", "\"s\""] {
            assert!(eval(src).is_err(), "{src:?}");
        }
    }
}
