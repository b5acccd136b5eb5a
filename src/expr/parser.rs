//! Recursive-descent parser for expression text.
//!
//! Precedence, lowest first:
//! 1. `x if c else y`
//! 2. `or`
//! 3. `and`
//! 4. `not`
//! 5. comparisons (chainable), `in`, `not in`, `is`, `is not`
//! 6. `+ -`
//! 7. `* / // %`
//! 8. unary `+ -`
//! 9. `**` (right associative, binds tighter than unary on its left)
//! 10. postfix: `x[i]`, `x[a:b:c]`, `x.name`, `f(...)`

use serde_json::Value;

use super::ast::{BinaryOp, Builtin, CompareOp, Expr, UnaryOp};
use super::errors::{ExprError, ExprResult};
use super::lexer::{Lexer, Token, TokenKind};

/// Deepest syntax tree the parser will build
pub const MAX_DEPTH: usize = 128;

/// Parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Parse a complete expression.
    pub fn parse(input: &str) -> ExprResult<Expr> {
        let tokens = Lexer::tokenize(input)?;
        let mut parser = Self {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_expr()?;
        if parser.peek() != &TokenKind::Eof {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> ExprResult<Expr> {
        let depth = self.descend()?;
        let then = self.parse_or()?;
        let expr = if self.eat(&TokenKind::If) {
            let cond = self.parse_or()?;
            self.expect(&TokenKind::Else)?;
            let otherwise = self.parse_expr()?;
            Expr::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            then
        };
        self.depth = depth;
        Ok(expr)
    }

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            self.descend()?;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            self.descend()?;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_not(&mut self) -> ExprResult<Expr> {
        if self.eat(&TokenKind::Not) {
            let depth = self.descend()?;
            let operand = self.parse_not()?;
            self.depth = depth;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ExprResult<Expr> {
        let first = self.parse_arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.parse_compare_op()? {
            rest.push((op, self.parse_arith()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn parse_compare_op(&mut self) -> ExprResult<Option<CompareOp>> {
        let op = match self.peek() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::GtEq => CompareOp::GtEq,
            TokenKind::In => CompareOp::In,
            TokenKind::Is => {
                self.advance();
                return Ok(Some(if self.eat(&TokenKind::Not) {
                    CompareOp::IsNot
                } else {
                    CompareOp::Is
                }));
            }
            TokenKind::Not => {
                // `not` here can only start `not in`
                if self.peek_nth(1) != &TokenKind::In {
                    return Ok(None);
                }
                self.advance();
                self.advance();
                return Ok(Some(CompareOp::NotIn));
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(op))
    }

    fn parse_arith(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_term(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::SlashSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        let depth = self.descend()?;
        let operand = self.parse_unary()?;
        self.depth = depth;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_power(&mut self) -> ExprResult<Expr> {
        let base = self.parse_postfix()?;
        if self.eat(&TokenKind::StarStar) {
            let depth = self.descend()?;
            let exponent = self.parse_unary()?;
            self.depth = depth;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> ExprResult<Expr> {
        let depth = self.depth;
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    self.descend()?;
                    expr = self.parse_subscript(expr)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    self.descend()?;
                    let offset = self.offset();
                    match self.peek().clone() {
                        TokenKind::Ident(name) => {
                            self.advance();
                            if self.peek() == &TokenKind::LParen {
                                return Err(ExprError::syntax(
                                    format!("method call '.{}()' is not supported", name),
                                    offset,
                                ));
                            }
                            expr = Expr::Member(Box::new(expr), name);
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                TokenKind::LParen => {
                    return Err(ExprError::syntax(
                        "only builtin functions can be called",
                        self.offset(),
                    ))
                }
                _ => break,
            }
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_subscript(&mut self, target: Expr) -> ExprResult<Expr> {
        let start = if self.peek() == &TokenKind::Colon {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        if !self.eat(&TokenKind::Colon) {
            self.expect(&TokenKind::RBracket)?;
            let index = start.ok_or_else(|| self.unexpected())?;
            return Ok(Expr::Index(Box::new(target), index));
        }

        let stop = self.parse_slice_bound()?;
        let step = if self.eat(&TokenKind::Colon) {
            self.parse_slice_bound()?
        } else {
            None
        };
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::Slice {
            target: Box::new(target),
            start,
            stop,
            step,
        })
    }

    fn parse_slice_bound(&mut self) -> ExprResult<Option<Box<Expr>>> {
        match self.peek() {
            TokenKind::Colon | TokenKind::RBracket => Ok(None),
            _ => Ok(Some(Box::new(self.parse_expr()?))),
        }
    }

    fn parse_atom(&mut self) -> ExprResult<Expr> {
        let offset = self.offset();
        let token = self.peek().clone();
        self.advance();
        match token {
            TokenKind::Int(n) => Ok(Expr::Literal(Value::from(n))),
            TokenKind::Float(n) => serde_json::Number::from_f64(n)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| ExprError::syntax("non-finite float literal", offset)),
            TokenKind::Str(s) => {
                // Adjacent string literals concatenate
                let mut text = s;
                while let TokenKind::Str(next) = self.peek().clone() {
                    self.advance();
                    text.push_str(&next);
                }
                Ok(Expr::Literal(Value::String(text)))
            }
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::None => Ok(Expr::Literal(Value::Null)),
            TokenKind::Ident(name) => {
                if self.peek() == &TokenKind::LParen {
                    let builtin = Builtin::from_name(&name).ok_or_else(|| {
                        ExprError::syntax(format!("unknown function '{}'", name), offset)
                    })?;
                    self.advance();
                    let args = self.parse_sequence(&TokenKind::RParen)?;
                    return Ok(Expr::Call(builtin, args));
                }
                Ok(Expr::Name(name))
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => Ok(Expr::List(self.parse_sequence(&TokenKind::RBracket)?)),
            TokenKind::LBrace => self.parse_dict(),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    /// Parses `a, b, c` up to and including `close`. A trailing comma is allowed.
    fn parse_sequence(&mut self, close: &TokenKind) -> ExprResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_dict(&mut self) -> ExprResult<Expr> {
        let mut entries = Vec::new();
        loop {
            if self.eat(&TokenKind::RBrace) {
                return Ok(Expr::Dict(entries));
            }
            let key = self.parse_expr()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RBrace)?;
                return Ok(Expr::Dict(entries));
            }
        }
    }

    /// Enters one more level of nesting; returns the depth to restore.
    fn descend(&mut self) -> ExprResult<usize> {
        let depth = self.depth;
        if depth >= MAX_DEPTH {
            return Err(ExprError::syntax("expression nested too deeply", self.offset()));
        }
        self.depth += 1;
        Ok(depth)
    }

    fn peek(&self) -> &TokenKind {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ExprResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ExprError::syntax(
                format!(
                    "expected {} but found {}",
                    kind.describe(),
                    self.peek().describe()
                ),
                self.offset(),
            ))
        }
    }

    fn unexpected(&self) -> ExprError {
        ExprError::syntax(
            format!("unexpected {}", self.peek().describe()),
            self.offset(),
        )
    }
}
