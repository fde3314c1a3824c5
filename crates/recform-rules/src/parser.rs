//! Recursive-descent parser for rule sources.
//!
//! Precedence, loosest first: `x if c else y`, `or`, `and`, `not`,
//! comparisons (`== != < <= > >= in`, `not in`), `+ -`, `* / // %`,
//! unary `- +`, then postfix calls, method calls and indexing.
//!
//! Nesting is bounded by [`MAX_DEPTH`]: every bracketed or conditional
//! expression, unary operator, operator in a chain and postfix step counts
//! one level, so neither parsing nor evaluation can exhaust the stack.

use recform_model::Node;

use crate::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use crate::error::ConversionError;
use crate::lexer::{Spanned, Token, tokenize};

/// Namespace prefix accepted in front of converter names.
pub(crate) const CONVERTER_NAMESPACE: &str = "converters";

const KEYWORDS: &[&str] = &["and", "or", "not", "in", "if", "else", "lambda"];

/// Deepest expression nesting a rule may reach.
pub(crate) const MAX_DEPTH: usize = 64;

/// Parsed shape of a rule source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Parsed {
    Converter(String),
    Lambda { param: String, body: Expr },
}

pub(crate) fn parse_rule(source: &str) -> Result<Parsed, ConversionError> {
    let mut parser = Parser::new(tokenize(source)?);
    let parsed = if parser.eat_keyword("lambda") {
        let param = parser.identifier("lambda parameter")?;
        parser.expect(&Token::Colon, "`:` after the lambda parameter")?;
        let body = parser.expression()?;
        Parsed::Lambda { param, body }
    } else {
        Parsed::Converter(parser.converter_name()?)
    };
    parser.expect(&Token::Eof, "end of rule")?;
    Ok(parsed)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn descend(&mut self) -> Result<(), ConversionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("rule nested too deeply"));
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].offset
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ConversionError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {:?}", self.peek())))
        }
    }

    fn error(&self, message: impl Into<String>) -> ConversionError {
        ConversionError::syntax(self.offset(), message)
    }

    fn identifier(&mut self, what: &str) -> Result<String, ConversionError> {
        match self.peek() {
            Token::Ident(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    /// `name` or `converters.name`; dotted names are kept whole.
    fn converter_name(&mut self) -> Result<String, ConversionError> {
        let mut parts = vec![self.identifier("a converter name or `lambda`")?];
        while self.eat(&Token::Dot) {
            parts.push(self.identifier("a name after `.`")?);
        }
        if parts.len() > 1 && parts[0] == CONVERTER_NAMESPACE {
            parts.remove(0);
        }
        Ok(parts.join("."))
    }

    fn expression(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        self.descend()?;
        let expr = self.conditional()?;
        self.depth = mark;
        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr, ConversionError> {
        let then = self.or()?;
        if !self.eat_keyword("if") {
            return Ok(then);
        }
        let condition = self.or()?;
        if !self.eat_keyword("else") {
            return Err(self.error("expected `else` in conditional expression"));
        }
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        let mut left = self.and()?;
        while self.eat_keyword("or") {
            self.descend()?;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = mark;
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        let mut left = self.not()?;
        while self.eat_keyword("and") {
            self.descend()?;
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = mark;
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, ConversionError> {
        if self.eat_keyword("not") {
            let mark = self.depth;
            self.descend()?;
            let operand = self.not()?;
            self.depth = mark;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn compare_op(&self) -> Option<(CompareOp, usize)> {
        let op = match self.peek() {
            Token::EqEq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            token if token.is_keyword("in") => CompareOp::In,
            token if token.is_keyword("not") && self.peek_at(1).is_keyword("in") => {
                return Some((CompareOp::NotIn, 2));
            }
            _ => return None,
        };
        Some((op, 1))
    }

    /// Chains such as `a < b < c` become `a < b and b < c`.
    fn comparison(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        let mut left = self.additive()?;
        let mut chain: Option<Expr> = None;
        while let Some((op, width)) = self.compare_op() {
            for _ in 0..width {
                self.advance();
            }
            self.descend()?;
            let right = self.additive()?;
            let link = Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right.clone()),
            };
            chain = Some(match chain {
                Some(previous) => Expr::And(Box::new(previous), Box::new(link)),
                None => link,
            });
            left = right;
        }
        self.depth = mark;
        Ok(chain.unwrap_or(left))
    }

    fn additive(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.term()?;
            left = binary(op, left, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::DoubleSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ConversionError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            _ => return self.postfix(),
        };
        self.advance();
        let mark = self.depth;
        self.descend()?;
        let operand = self.unary()?;
        self.depth = mark;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ConversionError> {
        let mark = self.depth;
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Token::Dot | Token::LBracket | Token::LParen) {
                self.descend()?;
            }
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let method = self.identifier("a method name")?;
                    if !self.eat(&Token::LParen) {
                        return Err(self.error(format!("attribute `{method}` must be called")));
                    }
                    let args = self.arguments()?;
                    expr = Expr::Method {
                        receiver: Box::new(expr),
                        method,
                        args,
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Token::LParen => {
                    let Expr::Name(function) = expr else {
                        return Err(self.error("only named functions can be called"));
                    };
                    self.advance();
                    let args = self.arguments()?;
                    expr = Expr::Call { function, args };
                }
                _ => break,
            }
        }
        self.depth = mark;
        Ok(expr)
    }

    /// Comma-separated expressions up to the closing `)`; the `(` is consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, ConversionError> {
        let mut args = Vec::new();
        while !self.eat(&Token::RParen) {
            args.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen, "`,` or `)`")?;
                break;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, ConversionError> {
        let offset = self.offset();
        match self.advance() {
            Token::Int(value) => Ok(Expr::Literal(Node::from(value))),
            Token::Float(value) => serde_json::Number::from_f64(value)
                .map(|number| Expr::Literal(Node::Number(number)))
                .ok_or_else(|| ConversionError::syntax(offset, "non-finite float literal")),
            Token::Str(text) => {
                let mut text = text;
                while let Token::Str(next) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::Literal(Node::String(text)))
            }
            Token::Ident(name) => match name.as_str() {
                "True" => Ok(Expr::Literal(Node::Bool(true))),
                "False" => Ok(Expr::Literal(Node::Bool(false))),
                "None" => Ok(Expr::Literal(Node::Null)),
                CONVERTER_NAMESPACE if self.peek() == &Token::Dot => {
                    self.advance();
                    Ok(Expr::Name(self.identifier("a converter name")?))
                }
                keyword if KEYWORDS.contains(&keyword) => Err(ConversionError::syntax(
                    offset,
                    format!("unexpected keyword `{keyword}`"),
                )),
                _ => Ok(Expr::Name(name)),
            },
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                while !self.eat(&Token::RBracket) {
                    items.push(self.expression()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RBracket, "`,` or `]`")?;
                        break;
                    }
                }
                Ok(Expr::List(items))
            }
            Token::LBrace => {
                let mut entries = Vec::new();
                while !self.eat(&Token::RBrace) {
                    let key = self.expression()?;
                    self.expect(&Token::Colon, "`:` in dict literal")?;
                    let value = self.expression()?;
                    entries.push((key, value));
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RBrace, "`,` or `}`")?;
                        break;
                    }
                }
                Ok(Expr::Dict(entries))
            }
            other => Err(ConversionError::syntax(
                offset,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
