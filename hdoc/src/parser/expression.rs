use std::ops::Range;

use crate::expression::{BinaryOperator, Expression, TemplatePart, UnaryOperator};
use crate::parser::error::ParseError;
use crate::parser::lexer::{self, SpannedToken, TemplateChunk, Token};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse the tokens on the right-hand side of an attribute.
/// `span` covers the whole attribute and is used for errors without a
/// more precise location.
pub(crate) fn parse_expression(
    tokens: &[SpannedToken],
    span: Range<usize>,
    file_id: usize,
) -> Result<Expression, ParseError> {
    let mut parser = ExprParser::new(tokens, span, file_id);
    let expr = parser.parse_expr(0)?;
    if let Some(extra) = parser.peek() {
        return Err(ParseError::error(
            format!("unexpected {} after expression", extra.token.describe()),
            extra.span.clone(),
            file_id,
        ));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Pratt parser
// ---------------------------------------------------------------------------

struct ExprParser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    span: Range<usize>,
    file_id: usize,
}

// Binding powers (precedence). Higher = tighter binding.
// Left bp, right bp. For left-assoc: right = left + 1. For right-assoc: right = left.
const BP_CONDITIONAL: u8 = 2;     // ? :
const BP_OR: u8 = 4;              // ||
const BP_AND: u8 = 6;             // &&
const BP_EQUALITY: u8 = 8;        // == !=
const BP_COMPARISON: u8 = 10;     // < > <= >=
const BP_ADDITIVE: u8 = 12;       // + -
const BP_MULTIPLICATIVE: u8 = 14; // * / %
const BP_UNARY: u8 = 16;          // ! -

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [SpannedToken], span: Range<usize>, file_id: usize) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            span,
            file_id,
        }
    }

    fn peek(&self) -> Option<&'a SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<&'a SpannedToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        let span = self
            .peek()
            .map(|t| t.span.clone())
            .unwrap_or_else(|| self.span.end..self.span.end);
        ParseError::error(msg, span, self.file_id)
    }

    fn expect(&mut self, expected: Token) -> Result<&'a SpannedToken, ParseError> {
        match self.peek() {
            Some(t) if t.token == expected => {
                self.pos += 1;
                Ok(t)
            }
            Some(t) => Err(self.error(format!(
                "expected {}, found {}",
                expected.describe(),
                t.token.describe()
            ))),
            None => Err(self.error(format!(
                "expected {}, found end of expression",
                expected.describe()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Pratt parser core
    // ------------------------------------------------------------------

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_postfix()?;

        loop {
            let Some(token) = self.peek_token() else { break };
            let Some((l_bp, r_bp)) = infix_bp(token) else { break };

            if l_bp < min_bp {
                break;
            }

            // Special case: conditional operator (?)
            if *token == Token::Question {
                self.pos += 1;
                let true_branch = self.parse_expr(0)?;
                self.expect(Token::Colon)?;
                let false_branch = self.parse_expr(r_bp)?;
                left = Expression::Conditional {
                    condition: Box::new(left),
                    true_branch: Box::new(true_branch),
                    false_branch: Box::new(false_branch),
                };
                continue;
            }

            let operator = match token {
                Token::Plus => BinaryOperator::Addition,
                Token::Minus => BinaryOperator::Subtraction,
                Token::Star => BinaryOperator::Multiplication,
                Token::Slash => BinaryOperator::Division,
                Token::Percent => BinaryOperator::Modulo,
                Token::EqEq => BinaryOperator::Equality,
                Token::BangEq => BinaryOperator::Inequality,
                Token::Gt => BinaryOperator::GreaterThan,
                Token::Lt => BinaryOperator::LessThan,
                Token::GtEq => BinaryOperator::GreaterThanOrEqual,
                Token::LtEq => BinaryOperator::LessThanOrEqual,
                Token::AmpAmp => BinaryOperator::LogicalAnd,
                Token::PipePipe => BinaryOperator::LogicalOr,
                _ => return Err(self.error("unexpected infix operator")),
            };
            self.pos += 1;
            let right = self.parse_expr(r_bp)?;

            left = Expression::BinaryOperation {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// A prefix expression followed by any number of `[index]` suffixes.
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let start = self.peek().map(|t| t.span.start).unwrap_or(self.span.end);
        let mut expr = self.parse_prefix()?;
        while self.peek_token() == Some(&Token::LBrack) {
            self.pos += 1;
            let key = self.parse_expr(0)?;
            let close = self.expect(Token::RBrack)?;
            expr = Expression::Index {
                collection: Box::new(expr),
                key: Box::new(key),
                span: start..close.span.end,
            };
        }
        Ok(expr)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let token = self
            .advance()
            .ok_or_else(|| self.error("unexpected end of expression"))?;

        match &token.token {
            Token::Number(n) => Ok(Expression::NumberLiteral(*n)),
            Token::Template(chunks) => self.parse_template(chunks),

            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expression::BooleanLiteral(true)),
                "false" => Ok(Expression::BooleanLiteral(false)),
                "null" => Ok(Expression::NullLiteral),
                _ if self.peek_token() == Some(&Token::LParen) => {
                    self.pos += 1;
                    let args = self.parse_sequence(Token::RParen)?;
                    Ok(Expression::FunctionCall {
                        name: name.clone(),
                        args,
                        span: token.span.start..self.last_end(),
                    })
                }
                _ => Ok(Expression::VariableReference(
                    name.clone(),
                    token.span.clone(),
                )),
            },

            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }

            Token::LBrack => {
                let items = self.parse_sequence(Token::RBrack)?;
                Ok(Expression::Tuple(items))
            }

            Token::Minus => {
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expression::UnaryOperation {
                    operator: UnaryOperator::Negation,
                    operand: Box::new(operand),
                })
            }
            Token::Bang => {
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expression::UnaryOperation {
                    operator: UnaryOperator::LogicalNot,
                    operand: Box::new(operand),
                })
            }

            other => Err(ParseError::error(
                format!("expected expression, found {}", other.describe()),
                token.span.clone(),
                self.file_id,
            )),
        }
    }

    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(self.span.end)
    }

    /// Comma-separated expressions up to `close` (already past the opener).
    /// A trailing comma is allowed.
    fn parse_sequence(&mut self, close: Token) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.peek_token() == Some(&close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_expr(0)?);
            match self.peek_token() {
                Some(Token::Comma) => {
                    self.pos += 1;
                }
                Some(t) if *t == close => {}
                _ => {
                    return Err(self.error(format!("expected `,` or {}", close.describe())));
                }
            }
        }
    }

    fn parse_template(&self, chunks: &[TemplateChunk]) -> Result<Expression, ParseError> {
        if let [TemplateChunk::Literal(s)] = chunks {
            return Ok(Expression::StringLiteral(s.clone()));
        }

        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match chunk {
                TemplateChunk::Literal(s) => parts.push(TemplatePart::Literal(s.clone())),
                TemplateChunk::Interpolation(raw, offset) => {
                    let span = *offset..*offset + raw.len();
                    let (tokens, errors) = lexer::tokenize(raw, *offset, self.file_id);
                    if let Some(error) = errors.into_iter().next() {
                        return Err(error);
                    }
                    if tokens.is_empty() {
                        return Err(ParseError::error(
                            "empty template interpolation",
                            span,
                            self.file_id,
                        ));
                    }
                    let expr = parse_expression(&tokens, span, self.file_id)?;
                    parts.push(TemplatePart::Interpolation(expr));
                }
            }
        }
        Ok(Expression::Template(parts))
    }
}

/// Infix binding powers: returns (left_bp, right_bp) or None if not infix.
fn infix_bp(token: &Token) -> Option<(u8, u8)> {
    match token {
        Token::Question => Some((BP_CONDITIONAL, BP_CONDITIONAL)),
        Token::PipePipe => Some((BP_OR, BP_OR + 1)),
        Token::AmpAmp => Some((BP_AND, BP_AND + 1)),
        Token::EqEq | Token::BangEq => Some((BP_EQUALITY, BP_EQUALITY + 1)),
        Token::Gt | Token::Lt | Token::GtEq | Token::LtEq => {
            Some((BP_COMPARISON, BP_COMPARISON + 1))
        }
        Token::Plus | Token::Minus => Some((BP_ADDITIVE, BP_ADDITIVE + 1)),
        Token::Star | Token::Slash | Token::Percent => {
            Some((BP_MULTIPLICATIVE, BP_MULTIPLICATIVE + 1))
        }
        _ => None,
    }
}
