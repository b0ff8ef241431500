use std::collections::HashSet;
use std::ops::Range;

use crate::body::{Attribute, Block, Body};
use crate::parser::error::ParseError;
use crate::parser::expression;
use crate::parser::lexer::{SpannedToken, TemplateChunk, Token};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a token stream into the root body of a document.
pub(crate) fn parse_body(
    tokens: &[SpannedToken],
    source_len: usize,
    file_id: usize,
) -> Result<Body, Vec<ParseError>> {
    let mut state = ParseState::new(tokens, source_len, file_id);
    let body = state.parse_body(None);
    state.finalize(body)
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    source_len: usize,
    file_id: usize,
    errors: Vec<ParseError>,
}

impl<'a> ParseState<'a> {
    fn new(tokens: &'a [SpannedToken], source_len: usize, file_id: usize) -> Self {
        ParseState {
            tokens,
            pos: 0,
            source_len,
            file_id,
            errors: Vec::new(),
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

    /// Byte offset of the next token, or end of input.
    fn here(&self) -> usize {
        self.peek().map(|t| t.span.start).unwrap_or(self.source_len)
    }

    /// Byte offset just past the previous token.
    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn error(&mut self, message: impl Into<String>, span: Range<usize>) {
        self.errors
            .push(ParseError::error(message, span, self.file_id));
    }

    /// Skip the rest of a malformed line. Stops before a `}` that would close
    /// the enclosing body so the block structure survives the error.
    fn recover_to_line_end(&mut self) {
        let mut depth = 0u32;
        while let Some(token) = self.peek_token() {
            match token {
                Token::Newline if depth == 0 => return,
                Token::RBrace if depth == 0 => return,
                Token::LBrace | Token::LParen | Token::LBrack => depth += 1,
                Token::RBrace | Token::RParen | Token::RBrack => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Parse a body. `open_brace` is the span of the `{` that started it, or
    /// None for the document root.
    fn parse_body(&mut self, open_brace: Option<&Range<usize>>) -> Body {
        let start = self.here();
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut blocks = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            let Some(token) = self.peek() else {
                break;
            };

            match &token.token {
                Token::Newline => {
                    self.pos += 1;
                }

                Token::RBrace => {
                    if open_brace.is_some() {
                        break;
                    }
                    self.error("unexpected `}`", token.span.clone());
                    self.pos += 1;
                }

                Token::Ident(name) => {
                    let name_span = token.span.clone();
                    self.pos += 1;
                    if self.peek_token() == Some(&Token::Eq) {
                        self.pos += 1;
                        let Some(attribute) = self.parse_attribute(name, name_span) else {
                            continue;
                        };
                        if seen.contains(&attribute.name) {
                            self.errors.push(
                                ParseError::error(
                                    format!("duplicate attribute `{}`", attribute.name),
                                    attribute.span.clone(),
                                    self.file_id,
                                )
                                .with_note("each attribute may be defined only once per body"),
                            );
                        } else {
                            seen.insert(attribute.name.clone());
                            attributes.push(attribute);
                        }
                    } else if let Some(block) = self.parse_block(name, name_span) {
                        blocks.push(block);
                    }
                }

                other => {
                    let message = format!("expected attribute or block, found {}", other.describe());
                    self.error(message, token.span.clone());
                    self.pos += 1;
                    self.recover_to_line_end();
                }
            }
        }

        Body {
            attributes,
            blocks,
            span: start..self.here().max(start),
        }
    }

    /// Parse `= expression` (the `=` already consumed) up to the end of line.
    fn parse_attribute(&mut self, name: &str, name_span: Range<usize>) -> Option<Attribute> {
        let expr_start = self.pos;
        let mut depth = 0u32;
        while let Some(token) = self.peek_token() {
            match token {
                Token::Newline | Token::RBrace if depth == 0 => break,
                Token::LBrace | Token::LParen | Token::LBrack => depth += 1,
                Token::RBrace | Token::RParen | Token::RBrack => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }

        // Newlines are insignificant inside brackets
        let expr_tokens: Vec<SpannedToken> = self.tokens[expr_start..self.pos]
            .iter()
            .filter(|t| t.token != Token::Newline)
            .cloned()
            .collect();
        let span = name_span.start..self.last_end().max(name_span.end);

        if expr_tokens.is_empty() {
            self.error(format!("missing value for attribute `{}`", name), span);
            return None;
        }

        match expression::parse_expression(&expr_tokens, span.clone(), self.file_id) {
            Ok(expr) => Some(Attribute {
                name: name.to_string(),
                expr,
                span,
            }),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Parse `label* { body }` after a block type identifier.
    fn parse_block(&mut self, kind: &str, kind_span: Range<usize>) -> Option<Block> {
        let mut labels = Vec::new();
        loop {
            match self.peek_token() {
                Some(Token::Ident(label)) => {
                    labels.push(label.clone());
                    self.pos += 1;
                }
                Some(Token::Template(chunks)) => {
                    let token = self.peek().map(|t| t.span.clone()).unwrap_or_default();
                    match literal_label(chunks) {
                        Some(label) => labels.push(label),
                        None => self.error("block labels cannot contain interpolations", token),
                    }
                    self.pos += 1;
                }
                _ => break,
            }
        }

        let open_brace = match self.peek() {
            Some(SpannedToken {
                token: Token::LBrace,
                span,
            }) => span.clone(),
            Some(other) => {
                let message = format!(
                    "expected `=` or `{{` after `{}`, found {}",
                    kind,
                    other.token.describe()
                );
                self.error(message, other.span.clone());
                self.recover_to_line_end();
                return None;
            }
            None => {
                let message = format!("expected `=` or `{{` after `{}`, found end of input", kind);
                self.error(message, kind_span);
                return None;
            }
        };
        self.pos += 1;

        let body = self.parse_body(Some(&open_brace));

        match self.advance() {
            Some(SpannedToken {
                token: Token::RBrace,
                ..
            }) => {}
            _ => {
                self.errors.push(
                    ParseError::error(
                        format!("unclosed block `{}`", kind),
                        open_brace.clone(),
                        self.file_id,
                    )
                    .with_note("expected a matching `}`"),
                );
            }
        }

        Some(Block {
            kind: kind.to_string(),
            labels,
            body,
            span: kind_span.start..self.last_end(),
            kind_span,
        })
    }

    fn finalize(self, body: Body) -> Result<Body, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(body)
        } else {
            let mut errors = self.errors;
            errors.sort_by_key(|e| e.span.start);
            Err(errors)
        }
    }
}

fn literal_label(chunks: &[TemplateChunk]) -> Option<String> {
    let mut label = String::new();
    for chunk in chunks {
        match chunk {
            TemplateChunk::Literal(s) => label.push_str(s),
            TemplateChunk::Interpolation(..) => return None,
        }
    }
    Some(label)
}
