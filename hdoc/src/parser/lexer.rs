use std::ops::Range;

use logos::{FilterResult, Lexer, Logos};

use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// Tokens of the document language.
///
/// The lexer's extras hold the byte offset of the lexed text within the
/// file, so interpolations re-tokenized from inside a string still point
/// into the original source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(extras = usize)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"(#|//)[^\n]*")]
pub(crate) enum Token {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", number)]
    Number(f64),

    /// A quoted string, split into literal text and raw `${...}` sources.
    #[token("\"", template)]
    Template(Vec<TemplateChunk>),

    #[token("\n")]
    Newline,

    /// `/* ... */`, consumed by its callback and never emitted.
    #[token("/*", block_comment)]
    BlockComment,

    // Operators
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token(">=")]
    GtEq,
    #[token("<=")]
    LtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    // Grouping
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateChunk {
    Literal(String),
    /// Unparsed interpolation source and the byte offset where it starts.
    Interpolation(String, usize),
}

#[derive(Debug, Clone)]
pub(crate) struct SpannedToken {
    pub token: Token,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum LexError {
    #[default]
    UnexpectedCharacter,
    InvalidNumber,
    InvalidEscape(char),
    UnterminatedString,
    UnterminatedInterpolation,
    UnterminatedComment,
}

impl LexError {
    fn message(&self, slice: &str) -> String {
        match self {
            LexError::UnexpectedCharacter => format!("unexpected character `{}`", slice),
            LexError::InvalidNumber => format!("invalid number `{}`", slice),
            LexError::InvalidEscape(c) => format!("invalid escape `\\{}`", c),
            LexError::UnterminatedString => "unterminated string".to_string(),
            LexError::UnterminatedInterpolation => {
                "unterminated template interpolation".to_string()
            }
            LexError::UnterminatedComment => "unterminated comment".to_string(),
        }
    }
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{}`", name),
            Token::Number(n) => format!("number `{}`", n),
            Token::Template(_) => "string".to_string(),
            Token::Newline => "newline".to_string(),
            Token::BlockComment => "comment".to_string(),
            Token::Eq => "`=`".to_string(),
            Token::EqEq => "`==`".to_string(),
            Token::BangEq => "`!=`".to_string(),
            Token::Gt => "`>`".to_string(),
            Token::Lt => "`<`".to_string(),
            Token::GtEq => "`>=`".to_string(),
            Token::LtEq => "`<=`".to_string(),
            Token::AmpAmp => "`&&`".to_string(),
            Token::PipePipe => "`||`".to_string(),
            Token::Bang => "`!`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Slash => "`/`".to_string(),
            Token::Percent => "`%`".to_string(),
            Token::Question => "`?`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBrack => "`[`".to_string(),
            Token::RBrack => "`]`".to_string(),
            Token::LBrace => "`{`".to_string(),
            Token::RBrace => "`}`".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Tokenize `text`, whose first byte sits at `base_offset` in the file.
///
/// Lexing never stops early: a bad character is reported and skipped, so the
/// structural pass still sees the rest of the document.
pub(crate) fn tokenize(
    text: &str,
    base_offset: usize,
    file_id: usize,
) -> (Vec<SpannedToken>, Vec<ParseError>) {
    let mut tokens: Vec<SpannedToken> = Vec::new();
    let mut errors = Vec::new();
    let mut lex = Token::lexer_with_extras(text, base_offset);

    while let Some(result) = lex.next() {
        let span = base_offset + lex.span().start..base_offset + lex.span().end;
        match result {
            // Collapse blank lines into a single separator
            Ok(Token::Newline)
                if matches!(tokens.last(), Some(last) if last.token == Token::Newline) => {}
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(error) => errors.push(ParseError::error(error.message(lex.slice()), span, file_id)),
        }
    }

    (tokens, errors)
}

fn number(lex: &mut Lexer<'_, Token>) -> Result<f64, LexError> {
    lex.slice().parse().map_err(|_| LexError::InvalidNumber)
}

fn block_comment(lex: &mut Lexer<'_, Token>) -> FilterResult<(), LexError> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(LexError::UnterminatedComment)
        }
    }
}

/// Scan the rest of a quoted string. On error the string is consumed up to
/// its closing quote, or to the end of the line when there is none.
fn template(lex: &mut Lexer<'_, Token>) -> Result<Vec<TemplateChunk>, LexError> {
    let rest = lex.remainder();
    let body_start = lex.extras + lex.span().end;
    let mut chunks = Vec::new();
    let mut literal = String::new();
    let mut error = None;
    let mut chars = rest.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                lex.bump(i + 1);
                if let Some(error) = error {
                    return Err(error);
                }
                if !literal.is_empty() || chunks.is_empty() {
                    chunks.push(TemplateChunk::Literal(literal));
                }
                return Ok(chunks);
            }
            '\n' => break,
            '\\' => match chars.next() {
                Some((_, 'n')) => literal.push('\n'),
                Some((_, 't')) => literal.push('\t'),
                Some((_, 'r')) => literal.push('\r'),
                Some((_, '"')) => literal.push('"'),
                Some((_, '\\')) => literal.push('\\'),
                Some((_, '\n')) | None => break,
                Some((_, other)) => {
                    error.get_or_insert(LexError::InvalidEscape(other));
                }
            },
            // `$${` is a literal `${`
            '$' if rest[i + 1..].starts_with("${") => {
                chars.nth(1);
                literal.push_str("${");
            }
            '$' if rest[i + 1..].starts_with('{') => {
                let inner = i + 2;
                let Some(len) = interpolation_len(&rest[inner..]) else {
                    lex.bump(rest.find('\n').unwrap_or(rest.len()));
                    return Err(LexError::UnterminatedInterpolation);
                };
                if !literal.is_empty() {
                    chunks.push(TemplateChunk::Literal(std::mem::take(&mut literal)));
                }
                chunks.push(TemplateChunk::Interpolation(
                    rest[inner..inner + len].to_string(),
                    body_start + inner,
                ));
                let close = inner + len;
                while chars.next_if(|(j, _)| *j <= close).is_some() {}
            }
            other => literal.push(other),
        }
    }

    lex.bump(rest.find('\n').unwrap_or(rest.len()));
    Err(LexError::UnterminatedString)
}

/// Byte length of an interpolation body up to its closing `}`, skipping
/// nested braces and quoted strings. None at end of line or input.
fn interpolation_len(text: &str) -> Option<usize> {
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            '\n' => return None,
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}
