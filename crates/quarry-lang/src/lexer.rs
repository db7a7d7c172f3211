//! Lexer for clause text using logos.
//!
//! Word keywords are matched case-insensitively, so `NOT LIKE` and `not like`
//! are the same clause. Identifiers stay case-sensitive; canonicalizing field
//! names against a catalog is the caller's concern.

use crate::span::Span;
use logos::Logos;

/// Token types for filter and sort clause text.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Keyword operators
    #[token("in", ignore(ascii_case))]
    In,
    #[token("like", ignore(ascii_case))]
    Like,
    #[token("is", ignore(ascii_case))]
    Is,
    #[token("not", ignore(ascii_case))]
    Not,

    // Sort directions
    #[token("asc", ignore(ascii_case))]
    Asc,
    #[token("desc", ignore(ascii_case))]
    Desc,

    // Literal keywords
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,
    #[token("null", ignore(ascii_case))]
    Null,

    // Comparison operators
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Logical operators
    #[token("&&")]
    #[token("and", ignore(ascii_case))]
    And,
    #[token("||")]
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("!")]
    Bang,

    // Identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // String literal (double-quoted)
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        let inner = &s[1..s.len()-1];
        unescape_string(inner)
    })]
    String(String),

    // String literal (single-quoted)
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        let inner = &s[1..s.len()-1];
        unescape_string(inner)
    })]
    StringSingle(String),

    // Integer literal
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    // Float literal
    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Punctuation
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

/// Resolve backslash escapes inside a quoted literal. An unknown escape keeps
/// the backslash, so `\%` survives for the like matcher to interpret.
fn unescape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            let resolved = match c {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                '\\' | '"' | '\'' => c,
                other => {
                    out.push('\\');
                    other
                }
            };
            out.push(resolved);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    if escaped {
        out.push('\\');
    }
    out
}

/// A token with its span in the clause text.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer that produces spanned tokens.
///
/// A character outside the grammar ends the stream and is remembered as
/// [`invalid_span`](Self::invalid_span); the parser turns it into an error
/// instead of silently dropping it.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<SpannedToken>>,
    invalid: Option<Span>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given clause text.
    pub fn new(source: &'source str) -> Self {
        Lexer {
            inner: Token::lexer(source),
            peeked: None,
            invalid: None,
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Option<&SpannedToken> {
        if self.peeked.is_none() {
            let next = self.next_inner();
            self.peeked = Some(next);
        }
        match &self.peeked {
            Some(Some(tok)) => Some(tok),
            _ => None,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Option<SpannedToken> {
        match self.peeked.take() {
            Some(slot) => slot,
            None => self.next_inner(),
        }
    }

    fn next_inner(&mut self) -> Option<SpannedToken> {
        if self.invalid.is_some() {
            return None;
        }
        match self.inner.next() {
            Some(Ok(token)) => Some(SpannedToken {
                token,
                span: self.inner.span().into(),
            }),
            Some(Err(())) => {
                self.invalid = Some(self.inner.span().into());
                None
            }
            None => None,
        }
    }

    /// Span of the first character the lexer could not tokenize, if any.
    pub fn invalid_span(&self) -> Option<Span> {
        self.invalid
    }

    /// Get the current position in the clause text.
    pub fn span(&self) -> Span {
        self.inner.span().into()
    }

    /// Get the clause text.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl Iterator for Lexer<'_> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize clause text into a vector of spanned tokens.
pub fn tokenize(source: &str) -> Vec<SpannedToken> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_clause() {
        let tokens = tokenize(r#"status == "active""#);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token, Token::Ident("status".to_string()));
        assert_eq!(tokens[1].token, Token::Eq);
        assert_eq!(tokens[2].token, Token::String("active".to_string()));
    }

    #[test]
    fn test_dotted_path() {
        let tokens = tokenize("department.name != 'Sales'");
        assert_eq!(tokens[0].token, Token::Ident("department".to_string()));
        assert_eq!(tokens[1].token, Token::Dot);
        assert_eq!(tokens[2].token, Token::Ident("name".to_string()));
        assert_eq!(tokens[3].token, Token::Ne);
        assert_eq!(tokens[4].token, Token::StringSingle("Sales".to_string()));
    }

    #[test]
    fn test_operator_symbols() {
        let ops: Vec<Token> = tokenize("<= >= < > == != && || !")
            .into_iter()
            .map(|t| t.token)
            .collect();
        assert_eq!(
            ops,
            vec![
                Token::Le,
                Token::Ge,
                Token::Lt,
                Token::Gt,
                Token::Eq,
                Token::Ne,
                Token::And,
                Token::Or,
                Token::Bang,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("a NOT LIKE '%x%' AND b IS NULL");
        assert_eq!(tokens[1].token, Token::Not);
        assert_eq!(tokens[2].token, Token::Like);
        assert_eq!(tokens[4].token, Token::And);
        assert_eq!(tokens[6].token, Token::Is);
        assert_eq!(tokens[7].token, Token::Null);
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        // "inactive" starts with "in" but is a plain identifier.
        let tokens = tokenize("inactive == true");
        assert_eq!(tokens[0].token, Token::Ident("inactive".to_string()));
        assert_eq!(tokens[2].token, Token::True);
    }

    #[test]
    fn test_signed_numbers() {
        let tokens = tokenize("limit 40 -8 0.25 -19.5");
        assert_eq!(tokens[1].token, Token::Int(40));
        assert_eq!(tokens[2].token, Token::Int(-8));
        assert_eq!(tokens[3].token, Token::Float(0.25));
        assert_eq!(tokens[4].token, Token::Float(-19.5));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"'O\'Brien' "line\nbreak" '\%literal'"#);
        assert_eq!(tokens[0].token, Token::StringSingle("O'Brien".to_string()));
        assert_eq!(tokens[1].token, Token::String("line\nbreak".to_string()));
        // Unknown escapes keep the backslash for the like matcher.
        assert_eq!(tokens[2].token, Token::StringSingle("\\%literal".to_string()));
    }

    #[test]
    fn test_invalid_character_ends_stream() {
        let mut lexer = Lexer::new("total == 10 @");
        let tokens: Vec<_> = (&mut lexer).collect();
        assert_eq!(tokens.len(), 3);
        let invalid = lexer.invalid_span().unwrap();
        assert_eq!(invalid.start, 12);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("price desc");
        for _ in 0..2 {
            let peeked = lexer.peek().map(|t| t.token.clone());
            assert_eq!(peeked, Some(Token::Ident("price".to_string())));
        }
        assert_eq!(
            lexer.next_token().map(|t| t.token),
            Some(Token::Ident("price".to_string()))
        );
        assert_eq!(lexer.next_token().map(|t| t.token), Some(Token::Desc));
        assert!(lexer.next_token().is_none());
    }
}
