//! Recursive descent parser for filter and sort clauses.

use crate::ast::{ClauseExpr, ComparisonOp, FieldPath, Literal, SortDirection, SortKey};
use crate::error::ClauseError;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::span::Span;

/// Parse filter clause text into an expression.
pub fn parse_filter(source: &str) -> Result<ClauseExpr, ClauseError> {
    Parser::new(source).parse_filter()
}

/// Parse sort clause text into an ordered key list.
pub fn parse_sort(source: &str) -> Result<Vec<SortKey>, ClauseError> {
    Parser::new(source).parse_sort()
}

/// Parser for clause text.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given clause text.
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Parse a complete filter expression.
    pub fn parse_filter(&mut self) -> Result<ClauseExpr, ClauseError> {
        let expr = self.parse_or()?;
        self.expect_end()?;
        Ok(expr)
    }

    /// Parse a complete sort key list.
    pub fn parse_sort(&mut self) -> Result<Vec<SortKey>, ClauseError> {
        let mut keys = vec![self.parse_sort_key()?];

        while let Some(tok) = self.lexer.peek() {
            if tok.token != Token::Comma {
                break;
            }
            self.next_token()?; // consume comma
            keys.push(self.parse_sort_key()?);
        }

        self.expect_end()?;
        Ok(keys)
    }

    /// Parse one sort key: a field path with an optional direction.
    fn parse_sort_key(&mut self) -> Result<SortKey, ClauseError> {
        let path = self.parse_field_path()?;

        let direction = match self.lexer.peek().map(|t| &t.token) {
            Some(Token::Asc) => {
                self.next_token()?;
                SortDirection::Asc
            }
            Some(Token::Desc) => {
                self.next_token()?;
                SortDirection::Desc
            }
            _ => SortDirection::default(),
        };

        Ok(SortKey { path, direction })
    }

    /// Parse OR expressions.
    fn parse_or(&mut self) -> Result<ClauseExpr, ClauseError> {
        let mut left = self.parse_and()?;

        while let Some(tok) = self.lexer.peek() {
            if tok.token != Token::Or {
                break;
            }
            self.next_token()?; // consume ||

            let right = self.parse_and()?;
            left = match left {
                ClauseExpr::Or(mut exprs) => {
                    exprs.push(right);
                    ClauseExpr::Or(exprs)
                }
                _ => ClauseExpr::Or(vec![left, right]),
            };
        }

        Ok(left)
    }

    /// Parse AND expressions.
    fn parse_and(&mut self) -> Result<ClauseExpr, ClauseError> {
        let mut left = self.parse_unary()?;

        while let Some(tok) = self.lexer.peek() {
            if tok.token != Token::And {
                break;
            }
            self.next_token()?; // consume &&

            let right = self.parse_unary()?;
            left = match left {
                ClauseExpr::And(mut exprs) => {
                    exprs.push(right);
                    ClauseExpr::And(exprs)
                }
                _ => ClauseExpr::And(vec![left, right]),
            };
        }

        Ok(left)
    }

    /// Parse negation, parentheses, or a predicate.
    fn parse_unary(&mut self) -> Result<ClauseExpr, ClauseError> {
        match self.lexer.peek().map(|t| &t.token) {
            Some(Token::Bang) => {
                self.next_token()?; // consume !
                let inner = self.parse_unary()?;
                Ok(ClauseExpr::Not(Box::new(inner)))
            }
            Some(Token::LParen) => {
                self.next_token()?; // consume (
                let inner = self.parse_or()?;
                self.expect_token(Token::RParen)?;
                Ok(inner)
            }
            _ => self.parse_predicate(),
        }
    }

    /// Parse a predicate: comparison, like, in, or null check.
    fn parse_predicate(&mut self) -> Result<ClauseExpr, ClauseError> {
        let field = self.parse_field_path()?;

        let op_tok = match self.lexer.peek() {
            Some(tok) => tok,
            None => {
                return Err(self.end_of_input("expected comparison operator"));
            }
        };

        match &op_tok.token {
            // Comparison operators
            Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge => {
                let op = match self.next_token()?.token {
                    Token::Eq => ComparisonOp::Eq,
                    Token::Ne => ComparisonOp::Ne,
                    Token::Lt => ComparisonOp::Lt,
                    Token::Le => ComparisonOp::Le,
                    Token::Gt => ComparisonOp::Gt,
                    Token::Ge => ComparisonOp::Ge,
                    _ => unreachable!(),
                };
                let value = self.parse_literal()?;
                Ok(ClauseExpr::Comparison { field, op, value })
            }

            // IS NULL / IS NOT NULL
            Token::Is => {
                self.next_token()?; // consume 'is'

                let negated = if let Some(tok) = self.lexer.peek() {
                    if tok.token == Token::Not {
                        self.next_token()?;
                        true
                    } else {
                        false
                    }
                } else {
                    false
                };

                let null_tok = self.next_token()?;
                if null_tok.token != Token::Null {
                    return Err(ClauseError::new(
                        format!("expected 'null' after 'is', found {:?}", null_tok.token),
                        null_tok.span,
                    ));
                }

                Ok(ClauseExpr::IsNull { field, negated })
            }

            // IN
            Token::In => {
                self.next_token()?; // consume 'in'
                let values = self.parse_list_literal()?;
                Ok(ClauseExpr::In {
                    field,
                    values,
                    negated: false,
                })
            }

            // NOT IN / NOT LIKE
            Token::Not => {
                self.next_token()?; // consume 'not'
                let next = self.next_token()?;
                match next.token {
                    Token::In => {
                        let values = self.parse_list_literal()?;
                        Ok(ClauseExpr::In {
                            field,
                            values,
                            negated: true,
                        })
                    }
                    Token::Like => {
                        let pattern = self.parse_string_literal()?;
                        Ok(ClauseExpr::Like {
                            field,
                            pattern,
                            negated: true,
                        })
                    }
                    _ => Err(ClauseError::new(
                        format!("expected 'in' or 'like' after 'not', found {:?}", next.token),
                        next.span,
                    )),
                }
            }

            // LIKE
            Token::Like => {
                self.next_token()?; // consume 'like'
                let pattern = self.parse_string_literal()?;
                Ok(ClauseExpr::Like {
                    field,
                    pattern,
                    negated: false,
                })
            }

            _ => Err(ClauseError::new(
                format!("expected comparison operator, found {:?}", op_tok.token),
                op_tok.span,
            )),
        }
    }

    /// Parse a dotted field path.
    fn parse_field_path(&mut self) -> Result<FieldPath, ClauseError> {
        let first = self.expect_ident()?;
        let mut span = first.1;
        let mut segments = vec![first.0];

        while let Some(tok) = self.lexer.peek() {
            if tok.token != Token::Dot {
                break;
            }
            self.next_token()?; // consume dot

            let segment = self.expect_ident()?;
            span = span.merge(segment.1);
            segments.push(segment.0);
        }

        Ok(FieldPath::new(segments, span))
    }

    /// Parse a list literal [value, ...].
    fn parse_list_literal(&mut self) -> Result<Vec<Literal>, ClauseError> {
        self.expect_token(Token::LBracket)?;
        let mut values = Vec::new();

        // Handle empty list
        if let Some(tok) = self.lexer.peek() {
            if tok.token == Token::RBracket {
                self.next_token()?;
                return Ok(values);
            }
        }

        values.push(self.parse_literal()?);

        while let Some(tok) = self.lexer.peek() {
            if tok.token == Token::RBracket {
                break;
            }
            self.expect_token(Token::Comma)?;
            values.push(self.parse_literal()?);
        }

        self.expect_token(Token::RBracket)?;
        Ok(values)
    }

    /// Parse a literal value.
    fn parse_literal(&mut self) -> Result<Literal, ClauseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::Null => Ok(Literal::Null),
            Token::True => Ok(Literal::Bool(true)),
            Token::False => Ok(Literal::Bool(false)),
            Token::Int(i) => Ok(Literal::Int(i)),
            Token::Float(f) => Ok(Literal::Float(f)),
            Token::String(s) | Token::StringSingle(s) => Ok(Literal::String(s)),
            _ => Err(ClauseError::new(
                format!("expected literal value, found {:?}", tok.token),
                tok.span,
            )),
        }
    }

    /// Parse a string literal specifically.
    fn parse_string_literal(&mut self) -> Result<String, ClauseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::String(s) | Token::StringSingle(s) => Ok(s),
            _ => Err(ClauseError::new(
                format!("expected string literal, found {:?}", tok.token),
                tok.span,
            )
            .with_hint("like patterns are string literals, e.g. '%abc%'")),
        }
    }

    /// Expect and consume an identifier, returning it with its span.
    fn expect_ident(&mut self) -> Result<(String, Span), ClauseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::Ident(name) => Ok((name, tok.span)),
            _ => Err(ClauseError::new(
                format!("expected identifier, found {:?}", tok.token),
                tok.span,
            )),
        }
    }

    /// Expect and consume a specific token.
    fn expect_token(&mut self, expected: Token) -> Result<SpannedToken, ClauseError> {
        let tok = self.next_token()?;
        if std::mem::discriminant(&tok.token) == std::mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ClauseError::new(
                format!("expected {:?}, found {:?}", expected, tok.token),
                tok.span,
            ))
        }
    }

    /// Get the next token or report why the stream ended.
    fn next_token(&mut self) -> Result<SpannedToken, ClauseError> {
        match self.lexer.next_token() {
            Some(tok) => Ok(tok),
            None => Err(self.end_of_input("unexpected end of input")),
        }
    }

    /// Require that all input has been consumed.
    fn expect_end(&mut self) -> Result<(), ClauseError> {
        if let Some(tok) = self.lexer.peek() {
            return Err(ClauseError::new(
                format!("unexpected trailing input: {:?}", tok.token),
                tok.span,
            ));
        }
        if self.lexer.invalid_span().is_some() {
            return Err(self.invalid_character());
        }
        Ok(())
    }

    fn end_of_input(&self, message: &str) -> ClauseError {
        if self.lexer.invalid_span().is_some() {
            self.invalid_character()
        } else {
            ClauseError::new(message, self.lexer.span())
        }
    }

    fn invalid_character(&self) -> ClauseError {
        // invalid_span is always set when this is reached
        let span = self.lexer.invalid_span().unwrap_or_default();
        let err = ClauseError::new("invalid character in clause text", span);
        if self.lexer.source().get(span.start..span.end) == Some("=") {
            err.with_hint("use '==' for equality comparison")
        } else {
            err
        }
    }
}
