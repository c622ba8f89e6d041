use std::fmt::Display;

use crate::compile::lex::{Lexer, Token};
use crate::types::ast;
use crate::types::span::Span;
use crate::{Engine, Error, Result};

/// A parser that constructs an AST from a token stream.
///
/// The parser is implemented as a simple hand written parser with no recursion.
/// It sometimes needs to peek at the next token to know how to proceed and uses
/// the `peeked` buffer to do this.
pub struct Parser<'engine, 'source> {
    /// A lexer that tokenizes the template source.
    tokens: Lexer<'engine, 'source>,

    /// Remember a peeked value, even if it was `None`
    peeked: Option<Option<(Token, Span)>>,
}

/// A partial section statement.
struct Open {
    /// Whether this is an inverted section.
    inverted: bool,
    /// The variable that opened the section.
    var: ast::Var,
    /// The span of the opening tag.
    span: Span,
}

/// A parsed tag definition.
enum Tag {
    Emit(ast::Var, bool),
    Open(bool, ast::Var),
    Close(ast::Var),
    Partial(ast::Name),
    Comment,
}

impl<'engine, 'source> Parser<'engine, 'source> {
    /// Construct a new parser.
    pub fn new(engine: &'engine Engine, source: &'source str) -> Self {
        Self {
            tokens: Lexer::new(engine, source),
            peeked: None,
        }
    }

    /// Parses a template.
    ///
    /// This function works using two stacks:
    /// - A stack of open sections e.g. `{{# items }}`.
    /// - A stack of scopes which collect each parsed statement.
    pub fn parse_template(mut self) -> Result<ast::Template> {
        let mut sections: Vec<Open> = vec![];
        let mut scopes = vec![ast::Scope::new()];

        while let Some(next) = self.next()? {
            let stmt = match next {
                // Simply raw template, emit a single statement for it.
                (Token::Raw, span) => ast::Stmt::Raw(span),

                // An unescaped variable, e.g. `{{{ content }}}`
                (Token::BeginRaw, _) => {
                    let var = self.parse_var()?;
                    self.expect(Token::EndRaw)?;
                    ast::Stmt::Emit(ast::Emit {
                        var,
                        escape: false,
                    })
                }

                // Any other tag, e.g. `{{ user.name }}` or `{{# items }}`
                (Token::BeginTag, begin) => {
                    let tag = self.parse_tag()?;
                    let end = self.expect(Token::EndTag)?;
                    let span = begin.combine(end);

                    match tag {
                        Tag::Emit(var, escape) => ast::Stmt::Emit(ast::Emit { var, escape }),

                        Tag::Comment => continue,

                        Tag::Partial(name) => ast::Stmt::Partial(ast::Partial { name }),

                        // The start of a section. For example:
                        //
                        //   {{# items }}
                        //
                        // We must push to the section stack and a scope to
                        // the scope stack because a section starts a new
                        // scope.
                        Tag::Open(inverted, var) => {
                            sections.push(Open {
                                inverted,
                                var,
                                span,
                            });
                            scopes.push(ast::Scope::new());
                            continue;
                        }

                        // The end of a section. For example:
                        //
                        //   {{/ items }}
                        //
                        // We expect that the last open section was opened
                        // with the same variable.
                        Tag::Close(close) => {
                            let open = sections.pop().ok_or_else(|| {
                                let found = &self.source()[close.span];
                                Error::syntax(
                                    format!("unexpected section close `{found}`"),
                                    self.source(),
                                    span,
                                )
                            })?;
                            let expected = &self.source()[open.var.span];
                            let found = &self.source()[close.span];
                            if expected != found {
                                return Err(Error::syntax(
                                    format!("expected section close `{expected}`, found `{found}`"),
                                    self.source(),
                                    close.span,
                                ));
                            }
                            let body = scopes.pop().ok_or_else(|| {
                                Error::syntax("unbalanced section", self.source(), span)
                            })?;
                            ast::Stmt::Section(ast::Section {
                                inverted: open.inverted,
                                var: open.var,
                                body,
                            })
                        }
                    }
                }

                (tk, span) => {
                    return Err(self.err_unexpected_token("raw template or tag", tk, span));
                }
            };
            self.push_stmt(&mut scopes, stmt)?;
        }

        if let Some(open) = sections.first() {
            let name = &self.source()[open.var.span];
            return Err(Error::syntax(
                format!("unclosed section `{name}`"),
                self.source(),
                open.span,
            ));
        }

        match (scopes.pop(), scopes.is_empty()) {
            (Some(scope), true) => Ok(ast::Template { scope }),
            _ => Err(Error::syntax(
                "unbalanced section",
                self.source(),
                self.source().len()..self.source().len(),
            )),
        }
    }

    /// Parses the inside of a single tag. All of the following are valid.
    ///
    ///   user.name
    ///
    ///   # items
    ///
    ///   ^ items
    ///
    ///   / items
    ///
    ///   & content
    ///
    ///   > header
    ///
    ///   ! a comment
    ///
    fn parse_tag(&mut self) -> Result<Tag> {
        let tag = match self.peek()? {
            Some((Token::Hash, _)) => {
                self.expect(Token::Hash)?;
                Tag::Open(false, self.parse_var()?)
            }
            Some((Token::Caret, _)) => {
                self.expect(Token::Caret)?;
                Tag::Open(true, self.parse_var()?)
            }
            Some((Token::Slash, _)) => {
                self.expect(Token::Slash)?;
                Tag::Close(self.parse_var()?)
            }
            Some((Token::Ampersand, _)) => {
                self.expect(Token::Ampersand)?;
                Tag::Emit(self.parse_var()?, false)
            }
            Some((Token::Gt, _)) => {
                self.expect(Token::Gt)?;
                let span = self.expect(Token::Name)?;
                Tag::Partial(ast::Name { span })
            }
            Some((Token::Bang, _)) => {
                self.expect(Token::Bang)?;
                if self.is_next(Token::Raw)? {
                    self.expect(Token::Raw)?;
                }
                Tag::Comment
            }
            _ => Tag::Emit(self.parse_var()?, true),
        };
        Ok(tag)
    }

    /// Parses a variable specification.
    ///
    ///    .
    ///
    ///    user
    ///
    ///    user.names.0
    ///
    fn parse_var(&mut self) -> Result<ast::Var> {
        let (first, span) = match self.parse()? {
            (Token::Dot, span) => {
                return Ok(ast::Var {
                    path: Vec::new(),
                    span,
                })
            }
            (Token::Ident, span) => (ast::Key::Map(ast::Ident { span }), span),
            (Token::Index, span) => (self.parse_index(span)?, span),
            (tk, span) => {
                return Err(self.err_unexpected_token("identifier or `.`", tk, span));
            }
        };

        let mut path = vec![first];
        let mut span = span;
        while self.is_next(Token::Dot)? {
            self.expect(Token::Dot)?;
            let key = self.parse_key()?;
            span = span.combine(key.span());
            path.push(key);
        }
        Ok(ast::Var { path, span })
    }

    /// Parses a path segment which is either an index or an identifier.
    ///
    ///   users
    ///
    ///   2
    ///
    fn parse_key(&mut self) -> Result<ast::Key> {
        match self.parse()? {
            (Token::Index, span) => self.parse_index(span),
            (Token::Ident, span) => Ok(ast::Key::Map(ast::Ident { span })),
            (tk, span) => Err(self.err_unexpected_token("identifier or index", tk, span)),
        }
    }

    fn parse_index(&self, span: Span) -> Result<ast::Key> {
        let value = self.source()[span].parse().map_err(|_| {
            Error::syntax(
                format!(
                    "base 10 literal out of range for unsigned {}-bit integer",
                    usize::BITS
                ),
                self.source(),
                span,
            )
        })?;
        Ok(ast::Key::List(ast::Index { value, span }))
    }

    fn push_stmt(&self, scopes: &mut [ast::Scope], stmt: ast::Stmt) -> Result<()> {
        match scopes.last_mut() {
            Some(scope) => {
                scope.stmts.push(stmt);
                Ok(())
            }
            None => Err(Error::syntax(
                "unbalanced section",
                self.source(),
                self.source().len()..self.source().len(),
            )),
        }
    }

    /// Parses any token.
    fn parse(&mut self) -> Result<(Token, Span)> {
        match self.next()? {
            Some((tk, sp)) => Ok((tk, sp)),
            None => Err(self.err_unexpected_eof("token")),
        }
    }

    /// Parses the specified token and returns its span.
    fn expect(&mut self, exp: Token) -> Result<Span> {
        match self.next()? {
            Some((tk, span)) if tk == exp => Ok(span),
            Some((tk, span)) => Err(self.err_unexpected_token(exp.human(), tk, span)),
            None => Err(self.err_unexpected_eof(exp.human())),
        }
    }

    /// Returns `true` if the next token is equal to the provided one.
    fn is_next(&mut self, token: Token) -> Result<bool> {
        Ok(self.peek()?.map(|(tk, _)| tk == token).unwrap_or(false))
    }

    /// Returns a copy of the next token without affecting the result of the
    /// following `.next()` call.
    fn peek(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked {
            Some(peeked) => Ok(peeked),
            None => {
                let peeked = self.tokens.next()?;
                self.peeked = Some(peeked);
                Ok(peeked)
            }
        }
    }

    /// Returns the next token and span in the stream.
    fn next(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked.take() {
            Some(v) => Ok(v),
            None => self.tokens.next(),
        }
    }

    fn source(&self) -> &'source str {
        self.tokens.source
    }

    fn err_unexpected_eof(&self, exp: impl Display) -> Error {
        let n = self.source().len();
        Error::syntax(format!("expected {exp}, found EOF"), self.source(), n..n)
    }

    fn err_unexpected_token(&self, exp: impl Display, got: Token, span: Span) -> Error {
        let got = got.human();
        Error::syntax(format!("expected {exp}, found {got}"), self.source(), span)
    }
}
