use crate::types::span::Span;
use crate::types::syntax::Kind;
use crate::{Engine, Error, Result};

/// A lexer that tokenizes the template source into distinct chunks so that the
/// parser doesn't have to operate on raw text.
///
/// The lexer is implemented as a fallible iterator. The parser should
/// repeatedly call the [`.next()?`][Lexer::next] method to return the next
/// non-whitespace token until [`None`] is returned.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Lexer<'engine, 'source> {
    /// A reference to the engine containing the syntax searcher.
    engine: &'engine Engine,

    /// The original template source.
    pub source: &'source str,

    /// A cursor over the template source.
    cursor: usize,

    /// The current state of the lexer.
    state: State,

    /// A buffer to store the next token.
    next: Option<(Token, Span)>,
}

/// The state of the lexer.
///
/// The lexer requires state because the tokenization is different when
/// tokenizing text between tags, e.g. `{{# user }}`, `{{! comment }}` or
/// `{{> partial }}`.
#[derive(Clone, Copy)]
#[cfg_attr(internal_debug, derive(Debug))]
enum State {
    /// Within raw template.
    Template,

    /// Between tags.
    Tag {
        /// The span of the begin tag.
        begin: Span,
        /// The end token we are expecting.
        end: Token,
        /// Whether no token other than whitespace has been lexed in this tag.
        first: bool,
    },

    /// Between tags after a `!`.
    Comment {
        /// The span of the begin tag.
        begin: Span,
        /// The end token we are expecting.
        end: Token,
    },

    /// Between tags after a `>`.
    Partial {
        /// The span of the begin tag.
        begin: Span,
        /// The end token we are expecting.
        end: Token,
    },
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Raw template
    Raw,
    /// Begin tag, e.g. `{{`
    BeginTag,
    /// End tag, e.g. `}}`
    EndTag,
    /// Begin unescaped tag, e.g. `{{{`
    BeginRaw,
    /// End unescaped tag, e.g. `}}}`
    EndRaw,
    /// `#`
    Hash,
    /// `^`
    Caret,
    /// `/`
    Slash,
    /// `&`
    Ampersand,
    /// `>`
    Gt,
    /// `!`
    Bang,
    /// `.`
    Dot,
    /// Sequence of tabs, spaces and line breaks
    Whitespace,
    /// A map key
    Ident,
    /// An index into a list
    Index,
    /// A template name after `>`
    Name,
}

impl<'engine, 'source> Lexer<'engine, 'source> {
    /// Construct a new lexer.
    pub fn new(engine: &'engine Engine, source: &'source str) -> Self {
        Self {
            engine,
            source,
            cursor: 0,
            state: State::Template,
            next: None,
        }
    }

    /// Returns the next non-whitespace token and its span.
    pub fn next(&mut self) -> Result<Option<(Token, Span)>> {
        loop {
            match self.lex()? {
                Some((tk, sp)) if !tk.is_whitespace() => return Ok(Some((tk, sp))),
                None => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Returns the next token and span.
    fn lex(&mut self) -> Result<Option<(Token, Span)>> {
        if let Some(next) = self.next.take() {
            return Ok(Some(next));
        }

        let i = self.cursor;

        if self.source[i..].is_empty() {
            return Ok(None);
        }

        match self.state {
            State::Template => Ok(self.lex_template(i)),
            State::Tag { begin, end, first } => self.lex_tag(begin, end, first, i),
            State::Comment { begin, end } => self.lex_comment(begin, end, i),
            State::Partial { begin, end } => self.lex_partial(begin, end, i),
        }
    }

    fn lex_template(&mut self, i: usize) -> Option<(Token, Span)> {
        // We are within raw template, that means all we have to do is
        // find the next begin tag from `i`. The following diagram helps
        // describe the variable naming.
        //
        // xxxxxxx{{xxxxxxxxx
        //    ^   ^ ^
        //    i   j k

        match self.engine.searcher.find_begin(self.source, i) {
            Some((kind, j, k)) => {
                let tk = Token::from_kind(kind);
                let begin = Span::from(j..k);
                self.cursor = k;
                self.state = State::Tag {
                    begin,
                    end: tk.pair(),
                    first: true,
                };
                if i == j {
                    // The current cursor is exactly at the tag.
                    Some((tk, begin))
                } else {
                    // We must first emit the raw token, so we store the
                    // begin tag token in the `next` buffer.
                    self.next = Some((tk, begin));
                    Some((Token::Raw, Span::from(i..j)))
                }
            }
            None => {
                let j = self.source.len();
                self.cursor = j;
                Some((Token::Raw, Span::from(i..j)))
            }
        }
    }

    fn lex_tag(
        &mut self,
        begin: Span,
        end: Token,
        first: bool,
        i: usize,
    ) -> Result<Option<(Token, Span)>> {
        // We are between two tags {{ ... }} or {{{ ... }}} that means we
        // must parse tag relevant tokens and also lookout for the
        // corresponding end tag `end`.

        if let Some(j) = self.engine.searcher.end_at(self.source, i, end.kind()) {
            // A matching end tag! Update the state and return the token.
            self.state = State::Template;
            self.cursor = j;
            return Ok(Some((end, Span::from(i..j))));
        }

        if self.engine.searcher.begin_at(self.source, i).is_some() {
            return Err(self.err_unclosed(begin, end));
        }

        // We iterate over chars because that is nicer than operating on
        // raw bytes. The map call here fixes the index to be relative
        // to the actual template source.
        let mut iter = self.source[i..].char_indices().map(|(d, c)| (i + d, c));

        // There is always at least one character remaining because the
        // cursor is not at the end of the source.
        let Some((i, c)) = iter.next() else {
            return Ok(None);
        };

        let sigils = first && end == Token::EndTag;

        let (tk, j) = match c {
            // Sigils are only valid directly after the begin tag.
            '#' if sigils => (Token::Hash, i + 1),
            '^' if sigils => (Token::Caret, i + 1),
            '/' if sigils => (Token::Slash, i + 1),
            '&' if sigils => (Token::Ampersand, i + 1),
            '>' if sigils => (Token::Gt, i + 1),
            '!' if sigils => (Token::Bang, i + 1),

            '.' => (Token::Dot, i + 1),
            c if c.is_ascii_digit() => self.lex_index(iter),
            c if is_whitespace(c) => self.lex_whitespace(iter),
            c if is_ident_start(c) => self.lex_ident(iter),

            // Any other character...
            _ => {
                return Err(self.err_unexpected_character(i..(i + c.len_utf8())));
            }
        };

        self.state = match tk {
            Token::Bang => State::Comment { begin, end },
            Token::Gt => State::Partial { begin, end },
            Token::Whitespace => State::Tag { begin, end, first },
            _ => State::Tag {
                begin,
                end,
                first: false,
            },
        };

        // Finally, we need to update the cursor.
        self.cursor = j;

        Ok(Some((tk, Span::from(i..j))))
    }

    fn lex_comment(&mut self, begin: Span, end: Token, i: usize) -> Result<Option<(Token, Span)>> {
        // We are between two tags {{! ... }}, that means all we have to do is
        // find the corresponding end tag. The following diagram helps
        // describe the variable naming.
        //
        // x{{!cccccc}}xxxxxx
        //     ^     ^ ^
        //     i     j k

        match self.engine.searcher.find_close(self.source, i) {
            Some((j, k)) => {
                self.cursor = k;
                self.state = State::Template;
                let tag = (end, Span::from(j..k));
                if i == j {
                    // The current cursor is exactly at the end tag.
                    Ok(Some(tag))
                } else {
                    // We must first emit the raw token, so we store the end tag
                    // token in the `next` buffer.
                    self.next = Some(tag);
                    Ok(Some((Token::Raw, Span::from(i..j))))
                }
            }
            None => Err(self.err_unclosed(begin, end)),
        }
    }

    fn lex_partial(&mut self, begin: Span, end: Token, i: usize) -> Result<Option<(Token, Span)>> {
        // We are between two tags {{> ... }}, the partial name is any run of
        // characters up until whitespace or the end tag.

        if let Some(j) = self.engine.searcher.end_at(self.source, i, end.kind()) {
            self.state = State::Template;
            self.cursor = j;
            return Ok(Some((end, Span::from(i..j))));
        }

        if self.engine.searcher.begin_at(self.source, i).is_some() {
            return Err(self.err_unclosed(begin, end));
        }

        let iter = self.source[i..].char_indices().map(|(d, c)| (i + d, c));
        let starts_with_whitespace = self.source[i..].starts_with(is_whitespace);
        let (tk, j) = if starts_with_whitespace {
            self.lex_whitespace(iter)
        } else {
            let j = iter
                .take_while(|&(at, c)| {
                    !is_whitespace(c)
                        && self
                            .engine
                            .searcher
                            .end_at(self.source, at, end.kind())
                            .is_none()
                        && self.engine.searcher.begin_at(self.source, at).is_none()
                })
                .last()
                .map(|(at, c)| at + c.len_utf8())
                .unwrap_or(i);
            (Token::Name, j)
        };

        self.cursor = j;
        Ok(Some((tk, Span::from(i..j))))
    }

    fn lex_index<I>(&mut self, iter: I) -> (Token, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        (Token::Index, self.lex_while(iter, is_index))
    }

    fn lex_whitespace<I>(&mut self, iter: I) -> (Token, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        (Token::Whitespace, self.lex_while(iter, is_whitespace))
    }

    fn lex_ident<I>(&mut self, iter: I) -> (Token, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        (Token::Ident, self.lex_while(iter, is_ident))
    }

    fn lex_while<I, P>(&mut self, mut iter: I, pred: P) -> usize
    where
        I: Iterator<Item = (usize, char)> + Clone,
        P: Fn(char) -> bool,
    {
        loop {
            match iter.clone().next() {
                Some((_, c)) if pred(c) => {
                    iter.next();
                }
                Some((j, _)) => return j,
                None => return self.source.len(),
            }
        }
    }

    fn err_unclosed(&self, begin: Span, end: Token) -> Error {
        let begin_tk = end.pair().human();
        Error::syntax(format!("unclosed {begin_tk}"), self.source, begin)
    }

    fn err_unexpected_character(&self, span: impl Into<Span>) -> Error {
        Error::syntax("unexpected character", self.source, span)
    }
}

impl Token {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Raw => "raw template",
            Self::BeginTag => "begin tag",
            Self::EndTag => "end tag",
            Self::BeginRaw => "begin unescaped tag",
            Self::EndRaw => "end unescaped tag",
            Self::Hash => "section",
            Self::Caret => "inverted section",
            Self::Slash => "section close",
            Self::Ampersand => "ampersand",
            Self::Gt => "partial",
            Self::Bang => "comment",
            Self::Dot => "member access operator",
            Self::Whitespace => "whitespace",
            Self::Ident => "identifier",
            Self::Index => "index",
            Self::Name => "template name",
        }
    }

    /// Returns the corresponding tag if this token is a tag.
    fn pair(&self) -> Self {
        match self {
            Self::BeginTag => Self::EndTag,
            Self::EndTag => Self::BeginTag,
            Self::BeginRaw => Self::EndRaw,
            Self::EndRaw => Self::BeginRaw,
            _ => unreachable!("not a tag"),
        }
    }

    fn kind(&self) -> Kind {
        match self {
            Self::BeginTag => Kind::BeginTag,
            Self::EndTag => Kind::EndTag,
            Self::BeginRaw => Kind::BeginRaw,
            Self::EndRaw => Kind::EndRaw,
            _ => unreachable!("not a tag"),
        }
    }

    fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }

    fn from_kind(kind: Kind) -> Self {
        match kind {
            Kind::BeginTag => Self::BeginTag,
            Kind::EndTag => Self::EndTag,
            Kind::BeginRaw => Self::BeginRaw,
            Kind::EndRaw => Self::EndRaw,
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | ' ')
}

#[cfg(feature = "unicode")]
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
fn is_ident(c: char) -> bool {
    c == '-' || unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(not(feature = "unicode"))]
fn is_ident(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_' | '-')
}

fn is_index(c: char) -> bool {
    c.is_ascii_digit()
}
