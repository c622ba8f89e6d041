use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::types::span::Span;

/// An error that can occur during template compilation or rendering.
pub struct Error {
    kind: ErrorKind,
    name: Option<String>,
    reason: Option<String>,
    pretty: Option<ErrorPretty>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The template source could not be compiled.
    Syntax,
    /// The template could not be rendered against the given context.
    Render,
    /// A value could not be formatted.
    Format,
    /// Writing the rendered output failed.
    Io,
    /// The context could not be converted into a [`Value`][crate::Value].
    Serialize,
    /// Partials were nested deeper than the engine allows.
    MaxIncludeDepth,
}

/// The line and column information for a span in the template source.
struct ErrorPretty {
    line: String,
    ln: usize,
    col: usize,
    width: usize,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            name: None,
            reason: None,
            pretty: None,
            source: None,
        }
    }

    /// Constructs a new syntax error.
    pub(crate) fn syntax(reason: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self {
            reason: Some(reason.into()),
            pretty: Some(ErrorPretty::new(source, span.into())),
            ..Self::new(ErrorKind::Syntax)
        }
    }

    /// Constructs a new render error.
    pub(crate) fn render(reason: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self {
            reason: Some(reason.into()),
            pretty: Some(ErrorPretty::new(source, span.into())),
            ..Self::new(ErrorKind::Render)
        }
    }

    /// Constructs a new format error, attaching the location of the tag that
    /// was being emitted.
    pub(crate) fn format(err: crate::fmt::Error, source: &str, span: impl Into<Span>) -> Self {
        Self {
            reason: err.message(),
            pretty: Some(ErrorPretty::new(source, span.into())),
            ..Self::new(ErrorKind::Format)
        }
    }

    /// Constructs an error that occurs when partials are nested too deeply.
    pub(crate) fn max_include_depth(max: usize) -> Self {
        Self {
            reason: Some(format!(
                "reached the maximum partial depth ({max}), this could be due to a recursive partial"
            )),
            ..Self::new(ErrorKind::MaxIncludeDepth)
        }
    }

    /// Constructs an error that occurs when converting a context to a value.
    pub(crate) fn serialize(err: serde_json::Error) -> Self {
        Self {
            reason: Some(err.to_string()),
            source: Some(Box::new(err)),
            ..Self::new(ErrorKind::Serialize)
        }
    }

    /// Attach the template name to the error if it doesn't have one yet.
    pub(crate) fn with_template_name(mut self, name: impl Into<String>) -> Self {
        if self.name.is_none() {
            self.name = Some(name.into());
        }
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if the template source could not be compiled.
    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }

    /// Returns the name of the template that caused the error, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the human readable reason for the error, if there is one.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the one-based line and column of the error in the template
    /// source, if known.
    pub fn location(&self) -> Option<(usize, usize)> {
        self.pretty.as_ref().map(|p| (p.ln, p.col + 1))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            source: Some(Box::new(err)),
            ..Self::new(ErrorKind::Io)
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self {
            reason: Some(String::from("failed to write to the output buffer")),
            ..Self::new(ErrorKind::Format)
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn StdError + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pretty.is_some() {
            write!(f, "{self:#}")
        } else {
            f.debug_struct("Error")
                .field("kind", &self.kind)
                .field("name", &self.name)
                .field("reason", &self.reason)
                .field("source", &self.source)
                .finish()
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.kind {
            ErrorKind::Syntax => "invalid syntax",
            ErrorKind::Render => "failed to render",
            ErrorKind::Format => "failed to format",
            ErrorKind::Io => "io error",
            ErrorKind::Serialize => "failed to serialize value",
            ErrorKind::MaxIncludeDepth => "maximum partial depth exceeded",
        };

        match (&self.pretty, f.alternate()) {
            (Some(pretty), true) => {
                let name = self.name.as_deref().unwrap_or("<anonymous>");
                let reason = self.reason.as_deref().unwrap_or("");
                writeln!(f, "{msg}")?;
                fmt_pretty(pretty, name, reason, f)
            }
            _ => match (&self.reason, &self.source) {
                (Some(reason), _) => write!(f, "{msg}: {reason}"),
                (None, Some(source)) => write!(f, "{msg}: {source}"),
                (None, None) => write!(f, "{msg}"),
            },
        }
    }
}

impl ErrorPretty {
    fn new(source: &str, span: Span) -> Self {
        let offset = span.m.min(source.len());
        let start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = source[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(source.len());
        let line = source[start..end].trim_end_matches('\r');
        let ln = source[..start].matches('\n').count() + 1;
        let col = width(&source[start..offset]);
        let underline = &source[offset..span.n.clamp(offset, end)];
        Self {
            line: line.to_owned(),
            ln,
            col,
            width: width(underline).max(1),
        }
    }
}

fn fmt_pretty(p: &ErrorPretty, name: &str, reason: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let num = p.ln.to_string();
    let gutter = " ".repeat(num.len() + 1);
    let indent = " ".repeat(p.col);
    let underline = "^".repeat(p.width);
    writeln!(f, "{gutter}--> {name}:{}:{}", p.ln, p.col + 1)?;
    writeln!(f, "{gutter} |")?;
    writeln!(f, " {num} | {}", p.line)?;
    writeln!(f, "{gutter} | {indent}{underline}")?;
    writeln!(f, "{gutter} |")?;
    writeln!(f, "{gutter} = reason: {reason}")
}

#[cfg(feature = "unicode")]
fn width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn width(s: &str) -> usize {
    s.chars().count()
}
