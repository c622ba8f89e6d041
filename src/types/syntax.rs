/// The template syntax configuration.
///
/// Use [`Syntax::default()`] to get the default `{{ }}` tags and
/// [`Syntax::builder()`] to configure different tag delimiters.
///
/// The unescaped variable tag is always derived from the configured
/// delimiters by adding a brace on the inside, e.g. `{{{ content }}}` for the
/// default syntax or `<%{ content }%>` for `<%` and `%>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub(crate) open: String,
    pub(crate) close: String,
}

/// A builder for the syntax configuration.
///
/// This struct is typically created using [`Syntax::builder()`].
#[derive(Debug, Clone)]
pub struct SyntaxBuilder {
    tags: Option<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    BeginTag,
    EndTag,
    BeginRaw,
    EndRaw,
}

impl Default for Syntax {
    /// Returns the default syntax configuration.
    ///
    /// This is equivalent to the following.
    /// ```
    /// use hotpage::Syntax;
    ///
    /// let syntax = Syntax::builder().tags("{{", "}}").build();
    /// assert_eq!(syntax, Syntax::default());
    /// ```
    #[inline]
    fn default() -> Self {
        Syntax::builder().tags("{{", "}}").build()
    }
}

impl Syntax {
    /// Create a new syntax builder.
    ///
    /// # Examples
    ///
    /// ```
    /// let syntax = hotpage::Syntax::builder().tags("<%", "%>").build();
    /// ```
    #[inline]
    pub fn builder() -> SyntaxBuilder {
        SyntaxBuilder::new()
    }
}

impl SyntaxBuilder {
    /// Creates a new syntax builder.
    #[inline]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { tags: None }
    }

    /// Set the tag delimiters.
    ///
    /// # Panics
    ///
    /// If either of the strings are empty.
    #[inline]
    pub fn tags(&mut self, open: &str, close: &str) -> &mut Self {
        assert!(!open.is_empty() && !close.is_empty());
        self.tags = Some((open.into(), close.into()));
        self
    }

    /// Builds the syntax configuration.
    pub fn build(&self) -> Syntax {
        let (open, close) = self
            .tags
            .clone()
            .unwrap_or_else(|| ("{{".into(), "}}".into()));
        Syntax { open, close }
    }
}
