use crate::types::syntax::{Kind, Syntax};

/// Finds tag delimiters in the template source.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Searcher {
    open: String,
    close: String,
}

impl Searcher {
    pub fn new(syntax: Syntax) -> Self {
        let Syntax { open, close } = syntax;
        Self { open, close }
    }

    /// Returns the next begin tag at or after `at`.
    ///
    /// An open delimiter directly followed by `{` is an unescaped tag.
    pub fn find_begin(&self, haystack: &str, at: usize) -> Option<(Kind, usize, usize)> {
        let j = at + haystack[at..].find(self.open.as_str())?;
        let k = j + self.open.len();
        if haystack[k..].starts_with('{') {
            Some((Kind::BeginRaw, j, k + 1))
        } else {
            Some((Kind::BeginTag, j, k))
        }
    }

    /// Returns the begin tag starting exactly at `at` if there is one.
    pub fn begin_at(&self, haystack: &str, at: usize) -> Option<(Kind, usize)> {
        let rest = haystack[at..].strip_prefix(self.open.as_str())?;
        let k = at + self.open.len();
        if rest.starts_with('{') {
            Some((Kind::BeginRaw, k + 1))
        } else {
            Some((Kind::BeginTag, k))
        }
    }

    /// Returns the end of the given end tag if it starts exactly at `at`.
    pub fn end_at(&self, haystack: &str, at: usize, kind: Kind) -> Option<usize> {
        let rest = &haystack[at..];
        match kind {
            Kind::EndTag if rest.starts_with(self.close.as_str()) => Some(at + self.close.len()),
            Kind::EndRaw if rest.starts_with('}') && rest[1..].starts_with(self.close.as_str()) => {
                Some(at + 1 + self.close.len())
            }
            _ => None,
        }
    }

    /// Returns the next close delimiter at or after `at`.
    pub fn find_close(&self, haystack: &str, at: usize) -> Option<(usize, usize)> {
        let j = at + haystack[at..].find(self.close.as_str())?;
        Some((j, j + self.close.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searcher_find_begin() {
        let s = Searcher::new(Syntax::default());
        assert_eq!(s.find_begin("lorem {{ ipsum", 0), Some((Kind::BeginTag, 6, 8)));
        assert_eq!(s.find_begin("lorem {{{ ipsum", 0), Some((Kind::BeginRaw, 6, 9)));
        assert_eq!(s.find_begin("lorem ipsum }}", 0), None);
    }

    #[test]
    fn searcher_begin_at() {
        let s = Searcher::new(Syntax::default());
        assert_eq!(s.begin_at("a {{ b", 2), Some((Kind::BeginTag, 4)));
        assert_eq!(s.begin_at("a {{{ b", 2), Some((Kind::BeginRaw, 5)));
        assert_eq!(s.begin_at("a {{ b", 0), None);
        assert_eq!(s.begin_at("a {{ b", 6), None);
    }

    #[test]
    fn searcher_end_at() {
        let s = Searcher::new(Syntax::default());
        assert_eq!(s.end_at("x}}}", 1, Kind::EndTag), Some(3));
        assert_eq!(s.end_at("x}}}", 1, Kind::EndRaw), Some(4));
        assert_eq!(s.end_at("x}}", 1, Kind::EndRaw), None);
    }

    #[test]
    fn searcher_custom_tags() {
        let s = Searcher::new(Syntax::builder().tags("<%", "%>").build());
        assert_eq!(s.find_begin("a <%{ b }%>", 0), Some((Kind::BeginRaw, 2, 5)));
        assert_eq!(s.end_at("a <%{ b }%>", 8, Kind::EndRaw), Some(11));
    }
}
