//! Owned DOM snapshots handed out by page sessions.
//!
//! An [`Element`] stores the outer HTML of the node it was taken from and
//! re-parses it on each query. `scraper::Html` is not `Send`, so holding the
//! parsed tree across an `.await` is not an option; the snapshot keeps
//! elements movable between tasks and lets tests build them from plain HTML.

use scraper::{ElementRef, Html, Selector};

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    html: String,
    is_document: bool,
}

impl Element {
    /// Wraps a single element's outer HTML, e.g. `<li class="card">..</li>`.
    #[must_use]
    pub fn from_fragment(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            is_document: false,
        }
    }

    /// Wraps a whole page. Queries search the entire document.
    #[must_use]
    pub fn from_document(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            is_document: true,
        }
    }

    /// All descendants matching `css`, in document order. The element itself
    /// is never part of the result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSelector`] if `css` does not parse.
    pub fn find_all(&self, css: &str) -> Result<Vec<Element>, SessionError> {
        let selector = parse_selector(css)?;
        Ok(self.with_node(|node| {
            node.select(&selector)
                .filter(|el| *el != node)
                .map(|el| Element::from_fragment(el.html()))
                .collect()
        }))
    }

    /// First descendant matching `css`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSelector`] if `css` does not parse.
    pub fn find(&self, css: &str) -> Result<Option<Element>, SessionError> {
        let selector = parse_selector(css)?;
        Ok(self.with_node(|node| {
            node.select(&selector)
                .find(|el| *el != node)
                .map(|el| Element::from_fragment(el.html()))
        }))
    }

    /// Text content with runs of whitespace collapsed to single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.with_node(|node| {
            let raw: String = node.text().collect();
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        })
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_node(|node| node.value().attr(name).map(str::to_string))
    }

    fn with_node<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> R {
        if self.is_document {
            let doc = Html::parse_document(&self.html);
            f(doc.root_element())
        } else {
            let doc = Html::parse_fragment(&self.html);
            let root = doc.root_element();
            // Fragment parsing wraps the input in a synthetic <html> element.
            let node = root.children().find_map(ElementRef::wrap).unwrap_or(root);
            f(node)
        }
    }
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, SessionError> {
    Selector::parse(css).map_err(|e| SessionError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}
