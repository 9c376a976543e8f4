//! Path segments with lazily synchronized raw and parsed forms.

use crate::grammar;
use std::cell::RefCell;
use std::fmt;

/// Raw text of a placeholder segment
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone)]
struct SegmentForms {
    raw: String,
    text: String,
    predicate: Option<String>,
    needs_parse: bool,
    needs_render: bool,
}

impl SegmentForms {
    fn check_parse(&mut self) {
        if self.needs_parse {
            let (text, predicate) = grammar::split_segment(&self.raw);
            self.text = text;
            self.predicate = predicate;
            self.needs_parse = false;
        }
    }

    fn check_render(&mut self) {
        if self.needs_render {
            self.raw = grammar::render_segment(&self.text, self.predicate.as_deref());
            self.needs_render = false;
        }
    }
}

/// One `text(predicate)` path segment.
///
/// The raw form (`accounts('A')`) and the parsed form (`accounts`, `'A'`)
/// are cached; whichever was written last is authoritative and the other is
/// recomputed on first read.
pub struct PathSegment {
    forms: RefCell<SegmentForms>,
}

impl PathSegment {
    /// Segment with text only
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_predicate(text, None::<String>)
    }

    /// Segment from parsed parts
    pub fn with_predicate(text: impl Into<String>, predicate: Option<impl Into<String>>) -> Self {
        Self {
            forms: RefCell::new(SegmentForms {
                raw: String::new(),
                text: text.into(),
                predicate: predicate.map(Into::into),
                needs_parse: false,
                needs_render: true,
            }),
        }
    }

    /// Segment from its raw form, parsed on first access
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            forms: RefCell::new(SegmentForms {
                raw: raw.into(),
                text: String::new(),
                predicate: None,
                needs_parse: true,
                needs_render: false,
            }),
        }
    }

    /// Filler for positions nobody has set. Renders as `-`, the protocol's
    /// "default" marker, so the path keeps its shape when re-parsed.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER)
    }

    pub fn text(&self) -> String {
        let mut forms = self.forms.borrow_mut();
        forms.check_parse();
        forms.text.clone()
    }

    pub fn predicate(&self) -> Option<String> {
        let mut forms = self.forms.borrow_mut();
        forms.check_parse();
        forms.predicate.clone()
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate().is_some()
    }

    /// Rendered `text(predicate)` form
    pub fn raw(&self) -> String {
        let mut forms = self.forms.borrow_mut();
        forms.check_render();
        forms.raw.clone()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let forms = self.forms.get_mut();
        forms.check_parse();
        forms.text = text.into();
        forms.needs_render = true;
    }

    pub fn set_predicate(&mut self, predicate: Option<impl Into<String>>) {
        let forms = self.forms.get_mut();
        forms.check_parse();
        forms.predicate = predicate.map(Into::into);
        forms.needs_render = true;
    }

    pub fn set_raw(&mut self, raw: impl Into<String>) {
        let forms = self.forms.get_mut();
        forms.raw = raw.into();
        forms.needs_parse = true;
        forms.needs_render = false;
    }

    /// Whether this segment equals `text` (case-insensitive), ignoring predicate
    pub fn is(&self, text: &str) -> bool {
        self.text().eq_ignore_ascii_case(text)
    }
}

impl Clone for PathSegment {
    fn clone(&self) -> Self {
        Self {
            forms: RefCell::new(self.forms.borrow().clone()),
        }
    }
}

impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        self.text() == other.text() && self.predicate() == other.predicate()
    }
}

impl Eq for PathSegment {}

impl fmt::Debug for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSegment")
            .field("text", &self.text())
            .field("predicate", &self.predicate())
            .finish()
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw())
    }
}

impl From<&str> for PathSegment {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}
