//! Open slices: fragments cut out of a document.

use crate::model::fragment::Fragment;

/// A fragment with the depths at which its edges are open.
///
/// `open_start == 1` means the first child is an unfinished node whose
/// content continues whatever sits before the insertion point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slice {
    content: Fragment,
    open_start: usize,
    open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Closed slice holding the given fragment.
    pub fn closed(content: Fragment) -> Self {
        Self::new(content, 0, 0)
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn open_start(&self) -> usize {
        self.open_start
    }

    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// Number of positions the slice adds when inserted.
    pub fn size(&self) -> usize {
        self.content
            .size()
            .saturating_sub(self.open_start + self.open_end)
    }

    pub fn is_empty(&self) -> bool {
        self.content.size() == 0
    }
}
