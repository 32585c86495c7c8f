//! Marks and ordered mark sets carried by text runs.

use crate::model::attrs::Attrs;
use crate::schema::MarkTypeId;

/// One mark instance: a type tag plus parsed attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    ty: MarkTypeId,
    attrs: Attrs,
}

impl Mark {
    /// Builds a mark without attribute validation.
    ///
    /// Prefer [`crate::schema::Schema::mark`] for user-provided attributes.
    pub(crate) fn new(ty: MarkTypeId, attrs: Attrs) -> Self {
        Self { ty, attrs }
    }

    pub fn type_id(&self) -> MarkTypeId {
        self.ty
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }
}

/// Mark set sorted by mark type id, at most one mark per non-stacking type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    pub fn has_type(&self, ty: MarkTypeId) -> bool {
        self.0.iter().any(|mark| mark.ty == ty)
    }

    pub fn find(&self, ty: MarkTypeId) -> Option<&Mark> {
        self.0.iter().find(|mark| mark.ty == ty)
    }

    /// Returns a set with `mark` added.
    ///
    /// `excludes(a, b)` answers whether mark type `a` excludes type `b`.
    /// Marks that the new mark excludes are evicted; if an existing mark
    /// excludes the new one, the set is returned unchanged.
    pub fn add<F>(&self, mark: Mark, excludes: F) -> MarkSet
    where
        F: Fn(MarkTypeId, MarkTypeId) -> bool,
    {
        let mut next = Vec::with_capacity(self.0.len() + 1);
        let mut placed = false;
        for other in &self.0 {
            if *other == mark {
                return self.clone();
            }
            if excludes(mark.ty, other.ty) {
                continue;
            }
            if excludes(other.ty, mark.ty) {
                return self.clone();
            }
            if !placed && other.ty > mark.ty {
                next.push(mark.clone());
                placed = true;
            }
            next.push(other.clone());
        }
        if !placed {
            next.push(mark);
        }
        MarkSet(next)
    }

    /// Returns a set without marks equal to `mark`.
    pub fn remove(&self, mark: &Mark) -> MarkSet {
        MarkSet(self.0.iter().filter(|m| *m != mark).cloned().collect())
    }

    /// Returns a set without any mark of type `ty`.
    pub fn remove_type(&self, ty: MarkTypeId) -> MarkSet {
        MarkSet(self.0.iter().filter(|m| m.ty != ty).cloned().collect())
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Mark, MarkSet};
    use crate::model::attrs::{attrs, Attrs};
    use crate::schema::MarkTypeId;

    // type 3 excludes everything, like inline code
    fn excludes(a: MarkTypeId, b: MarkTypeId) -> bool {
        a == b || a == MarkTypeId(3)
    }

    fn mark(ty: u16) -> Mark {
        Mark::new(MarkTypeId(ty), Attrs::new())
    }

    #[test]
    fn add_keeps_type_order() {
        let set = MarkSet::new().add(mark(2), excludes).add(mark(0), excludes);
        let order: Vec<_> = set.iter().map(Mark::type_id).collect();
        assert_eq!(order, vec![MarkTypeId(0), MarkTypeId(2)]);
    }

    #[test]
    fn add_replaces_same_type_with_different_attrs() {
        let first = Mark::new(MarkTypeId(5), attrs([("note_title", "A")]));
        let second = Mark::new(MarkTypeId(5), attrs([("note_title", "B")]));
        let set = MarkSet::new().add(first, excludes).add(second.clone(), excludes);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&second));
    }

    #[test]
    fn exclusive_mark_evicts_and_blocks() {
        let with_code = MarkSet::new().add(mark(0), excludes).add(mark(3), excludes);
        assert_eq!(with_code.len(), 1);
        assert!(with_code.has_type(MarkTypeId(3)));

        let blocked = with_code.add(mark(1), excludes);
        assert_eq!(blocked, with_code);
    }

    #[test]
    fn remove_type_drops_all_marks_of_type() {
        let set = MarkSet::new().add(mark(0), excludes).add(mark(1), excludes);
        assert!(!set.remove_type(MarkTypeId(0)).has_type(MarkTypeId(0)));
        assert_eq!(set.remove(&mark(1)).len(), 1);
    }
}
