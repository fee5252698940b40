//! Specialized collection types

pub use slotmap::{SlotMap, new_key_type};

/// Previous/next indices stored alongside a record that lives in an
/// [`IndexList`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    prev: Option<usize>,
    next: Option<usize>,
}

/// Records that carry their own [`Links`]
pub trait Linked {
    /// Links of this record
    fn links(&self) -> &Links;

    /// Mutable links of this record
    fn links_mut(&mut self) -> &mut Links;
}

/// Intrusive doubly-linked list of indices into an external slice of
/// [`Linked`] records.
///
/// The list only stores head, tail and length; the links live in the
/// records, so several lists can partition one arena and records can move
/// between lists without allocation. A record must belong to at most one list
/// at a time; the list does not check membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexList {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl IndexList {
    /// Create an empty list
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of records in the list
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the first record
    pub const fn front(&self) -> Option<usize> {
        self.head
    }

    /// Index of the last record
    pub const fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Append `index` to the back of the list
    pub fn push_back<T: Linked>(&mut self, nodes: &mut [T], index: usize) {
        *nodes[index].links_mut() = Links {
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(tail) => nodes[tail].links_mut().next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Detach `index` from the list
    pub fn unlink<T: Linked>(&mut self, nodes: &mut [T], index: usize) {
        let Links { prev, next } = *nodes[index].links();
        match prev {
            Some(prev) => nodes[prev].links_mut().next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => nodes[next].links_mut().prev = prev,
            None => self.tail = prev,
        }
        *nodes[index].links_mut() = Links::default();
        self.len -= 1;
    }

    /// Detach and return the first record
    pub fn pop_front<T: Linked>(&mut self, nodes: &mut [T]) -> Option<usize> {
        let head = self.head?;
        self.unlink(nodes, head);
        Some(head)
    }

    /// Move every record of `other` to the back of this list in O(1),
    /// leaving `other` empty.
    pub fn append<T: Linked>(&mut self, nodes: &mut [T], other: &mut Self) {
        let (Some(other_head), Some(other_tail)) = (other.head, other.tail) else {
            return;
        };
        match self.tail {
            Some(tail) => {
                nodes[tail].links_mut().next = Some(other_head);
                nodes[other_head].links_mut().prev = Some(tail);
            }
            None => self.head = Some(other_head),
        }
        self.tail = Some(other_tail);
        self.len += other.len;
        *other = Self::new();
    }

    /// Index of the `n`th record, walking from whichever end is nearer
    pub fn nth<T: Linked>(&self, nodes: &[T], n: usize) -> Option<usize> {
        if n >= self.len {
            return None;
        }
        if n >= self.len / 2 {
            let mut cursor = self.tail;
            for _ in 0..(self.len - 1 - n) {
                cursor = cursor.and_then(|index| nodes[index].links().prev);
            }
            cursor
        } else {
            let mut cursor = self.head;
            for _ in 0..n {
                cursor = cursor.and_then(|index| nodes[index].links().next);
            }
            cursor
        }
    }

    /// Rebuild the list so it visits `order` front to back.
    ///
    /// `order` must be a permutation of the list's current members.
    pub fn relink<T: Linked>(&mut self, nodes: &mut [T], order: &[usize]) {
        debug_assert_eq!(order.len(), self.len, "relink order must cover the whole list");
        *self = Self::new();
        for &index in order {
            self.push_back(nodes, index);
        }
    }

    /// Iterate record indices front to back
    pub fn iter<'a, T: Linked>(&self, nodes: &'a [T]) -> IndexListIter<'a, T> {
        IndexListIter {
            nodes,
            cursor: self.head,
            remaining: self.len,
        }
    }
}

/// Front-to-back iterator over an [`IndexList`]
#[derive(Debug)]
pub struct IndexListIter<'a, T> {
    nodes: &'a [T],
    cursor: Option<usize>,
    remaining: usize,
}

impl<T: Linked> Iterator for IndexListIter<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.cursor?;
        self.cursor = self.nodes[index].links().next;
        self.remaining -= 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Linked> ExactSizeIterator for IndexListIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Node {
        links: Links,
    }

    impl Linked for Node {
        fn links(&self) -> &Links {
            &self.links
        }

        fn links_mut(&mut self) -> &mut Links {
            &mut self.links
        }
    }

    fn nodes(count: usize) -> Vec<Node> {
        (0..count).map(|_| Node::default()).collect()
    }

    fn filled(nodes: &mut [Node], indices: &[usize]) -> IndexList {
        let mut list = IndexList::new();
        for &index in indices {
            list.push_back(nodes, index);
        }
        list
    }

    #[test]
    fn test_push_and_iterate_in_order() {
        let mut nodes = nodes(4);
        let list = filled(&mut nodes, &[2, 0, 3]);

        assert_eq!(list.len(), 3);
        assert_eq!(list.iter(&nodes).collect::<Vec<_>>(), vec![2, 0, 3]);
        assert_eq!(list.front(), Some(2));
        assert_eq!(list.back(), Some(3));
    }

    #[test]
    fn test_unlink_middle_head_and_tail() {
        let mut nodes = nodes(5);
        let mut list = filled(&mut nodes, &[0, 1, 2, 3, 4]);

        list.unlink(&mut nodes, 2);
        list.unlink(&mut nodes, 0);
        list.unlink(&mut nodes, 4);

        assert_eq!(list.iter(&nodes).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(list.front(), Some(1));
        assert_eq!(list.back(), Some(3));
    }

    #[test]
    fn test_append_splices_and_empties_source() {
        let mut nodes = nodes(6);
        let mut a = filled(&mut nodes, &[0, 1]);
        let mut b = filled(&mut nodes, &[4, 5, 2]);

        a.append(&mut nodes, &mut b);

        assert!(b.is_empty());
        assert_eq!(a.len(), 5);
        assert_eq!(a.iter(&nodes).collect::<Vec<_>>(), vec![0, 1, 4, 5, 2]);

        // Appending into an empty list adopts the other list wholesale
        let mut empty = IndexList::new();
        empty.append(&mut nodes, &mut a);
        assert_eq!(empty.iter(&nodes).collect::<Vec<_>>(), vec![0, 1, 4, 5, 2]);
    }

    #[test]
    fn test_nth_walks_from_both_ends() {
        let mut nodes = nodes(7);
        let list = filled(&mut nodes, &[6, 5, 4, 3, 2, 1, 0]);

        for n in 0..7 {
            assert_eq!(list.nth(&nodes, n), Some(6 - n));
        }
        assert_eq!(list.nth(&nodes, 7), None);
    }

    #[test]
    fn test_relink_reorders() {
        let mut nodes = nodes(3);
        let mut list = filled(&mut nodes, &[0, 1, 2]);

        list.relink(&mut nodes, &[2, 0, 1]);

        assert_eq!(list.iter(&nodes).collect::<Vec<_>>(), vec![2, 0, 1]);
        assert_eq!(list.pop_front(&mut nodes), Some(2));
        assert_eq!(list.len(), 2);
    }
}
