// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use core::fmt;

use super::id::{INVALID, WidgetId};
use super::store::WidgetTree;
use crate::backend::PlatformBridge;

/// An iterator over the direct children of a widget, back to front.
///
/// Created by [`WidgetTree::children`].
pub struct Children<'a, B: PlatformBridge> {
    tree: &'a WidgetTree<B>,
    current: u32,
}

impl<B: PlatformBridge> fmt::Debug for Children<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Children")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<'a, B: PlatformBridge> Children<'a, B> {
    pub(crate) fn new(tree: &'a WidgetTree<B>, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl<B: PlatformBridge> Iterator for Children<'_, B> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<WidgetId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

/// An iterator over the ancestors of a widget, nearest first.
///
/// Created by [`WidgetTree::ancestors`].
pub struct Ancestors<'a, B: PlatformBridge> {
    tree: &'a WidgetTree<B>,
    current: u32,
}

impl<B: PlatformBridge> fmt::Debug for Ancestors<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestors")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<B: PlatformBridge> Iterator for Ancestors<'_, B> {
    type Item = WidgetId;

    fn next(&mut self) -> Option<WidgetId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

impl<B: PlatformBridge> WidgetTree<B> {
    /// Returns an iterator over the ancestors of `id`, starting with its
    /// parent and ending with its window.
    #[must_use]
    pub fn ancestors(&self, id: WidgetId) -> Ancestors<'_, B> {
        self.validate(id);
        Ancestors {
            tree: self,
            current: self.parent[id.idx as usize],
        }
    }

    /// Returns the subtree rooted at `id` in paint order (pre-order, back to
    /// front).
    #[must_use]
    pub fn descendants(&self, id: WidgetId) -> alloc::vec::Vec<WidgetId> {
        self.validate(id);
        let mut out = alloc::vec::Vec::new();
        let mut stack = alloc::vec![id.idx];
        while let Some(idx) = stack.pop() {
            out.push(self.id_at(idx));
            let mut children = self.child_indices(idx);
            children.reverse();
            stack.extend(children);
        }
        out
    }
}
