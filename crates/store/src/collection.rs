//! Ordered, id-keyed collections.

use std::hash::Hash;

use grantwise_core::budget::BudgetTree;
use grantwise_core::document::{Document, Template};
use grantwise_core::grant::{Grant, Task};
use grantwise_core::payment::PaymentRequest;
use grantwise_shared::types::{
    BudgetId, DocumentId, GrantId, PaymentRequestId, TaskId, TemplateId,
};

/// A record with a stable id.
pub(crate) trait Keyed {
    type Id: Copy + Eq + Hash;

    fn key(&self) -> Self::Id;
}

macro_rules! keyed {
    ($ty:ty, $id:ty, |$v:ident| $key:expr) => {
        impl Keyed for $ty {
            type Id = $id;

            fn key(&self) -> $id {
                let $v = self;
                $key
            }
        }
    };
}

keyed!(Grant, GrantId, |g| g.id);
keyed!(BudgetTree, BudgetId, |b| b.id());
keyed!(Document, DocumentId, |d| d.id);
keyed!(Task, TaskId, |t| t.id);
keyed!(PaymentRequest, PaymentRequestId, |p| p.id);
keyed!(Template, TemplateId, |t| t.id);

/// Records in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> Collection<T> {
    pub(crate) fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn contains(&self, id: T::Id) -> bool {
        self.items.iter().any(|item| item.key() == id)
    }

    pub(crate) fn get(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.key() == id)
    }

    pub(crate) fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.key() == id)
    }

    /// Appends and returns a reference to the stored record.
    pub(crate) fn push(&mut self, item: T) -> &T {
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub(crate) fn remove(&mut self, id: T::Id) -> Option<T> {
        let index = self.items.iter().position(|item| item.key() == id)?;
        Some(self.items.remove(index))
    }

    /// Removes every record matching `predicate`, returning them in order.
    pub(crate) fn drain_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let (removed, kept): (Vec<T>, Vec<T>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| predicate(item));
        self.items = kept;
        removed
    }
}
