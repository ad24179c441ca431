//! Ordered item collections and the diff that reconciles two of them

use std::collections::HashSet;
use std::fmt;

use notesync_fs::IdentityPath;
use tracing::debug;

use crate::factory::OperationFactory;
use crate::item::Item;
use crate::operation::{Operation, Plan};

/// An ordered, duplicate-tolerant collection of items.
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item, keeping insertion order.
    pub fn add(&mut self, item: Item) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Concatenate `other` after the items of `self`.
    pub fn merge(mut self, other: ItemSet) -> ItemSet {
        self.items.extend(other.items);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First item with the given identity path.
    pub fn find_by_path(&self, path: &IdentityPath) -> Option<&Item> {
        self.items.iter().find(|item| item.path() == path)
    }

    /// Plan the operations that turn `self` (the current state) into
    /// `desired`.
    ///
    /// For every desired item, in order: no path match yields a create; a
    /// current item with both the same path and the same fingerprint yields a
    /// no-op; otherwise the first path match is updated. Afterwards every
    /// current item whose path is absent from `desired` yields a delete, in
    /// current order.
    ///
    /// Identical content under another path is not a rename: it produces a
    /// create and a delete. Content is never read here.
    pub fn diff(&self, desired: &ItemSet, factory: &OperationFactory) -> Plan {
        let mut operations: Vec<Operation> = desired
            .iter()
            .map(|wanted| self.operation_for(wanted, factory))
            .collect();

        let desired_paths: HashSet<&IdentityPath> = desired.iter().map(Item::path).collect();
        operations.extend(
            self.items
                .iter()
                .filter(|existing| !desired_paths.contains(existing.path()))
                .map(|existing| factory.delete(existing)),
        );

        let plan = Plan::new(operations);
        debug!(
            current = self.len(),
            desired = desired.len(),
            summary = %plan.summary(),
            "Computed plan"
        );
        plan
    }

    fn operation_for(&self, wanted: &Item, factory: &OperationFactory) -> Operation {
        let Some(existing) = self.find_by_path(wanted.path()) else {
            return factory.create(wanted);
        };

        let unchanged = self
            .items
            .iter()
            .any(|item| item.matches_fingerprint(wanted) && item.matches_path(wanted));
        if unchanged {
            factory.no_op(wanted)
        } else {
            factory.update(existing, wanted)
        }
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ItemSet {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for ItemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}
