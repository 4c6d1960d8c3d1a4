//! Ordered in-memory view of entities.
//!
//! Order is whatever the items were loaded or appended in; nothing here
//! re-sorts.

use crate::domain::{Entity, Task};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedView<T> {
    items: Vec<T>,
}

/// View of one list's tasks
pub type TaskView = OrderedView<Task>;

impl<T> Default for OrderedView<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> OrderedView<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Add to the end
    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Append unless an item with the same id exists; returns whether it was added
    pub fn insert_if_absent(&mut self, item: T) -> bool {
        if self.contains(item.id()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Replace the item with the same id in place; returns whether one existed
    pub fn replace(&mut self, item: T) -> bool {
        let id = item.id().clone();
        self.replace_id(&id, item)
    }

    /// Replace the item identified by `id` (possibly with a different id) in place
    pub fn replace_id(&mut self, id: &T::Id, item: T) -> bool {
        match self.position(id) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => false,
        }
    }

    /// Remove an item by ID
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        self.position(id).map(|index| self.items.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListId, TaskId, UserId};
    use chrono::Utc;

    fn task(id: &str) -> Task {
        Task::draft(TaskId::from(id), ListId::from("l1"), id.to_uppercase(), UserId::from("u1"), Utc::now())
    }

    fn ids(view: &TaskView) -> Vec<&str> {
        view.items().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_replace_id_keeps_position() {
        let mut view = TaskView::new(vec![task("a"), task("temp-1"), task("c")]);
        assert!(view.replace_id(&TaskId::from("temp-1"), task("b")));
        assert_eq!(ids(&view), vec!["a", "b", "c"]);
        assert!(!view.replace_id(&TaskId::from("temp-1"), task("x")));
    }

    #[test]
    fn test_insert_if_absent() {
        let mut view = TaskView::new(vec![task("a")]);
        let mut changed = task("a");
        changed.title = "changed".to_string();
        assert!(!view.insert_if_absent(changed));
        assert_eq!(view.get(&TaskId::from("a")).unwrap().title, "A");
        assert!(view.insert_if_absent(task("b")));
        assert_eq!(ids(&view), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut view = TaskView::new(vec![task("a")]);
        assert!(view.remove(&TaskId::from("zz")).is_none());
        assert_eq!(view.remove(&TaskId::from("a")).map(|t| t.id), Some(TaskId::from("a")));
        assert!(view.is_empty());
    }
}
