//! Single-user local to-do list.
//!
//! Unrelated to the Kanban board: plain CRUD over local state with no
//! networking, no snapshots, and no reconciliation. Items live only as
//! long as the [`TodoList`] value does.

/// One entry in the to-do list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    /// Sequential local id, unique within this list.
    pub id: u32,
    /// What needs doing.
    pub name: String,
    /// Optional detail text.
    pub description: Option<String>,
    /// Whether the item is ticked off.
    pub checked: bool,
}

/// An explicitly constructed, purely local to-do list.
#[derive(Debug, Default)]
pub struct TodoList {
    items: Vec<TodoItem>,
    editing: Option<u32>,
}

impl TodoList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    /// Adds an unchecked item and returns its id (one past the current
    /// maximum, starting at 1).
    pub fn add(&mut self, name: impl Into<String>, description: Option<String>) -> u32 {
        let id = self.items.iter().map(|i| i.id).max().map_or(1, |max| max + 1);
        self.items.push(TodoItem {
            id,
            name: name.into(),
            description,
            checked: false,
        });
        id
    }

    /// Removes an item. Returns whether anything was removed.
    pub fn delete(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.items.len() != before
    }

    /// Flips an item's checked state. Returns whether the item exists.
    pub fn toggle(&mut self, id: u32) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.checked = !item.checked;
                true
            }
            None => false,
        }
    }

    /// Marks an item as being edited.
    pub fn begin_edit(&mut self, id: u32) {
        self.editing = Some(id);
    }

    /// The item currently under edit, if any.
    #[must_use]
    pub fn editing(&self) -> Option<u32> {
        self.editing
    }

    /// Stores new name/description for an item and ends the edit.
    /// Returns whether the item exists.
    pub fn save_edit(
        &mut self,
        id: u32,
        name: impl Into<String>,
        description: Option<String>,
    ) -> bool {
        self.editing = None;
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.name = name.into();
                item.description = description;
                true
            }
            None => false,
        }
    }
}
