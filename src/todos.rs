use crate::domain::{todo_window, Priority, TodoItem, TodoWindow, Viewport};
use crate::persistence::{Document, Todos};
use crate::reorder::move_item;

/// Inline edit state of the todo list; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing { index: usize, draft: String },
}

/// Ordered todo list with inline editing, persisted after every mutation
#[derive(Debug)]
pub struct TodoEngine {
    document: Document,
    items: Vec<TodoItem>,
    edit: EditState,
}

impl TodoEngine {
    pub fn new(document: Document) -> Self {
        let items = document.load::<Todos>();
        Self {
            document,
            items,
            edit: EditState::Viewing,
        }
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items not yet completed
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|item| !item.completed).count()
    }

    /// Append a new item; whitespace-only text is ignored
    pub fn add(&mut self, text: &str, priority: Priority) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.items.push(TodoItem::new(text.to_string(), priority));
        self.save();
        true
    }

    /// Flip the completed flag of an item
    pub fn toggle(&mut self, index: usize) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.completed = !item.completed;
        self.save();
        true
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.items.remove(index);
        // Positions shifted; an open draft could now point at another item
        self.edit = EditState::Viewing;
        self.save();
        true
    }

    /// Replace an item's text; empty text leaves the item unchanged
    pub fn edit(&mut self, index: usize, new_text: &str) -> bool {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return false;
        }
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.text = new_text.to_string();
        self.save();
        true
    }

    pub fn set_priority(&mut self, index: usize, priority: Priority) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.priority = priority;
        self.save();
        true
    }

    /// Drag `from` onto `to`; both are indices into the full list
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if !move_item(&mut self.items, from, to) {
            return false;
        }
        self.edit = EditState::Viewing;
        self.save();
        true
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    /// Open the inline editor on an item, dropping any other unsaved draft
    pub fn begin_edit(&mut self, index: usize) -> bool {
        let Some(item) = self.items.get(index) else {
            return false;
        };
        self.edit = EditState::Editing {
            index,
            draft: item.text.clone(),
        };
        true
    }

    /// Replace the draft text of the open editor
    pub fn update_draft(&mut self, text: &str) {
        if let EditState::Editing { draft, .. } = &mut self.edit {
            *draft = text.to_string();
        }
    }

    /// Close the editor, saving the trimmed draft if it is non-empty
    pub fn commit_edit(&mut self) -> bool {
        match std::mem::take(&mut self.edit) {
            EditState::Editing { index, draft } => self.edit(index, &draft),
            EditState::Viewing => false,
        }
    }

    /// Close the editor without saving
    pub fn cancel_edit(&mut self) {
        self.edit = EditState::Viewing;
    }

    /// The rows worth rendering for the given scroll state
    pub fn window(&self, viewport: &Viewport) -> TodoWindow<'_> {
        todo_window(&self.items, viewport)
    }

    fn save(&self) {
        self.document.persist::<Todos>(&self.items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::views::TODO_ROW_HEIGHT;
    use crate::persistence::document::tests::FailingStore;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn engine_with(texts: &[&str]) -> (TodoEngine, Document) {
        let doc = Document::in_memory();
        let mut engine = TodoEngine::new(doc.clone());
        for text in texts {
            engine.add(text, Priority::Medium);
        }
        (engine, doc)
    }

    fn texts(engine: &TodoEngine) -> Vec<&str> {
        engine.items().iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn test_add_appends_trimmed() {
        let (mut engine, doc) = engine_with(&[]);
        assert!(engine.add("  buy milk ", Priority::High));

        let stored = doc.load::<Todos>();
        assert_eq!(stored, vec![TodoItem::new("buy milk".to_string(), Priority::High)]);
        assert!(!stored[0].completed);
    }

    #[test]
    fn test_add_whitespace_only_is_noop() {
        let (mut engine, doc) = engine_with(&["a"]);
        assert!(!engine.add("   ", Priority::Low));
        assert_eq!(engine.len(), 1);
        assert_eq!(doc.load::<Todos>().len(), 1);
    }

    #[test]
    fn test_toggle_and_remove() {
        let (mut engine, doc) = engine_with(&["a", "b", "c"]);
        assert!(engine.toggle(1));
        assert!(doc.load::<Todos>()[1].completed);
        assert_eq!(engine.remaining(), 2);

        assert!(engine.toggle(1));
        assert!(!engine.items()[1].completed);

        assert!(engine.remove(0));
        assert_eq!(texts(&engine), vec!["b", "c"]);
        assert!(!engine.remove(5));
        assert!(!engine.toggle(5));
    }

    #[test]
    fn test_reorder_persists() {
        let (mut engine, doc) = engine_with(&["A", "B", "C", "D"]);
        assert!(engine.reorder(0, 2));
        assert_eq!(texts(&engine), vec!["B", "A", "C", "D"]);

        assert!(engine.reorder(3, 0));
        assert_eq!(texts(&engine), vec!["D", "B", "A", "C"]);

        let stored: Vec<String> = doc.load::<Todos>().into_iter().map(|i| i.text).collect();
        assert_eq!(stored, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_edit_replaces_text_unless_empty() {
        let (mut engine, _doc) = engine_with(&["draft"]);
        assert!(engine.edit(0, "  final  "));
        assert_eq!(engine.items()[0].text, "final");

        assert!(!engine.edit(0, "   "));
        assert_eq!(engine.items()[0].text, "final");
    }

    #[test]
    fn test_begin_edit_captures_text() {
        let (mut engine, _doc) = engine_with(&["a", "b"]);
        assert!(engine.begin_edit(1));
        assert_eq!(
            engine.edit_state(),
            &EditState::Editing {
                index: 1,
                draft: "b".to_string()
            }
        );
        assert!(!engine.begin_edit(9));
    }

    #[test]
    fn test_commit_edit_saves_draft() {
        let (mut engine, doc) = engine_with(&["a", "b"]);
        engine.begin_edit(0);
        engine.update_draft(" alpha ");
        assert!(engine.commit_edit());

        assert_eq!(engine.edit_state(), &EditState::Viewing);
        assert_eq!(doc.load::<Todos>()[0].text, "alpha");
    }

    #[test]
    fn test_commit_empty_draft_keeps_text() {
        let (mut engine, _doc) = engine_with(&["a"]);
        engine.begin_edit(0);
        engine.update_draft("  ");
        assert!(!engine.commit_edit());
        assert_eq!(engine.items()[0].text, "a");
        assert_eq!(engine.edit_state(), &EditState::Viewing);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let (mut engine, doc) = engine_with(&["a"]);
        engine.begin_edit(0);
        engine.update_draft("changed");
        engine.cancel_edit();

        assert_eq!(engine.items()[0].text, "a");
        assert_eq!(doc.load::<Todos>()[0].text, "a");
        assert!(!engine.commit_edit());
    }

    #[test]
    fn test_new_edit_cancels_previous_without_saving() {
        let (mut engine, _doc) = engine_with(&["a", "b"]);
        engine.begin_edit(0);
        engine.update_draft("lost");
        engine.begin_edit(1);
        engine.update_draft("bee");
        engine.commit_edit();

        assert_eq!(texts(&engine), vec!["a", "bee"]);
    }

    #[test]
    fn test_structural_change_closes_editor() {
        let (mut engine, _doc) = engine_with(&["a", "b", "c"]);
        engine.begin_edit(2);
        engine.remove(0);
        assert_eq!(engine.edit_state(), &EditState::Viewing);

        engine.begin_edit(0);
        engine.reorder(1, 0);
        assert_eq!(engine.edit_state(), &EditState::Viewing);
    }

    #[test]
    fn test_reorder_from_window_uses_full_indices() {
        let names: Vec<String> = (0..200).map(|i| format!("t{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (mut engine, _doc) = engine_with(&refs);

        let viewport = Viewport::new(10.0 * TODO_ROW_HEIGHT, 100.0 * TODO_ROW_HEIGHT);
        let (from, to) = {
            let window = engine.window(&viewport);
            (window.rows[7].index, window.rows[2].index)
        };
        assert_eq!((from, to), (102, 97));

        assert!(engine.reorder(from, to));
        assert_eq!(engine.items()[97].text, "t102");
        assert_eq!(engine.items()[98].text, "t97");
    }

    #[test]
    fn test_loads_existing_items() {
        let doc = Document::in_memory();
        doc.save::<Todos>(&vec![TodoItem::new("kept".to_string(), Priority::Urgent)])
            .unwrap();
        let engine = TodoEngine::new(doc);
        assert_eq!(engine.items()[0].priority, Priority::Urgent);
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let doc = Document::new(Rc::new(FailingStore));
        let mut engine = TodoEngine::new(doc.clone());
        assert!(engine.add("still here", Priority::Medium));

        assert_eq!(engine.len(), 1);
        assert!(doc.take_save_failure());
    }
}
