use crate::domain::{NoteColor, StickyNote};
use crate::persistence::{Document, StickyNotes};
use crate::ticker::Clock;
use chrono::{Local, TimeZone};
use std::rc::Rc;

/// Sticky notes, newest first
pub struct NoteBoard {
    document: Document,
    clock: Rc<dyn Clock>,
    notes: Vec<StickyNote>,
}

impl NoteBoard {
    pub fn new(document: Document, clock: Rc<dyn Clock>) -> Self {
        let notes = document.load::<StickyNotes>();
        Self {
            document,
            clock,
            notes,
        }
    }

    pub fn notes(&self) -> &[StickyNote] {
        &self.notes
    }

    /// Put a new empty note at the front
    pub fn add(&mut self, color: NoteColor) {
        self.notes.insert(
            0,
            StickyNote {
                content: String::new(),
                created_at: self.clock.now_millis(),
                color,
            },
        );
        self.save();
    }

    /// Replace a note's content; the view debounces keystrokes before calling this
    pub fn update(&mut self, index: usize, content: &str) -> bool {
        let Some(note) = self.notes.get_mut(index) else {
            return false;
        };
        note.content = content.to_string();
        self.save();
        true
    }

    pub fn set_color(&mut self, index: usize, color: NoteColor) -> bool {
        let Some(note) = self.notes.get_mut(index) else {
            return false;
        };
        note.color = color;
        self.save();
        true
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.notes.len() {
            return false;
        }
        self.notes.remove(index);
        self.save();
        true
    }

    fn save(&self) {
        self.document.persist::<StickyNotes>(&self.notes);
    }
}

/// Creation time as "YYYY-MM-DD HH:MM" in local time
pub fn format_created_at(note: &StickyNote) -> String {
    match Local.timestamp_millis_opt(note.created_at).single() {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}
