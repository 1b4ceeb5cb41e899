use crate::domain::Website;
use crate::error::{Result, StartpageError};
use crate::notifications::UrlOpener;
use crate::persistence::{Document, Websites};
use crate::reorder::move_item;
use std::rc::Rc;

/// The reorderable bookmark grid
pub struct WebsiteEngine {
    document: Document,
    opener: Rc<dyn UrlOpener>,
    items: Vec<Website>,
}

impl WebsiteEngine {
    pub fn new(document: Document, opener: Rc<dyn UrlOpener>) -> Self {
        let items = document.load::<Websites>();
        Self {
            document,
            opener,
            items,
        }
    }

    pub fn items(&self) -> &[Website] {
        &self.items
    }

    /// Append a website; name and url are required
    pub fn add(&mut self, name: &str, url: &str, icon: &str) -> Result<()> {
        if name.trim().is_empty() || url.trim().is_empty() {
            return Err(StartpageError::validation("website name and url are required"));
        }
        self.items.push(Website::new(name, url, icon));
        self.save();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        let removed = self.items.remove(index);
        tracing::debug!(name = %removed.name, "website removed");
        self.save();
        true
    }

    /// Drag `from` onto `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if !move_item(&mut self.items, from, to) {
            return false;
        }
        self.save();
        true
    }

    /// Open a website in a new browsing context
    pub fn open(&self, index: usize) -> bool {
        match self.items.get(index) {
            Some(site) => {
                self.opener.open(&site.url);
                true
            }
            None => false,
        }
    }

    fn save(&self) {
        self.document.persist::<Websites>(&self.items);
    }
}
