use crate::domain::{SearchEngine, SearchHistoryEntry};
use crate::notifications::UrlOpener;
use crate::persistence::{Document, SearchHistory, StorageKey};
use crate::ticker::Clock;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::rc::Rc;

/// Most entries kept in the search history
pub const HISTORY_LIMIT: usize = 20;

/// Characters a URI component may carry unescaped
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Results page URL for `query` on `engine`
pub fn search_url(query: &str, engine: SearchEngine) -> String {
    let encoded = utf8_percent_encode(query, URI_COMPONENT);
    match engine {
        SearchEngine::Baidu => format!("https://www.baidu.com/s?wd={}", encoded),
        SearchEngine::Google => format!("https://www.google.com/search?q={}", encoded),
        SearchEngine::Bing => format!("https://www.bing.com/search?q={}", encoded),
    }
}

/// Put `entry` at the front, dropping an older entry for the same query and engine
pub fn insert_history(history: &mut Vec<SearchHistoryEntry>, entry: SearchHistoryEntry) {
    history.retain(|e| e.query != entry.query || e.engine != entry.engine);
    history.insert(0, entry);
    history.truncate(HISTORY_LIMIT);
}

/// Multi-engine search box with a most-recent-first history
pub struct SearchBox {
    document: Document,
    clock: Rc<dyn Clock>,
    opener: Rc<dyn UrlOpener>,
    history: Vec<SearchHistoryEntry>,
    current: SearchEngine,
}

impl SearchBox {
    pub fn new(document: Document, clock: Rc<dyn Clock>, opener: Rc<dyn UrlOpener>) -> Self {
        let history = document.load::<SearchHistory>();
        let current = document
            .get_raw(StorageKey::CurrentEngine)
            .and_then(|id| SearchEngine::from_id(&id))
            .unwrap_or_default();

        Self {
            document,
            clock,
            opener,
            history,
            current,
        }
    }

    pub fn history(&self) -> &[SearchHistoryEntry] {
        &self.history
    }

    pub fn current_engine(&self) -> SearchEngine {
        self.current
    }

    /// Remember the engine used by `search`
    pub fn set_engine(&mut self, engine: SearchEngine) {
        self.current = engine;
        self.document.persist_raw(StorageKey::CurrentEngine, engine.id());
    }

    /// Search on the current engine; returns the URL opened
    pub fn search(&mut self, query: &str) -> Option<String> {
        let engine = self.current;
        self.dispatch(query, engine)
    }

    /// Search on an engine given by id; unknown ids open nothing
    pub fn search_with(&mut self, query: &str, engine_id: &str) -> Option<String> {
        match SearchEngine::from_id(engine_id) {
            Some(engine) => self.dispatch(query, engine),
            None => {
                tracing::debug!(engine_id, "unknown search engine");
                None
            }
        }
    }

    /// Record the search in history, then open the results page
    pub fn dispatch(&mut self, query: &str, engine: SearchEngine) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        self.record(query, engine);
        let url = search_url(query, engine);
        self.opener.open(&url);
        Some(url)
    }

    /// Add a history entry stamped with the current time
    pub fn record(&mut self, query: &str, engine: SearchEngine) {
        let entry = SearchHistoryEntry {
            query: query.to_string(),
            engine,
            timestamp: self.clock.now_millis(),
        };
        insert_history(&mut self.history, entry);
        self.document.persist::<SearchHistory>(&self.history);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.document.persist_remove(StorageKey::SearchHistory);
    }
}
