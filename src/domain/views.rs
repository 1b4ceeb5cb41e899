use super::item::TodoItem;
use std::ops::Range;

/// Pixel height of one rendered todo row
pub const TODO_ROW_HEIGHT: f64 = 44.0;
/// Extra rows materialized above and below the visible ones
pub const TODO_WINDOW_BUFFER: usize = 5;
/// Lists shorter than this are rendered in full
pub const VIRTUALIZE_THRESHOLD: usize = 50;

/// Scroll state of the list container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub height: f64,
    pub row_height: f64,
    pub scroll_offset: f64,
    pub buffer: usize,
}

impl Viewport {
    pub fn new(height: f64, scroll_offset: f64) -> Self {
        Self {
            height,
            row_height: TODO_ROW_HEIGHT,
            scroll_offset,
            buffer: TODO_WINDOW_BUFFER,
        }
    }
}

/// Compute the `[start, end)` slice of a list of `len` rows worth materializing
pub fn visible_range(len: usize, viewport: &Viewport) -> Range<usize> {
    if viewport.row_height <= 0.0 {
        return 0..len;
    }

    let first_visible = (viewport.scroll_offset.max(0.0) / viewport.row_height).floor() as usize;
    let start = first_visible.saturating_sub(viewport.buffer);
    let visible_rows = (viewport.height.max(0.0) / viewport.row_height).ceil() as usize;
    let end = start
        .saturating_add(visible_rows)
        .saturating_add(viewport.buffer.saturating_mul(2))
        .min(len);

    start.min(end)..end
}

/// A materialized row of the todo list
#[derive(Debug, Clone, PartialEq)]
pub struct TodoRow<'a> {
    /// Position in the full list; drag and drop resolves against this
    pub index: usize,
    /// Render key derived from position, never persisted
    pub key: String,
    pub item: &'a TodoItem,
}

/// The slice of the todo list to render plus the spacer geometry around it
#[derive(Debug, Clone, PartialEq)]
pub struct TodoWindow<'a> {
    pub rows: Vec<TodoRow<'a>>,
    /// Height of the spacer above the first materialized row
    pub offset_top: f64,
    /// Height of the whole list as if every row were rendered
    pub total_height: f64,
}

/// Materialize the rows of `items` intersecting the viewport
///
/// Short lists are returned whole so small lists never pay for the windowing.
pub fn todo_window<'a>(items: &'a [TodoItem], viewport: &Viewport) -> TodoWindow<'a> {
    let range = if items.len() < VIRTUALIZE_THRESHOLD {
        0..items.len()
    } else {
        visible_range(items.len(), viewport)
    };

    let offset_top = range.start as f64 * viewport.row_height;
    let rows = items[range.clone()]
        .iter()
        .zip(range)
        .map(|(item, index)| TodoRow {
            index,
            key: row_key(index),
            item,
        })
        .collect();

    TodoWindow {
        rows,
        offset_top,
        total_height: items.len() as f64 * viewport.row_height,
    }
}

fn row_key(index: usize) -> String {
    format!("todo-{}", index)
}
