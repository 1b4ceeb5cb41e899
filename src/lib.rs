pub mod app;
pub mod domain;
pub mod error;
pub mod notes;
pub mod notifications;
pub mod persistence;
pub mod pomodoro;
pub mod reorder;
pub mod search;
pub mod theme;
pub mod ticker;
pub mod todos;
pub mod websites;

pub use app::StartPage;
pub use error::{Result, StartpageError, StoreError};
