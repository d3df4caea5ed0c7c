pub mod autosave;
pub mod documents;
pub mod health;
pub mod versions;
