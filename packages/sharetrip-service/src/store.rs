//! `TourStore`, `PreferenceSource` and `EmbeddingSource` backends.

pub mod memory;
pub mod postgres;
