pub mod document;
pub mod error;
pub mod indexing;
pub mod resource;
