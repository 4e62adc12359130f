//! LanceDB-backed vector index.

pub mod index;
pub mod schema;
pub mod table;

pub use index::LanceVectorIndex;
