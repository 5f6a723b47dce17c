// Database module
// LanceDB vector storage plus the SQLite ingestion catalog

pub mod lancedb;
pub mod sqlite;
