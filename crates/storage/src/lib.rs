pub mod audit;
pub mod db;
pub mod ledger;
pub mod memory;
pub mod store;

pub use db::{create_db, DbPool, SqliteStore};
pub use ledger::{
    client_entries, closing_review, post_entry, register_document, register_obligation, submit_obligation,
};
pub use memory::MemoryStore;
pub use store::{find_by_id, Store, StoreError};
