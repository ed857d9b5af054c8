pub mod engine;
pub mod key_store;
