pub mod collector;
pub mod engine;
pub mod key_stores;
