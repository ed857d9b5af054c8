pub mod batch_helpers;
pub mod decrypt;
pub mod encrypt;
pub mod keys;
pub mod process;
