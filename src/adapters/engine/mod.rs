pub mod age_process;
pub mod locator;
