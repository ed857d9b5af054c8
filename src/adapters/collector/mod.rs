pub mod file_collector;
