pub mod batch_runner;
pub mod diagnostics;
pub mod invocation_builder;
pub mod key_validator;
pub mod path_resolver;
