pub mod batch;
pub mod key_material;
pub mod outcome;
