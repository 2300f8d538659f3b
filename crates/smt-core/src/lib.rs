pub mod alignment;
pub mod decoder;
pub mod hypothesis;
pub mod model;
pub mod settings;
pub(crate) mod testutil;
pub mod zero_fertility;
