pub mod extract;
pub mod registry;
