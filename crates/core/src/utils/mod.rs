pub mod serde_helpers;
pub mod type_name;
