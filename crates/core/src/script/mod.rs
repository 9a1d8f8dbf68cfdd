//! Script-based goal dialects. Each script contributes a standalone unit with
//! no ancestors.

pub mod ant;
pub mod beanshell;
