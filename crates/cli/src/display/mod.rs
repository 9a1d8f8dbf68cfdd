pub mod formatter;

pub use formatter::{format_overview, print_descriptor_summary, print_overview};
