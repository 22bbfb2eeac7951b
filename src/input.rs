pub mod arguments;
pub mod reader;
