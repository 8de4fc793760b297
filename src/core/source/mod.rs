//! CSV source access for the supported dialects

pub mod index;
pub mod reader;
pub mod tables;

pub use index::{ChildIndex, LookupTable};
pub use reader::{RowStream, SourceReader};
pub use tables::LogicalTable;
