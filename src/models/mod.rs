pub mod row;

pub use row::{ColumnValue, ProductRow};
