pub mod plot;
pub mod table;

pub use table::{Cell, Table};
