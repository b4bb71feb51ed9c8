pub mod batch;
pub mod canonical;

pub use batch::BatchTables;
