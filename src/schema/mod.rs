pub mod types;

pub use types::OrderRecord;
