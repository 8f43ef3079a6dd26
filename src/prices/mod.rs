pub mod error;
pub mod loader;
pub mod price_table;

pub use error::PriceStoreError;
pub use loader::{load_price_table, read_price_table};
pub use price_table::PriceTable;
