mod models;
mod schema;
mod store;

pub use models::*;
pub use schema::WAREHOUSE_SCHEMA;
pub use store::{FileTransaction, Warehouse};
