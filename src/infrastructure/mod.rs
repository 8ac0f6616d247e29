pub mod http_store;
pub mod kv_store;
pub mod models;
