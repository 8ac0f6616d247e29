pub mod auth_service;
pub mod cart_store;
pub mod catalog_service;
pub mod contact_service;
pub mod dashboard_service;
pub mod order_service;
pub mod user_service;
pub mod wishlist_service;

#[cfg(test)]
pub(crate) mod test_support;
