pub mod book;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod dashboard;
pub mod errors;
pub mod line_items;
pub mod money;
pub mod order;
pub mod ports;
pub mod sequence;
pub mod session;
pub mod user;
pub mod wishlist;
