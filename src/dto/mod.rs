pub mod admin;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod profile;
pub mod viewed;
pub mod wishlist;
