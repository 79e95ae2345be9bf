pub mod image_store;
pub mod recipe_service;
pub mod user_service;
