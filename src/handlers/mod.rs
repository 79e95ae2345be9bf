pub mod health_handlers;
pub mod recipe_handlers;
pub mod user_handlers;
