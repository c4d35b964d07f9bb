pub mod extract;
pub mod health_handlers;
pub mod movie_handlers;
pub mod page_handlers;
