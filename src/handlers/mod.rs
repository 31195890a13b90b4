pub mod explore_handlers;
pub mod health_handlers;
