//! Business logic services layer

pub mod entity_service;

pub use entity_service::EntityService;
