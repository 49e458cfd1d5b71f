//! HTTP route handlers.
//!
//! One module per resource, mirroring the service layer. Handlers stay
//! thin: extract, delegate to a service, shape the response DTO.

pub mod health;
pub mod login;
pub mod orders;
pub mod products;
pub mod stock;
pub mod users;
