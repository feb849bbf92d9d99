//! REST surface: DTOs, handlers, authentication middleware and routing.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
