pub mod dtos;
pub mod filters;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{ImageService, IncidentService};
