mod image_service;
mod incident_service;

pub use image_service::ImageService;
pub use incident_service::IncidentService;
