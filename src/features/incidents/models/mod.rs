mod history;
mod incident;

pub use history::{AdminComment, StatusChange};
pub use incident::{Incident, IncidentCategory, IncidentPriority, IncidentStatus};
