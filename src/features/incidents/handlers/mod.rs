pub mod incident_handler;

pub use incident_handler::{
    __path_add_incident_comment, __path_attach_incident_image, __path_change_incident_status,
    __path_create_incident, __path_delete_incident, __path_get_incident, __path_list_incidents,
    __path_update_incident, add_incident_comment, attach_incident_image, change_incident_status,
    create_incident, delete_incident, get_incident, list_incidents, update_incident,
};
