mod incident_dto;

pub use incident_dto::{
    AddCommentDto, AdminCommentResponseDto, ChangeStatusDto, CreateIncidentDto,
    IncidentDetailResponseDto, IncidentResponseDto, ListIncidentsQuery, StatusChangeResponseDto,
    UpdateIncidentDto, UploadImageDto,
};
