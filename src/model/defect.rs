use actix_multipart::form::{MultipartForm, bytes::Bytes, text::Text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::defect::{DefectStatus, Priority, Severity};
use crate::entity::user::Role;
use crate::entity::{assignment, comment, defect, photo};

/// Multipart form for defect creation: text fields plus any number of
/// photo attachments under the `photos` field.
#[derive(Debug, MultipartForm)]
pub struct CreateDefectForm {
    pub title: Text<String>,
    pub description: Text<String>,
    pub location: Text<String>,
    pub severity: Text<String>,
    pub due_date: Option<Text<String>>,
    #[multipart(rename = "photos")]
    pub photos: Vec<Bytes>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequest {
    pub assignee_id: i32,
    /// Overwrites the defect priority when supplied.
    pub priority: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ListDefectsQuery {
    pub page: Option<u64>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefectResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    #[schema(value_type = String)]
    pub severity: Severity,
    #[schema(value_type = String)]
    pub status: DefectStatus,
    #[schema(value_type = String)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub creator_id: i32,
    pub is_overdue: bool,
}

impl From<defect::Model> for DefectResponse {
    fn from(d: defect::Model) -> Self {
        let is_overdue = d.is_overdue();
        DefectResponse {
            id: d.id,
            title: d.title,
            description: d.description,
            location: d.location,
            severity: d.severity,
            status: d.status,
            priority: d.priority,
            created_at: d.created_at.into(),
            updated_at: d.updated_at.into(),
            due_date: d.due_date.map(Into::into),
            resolved_at: d.resolved_at.map(Into::into),
            creator_id: d.creator_id,
            is_overdue,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDefectResponse {
    pub defect: DefectResponse,
    pub photos: Vec<PhotoResponse>,
    /// Per-attachment failures; the defect itself was still created.
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: i32,
    pub defect_id: i32,
    pub assignee_id: i32,
    pub assigned_by_id: i32,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl From<assignment::Model> for AssignmentResponse {
    fn from(a: assignment::Model) -> Self {
        AssignmentResponse {
            id: a.id,
            defect_id: a.defect_id,
            assignee_id: a.assignee_id,
            assigned_by_id: a.assigned_by_id,
            assigned_at: a.assigned_at.into(),
            is_active: a.is_active,
            notes: a.notes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i32,
    pub author_name: Option<String>,
}

impl CommentResponse {
    pub fn with_author(c: comment::Model, author_name: Option<String>) -> Self {
        CommentResponse {
            id: c.id,
            content: c.content,
            created_at: c.created_at.into(),
            author_id: c.author_id,
            author_name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: i32,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by_id: i32,
}

impl From<photo::Model> for PhotoResponse {
    fn from(p: photo::Model) -> Self {
        PhotoResponse {
            id: p.id,
            filename: p.filename,
            original_filename: p.original_filename,
            file_size: p.file_size,
            uploaded_at: p.uploaded_at.into(),
            uploaded_by_id: p.uploaded_by_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefectDetailResponse {
    pub defect: DefectResponse,
    pub active_assignment: Option<AssignmentResponse>,
    pub comments: Vec<CommentResponse>,
    pub photos: Vec<PhotoResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefectListResponse {
    pub items: Vec<DefectResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignableUserResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    #[schema(value_type = String)]
    pub role: Role,
}
