use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;

use crate::auth::CurrentUser;
use crate::model::defect::{
    AssignRequest, AssignmentResponse, CommentResponse, CreateDefectForm, CreateDefectResponse,
    CommentRequest, DefectResponse, ListDefectsQuery, UpdateStatusRequest,
};
use crate::model::global_error::AppError;
use crate::service::lifecycle::{self, AssignInput, AttachmentUpload, NewDefect};
use crate::service::query::{self, DefectFilters};
use crate::storage::LocalPhotoStorage;

#[utoipa::path(
    get,
    path = "/api/defects",
    summary = "Список дефектов с учётом роли",
    params(
        ("page" = Option<u64>, Query, description = "Номер страницы"),
        ("status" = Option<String>, Query, description = "Фильтр по статусу"),
        ("priority" = Option<String>, Query, description = "Фильтр по приоритету"),
    ),
    responses(
        (status = 200, description = "Страница дефектов", body = crate::model::defect::DefectListResponse),
    ),
)]
#[get("/defects")]
pub async fn list_defects(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
    params: web::Query<ListDefectsQuery>,
) -> Result<HttpResponse, AppError> {
    let params = params.into_inner();
    let page = query::list_defects(
        db.get_ref(),
        &current_user,
        DefectFilters {
            status: params.status,
            priority: params.priority,
            page: params.page,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[post("/defects")]
pub async fn create_defect(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<LocalPhotoStorage>,
    current_user: web::ReqData<CurrentUser>,
    MultipartForm(form): MultipartForm<CreateDefectForm>,
) -> Result<HttpResponse, AppError> {
    let input = NewDefect {
        title: form.title.into_inner(),
        description: form.description.into_inner(),
        location: form.location.into_inner(),
        severity: form.severity.into_inner(),
        due_date: form.due_date.map(|d| d.into_inner()),
    };

    let attachments = form
        .photos
        .into_iter()
        .map(|f| AttachmentUpload {
            original_name: f.file_name.unwrap_or_default(),
            data: f.data.to_vec(),
        })
        .collect();

    let created = lifecycle::create_defect(
        db.get_ref(),
        storage.get_ref(),
        &current_user,
        input,
        attachments,
    )
    .await?;

    Ok(HttpResponse::Created().json(CreateDefectResponse {
        defect: created.defect.into(),
        photos: created.photos.into_iter().map(Into::into).collect(),
        warnings: created.warnings,
    }))
}

#[utoipa::path(
    get,
    path = "/api/defects/{id}",
    summary = "Карточка дефекта",
    params(
        ("id", description = "Идентификатор дефекта", example = 1),
    ),
    responses(
        (status = 200, description = "Дефект с комментариями и фотографиями", body = crate::model::defect::DefectDetailResponse),
        (status = 403, description = "Нет доступа к дефекту"),
        (status = 404, description = "Дефект не найден"),
    ),
)]
#[get("/defects/{id}")]
pub async fn get_defect(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let detail = query::get_defect_detail(db.get_ref(), &current_user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/defects/{id}/assign")]
pub async fn assign_defect(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i32>,
    body: web::Json<AssignRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let assignment = lifecycle::assign_defect(
        db.get_ref(),
        &current_user,
        path.into_inner(),
        AssignInput {
            assignee_id: body.assignee_id,
            priority: body.priority,
            notes: body.notes,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(AssignmentResponse::from(assignment)))
}

#[post("/defects/{id}/status")]
pub async fn update_status(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i32>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let defect =
        lifecycle::update_status(db.get_ref(), &current_user, path.into_inner(), &body.status)
            .await?;

    Ok(HttpResponse::Ok().json(DefectResponse::from(defect)))
}

#[post("/defects/{id}/comments")]
pub async fn add_comment(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i32>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, AppError> {
    let comment =
        lifecycle::add_comment(db.get_ref(), &current_user, path.into_inner(), &body.content)
            .await?;

    Ok(HttpResponse::Created().json(CommentResponse::with_author(comment, None)))
}

/// Assignment dropdown source for the manager UI.
#[get("/defects/users")]
pub async fn users_for_assignment(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
) -> Result<HttpResponse, AppError> {
    let users = query::list_assignable_users(db.get_ref(), &current_user).await?;
    Ok(HttpResponse::Ok().json(users))
}
