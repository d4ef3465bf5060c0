//! Defect lifecycle: creation, assignment, status updates, comments and
//! photo attachments. All functions take the connection explicitly; the
//! assign operation is the only multi-write unit and runs in a transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use sea_query::Condition;
use tracing::warn;

use crate::auth::CurrentUser;
use crate::entity::assignment::{self, Entity as AssignmentEntity};
use crate::entity::comment;
use crate::entity::defect::{self, DefectStatus, Entity as DefectEntity, Priority, Severity};
use crate::entity::photo;
use crate::entity::user::{Entity as UserEntity, Role};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::policy::{Action, Ownership, can_perform};
use crate::storage::{PhotoStorage, allowed_extension};

pub struct NewDefect {
    pub title: String,
    pub description: String,
    pub location: String,
    pub severity: String,
    pub due_date: Option<String>,
}

pub struct AttachmentUpload {
    pub original_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct CreatedDefect {
    pub defect: defect::Model,
    pub photos: Vec<photo::Model>,
    pub warnings: Vec<String>,
}

/// Named store operation: the zero-or-one active assignment of a defect.
pub async fn find_active_assignment(
    db: &impl sea_orm::ConnectionTrait,
    defect_id: i32,
) -> Result<Option<assignment::Model>, AppError> {
    let assignment = AssignmentEntity::find()
        .filter(
            Condition::all()
                .add(assignment::Column::DefectId.eq(defect_id))
                .add(assignment::Column::IsActive.eq(true)),
        )
        .one(db)
        .await?;

    Ok(assignment)
}

/// Creator / active-assignee facts for policy decisions. Only engineers are
/// scoped, so the assignment lookup is skipped for the other roles.
pub async fn ownership_facts(
    db: &impl sea_orm::ConnectionTrait,
    actor: &CurrentUser,
    defect: &defect::Model,
) -> Result<Ownership, AppError> {
    if actor.role != Role::Engineer {
        return Ok(Ownership::none());
    }

    let is_creator = defect.creator_id == actor.id;
    let is_active_assignee = find_active_assignment(db, defect.id)
        .await?
        .map(|a| a.assignee_id == actor.id)
        .unwrap_or(false);

    Ok(Ownership::new(is_creator, is_active_assignee))
}

fn validate_new_defect(input: &NewDefect) -> Result<(Severity, Option<DateTime<Utc>>), AppError> {
    let mut errors = Vec::new();

    if input.title.trim().is_empty() {
        errors.push(ValidationFieldError {
            field: "title".to_string(),
            message: "Название обязательно".to_string(),
        });
    }
    if input.description.trim().is_empty() {
        errors.push(ValidationFieldError {
            field: "description".to_string(),
            message: "Описание обязательно".to_string(),
        });
    }
    if input.location.trim().is_empty() {
        errors.push(ValidationFieldError {
            field: "location".to_string(),
            message: "Расположение обязательно".to_string(),
        });
    }

    let severity = match Severity::parse(input.severity.trim()) {
        Some(s) => Some(s),
        None => {
            errors.push(ValidationFieldError {
                field: "severity".to_string(),
                message: "Недопустимое значение важности".to_string(),
            });
            None
        }
    };

    let due_date = match input.due_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match parse_due_date(raw) {
            Some(dt) => Some(dt),
            None => {
                errors.push(ValidationFieldError {
                    field: "due_date".to_string(),
                    message: "Недопустимый формат даты".to_string(),
                });
                None
            }
        },
    };

    if errors.is_empty() {
        Ok((severity.unwrap_or(Severity::Medium), due_date))
    } else {
        Err(AppError::ValidationError(errors))
    }
}

fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub async fn create_defect(
    db: &DatabaseConnection,
    storage: &impl PhotoStorage,
    actor: &CurrentUser,
    input: NewDefect,
    attachments: Vec<AttachmentUpload>,
) -> Result<CreatedDefect, AppError> {
    if !can_perform(actor.role, Action::CreateDefect, Ownership::none()) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let (severity, due_date) = validate_new_defect(&input)?;
    let now = Utc::now();

    let new_defect = defect::ActiveModel {
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        location: Set(input.location.trim().to_string()),
        severity: Set(severity),
        status: Set(DefectStatus::Open),
        priority: Set(Priority::Normal),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        due_date: Set(due_date.map(Into::into)),
        resolved_at: Set(None),
        creator_id: Set(actor.id),
        ..Default::default()
    };

    let defect = new_defect.insert(db).await?;

    let (photos, warnings) = store_attachments(db, storage, actor, defect.id, attachments).await?;

    Ok(CreatedDefect {
        defect,
        photos,
        warnings,
    })
}

/// Persists each valid attachment as a photo row. Per-file failures (bad
/// extension, storage error) become warnings and never abort the rest.
async fn store_attachments(
    db: &impl sea_orm::ConnectionTrait,
    storage: &impl PhotoStorage,
    actor: &CurrentUser,
    defect_id: i32,
    attachments: Vec<AttachmentUpload>,
) -> Result<(Vec<photo::Model>, Vec<String>), AppError> {
    let mut photos = Vec::new();
    let mut warnings = Vec::new();

    for upload in attachments {
        let Some(extension) = allowed_extension(&upload.original_name) else {
            warnings.push(format!(
                "Файл «{}» пропущен: допустимы только png, jpg, jpeg, gif",
                upload.original_name
            ));
            continue;
        };

        let stored = match storage.store(&upload.data, &extension).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(name = %upload.original_name, error = %e, "не удалось сохранить фотографию");
                warnings.push(format!(
                    "Ошибка при обработке изображения «{}»",
                    upload.original_name
                ));
                continue;
            }
        };

        let new_photo = photo::ActiveModel {
            filename: Set(stored.key),
            original_filename: Set(upload.original_name),
            uploaded_at: Set(Utc::now().into()),
            file_size: Set(stored.size),
            defect_id: Set(defect_id),
            uploaded_by_id: Set(actor.id),
            ..Default::default()
        };

        photos.push(new_photo.insert(db).await?);
    }

    Ok((photos, warnings))
}

pub struct AssignInput {
    pub assignee_id: i32,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

pub async fn assign_defect(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    defect_id: i32,
    input: AssignInput,
) -> Result<assignment::Model, AppError> {
    if !can_perform(actor.role, Action::AssignDefect, Ownership::none()) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let priority = match input.priority.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(Priority::parse(raw).ok_or_else(|| {
            AppError::ValidationError(vec![ValidationFieldError {
                field: "priority".to_string(),
                message: "Недопустимое значение приоритета".to_string(),
            }])
        })?),
    };

    // Deactivate-old + insert-new + defect update must land together,
    // otherwise a defect can briefly hold zero or two active assignments.
    let txn = db.begin().await?;
    let assignment =
        apply_assignment(&txn, actor, defect_id, input.assignee_id, priority, input.notes).await?;
    txn.commit().await?;

    Ok(assignment)
}

async fn apply_assignment(
    txn: &DatabaseTransaction,
    actor: &CurrentUser,
    defect_id: i32,
    assignee_id: i32,
    priority: Option<Priority>,
    notes: Option<String>,
) -> Result<assignment::Model, AppError> {
    let defect = DefectEntity::find_by_id(defect_id)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))?;

    UserEntity::find_by_id(assignee_id)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::AssigneeNotFound))?;

    let now = Utc::now();

    // Idempotent when no active assignment exists yet.
    if let Some(current) = find_active_assignment(txn, defect_id).await? {
        let mut current: assignment::ActiveModel = current.into();
        current.is_active = Set(false);
        current.update(txn).await?;
    }

    let new_assignment = assignment::ActiveModel {
        defect_id: Set(defect_id),
        assignee_id: Set(assignee_id),
        assigned_by_id: Set(actor.id),
        assigned_at: Set(now.into()),
        is_active: Set(true),
        notes: Set(notes.filter(|n| !n.trim().is_empty())),
        ..Default::default()
    };
    let assignment = new_assignment.insert(txn).await?;

    let mut defect: defect::ActiveModel = defect.into();
    defect.status = Set(DefectStatus::Assigned);
    if let Some(priority) = priority {
        defect.priority = Set(priority);
    }
    defect.updated_at = Set(now.into());
    defect.update(txn).await?;

    Ok(assignment)
}

pub async fn update_status(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    defect_id: i32,
    raw_status: &str,
) -> Result<defect::Model, AppError> {
    let new_status = DefectStatus::parse(raw_status.trim())
        .ok_or_else(|| AppError::bad_request(ErrorCode::InvalidStatus))?;

    let defect = DefectEntity::find_by_id(defect_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))?;

    let ownership = ownership_facts(db, actor, &defect).await?;
    if !can_perform(actor.role, Action::UpdateStatus, ownership) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    // Transitions are deliberately unconstrained (a closed defect may be
    // reopened); only the resolved timestamp side effect is enforced.
    let already_resolved_at = defect.resolved_at;
    let mut model: defect::ActiveModel = defect.into();
    model.status = Set(new_status);
    if new_status == DefectStatus::Resolved && already_resolved_at.is_none() {
        model.resolved_at = Set(Some(Utc::now().into()));
    }
    model.updated_at = Set(Utc::now().into());

    let updated = model.update(db).await?;
    Ok(updated)
}

pub async fn add_comment(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    defect_id: i32,
    content: &str,
) -> Result<comment::Model, AppError> {
    if !can_perform(actor.role, Action::AddComment, Ownership::none()) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::bad_request(ErrorCode::EmptyComment));
    }

    DefectEntity::find_by_id(defect_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))?;

    let new_comment = comment::ActiveModel {
        content: Set(content.to_string()),
        created_at: Set(Utc::now().into()),
        defect_id: Set(defect_id),
        author_id: Set(actor.id),
        ..Default::default()
    };

    let comment = new_comment.insert(db).await?;
    Ok(comment)
}

/// Attach photos to an existing defect (used by edit flows). The caller is
/// expected to have passed the view-permission gate for the defect.
pub async fn attach_photos(
    db: &DatabaseConnection,
    storage: &impl PhotoStorage,
    actor: &CurrentUser,
    defect_id: i32,
    attachments: Vec<AttachmentUpload>,
) -> Result<(Vec<photo::Model>, Vec<String>), AppError> {
    DefectEntity::find_by_id(defect_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))?;

    store_attachments(db, storage, actor, defect_id, attachments).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn engineer(id: i32) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::Engineer,
        }
    }

    fn manager(id: i32) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::Manager,
        }
    }

    fn observer(id: i32) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::Observer,
        }
    }

    fn sample_defect(id: i32, status: DefectStatus, creator_id: i32) -> defect::Model {
        let now = Utc::now();
        defect::Model {
            id,
            title: "Протечка кровли".to_string(),
            description: "Протекает стык панелей".to_string(),
            location: "Корпус А, кровля".to_string(),
            severity: Severity::High,
            status,
            priority: Priority::Normal,
            created_at: now.into(),
            updated_at: now.into(),
            due_date: None,
            resolved_at: None,
            creator_id,
        }
    }

    struct NoStorage;

    impl PhotoStorage for NoStorage {
        async fn store(&self, _data: &[u8], _extension: &str) -> anyhow::Result<crate::storage::StoredPhoto> {
            anyhow::bail!("storage unavailable")
        }
    }

    #[tokio::test]
    async fn observer_cannot_create_defects() {
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

        let input = NewDefect {
            title: "t".into(),
            description: "d".into(),
            location: "l".into(),
            severity: "high".into(),
            due_date: None,
        };

        let err = create_defect(&db, &NoStorage, &observer(9), input, vec![])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::ApiError(ErrorCode::NotEnoughPermission, _)
        ));
    }

    #[tokio::test]
    async fn create_defect_rejects_blank_fields() {
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

        let input = NewDefect {
            title: "   ".into(),
            description: "d".into(),
            location: "l".into(),
            severity: "nonsense".into(),
            due_date: Some("not-a-date".into()),
        };

        let err = create_defect(&db, &NoStorage, &engineer(1), input, vec![])
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["title", "severity", "due_date"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn txt_attachment_becomes_warning_not_photo() {
        let defect = sample_defect(3, DefectStatus::Open, 1);
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 3,
                rows_affected: 1,
            }])
            .append_query_results([vec![defect]])
            .into_connection();

        let input = NewDefect {
            title: "Протечка кровли".into(),
            description: "Протекает стык панелей".into(),
            location: "Корпус А".into(),
            severity: "high".into(),
            due_date: None,
        };
        let attachments = vec![AttachmentUpload {
            original_name: "notes.txt".into(),
            data: b"plain text".to_vec(),
        }];

        let created = create_defect(&db, &NoStorage, &engineer(1), input, attachments)
            .await
            .unwrap();

        assert_eq!(created.defect.status, DefectStatus::Open);
        assert_eq!(created.defect.priority, Priority::Normal);
        assert!(created.photos.is_empty());
        assert_eq!(created.warnings.len(), 1);
        assert!(created.warnings[0].contains("notes.txt"));
    }

    #[tokio::test]
    async fn storage_failure_degrades_to_warning() {
        let defect = sample_defect(4, DefectStatus::Open, 1);
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 4,
                rows_affected: 1,
            }])
            .append_query_results([vec![defect]])
            .into_connection();

        let input = NewDefect {
            title: "Скол плитки".into(),
            description: "Сколота плитка у входа".into(),
            location: "Вход, корпус Б".into(),
            severity: "low".into(),
            due_date: None,
        };
        let attachments = vec![AttachmentUpload {
            original_name: "crack.jpg".into(),
            data: vec![0xFF, 0xD8],
        }];

        let created = create_defect(&db, &NoStorage, &engineer(1), input, attachments)
            .await
            .unwrap();

        assert!(created.photos.is_empty());
        assert_eq!(created.warnings.len(), 1);
        assert!(created.warnings[0].contains("crack.jpg"));
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_value() {
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

        let err = update_status(&db, &manager(1), 5, "reopened")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ApiError(ErrorCode::InvalidStatus, _)));
    }

    #[tokio::test]
    async fn observer_cannot_update_status() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![sample_defect(5, DefectStatus::Open, 1)]])
            .into_connection();

        let err = update_status(&db, &observer(2), 5, "closed").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ApiError(ErrorCode::NotEnoughPermission, _)
        ));
    }

    #[tokio::test]
    async fn unrelated_engineer_cannot_update_status() {
        // Defect created by user 1, no active assignment; actor is user 2.
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![sample_defect(5, DefectStatus::Open, 1)]])
            .append_query_results([Vec::<assignment::Model>::new()])
            .into_connection();

        let err = update_status(&db, &engineer(2), 5, "in_progress")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::ApiError(ErrorCode::NotEnoughPermission, _)
        ));
    }

    #[tokio::test]
    async fn active_assignee_may_update_status() {
        let now = Utc::now();
        let active = assignment::Model {
            id: 11,
            defect_id: 5,
            assignee_id: 2,
            assigned_by_id: 1,
            assigned_at: now.into(),
            is_active: true,
            notes: None,
        };
        let mut progressed = sample_defect(5, DefectStatus::InProgress, 1);
        progressed.updated_at = now.into();

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![sample_defect(5, DefectStatus::Assigned, 1)]])
            .append_query_results([vec![active]])
            .append_query_results([vec![progressed]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let updated = update_status(&db, &engineer(2), 5, "in_progress")
            .await
            .unwrap();
        assert_eq!(updated.status, DefectStatus::InProgress);
    }

    #[tokio::test]
    async fn resolved_timestamp_set_once() {
        // First transition to resolved sets the timestamp.
        let now = Utc::now();
        let mut resolved = sample_defect(6, DefectStatus::Resolved, 1);
        resolved.resolved_at = Some(now.into());

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![sample_defect(6, DefectStatus::InProgress, 1)]])
            .append_query_results([vec![resolved.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let updated = update_status(&db, &manager(1), 6, "resolved").await.unwrap();
        assert!(updated.resolved_at.is_some());

        // Resolving again must leave resolved_at untouched: the UPDATE sent
        // to the store must not mention the column.
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![resolved.clone()]])
            .append_query_results([vec![resolved]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        update_status(&db, &manager(1), 6, "resolved").await.unwrap();

        let log = db.into_transaction_log();
        let update_stmt = log
            .iter()
            .map(|t| format!("{:?}", t))
            .find(|s| s.contains("UPDATE"))
            .expect("no UPDATE in transaction log");
        assert!(!update_stmt.contains("resolved_at"));
    }

    #[tokio::test]
    async fn only_managers_assign_defects() {
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

        let input = AssignInput {
            assignee_id: 2,
            priority: None,
            notes: None,
        };
        let err = assign_defect(&db, &engineer(1), 5, input).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ApiError(ErrorCode::NotEnoughPermission, _)
        ));
    }

    #[tokio::test]
    async fn assign_replaces_active_assignment_in_one_transaction() {
        use crate::entity::user;

        let now = Utc::now();
        let assignee = user::Model {
            id: 2,
            username: "petrov".to_string(),
            email: "petrov@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Engineer,
            full_name: "Петров П. П.".to_string(),
            is_active: true,
            created_at: now.into(),
        };
        let old_active = assignment::Model {
            id: 11,
            defect_id: 5,
            assignee_id: 3,
            assigned_by_id: 1,
            assigned_at: now.into(),
            is_active: true,
            notes: None,
        };
        let mut old_deactivated = old_active.clone();
        old_deactivated.is_active = false;
        let new_assignment = assignment::Model {
            id: 12,
            defect_id: 5,
            assignee_id: 2,
            assigned_by_id: 1,
            assigned_at: now.into(),
            is_active: true,
            notes: None,
        };
        let mut reassigned = sample_defect(5, DefectStatus::Assigned, 1);
        reassigned.priority = Priority::Urgent;

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![sample_defect(5, DefectStatus::InProgress, 1)]])
            .append_query_results([vec![assignee]])
            .append_query_results([vec![old_active]])
            .append_query_results([vec![old_deactivated]])
            .append_query_results([vec![new_assignment]])
            .append_query_results([vec![reassigned]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 12,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let input = AssignInput {
            assignee_id: 2,
            priority: Some("urgent".into()),
            notes: None,
        };
        let assignment = assign_defect(&db, &manager(1), 5, input).await.unwrap();

        assert_eq!(assignment.id, 12);
        assert_eq!(assignment.assignee_id, 2);
        assert!(assignment.is_active);

        // All three writes must land inside a single committed transaction.
        let log = db.into_transaction_log();
        let txn_entries: Vec<String> = log
            .iter()
            .map(|t| format!("{:?}", t))
            .filter(|s| s.contains("BEGIN"))
            .collect();
        assert_eq!(txn_entries.len(), 1);

        let txn = &txn_entries[0];
        assert!(txn.contains("COMMIT"));

        let deactivate = txn.find("UPDATE `assignments`").unwrap();
        let insert = txn.find("INSERT INTO `assignments`").unwrap();
        let defect_update = txn.find("UPDATE `defects`").unwrap();
        assert!(deactivate < insert, "old assignment deactivated first");
        assert!(insert < defect_update, "defect updated after the insert");
        assert!(txn.contains(r#""assigned""#), "defect status moved to assigned");
        assert!(txn.contains(r#""urgent""#), "supplied priority overwrites");
    }

    #[tokio::test]
    async fn assign_fails_on_missing_defect() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([Vec::<defect::Model>::new()])
            .into_connection();

        let input = AssignInput {
            assignee_id: 2,
            priority: None,
            notes: None,
        };
        let err = assign_defect(&db, &manager(1), 404, input).await.unwrap_err();
        assert!(matches!(err, AppError::ApiError(ErrorCode::DefectNotFound, _)));
    }

    #[tokio::test]
    async fn assign_rejects_invalid_priority_before_touching_store() {
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

        let input = AssignInput {
            assignee_id: 2,
            priority: Some("asap".into()),
            notes: None,
        };
        let err = assign_defect(&db, &manager(1), 5, input).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn empty_comment_rejected() {
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

        let err = add_comment(&db, &engineer(1), 5, "   \n\t ").await.unwrap_err();
        assert!(matches!(err, AppError::ApiError(ErrorCode::EmptyComment, _)));
    }

    #[tokio::test]
    async fn comment_appended_with_trimmed_content() {
        let now = Utc::now();
        let stored = comment::Model {
            id: 21,
            content: "Передано подрядчику".to_string(),
            created_at: now.into(),
            defect_id: 5,
            author_id: 3,
        };

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![sample_defect(5, DefectStatus::Assigned, 1)]])
            .append_query_results([vec![stored]])
            .append_exec_results([MockExecResult {
                last_insert_id: 21,
                rows_affected: 1,
            }])
            .into_connection();

        let comment = add_comment(&db, &observer(3), 5, "  Передано подрядчику  ")
            .await
            .unwrap();
        assert_eq!(comment.content, "Передано подрядчику");
        assert_eq!(comment.author_id, 3);
    }

    #[test]
    fn due_date_accepts_date_and_rfc3339() {
        assert!(parse_due_date("2025-11-30").is_some());
        assert!(parse_due_date("2025-11-30T12:00:00+03:00").is_some());
        assert!(parse_due_date("30.11.2025").is_none());
    }
}
