//! Role-scoped reads: listings, the defect detail view, dashboards and
//! aggregate reports. Scope is narrowed by role first, then filters apply.

use std::collections::BTreeMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use sea_query::Condition;

use crate::auth::CurrentUser;
use crate::entity::assignment::{self, Entity as AssignmentEntity};
use crate::entity::comment::{self, Entity as CommentEntity};
use crate::entity::defect::{self, DefectStatus, Entity as DefectEntity, Priority, Severity};
use crate::entity::photo::{self, Entity as PhotoEntity};
use crate::entity::user::{self, Entity as UserEntity, Role};
use crate::model::dashboard::{
    AssignmentLoadRow, DashboardResponse, EngineerDashboard, GroupCount, ManagerDashboard,
    ObserverDashboard, ReportsResponse, UserActivityRow,
};
use crate::model::defect::{
    AssignableUserResponse, CommentResponse, DefectDetailResponse, DefectListResponse,
    DefectResponse,
};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::policy::{Action, Ownership, can_perform};
use crate::service::lifecycle::{find_active_assignment, ownership_facts};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

pub struct DefectFilters {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub page: Option<u64>,
}

/// Defect ids with an active assignment to the given user.
async fn assigned_defect_ids(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, AppError> {
    let ids = AssignmentEntity::find()
        .filter(
            Condition::all()
                .add(assignment::Column::AssigneeId.eq(user_id))
                .add(assignment::Column::IsActive.eq(true)),
        )
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.defect_id)
        .collect();

    Ok(ids)
}

/// Engineers see the union of defects they created and defects actively
/// assigned to them.
fn engineer_scope_condition(user_id: i32, assigned_ids: Vec<i32>) -> Condition {
    Condition::any()
        .add(defect::Column::CreatorId.eq(user_id))
        .add(defect::Column::Id.is_in(assigned_ids))
}

async fn role_scope(db: &DatabaseConnection, actor: &CurrentUser) -> Result<Condition, AppError> {
    if can_perform(actor.role, Action::ListAllDefects, Ownership::none()) {
        Ok(Condition::all())
    } else {
        let assigned = assigned_defect_ids(db, actor.id).await?;
        Ok(engineer_scope_condition(actor.id, assigned))
    }
}

fn parse_filters(
    filters: &DefectFilters,
) -> Result<(Option<DefectStatus>, Option<Priority>), AppError> {
    let mut errors = Vec::new();

    let status = match filters.status.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match DefectStatus::parse(raw) {
            Some(s) => Some(s),
            None => {
                errors.push(ValidationFieldError {
                    field: "status".to_string(),
                    message: "Недопустимое значение статуса".to_string(),
                });
                None
            }
        },
    };

    let priority = match filters.priority.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match Priority::parse(raw) {
            Some(p) => Some(p),
            None => {
                errors.push(ValidationFieldError {
                    field: "priority".to_string(),
                    message: "Недопустимое значение приоритета".to_string(),
                });
                None
            }
        },
    };

    if errors.is_empty() {
        Ok((status, priority))
    } else {
        Err(AppError::ValidationError(errors))
    }
}

pub async fn list_defects(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    filters: DefectFilters,
) -> Result<DefectListResponse, AppError> {
    let (status, priority) = parse_filters(&filters)?;
    let page = filters.page.unwrap_or(1).max(1);

    let mut condition = role_scope(db, actor).await?;
    if let Some(status) = status {
        condition = condition.add(defect::Column::Status.eq(status));
    }
    if let Some(priority) = priority {
        condition = condition.add(defect::Column::Priority.eq(priority));
    }

    let total = DefectEntity::find()
        .filter(condition.clone())
        .count(db)
        .await?;

    let items = DefectEntity::find()
        .filter(condition)
        .order_by_desc(defect::Column::CreatedAt)
        .limit(DEFAULT_PAGE_SIZE)
        .offset(page.saturating_sub(1).saturating_mul(DEFAULT_PAGE_SIZE))
        .all(db)
        .await?
        .into_iter()
        .map(DefectResponse::from)
        .collect();

    Ok(DefectListResponse {
        items,
        page,
        per_page: DEFAULT_PAGE_SIZE,
        total,
    })
}

pub async fn get_defect_detail(
    db: &DatabaseConnection,
    actor: &CurrentUser,
    defect_id: i32,
) -> Result<DefectDetailResponse, AppError> {
    let defect = DefectEntity::find_by_id(defect_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::DefectNotFound))?;

    // The defect exists but is hidden: a scoped-out engineer gets a
    // permission error, not a not-found.
    let ownership = ownership_facts(db, actor, &defect).await?;
    if !can_perform(actor.role, Action::ViewDefect, ownership) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let active_assignment = find_active_assignment(db, defect_id).await?;

    let comments = CommentEntity::find()
        .filter(comment::Column::DefectId.eq(defect_id))
        .order_by_asc(comment::Column::CreatedAt)
        .find_also_related(UserEntity)
        .all(db)
        .await?
        .into_iter()
        .map(|(c, author)| CommentResponse::with_author(c, author.map(|a| a.full_name)))
        .collect();

    let photos = PhotoEntity::find()
        .filter(photo::Column::DefectId.eq(defect_id))
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(DefectDetailResponse {
        defect: defect.into(),
        active_assignment: active_assignment.map(Into::into),
        comments,
        photos,
    })
}

#[derive(Debug, FromQueryResult)]
struct GroupCountRow {
    value: String,
    count: i64,
}

async fn defects_grouped_by(
    db: &DatabaseConnection,
    column: defect::Column,
) -> Result<Vec<GroupCountRow>, AppError> {
    let rows = DefectEntity::find()
        .select_only()
        .column_as(column, "value")
        .column_as(defect::Column::Id.count(), "count")
        .group_by(column)
        .into_model::<GroupCountRow>()
        .all(db)
        .await?;

    Ok(rows)
}

async fn open_defects_count(db: &DatabaseConnection) -> Result<u64, AppError> {
    let count = DefectEntity::find()
        .filter(defect::Column::Status.is_in([
            DefectStatus::Open,
            DefectStatus::Assigned,
            DefectStatus::InProgress,
        ]))
        .count(db)
        .await?;
    Ok(count)
}

pub async fn dashboard(
    db: &DatabaseConnection,
    actor: &CurrentUser,
) -> Result<DashboardResponse, AppError> {
    match actor.role {
        Role::Engineer => {
            let created = DefectEntity::find()
                .filter(defect::Column::CreatorId.eq(actor.id))
                .count(db)
                .await?;

            let assigned_ids = assigned_defect_ids(db, actor.id).await?;
            let assigned = assigned_ids.len() as u64;

            let recent = DefectEntity::find()
                .filter(engineer_scope_condition(actor.id, assigned_ids))
                .order_by_desc(defect::Column::UpdatedAt)
                .limit(5)
                .all(db)
                .await?;

            Ok(DashboardResponse::Engineer(EngineerDashboard {
                created_defects: created,
                assigned_defects: assigned,
                recent_defects: recent.into_iter().map(Into::into).collect(),
            }))
        }
        Role::Manager => {
            let total = DefectEntity::find().count(db).await?;
            let open = open_defects_count(db).await?;
            let resolved = DefectEntity::find()
                .filter(defect::Column::Status.eq(DefectStatus::Resolved))
                .count(db)
                .await?;
            let closed = DefectEntity::find()
                .filter(defect::Column::Status.eq(DefectStatus::Closed))
                .count(db)
                .await?;
            let critical = DefectEntity::find()
                .filter(defect::Column::Severity.eq(Severity::Critical))
                .count(db)
                .await?;
            let high = DefectEntity::find()
                .filter(defect::Column::Severity.eq(Severity::High))
                .count(db)
                .await?;

            let recent = DefectEntity::find()
                .order_by_desc(defect::Column::CreatedAt)
                .limit(10)
                .all(db)
                .await?;

            Ok(DashboardResponse::Manager(ManagerDashboard {
                total_defects: total,
                open_defects: open,
                resolved_defects: resolved,
                closed_defects: closed,
                critical_defects: critical,
                high_defects: high,
                recent_defects: recent.into_iter().map(Into::into).collect(),
            }))
        }
        Role::Observer => {
            let total = DefectEntity::find().count(db).await?;
            let open = open_defects_count(db).await?;
            let resolved = DefectEntity::find()
                .filter(defect::Column::Status.eq(DefectStatus::Resolved))
                .count(db)
                .await?;
            let closed = DefectEntity::find()
                .filter(defect::Column::Status.eq(DefectStatus::Closed))
                .count(db)
                .await?;

            let status_distribution: BTreeMap<String, i64> =
                defects_grouped_by(db, defect::Column::Status)
                    .await?
                    .into_iter()
                    .map(|r| (r.value, r.count))
                    .collect();
            let severity_distribution: BTreeMap<String, i64> =
                defects_grouped_by(db, defect::Column::Severity)
                    .await?
                    .into_iter()
                    .map(|r| (r.value, r.count))
                    .collect();

            let recent = DefectEntity::find()
                .order_by_desc(defect::Column::CreatedAt)
                .limit(5)
                .all(db)
                .await?;

            Ok(DashboardResponse::Observer(ObserverDashboard {
                total_defects: total,
                open_defects: open,
                resolved_defects: resolved,
                closed_defects: closed,
                status_distribution,
                severity_distribution,
                recent_defects: recent.into_iter().map(Into::into).collect(),
            }))
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct UserActivityQueryRow {
    full_name: String,
    role: Role,
    defects_created: i64,
}

#[derive(Debug, FromQueryResult)]
struct AssignmentLoadQueryRow {
    full_name: String,
    active_assignments: i64,
}

pub async fn reports(
    db: &DatabaseConnection,
    actor: &CurrentUser,
) -> Result<ReportsResponse, AppError> {
    if !can_perform(actor.role, Action::ViewReports, Ownership::none()) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let by_status = defects_grouped_by(db, defect::Column::Status).await?;
    let by_severity = defects_grouped_by(db, defect::Column::Severity).await?;
    let by_priority = defects_grouped_by(db, defect::Column::Priority).await?;

    let user_activity = UserEntity::find()
        .select_only()
        .column(user::Column::FullName)
        .column(user::Column::Role)
        .column_as(defect::Column::Id.count(), "defects_created")
        .join(JoinType::InnerJoin, user::Relation::CreatedDefects.def())
        .group_by(user::Column::Id)
        .group_by(user::Column::FullName)
        .group_by(user::Column::Role)
        .into_model::<UserActivityQueryRow>()
        .all(db)
        .await?;

    let assignment_load = UserEntity::find()
        .select_only()
        .column(user::Column::FullName)
        .column_as(assignment::Column::Id.count(), "active_assignments")
        .join(JoinType::InnerJoin, user::Relation::Assignments.def())
        .filter(assignment::Column::IsActive.eq(true))
        .group_by(user::Column::Id)
        .group_by(user::Column::FullName)
        .into_model::<AssignmentLoadQueryRow>()
        .all(db)
        .await?;

    let to_group = |rows: Vec<GroupCountRow>| {
        rows.into_iter()
            .map(|r| GroupCount {
                value: r.value,
                count: r.count,
            })
            .collect()
    };

    Ok(ReportsResponse {
        by_status: to_group(by_status),
        by_severity: to_group(by_severity),
        by_priority: to_group(by_priority),
        user_activity: user_activity
            .into_iter()
            .map(|r| UserActivityRow {
                full_name: r.full_name,
                role: r.role,
                defects_created: r.defects_created,
            })
            .collect(),
        assignment_load: assignment_load
            .into_iter()
            .map(|r| AssignmentLoadRow {
                full_name: r.full_name,
                active_assignments: r.active_assignments,
            })
            .collect(),
    })
}

/// Users that may be picked as assignees (engineers and managers).
pub async fn list_assignable_users(
    db: &DatabaseConnection,
    actor: &CurrentUser,
) -> Result<Vec<AssignableUserResponse>, AppError> {
    if !can_perform(actor.role, Action::ListAssignableUsers, Ownership::none()) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let users = UserEntity::find()
        .filter(user::Column::Role.is_in([Role::Engineer, Role::Manager]))
        .all(db)
        .await?
        .into_iter()
        .map(|u| AssignableUserResponse {
            id: u.id,
            name: u.full_name,
            username: u.username,
            role: u.role,
        })
        .collect();

    Ok(users)
}
