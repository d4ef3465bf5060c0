use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "defects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    pub severity: Severity,
    pub status: DefectStatus,
    pub priority: Priority,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub due_date: Option<DateTimeWithTimeZone>,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    pub creator_id: i32,
}

impl Model {
    /// Past the due date and still not resolved or closed.
    pub fn is_overdue(&self) -> bool {
        match self.due_date {
            Some(due) => {
                due < Utc::now()
                    && !matches!(self.status, DefectStatus::Resolved | DefectStatus::Closed)
            }
            None => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id"
    )]
    Creator,

    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignments,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::photo::Entity")]
    Photos,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DefectStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl DefectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectStatus::Open => "open",
            DefectStatus::Assigned => "assigned",
            DefectStatus::InProgress => "in_progress",
            DefectStatus::Resolved => "resolved",
            DefectStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<DefectStatus> {
        match value {
            "open" => Some(DefectStatus::Open),
            "assigned" => Some(DefectStatus::Assigned),
            "in_progress" => Some(DefectStatus::InProgress),
            "resolved" => Some(DefectStatus::Resolved),
            "closed" => Some(DefectStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Severity> {
        match value {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Priority> {
        match value {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn defect(status: DefectStatus, due: Option<chrono::DateTime<Utc>>) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            title: "Трещина в стене".to_string(),
            description: "Вертикальная трещина на третьем этаже".to_string(),
            location: "Корпус Б, этаж 3".to_string(),
            severity: Severity::High,
            status,
            priority: Priority::Normal,
            created_at: now.into(),
            updated_at: now.into(),
            due_date: due.map(Into::into),
            resolved_at: None,
            creator_id: 1,
        }
    }

    #[test]
    fn overdue_requires_past_due_date() {
        let past = Utc::now() - Duration::days(1);
        let future = Utc::now() + Duration::days(1);

        assert!(defect(DefectStatus::Open, Some(past)).is_overdue());
        assert!(!defect(DefectStatus::Open, Some(future)).is_overdue());
        assert!(!defect(DefectStatus::Open, None).is_overdue());
    }

    #[test]
    fn overdue_ignores_resolved_and_closed() {
        let past = Utc::now() - Duration::days(1);

        assert!(!defect(DefectStatus::Resolved, Some(past)).is_overdue());
        assert!(!defect(DefectStatus::Closed, Some(past)).is_overdue());
        assert!(defect(DefectStatus::InProgress, Some(past)).is_overdue());
    }

    #[test]
    fn status_parse_round_trips() {
        for raw in ["open", "assigned", "in_progress", "resolved", "closed"] {
            assert_eq!(DefectStatus::parse(raw).unwrap().as_str(), raw);
        }
        assert!(DefectStatus::parse("reopened").is_none());
        assert!(DefectStatus::parse("").is_none());
    }
}
