use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::user::Role;
use crate::model::defect::DefectResponse;

/// Dashboard payload, shaped by the actor's role.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DashboardResponse {
    Engineer(EngineerDashboard),
    Manager(ManagerDashboard),
    Observer(ObserverDashboard),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineerDashboard {
    pub created_defects: u64,
    pub assigned_defects: u64,
    pub recent_defects: Vec<DefectResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDashboard {
    pub total_defects: u64,
    pub open_defects: u64,
    pub resolved_defects: u64,
    pub closed_defects: u64,
    pub critical_defects: u64,
    pub high_defects: u64,
    pub recent_defects: Vec<DefectResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObserverDashboard {
    pub total_defects: u64,
    pub open_defects: u64,
    pub resolved_defects: u64,
    pub closed_defects: u64,
    pub status_distribution: BTreeMap<String, i64>,
    pub severity_distribution: BTreeMap<String, i64>,
    pub recent_defects: Vec<DefectResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupCount {
    pub value: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityRow {
    pub full_name: String,
    #[schema(value_type = String)]
    pub role: Role,
    pub defects_created: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentLoadRow {
    pub full_name: String,
    pub active_assignments: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportsResponse {
    pub by_status: Vec<GroupCount>,
    pub by_severity: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    pub user_activity: Vec<UserActivityRow>,
    pub assignment_load: Vec<AssignmentLoadRow>,
}
