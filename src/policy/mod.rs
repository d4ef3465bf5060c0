//! Role-based access decisions, kept free of any database access.
//!
//! Every mutating or scoped-read handler asks this table before touching the
//! store. Ownership facts (creator / active assignee) are looked up by the
//! caller and passed in, so the decision itself stays a pure function.

use crate::entity::user::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    CreateDefect,
    ViewDefect,
    ListAllDefects,
    AssignDefect,
    UpdateStatus,
    AddComment,
    ViewReports,
    ListAssignableUsers,
}

/// Relationship between the actor and a concrete defect. Irrelevant fields
/// stay false for actions that are not defect-scoped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ownership {
    pub is_creator: bool,
    pub is_active_assignee: bool,
}

impl Ownership {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(is_creator: bool, is_active_assignee: bool) -> Self {
        Self {
            is_creator,
            is_active_assignee,
        }
    }

    fn any(&self) -> bool {
        self.is_creator || self.is_active_assignee
    }
}

pub fn can_perform(role: Role, action: Action, ownership: Ownership) -> bool {
    match action {
        Action::CreateDefect => matches!(role, Role::Engineer | Role::Manager),

        Action::ViewDefect => match role {
            Role::Manager | Role::Observer => true,
            Role::Engineer => ownership.any(),
        },

        // Engineers still list defects, but the query service narrows the
        // scope to created-or-assigned rows.
        Action::ListAllDefects => matches!(role, Role::Manager | Role::Observer),

        Action::AssignDefect | Action::ListAssignableUsers => matches!(role, Role::Manager),

        Action::UpdateStatus => match role {
            Role::Manager => true,
            Role::Engineer => ownership.any(),
            Role::Observer => false,
        },

        // Deliberately permissive: any authenticated user may comment.
        Action::AddComment => true,

        Action::ViewReports => matches!(role, Role::Manager | Role::Observer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_RELATION: Ownership = Ownership {
        is_creator: false,
        is_active_assignee: false,
    };
    const CREATOR: Ownership = Ownership {
        is_creator: true,
        is_active_assignee: false,
    };
    const ASSIGNEE: Ownership = Ownership {
        is_creator: false,
        is_active_assignee: true,
    };

    #[test]
    fn create_defect_denied_for_observer() {
        assert!(can_perform(Role::Engineer, Action::CreateDefect, NO_RELATION));
        assert!(can_perform(Role::Manager, Action::CreateDefect, NO_RELATION));
        assert!(!can_perform(Role::Observer, Action::CreateDefect, NO_RELATION));
    }

    #[test]
    fn view_defect_scoped_for_engineer() {
        assert!(!can_perform(Role::Engineer, Action::ViewDefect, NO_RELATION));
        assert!(can_perform(Role::Engineer, Action::ViewDefect, CREATOR));
        assert!(can_perform(Role::Engineer, Action::ViewDefect, ASSIGNEE));

        assert!(can_perform(Role::Manager, Action::ViewDefect, NO_RELATION));
        assert!(can_perform(Role::Observer, Action::ViewDefect, NO_RELATION));
    }

    #[test]
    fn only_managers_assign() {
        for role in [Role::Engineer, Role::Observer] {
            assert!(!can_perform(role, Action::AssignDefect, CREATOR));
            assert!(!can_perform(role, Action::ListAssignableUsers, NO_RELATION));
        }
        assert!(can_perform(Role::Manager, Action::AssignDefect, NO_RELATION));
        assert!(can_perform(Role::Manager, Action::ListAssignableUsers, NO_RELATION));
    }

    #[test]
    fn update_status_matrix() {
        assert!(can_perform(Role::Manager, Action::UpdateStatus, NO_RELATION));

        assert!(!can_perform(Role::Engineer, Action::UpdateStatus, NO_RELATION));
        assert!(can_perform(Role::Engineer, Action::UpdateStatus, CREATOR));
        assert!(can_perform(Role::Engineer, Action::UpdateStatus, ASSIGNEE));

        // Observers never mutate, ownership facts notwithstanding.
        assert!(!can_perform(Role::Observer, Action::UpdateStatus, CREATOR));
        assert!(!can_perform(Role::Observer, Action::UpdateStatus, ASSIGNEE));
    }

    #[test]
    fn comments_open_to_all_roles() {
        for role in [Role::Engineer, Role::Manager, Role::Observer] {
            assert!(can_perform(role, Action::AddComment, NO_RELATION));
        }
    }

    #[test]
    fn reports_for_manager_and_observer_only() {
        assert!(!can_perform(Role::Engineer, Action::ViewReports, NO_RELATION));
        assert!(can_perform(Role::Manager, Action::ViewReports, NO_RELATION));
        assert!(can_perform(Role::Observer, Action::ViewReports, NO_RELATION));
    }

    #[test]
    fn unscoped_listing_reserved_for_manager_and_observer() {
        assert!(!can_perform(Role::Engineer, Action::ListAllDefects, NO_RELATION));
        assert!(can_perform(Role::Manager, Action::ListAllDefects, NO_RELATION));
        assert!(can_perform(Role::Observer, Action::ListAllDefects, NO_RELATION));
    }
}
