use serde::{Deserialize, Serialize};

/// Account role. Admins hold every permission; moderators hold only the
/// grants in their [`AdminPermissions`]; plain users hold none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "moderator" => Some(UserRole::Moderator),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Permission check for this role given the account's grant set.
    #[must_use]
    pub fn permits(&self, grants: Option<&AdminPermissions>, permission: Permission) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Moderator => grants.is_some_and(|g| g.allows(permission)),
            UserRole::User => false,
        }
    }
}

/// A single grantable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageUsers,
    ManageSections,
    ManageLessons,
    ManageQuestions,
    ManageSigns,
    ManageDictionary,
    ManagePosts,
    ViewReports,
    ViewLogs,
    ViewStats,
}

/// Per-account grant set for moderators. Admins ignore it (they pass every
/// check); plain users never reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPermissions {
    pub manage_users: bool,
    pub manage_sections: bool,
    pub manage_lessons: bool,
    pub manage_questions: bool,
    pub manage_signs: bool,
    pub manage_dictionary: bool,
    pub manage_posts: bool,
    pub view_reports: bool,
    pub view_logs: bool,
    pub view_stats: bool,
}

impl AdminPermissions {
    /// No grants at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Every grant set.
    #[must_use]
    pub fn all() -> Self {
        Self {
            manage_users: true,
            manage_sections: true,
            manage_lessons: true,
            manage_questions: true,
            manage_signs: true,
            manage_dictionary: true,
            manage_posts: true,
            view_reports: true,
            view_logs: true,
            view_stats: true,
        }
    }

    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ManageUsers => self.manage_users,
            Permission::ManageSections => self.manage_sections,
            Permission::ManageLessons => self.manage_lessons,
            Permission::ManageQuestions => self.manage_questions,
            Permission::ManageSigns => self.manage_signs,
            Permission::ManageDictionary => self.manage_dictionary,
            Permission::ManagePosts => self.manage_posts,
            Permission::ViewReports => self.view_reports,
            Permission::ViewLogs => self.view_logs,
            Permission::ViewStats => self.view_stats,
        }
    }
}
