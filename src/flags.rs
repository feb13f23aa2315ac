//! Permission flags and roles for the scanning workflow
//!
//! The flag vocabulary is fixed at build time: fifteen named capabilities
//! across the Projects -> Scans -> Findings -> Reports pipeline. Each flag
//! owns one bit in a permission mask (see `set.rs`).

use serde::{Deserialize, Serialize};

/// Number of permission flags
pub const FLAG_COUNT: usize = 15;

/// One named boolean capability in the scanning workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PermissionFlag {
    ViewProjects = 0,
    CreateProject,
    UpdateProject,
    DeleteProject,
    ViewScans,
    CreateScan,
    UpdateScan,
    DeleteScan,
    ViewFindings,
    ValidateFinding,
    DeleteFinding,
    ViewReports,
    CreateReport,
    UpdateReport,
    DeleteReport,
}

/// All flags in workflow order
pub const ALL_FLAGS: [PermissionFlag; FLAG_COUNT] = [
    PermissionFlag::ViewProjects,
    PermissionFlag::CreateProject,
    PermissionFlag::UpdateProject,
    PermissionFlag::DeleteProject,
    PermissionFlag::ViewScans,
    PermissionFlag::CreateScan,
    PermissionFlag::UpdateScan,
    PermissionFlag::DeleteScan,
    PermissionFlag::ViewFindings,
    PermissionFlag::ValidateFinding,
    PermissionFlag::DeleteFinding,
    PermissionFlag::ViewReports,
    PermissionFlag::CreateReport,
    PermissionFlag::UpdateReport,
    PermissionFlag::DeleteReport,
];

impl PermissionFlag {
    /// The bit this flag occupies in a permission mask
    #[inline]
    pub const fn bit(self) -> u64 {
        1 << self as u8
    }

    /// Array index of this flag (same as its bit position)
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire name, e.g. `view_projects`
    pub const fn name(self) -> &'static str {
        match self {
            PermissionFlag::ViewProjects => "view_projects",
            PermissionFlag::CreateProject => "create_project",
            PermissionFlag::UpdateProject => "update_project",
            PermissionFlag::DeleteProject => "delete_project",
            PermissionFlag::ViewScans => "view_scans",
            PermissionFlag::CreateScan => "create_scan",
            PermissionFlag::UpdateScan => "update_scan",
            PermissionFlag::DeleteScan => "delete_scan",
            PermissionFlag::ViewFindings => "view_findings",
            PermissionFlag::ValidateFinding => "validate_finding",
            PermissionFlag::DeleteFinding => "delete_finding",
            PermissionFlag::ViewReports => "view_reports",
            PermissionFlag::CreateReport => "create_report",
            PermissionFlag::UpdateReport => "update_report",
            PermissionFlag::DeleteReport => "delete_report",
        }
    }

    /// Look up a flag by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_FLAGS.iter().copied().find(|f| f.name() == name)
    }

    /// Human-readable title, e.g. `Delete Report`
    pub fn title(self) -> String {
        let mut out = String::with_capacity(self.name().len());
        for (i, word) in self.name().split('_').enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let mut chars = word.chars();
            if let Some(c) = chars.next() {
                out.extend(c.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
        out
    }

    /// Workflow category this flag belongs to
    pub const fn category(self) -> Category {
        match self {
            PermissionFlag::ViewProjects
            | PermissionFlag::CreateProject
            | PermissionFlag::UpdateProject
            | PermissionFlag::DeleteProject => Category::Projects,
            PermissionFlag::ViewScans
            | PermissionFlag::CreateScan
            | PermissionFlag::UpdateScan
            | PermissionFlag::DeleteScan => Category::Scans,
            PermissionFlag::ViewFindings
            | PermissionFlag::ValidateFinding
            | PermissionFlag::DeleteFinding => Category::Findings,
            PermissionFlag::ViewReports
            | PermissionFlag::CreateReport
            | PermissionFlag::UpdateReport
            | PermissionFlag::DeleteReport => Category::Reports,
        }
    }
}

impl std::fmt::Display for PermissionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Workflow categories, used for grouping in admin surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Projects,
    Scans,
    Findings,
    Reports,
}

impl Category {
    /// Flags in this category, workflow order
    pub fn flags(self) -> impl Iterator<Item = PermissionFlag> {
        ALL_FLAGS.into_iter().filter(move |f| f.category() == self)
    }
}

/// A role that owns an editable permission set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
}

/// Roles with editable permission sets
pub const ALL_ROLES: [Role; 2] = [Role::User, Role::Manager];

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Role::User),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for flag in ALL_FLAGS {
            assert_eq!(PermissionFlag::from_name(flag.name()), Some(flag));
        }
        assert_eq!(PermissionFlag::from_name("view_everything"), None);
    }

    #[test]
    fn test_bits_are_distinct() {
        let mut seen = 0u64;
        for flag in ALL_FLAGS {
            assert_eq!(seen & flag.bit(), 0);
            seen |= flag.bit();
        }
        assert_eq!(seen.count_ones() as usize, FLAG_COUNT);
    }

    #[test]
    fn test_titles() {
        assert_eq!(PermissionFlag::DeleteReport.title(), "Delete Report");
        assert_eq!(PermissionFlag::ViewProjects.title(), "View Projects");
    }

    #[test]
    fn test_categories_cover_all_flags() {
        let counted: usize = [
            Category::Projects,
            Category::Scans,
            Category::Findings,
            Category::Reports,
        ]
        .into_iter()
        .map(|c| c.flags().count())
        .sum();
        assert_eq!(counted, FLAG_COUNT);
        assert_eq!(Category::Findings.flags().count(), 3);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::from_name("manager"), Some(Role::Manager));
        assert_eq!(Role::from_name("admin"), None);
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn test_flag_serde() {
        let json = serde_json::to_string(&PermissionFlag::ValidateFinding).unwrap();
        assert_eq!(json, "\"validate_finding\"");
        let flag: PermissionFlag = serde_json::from_str("\"delete_scan\"").unwrap();
        assert_eq!(flag, PermissionFlag::DeleteScan);
    }
}
