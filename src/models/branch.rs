use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::middleware::AppError;

/// Name of the shared trunk branch, the only branch outside a user namespace
pub const MAIN_BRANCH: &str = "main";

/// Separator between the user namespace and the branch name
pub const BRANCH_SEPARATOR: char = '.';

/// A data branch in the catalog: either `main` or `{user}.{name}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Branch {
    Main,
    User { user: String, name: String },
}

impl Branch {
    pub fn user_branch(user: impl Into<String>, name: impl Into<String>) -> Self {
        Branch::User {
            user: user.into(),
            name: name.into(),
        }
    }

    /// User namespace this branch belongs to (`main` for the trunk)
    pub fn user(&self) -> &str {
        match self {
            Branch::Main => MAIN_BRANCH,
            Branch::User { user, .. } => user,
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Branch::Main)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Main => f.write_str(MAIN_BRANCH),
            Branch::User { user, name } => write!(f, "{}{}{}", user, BRANCH_SEPARATOR, name),
        }
    }
}

impl FromStr for Branch {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == MAIN_BRANCH {
            return Ok(Branch::Main);
        }

        match s.split_once(BRANCH_SEPARATOR) {
            Some((MAIN_BRANCH, _)) => Err(AppError::Validation(format!(
                "Invalid branch '{}': '{}' is not a user namespace",
                s, MAIN_BRANCH
            ))),
            Some((user, name)) if !user.is_empty() && !name.is_empty() => {
                Ok(Branch::user_branch(user, name))
            }
            _ => Err(AppError::Validation(format!(
                "Invalid branch '{}': expected 'main' or '<user>{}<branch>'",
                s, BRANCH_SEPARATOR
            ))),
        }
    }
}

impl TryFrom<String> for Branch {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Branch> for String {
    fn from(branch: Branch) -> Self {
        branch.to_string()
    }
}

/// Branch names available to one user namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBranches {
    pub user: String,
    pub branches: Vec<String>,
}

/// Catalog branches partitioned by user, users in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchGroups {
    pub users: Vec<UserBranches>,
}

impl BranchGroups {
    pub fn user_names(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|group| group.user.as_str())
    }

    pub fn branches_of(&self, user: &str) -> Option<&[String]> {
        self.users
            .iter()
            .find(|group| group.user == user)
            .map(|group| group.branches.as_slice())
    }

    /// Resolve a `(user, branch name)` pair picked from the grouping
    pub fn resolve(&self, user: &str, name: &str) -> Option<Branch> {
        if user == MAIN_BRANCH {
            return self.branches_of(MAIN_BRANCH).map(|_| Branch::Main);
        }
        self.branches_of(user)?
            .iter()
            .any(|b| b == name)
            .then(|| Branch::user_branch(user, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_main() {
        let branch: Branch = "main".parse().unwrap();
        assert!(branch.is_main());
        assert_eq!(branch.to_string(), "main");
    }

    #[test]
    fn test_parse_user_branch_splits_on_first_separator() {
        let branch: Branch = "alice.feature.v2".parse().unwrap();
        assert_eq!(branch, Branch::user_branch("alice", "feature.v2"));
        assert_eq!(branch.user(), "alice");
        assert_eq!(branch.to_string(), "alice.feature.v2");
    }

    #[test]
    fn test_parse_rejects_unscoped_names() {
        assert!("dev".parse::<Branch>().is_err());
        assert!(".dev".parse::<Branch>().is_err());
        assert!("alice.".parse::<Branch>().is_err());
    }

    #[test]
    fn test_parse_rejects_main_namespace() {
        let err = "main.shadow".parse::<Branch>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(serde_json::from_str::<Branch>("\"main.dev\"").is_err());
    }

    #[test]
    fn test_branch_serializes_as_identifier() {
        let json = serde_json::to_string(&Branch::user_branch("bob", "etl")).unwrap();
        assert_eq!(json, "\"bob.etl\"");

        let back: Branch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Branch::user_branch("bob", "etl"));
    }

    #[test]
    fn test_groups_resolve() {
        let groups = BranchGroups {
            users: vec![
                UserBranches { user: "alice".into(), branches: vec!["dev".into()] },
                UserBranches { user: "main".into(), branches: vec!["main".into()] },
            ],
        };

        assert_eq!(groups.resolve("alice", "dev"), Some(Branch::user_branch("alice", "dev")));
        assert_eq!(groups.resolve("alice", "prod"), None);
        assert_eq!(groups.resolve("main", "main"), Some(Branch::Main));
        assert_eq!(groups.resolve("carol", "dev"), None);
    }
}
