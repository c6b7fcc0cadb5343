// Explorer session: which user, branch and worksheet language are selected.
//
// Selection is a tagged state; every downstream fetch goes through `SessionState::gate`
// and only proceeds once a concrete branch is selected.

use serde::Serialize;

use crate::api::middleware::AppError;
use crate::models::{Branch, BranchGroups, Language, MAIN_BRANCH};

/// Prompt shown while no user is selected
pub const SELECT_USER_PROMPT: &str = "Hi there! Please select a user to begin.";
/// Prompt shown while a user but no branch is selected
pub const SELECT_BRANCH_PROMPT: &str = "Please choose a branch.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    NoneSelected,
    UserSelected {
        user: String,
    },
    BranchSelected {
        user: String,
        branch: Branch,
    },
}

/// Result of gating a fetch on the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate<'a> {
    Ready(&'a Branch),
    Halted(&'static str),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    selection: Selection,
    language: Language,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        tracing::debug!("Worksheet language set to {}", language.as_str());
        self.language = language;
    }

    /// Select a user from the branch picker.
    /// `main` has a single branch, so selecting it selects the branch too.
    pub fn select_user(&mut self, user: Option<&str>, groups: &BranchGroups) -> Result<&Selection, AppError> {
        self.selection = match user {
            None => Selection::NoneSelected,
            Some(MAIN_BRANCH) => Selection::BranchSelected {
                user: MAIN_BRANCH.to_string(),
                branch: Branch::Main,
            },
            Some(user) => {
                if groups.branches_of(user).is_none() {
                    return Err(AppError::NotFound(format!("User {} has no branches", user)));
                }
                Selection::UserSelected {
                    user: user.to_string(),
                }
            }
        };

        tracing::info!("Selection changed: {:?}", self.selection);
        Ok(&self.selection)
    }

    /// Select one of the current user's branches by its name within the namespace
    pub fn select_branch(&mut self, name: Option<&str>, groups: &BranchGroups) -> Result<&Selection, AppError> {
        let user = match &self.selection {
            Selection::NoneSelected => {
                return Err(AppError::Validation("Select a user before choosing a branch".to_string()))
            }
            Selection::UserSelected { user } | Selection::BranchSelected { user, .. } => user.clone(),
        };

        self.selection = match name {
            None if user == MAIN_BRANCH => Selection::NoneSelected,
            None => Selection::UserSelected { user },
            Some(name) => {
                let branch = groups.resolve(&user, name).ok_or_else(|| {
                    AppError::NotFound(format!("Branch {} not found for user {}", name, user))
                })?;
                Selection::BranchSelected { user, branch }
            }
        };

        tracing::info!("Selection changed: {:?}", self.selection);
        Ok(&self.selection)
    }

    /// Whether downstream fetching may proceed, and against which branch
    pub fn gate(&self) -> Gate<'_> {
        match &self.selection {
            Selection::NoneSelected => Gate::Halted(SELECT_USER_PROMPT),
            Selection::UserSelected { .. } => Gate::Halted(SELECT_BRANCH_PROMPT),
            Selection::BranchSelected { branch, .. } => Gate::Ready(branch),
        }
    }

    /// Owned branch to use for a fetch, or the prompt to show instead
    pub fn active_branch(&self) -> Result<Branch, &'static str> {
        match self.gate() {
            Gate::Ready(branch) => Ok(branch.clone()),
            Gate::Halted(prompt) => Err(prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_service::group_branches_by_user;

    fn groups() -> BranchGroups {
        let ids: Vec<String> = ["main", "alice.dev", "alice.prod", "bob.etl"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        group_branches_by_user(&ids, &[])
    }

    #[test]
    fn test_starts_halted_with_sql_mode() {
        let session = SessionState::new();
        assert_eq!(session.gate(), Gate::Halted(SELECT_USER_PROMPT));
        assert_eq!(session.language(), Language::Sql);
    }

    #[test]
    fn test_user_then_branch() {
        let groups = groups();
        let mut session = SessionState::new();

        session.select_user(Some("alice"), &groups).unwrap();
        assert_eq!(session.gate(), Gate::Halted(SELECT_BRANCH_PROMPT));

        session.select_branch(Some("prod"), &groups).unwrap();
        assert_eq!(session.active_branch(), Ok(Branch::user_branch("alice", "prod")));

        session.select_branch(None, &groups).unwrap();
        assert_eq!(session.selection(), &Selection::UserSelected { user: "alice".into() });
    }

    #[test]
    fn test_main_selects_branch_directly() {
        let mut session = SessionState::new();
        session.select_user(Some("main"), &groups()).unwrap();
        assert_eq!(session.gate(), Gate::Ready(&Branch::Main));
    }

    #[test]
    fn test_selecting_none_halts() {
        let groups = groups();
        let mut session = SessionState::new();
        session.select_user(Some("bob"), &groups).unwrap();
        session.select_branch(Some("etl"), &groups).unwrap();

        session.select_user(None, &groups).unwrap();
        assert_eq!(session.active_branch(), Err(SELECT_USER_PROMPT));
    }

    #[test]
    fn test_invalid_selections() {
        let groups = groups();
        let mut session = SessionState::new();

        assert!(matches!(session.select_branch(Some("dev"), &groups), Err(AppError::Validation(_))));
        assert!(matches!(session.select_user(Some("carol"), &groups), Err(AppError::NotFound(_))));

        session.select_user(Some("alice"), &groups).unwrap();
        assert!(matches!(session.select_branch(Some("etl"), &groups), Err(AppError::NotFound(_))));
        assert_eq!(session.gate(), Gate::Halted(SELECT_BRANCH_PROMPT));
    }

    #[test]
    fn test_language_toggle() {
        let mut session = SessionState::new();
        session.set_language(Language::Python);
        assert_eq!(session.language(), Language::Python);
    }
}
