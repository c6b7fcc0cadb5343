use serde::Deserialize;

use super::submission::Language;

/// Body of a user or branch selection event; a missing name is the "none" choice
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Language,
}
