use serde::{Deserialize, Serialize};

use crate::directory::domain::listing::Searchable;

/// Enrolled person as listed by `GET /api/users`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dept: String,
    /// True once the backend holds a face embedding for this person.
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl Searchable for Identity {
    fn search_keys(&self) -> [&str; 2] {
        [self.name.as_str(), self.id.as_str()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentitySummary {
    pub total: usize,
    pub verified: usize,
}

impl IdentitySummary {
    pub fn of(identities: &[Identity]) -> Self {
        Self {
            total: identities.len(),
            verified: identities.iter().filter(|i| i.is_verified).count(),
        }
    }
}
