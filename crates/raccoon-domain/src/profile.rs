use serde::{Deserialize, Serialize};

/// Account owner as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub owner_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl UserProfile {
    pub fn new(owner_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            display_name: display_name.into(),
            handle: None,
        }
    }

    /// Returns a renamed copy; the caller decides where to store it.
    pub fn with_display_name(&self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..self.clone()
        }
    }

    /// Explicit handle, or the display name lower-cased without whitespace.
    pub fn handle(&self) -> String {
        match &self.handle {
            Some(handle) => handle.clone(),
            None => self
                .display_name
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect(),
        }
    }
}
