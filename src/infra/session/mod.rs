//! Signed-in session context.
//!
//! Stored as a small JSON file on disk:
//! ```json
//! { "role": "student", "email": "kim@school.org", "student_id": "S100" }
//! ```
//! A missing file means nobody is signed in. The session is loaded once at
//! startup and handed to the commands that need it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

impl Session {
    pub fn admin(email: Option<String>) -> Self {
        Self {
            role: Role::Admin,
            email,
            student_id: None,
        }
    }

    pub fn student(student_id: String, email: Option<String>) -> Self {
        Self {
            role: Role::Student,
            email,
            student_id: Some(student_id),
        }
    }

    /// Loads the session at `path`; `Ok(None)` if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading session file {}", path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("parsing session file {}", path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("writing session file {}", path.display()))
    }

    /// Signs out by removing the session file. Missing file is not an error.
    pub fn clear(path: impl AsRef<Path>) -> Result<()> {
        match std::fs::remove_file(path.as_ref()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The student id, if this is a student session.
    pub fn student_id(&self) -> Option<&str> {
        match self.role {
            Role::Student => self.student_id.as_deref(),
            Role::Admin => None,
        }
    }
}
