//! Project identity embedded in code signing certificates.

use serde::{Deserialize, Serialize};

use crate::error::{CodeSigningError, CodeSigningResult};

/// OID of the custom X.509 extension carrying project information.
pub const PROJECT_INFORMATION_OID: &str =
    "1.2.840.113556.1.8000.2554.43437.254.128.102.157.7894389.20439.2.1";

/// Project scope a certificate is restricted to.
///
/// The extension value is the UTF-8 text `"<scopeKey>,<projectId>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInformation {
    pub scope_key: String,
    pub project_id: String,
}

impl ProjectInformation {
    pub fn new(scope_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            scope_key: scope_key.into(),
            project_id: project_id.into(),
        }
    }

    /// Decode the raw extension value.
    pub fn from_extension_value(value: &[u8]) -> CodeSigningResult<Self> {
        let invalid = || CodeSigningError::InvalidProjectInformation {
            value: String::from_utf8_lossy(value).into_owned(),
        };

        let text = std::str::from_utf8(value).map_err(|_| invalid())?;
        let components: Vec<&str> = text.split(',').map(str::trim).collect();
        match components.as_slice() {
            [scope_key, project_id] if !scope_key.is_empty() && !project_id.is_empty() => {
                Ok(Self::new(*scope_key, *project_id))
            }
            _ => Err(invalid()),
        }
    }

    /// Whether a manifest's project id and scope key match this identity.
    pub fn matches(&self, project_id: &str, scope_key: &str) -> bool {
        self.project_id == project_id && self.scope_key == scope_key
    }
}
