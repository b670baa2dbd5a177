//! TOML settings: the global sharing configuration and the team roster.
//!
//! ```toml
//! [sharing]
//! company_expense_pct = 15
//!
//! [sharing.levels]
//! 0 = 20
//! 1 = 15
//! 6 = 5
//!
//! [[members]]
//! id = "M001"
//! name = "Asha"
//! level = 6
//!
//! [members.custom_levels]
//! 1 = 40
//! 6 = 60
//! ```
//!
//! A missing `[sharing]` table falls back to
//! [`SharingConfig::system_default`]; missing `level_names` fall back to the
//! standard labels.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use payout_core::{SharingConfig, SharingConfigError, TeamMember};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("team member '{0}' is listed more than once")]
    DuplicateMember(String),

    #[error("unknown team member '{0}'")]
    UnknownMember(String),

    #[error("global sharing configuration: {0}")]
    InvalidSharing(#[from] SharingConfigError),

    #[error("override for team member '{member}': {source}")]
    InvalidOverride {
        member: String,
        #[source]
        source: SharingConfigError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PayoutSettings {
    #[serde(default)]
    pub sharing: SharingConfig,

    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl PayoutSettings {
    /// Parses settings from TOML text.
    ///
    /// Only structural problems are rejected here; percentage totals are
    /// checked by [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// [`ConfigLoadError::Parse`] for malformed TOML or values, and
    /// [`ConfigLoadError::DuplicateMember`] when a member id repeats.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigLoadError> {
        let settings: Self = toml::from_str(input)?;

        let mut seen = HashSet::new();
        for member in &settings.members {
            if !seen.insert(member.id.as_str()) {
                return Err(ConfigLoadError::DuplicateMember(member.id.clone()));
            }
        }

        debug!(members = settings.members.len(), "Parsed payout settings");
        Ok(settings)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// [`ConfigLoadError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "Loaded payout settings");
        Ok(settings)
    }

    /// Looks up a team member by id.
    ///
    /// # Errors
    ///
    /// [`ConfigLoadError::UnknownMember`] if no member has that id.
    pub fn member(
        &self,
        id: &str,
    ) -> Result<&TeamMember, ConfigLoadError> {
        self.members
            .iter()
            .find(|member| member.id == id)
            .ok_or_else(|| ConfigLoadError::UnknownMember(id.to_string()))
    }

    /// Applies the admin-save rules to the global configuration and every
    /// member override.
    ///
    /// # Errors
    ///
    /// The first [`ConfigLoadError::InvalidSharing`] or
    /// [`ConfigLoadError::InvalidOverride`] found.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.sharing.validate()?;
        for member in &self.members {
            if let Some(levels) = &member.custom_levels {
                levels
                    .validate_total()
                    .map_err(|source| ConfigLoadError::InvalidOverride {
                        member: member.id.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }
}
