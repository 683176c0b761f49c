//! Startup options read from the environment.
//!
//! - `LIFEGUARD_CONFIG`: path to the YAML config (default `lifeguard-config.yaml`)
//! - `LIFEGUARD_SCOPE`: `system` or a center UUID (default `system`)
//! - `LIFEGUARD_ROLE`: `lifeguard`, `center_admin` or `system_admin`
//!   (default picked from the scope)
//! - `LIFEGUARD_ID`: restrict the shift list to one lifeguard's roster

use std::path::PathBuf;

use lifeguard_sync::SyncHandlers;
use lifeguard_types::{CenterId, LifeguardId, Scope};

use crate::error::MonitorError;

const DEFAULT_CONFIG_PATH: &str = "lifeguard-config.yaml";

/// Which dashboard the monitor imitates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Alerts, flag, weather and the own roster.
    Lifeguard,
    /// The lifeguard view plus zones and staff counts.
    CenterAdmin,
    /// Alerts across every center.
    SystemAdmin,
}

impl Role {
    fn parse(raw: &str) -> Result<Self, MonitorError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lifeguard" => Ok(Self::Lifeguard),
            "center_admin" => Ok(Self::CenterAdmin),
            "system_admin" => Ok(Self::SystemAdmin),
            other => Err(MonitorError::Option {
                name: "LIFEGUARD_ROLE",
                reason: format!("unknown role {other:?}"),
            }),
        }
    }

    const fn default_for(scope: Scope) -> Self {
        match scope {
            Scope::System => Self::SystemAdmin,
            Scope::Center { .. } => Self::CenterAdmin,
        }
    }

    /// The handler set this role's dashboard registers.
    pub fn handlers(self) -> SyncHandlers {
        match self {
            Self::Lifeguard => SyncHandlers::lifeguard(),
            Self::CenterAdmin => SyncHandlers::center_admin(),
            Self::SystemAdmin => SyncHandlers::system_admin(),
        }
    }

    /// Short name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lifeguard => "lifeguard",
            Self::CenterAdmin => "center_admin",
            Self::SystemAdmin => "system_admin",
        }
    }
}

/// Parsed startup options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Config file location.
    pub config_path: PathBuf,
    /// Scope to mount on.
    pub scope: Scope,
    /// Dashboard to imitate.
    pub role: Role,
    /// Roster owner, when watching one lifeguard's shifts.
    pub lifeguard: Option<LifeguardId>,
}

impl Options {
    /// Read options from the process environment.
    pub fn from_env() -> Result<Self, MonitorError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MonitorError> {
        let config_path = lookup("LIFEGUARD_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        let scope = match lookup("LIFEGUARD_SCOPE") {
            None => Scope::System,
            Some(raw) if raw.trim().eq_ignore_ascii_case("system") => Scope::System,
            Some(raw) => raw
                .trim()
                .parse::<CenterId>()
                .map(Scope::center)
                .map_err(|e| MonitorError::Option {
                    name: "LIFEGUARD_SCOPE",
                    reason: e.to_string(),
                })?,
        };

        let role = match lookup("LIFEGUARD_ROLE") {
            Some(raw) => Role::parse(&raw)?,
            None => Role::default_for(scope),
        };
        if role != Role::SystemAdmin && scope == Scope::System {
            return Err(MonitorError::Option {
                name: "LIFEGUARD_ROLE",
                reason: format!("{} dashboards need a center scope", role.as_str()),
            });
        }

        let lifeguard = lookup("LIFEGUARD_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<LifeguardId>()
                    .map_err(|e| MonitorError::Option {
                        name: "LIFEGUARD_ID",
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        Ok(Self {
            config_path,
            scope,
            role,
            lifeguard,
        })
    }
}
