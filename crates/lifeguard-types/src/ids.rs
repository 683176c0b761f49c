//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Shifts, lifeguards, centers, flags, alerts and zones all carry a
//! strongly-typed ID so a shift id can never be handed to a flag endpoint
//! by accident. The collaborator API assigns ids on create; the `new()`
//! constructors exist for tests and for the in-memory collaborator.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Declares one record id: a [`Uuid`] newtype that travels as a bare UUID
/// string in REST bodies, NATS payloads and channel subjects.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Mint a fresh time-ordered id the way the collaborator does on
            /// create. Only the in-memory backend and tests call this.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        /// A freshly minted id; see [`Self::new`].
        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        /// Hyphenated lowercase form, as used in URLs and subjects.
        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        /// Accepts any form [`Uuid::parse_str`] does, so ids pasted from
        /// the admin UI or an environment variable parse as-is.
        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a scheduled duty shift.
    ShiftId
}

define_id! {
    /// Unique identifier for a lifeguard (a user with the lifeguard role).
    LifeguardId
}

define_id! {
    /// Unique identifier for a beach-safety center.
    CenterId
}

define_id! {
    /// Unique identifier for a safety flag declaration.
    FlagId
}

define_id! {
    /// Unique identifier for an emergency alert.
    AlertId
}

define_id! {
    /// Unique identifier for a supervised beach zone.
    ZoneId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_uuid() {
        let id = ShiftId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.0));
    }

    #[test]
    fn collaborator_assigned_id_is_kept_verbatim() {
        let raw = "\"0197e3a2-5c1d-7b40-9a6e-2f3c4d5e6f70\"";
        let id: ZoneId = serde_json::from_str(raw).unwrap_or_default();
        assert_eq!(format!("\"{id}\""), raw);
    }

    #[test]
    fn id_parses_from_display() {
        let id = CenterId::new();
        let parsed: Result<CenterId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn pasted_id_tolerates_whitespace_and_case() {
        let parsed = " 0197E3A2-5C1D-7B40-9A6E-2F3C4D5E6F70\n".parse::<AlertId>();
        assert_eq!(
            parsed.map(|id| id.to_string()).ok().as_deref(),
            Some("0197e3a2-5c1d-7b40-9a6e-2f3c4d5e6f70")
        );
    }

    #[test]
    fn garbage_does_not_parse() {
        assert!("not-a-uuid".parse::<FlagId>().is_err());
    }
}
