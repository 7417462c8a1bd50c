use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    #[serde(rename = "Manager", alias = "manager")]
    Manager,
    #[serde(rename = "Deputy Manager", alias = "deputy_manager", alias = "deputy-manager")]
    DeputyManager,
    #[serde(rename = "Room Leader", alias = "room_leader", alias = "room-leader")]
    RoomLeader,
    #[serde(rename = "Area Manager", alias = "area_manager", alias = "area-manager")]
    AreaManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Manager,
        Role::DeputyManager,
        Role::RoomLeader,
        Role::AreaManager,
    ];

    /// Display name, also the value stored in `form_submissions.role`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::DeputyManager => "Deputy Manager",
            Role::RoomLeader => "Room Leader",
            Role::AreaManager => "Area Manager",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::DeputyManager => "deputy-manager",
            Role::RoomLeader => "room-leader",
            Role::AreaManager => "area-manager",
        }
    }

    /// Exact, case-sensitive match against the stored display names.
    pub fn from_stored(value: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == value)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse used for URL segments and request bodies.
impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "manager" => Ok(Role::Manager),
            "deputy-manager" | "deputy" => Ok(Role::DeputyManager),
            "room-leader" => Ok(Role::RoomLeader),
            "area-manager" => Ok(Role::AreaManager),
            _ => Err(()),
        }
    }
}

/// A stored form completion. `role` stays a raw string: rows written by older
/// clients may carry values outside the canonical set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub submitted_at: DateTime<Utc>,
    pub submission_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubmission {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub submission_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::try_from("Deputy Manager"), Ok(Role::DeputyManager));
        assert_eq!(Role::try_from("room_leader"), Ok(Role::RoomLeader));
        assert_eq!(Role::try_from("area-manager"), Ok(Role::AreaManager));
        assert!(Role::try_from("Cook").is_err());
    }

    #[test]
    fn test_stored_role_is_case_sensitive() {
        assert_eq!(Role::from_stored("Room Leader"), Some(Role::RoomLeader));
        assert_eq!(Role::from_stored("room leader"), None);
    }

    #[test]
    fn test_role_serde_uses_display_names() {
        let json = serde_json::to_string(&Role::AreaManager).unwrap();
        assert_eq!(json, "\"Area Manager\"");
        let parsed: Role = serde_json::from_str("\"deputy_manager\"").unwrap();
        assert_eq!(parsed, Role::DeputyManager);
    }
}
