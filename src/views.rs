use crate::models::AppData;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Dashboard,
    Profile,
    Water,
    Meals,
    Workout,
}

impl Tab {
    /// Tracking tabs log against the selected user.
    pub fn requires_user(self) -> bool {
        matches!(self, Tab::Water | Tab::Meals | Tab::Workout)
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dashboard" => Ok(Tab::Dashboard),
            "profile" => Ok(Tab::Profile),
            "water" => Ok(Tab::Water),
            "meals" => Ok(Tab::Meals),
            "workout" => Ok(Tab::Workout),
            other => Err(format!("unknown tab '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabResponse {
    pub requested: Tab,
    pub shown: Tab,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Decides which tab is actually shown: tracking tabs fall back to the
/// dashboard until a user is selected.
pub fn open_tab(data: &AppData, requested: Tab) -> TabResponse {
    if requested.requires_user() && data.current_user.is_none() {
        return TabResponse {
            requested,
            shown: Tab::Dashboard,
            notice: Some("Please select a user from the dashboard first!".to_string()),
        };
    }

    TabResponse {
        requested,
        shown: requested,
        notice: None,
    }
}
