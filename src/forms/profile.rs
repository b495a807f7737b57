//! Edit profile form

use serde::Deserialize;

use crate::model::{Profile, ProfilePatch};

/// Raw profile input; every field is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl ProfileForm {
    /// A form pre-filled from the current profile
    pub fn edit(profile: &Profile) -> Self {
        Self {
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
        }
    }

    /// All four editable fields, blank ones written as empty strings
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            phone: Some(self.phone.trim().to_string()),
            address: Some(self.address.trim().to_string()),
        }
    }
}
