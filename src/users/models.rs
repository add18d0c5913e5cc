//! Federated user data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::services::google::GoogleUserInfo;

/// A user who signed in through Google, keyed by the Google account id
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FederatedUser {
    pub google_id: String,
    pub email: String,
    pub verified_email: bool,
    pub name: String,
    pub picture: String,
    pub locale: String,
}

impl FederatedUser {
    pub fn from_profile(profile: &GoogleUserInfo) -> Self {
        Self {
            google_id: profile.id.clone(),
            email: profile.email.clone(),
            verified_email: profile.verified_email,
            name: profile.name.clone(),
            picture: profile.picture.clone(),
            locale: profile.locale.clone(),
        }
    }

    /// Refreshes the mutable profile fields. `google_id` is left untouched.
    pub fn apply_profile(&mut self, profile: &GoogleUserInfo) {
        self.email = profile.email.clone();
        self.verified_email = profile.verified_email;
        self.name = profile.name.clone();
        self.picture = profile.picture.clone();
        self.locale = profile.locale.clone();
    }
}
