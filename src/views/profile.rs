//! Profile page

use serde::Serialize;

use crate::analytics::{profile_stats, ProfileStats};
use crate::model::{Account, Profile, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub profile: Option<Profile>,
    pub stats: ProfileStats,
    pub loading: bool,
}

pub fn build(
    profile: Option<Profile>,
    accounts: &[Account],
    transactions: &[Transaction],
    loading: bool,
) -> ProfileView {
    ProfileView {
        stats: profile_stats(profile.as_ref(), accounts, transactions),
        profile,
        loading,
    }
}
