//! Role gate for the dashboard
//!
//! Admins share a single password; attachees (student technicians) sign in
//! without one. The role name is what gets recorded as `logged_by` on new
//! jobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::shared::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Attachee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Attachee => "Attachee",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Attachee => "Attachee/Technician",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect password")]
    InvalidPassword,
}

/// Check credentials for `role`
pub fn login(role: UserRole, password: &str, config: &AppConfig) -> Result<UserRole, AuthError> {
    match role {
        UserRole::Admin if password == config.admin_password => Ok(role),
        UserRole::Admin => {
            tracing::warn!("Rejected admin login");
            Err(AuthError::InvalidPassword)
        }
        UserRole::Attachee => Ok(role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::builder()
            .supabase_url("https://demo.supabase.co")
            .supabase_anon_key("anon")
            .admin_password("letmein")
            .build()
            .unwrap()
    }

    #[test]
    fn test_admin_requires_password() {
        assert_eq!(login(UserRole::Admin, "letmein", &config()), Ok(UserRole::Admin));
        assert_eq!(
            login(UserRole::Admin, "admin123", &config()),
            Err(AuthError::InvalidPassword)
        );
    }

    #[test]
    fn test_attachee_needs_no_password() {
        assert_eq!(login(UserRole::Attachee, "", &config()), Ok(UserRole::Attachee));
    }
}
