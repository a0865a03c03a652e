//! Operator login gate.
//!
//! A binary allow/deny signal in front of node edits and hazard control.
//! It never affects how a tick computes readings.

use crate::logging::{self, Component};
use crate::model::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Nobody has chosen yet; the login prompt is showing.
    SignedOut,
    /// Browsing without credentials. Read-only.
    Guest,
    /// Logged in; may edit nodes and drive simulations.
    Operator,
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    username: String,
    password: String,
    access: Access,
}

impl AccessGate {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            access: Access::SignedOut,
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_authenticated(&self) -> bool {
        self.access == Access::Operator
    }

    /// Guests see the simulation panel locked.
    pub fn simulation_locked(&self) -> bool {
        self.access == Access::Guest
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), DashboardError> {
        if username == self.username && password == self.password {
            self.access = Access::Operator;
            logging::info(Component::Auth, Some(username), "operator logged in");
            Ok(())
        } else {
            logging::warn(Component::Auth, Some(username), "login rejected");
            Err(DashboardError::AccessDenied)
        }
    }

    pub fn continue_as_guest(&mut self) {
        self.access = Access::Guest;
    }

    pub fn logout(&mut self) {
        if self.access == Access::Operator {
            logging::info(Component::Auth, None, "operator logged out");
        }
        self.access = Access::SignedOut;
    }

    /// Refuses `action` unless an operator is logged in.
    pub fn require(&self, action: &str) -> Result<(), DashboardError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(DashboardError::NotAuthenticated(format!("Please login to {}", action)))
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new("admin", "admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_with_matching_credentials() {
        let mut gate = AccessGate::default();
        assert_eq!(gate.access(), Access::SignedOut);
        gate.login("admin", "admin").expect("default credentials accepted");
        assert!(gate.is_authenticated());
        assert!(gate.require("remove nodes").is_ok());
    }

    #[test]
    fn test_wrong_password_keeps_previous_access() {
        let mut gate = AccessGate::default();
        gate.continue_as_guest();
        assert_eq!(gate.login("admin", "hunter2"), Err(DashboardError::AccessDenied));
        assert_eq!(gate.access(), Access::Guest);
        assert!(gate.simulation_locked());
    }

    #[test]
    fn test_require_names_the_refused_action() {
        let gate = AccessGate::default();
        assert_eq!(
            gate.require("add nodes"),
            Err(DashboardError::NotAuthenticated("Please login to add nodes".to_string()))
        );
    }

    #[test]
    fn test_logout_returns_to_signed_out() {
        let mut gate = AccessGate::new("ops", "secret");
        gate.login("ops", "secret").expect("custom credentials accepted");
        gate.logout();
        assert_eq!(gate.access(), Access::SignedOut);
        assert!(!gate.is_authenticated());
    }
}
