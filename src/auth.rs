//! Sign-in. Writes and cloud sync require a signed-in user; statistics are public.

use crate::models::RosterError;
use log::{info, warn};
use std::collections::HashMap;

/// Checks credentials and returns the canonical user id (the email).
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<String, RosterError>;
}

/// Fixed set of `email -> password` pairs, usually from the `ROSTER_USERS` variable.
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        self.users
            .insert(email.trim().to_lowercase(), password.to_string());
        self
    }

    /// Parse `email:password` pairs separated by commas. Malformed pairs are skipped.
    pub fn parse(users: &str) -> Self {
        let mut creds = Self::new();
        for pair in users.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once(':') {
                Some((email, password)) if !email.trim().is_empty() && !password.is_empty() => {
                    creds = creds.with_user(email, password);
                }
                _ => warn!("Ignoring malformed user entry (expected email:password)"),
            }
        }
        creds
    }

    pub fn from_env() -> Self {
        let creds = Self::parse(&std::env::var("ROSTER_USERS").unwrap_or_default());
        if creds.is_empty() {
            warn!("ROSTER_USERS is empty; nobody can sign in");
        } else {
            info!("{} user(s) configured", creds.users.len());
        }
        creds
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityProvider for StaticCredentials {
    fn sign_in(&self, email: &str, password: &str) -> Result<String, RosterError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(RosterError::MissingField("email"));
        }
        match self.users.get(&email) {
            Some(expected) if expected == password => Ok(email),
            _ => Err(RosterError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_checks_passwords() {
        let creds = StaticCredentials::parse("coach@club.es:secret, bad-entry ,staff@club.es:a:b");
        assert_eq!(creds.sign_in("Coach@Club.es", "secret"), Ok("coach@club.es".to_string()));
        assert_eq!(creds.sign_in("staff@club.es", "a:b"), Ok("staff@club.es".to_string()));
        assert_eq!(creds.sign_in("coach@club.es", "nope"), Err(RosterError::InvalidCredentials));
        assert_eq!(creds.sign_in("", "x"), Err(RosterError::MissingField("email")));
    }
}
