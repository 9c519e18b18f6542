use crate::config::ServerConfig;
use shared::Identity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credential for {0}")]
    InvalidCredential(Identity),
    #[error("join request names no known identity or password")]
    UnrecognizedJoin,
}

/// Static credentials for the two identities, fixed at startup.
#[derive(Debug, Clone)]
pub struct CredentialTable {
    passwords: [String; 2],
}

impl CredentialTable {
    pub fn new(ishan: impl Into<String>, sakshi: impl Into<String>) -> Self {
        Self {
            passwords: [ishan.into(), sakshi.into()],
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.password_for(Identity::Ishan),
            config.password_for(Identity::Sakshi),
        )
    }

    /// Pass/fail only. Binding the connection is up to the caller.
    pub fn authenticate(&self, claimed: Identity, credential: &str) -> Result<(), AuthError> {
        match self.passwords.get(claimed.index()) {
            Some(expected) if expected == credential => Ok(()),
            _ => Err(AuthError::InvalidCredential(claimed)),
        }
    }
}

impl Default for CredentialTable {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_matching_password() {
        let table = CredentialTable::default();
        assert_eq!(table.authenticate(Identity::Ishan, "ishu1"), Ok(()));
        assert_eq!(table.authenticate(Identity::Sakshi, "sakku2"), Ok(()));
        assert_eq!(
            table.authenticate(Identity::Ishan, "sakku2"),
            Err(AuthError::InvalidCredential(Identity::Ishan))
        );
        assert_eq!(
            table.authenticate(Identity::Sakshi, "SAKKU2"),
            Err(AuthError::InvalidCredential(Identity::Sakshi))
        );
        assert!(table.authenticate(Identity::Sakshi, "").is_err());
    }

    #[test]
    fn externalized_credentials_replace_the_defaults() {
        let table = CredentialTable::new("alpha", "beta");
        assert!(table.authenticate(Identity::Ishan, "ishu1").is_err());
        assert!(table.authenticate(Identity::Ishan, "alpha").is_ok());
        assert!(table.authenticate(Identity::Sakshi, "beta").is_ok());
    }
}
