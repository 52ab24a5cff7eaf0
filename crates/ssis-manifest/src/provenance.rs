//! Identity and clock sources recorded in a manifest's provenance attributes

use chrono::{DateTime, Utc};

use crate::errors::ManifestError;

/// Supplies the name recorded as `GeneratedBy`
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Result<String, ManifestError>;
}

/// Supplies the time recorded as `GeneratedDate`
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Identity of the user running the process, taken from the environment.
///
/// On Windows this is `DOMAIN\user`, elsewhere the login name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl IdentityProvider for SystemIdentity {
    fn current_identity(&self) -> Result<String, ManifestError> {
        identity_from(|key| std::env::var(key).ok(), cfg!(windows))
    }
}

fn identity_from(
    lookup: impl Fn(&str) -> Option<String>,
    windows: bool,
) -> Result<String, ManifestError> {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let name = if windows {
        non_empty("USERNAME").map(|user| match non_empty("USERDOMAIN") {
            Some(domain) => format!("{}\\{}", domain, user),
            None => user,
        })
    } else {
        non_empty("USER").or_else(|| non_empty("LOGNAME"))
    };

    name.ok_or_else(|| {
        ManifestError::IdentityUnavailable("no user name found in the environment".to_string())
    })
}

/// A fixed identity, e.g. a service account configured for builds
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl IdentityProvider for FixedIdentity {
    fn current_identity(&self) -> Result<String, ManifestError> {
        if self.0.trim().is_empty() {
            return Err(ManifestError::IdentityUnavailable(
                "configured identity is empty".to_string(),
            ));
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
