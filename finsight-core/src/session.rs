//! Session state and the guard run on entry to a protected view.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credential::{Credential, SessionContext, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Authenticated,
    Unauthenticated,
}

/// Navigation targets of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Login,
    Register,
    Dashboard,
}

impl View {
    pub fn path(&self) -> &'static str {
        match self {
            View::Login => "/auth/login",
            View::Register => "/auth/register",
            View::Dashboard => "/",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of mounting a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded {
    /// Render the view's content.
    Authenticated { view: View, credential: Credential },
    /// Navigate away and render nothing further.
    Redirect(View),
}

impl Guarded {
    pub fn state(&self) -> SessionState {
        match self {
            Guarded::Authenticated { .. } => SessionState::Authenticated,
            Guarded::Redirect(_) => SessionState::Unauthenticated,
        }
    }

    pub fn redirect(&self) -> Option<View> {
        match self {
            Guarded::Redirect(v) => Some(*v),
            Guarded::Authenticated { .. } => None,
        }
    }
}

/// One-shot check for a single view mount.
///
/// `mount` consumes the guard, so the decision is made exactly once; a
/// credential revoked later (by another process, say) is not noticed until
/// the next mount.
#[derive(Debug)]
pub struct SessionGuard {
    view: View,
}

impl SessionGuard {
    pub fn new(view: View) -> Self {
        Self { view }
    }

    /// A store whose contents cannot be parsed holds no usable credential and
    /// redirects like an empty one. I/O failures are still reported.
    pub fn mount(self, session: &SessionContext) -> Result<Guarded, StoreError> {
        let stored = match session.get() {
            Ok(stored) => stored,
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!(view = %self.view, error = %e, "unreadable credential treated as absent");
                None
            }
            Err(e) => return Err(e),
        };
        match stored {
            Some(credential) => {
                tracing::debug!(view = %self.view, "session guard passed");
                Ok(Guarded::Authenticated {
                    view: self.view,
                    credential,
                })
            }
            None => {
                tracing::info!(view = %self.view, "no credential; redirecting to login");
                Ok(Guarded::Redirect(View::Login))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirects_iff_store_empty() {
        let ctx = SessionContext::in_memory();
        let g = SessionGuard::new(View::Dashboard).mount(&ctx).unwrap();
        assert_eq!(g, Guarded::Redirect(View::Login));
        assert_eq!(g.state(), SessionState::Unauthenticated);

        ctx.set(&Credential::new("abc").unwrap()).unwrap();
        let g = SessionGuard::new(View::Dashboard).mount(&ctx).unwrap();
        assert_eq!(g.redirect(), None);
        assert_eq!(g.state(), SessionState::Authenticated);
    }

    #[test]
    fn test_decision_is_fixed_at_mount() {
        let ctx = SessionContext::in_memory();
        ctx.set(&Credential::new("abc").unwrap()).unwrap();
        let g = SessionGuard::new(View::Dashboard).mount(&ctx).unwrap();

        // revoked after mount: the mounted view keeps its decision
        ctx.clear().unwrap();
        assert_eq!(g.state(), SessionState::Authenticated);

        let again = SessionGuard::new(View::Dashboard).mount(&ctx).unwrap();
        assert_eq!(again.redirect(), Some(View::Login));
    }

    #[test]
    fn test_logout_then_mount_redirects() {
        let ctx = SessionContext::in_memory();
        ctx.set(&Credential::new("abc").unwrap()).unwrap();
        ctx.logout().unwrap();
        let g = SessionGuard::new(View::Dashboard).mount(&ctx).unwrap();
        assert_eq!(g.redirect(), Some(View::Login));
    }

    #[test]
    fn test_view_paths() {
        assert_eq!(View::Login.path(), "/auth/login");
        assert_eq!(View::Register.path(), "/auth/register");
        assert_eq!(View::Dashboard.to_string(), "/");
    }
}
