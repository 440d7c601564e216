//! # Session
//!
//! Who is performing an operation. Authentication happens elsewhere; this
//! layer only needs an identity to stamp on `created_by` columns.

use std::fmt;

/// Source of the current actor's identity.
///
/// Services hold one; an operation's explicit `actor` argument takes
/// precedence over it.
pub trait Session: Send + Sync + fmt::Debug {
    /// `None` when nobody is signed in.
    fn current_actor(&self) -> Option<String>;
}

/// The identity to record: `explicit` if given, else the session's.
pub fn resolve_actor(session: &dyn Session, explicit: Option<&str>) -> Option<String> {
    match explicit {
        Some(actor) => Some(actor.to_string()),
        None => session.current_actor(),
    }
}

/// A fixed identity, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSession {
    actor: Option<String>,
}

impl StaticSession {
    pub fn new(actor: impl Into<String>) -> Self {
        StaticSession {
            actor: Some(actor.into()),
        }
    }

    pub fn anonymous() -> Self {
        StaticSession { actor: None }
    }
}

impl Session for StaticSession {
    fn current_actor(&self) -> Option<String> {
        self.actor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_session() {
        assert_eq!(StaticSession::new("cashier-1").current_actor().as_deref(), Some("cashier-1"));
        assert_eq!(StaticSession::anonymous().current_actor(), None);
    }

    #[test]
    fn test_explicit_actor_wins() {
        let session = StaticSession::new("cashier-1");
        assert_eq!(resolve_actor(&session, None).as_deref(), Some("cashier-1"));
        assert_eq!(resolve_actor(&session, Some("manager")).as_deref(), Some("manager"));
        assert_eq!(resolve_actor(&StaticSession::anonymous(), None), None);
    }
}
