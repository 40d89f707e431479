//! # Edit Sessions
//!
//! Nested begin/end-edit transactions.
//!
//! An [`EditSession`] is a stack of edit descriptions. Only the outermost
//! close reports [`EditOutcome::Commit`] or [`EditOutcome::Cancel`], so bulk
//! operations (clear the table, re-add N rows) pay for invariant repair once.
//!
//! [`EditGuard`] is the scoped way to open an edit: it derefs to the edited
//! value and closes the edit on every exit path, including early returns
//! through `?`.
//!
//! ## State Machine
//!
//! ```text
//! Idle → Editing → Committed
//!               ↘ Cancelled
//! ```

use std::ops::{Deref, DerefMut};

/// State of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    /// No edit was ever opened.
    #[default]
    Idle,
    /// At least one edit is open.
    Editing,
    /// The outermost edit was closed normally.
    Committed,
    /// The outermost edit closed after a cancel.
    Cancelled,
}

/// Result of closing one edit level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// An enclosing edit is still open.
    Nested,
    /// The outermost edit closed; repair must run.
    Commit,
    /// The outermost edit closed after a cancel; repair is skipped.
    Cancel,
}

/// Depth-counted edit stack.
///
/// # Example
///
/// ```rust
/// use hydro_xsection::edit::{EditOutcome, EditSession};
///
/// let mut session = EditSession::new();
/// session.begin("shift level");
/// session.begin("row changed");
/// assert_eq!(session.end(), EditOutcome::Nested);
/// assert_eq!(session.end(), EditOutcome::Commit);
/// ```
#[derive(Debug, Default)]
pub struct EditSession {
    stack: Vec<String>,
    state: EditState,
    cancelled: bool,
}

impl Clone for EditSession {
    // A copy never inherits an open transaction.
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl EditSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an edit level.
    pub fn begin(&mut self, description: impl Into<String>) {
        self.stack.push(description.into());
        self.state = EditState::Editing;
    }

    /// Closes the innermost edit level.
    pub fn end(&mut self) -> EditOutcome {
        self.close()
    }

    /// Closes the innermost edit level and marks the session cancelled.
    ///
    /// Values written so far are kept; only the final repair is skipped.
    pub fn cancel(&mut self) -> EditOutcome {
        self.cancelled = true;
        self.close()
    }

    fn close(&mut self) -> EditOutcome {
        if self.stack.pop().is_none() {
            tracing::debug!("edit closed without a matching begin");
            return EditOutcome::Nested;
        }
        if !self.stack.is_empty() {
            return EditOutcome::Nested;
        }
        if std::mem::take(&mut self.cancelled) {
            self.state = EditState::Cancelled;
            EditOutcome::Cancel
        } else {
            self.state = EditState::Committed;
            EditOutcome::Commit
        }
    }

    /// Returns true while an edit is open.
    #[inline]
    pub fn is_editing(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Number of open edit levels.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> EditState {
        self.state
    }

    /// Description of the outermost open edit.
    pub fn description(&self) -> Option<&str> {
        self.stack.first().map(String::as_str)
    }
}

/// A value that owns an [`EditSession`] and repairs itself when the
/// outermost edit closes.
pub trait Transactional {
    /// The session tracking open edits.
    fn edit_session(&mut self) -> &mut EditSession;

    /// Called once per outermost close.
    fn finish_edit(&mut self, outcome: EditOutcome);
}

/// Scoped edit on a [`Transactional`] value.
///
/// Dropping the guard ends the edit; [`EditGuard::cancel`] cancels it.
pub struct EditGuard<'a, T: Transactional> {
    target: &'a mut T,
    open: bool,
}

impl<'a, T: Transactional> EditGuard<'a, T> {
    /// Opens an edit on `target`.
    pub fn begin(target: &'a mut T, description: impl Into<String>) -> Self {
        target.edit_session().begin(description);
        Self { target, open: true }
    }

    /// Ends the edit now.
    pub fn end(mut self) {
        self.close(false);
    }

    /// Cancels the edit: no repair runs when this was the outermost level.
    pub fn cancel(mut self) {
        self.close(true);
    }

    fn close(&mut self, cancel: bool) {
        if !self.open {
            return;
        }
        self.open = false;
        let session = self.target.edit_session();
        let outcome = if cancel { session.cancel() } else { session.end() };
        if outcome != EditOutcome::Nested {
            self.target.finish_edit(outcome);
        }
    }
}

impl<T: Transactional> Deref for EditGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: Transactional> DerefMut for EditGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: Transactional> Drop for EditGuard<'_, T> {
    fn drop(&mut self) {
        self.close(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        session: EditSession,
        commits: usize,
        cancels: usize,
        value: i32,
    }

    impl Transactional for Counter {
        fn edit_session(&mut self) -> &mut EditSession {
            &mut self.session
        }

        fn finish_edit(&mut self, outcome: EditOutcome) {
            match outcome {
                EditOutcome::Commit => self.commits += 1,
                EditOutcome::Cancel => self.cancels += 1,
                EditOutcome::Nested => {}
            }
        }
    }

    fn bump(counter: &mut Counter) -> Result<(), String> {
        let mut edit = EditGuard::begin(counter, "bump");
        edit.value += 1;
        if edit.value > 1 {
            return Err("too large".to_string());
        }
        Ok(())
    }

    #[test]
    fn test_session_states() {
        let mut session = EditSession::new();
        assert_eq!(session.state(), EditState::Idle);
        session.begin("outer");
        assert!(session.is_editing());
        assert_eq!(session.description(), Some("outer"));
        assert_eq!(session.end(), EditOutcome::Commit);
        assert_eq!(session.state(), EditState::Committed);
        assert!(!session.is_editing());
    }

    #[test]
    fn test_nested_cancel_marks_outer_close() {
        let mut session = EditSession::new();
        session.begin("outer");
        session.begin("inner");
        assert_eq!(session.cancel(), EditOutcome::Nested);
        assert_eq!(session.end(), EditOutcome::Cancel);
        assert_eq!(session.state(), EditState::Cancelled);

        // The next transaction starts clean.
        session.begin("again");
        assert_eq!(session.end(), EditOutcome::Commit);
    }

    #[test]
    fn test_unbalanced_end_is_ignored() {
        let mut session = EditSession::new();
        assert_eq!(session.end(), EditOutcome::Nested);
        assert_eq!(session.state(), EditState::Idle);
    }

    #[test]
    fn test_guard_repairs_once_for_nested_edits() {
        let mut counter = Counter::default();
        {
            let mut outer = EditGuard::begin(&mut counter, "outer");
            for _ in 0..5 {
                let mut inner = EditGuard::begin(&mut *outer, "row changed");
                inner.value += 1;
            }
            assert_eq!(outer.commits, 0);
        }
        assert_eq!(counter.value, 5);
        assert_eq!(counter.commits, 1);
    }

    #[test]
    fn test_guard_closes_on_early_return() {
        let mut counter = Counter::default();
        assert!(bump(&mut counter).is_ok());
        assert!(bump(&mut counter).is_err());
        assert_eq!(counter.commits, 2);
        assert!(!counter.session.is_editing());
    }

    #[test]
    fn test_guard_cancel_skips_repair() {
        let mut counter = Counter::default();
        let mut edit = EditGuard::begin(&mut counter, "cancelled");
        edit.value = 7;
        edit.cancel();
        assert_eq!(counter.cancels, 1);
        assert_eq!(counter.commits, 0);
        // No rollback.
        assert_eq!(counter.value, 7);
    }

    #[test]
    fn test_clone_starts_idle() {
        let mut session = EditSession::new();
        session.begin("open");
        let copy = session.clone();
        assert!(!copy.is_editing());
        assert_eq!(copy.state(), EditState::Idle);
    }
}
