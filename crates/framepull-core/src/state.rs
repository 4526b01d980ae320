//! Pull session state types.

/// The current state of the pull manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session active
    Idle,
    /// A session is pulling frames
    Running,
}
