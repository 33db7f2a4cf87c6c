//! State returned by action nodes.

/// The result of evaluating an action node.
///
/// # Frame-based Semantics
///
/// Nodes are evaluated once per host frame at most:
/// - Instant actions settle on the frame they are executed
/// - Multi-frame actions report `Running` until they settle
/// - `Fail` and `Error` are terminal and exceptional; composites stop
///   processing further siblings when they see one
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionState {
    /// The node has not been evaluated since its last reset.
    #[default]
    None,

    /// The node completed successfully.
    Success,

    /// A precondition of the node was not met (e.g. a missing target).
    Fail,

    /// The node has not settled yet and will be resumed on a later frame.
    Running,

    /// The node is misconfigured: a self-referencing composite, a dropped
    /// child, or a re-entrant execution.
    Error,
}

impl ActionState {
    /// Returns `true` if this state is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, ActionState::Success)
    }

    /// Returns `true` if this state is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, ActionState::Running)
    }

    /// Returns `true` if the node has settled (`Success`, `Fail` or `Error`).
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActionState::Success | ActionState::Fail | ActionState::Error
        )
    }

    /// Returns `true` for `Fail` and `Error`.
    #[inline]
    pub fn is_exceptional(self) -> bool {
        matches!(self, ActionState::Fail | ActionState::Error)
    }
}
