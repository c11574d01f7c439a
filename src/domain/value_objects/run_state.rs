use serde::Serialize;

/// Lifecycle of a single scheduled run.
///
/// `Idle -> Generating -> Generated -> Uploading -> Delivered | Failed`, with
/// `Cancelled` reachable from any non-terminal state and `Failed` reachable
/// from `Generating` or `Uploading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Generating,
    Generated,
    Uploading,
    Delivered,
    Failed,
    Cancelled,
}

impl RunState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Cancelled)
    }

    /// Moves to `next` if the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns the rejected `(from, to)` pair when the transition is not part
    /// of the run lifecycle.
    pub const fn advance(self, next: Self) -> Result<Self, (Self, Self)> {
        let legal = match (self, next) {
            (Self::Idle, Self::Generating)
            | (Self::Generating, Self::Generated | Self::Failed)
            | (Self::Generated, Self::Uploading)
            | (Self::Uploading, Self::Delivered | Self::Failed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        };
        if legal {
            Ok(next)
        } else {
            Err((self, next))
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Generated => "generated",
            Self::Uploading => "uploading",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        let mut state = RunState::Idle;
        for next in [
            RunState::Generating,
            RunState::Generated,
            RunState::Uploading,
            RunState::Delivered,
        ] {
            state = state.advance(next).unwrap_or_else(|e| panic!("{e:?}"));
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn generation_is_not_retried() {
        assert!(RunState::Generated.advance(RunState::Generating).is_err());
        assert!(RunState::Failed.advance(RunState::Generating).is_err());
    }

    #[test]
    fn generated_cannot_fail_without_uploading() {
        assert!(RunState::Generated.advance(RunState::Failed).is_err());
    }

    #[test]
    fn cancel_from_any_live_state() {
        for state in [
            RunState::Idle,
            RunState::Generating,
            RunState::Generated,
            RunState::Uploading,
        ] {
            assert_eq!(state.advance(RunState::Cancelled), Ok(RunState::Cancelled));
        }
        assert!(RunState::Delivered.advance(RunState::Cancelled).is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Delivered.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(RunState::Cancelled.is_terminal());
        assert!(!RunState::Uploading.is_terminal());
    }
}
