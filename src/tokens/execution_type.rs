//! Causal-role tags for tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TokenStateError;

/// Tags a token with its causal role and live-vs-backtracked status.
///
/// Live roles:
///
/// - `Forward`: ordinary forward execution
/// - `Backward`: rewind bookkeeping created while unwinding history
/// - `UTurn`: a rewound link re-entering live forward execution (its
///   ancestry lies outside the rewound region)
///
/// Each live role has a `*Backtracked` counterpart marking the token as
/// inert, audit-only history. The only way to reach a backtracked variant
/// is [`corresponding_backtracked`](Self::corresponding_backtracked); the
/// mapping is total over live inputs and refuses already-backtracked ones.
///
/// # Examples
///
/// ```rust
/// use oxbow::tokens::ExecutionType;
///
/// let t = ExecutionType::Forward;
/// assert!(!t.is_backtracked());
/// assert_eq!(
///     t.corresponding_backtracked(true).unwrap(),
///     ExecutionType::ForwardBacktracked,
/// );
/// assert!(
///     ExecutionType::ForwardBacktracked
///         .corresponding_backtracked(true)
///         .is_err()
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionType {
    Forward,
    ForwardBacktracked,
    Backward,
    BackwardBacktracked,
    UTurn,
    UTurnBacktracked,
}

impl ExecutionType {
    /// Returns `true` if this tag marks inert, backtracked history.
    #[must_use]
    pub fn is_backtracked(self) -> bool {
        matches!(
            self,
            Self::ForwardBacktracked | Self::BackwardBacktracked | Self::UTurnBacktracked
        )
    }

    /// Maps a live type to its backtracked counterpart.
    ///
    /// `is_complete` is the token's completion state at the moment of
    /// marking. Both columns of the mapping agree for every live type; the
    /// flag is part of the contract so that an undefined combination (an
    /// already-backtracked input, in either completion state) fails loudly
    /// instead of being guessed.
    ///
    /// | from     | complete              | incomplete            |
    /// |----------|-----------------------|-----------------------|
    /// | Forward  | `ForwardBacktracked`  | `ForwardBacktracked`  |
    /// | Backward | `BackwardBacktracked` | `BackwardBacktracked` |
    /// | UTurn    | `UTurnBacktracked`    | `UTurnBacktracked`    |
    /// | *Backtracked | error             | error                 |
    pub fn corresponding_backtracked(
        self,
        is_complete: bool,
    ) -> Result<ExecutionType, TokenStateError> {
        match self {
            Self::Forward => Ok(Self::ForwardBacktracked),
            Self::Backward => Ok(Self::BackwardBacktracked),
            Self::UTurn => Ok(Self::UTurnBacktracked),
            Self::ForwardBacktracked | Self::BackwardBacktracked | Self::UTurnBacktracked => {
                Err(TokenStateError::UndefinedTransition {
                    from: self,
                    is_complete,
                })
            }
        }
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Forward => "Forward",
            Self::ForwardBacktracked => "ForwardBacktracked",
            Self::Backward => "Backward",
            Self::BackwardBacktracked => "BackwardBacktracked",
            Self::UTurn => "UTurn",
            Self::UTurnBacktracked => "UTurnBacktracked",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_types_map_to_their_counterpart() {
        for complete in [true, false] {
            assert_eq!(
                ExecutionType::Forward
                    .corresponding_backtracked(complete)
                    .unwrap(),
                ExecutionType::ForwardBacktracked
            );
            assert_eq!(
                ExecutionType::Backward
                    .corresponding_backtracked(complete)
                    .unwrap(),
                ExecutionType::BackwardBacktracked
            );
            assert_eq!(
                ExecutionType::UTurn
                    .corresponding_backtracked(complete)
                    .unwrap(),
                ExecutionType::UTurnBacktracked
            );
        }
    }

    #[test]
    fn backtracked_types_are_rejected() {
        for t in [
            ExecutionType::ForwardBacktracked,
            ExecutionType::BackwardBacktracked,
            ExecutionType::UTurnBacktracked,
        ] {
            for complete in [true, false] {
                assert!(t.corresponding_backtracked(complete).is_err());
                assert!(t.is_backtracked());
            }
        }
    }
}
