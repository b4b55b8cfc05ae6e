//! Invocation errors

use crate::reflect::MemberId;
use thiserror::Error;

/// Target label used for static members.
pub(crate) const STATIC_TARGET: &str = "<static>";

/// Errors surfaced by the invocation helpers.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The invoked hook itself failed
    #[error("{member} failed on {target}")]
    TargetThrew {
        /// Member that was invoked
        member: MemberId,
        /// Type name of the target (or `<static>`)
        target: String,
        /// Error returned by the hook
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// An instance member was used without a target
    #[error("{member} is an instance member and needs a target")]
    MissingTarget {
        /// Member that was used
        member: MemberId,
    },

    /// The target does not contain the member's declaring type
    #[error("{member} is not reachable on {target}")]
    NotApplicable {
        /// Member that was used
        member: MemberId,
        /// Type name of the target
        target: String,
    },

    /// A field was written with a value of the wrong type
    #[error("Value for {member} is not a {expected}")]
    ValueType {
        /// Field that was written
        member: MemberId,
        /// Declared field type
        expected: String,
    },
}

impl InvokeError {
    pub(crate) fn target_threw(member: &MemberId, target: &str, source: anyhow::Error) -> Self {
        Self::TargetThrew {
            member: member.clone(),
            target: target.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn missing_target(member: &MemberId) -> Self {
        Self::MissingTarget {
            member: member.clone(),
        }
    }

    pub(crate) fn not_applicable(member: &MemberId, target: &str) -> Self {
        Self::NotApplicable {
            member: member.clone(),
            target: target.to_string(),
        }
    }

    pub(crate) fn value_type(member: &MemberId, expected: &str) -> Self {
        Self::ValueType {
            member: member.clone(),
            expected: expected.to_string(),
        }
    }

    /// Whether the failure came from the hook rather than the machinery.
    pub fn is_target_failure(&self) -> bool {
        matches!(self, Self::TargetThrew { .. })
    }
}
