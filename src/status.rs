use std::fmt;

/// Settlement status of a [`Deferred`](crate::Deferred).
///
/// A deferred starts out `Pending` and moves to `Resolved` or `Rejected`
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    #[default]
    Pending,
    Resolved,
    Rejected,
}

impl Status {
    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    pub fn is_resolved(self) -> bool {
        self == Status::Resolved
    }

    pub fn is_rejected(self) -> bool {
        self == Status::Rejected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Resolved => "resolved",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
