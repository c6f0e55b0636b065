#![forbid(unsafe_code)]

//! Status vocabularies for the job workflow.
//!
//! The DB-facing set and the tracker-facing set are deliberately disjoint at
//! the string level (`resume_written` vs `Resume Written`); they must never
//! be unified or parsed interchangeably.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    New,
    Shortlist,
    Reviewed,
    Reject,
    ResumeWritten,
    Applied,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::New,
        JobStatus::Shortlist,
        JobStatus::Reviewed,
        JobStatus::Reject,
        JobStatus::ResumeWritten,
        JobStatus::Applied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Shortlist => "shortlist",
            JobStatus::Reviewed => "reviewed",
            JobStatus::Reject => "reject",
            JobStatus::ResumeWritten => "resume_written",
            JobStatus::Applied => "applied",
        }
    }

    /// Exact, case-sensitive parse. Whitespace is the caller's problem: a
    /// padded value is not a valid status.
    pub fn parse(raw: &str) -> Option<JobStatus> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }

    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Reviewed,
    ResumeWritten,
    Applied,
    Interview,
    Offer,
    Rejected,
    Ghosted,
}

impl TrackerStatus {
    pub const ALL: [TrackerStatus; 7] = [
        TrackerStatus::Reviewed,
        TrackerStatus::ResumeWritten,
        TrackerStatus::Applied,
        TrackerStatus::Interview,
        TrackerStatus::Offer,
        TrackerStatus::Rejected,
        TrackerStatus::Ghosted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackerStatus::Reviewed => "Reviewed",
            TrackerStatus::ResumeWritten => "Resume Written",
            TrackerStatus::Applied => "Applied",
            TrackerStatus::Interview => "Interview",
            TrackerStatus::Offer => "Offer",
            TrackerStatus::Rejected => "Rejected",
            TrackerStatus::Ghosted => "Ghosted",
        }
    }

    pub fn parse(raw: &str) -> Option<TrackerStatus> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }

    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TrackerStatus::Rejected | TrackerStatus::Ghosted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Current and target status are identical; nothing to write.
    Noop,
    Allowed,
    /// Requires an explicit force override.
    Blocked,
}

/// Tracker transition policy.
///
/// The current status comes from a human-editable file and may be any
/// string; only the recognized forward progressions and the terminal sinks
/// are allowed without force.
pub fn evaluate_transition(current: &str, target: TrackerStatus) -> Transition {
    if current == target.as_str() {
        return Transition::Noop;
    }
    if target.is_terminal() {
        return Transition::Allowed;
    }
    match (TrackerStatus::parse(current), target) {
        (Some(TrackerStatus::Reviewed), TrackerStatus::ResumeWritten) => Transition::Allowed,
        (Some(TrackerStatus::ResumeWritten), TrackerStatus::Applied) => Transition::Allowed,
        _ => Transition::Blocked,
    }
}
