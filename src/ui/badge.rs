use std::fmt;

use crate::orchestrator::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Default,
    Destructive,
    Secondary,
}

/// Label plus icon for a job status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusBadge {
    pub label: String,
    pub icon: &'static str,
    pub variant: BadgeVariant,
}

impl JobStatusBadge {
    pub fn for_status(status: JobStatus) -> Self {
        let (icon, variant) = presentation(status);
        Self {
            label: status.to_string(),
            icon,
            variant,
        }
    }

    /// Raw status text from the API; unknown values look like Pending but keep their text.
    pub fn for_raw(status: &str) -> Self {
        let (icon, variant) = presentation(status.parse().unwrap_or(JobStatus::Pending));
        Self {
            label: status.to_string(),
            icon,
            variant,
        }
    }
}

fn presentation(status: JobStatus) -> (&'static str, BadgeVariant) {
    match status {
        JobStatus::Successful => ("✅", BadgeVariant::Default),
        JobStatus::Failed => ("❌", BadgeVariant::Destructive),
        JobStatus::Pending => ("🕒", BadgeVariant::Secondary),
        JobStatus::Running => ("▶️", BadgeVariant::Default),
        JobStatus::Stopped | JobStatus::Stopping => ("⚠️", BadgeVariant::Secondary),
    }
}

impl fmt::Display for JobStatusBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.icon, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_looks_like_pending() {
        let pending = JobStatusBadge::for_status(JobStatus::Pending);
        let unknown = JobStatusBadge::for_raw("Unknown");
        assert_eq!(unknown.icon, pending.icon);
        assert_eq!(unknown.variant, pending.variant);
        assert_eq!(unknown.label, "Unknown");
    }

    #[test]
    fn test_every_status_has_its_own_label() {
        for status in JobStatus::ALL {
            let badge = JobStatusBadge::for_raw(status.as_str());
            assert_eq!(badge, JobStatusBadge::for_status(status));
        }
        assert_eq!(JobStatusBadge::for_status(JobStatus::Failed).variant, BadgeVariant::Destructive);
        assert_eq!(JobStatusBadge::for_status(JobStatus::Running).to_string(), "[▶️ Running]");
    }
}
