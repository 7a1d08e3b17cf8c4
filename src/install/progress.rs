//! Installation progress tracking

/// How a progress message should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
}

/// Installation progress tracking
#[derive(Debug, Clone, PartialEq)]
pub struct InstallProgress {
    pub step: String,
    pub progress: f32, // 0.0 to 1.0
    pub message: String,
    pub level: Level,
}

impl InstallProgress {
    pub fn new(step: &str, progress: f32, message: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            level: Level::Info,
        }
    }

    pub fn success(step: &str, progress: f32, message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            ..Self::new(step, progress, message)
        }
    }

    pub fn warning(step: &str, progress: f32, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            ..Self::new(step, progress, message)
        }
    }

    /// Success or warning depending on `ok`
    pub fn outcome(step: &str, progress: f32, ok: bool, message: impl Into<String>) -> Self {
        if ok {
            Self::success(step, progress, message)
        } else {
            Self::warning(step, progress, message)
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == Level::Warning
    }
}

/// Receives status text as the orchestrators work
pub trait ProgressSink {
    fn report(&mut self, progress: InstallProgress);
}

/// Collects every update; what tests and summaries read back
impl ProgressSink for Vec<InstallProgress> {
    fn report(&mut self, progress: InstallProgress) {
        self.push(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        assert_eq!(InstallProgress::new("x", 1.7, "m").progress, 1.0);
        assert_eq!(InstallProgress::new("x", -0.2, "m").progress, 0.0);
    }

    #[test]
    fn outcome_picks_level() {
        assert_eq!(InstallProgress::outcome("x", 0.5, true, "ok").level, Level::Success);
        assert!(InstallProgress::outcome("x", 0.5, false, "bad").is_warning());
    }
}
