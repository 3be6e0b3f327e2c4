use std::fmt;

pub const DEFAULT_MIN_DURATION: u64 = 90;

/// Title fragments that mark a candidate as a live or otherwise unusable
/// recording. Checked in this order; the first hit is reported.
pub const SKIP_KEYWORDS: &[&str] = &[
    "unreleased",
    "live",
    "live at",
    "live from",
    "live in",
    "concert",
    "tour",
    "remix live",
    "bootleg live",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Keyword(&'static str),
    TooShort { duration: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Keyword(keyword) => write!(f, "contains '{}'", keyword),
            SkipReason::TooShort { duration } => {
                write!(f, "duration: {}", format_duration(*duration))
            }
        }
    }
}

/// `m:ss`
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Copy)]
pub struct QualityFilter {
    min_duration: u64,
}

impl QualityFilter {
    pub fn new(min_duration: u64) -> Self {
        QualityFilter { min_duration }
    }

    pub fn check_title(&self, title: &str) -> Result<(), SkipReason> {
        let title = title.to_lowercase();
        match SKIP_KEYWORDS.iter().find(|keyword| title.contains(*keyword)) {
            Some(keyword) => Err(SkipReason::Keyword(*keyword)),
            None => Ok(()),
        }
    }

    /// A duration of 0 means the source did not report one and always passes.
    pub fn check_duration(&self, duration: u64) -> Result<(), SkipReason> {
        if duration > 0 && duration < self.min_duration {
            return Err(SkipReason::TooShort { duration });
        }
        Ok(())
    }

    pub fn check(&self, title: &str, duration: u64) -> Result<(), SkipReason> {
        self.check_title(title)?;
        self.check_duration(duration)
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        QualityFilter::new(DEFAULT_MIN_DURATION)
    }
}
