//! Producer metadata written into file headers

use chrono::{Local, NaiveDateTime};

/// Tool name written into STL headers and OBJ comments.
pub const TOOL_NAME: &str = "meshcraft";

/// Crate version written next to the tool name.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project URL written into OBJ comments.
pub const TOOL_URL: &str = env!("CARGO_PKG_REPOSITORY");

/// Who wrote a file, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub tool: String,
    pub version: String,
    pub url: String,
    pub timestamp: NaiveDateTime,
}

impl Stamp {
    /// Stamp with the current local time
    pub fn now() -> Self {
        Self::at(Local::now().naive_local())
    }

    /// Stamp with a fixed timestamp
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            version: TOOL_VERSION.to_string(),
            url: TOOL_URL.to_string(),
            timestamp,
        }
    }

    /// Timestamp rendered as `YYYY-MM-DD HH:MM:SS.ffffff`
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

impl Default for Stamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_text() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_micro_opt(7, 5, 1, 42))
            .unwrap();
        let stamp = Stamp::at(ts);
        assert_eq!(stamp.timestamp_text(), "2024-03-09 07:05:01.000042");
        assert_eq!(stamp.tool, "meshcraft");
    }
}
