// ABOUTME: One decoded unit of a streamed daemon response.
// ABOUTME: Covers both build records (stream text) and push/pull records (status/progress).

use serde::Deserialize;

/// A single progress record.
///
/// Build responses mostly carry `stream` text; push and pull responses carry
/// `status`, `progress` and a layer `id`. Either kind may carry an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
    #[serde(default)]
    pub aux: Option<Aux>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// Auxiliary payload; for builds it carries the resulting image id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Aux {
    #[serde(default, rename = "ID")]
    pub id: Option<String>,
}

impl ProgressRecord {
    pub fn stream_text(text: impl Into<String>) -> Self {
        Self {
            stream: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// The daemon-reported error, if this record carries a non-empty one.
    pub fn error_message(&self) -> Option<&str> {
        let detail = self.error_detail.as_ref().and_then(|d| d.message.as_deref());
        self.error
            .as_deref()
            .filter(|e| !e.is_empty())
            .or(detail.filter(|e| !e.is_empty()))
    }

    /// Image id announced through the `aux` payload.
    pub fn aux_id(&self) -> Option<&str> {
        self.aux
            .as_ref()
            .and_then(|a| a.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Human-readable rendering, in the spirit of the docker CLI.
    ///
    /// Returns `None` for records with nothing to show.
    pub fn display_line(&self) -> Option<String> {
        if let Some(text) = self.stream.as_deref() {
            let text = text.trim_end();
            return (!text.is_empty()).then(|| text.to_string());
        }

        let status = self.status.as_deref()?;
        let mut line = match self.id.as_deref() {
            Some(id) if !id.is_empty() => format!("{}: {}", id, status),
            _ => status.to_string(),
        };
        if let Some(progress) = self.progress.as_deref().filter(|p| !p.is_empty()) {
            line.push(' ');
            line.push_str(progress);
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_push_record() {
        let record: ProgressRecord = serde_json::from_str(
            r#"{"status":"Pushing","progressDetail":{"current":1,"total":2},"progress":"[=>  ] 1B/2B","id":"a1b2"}"#,
        )
        .unwrap();

        assert_eq!(record.status.as_deref(), Some("Pushing"));
        assert!(record.error_message().is_none());
        assert_eq!(
            record.display_line().as_deref(),
            Some("a1b2: Pushing [=>  ] 1B/2B")
        );
    }

    #[test]
    fn error_detail_counts_as_error() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"errorDetail":{"message":"denied"}}"#).unwrap();
        assert_eq!(record.error_message(), Some("denied"));
    }

    #[test]
    fn empty_error_is_not_an_error() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"status":"ok","error":""}"#).unwrap();
        assert!(record.error_message().is_none());
    }

    #[test]
    fn build_aux_carries_image_id() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"aux":{"ID":"sha256:deadbeef"}}"#).unwrap();
        assert_eq!(record.aux_id(), Some("sha256:deadbeef"));
        assert!(record.display_line().is_none());
    }

    #[test]
    fn stream_text_is_trimmed_for_display() {
        let record = ProgressRecord::stream_text("Step 1/2 : FROM scratch\n");
        assert_eq!(
            record.display_line().as_deref(),
            Some("Step 1/2 : FROM scratch")
        );
        assert!(ProgressRecord::stream_text("\n").display_line().is_none());
    }
}
