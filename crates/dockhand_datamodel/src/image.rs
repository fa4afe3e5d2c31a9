use serde::{Deserialize, Serialize};

/// One layer of an image's build history, as returned by
/// `GET /images/<id>/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryEntry {
    pub id: String,
    pub created: i64,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub size: i64,
    #[serde(default)]
    pub comment: String,
}

/// One line of the line-delimited JSON stream `POST /images/create` sends
/// back. The Engine keeps the HTTP status at 200 and reports pull failures
/// inside the stream instead.
#[derive(Debug, Clone, Deserialize)]
pub struct PullLine {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "errorDetail", default)]
    pub error_detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_line_surfaces_error_detail() {
        let line: PullLine = serde_json::from_str(
            r#"{"errorDetail":{"message":"manifest unknown"},"error":"manifest unknown"}"#,
        )
        .unwrap();

        assert_eq!(line.error_detail.unwrap().message, "manifest unknown");
    }

    #[test]
    fn history_entry_reads_engine_casing() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"Id":"sha256:ab","Created":1700000000,"CreatedBy":"/bin/sh -c #(nop) CMD","Tags":null,"Size":0,"Comment":""}"#,
        )
        .unwrap();

        assert_eq!(entry.id, "sha256:ab");
        assert!(entry.tags.is_none());
    }
}
