//! Payloads of the GitHub Contents API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;

/// One entry of a directory listing.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContentEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// A single file as returned by `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Deserialize)]
pub(crate) struct FileContent {
    pub sha: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// Decode the line-wrapped base64 payload.
    pub fn decode(&self) -> Result<Bytes, String> {
        match self.encoding.as_deref() {
            None | Some("base64") => {}
            Some(other) => return Err(format!("unsupported content encoding '{}'", other)),
        }
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map(Bytes::from)
            .map_err(|e| e.to_string())
    }
}

/// Response of a create, update or delete on the Contents API.
#[derive(Debug, Deserialize)]
pub(crate) struct CommitResponse {
    pub content: Option<CommittedFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommittedFile {
    pub sha: String,
}

pub(crate) fn encode_content(content: &[u8]) -> String {
    STANDARD.encode(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_wrapped_content() {
        // GitHub wraps base64 at 60 columns
        let file = FileContent {
            sha: "abc".to_string(),
            content: "W3sibmFtZSI6IkJv\nYiJ9XQ==\n".to_string(),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(file.decode().unwrap(), Bytes::from_static(br#"[{"name":"Bob"}]"#));
    }

    #[test]
    fn decode_empty_content() {
        let file = FileContent {
            sha: "abc".to_string(),
            content: String::new(),
            encoding: None,
        };
        assert!(file.decode().unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_unknown_encoding() {
        let file = FileContent {
            sha: "abc".to_string(),
            content: String::new(),
            encoding: Some("none".to_string()),
        };
        assert!(file.decode().is_err());
    }

    #[test]
    fn encode_matches_standard_alphabet() {
        assert_eq!(encode_content(b"[]"), "W10=");
    }

    #[test]
    fn listing_entries_know_their_kind() {
        let entries: Vec<ContentEntry> = serde_json::from_value(serde_json::json!([
            {"path": "a.json", "type": "file"},
            {"path": "docs", "type": "dir"}
        ]))
        .unwrap();
        assert!(entries[0].is_file());
        assert!(!entries[1].is_file());
    }
}
