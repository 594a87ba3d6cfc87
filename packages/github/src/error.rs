//! Errors raised while setting up a GitHub store.
//!
//! Failures of individual API calls are reported as
//! [`StoreError`](repodb_remote_store::StoreError) instead.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_errors_convert() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::UrlParse(_)));
        assert!(err.to_string().starts_with("URL parse error"));
    }

    #[test]
    fn invalid_options_display() {
        let err = Error::InvalidOptions {
            message: "owner is empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid options: owner is empty");
    }
}
