use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SettingsError {
    #[error("Failed to parse settings from `{}`: {cause}", .path.as_deref().unwrap_or("<reader>"))]
    FileParse {
        path: Option<String>,
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Missing settings value `{0}`")]
    MissingValue(String),
}
