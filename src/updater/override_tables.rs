use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

use crate::playlist::{find_channel_url, SuffixTag};

#[derive(Debug, ThisError)]
pub enum LookupError {
    #[error("No url for channel `{channel}` in `{table}`")]
    Miss { channel: String, table: String },
    #[error("Failed to read override table `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Per region and provider channel lists under `hotel/` and `udpxy/`.
pub struct OverrideTables {
    root: PathBuf,
}

impl OverrideTables {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OverrideTables { root: root.into() }
    }

    pub fn lookup(&self, tag: &SuffixTag, channel: &str) -> Result<String, LookupError> {
        let path = tag.table_path(&self.root);
        let content = fs::read_to_string(&path).map_err(|source| LookupError::Io {
            path: path.clone(),
            source,
        })?;

        find_channel_url(&content, channel)
            .map(str::to_string)
            .ok_or_else(|| LookupError::Miss {
                channel: channel.to_string(),
                table: path.display().to_string(),
            })
    }
}
