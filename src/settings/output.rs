use serde::Deserialize;
use std::path::PathBuf;

use super::SettingsError;

#[derive(Debug, Clone)]
pub struct Output {
    pub txt_dir: PathBuf,
    pub m3u_dir: PathBuf,
    pub merged_name: String,
    /// Category file stems, in merge order.
    pub categories: Vec<String>,
    /// Category file stems refreshed from the upstream snapshot.
    pub upstream_categories: Vec<String>,
}

impl Output {
    pub fn new(sources: Vec<PartialOutput>) -> Result<Self, SettingsError> {
        let merged: PartialOutput =
            sources
                .into_iter()
                .fold(Default::default(), |acc, x| PartialOutput {
                    txt_dir: acc.txt_dir.or(x.txt_dir),
                    m3u_dir: acc.m3u_dir.or(x.m3u_dir),
                    merged_name: acc.merged_name.or(x.merged_name),
                    categories: acc.categories.or(x.categories),
                    upstream_categories: acc.upstream_categories.or(x.upstream_categories),
                });

        Ok(Output {
            txt_dir: merged
                .txt_dir
                .ok_or_else(|| SettingsError::MissingValue("output.txt_dir".to_string()))?,
            m3u_dir: merged
                .m3u_dir
                .ok_or_else(|| SettingsError::MissingValue("output.m3u_dir".to_string()))?,
            merged_name: merged
                .merged_name
                .ok_or_else(|| SettingsError::MissingValue("output.merged_name".to_string()))?,
            categories: merged
                .categories
                .ok_or_else(|| SettingsError::MissingValue("output.categories".to_string()))?,
            upstream_categories: merged.upstream_categories.ok_or_else(|| {
                SettingsError::MissingValue("output.upstream_categories".to_string())
            })?,
        })
    }

    pub fn category_path(&self, category: &str) -> PathBuf {
        self.txt_dir.join(format!("{}.txt", category))
    }

    pub fn merged_txt_file_name(&self) -> String {
        format!("{}.txt", self.merged_name)
    }

    pub fn merged_txt_path(&self) -> PathBuf {
        self.txt_dir.join(self.merged_txt_file_name())
    }

    pub fn merged_m3u_path(&self) -> PathBuf {
        self.m3u_dir.join(format!("{}.m3u", self.merged_name))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialOutput {
    pub txt_dir: Option<PathBuf>,
    pub m3u_dir: Option<PathBuf>,
    pub merged_name: Option<String>,
    pub categories: Option<Vec<String>>,
    pub upstream_categories: Option<Vec<String>>,
}
