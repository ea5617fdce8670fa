use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::SettingsError;

#[derive(Debug, Clone)]
pub struct Upstream {
    pub url: Url,
    pub timeout: Duration,
}

impl Upstream {
    pub fn new(sources: Vec<PartialUpstream>) -> Result<Self, SettingsError> {
        let merged: PartialUpstream =
            sources
                .into_iter()
                .fold(Default::default(), |acc, x| PartialUpstream {
                    url: acc.url.or(x.url),
                    timeout: acc.timeout.or(x.timeout),
                });

        Ok(Upstream {
            url: merged
                .url
                .ok_or_else(|| SettingsError::MissingValue("upstream.url".to_string()))?,
            timeout: merged
                .timeout
                .ok_or_else(|| SettingsError::MissingValue("upstream.timeout".to_string()))?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialUpstream {
    pub url: Option<Url>,

    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}
