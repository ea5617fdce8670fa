mod error;
mod output;
mod playlist;
mod signing;
mod upstream;

pub use error::*;
pub use output::*;
pub use playlist::*;
pub use signing::*;
pub use upstream::*;

use log::info;
use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::result::Result;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config.yml";
const DEFAULT_UPSTREAM_URL: &str = "https://gh-proxy.com/https://raw.githubusercontent.com/heywangchaochen/IPTV2/refs/heads/main/fanmingming_ipv6.m3u";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PLACEHOLDER_HOST: &str = "127.0.0.1:8080";
const DEFAULT_LOGO_URL_TEMPLATE: &str =
    "https://ghp.ci/https://raw.githubusercontent.com/linitfor/epg/main/logo/{name}.png";
const DEFAULT_EPG_URL: &str =
    "https://gh-proxy.com/https://raw.githubusercontent.com/heywangchaochen/IPTV2/refs/heads/main/e.xml";
const DEFAULT_UPDATE_GROUP: &str = "更新时间";
const DEFAULT_CATEGORIES: [&str; 11] = [
    "TIME", "CCTV", "CNTV", "Shuzi", "NewTV", "iHOT", "SITV", "Movie", "Sport", "hk", "Local",
];
const DEFAULT_UPSTREAM_CATEGORIES: [&str; 4] = ["CCTV", "CNTV", "Shuzi", "NewTV"];

#[derive(Debug, Clone)]
pub struct Settings {
    pub upstream: Upstream,
    pub signing: Signing,
    pub playlist: Playlist,
    pub output: Output,
}

impl Settings {
    /// Environment, then the config file named by `APP_CONFIG` (or
    /// `config.yml`), then defaults. A missing config file is skipped.
    pub fn load() -> Result<Self, SettingsError> {
        let mut sources = vec![PartialSettings::from_env()];

        let config_path = get_config_path();
        match File::open(&config_path) {
            Ok(file) => sources.push(PartialSettings::from_yaml(file, Some(&config_path))?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Config file {} not found, using defaults", config_path)
            }
            Err(e) => {
                return Err(SettingsError::FileParse {
                    path: Some(config_path),
                    cause: Box::new(e),
                })
            }
        }

        sources.push(Default::default());
        Settings::merge(sources)
    }

    pub fn from_file(file_path: &str) -> Result<Self, SettingsError> {
        let reader = File::open(file_path).map_err(|e| SettingsError::FileParse {
            path: Some(file_path.to_string()),
            cause: Box::new(e),
        })?;

        let file_settings = PartialSettings::from_yaml(reader, Some(file_path))?;
        Settings::merge(vec![file_settings, Default::default()])
    }

    pub fn from_reader<T: Read>(reader: T) -> Result<Self, SettingsError> {
        let file_settings = PartialSettings::from_yaml(reader, None)?;

        Settings::merge(vec![file_settings, Default::default()])
    }

    /// Earlier sources take precedence over later ones.
    pub fn merge(mut sources: Vec<PartialSettings>) -> Result<Self, SettingsError> {
        let upstream_sources = sources
            .iter_mut()
            .filter_map(|s| s.upstream.take())
            .collect();

        let signing_sources = sources
            .iter_mut()
            .filter_map(|s| s.signing.take())
            .collect();

        let playlist_sources = sources
            .iter_mut()
            .filter_map(|s| s.playlist.take())
            .collect();

        let output_sources = sources
            .iter_mut()
            .filter_map(|s| s.output.take())
            .collect();

        Ok(Settings {
            upstream: Upstream::new(upstream_sources)?,
            signing: Signing::new(signing_sources)?,
            playlist: Playlist::new(playlist_sources)?,
            output: Output::new(output_sources)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    upstream: Option<PartialUpstream>,
    signing: Option<PartialSigning>,
    playlist: Option<PartialPlaylist>,
    output: Option<PartialOutput>,
}

impl PartialSettings {
    pub fn from_yaml<T: Read>(reader: T, path: Option<&str>) -> Result<Self, SettingsError> {
        serde_yaml::from_reader(reader).map_err(|e| SettingsError::FileParse {
            path: path.map(str::to_string),
            cause: Box::new(e),
        })
    }

    pub fn from_env() -> Self {
        PartialSettings::from_vars(|key| env::var(key).ok())
    }

    /// Reads `SALT` and `PROXY_URL`; empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        PartialSettings {
            upstream: None,
            signing: Some(PartialSigning {
                salt: var("SALT"),
                proxy_url: var("PROXY_URL"),
                placeholder_host: None,
                digest: None,
            }),
            playlist: None,
            output: None,
        }
    }
}

impl Default for PartialSettings {
    fn default() -> Self {
        PartialSettings {
            upstream: Some(PartialUpstream {
                url: Url::parse(DEFAULT_UPSTREAM_URL).ok(),
                timeout: Some(Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS)),
            }),
            signing: Some(PartialSigning {
                salt: Some(String::new()),
                proxy_url: None,
                placeholder_host: Some(DEFAULT_PLACEHOLDER_HOST.to_string()),
                digest: Some(SigningDigest::Md5),
            }),
            playlist: Some(PartialPlaylist {
                logo_url_template: Some(DEFAULT_LOGO_URL_TEMPLATE.to_string()),
                epg_url: Some(DEFAULT_EPG_URL.to_string()),
                update_group: Some(DEFAULT_UPDATE_GROUP.to_string()),
            }),
            output: Some(PartialOutput {
                txt_dir: Some(PathBuf::from("txt")),
                m3u_dir: Some(PathBuf::from("m3u")),
                merged_name: Some("IPTV".to_string()),
                categories: Some(DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()),
                upstream_categories: Some(
                    DEFAULT_UPSTREAM_CATEGORIES
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                ),
            }),
        }
    }
}

fn get_config_path() -> String {
    env::var("APP_CONFIG").unwrap_or_else(|e| {
        info!(
            "Missing or invalid APP_CONFIG env var, fallback to {}; {:?}",
            DEFAULT_CONFIG_PATH, e
        );
        DEFAULT_CONFIG_PATH.to_string()
    })
}
