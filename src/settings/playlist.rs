use serde::Deserialize;

use super::SettingsError;

#[derive(Debug, Clone)]
pub struct Playlist {
    pub logo_url_template: String,
    pub epg_url: String,
    pub update_group: String,
}

impl Playlist {
    pub fn new(sources: Vec<PartialPlaylist>) -> Result<Self, SettingsError> {
        let merged: PartialPlaylist =
            sources
                .into_iter()
                .fold(Default::default(), |acc, x| PartialPlaylist {
                    logo_url_template: acc.logo_url_template.or(x.logo_url_template),
                    epg_url: acc.epg_url.or(x.epg_url),
                    update_group: acc.update_group.or(x.update_group),
                });

        Ok(Playlist {
            logo_url_template: merged.logo_url_template.ok_or_else(|| {
                SettingsError::MissingValue("playlist.logo_url_template".to_string())
            })?,
            epg_url: merged
                .epg_url
                .ok_or_else(|| SettingsError::MissingValue("playlist.epg_url".to_string()))?,
            update_group: merged.update_group.ok_or_else(|| {
                SettingsError::MissingValue("playlist.update_group".to_string())
            })?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialPlaylist {
    pub logo_url_template: Option<String>,
    pub epg_url: Option<String>,
    pub update_group: Option<String>,
}
