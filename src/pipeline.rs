use chrono::Local;
use log::{error, info, warn};
use std::fs;
use std::path::Path;

use crate::http::{FetchError, UpstreamClient};
use crate::playlist::{
    m3u_header, m3u_to_txt, HmacUrlSigner, Md5UrlSigner, PlaylistConverter, StreamUrlSigner,
    UrlSigner, GENRE_SENTINEL,
};
use crate::settings::{Output, Settings, Signing, SigningDigest};
use crate::updater::{ChannelUpdater, UpdateSummary};

const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// `None` when the upstream fetch failed and no local file was touched.
    pub update: Option<UpdateSummary>,
    pub channels: usize,
}

pub struct Pipeline {
    converter: PlaylistConverter,
    updater: ChannelUpdater,
    output: Output,
    epg_url: String,
    update_group: String,
}

impl Pipeline {
    pub fn new(
        converter: PlaylistConverter,
        updater: ChannelUpdater,
        output: Output,
        epg_url: impl Into<String>,
        update_group: impl Into<String>,
    ) -> Self {
        Pipeline {
            converter,
            updater,
            output,
            epg_url: epg_url.into(),
            update_group: update_group.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let converter = PlaylistConverter::new(
            build_url_signer(&settings.signing),
            settings.playlist.logo_url_template.clone(),
        );

        let updater = ChannelUpdater::new(
            settings.output.txt_dir.clone(),
            settings.output.merged_txt_file_name(),
            settings.output.upstream_categories.clone(),
        );

        Pipeline::new(
            converter,
            updater,
            settings.output.clone(),
            settings.playlist.epg_url.clone(),
            settings.playlist.update_group.clone(),
        )
    }

    pub async fn run(&self, client: &UpstreamClient) -> RunReport {
        let snapshot = client.fetch_playlist().await;
        let update_time = Local::now().format(UPDATE_TIME_FORMAT).to_string();

        self.run_with_snapshot(snapshot, &update_time)
    }

    /// Never fails as a whole: a failed snapshot only skips the update pass,
    /// and the merged outputs are written from whatever is on disk.
    pub fn run_with_snapshot(
        &self,
        snapshot: Result<String, FetchError>,
        update_time: &str,
    ) -> RunReport {
        self.prepare_dirs();

        let update = match snapshot {
            Ok(body) => {
                info!("Successfully fetched upstream playlist.");
                Some(self.updater.update_all(&m3u_to_txt(&body)))
            }
            Err(e) => {
                error!("{}; skipping channel update", e);
                None
            }
        };

        let categories_m3u: String = self
            .output
            .categories
            .iter()
            .map(|category| self.category_to_m3u(category))
            .collect();

        let update_txt = format!(
            "{},{}\n{},\n",
            self.update_group, GENRE_SENTINEL, update_time
        );
        let update_m3u = self.converter.txt_to_m3u(&update_txt);

        let merged_m3u = format!(
            "{}{}\n",
            m3u_header(&self.epg_url),
            format!("{}{}\n", update_m3u, categories_m3u).trim()
        );
        write_output(&self.output.merged_m3u_path(), &merged_m3u);

        let channels_txt = m3u_to_txt(&merged_m3u);
        write_output(
            &self.output.merged_txt_path(),
            &format!("{}{}", update_txt, channels_txt),
        );

        let channels = channels_txt
            .lines()
            .filter(|line| !line.ends_with(GENRE_SENTINEL))
            .count();
        info!("Successfully merged and saved {} channels", channels);

        RunReport { update, channels }
    }

    fn prepare_dirs(&self) {
        for dir in &[&self.output.txt_dir, &self.output.m3u_dir] {
            if let Err(e) = fs::create_dir_all(dir) {
                error!("Failed to create directory {}: {}", dir.display(), e);
            }
        }
    }

    fn category_to_m3u(&self, category: &str) -> String {
        let path = self.output.category_path(category);

        match fs::read_to_string(&path) {
            Ok(content) => self.converter.txt_to_m3u(&content),
            Err(e) => {
                warn!("Error reading file {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}

pub fn build_url_signer(signing: &Signing) -> StreamUrlSigner {
    let signer: Box<dyn UrlSigner> = match signing.digest {
        SigningDigest::Md5 => Box::new(Md5UrlSigner::new(signing.salt.clone())),
        SigningDigest::HmacSha256 => Box::new(HmacUrlSigner::new(signing.salt.clone())),
    };

    StreamUrlSigner::new(
        signer,
        signing.placeholder_host.clone(),
        signing.proxy_url.clone(),
    )
}

fn write_output(path: &Path, content: &str) {
    match fs::write(path, content) {
        Ok(()) => info!("Successfully saved {}", path.display()),
        Err(e) => error!("Error writing to file {}: {}", path.display(), e),
    }
}
