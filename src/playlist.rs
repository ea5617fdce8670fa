mod convert;
mod segment_proxy;
mod stream_url_signer;
mod suffix_tag;

use regex::Regex;
use std::sync::OnceLock;

pub use convert::{m3u_header, m3u_to_txt, PlaylistConverter};
pub use segment_proxy::rewrite_segment_urls;
pub use stream_url_signer::{
    unix_now, Clock, HmacUrlSigner, Md5UrlSigner, SignError, StreamUrlSigner, UrlSigner,
};
pub use suffix_tag::{Network, SuffixTag};

/// Url field of a delimited-text line that opens a new group.
pub const GENRE_SENTINEL: &str = "#genre#";

const EXTINF_PREFIX: &str = "#EXTINF";
const GROUP_TITLE_KEY: &str = "group-title=\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub name: String,
    pub url: String,
    /// Empty for entries that precede every group sentinel.
    pub group: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TxtLine<'a> {
    Group(&'a str),
    Channel { name: &'a str, url: &'a str },
}

/// Classifies one delimited-text line, splitting on the first comma.
///
/// Returns `None` for lines without a delimiter.
pub fn parse_txt_line(line: &str) -> Option<TxtLine<'_>> {
    let (left, right) = line.trim().split_once(',')?;

    if right == GENRE_SENTINEL {
        Some(TxtLine::Group(left))
    } else {
        Some(TxtLine::Channel {
            name: left,
            url: right,
        })
    }
}

pub fn parse_txt(content: &str) -> Vec<ChannelEntry> {
    let mut group = "";
    let mut entries = vec![];

    for line in content.split('\n') {
        match parse_txt_line(line) {
            Some(TxtLine::Group(name)) => group = name,
            Some(TxtLine::Channel { name, url }) => entries.push(ChannelEntry {
                name: name.to_string(),
                url: url.to_string(),
                group: group.to_string(),
            }),
            None => {}
        }
    }

    entries
}

/// Parses streaming-form text into entries. The first line is taken as the
/// format header and skipped without inspection.
pub fn parse_m3u(content: &str) -> Vec<ChannelEntry> {
    let mut group = String::new();
    let mut pending_name: Option<String> = None;
    let mut entries = vec![];

    for line in content.trim().split('\n').skip(1) {
        let line = line.trim_end_matches('\r');

        if let Some(extinf) = ExtInf::parse(line) {
            group = extinf.group_title.unwrap_or_default().to_string();
            pending_name = Some(extinf.name.to_string());
        } else if is_stream_url(line) {
            match &pending_name {
                Some(name) => entries.push(ChannelEntry {
                    name: name.clone(),
                    url: line.to_string(),
                    group: group.clone(),
                }),
                None => log::warn!("Dropping stream url without metadata line: {}", line),
            }
        }
    }

    entries
}

/// Finds the url of the first line shaped `<name>,http(s)://...`.
///
/// Only the first match is used; later lines for the same channel are ignored.
pub fn find_channel_url<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let url = line.strip_prefix(name)?.strip_prefix(',')?;

        if url.starts_with("http://") || url.starts_with("https://") {
            url.split_whitespace().next()
        } else {
            None
        }
    })
}

fn is_stream_url(line: &str) -> bool {
    static STREAM_URL: OnceLock<Regex> = OnceLock::new();

    STREAM_URL
        .get_or_init(|| {
            Regex::new(r"(?i)^(?:http|https|rtmp)://\S+").expect("stream url pattern is valid")
        })
        .is_match(line)
}

/// Metadata line of the streaming form.
#[derive(Debug, PartialEq, Eq)]
struct ExtInf<'a> {
    group_title: Option<&'a str>,
    name: &'a str,
}

impl<'a> ExtInf<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        if !line.starts_with(EXTINF_PREFIX) {
            return None;
        }

        let group_title = line.find(GROUP_TITLE_KEY).map(|start| {
            let value = &line[start + GROUP_TITLE_KEY.len()..];
            value.split('"').next().unwrap_or(value)
        });

        let name = line.rsplit(',').next().unwrap_or(line);

        Some(ExtInf { group_title, name })
    }
}
