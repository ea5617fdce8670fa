use log::warn;
use std::collections::HashMap;

use super::{parse_m3u, parse_txt, ChannelEntry, StreamUrlSigner, GENRE_SENTINEL};

/// Converts between the delimited-text form and the streaming form.
pub struct PlaylistConverter {
    signer: StreamUrlSigner,
    logo_url_template: String,
}

impl PlaylistConverter {
    /// `logo_url_template` gets every `{name}` replaced by the channel name.
    pub fn new(signer: StreamUrlSigner, logo_url_template: impl Into<String>) -> Self {
        PlaylistConverter {
            signer,
            logo_url_template: logo_url_template.into(),
        }
    }

    /// Renders the metadata and url line of every channel in `content`.
    ///
    /// Urls pointing at the proxy placeholder are signed; an entry whose url
    /// can't be signed is left out.
    pub fn txt_to_m3u(&self, content: &str) -> String {
        let mut result = String::new();

        for entry in parse_txt(content) {
            let url = if self.signer.matches(&entry.url) {
                match self.signer.sign(&entry.url) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Skipping channel `{}`: {}", entry.name, e);
                        continue;
                    }
                }
            } else {
                entry.url
            };

            result.push_str(&format!(
                "#EXTINF:-1 tvg-logo=\"{}\" group-title=\"{}\",{}\n{}\n",
                self.logo_url(&entry.name),
                entry.group,
                entry.name,
                url
            ));
        }

        result
    }

    fn logo_url(&self, name: &str) -> String {
        self.logo_url_template.replace("{name}", name)
    }
}

pub fn m3u_header(epg_url: &str) -> String {
    format!("#EXTM3U x-tvg-url=\"{}\"\n", epg_url)
}

/// Groups the channels of a streaming-form playlist into delimited-text
/// blocks, in the order the groups first appear.
pub fn m3u_to_txt(content: &str) -> String {
    let mut groups: Vec<(String, Vec<ChannelEntry>)> = vec![];
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in parse_m3u(content) {
        let slot = *index.entry(entry.group.clone()).or_insert_with(|| {
            groups.push((entry.group.clone(), vec![]));
            groups.len() - 1
        });

        groups[slot].1.push(entry);
    }

    let mut result = String::new();
    for (group, entries) in groups {
        result.push_str(&format!("{},{}\n", group, GENRE_SENTINEL));

        for entry in entries {
            result.push_str(&format!("{},{}\n", entry.name, entry.url));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::parse_txt;
    use crate::test_util::{fixed_md5_signer, FIXED_NOW};

    fn converter() -> PlaylistConverter {
        PlaylistConverter::new(fixed_md5_signer(None), "https://logo/{name}.png")
    }

    #[test]
    fn test_txt_to_m3u_signs_placeholder_urls() {
        let m3u = converter().txt_to_m3u("News,#genre#\nCNN,http://127.0.0.1:8080/a/b.ts\n");

        let lines: Vec<&str> = m3u.lines().collect();
        assert_eq!(2, lines.len());
        assert_eq!(
            "#EXTINF:-1 tvg-logo=\"https://logo/CNN.png\" group-title=\"News\",CNN",
            lines[0]
        );
        assert!(lines[1].starts_with("http://127.0.0.1:8080/a/b.ts?"));
        assert!(lines[1].contains(&format!("t={}", FIXED_NOW)));
        assert!(lines[1].contains("key="));
    }

    #[test]
    fn test_txt_to_m3u_skips_unsignable_entries() {
        let m3u = converter().txt_to_m3u(
            "News,#genre#\nBroken,http://127.0.0.1:8080/b\nBBC,http://example.com/bbc.m3u8\n",
        );

        assert_eq!(
            "#EXTINF:-1 tvg-logo=\"https://logo/BBC.png\" group-title=\"News\",BBC\nhttp://example.com/bbc.m3u8\n",
            m3u
        );
    }

    #[test]
    fn test_txt_to_m3u_empty_input() {
        assert_eq!("", converter().txt_to_m3u(""));
        assert_eq!("", converter().txt_to_m3u("News,#genre#\njust text\n"));
    }

    #[test]
    fn test_m3u_to_txt() {
        let txt = m3u_to_txt(
            "#EXTM3U\n#EXTINF:-1 tvg-logo=\"x\" group-title=\"Sports\",ESPN\nhttp://example.com/espn.m3u8\n",
        );

        assert_eq!("Sports,#genre#\nESPN,http://example.com/espn.m3u8\n", txt);
    }

    #[test]
    fn test_m3u_to_txt_merges_groups_in_first_seen_order() {
        let txt = m3u_to_txt(
            "#EXTM3U\n\
             #EXTINF:-1 group-title=\"B\",b1\nhttp://b/1\n\
             #EXTINF:-1 group-title=\"A\",a1\nhttp://a/1\n\
             #EXTINF:-1 group-title=\"B\",b2\nhttp://b/2\n",
        );

        assert_eq!("B,#genre#\nb1,http://b/1\nb2,http://b/2\nA,#genre#\na1,http://a/1\n", txt);
    }

    #[test]
    fn test_round_trip_preserves_entries() {
        let txt = "央视,#genre#\nCCTV1,http://example.com/cctv1.m3u8\nCCTV2,https://example.com/2,hd\n卫视,#genre#\n湖南卫视,rtmp://example.com/hunan\nCCTV3,http://example.com/cctv3\n";

        let round_tripped = m3u_to_txt(&format!("#EXTM3U\n{}", converter().txt_to_m3u(txt)));

        assert_eq!(parse_txt(txt), parse_txt(&round_tripped));
        assert_eq!(txt, round_tripped);
    }

    #[test]
    fn test_m3u_to_txt_is_idempotent() {
        let m3u = "#EXTM3U\n#EXTINF:-1 group-title=\"A\",a\nhttp://a\n#EXTINF:-1 group-title=\"B\",b\nhttp://b\n";
        let converter = converter();

        let once = m3u_to_txt(m3u);
        let twice = m3u_to_txt(&format!("#EXTM3U\n{}", converter.txt_to_m3u(&once)));

        assert_eq!(once, twice);
    }
}
