use std::fmt;
use std::path::{Path, PathBuf};

const PROVINCE_LEN: usize = 2;
const ISP_LEN: usize = 2;
const TAIL_LEN: usize = 2;
const MIN_TAG_LEN: usize = PROVINCE_LEN + ISP_LEN + TAIL_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Hotel,
    Multicast,
}

impl Network {
    pub fn marker(self) -> &'static str {
        match self {
            Network::Hotel => "酒店",
            Network::Multicast => "组播",
        }
    }

    /// Subtree of the override tables for this network.
    pub fn table_dir(self) -> &'static str {
        match self {
            Network::Hotel => "hotel",
            Network::Multicast => "udpxy",
        }
    }

    pub fn of_url(url: &str) -> Option<Network> {
        [Network::Hotel, Network::Multicast]
            .iter()
            .copied()
            .find(|network| url.ends_with(network.marker()))
    }
}

/// Routing tag trailing a url: `$<province><isp>...<tail><marker>`.
///
/// Offsets count characters, not bytes; province and isp are usually
/// two-character Chinese names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixTag {
    pub network: Network,
    pub province: String,
    pub isp: String,
    pub tail: String,
}

impl SuffixTag {
    /// Returns `None` if `url` carries no network marker, no `$`, or a tag
    /// body too short for province, isp and tail.
    pub fn parse(url: &str) -> Option<SuffixTag> {
        let network = Network::of_url(url)?;
        let tagged = url.strip_suffix(network.marker())?;
        let body = &tagged[tagged.rfind('$')? + 1..];

        let chars: Vec<char> = body.chars().collect();
        if chars.len() < MIN_TAG_LEN {
            return None;
        }

        Some(SuffixTag {
            network,
            province: chars[..PROVINCE_LEN].iter().collect(),
            isp: chars[PROVINCE_LEN..PROVINCE_LEN + ISP_LEN].iter().collect(),
            tail: chars[chars.len() - TAIL_LEN..].iter().collect(),
        })
    }

    pub fn table_path(&self, root: &Path) -> PathBuf {
        root.join(self.network.table_dir())
            .join(format!("中国{}", self.isp))
            .join(format!("{}.txt", self.province))
    }
}

/// Tag as reattached to a refreshed url.
impl fmt::Display for SuffixTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}{}{}", self.province, self.isp, self.tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hotel_tag() {
        let tag = SuffixTag::parse("http://old$11222233酒店").unwrap();

        assert_eq!(Network::Hotel, tag.network);
        assert_eq!("11", tag.province);
        assert_eq!("22", tag.isp);
        assert_eq!("33", tag.tail);
        assert_eq!("$112233", tag.to_string());
        assert_eq!(
            Path::new("/out/hotel/中国22/11.txt"),
            tag.table_path(Path::new("/out"))
        );
    }

    #[test]
    fn test_parse_multicast_tag_counts_chars() {
        let tag =
            SuffixTag::parse("http://10.0.0.1:4022/rtp/239.3.1.1:8000$北京电信高清组播").unwrap();

        assert_eq!(Network::Multicast, tag.network);
        assert_eq!("北京", tag.province);
        assert_eq!("电信", tag.isp);
        assert_eq!("高清", tag.tail);
        assert_eq!(
            Path::new("udpxy/中国电信/北京.txt"),
            tag.table_path(Path::new(""))
        );
    }

    #[test]
    fn test_malformed_tags_fail_closed() {
        assert_eq!(None, SuffixTag::parse("http://old$11223酒店"));
        assert_eq!(None, SuffixTag::parse("http://old/11222233酒店"));
        assert_eq!(None, SuffixTag::parse("http://old$11222233"));
        assert_eq!(None, Network::of_url("http://old$112233"));
    }
}
