use hmac::{Hmac, Mac};
use log::error;
use md5::{Digest, Md5};
use percent_encoding::percent_decode_str;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error as ThisError;
use url::Url;


/// Source of the signing timestamp, in unix seconds.
pub type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

#[derive(Debug, ThisError)]
pub enum SignError {
    #[error("Invalid URL format: `{0}`")]
    InvalidFormat(String),
}

pub trait UrlSigner: Send + Sync {
    fn key(&self, channel_id: &str, video_id: &str, timestamp: &str) -> String;
}

/// Hex md5 over `channel_id + video_id + timestamp + salt`, the scheme the
/// stream proxy verifies.
pub struct Md5UrlSigner {
    salt: String,
}

impl Md5UrlSigner {
    pub fn new(salt: String) -> Md5UrlSigner {
        Md5UrlSigner { salt }
    }
}

impl UrlSigner for Md5UrlSigner {
    fn key(&self, channel_id: &str, video_id: &str, timestamp: &str) -> String {
        let mut hasher = Md5::new();

        hasher.update(channel_id.as_bytes());
        hasher.update(video_id.as_bytes());
        hasher.update(timestamp.as_bytes());
        hasher.update(self.salt.as_bytes());

        hex::encode(hasher.finalize())
    }
}

pub struct HmacUrlSigner {
    key: String,
}

impl HmacUrlSigner {
    pub fn new(key: String) -> HmacUrlSigner {
        HmacUrlSigner { key }
    }

    fn new_hmac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(self.key.as_bytes()).expect("HMAC can take key of any size")
    }
}

impl UrlSigner for HmacUrlSigner {
    fn key(&self, channel_id: &str, video_id: &str, timestamp: &str) -> String {
        let mut hmac = self.new_hmac();

        let mut content_to_sign = String::from(channel_id);
        content_to_sign.push_str(video_id);
        content_to_sign.push_str(timestamp);

        hmac.update(content_to_sign.as_bytes());
        let signature = hmac.finalize();

        hex::encode(signature.into_bytes())
    }
}

/// Signs urls that point at the local stream proxy placeholder.
pub struct StreamUrlSigner {
    signer: Box<dyn UrlSigner>,
    placeholder_host: String,
    proxy_base: Option<String>,
    clock: Clock,
}

impl StreamUrlSigner {
    pub fn new(
        signer: Box<dyn UrlSigner>,
        placeholder_host: impl Into<String>,
        proxy_base: Option<String>,
    ) -> StreamUrlSigner {
        StreamUrlSigner {
            signer,
            placeholder_host: placeholder_host.into(),
            proxy_base,
            clock: Box::new(unix_now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> StreamUrlSigner {
        self.clock = clock;
        self
    }

    pub fn matches(&self, url: &str) -> bool {
        url.contains(&self.placeholder_host)
    }

    pub fn sign(&self, url: &str) -> Result<String, SignError> {
        self.sign_at(url, (self.clock)())
    }

    /// Adds `t` and `key` to the query of `url`, replacing earlier values of
    /// both. The remaining query pairs are kept.
    pub fn sign_at(&self, url: &str, timestamp: u64) -> Result<String, SignError> {
        let url = self.substitute_proxy(url);
        let mut parsed = Url::parse(&url).map_err(|_| SignError::InvalidFormat(url.clone()))?;

        let (channel_id, video_id) =
            extract_ids(&parsed).ok_or_else(|| SignError::InvalidFormat(url.clone()))?;

        let timestamp = timestamp.to_string();
        let key = self.signer.key(&channel_id, &video_id, &timestamp);

        let retained: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| k != "t" && k != "key")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("t", &timestamp)
            .append_pair("key", &key);

        Ok(parsed.into())
    }

    fn substitute_proxy(&self, url: &str) -> String {
        let proxy_base = match &self.proxy_base {
            Some(base) => base.trim_end_matches('/'),
            None => return url.to_string(),
        };

        ["https://", "http://"]
            .iter()
            .find_map(|scheme| url.strip_prefix(&format!("{}{}", scheme, self.placeholder_host)))
            .map(|rest| format!("{}{}", proxy_base, rest))
            .unwrap_or_else(|| url.to_string())
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_else(|e| {
            error!("Failed to get a valid unix timestamp: {}", e);
            0
        })
}

/// Channel id and video id are the last two path segments, the latter
/// without its file extension. Both are hashed in decoded form.
fn extract_ids(url: &Url) -> Option<(String, String)> {
    let segments: Vec<String> = url
        .path_segments()?
        .map(|s| percent_decode_str(s).decode_utf8().map(|s| s.into_owned()))
        .collect::<Result<_, _>>()
        .ok()?;
    let (file, dirs) = segments.split_last()?;
    let channel_id = dirs.last().filter(|s| !s.is_empty())?;

    let dot = file.rfind('.')?;
    let (video_id, extension) = (&file[..dot], &file[dot + 1..]);

    if video_id.is_empty() || extension.is_empty() {
        return None;
    }

    Some((channel_id.clone(), video_id.to_string()))
}
