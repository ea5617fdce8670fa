use serde::Deserialize;

use super::SettingsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningDigest {
    Md5,
    HmacSha256,
}

#[derive(Debug, Clone)]
pub struct Signing {
    pub salt: String,
    /// Replaces the placeholder scheme and host when set.
    pub proxy_url: Option<String>,
    pub placeholder_host: String,
    pub digest: SigningDigest,
}

impl Signing {
    pub fn new(sources: Vec<PartialSigning>) -> Result<Self, SettingsError> {
        let merged: PartialSigning =
            sources
                .into_iter()
                .fold(Default::default(), |acc, x| PartialSigning {
                    salt: acc.salt.or(x.salt),
                    proxy_url: acc.proxy_url.or(x.proxy_url),
                    placeholder_host: acc.placeholder_host.or(x.placeholder_host),
                    digest: acc.digest.or(x.digest),
                });

        Ok(Signing {
            salt: merged
                .salt
                .ok_or_else(|| SettingsError::MissingValue("signing.salt".to_string()))?,
            proxy_url: merged.proxy_url.filter(|url| !url.is_empty()),
            placeholder_host: merged.placeholder_host.ok_or_else(|| {
                SettingsError::MissingValue("signing.placeholder_host".to_string())
            })?,
            digest: merged
                .digest
                .ok_or_else(|| SettingsError::MissingValue("signing.digest".to_string()))?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialSigning {
    pub salt: Option<String>,
    pub proxy_url: Option<String>,
    pub placeholder_host: Option<String>,
    pub digest: Option<SigningDigest>,
}
