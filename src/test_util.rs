use std::fs;
use std::path::{Path, PathBuf};

use crate::playlist::{Md5UrlSigner, StreamUrlSigner};

pub const FIXED_NOW: u64 = 1_700_000_000;

pub fn fixed_md5_signer(proxy_base: Option<&str>) -> StreamUrlSigner {
    StreamUrlSigner::new(
        Box::new(Md5UrlSigner::new(String::new())),
        "127.0.0.1:8080",
        proxy_base.map(str::to_string),
    )
    .with_clock(Box::new(|| FIXED_NOW))
}

/// Writes `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}
