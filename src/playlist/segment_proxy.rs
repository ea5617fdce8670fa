use url::Url;

/// Routes the relative segment uris of a media playlist fetched from
/// `play_url` through the stream proxy at `proxy_base`.
///
/// Tags, blank lines and absolute uris are copied unchanged.
pub fn rewrite_segment_urls(play_url: &Url, content: &str, proxy_base: &str) -> String {
    let host = play_url.host_str().unwrap_or_default();
    let port = play_url
        .port()
        .unwrap_or(if play_url.scheme() == "https" { 443 } else { 80 });

    let path = play_url.path();
    let dir = &path[..path.rfind('/').unwrap_or(0)];

    content
        .trim()
        .lines()
        .map(|line| {
            if line.is_empty() || line.starts_with('#') || has_host(line) {
                line.to_string()
            } else {
                format!("{}/data/{}:{}{}/{}", proxy_base, host, port, dir, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn has_host(uri: &str) -> bool {
    uri.starts_with("//") || Url::parse(uri).map(|u| u.has_host()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_relative_segments() {
        let play_url = Url::parse("https://cdn.example.com/live/cctv1/index.m3u8?token=1").unwrap();
        let playlist = "#EXTM3U\n#EXT-X-TARGETDURATION:3\n\n#EXTINF:3,\nseg-1.ts\n#EXTINF:3,\nhttp://other.example.com/seg-2.ts\n";

        let rewritten = rewrite_segment_urls(&play_url, playlist, "https://proxy.example.com");

        assert_eq!(
            "#EXTM3U\n#EXT-X-TARGETDURATION:3\n\n#EXTINF:3,\nhttps://proxy.example.com/data/cdn.example.com:443/live/cctv1/seg-1.ts\n#EXTINF:3,\nhttp://other.example.com/seg-2.ts",
            rewritten
        );
    }

    #[test]
    fn test_explicit_port_and_root_path() {
        let play_url = Url::parse("http://10.0.0.1:4022/index.m3u8").unwrap();

        assert_eq!(
            "/data/10.0.0.1:4022/seg.ts",
            rewrite_segment_urls(&play_url, "seg.ts", "")
        );
    }
}
