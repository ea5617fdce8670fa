mod override_tables;

pub use override_tables::{LookupError, OverrideTables};

use log::{error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

use crate::playlist::{find_channel_url, Network, SuffixTag};

#[derive(Debug, ThisError)]
pub enum UpdateError {
    #[error("Failed to {action} `{}`: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub files: usize,
    pub lines: usize,
}

/// Refreshes channel urls of the local category files in place.
pub struct ChannelUpdater {
    txt_dir: PathBuf,
    merged_file_name: String,
    upstream_categories: Vec<String>,
    overrides: OverrideTables,
}

impl ChannelUpdater {
    /// Override tables are looked up below `txt_dir`.
    pub fn new(
        txt_dir: impl Into<PathBuf>,
        merged_file_name: impl Into<String>,
        upstream_categories: Vec<String>,
    ) -> Self {
        let txt_dir = txt_dir.into();

        ChannelUpdater {
            overrides: OverrideTables::new(txt_dir.clone()),
            txt_dir,
            merged_file_name: merged_file_name.into(),
            upstream_categories,
        }
    }

    /// Updates every category file against `upstream_txt`, the delimited-text
    /// form of the upstream snapshot. A file that fails is skipped.
    pub fn update_all(&self, upstream_txt: &str) -> UpdateSummary {
        info!("Starting to update local channel files in {}", self.txt_dir.display());

        let mut summary = UpdateSummary::default();

        let paths = match self.local_files() {
            Ok(paths) => paths,
            Err(e) => {
                error!("{}", e);
                return summary;
            }
        };

        for path in paths {
            info!("Processing file: {}", path.display());

            match self.update_file(&path, upstream_txt) {
                Ok(lines) => {
                    info!("Successfully updated {} ({} lines)", path.display(), lines);
                    summary.files += 1;
                    summary.lines += lines;
                }
                Err(e) => error!("{}", e),
            }
        }

        info!("Finished updating all files.");
        summary
    }

    /// Rewrites `path` with refreshed lines; all other lines are kept as is.
    /// Returns the number of replaced lines.
    pub fn update_file(&self, path: &Path, upstream_txt: &str) -> Result<usize, UpdateError> {
        let content = fs::read_to_string(path).map_err(|source| UpdateError::Io {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;

        let refresh_from_upstream = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map_or(false, |stem| self.upstream_categories.iter().any(|c| c == stem));

        let mut updated = 0;
        let mut output = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            match self.update_line(line, refresh_from_upstream, upstream_txt) {
                Some(new_line) => {
                    updated += 1;
                    output.push_str(&new_line);
                }
                None => output.push_str(line),
            }
        }

        fs::write(path, output).map_err(|source| UpdateError::Io {
            action: "write",
            path: path.to_path_buf(),
            source,
        })?;

        Ok(updated)
    }

    fn update_line(
        &self,
        line: &str,
        refresh_from_upstream: bool,
        upstream_txt: &str,
    ) -> Option<String> {
        let (name, url) = split_channel_line(line.trim())?;

        let entry = if Network::of_url(url).is_some() {
            let tag = match SuffixTag::parse(url) {
                Some(tag) => tag,
                None => {
                    warn!("Malformed suffix tag for {}: {}", name, url);
                    return None;
                }
            };

            match self.overrides.lookup(&tag, name) {
                Ok(new_url) => format!("{},{}{}", name, new_url, tag),
                Err(e @ LookupError::Miss { .. }) => {
                    info!("{}", e);
                    return None;
                }
                Err(e @ LookupError::Io { .. }) => {
                    error!("{}", e);
                    return None;
                }
            }
        } else if refresh_from_upstream {
            match find_channel_url(upstream_txt, name) {
                Some(new_url) => format!("{},{}", name, new_url),
                None => {
                    info!("No upstream url for channel `{}`", name);
                    return None;
                }
            }
        } else {
            return None;
        };

        info!("Updating URL for {}: {}", name, entry);
        Some(format!("{}{}", entry, line_ending(line)))
    }

    fn local_files(&self) -> Result<Vec<PathBuf>, UpdateError> {
        let entries = fs::read_dir(&self.txt_dir).map_err(|source| UpdateError::Io {
            action: "list",
            path: self.txt_dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| path.extension().map_or(false, |ext| ext == "txt"))
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name != self.merged_file_name.as_str())
            })
            .collect();

        paths.sort();
        Ok(paths)
    }
}

/// Lines with exactly one comma; anything else is passed through.
fn split_channel_line(line: &str) -> Option<(&str, &str)> {
    let (name, url) = line.split_once(',')?;

    if url.contains(',') {
        None
    } else {
        Some((name, url))
    }
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::write_file;

    const UPSTREAM_TXT: &str = "央视,#genre#\nCCTV1,http://upstream/cctv1.m3u8\nCCTV2,http://upstream/cctv2.m3u8\n";

    fn updater(root: &Path) -> ChannelUpdater {
        ChannelUpdater::new(
            root,
            "IPTV.txt",
            vec!["CCTV".to_string(), "CNTV".to_string()],
        )
    }

    #[test]
    fn test_hotel_line_updated_from_override_table() {
        let root = tempfile::tempdir().unwrap();
        write_file(root.path(), "hotel/中国22/11.txt", "CCTV1,http://new.stream/x\n");
        let path = write_file(root.path(), "Local.txt", "CCTV1,http://old$11222233酒店\n");

        let updated = updater(root.path()).update_file(&path, "").unwrap();

        assert_eq!(1, updated);
        assert_eq!(
            "CCTV1,http://new.stream/x$112233\n",
            fs::read_to_string(&path).unwrap()
        );
    }

    #[test]
    fn test_multicast_line_uses_udpxy_tables() {
        let root = tempfile::tempdir().unwrap();
        write_file(
            root.path(),
            "udpxy/中国电信/北京.txt",
            "CCTV1,http://hotel-only/1\n",
        );
        write_file(root.path(), "hotel/中国电信/北京.txt", "CCTV1,http://wrong/1\n");
        let path = write_file(
            root.path(),
            "Local.txt",
            "CCTV1,http://old/1$北京电信高清组播\r\nCCTV5,http://keep/5$北京电信高清组播",
        );

        updater(root.path()).update_file(&path, "").unwrap();

        assert_eq!(
            "CCTV1,http://hotel-only/1$北京电信高清\r\nCCTV5,http://keep/5$北京电信高清组播",
            fs::read_to_string(&path).unwrap()
        );
    }

    #[test]
    fn test_missing_override_table_leaves_line() {
        let root = tempfile::tempdir().unwrap();
        let content = "CCTV1,http://old$11222233酒店\nCCTV2,http://old$1122酒店\n";
        let path = write_file(root.path(), "CCTV.txt", content);

        let updated = updater(root.path())
            .update_file(&path, UPSTREAM_TXT)
            .unwrap();

        assert_eq!(0, updated);
        assert_eq!(content, fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn test_upstream_refresh_only_for_allowed_categories() {
        let root = tempfile::tempdir().unwrap();
        let content = "央视,#genre#\n\nCCTV1,http://stale/1\nCCTV2,http://stale/2,extra\nCCTV3,http://stale/3\nbroken line\n";
        let cctv = write_file(root.path(), "CCTV.txt", content);
        let movie = write_file(root.path(), "Movie.txt", content);

        let updater = updater(root.path());
        assert_eq!(1, updater.update_file(&cctv, UPSTREAM_TXT).unwrap());
        assert_eq!(0, updater.update_file(&movie, UPSTREAM_TXT).unwrap());

        assert_eq!(
            "央视,#genre#\n\nCCTV1,http://upstream/cctv1.m3u8\nCCTV2,http://stale/2,extra\nCCTV3,http://stale/3\nbroken line\n",
            fs::read_to_string(&cctv).unwrap()
        );
        assert_eq!(content, fs::read_to_string(&movie).unwrap());
    }

    #[test]
    fn test_update_all_skips_merged_output_and_subtrees() {
        let root = tempfile::tempdir().unwrap();
        let stale = "CCTV1,http://stale/1\n";
        write_file(root.path(), "CCTV.txt", stale);
        write_file(root.path(), "CNTV.txt", stale);
        write_file(root.path(), "IPTV.txt", stale);
        write_file(root.path(), "notes.md", stale);
        write_file(root.path(), "hotel/中国22/11.txt", stale);

        let summary = updater(root.path()).update_all(UPSTREAM_TXT);

        assert_eq!(UpdateSummary { files: 2, lines: 2 }, summary);
        assert_eq!(stale, fs::read_to_string(root.path().join("IPTV.txt")).unwrap());
        assert_eq!(stale, fs::read_to_string(root.path().join("notes.md")).unwrap());
        assert_eq!(
            stale,
            fs::read_to_string(root.path().join("hotel/中国22/11.txt")).unwrap()
        );
        assert_eq!(
            "CCTV1,http://upstream/cctv1.m3u8\n",
            fs::read_to_string(root.path().join("CNTV.txt")).unwrap()
        );
    }

    #[test]
    fn test_update_all_continues_after_unreadable_file() {
        let root = tempfile::tempdir().unwrap();
        let cctv = write_file(root.path(), "CCTV.txt", "CCTV1,http://stale/1\n");
        let cntv = root.path().join("CNTV.txt");
        fs::write(&cntv, [0xffu8, 0xfe]).unwrap();

        let summary = updater(root.path()).update_all(UPSTREAM_TXT);

        assert_eq!(UpdateSummary { files: 1, lines: 1 }, summary);
        assert_eq!(
            "CCTV1,http://upstream/cctv1.m3u8\n",
            fs::read_to_string(&cctv).unwrap()
        );
        assert_eq!(vec![0xff, 0xfe], fs::read(&cntv).unwrap());
    }

    #[test]
    fn test_update_all_missing_dir() {
        let root = tempfile::tempdir().unwrap();

        let summary = updater(&root.path().join("absent")).update_all(UPSTREAM_TXT);

        assert_eq!(UpdateSummary::default(), summary);
    }

    #[test]
    fn test_update_file_missing() {
        let root = tempfile::tempdir().unwrap();

        match updater(root.path()).update_file(&root.path().join("CCTV.txt"), "") {
            Err(UpdateError::Io { action, .. }) => assert_eq!("read", action),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_split_channel_line() {
        assert_eq!(Some(("a", "b")), split_channel_line("a,b"));
        assert_eq!(None, split_channel_line("a"));
        assert_eq!(None, split_channel_line("a,b,c"));
    }
}
