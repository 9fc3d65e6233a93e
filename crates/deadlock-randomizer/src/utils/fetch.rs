//! Downloading game data with a local fallback copy.

use crate::errors::CliError;
use crate::utils::write_creating_parents;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs;

/// Where a piece of game data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Downloaded; the cache was rewritten.
    Downloaded,
    /// Downloaded and identical to the cached copy.
    Unchanged,
    /// Download failed; the cached copy was used.
    Cache,
}

/// Hex-encoded SHA-256 of `data`.
pub fn digest_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Decide between a download result and the cached copy at `cache_path`.
///
/// A successful download refreshes the cache when its digest differs. A
/// failed download falls back to the cache, and fails only when there is no
/// cache to fall back to.
pub fn resolve_with_cache<E>(
    downloaded: Result<String, E>,
    cache_path: &Utf8Path,
) -> Result<(String, Source), E>
where
    E: std::fmt::Display,
{
    match downloaded {
        Ok(text) => {
            let cached = fs::read(cache_path).ok();
            let unchanged = cached
                .as_deref()
                .is_some_and(|bytes| digest_hex(bytes) == digest_hex(text.as_bytes()));
            if unchanged {
                return Ok((text, Source::Unchanged));
            }
            if let Err(err) = write_creating_parents(cache_path, &text) {
                tracing::warn!(path = %cache_path, %err, "could not update cached copy");
            }
            Ok((text, Source::Downloaded))
        }
        Err(err) => match fs::read_to_string(cache_path) {
            Ok(text) => {
                tracing::warn!(path = %cache_path, %err, "download failed, using cached copy");
                Ok((text, Source::Cache))
            }
            Err(_) => Err(err),
        },
    }
}

fn download(client: &reqwest::blocking::Client, url: &str) -> reqwest::Result<String> {
    client.get(url).send()?.error_for_status()?.text()
}

/// Download `url`, keeping `cache_path` as the fallback copy.
pub fn fetch_vdata(
    client: &reqwest::blocking::Client,
    url: &str,
    cache_path: &Utf8Path,
) -> Result<(String, Source), CliError> {
    tracing::debug!(url, "downloading");
    resolve_with_cache(download(client, url), cache_path).map_err(|source| {
        CliError::VdataUnavailable {
            url: url.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    fn cache_in(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("cache").join("abilities.vdata")).unwrap()
    }

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(
            digest_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn download_populates_missing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        let result = resolve_with_cache::<String>(Ok("fresh".to_string()), &cache).unwrap();
        assert_eq!(result, ("fresh".to_string(), Source::Downloaded));
        assert_eq!(fs::read_to_string(&cache).unwrap(), "fresh");

        let again = resolve_with_cache::<String>(Ok("fresh".to_string()), &cache).unwrap();
        assert_eq!(again.1, Source::Unchanged);

        let changed = resolve_with_cache::<String>(Ok("newer".to_string()), &cache).unwrap();
        assert_eq!(changed.1, Source::Downloaded);
        assert_eq!(fs::read_to_string(&cache).unwrap(), "newer");
    }

    #[test]
    fn failed_download_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        write_creating_parents(&cache, "cached").unwrap();

        let result = resolve_with_cache(Err("offline".to_string()), &cache).unwrap();
        assert_eq!(result, ("cached".to_string(), Source::Cache));
    }

    #[test]
    fn failed_download_without_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_with_cache(Err("offline".to_string()), &cache_in(&dir));
        assert_eq!(result, Err("offline".to_string()));
    }
}
