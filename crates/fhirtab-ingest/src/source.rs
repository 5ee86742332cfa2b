//! Bundle source locations.

use std::path::PathBuf;

/// Where a run's bundles come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleSource {
    /// Every regular file in a local directory, in name order.
    LocalDir(PathBuf),
    /// A single bundle fetched over HTTP.
    FileUrl(String),
    /// A public GitHub folder: the listing is fetched first, then every
    /// file named in it.
    FolderUrl(String),
}

impl std::fmt::Display for BundleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleSource::LocalDir(path) => write!(f, "local directory {}", path.display()),
            BundleSource::FileUrl(url) => write!(f, "file url {url}"),
            BundleSource::FolderUrl(url) => write!(f, "folder url {url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_variant() {
        let source = BundleSource::LocalDir(PathBuf::from("/data/fhir"));
        assert_eq!(source.to_string(), "local directory /data/fhir");

        let source = BundleSource::FileUrl("https://example.org/b.json".to_string());
        assert_eq!(source.to_string(), "file url https://example.org/b.json");
    }
}
