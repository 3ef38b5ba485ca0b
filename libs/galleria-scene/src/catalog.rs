use std::path::{Path, PathBuf};

use bevy::prelude::*;
use thiserror::Error;

/// Asset paths bundled with the default build, relative to the asset root.
const BUILTIN_IMAGES: &[&str] = &[
    "images/DSC03927.webp",
    "images/DSC03932.webp",
    "images/DSC03983.webp",
    "images/DSC03985.webp",
    "images/DSC04276.webp",
    "images/DSC04376.webp",
    "images/DSC04911.webp",
    "images/DSC04928.webp",
    "images/DSC04931.webp",
    "images/DSC04934.webp",
    "images/DSC04936.webp",
    "images/IMG_0090.webp",
    "images/IMG_0132.webp",
    "images/IMG_0164.webp",
    "images/IMG_0344.webp",
    "images/IMG_0354.webp",
    "images/IMG_0381.webp",
    "images/IMG_0382.webp",
    "images/IMG_0399.webp",
    "images/IMG_0403.webp",
    "images/IMG_0407.webp",
    "images/IMG_0436.webp",
    "images/IMG_0445.webp",
    "images/IMG_0506.webp",
    "images/IMG_0578.webp",
    "images/IMG_0659.webp",
    "images/IMG_0665.webp",
    "images/IMG_0675.webp",
    "images/IMG_0687.webp",
    "images/IMG_0694.webp",
    "images/IMG_0698.webp",
    "images/IMG_0743.webp",
    "images/IMG_0758.webp",
    "images/IMG_0868.webp",
    "images/IMG_0871.webp",
    "images/IMG_0879.webp",
    "images/IMG_0977.webp",
    "images/IMG_1248.webp",
    "images/IMG_1375.webp",
    "images/PXL_20250329_140247478.webp",
    "images/PXL_20250329_140938227.MP.webp",
    "images/PXL_20250329_141611004.webp",
];

const IMAGE_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read image directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no images found in {path}")]
    Empty { path: PathBuf },
}

/// The fixed, ordered list of image asset paths the tunnel draws from.
/// Any entry may be referenced by several slabs at once.
#[derive(Resource, Clone, Default, Debug)]
pub struct ImageCatalog {
    paths: Vec<String>,
}

impl ImageCatalog {
    pub fn builtin() -> Self {
        Self {
            paths: BUILTIN_IMAGES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Scans `<asset_root>/<dir>` for image files. The listing is sorted so
    /// the catalog order is stable across runs.
    pub fn scan(asset_root: &Path, dir: &str) -> Result<Self, CatalogError> {
        let path = asset_root.join(dir);
        let entries = std::fs::read_dir(&path).map_err(|source| CatalogError::ReadDir {
            path: path.clone(),
            source,
        })?;
        let mut paths: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .filter_map(|p| {
                p.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| format!("{dir}/{name}"))
            })
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(CatalogError::Empty { path });
        }
        Ok(Self { paths })
    }

    pub fn pick<'a>(&'a self, rng: &mut fastrand::Rng) -> &'a str {
        &self.paths[rng.usize(0..self.paths.len())]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = ImageCatalog::builtin();
        assert!(!catalog.is_empty());
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..64 {
            let url = catalog.pick(&mut rng);
            assert!(url.starts_with("images/"));
        }
    }

    #[test]
    fn test_scan_sorted() {
        let root = std::env::temp_dir().join(format!("galleria-catalog-{}", std::process::id()));
        let dir = root.join("shots");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.webp", "a.png", "c.jpg", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        let catalog = ImageCatalog::scan(&root, "shots").unwrap();
        assert_eq!(catalog.paths, vec!["shots/a.png", "shots/b.webp", "shots/c.jpg"]);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_scan_missing_dir() {
        let err = ImageCatalog::scan(Path::new("/nonexistent"), "shots").unwrap_err();
        assert!(matches!(err, CatalogError::ReadDir { .. }));
    }
}
