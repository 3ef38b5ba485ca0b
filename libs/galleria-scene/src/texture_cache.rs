use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::image::{ImageLoaderSettings, ImageSampler};
use bevy::prelude::*;

/// Load progress of one cached texture. Resolved at most once; `Unavailable`
/// is terminal, there is no retry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextureState {
    Pending,
    Ready { width: u32, height: u32 },
    Unavailable,
}

pub struct TextureEntry {
    pub handle: Handle<Image>,
    pub state: TextureState,
}

/// Memoizes image loads by URL: every slab referencing the same URL shares one
/// handle, and the underlying fetch happens at most once per scene lifetime.
#[derive(Resource, Default)]
pub struct TextureCache {
    entries: HashMap<String, TextureEntry>,
    released: bool,
}

impl TextureCache {
    /// Returns the cached handle for `url`, starting an asynchronous load on
    /// first request. Callers arriving while the load is still pending are
    /// coalesced onto the same handle.
    pub fn acquire(&mut self, assets: &AssetServer, url: &str) -> Handle<Image> {
        if let Some(entry) = self.entries.get(url) {
            return entry.handle.clone();
        }
        let handle = assets.load_with_settings(
            url.to_owned(),
            |settings: &mut ImageLoaderSettings| {
                // Display-ready color, bilinear sampling, no mipmaps.
                settings.is_srgb = true;
                settings.sampler = ImageSampler::linear();
            },
        );
        self.entries.insert(
            url.to_owned(),
            TextureEntry {
                handle: handle.clone(),
                state: TextureState::Pending,
            },
        );
        handle
    }

    pub fn get(&self, url: &str) -> Option<&TextureEntry> {
        self.entries.get(url)
    }

    /// True once the texture has decoded and its natural dimensions are known.
    pub fn is_ready(&self, url: &str) -> bool {
        matches!(
            self.entries.get(url).map(|e| e.state),
            Some(TextureState::Ready { .. })
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached handle. Called once at teardown; subsequent calls
    /// are no-ops and return 0.
    pub fn release_all(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = (&String, &mut TextureEntry)> {
        self.entries.iter_mut()
    }
}

/// Advances pending cache entries as the asset server finishes loads.
/// Failures resolve to `Unavailable` without retry; the slabs watching the
/// entry stay transparent.
pub fn track_texture_loads(
    mut cache: ResMut<TextureCache>,
    assets: Res<AssetServer>,
    images: Res<Assets<Image>>,
) {
    for (url, entry) in cache.entries_mut() {
        if entry.state != TextureState::Pending {
            continue;
        }
        match assets.load_state(&entry.handle) {
            LoadState::Loaded => {
                let Some(image) = images.get(&entry.handle) else {
                    continue;
                };
                entry.state = TextureState::Ready {
                    width: image.width(),
                    height: image.height(),
                };
            }
            LoadState::Failed(err) => {
                warn!("image load failed for {url}: {err}");
                entry.state = TextureState::Unavailable;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>();
        app
    }

    #[test]
    fn test_acquire_coalesces() {
        let app = asset_app();
        let assets = app.world().resource::<AssetServer>();
        let mut cache = TextureCache::default();
        let a = cache.acquire(assets, "images/a.webp");
        let b = cache.acquire(assets, "images/a.webp");
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        let c = cache.acquire(assets, "images/c.webp");
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_release_all_idempotent() {
        let app = asset_app();
        let assets = app.world().resource::<AssetServer>();
        let mut cache = TextureCache::default();
        cache.acquire(assets, "images/a.webp");
        cache.acquire(assets, "images/b.webp");
        assert_eq!(cache.release_all(), 2);
        assert_eq!(cache.release_all(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pending_until_tracked() {
        let app = asset_app();
        let assets = app.world().resource::<AssetServer>();
        let mut cache = TextureCache::default();
        cache.acquire(assets, "images/a.webp");
        assert!(!cache.is_ready("images/a.webp"));
        assert_eq!(
            cache.get("images/a.webp").map(|e| e.state),
            Some(TextureState::Pending)
        );
    }
}
