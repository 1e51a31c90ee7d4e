// src/cache.rs
//! Content-addressed bake cache.
//!
//! Keys are derived from everything that affects a bake — shader identity,
//! every declared property value in declaration order, the settings, the
//! generator version, and the target platform — and nothing else. The
//! backing store is shared process-wide (and across tool invocations), so
//! all disk access goes through a named lock per cache domain; the guard
//! drops on every exit path. A corrupt or unreadable entry is logged and
//! degraded to a miss, never an error. Eviction is exposed but the baking
//! pipeline itself never calls it.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use xxhash_rust::xxh3::Xxh3;

use crate::material::{PropertyValue, SourceMaterial};
use crate::pix::{PixError, PixelData};
use crate::settings::{ConvertSettings, Platform};

/// Bumped whenever bake output changes for identical inputs. Participates in
/// keys and file names, so stale caches miss instead of serving wrong data.
pub const GENERATOR_VERSION: u32 = 2;

/// Entries kept in the in-memory LRU front of the disk store.
const MEM_ENTRIES: usize = 64;

const MANIFEST_FILE: &str = "manifest.json";
const ENTRY_EXT: &str = "pix";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache manifest error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cache entry error: {0}")]
    Pix(#[from] PixError),
}

/// Fully-derived cache identity for one baked texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Hex digest over shader identity + property values + settings +
    /// generator version + platform.
    pub hash: String,
    pub settings_type: &'static str,
    pub feature: String,
    pub platform: &'static str,
}

impl CacheKey {
    /// Stable file stem per the external naming contract:
    /// `texture_{generatorVersion}_{settingsTypeName}_{featureName}_{platformTag}_{contentHash}`.
    pub fn file_stem(&self) -> String {
        format!(
            "texture_{}_{}_{}_{}_{}",
            GENERATOR_VERSION, self.settings_type, self.feature, self.platform, self.hash
        )
    }
}

/// Derive the cache key for one feature bake of a material.
///
/// Deterministic: identical inputs always produce identical keys, and any
/// change in a consumed value produces a different key. Texture properties
/// contribute a content hash of their pixel data, not an object identity.
pub fn derive_key(
    material: &SourceMaterial,
    settings: &ConvertSettings,
    platform: Platform,
    feature: &str,
) -> CacheKey {
    let mut hasher = Xxh3::new();
    hasher.update(material.shader_name().as_bytes());

    for (name, value) in material.properties() {
        hasher.update(name.as_bytes());
        match value {
            PropertyValue::Color(c) => {
                hasher.update(b"c");
                for component in c {
                    hasher.update(&component.to_le_bytes());
                }
            }
            PropertyValue::Vector(v) => {
                hasher.update(b"v");
                for component in v {
                    hasher.update(&component.to_le_bytes());
                }
            }
            PropertyValue::Float(f) => {
                hasher.update(b"f");
                hasher.update(&f.to_le_bytes());
            }
            PropertyValue::Texture(t) => {
                hasher.update(b"t");
                hasher.update(&t.content_hash().to_le_bytes());
            }
        }
    }

    hasher.update(settings.cache_key().as_bytes());
    hasher.update(&GENERATOR_VERSION.to_le_bytes());
    hasher.update(platform.tag().as_bytes());

    CacheKey {
        hash: format!("{:016x}", hasher.digest()),
        settings_type: settings.type_name(),
        feature: feature.to_string(),
        platform: platform.tag(),
    }
}

// Process-wide registry of named locks, one per cache domain. Domains are
// independent; two caches sharing a domain name share exclusion.
static NAMED_LOCKS: Mutex<Option<HashMap<String, Arc<Mutex<()>>>>> = Mutex::new(None);

fn named_lock(domain: &str) -> Arc<Mutex<()>> {
    let mut registry = NAMED_LOCKS.lock();
    registry
        .get_or_insert_with(HashMap::new)
        .entry(domain.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ManifestEntry {
    size: u64,
    last_access: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Hit/miss/eviction counters for one cache instance.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.1}%, evictions: {}, entries: {} }}",
            self.hits, self.misses, hit_rate, self.evictions, self.entries
        )
    }
}

/// Disk-backed bake cache with an in-memory LRU front.
pub struct BakeCache {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
    mem: Mutex<LruCache<String, Arc<PixelData>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl BakeCache {
    /// Open (or create) a cache rooted at `dir`. The `domain` names the
    /// mutual-exclusion scope; independent cache domains get independent
    /// locks.
    pub fn new(dir: impl Into<PathBuf>, domain: &str) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: named_lock(domain),
            mem: Mutex::new(LruCache::new(NonZeroUsize::new(MEM_ENTRIES).unwrap())),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    fn entry_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{ENTRY_EXT}"))
    }

    /// Look up previously baked pixels. Any read failure is a miss.
    pub fn try_get(&self, key: &CacheKey) -> Option<Arc<PixelData>> {
        let stem = key.file_stem();

        if let Some(hit) = self.mem.lock().get(&stem).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(hit);
        }

        let path = self.entry_path(&stem);
        let bytes = {
            let _guard = self.lock.lock();
            match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                Err(e) => {
                    log::warn!("cache read failed for {}: {e}", path.display());
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };

        let pixels = match PixelData::decode(&bytes) {
            Ok(pixels) => Arc::new(pixels),
            Err(e) => {
                log::warn!("corrupt cache entry {}: {e}", path.display());
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if let Err(e) = self.touch_manifest(&stem, bytes.len() as u64) {
            log::warn!("cache manifest update failed: {e}");
        }

        self.mem.lock().put(stem, pixels.clone());
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(pixels)
    }

    /// Store a freshly baked entry. Entries are immutable once written; a
    /// re-put of the same key overwrites with identical content.
    pub fn put(&self, key: &CacheKey, pixels: &PixelData) -> Result<(), CacheError> {
        let stem = key.file_stem();
        let path = self.entry_path(&stem);
        let encoded = pixels.encode();

        {
            let _guard = self.lock.lock();
            // Write-then-rename so concurrent readers never see a torn entry.
            let tmp = self.dir.join(format!("{stem}.tmp"));
            std::fs::write(&tmp, &encoded)?;
            std::fs::rename(&tmp, &path)?;
        }

        self.touch_manifest(&stem, encoded.len() as u64)?;
        self.mem.lock().put(stem, Arc::new(pixels.clone()));
        Ok(())
    }

    fn load_manifest(&self) -> Manifest {
        let path = self.dir.join(MANIFEST_FILE);
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(manifest) => manifest,
                Err(e) => {
                    log::warn!("corrupt cache manifest {}: {e}", path.display());
                    Manifest::default()
                }
            },
            Err(_) => Manifest::default(),
        }
    }

    fn save_manifest(&self, manifest: &Manifest) -> Result<(), CacheError> {
        let path = self.dir.join(MANIFEST_FILE);
        let tmp = self.dir.join("manifest.tmp");
        std::fs::write(&tmp, serde_json::to_vec(manifest)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn touch_manifest(&self, stem: &str, size: u64) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        let mut manifest = self.load_manifest();
        manifest.entries.insert(
            stem.to_string(),
            ManifestEntry {
                size,
                last_access: now_secs(),
            },
        );
        self.save_manifest(&manifest)
    }

    /// Remove least-recently-accessed entries until the store fits
    /// `max_total_bytes`. Exposed for external policy; the baking pipeline
    /// never calls this.
    pub fn evict_to(&self, max_total_bytes: u64) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        let mut manifest = self.load_manifest();

        let mut total: u64 = manifest.entries.values().map(|e| e.size).sum();
        if total <= max_total_bytes {
            return Ok(());
        }

        let mut ordered: Vec<(String, ManifestEntry)> = manifest
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        ordered.sort_by_key(|(_, e)| e.last_access);

        for (stem, entry) in ordered {
            if total <= max_total_bytes {
                break;
            }
            let path = self.entry_path(&stem);
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("cache eviction failed for {}: {e}", path.display());
                    continue;
                }
            }
            manifest.entries.remove(&stem);
            self.mem.lock().pop(&stem);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            total = total.saturating_sub(entry.size);
        }

        self.save_manifest(&manifest)
    }

    /// Drop every entry and the manifest.
    pub fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_entry = path
                .extension()
                .map(|ext| ext == ENTRY_EXT)
                .unwrap_or(false);
            if is_entry || path.file_name().map(|n| n == MANIFEST_FILE).unwrap_or(false) {
                std::fs::remove_file(&path)?;
            }
        }
        self.mem.lock().clear();
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.load_manifest().entries.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{PropertyValue, TextureData};
    use crate::settings::FlatLitSettings;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("matbake_cache_{}_{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn material() -> SourceMaterial {
        SourceMaterial::new("liltoon")
            .with("_Color", PropertyValue::Color([1.0, 0.5, 0.25, 1.0]))
            .with("_MainTex", PropertyValue::Texture(TextureData::solid([200, 100, 50, 255])))
    }

    fn settings() -> ConvertSettings {
        ConvertSettings::FlatLit(FlatLitSettings::default())
    }

    #[test]
    fn test_key_determinism() {
        let mat = material();
        let a = derive_key(&mat, &settings(), Platform::Android, "main");
        let b = derive_key(&mat, &settings(), Platform::Android, "main");
        assert_eq!(a, b);
        assert_eq!(a.file_stem(), b.file_stem());
    }

    #[test]
    fn test_key_sensitivity() {
        let base = derive_key(&material(), &settings(), Platform::Android, "main");

        // Any single property value change yields a different hash
        let recolored = SourceMaterial::new("liltoon")
            .with("_Color", PropertyValue::Color([1.0, 0.5, 0.26, 1.0]))
            .with("_MainTex", PropertyValue::Texture(TextureData::solid([200, 100, 50, 255])));
        assert_ne!(
            base.hash,
            derive_key(&recolored, &settings(), Platform::Android, "main").hash
        );

        // Texture content changes the key even with identical dimensions
        let retextured = SourceMaterial::new("liltoon")
            .with("_Color", PropertyValue::Color([1.0, 0.5, 0.25, 1.0]))
            .with("_MainTex", PropertyValue::Texture(TextureData::solid([201, 100, 50, 255])));
        assert_ne!(
            base.hash,
            derive_key(&retextured, &settings(), Platform::Android, "main").hash
        );

        // Platform and settings changes also diverge
        assert_ne!(
            base.file_stem(),
            derive_key(&material(), &settings(), Platform::Ios, "main").file_stem()
        );
        let mut small = FlatLitSettings::default();
        small.max_texture_size = 256;
        assert_ne!(
            base.hash,
            derive_key(
                &material(),
                &ConvertSettings::FlatLit(small),
                Platform::Android,
                "main"
            )
            .hash
        );
    }

    #[test]
    fn test_file_stem_contract() {
        let key = derive_key(&material(), &settings(), Platform::Android, "emission");
        let stem = key.file_stem();
        assert!(stem.starts_with(&format!("texture_{GENERATOR_VERSION}_FlatLit_emission_android_")));
        assert!(stem.ends_with(&key.hash));
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let cache = BakeCache::new(test_dir("roundtrip"), "texture cache").unwrap();
        let key = derive_key(&material(), &settings(), Platform::Android, "main");
        let pixels = PixelData::new(2, 2, vec![42u8; 16]);

        assert!(cache.try_get(&key).is_none());
        cache.put(&key, &pixels).unwrap();
        let hit = cache.try_get(&key).unwrap();
        assert_eq!(*hit, pixels);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let cache = BakeCache::new(test_dir("corrupt"), "texture cache").unwrap();
        let key = derive_key(&material(), &settings(), Platform::Android, "main");

        std::fs::write(cache.entry_path(&key.file_stem()), b"not a pix file").unwrap();
        assert!(cache.try_get(&key).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_evict_to_drops_least_recent() {
        let cache = BakeCache::new(test_dir("evict"), "texture cache").unwrap();
        let old_key = derive_key(&material(), &settings(), Platform::Android, "main");
        let new_key = derive_key(&material(), &settings(), Platform::Android, "emission");
        let pixels = PixelData::new(2, 2, vec![1u8; 16]);
        cache.put(&old_key, &pixels).unwrap();
        cache.put(&new_key, &pixels).unwrap();

        // Backdate the first entry so eviction order is deterministic
        {
            let mut manifest = cache.load_manifest();
            manifest
                .entries
                .get_mut(&old_key.file_stem())
                .unwrap()
                .last_access = 1;
            cache.save_manifest(&manifest).unwrap();
        }

        let entry_size = pixels.encode().len() as u64;
        cache.evict_to(entry_size).unwrap();

        assert!(!cache.entry_path(&old_key.file_stem()).exists());
        assert!(cache.entry_path(&new_key.file_stem()).exists());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_clear_empties_store() {
        let cache = BakeCache::new(test_dir("clear"), "texture cache").unwrap();
        let key = derive_key(&material(), &settings(), Platform::Android, "main");
        cache.put(&key, &PixelData::new(1, 1, vec![0u8; 4])).unwrap();
        cache.clear().unwrap();
        assert!(cache.try_get(&key).is_none());
        assert_eq!(cache.stats().entries, 0);
    }
}
