//! Asset retrieval and caching
//!
//! Assets live on the backend's temp file server (`GET /temp/{utterance}.wav`
//! and `.json`); a directory source covers local content and tests. Parsed
//! cue tracks are kept in a small LRU cache since a conversation revisits the
//! same utterances; audio bytes are not cached.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::{AssetError, AssetResult, CueTrack, Utterance};

/// Timeout for asset fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of utterance assets
pub trait AssetSource: Send + Sync {
    /// Retrieve and parse the cue document for an utterance
    fn load_cue_track(&self, utterance: &Utterance) -> AssetResult<CueTrack>;

    /// Retrieve the raw audio bytes for an utterance
    fn load_audio(&self, utterance: &Utterance) -> AssetResult<Vec<u8>>;
}

/// HTTP asset source backed by the pipeline's temp file server
pub struct HttpAssetSource {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl HttpAssetSource {
    /// Create a source rooted at `base_url` (e.g. `http://localhost:5000`)
    pub fn new(base_url: &str) -> AssetResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AssetError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch(&self, filename: &str) -> AssetResult<Vec<u8>> {
        let url = format!("{}/temp/{}", self.base_url, filename);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| AssetError::Network(e.to_string()))?;
        // Any non-success status means the asset was never generated.
        if !response.status().is_success() {
            return Err(AssetError::NotFound(url));
        }
        let bytes = response
            .bytes()
            .map_err(|e| AssetError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl AssetSource for HttpAssetSource {
    fn load_cue_track(&self, utterance: &Utterance) -> AssetResult<CueTrack> {
        let bytes = self.fetch(&utterance.cue_filename())?;
        CueTrack::from_json(&bytes)
    }

    fn load_audio(&self, utterance: &Utterance) -> AssetResult<Vec<u8>> {
        self.fetch(&utterance.audio_filename())
    }
}

/// Filesystem asset source reading from a content directory
pub struct DirAssetSource {
    base_dir: PathBuf,
}

impl DirAssetSource {
    /// Create a source rooted at `base_dir`
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn read(&self, filename: &str) -> AssetResult<Vec<u8>> {
        let path = self.base_dir.join(filename);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(AssetError::Io(e)),
        }
    }
}

impl AssetSource for DirAssetSource {
    fn load_cue_track(&self, utterance: &Utterance) -> AssetResult<CueTrack> {
        let bytes = self.read(&utterance.cue_filename())?;
        CueTrack::from_json(&bytes)
    }

    fn load_audio(&self, utterance: &Utterance) -> AssetResult<Vec<u8>> {
        self.read(&utterance.audio_filename())
    }
}

/// Asset store with a cue-track cache in front of a source
pub struct AssetStore<S: AssetSource> {
    source: S,
    cue_cache: Mutex<LruCache<Utterance, Arc<CueTrack>>>,
}

impl<S: AssetSource> AssetStore<S> {
    /// Create a store caching up to `cache_entries` parsed cue tracks
    pub fn new(source: S, cache_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_entries.max(1)).unwrap();
        Self {
            source,
            cue_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cue track for an utterance, from cache if present
    pub fn cue_track(&self, utterance: &Utterance) -> AssetResult<Arc<CueTrack>> {
        if let Some(track) = self.cue_cache.lock().get(utterance) {
            debug!(utterance = %utterance, "cue track cache hit");
            return Ok(Arc::clone(track));
        }
        let track = Arc::new(self.source.load_cue_track(utterance)?);
        self.cue_cache
            .lock()
            .put(utterance.clone(), Arc::clone(&track));
        Ok(track)
    }

    /// Audio bytes for an utterance (never cached)
    pub fn audio(&self, utterance: &Utterance) -> AssetResult<Vec<u8>> {
        self.source.load_audio(utterance)
    }

    /// Drop a cached cue track
    ///
    /// The pipeline regenerates assets in place under a fixed name
    /// (`current.json`), so the cache must be invalidated after a new
    /// lip-sync pass for that name.
    pub fn invalidate(&self, utterance: &Utterance) {
        self.cue_cache.lock().pop(utterance);
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CUE_JSON: &[u8] =
        br#"{ "mouthCues": [ { "start": 0.0, "end": 0.5, "value": "X" } ] }"#;

    fn dir_with_utterance(name: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{name}.json")), CUE_JSON).unwrap();
        std::fs::write(dir.path().join(format!("{name}.wav")), b"RIFFdata").unwrap();
        dir
    }

    #[test]
    fn test_dir_source_loads_assets() {
        let dir = dir_with_utterance("current");
        let source = DirAssetSource::new(dir.path());
        let utterance = Utterance::new("current").unwrap();

        let track = source.load_cue_track(&utterance).unwrap();
        assert_eq!(track.len(), 1);
        assert_eq!(track.cues()[0].value, "X");

        let audio = source.load_audio(&utterance).unwrap();
        assert_eq!(audio, b"RIFFdata");
    }

    #[test]
    fn test_dir_source_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirAssetSource::new(dir.path());
        let utterance = Utterance::new("nope").unwrap();

        assert!(matches!(
            source.load_cue_track(&utterance),
            Err(AssetError::NotFound(_))
        ));
        assert!(matches!(
            source.load_audio(&utterance),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn test_dir_source_malformed_cue() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"{ not json").unwrap();
        let source = DirAssetSource::new(dir.path());
        let utterance = Utterance::new("bad").unwrap();

        assert!(matches!(
            source.load_cue_track(&utterance),
            Err(AssetError::InvalidCue(_))
        ));
    }

    /// Source that counts loads, for cache behavior tests
    struct CountingSource {
        inner: DirAssetSource,
        cue_loads: AtomicUsize,
    }

    impl AssetSource for CountingSource {
        fn load_cue_track(&self, utterance: &Utterance) -> AssetResult<CueTrack> {
            self.cue_loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_cue_track(utterance)
        }

        fn load_audio(&self, utterance: &Utterance) -> AssetResult<Vec<u8>> {
            self.inner.load_audio(utterance)
        }
    }

    #[test]
    fn test_store_caches_cue_tracks() {
        let dir = dir_with_utterance("current");
        let store = AssetStore::new(
            CountingSource {
                inner: DirAssetSource::new(dir.path()),
                cue_loads: AtomicUsize::new(0),
            },
            4,
        );
        let utterance = Utterance::new("current").unwrap();

        store.cue_track(&utterance).unwrap();
        store.cue_track(&utterance).unwrap();
        assert_eq!(store.source().cue_loads.load(Ordering::SeqCst), 1);

        store.invalidate(&utterance);
        store.cue_track(&utterance).unwrap();
        assert_eq!(store.source().cue_loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_store_error_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(DirAssetSource::new(dir.path()), 4);
        let utterance = Utterance::new("ghost").unwrap();

        assert!(store.cue_track(&utterance).is_err());

        // Asset appears later; the failure must not have been cached.
        std::fs::write(dir.path().join("ghost.json"), CUE_JSON).unwrap();
        assert!(store.cue_track(&utterance).is_ok());
    }
}
