//! Interactive state around generation passes: the loaded source, the
//! current crop and size selection, and the published download files.
//!
//! Every input change and every generation request advances a
//! [`GenerationToken`].  Results are only accepted for the most recent token,
//! so a slow pass that finishes after the user moved on is dropped instead of
//! mixing old and new inputs.  Published files are [`BlobHandle`]s, which
//! release their storage when dropped.

use crate::config::IconConfig;
use crate::crop::CropRegion;
use crate::decode::{decode_with_config, is_image_mime};
use crate::error::{Error, Result};
use crate::generate::{generate_with_config, GeneratedIcons};
use crate::icondir::IcoContainer;
use crate::naming::{base_file_name, bundle_file_name, per_size_file_name};
use crate::raster::RasterImage;
use crate::sizes::IconSizeSet;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

//===========================================================================//

/// Somewhere generated files can be exposed for download.
pub trait BlobStore: Send + Sync {
    /// Stores `data` under a new key.
    fn publish(&self, file_name: &str, data: &[u8]) -> Result<BlobKey>;

    /// Frees the data stored under `key`.  Releasing an unknown key is a
    /// no-op.
    fn release(&self, key: &BlobKey);
}

/// Identifies one published blob within its [`BlobStore`].
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BlobKey(String);

impl BlobKey {
    /// Wraps a store-specific key.
    pub fn new(key: impl Into<String>) -> BlobKey {
        BlobKey(key.into())
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A published file.  Dropping the handle releases the blob.
pub struct BlobHandle {
    key: BlobKey,
    file_name: String,
    len: usize,
    store: Arc<dyn BlobStore>,
}

impl BlobHandle {
    /// Publishes `data` to `store` and returns a handle owning it.
    pub fn publish(
        store: &Arc<dyn BlobStore>,
        file_name: String,
        data: &[u8],
    ) -> Result<BlobHandle> {
        let key = store.publish(&file_name, data)?;
        debug!("Published {} as {} ({} bytes)", file_name, key, data.len());
        Ok(BlobHandle { key, file_name, len: data.len(), store: store.clone() })
    }

    /// Returns the store key of the blob.
    pub fn key(&self) -> &BlobKey {
        &self.key
    }

    /// Returns the suggested download name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the size of the blob, in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        debug!("Releasing {} ({})", self.key, self.file_name);
        self.store.release(&self.key);
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("key", &self.key)
            .field("file_name", &self.file_name)
            .field("len", &self.len)
            .finish()
    }
}

//===========================================================================//

/// An in-process [`BlobStore`] keyed by `blob:<n>`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    next_id: AtomicU64,
    blobs: Mutex<HashMap<BlobKey, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> MemoryBlobStore {
        MemoryBlobStore::default()
    }

    /// Returns a copy of the blob stored under `key`, if it is still live.
    pub fn get(&self, key: &BlobKey) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// Returns the number of blobs that have not been released.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BlobKey, Vec<u8>>> {
        // A panic while holding the lock can't leave the map half-updated.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn publish(&self, _file_name: &str, data: &[u8]) -> Result<BlobKey> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = BlobKey::new(format!("blob:{}", id));
        self.lock().insert(key.clone(), data.to_vec());
        Ok(key)
    }

    fn release(&self, key: &BlobKey) {
        self.lock().remove(key);
    }
}

//===========================================================================//

/// Identifies one state of a session's inputs.  Later tokens compare
/// greater.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GenerationToken(u64);

impl GenerationToken {
    /// Returns the raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A snapshot of everything a generation pass needs.  It owns its inputs, so
/// it can be run on another thread while the session keeps changing.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    token: GenerationToken,
    source: Arc<RasterImage>,
    crop: CropRegion,
    sizes: IconSizeSet,
    base_name: String,
}

impl GenerationRequest {
    /// Returns the token this request was issued with.
    pub fn token(&self) -> GenerationToken {
        self.token
    }

    /// Returns the crop captured by this request.
    pub fn crop(&self) -> CropRegion {
        self.crop
    }

    /// Returns the sizes captured by this request.
    pub fn sizes(&self) -> &IconSizeSet {
        &self.sizes
    }

    /// Runs the generation pass for this snapshot.
    pub fn run(&self, config: &IconConfig) -> Result<GeneratedIcons> {
        generate_with_config(&self.source, self.crop, &self.sizes, config)
    }
}

//===========================================================================//

/// Download handles for the output of one generation pass.
#[derive(Debug)]
pub struct PublishedIcons {
    token: GenerationToken,
    per_size: Vec<(u32, BlobHandle)>,
    bundle: BlobHandle,
}

impl PublishedIcons {
    /// Returns the token of the pass that produced these files.
    pub fn token(&self) -> GenerationToken {
        self.token
    }

    /// Returns the single-size files in ascending size order.
    pub fn per_size(&self) -> &[(u32, BlobHandle)] {
        &self.per_size
    }

    /// Returns the multi-size bundle file.
    pub fn bundle(&self) -> &BlobHandle {
        &self.bundle
    }

    fn publish(
        store: &Arc<dyn BlobStore>,
        token: GenerationToken,
        base_name: &str,
        icons: GeneratedIcons,
    ) -> Result<PublishedIcons> {
        let (icons, bundle) = icons.into_parts();
        // If a publish fails, the handles collected so far are dropped and
        // therefore released.
        let mut per_size = Vec::with_capacity(icons.len());
        for icon in icons {
            let size = icon.size();
            let handle = publish_container(
                store,
                per_size_file_name(base_name, size),
                &icon.into_container(),
            )?;
            per_size.push((size, handle));
        }
        let bundle =
            publish_container(store, bundle_file_name(base_name), &bundle)?;
        Ok(PublishedIcons { token, per_size, bundle })
    }
}

fn publish_container(
    store: &Arc<dyn BlobStore>,
    file_name: String,
    container: &IcoContainer,
) -> Result<BlobHandle> {
    BlobHandle::publish(store, file_name, container.as_bytes())
}

//===========================================================================//

struct LoadedSource {
    base_name: String,
    image: Arc<RasterImage>,
}

/// The editable state of the icon generator.
pub struct IconSession {
    store: Arc<dyn BlobStore>,
    config: IconConfig,
    source: Option<LoadedSource>,
    crop: Option<CropRegion>,
    sizes: IconSizeSet,
    latest: u64,
    published: Option<PublishedIcons>,
}

impl IconSession {
    /// Creates a session with no source and the default size selection.
    pub fn new(store: Arc<dyn BlobStore>, config: IconConfig) -> IconSession {
        IconSession {
            store,
            config,
            source: None,
            crop: None,
            sizes: IconSizeSet::default_selection(),
            latest: 0,
            published: None,
        }
    }

    /// Returns the configuration used for decoding and generation.
    pub fn config(&self) -> &IconConfig {
        &self.config
    }

    /// Returns the token of the current input state.
    pub fn current_token(&self) -> GenerationToken {
        GenerationToken(self.latest)
    }

    /// Returns the loaded source image, if any.
    pub fn source(&self) -> Option<&RasterImage> {
        self.source.as_ref().map(|source| source.image.as_ref())
    }

    /// Returns the current crop, if a source is loaded.
    pub fn crop(&self) -> Option<CropRegion> {
        self.crop
    }

    /// Returns the selected icon sizes.
    pub fn sizes(&self) -> &IconSizeSet {
        &self.sizes
    }

    /// Returns the base name used for downloads.
    pub fn base_name(&self) -> &str {
        match self.source {
            Some(ref source) => &source.base_name,
            None => "icon",
        }
    }

    /// Returns the files of the last accepted pass, if they are still
    /// current.
    pub fn published(&self) -> Option<&PublishedIcons> {
        self.published.as_ref()
    }

    /// Decodes and installs a new source image, with a centered crop.  If
    /// `mime` is given it must be an `image/*` type.  On failure the
    /// previous source stays loaded, but any published files are released.
    /// A non-image `mime` is rejected before anything is released.
    pub fn load_source(
        &mut self,
        file_name: &str,
        mime: Option<&str>,
        bytes: &[u8],
    ) -> Result<()> {
        if let Some(mime) = mime {
            if !is_image_mime(mime) {
                decode_error!("{:?} is not an image type", mime);
            }
        }
        self.invalidate();
        let image = decode_with_config(bytes, &self.config)?;
        let crop = CropRegion::centered(image.width(), image.height());
        info!(
            "Loaded {:?} ({}x{}), initial crop {:?}",
            file_name,
            image.width(),
            image.height(),
            crop
        );
        self.source = Some(LoadedSource {
            base_name: base_file_name(file_name),
            image: Arc::new(image),
        });
        self.crop = Some(crop);
        Ok(())
    }

    /// Changes the crop side, keeping the crop inside the source.
    pub fn set_crop_side(&mut self, side: u32) -> Result<CropRegion> {
        self.edit_crop(|crop, width, height| crop.with_side(side, width, height))
    }

    /// Moves the crop, keeping it inside the source.
    pub fn set_crop_offset(&mut self, x: u32, y: u32) -> Result<CropRegion> {
        self.edit_crop(|crop, width, height| {
            crop.with_offset(x, y, width, height)
        })
    }

    /// Centers the crop without changing its side.
    pub fn center_crop(&mut self) -> Result<CropRegion> {
        self.edit_crop(|crop, width, height| crop.recentered(width, height))
    }

    /// Selects or deselects one size.  Returns whether it is selected
    /// afterwards.
    pub fn toggle_size(&mut self, size: u32) -> Result<bool> {
        let selected = self.sizes.toggle(size)?;
        self.invalidate();
        Ok(selected)
    }

    /// Replaces the whole size selection.
    pub fn set_sizes(&mut self, sizes: IconSizeSet) {
        self.sizes = sizes;
        self.invalidate();
    }

    /// Snapshots the current inputs for a generation pass.  Any previously
    /// published files are released.
    pub fn begin_generation(&mut self) -> Result<GenerationRequest> {
        let (source, crop) = match (&self.source, self.crop) {
            (Some(source), Some(crop)) => (source, crop),
            _ => return Err(Error::MissingSource),
        };
        if self.sizes.is_empty() {
            return Err(Error::EmptySelection);
        }
        let request = GenerationRequest {
            token: GenerationToken(self.latest + 1),
            source: source.image.clone(),
            crop,
            sizes: self.sizes.clone(),
            base_name: source.base_name.clone(),
        };
        self.invalidate();
        debug!("Issued generation token {}", request.token.value());
        Ok(request)
    }

    /// Hands the result of a pass back to the session.  Results for any token
    /// other than the latest are dropped and `Ok(None)` is returned.
    /// Otherwise the files are published, or the pass's error is returned
    /// with nothing published.
    pub fn complete(
        &mut self,
        request: &GenerationRequest,
        result: Result<GeneratedIcons>,
    ) -> Result<Option<&PublishedIcons>> {
        if request.token != self.current_token() {
            warn!(
                "Discarding result of stale generation {} (latest is {})",
                request.token.value(),
                self.latest
            );
            return Ok(None);
        }
        let icons = result?;
        let published = PublishedIcons::publish(
            &self.store,
            request.token,
            &request.base_name,
            icons,
        )?;
        info!(
            "Published {} icon files for generation {}",
            published.per_size.len() + 1,
            request.token.value()
        );
        Ok(Some(&*self.published.insert(published)))
    }

    /// Runs a generation pass for the current inputs and publishes it.
    pub fn generate(&mut self) -> Result<&PublishedIcons> {
        let request = self.begin_generation()?;
        let icons = request.run(&self.config)?;
        let published = PublishedIcons::publish(
            &self.store,
            request.token,
            &request.base_name,
            icons,
        )?;
        Ok(&*self.published.insert(published))
    }

    /// Releases everything and returns to the initial state.
    pub fn reset(&mut self) {
        self.invalidate();
        self.source = None;
        self.crop = None;
        self.sizes = IconSizeSet::default_selection();
    }

    fn edit_crop<F>(&mut self, edit: F) -> Result<CropRegion>
    where
        F: FnOnce(CropRegion, u32, u32) -> CropRegion,
    {
        let (width, height) = match self.source {
            Some(ref source) => (source.image.width(), source.image.height()),
            None => return Err(Error::MissingSource),
        };
        let current =
            self.crop.unwrap_or_else(|| CropRegion::centered(width, height));
        let crop = edit(current, width, height);
        self.crop = Some(crop);
        self.invalidate();
        Ok(crop)
    }

    // Moves to a new token and releases the published files, which no
    // longer match the inputs.
    fn invalidate(&mut self) {
        self.latest += 1;
        if let Some(published) = self.published.take() {
            debug!(
                "Releasing files of generation {}",
                published.token.value()
            );
        }
    }
}

impl fmt::Debug for IconSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconSession")
            .field("source", &self.source())
            .field("crop", &self.crop)
            .field("sizes", &self.sizes)
            .field("latest", &self.latest)
            .field("published", &self.published)
            .finish()
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{BlobStore, IconSession, MemoryBlobStore};
    use crate::config::IconConfig;
    use crate::crop::CropRegion;
    use crate::error::Error;
    use crate::raster::RasterImage;
    use crate::sizes::IconSizeSet;
    use std::sync::Arc;

    fn session_with_source() -> (Arc<MemoryBlobStore>, IconSession) {
        let store = Arc::new(MemoryBlobStore::new());
        let mut session = IconSession::new(
            store.clone() as Arc<dyn BlobStore>,
            IconConfig::default(),
        );
        let png = RasterImage::filled(300, 200, [0, 128, 255, 255])
            .to_png()
            .unwrap();
        session.load_source("logo.png", Some("image/png"), &png).unwrap();
        (store, session)
    }

    #[test]
    fn load_source_sets_centered_crop() {
        let (_store, session) = session_with_source();
        assert_eq!(session.crop(), Some(CropRegion::new(50, 0, 200)));
        assert_eq!(session.base_name(), "logo");
    }

    #[test]
    fn load_source_rejects_non_image_mime() {
        let store = Arc::new(MemoryBlobStore::new());
        let mut session = IconSession::new(store, IconConfig::default());
        let result = session.load_source("notes.txt", Some("text/plain"), b"hi");
        assert!(matches!(result, Err(Error::Decode(_))));
        assert!(session.source().is_none());
    }

    #[test]
    fn non_image_mime_keeps_published_files() {
        let (store, mut session) = session_with_source();
        session.generate().unwrap();
        assert_eq!(store.live_count(), 7);
        let token = session.current_token();
        let result = session.load_source("notes.txt", Some("text/plain"), b"hi");
        assert!(matches!(result, Err(Error::Decode(_))));
        assert_eq!(session.current_token(), token);
        assert!(session.published().is_some());
        assert_eq!(store.live_count(), 7);
        assert_eq!(session.base_name(), "logo");
    }

    #[test]
    fn generation_requires_source_and_sizes() {
        let store = Arc::new(MemoryBlobStore::new());
        let mut session = IconSession::new(store, IconConfig::default());
        assert!(matches!(
            session.begin_generation(),
            Err(Error::MissingSource)
        ));
        let (_store, mut session) = session_with_source();
        session.set_sizes(IconSizeSet::new());
        assert!(matches!(
            session.begin_generation(),
            Err(Error::EmptySelection)
        ));
    }

    #[test]
    fn crop_edits_are_clamped() {
        let (_store, mut session) = session_with_source();
        assert_eq!(
            session.set_crop_offset(1000, 1000).unwrap(),
            CropRegion::new(100, 0, 200)
        );
        assert_eq!(
            session.set_crop_side(100).unwrap(),
            CropRegion::new(100, 0, 100)
        );
        assert_eq!(
            session.center_crop().unwrap(),
            CropRegion::new(100, 50, 100)
        );
    }

    #[test]
    fn generate_publishes_named_files() {
        let (store, mut session) = session_with_source();
        session.set_sizes(IconSizeSet::from_sizes(vec![32, 16]).unwrap());
        let published = session.generate().unwrap();
        let names: Vec<&str> = published
            .per_size()
            .iter()
            .map(|(_, handle)| handle.file_name())
            .collect();
        assert_eq!(names, vec!["logo-16x16.ico", "logo-32x32.ico"]);
        assert_eq!(published.bundle().file_name(), "logo.ico");
        let bundle_key = published.bundle().key().clone();
        assert_eq!(store.live_count(), 3);
        assert!(store.get(&bundle_key).is_some());
    }

    #[test]
    fn editing_inputs_releases_published_files() {
        let (store, mut session) = session_with_source();
        session.generate().unwrap();
        assert_eq!(store.live_count(), 7);
        session.toggle_size(16).unwrap();
        assert!(session.published().is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn stale_results_are_discarded() {
        let (store, mut session) = session_with_source();
        let first = session.begin_generation().unwrap();
        let second = session.begin_generation().unwrap();
        assert!(second.token() > first.token());
        let first_result = first.run(session.config());
        assert!(session.complete(&first, first_result).unwrap().is_none());
        assert_eq!(store.live_count(), 0);
        let second_result = second.run(session.config());
        assert!(session.complete(&second, second_result).unwrap().is_some());
        assert_eq!(store.live_count(), 7);
    }

    #[test]
    fn dropping_the_session_releases_everything() {
        let (store, mut session) = session_with_source();
        session.generate().unwrap();
        assert!(store.live_count() > 0);
        drop(session);
        assert_eq!(store.live_count(), 0);
    }
}

//===========================================================================//
