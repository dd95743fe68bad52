//! In-process stand-ins for the external services, for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

use super::{AssetStore, ImageSynthesizer, SynthesisError, UploadError};

pub(crate) const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Returns fixed bytes; can fail on a chosen call or wait on a gate first.
#[derive(Default)]
pub(crate) struct FakeSynthesizer {
    pub(crate) calls: AtomicUsize,
    pub(crate) fail_on_call: Option<usize>,
    pub(crate) gate: Option<Arc<Notify>>,
}

impl FakeSynthesizer {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _prompt: &str) -> Result<Vec<u8>, SynthesisError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_on_call == Some(call) {
            return Err(SynthesisError::Unavailable("503 from fake".to_string()));
        }
        Ok(IMAGE.to_vec())
    }
}

/// Accepts every upload unless told to fail.
#[derive(Default)]
pub(crate) struct FakeAssets {
    pub(crate) fail: bool,
    pub(crate) uploads: AtomicUsize,
}

impl FakeAssets {
    pub(crate) fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn upload(
        &self,
        owner_id: &str,
        item_id: &Uuid,
        _bytes: &[u8],
    ) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Io(std::io::Error::other("disk full")));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("http://localhost/images/{owner_id}/{item_id}.png"))
    }
}
