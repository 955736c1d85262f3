//! In-memory drive source for transfer and coordinator tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::StreamExt;
use gdarchive_core::domain::Record;
use gdarchive_core::ports::{ByteStream, IDriveSource, RemoteError};
use md5::{Digest, Md5};
use tokio::sync::Semaphore;

pub(crate) fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

fn stream(data: &[u8]) -> ByteStream {
    // Two chunks so writers see more than one poll
    let split = data.len() / 2;
    let chunks = vec![
        Ok(Bytes::copy_from_slice(&data[..split])),
        Ok(Bytes::copy_from_slice(&data[split..])),
    ];
    futures_util::stream::iter(chunks).boxed()
}

/// Scripted source: content by id, queued failures by call key
///
/// Call keys are `download:<id>`, `export:<id>` and `link:<url>`.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    files: HashMap<String, Vec<u8>>,
    exports: HashMap<(String, String), Vec<u8>>,
    links: HashMap<String, Vec<u8>>,
    broken_streams: HashMap<String, Vec<u8>>,
    failures: Mutex<HashMap<String, VecDeque<RemoteError>>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, id: &str, content: &[u8]) -> Self {
        self.files.insert(id.to_string(), content.to_vec());
        self
    }

    pub fn with_export(mut self, id: &str, mime_type: &str, content: &[u8]) -> Self {
        self.exports
            .insert((id.to_string(), mime_type.to_string()), content.to_vec());
        self
    }

    pub fn with_link(mut self, url: &str, content: &[u8]) -> Self {
        self.links.insert(url.to_string(), content.to_vec());
        self
    }

    /// Download of `id` yields `prefix` and then a network error
    pub fn with_broken_stream(mut self, id: &str, prefix: &[u8]) -> Self {
        self.broken_streams.insert(id.to_string(), prefix.to_vec());
        self
    }

    /// Holds every download until `gate` has a permit
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Queues `error` for the next call with `key`
    pub fn fail(self, key: &str, error: RemoteError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(error);
        self
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == key).count()
    }

    fn begin(&self, key: String) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(key.clone());
        match self.failures.lock().unwrap().get_mut(&key).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::api(404, format!("File not found: {what}")).with_reason("notFound")
}

#[async_trait::async_trait]
impl IDriveSource for ScriptedSource {
    async fn root_id(&self) -> Result<String, RemoteError> {
        Ok("root".to_string())
    }

    async fn list_files(&self) -> Result<Vec<Record>, RemoteError> {
        Ok(Vec::new())
    }

    async fn download(&self, file_id: &str) -> Result<ByteStream, RemoteError> {
        self.begin(format!("download:{file_id}"))?;
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        if let Some(prefix) = self.broken_streams.get(file_id) {
            let chunks = vec![
                Ok(Bytes::copy_from_slice(prefix)),
                Err(RemoteError::Network("connection reset".to_string())),
            ];
            return Ok(futures_util::stream::iter(chunks).boxed());
        }
        self.files
            .get(file_id)
            .map(|data| stream(data))
            .ok_or_else(|| not_found(file_id))
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<ByteStream, RemoteError> {
        self.begin(format!("export:{file_id}"))?;
        self.exports
            .get(&(file_id.to_string(), mime_type.to_string()))
            .map(|data| stream(data))
            .ok_or_else(|| not_found(file_id))
    }

    async fn fetch_url(&self, url: &str) -> Result<ByteStream, RemoteError> {
        self.begin(format!("link:{url}"))?;
        self.links
            .get(url)
            .map(|data| stream(data))
            .ok_or_else(|| not_found(url))
    }
}
