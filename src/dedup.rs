//! Drop message events that were already handled
//!
//! The gateway can deliver the same message more than once, and during a redeploy two bot
//! processes may briefly run side by side.  A short-lived in-process cache catches the former;
//! marker files created with `create_new` catch the latter.

use crate::log_warn;
use anyhow::{anyhow, Result};
use serenity::all::MessageId;
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    time::{Duration, Instant, SystemTime},
};

const MEMORY_TTL: Duration = Duration::from_secs(60);
const MARKER_TTL: Duration = Duration::from_secs(10 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct Dedup {
    recent: HashMap<MessageId, Instant>,
    marker_dir: Option<PathBuf>,
    memory_ttl: Duration,
    marker_ttl: Duration,
    last_sweep: Option<Instant>,
}

impl Dedup {
    /// In-process deduplication only.
    pub fn in_memory() -> Self {
        Self {
            recent: HashMap::new(),
            marker_dir: None,
            memory_ttl: MEMORY_TTL,
            marker_ttl: MARKER_TTL,
            last_sweep: None,
        }
    }

    /// Also deduplicate across processes sharing `dir`.
    pub async fn with_markers(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            anyhow!(
                "Could not create dedup directory `{}`: {}",
                dir.to_string_lossy(),
                e
            )
        })?;

        Ok(Self {
            marker_dir: Some(dir),
            ..Self::in_memory()
        })
    }

    /// True the first time `id` is seen by any instance.
    pub async fn first_sighting(&mut self, id: MessageId) -> bool {
        let now = Instant::now();
        let memory_ttl = self.memory_ttl;
        self.recent
            .retain(|_, seen| now.duration_since(*seen) < memory_ttl);

        if self.recent.contains_key(&id) {
            return false;
        }
        self.recent.insert(id, now);

        let Some(dir) = self.marker_dir.clone() else {
            return true;
        };
        self.sweep_markers(now).await;

        let marker = dir.join(id.to_string());
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&marker)
            .await
        {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
            Err(e) => {
                // Better to risk a double reply than to drop the message.
                log_warn!(
                    "Could not create dedup marker `{}`: {}",
                    marker.to_string_lossy(),
                    e
                );
                true
            }
        }
    }

    /// Remove marker files older than the marker TTL, at most once per sweep interval.
    async fn sweep_markers(&mut self, now: Instant) {
        if matches!(self.last_sweep, Some(last) if now.duration_since(last) < SWEEP_INTERVAL) {
            return;
        }
        self.last_sweep = Some(now);

        let Some(dir) = &self.marker_dir else {
            return;
        };
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let expired = entry
                .metadata()
                .await
                .and_then(|metadata| metadata.modified())
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok())
                .is_some_and(|age| age >= self.marker_ttl);

            if expired {
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
    }
}
