//! Snapshot poller
//!
//! Each registered camera gets one tokio task that fetches a frame from its
//! snapshot endpoint every refresh interval. Results land on a shared
//! `StatusBoard`, which the dashboard and the snapshot API read from. The
//! most recent fetch decides whether a camera is online.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use actix_web::web::Data;
use bytes::Bytes;
use log::{debug, info, trace, warn};
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::{do_read, do_write};
use crate::camera_url;
use crate::device;
use crate::model::Camera;
use crate::store::SharedStore;


/// Latest known state of one dashboard tile
#[derive(Clone, Debug, Default)]
pub struct TileStatus {

    /// `None` until the first fetch completes
    pub online: Option<bool>,

    /// Increases with every new frame, for cache busting
    pub token: u64,

    pub frame: Option<Bytes>,
}


/// Shared map of camera id to tile status
#[derive(Clone, Default)]
pub struct StatusBoard {
    tiles: Arc<RwLock<HashMap<String, TileStatus>>>,
}

impl StatusBoard {

    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fresh frame and marks the camera online
    ///
    /// Returns true if the camera was not online before.
    pub fn record_frame(&self, id: &str, frame: Bytes) -> bool {

        let mut tiles = do_write!(self.tiles);
        let tile = tiles.entry(id.to_owned()).or_default();

        let changed = tile.online != Some(true);
        tile.online = Some(true);
        tile.token += 1;
        tile.frame = Some(frame);

        changed
    }

    /// Marks the camera offline, keeping its last frame
    ///
    /// Returns true if the camera was not offline before.
    pub fn record_failure(&self, id: &str) -> bool {

        let mut tiles = do_write!(self.tiles);
        let tile = tiles.entry(id.to_owned()).or_default();

        let changed = tile.online != Some(false);
        tile.online = Some(false);

        changed
    }

    /// Status of a camera, or the unknown status if it was never polled
    pub fn get(&self, id: &str) -> TileStatus {
        do_read!(self.tiles)
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Latest frame of a camera
    pub fn frame(&self, id: &str) -> Option<Bytes> {
        do_read!(self.tiles)
            .get(id)
            .and_then(|tile| tile.frame.clone())
    }

    pub fn remove(&self, id: &str) {
        do_write!(self.tiles).remove(id);
    }
}


/// Running poll task of one camera
///
/// The task is aborted when the handle is dropped.
struct PollHandle {
    url: String,
    period: Duration,
    task: JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}


/// Owns the poll tasks of all registered cameras
pub struct Poller {
    client: Client,
    board: StatusBoard,
    handles: HashMap<String, PollHandle>,
}

impl Poller {

    pub fn new(client: Client, board: StatusBoard) -> Self {
        Poller {
            client,
            board,
            handles: HashMap::new(),
        }
    }

    /// Number of running poll tasks
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Snapshot URL a camera is being polled at
    pub fn polled_url(&self, id: &str) -> Option<&str> {
        self.handles.get(id)
            .map(|handle| handle.url.as_str())
    }

    /// Reconciles running tasks with the camera registry
    ///
    /// Must be called from within a tokio runtime.
    pub fn sync(&mut self, cameras: &[Camera], refresh_secs: u32) {

        let period = Duration::from_secs(u64::from(refresh_secs.max(1)));

        let board = &self.board;
        self.handles.retain(|id, _| {
            let keep = cameras.iter().any(|camera| &camera.id == id);
            if !keep {
                debug!("stopped polling camera {}", id);
                board.remove(id);
            }
            keep
        });

        for camera in cameras {

            let url = camera_url::snapshot_url(&camera.stream_url);

            if let Some(handle) = self.handles.get(&camera.id) {
                if handle.url == url && handle.period == period {
                    continue;
                }
                debug!("restarting poll of camera {}", camera.id);
            } else {
                debug!("polling camera {} at {} every {}s", camera.id, url, refresh_secs);
            }

            let task = tokio::spawn(poll(
                self.client.clone(),
                self.board.clone(),
                camera.id.clone(),
                url.clone(),
                period,
            ));

            // Replacing the entry drops, and thereby aborts, any previous task
            self.handles.insert(camera.id.clone(), PollHandle { url, period, task });
        }
    }
}


/// Fetches frames from `url` until aborted
async fn poll(client: Client, board: StatusBoard, id: String, url: String, period: Duration) {

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match device::fetch_snapshot(&client, &url).await {
            Ok(frame) => {
                if board.record_frame(&id, frame) {
                    info!("camera {} is online", id);
                }
            },
            Err(err) => {
                if board.record_failure(&id) {
                    warn!("camera {} is offline: {}", id, err);
                } else {
                    trace!("camera {} still offline: {}", id, err);
                }
            },
        }
    }
}


/// Keeps `poller` in step with the store
///
/// The poller is reconciled right away and again after every store change.
pub fn supervise(store: Data<SharedStore>, mut poller: Poller) -> JoinHandle<()> {

    tokio::spawn(async move {

        let mut changes = store.read().await.subscribe();

        loop {
            {
                let store = store.read().await;
                poller.sync(store.cameras(), store.settings().refresh_interval);
            }

            if changes.changed().await.is_err() {
                break;
            }
        }

        debug!("store went away, stopping poller");
    })
}


#[cfg(test)]
mod tests {

    use chrono::Utc;

    use super::*;
    use crate::model::DeviceType;

    fn camera(id: &str, stream_url: &str) -> Camera {
        let now = Utc::now();
        Camera {
            id: id.into(),
            name: format!("Camera {}", id),
            stream_url: stream_url.into(),
            location: None,
            device_type: DeviceType::Esp32Cam,
            is_private: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn board_reports_transitions_only() {

        let board = StatusBoard::new();
        assert_eq!(board.get("a").online, None);

        assert!(board.record_failure("a"));
        assert!(!board.record_failure("a"));
        assert_eq!(board.get("a").online, Some(false));

        assert!(board.record_frame("a", Bytes::from_static(b"jpeg")));
        assert!(!board.record_frame("a", Bytes::from_static(b"jpeg2")));
        let tile = board.get("a");
        assert_eq!(tile.online, Some(true));
        assert_eq!(tile.token, 2);
        assert_eq!(tile.frame.unwrap(), Bytes::from_static(b"jpeg2"));
    }

    #[test]
    fn failure_keeps_last_frame() {

        let board = StatusBoard::new();
        board.record_frame("a", Bytes::from_static(b"jpeg"));
        board.record_failure("a");

        assert_eq!(board.frame("a").unwrap(), Bytes::from_static(b"jpeg"));
        assert_eq!(board.get("a").token, 1);

        board.remove("a");
        assert!(board.frame("a").is_none());
    }

    #[tokio::test]
    async fn sync_follows_registry() {

        let board = StatusBoard::new();
        let mut poller = Poller::new(device::client().unwrap(), board.clone());

        let mut cameras = vec![
            camera("a", "http://127.0.0.1:9/stream"),
            camera("b", "http://127.0.0.1:9/cam-b"),
        ];
        poller.sync(&cameras, 5);
        assert_eq!(poller.len(), 2);
        assert_eq!(poller.polled_url("a"), Some("http://127.0.0.1:9/capture"));
        assert_eq!(poller.polled_url("b"), Some("http://127.0.0.1:9/cam-b/capture"));

        cameras[0].stream_url = "http://127.0.0.1:9/other/stream".into();
        poller.sync(&cameras, 5);
        assert_eq!(poller.polled_url("a"), Some("http://127.0.0.1:9/other/capture"));

        board.record_failure("b");
        cameras.pop();
        poller.sync(&cameras, 5);
        assert_eq!(poller.len(), 1);
        assert!(poller.polled_url("b").is_none());
        assert_eq!(board.get("b").online, None);
    }

    #[tokio::test]
    async fn unreachable_camera_goes_offline() {

        let board = StatusBoard::new();
        let mut poller = Poller::new(device::client().unwrap(), board.clone());
        poller.sync(&[camera("a", "http://127.0.0.1:9")], 1);

        for _ in 0..50 {
            if board.get("a").online.is_some() {
                break;
            }
            time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(board.get("a").online, Some(false));
        assert!(board.frame("a").is_none());
    }
}
