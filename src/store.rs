//! Application store
//!
//! The store is the single source of truth for the session, the camera
//! registry and the dashboard settings. Its state is split in two slices:
//!
//! * `DurableState` is written to `SnapshotStorage` after every mutation and
//!   read back once when the store is hydrated.
//! * The set of unlocked cameras lives only in memory. A fresh store always
//!   starts with every private camera locked, so a privacy unlock never
//!   outlives the process that granted it.
//!
//! Actions never fail outward. Storage errors are logged and the in-memory
//! state stays authoritative. Hashing errors count as failed verification.
//!
//! Observers call `subscribe` to learn about changes. The revision counter
//! increases after every action that changed either slice.


use std::collections::HashSet;

use actix_web::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tokio::task;
use uuid::Uuid;

use crate::allow_err;
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::model::{self, Camera, CameraPatch, NewCamera, Settings, SettingsPatch, User};
use crate::password;
use crate::storage::SnapshotStorage;


/// Age after which a session is discarded
pub const SESSION_EXPIRY_MINUTES: i64 = 30;


/// Store shared between request handlers and the poller supervisor
pub type SharedStore = RwLock<Store>;


/// Hashes `plaintext` on the blocking pool
async fn hash_blocking(plaintext: &str) -> Result<String> {

    let plaintext = plaintext.to_owned();

    task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|err| Error::Web(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
}


/// Slice of the store that survives restarts
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurableState {
    pub is_authenticated: bool,
    pub current_user: Option<User>,
    pub cameras: Vec<Camera>,
    pub settings: Settings,
    pub session_created_at: Option<DateTime<Utc>>,
}

impl DurableState {

    /// State of a store that has never been written
    fn initial(auth: &AuthConfig) -> Self {

        // An empty digest never verifies, which leaves private cameras locked
        let privacy_password_hash = password::hash(&auth.default_privacy_password)
            .unwrap_or_else(|err| {
                error!("failed to hash default privacy password: {}", err);
                String::new()
            });

        DurableState {
            is_authenticated: false,
            current_user: None,
            cameras: Vec::new(),
            settings: Settings::new(privacy_password_hash),
            session_created_at: None,
        }
    }
}


/// Slice of the store that is reset on every start
#[derive(Debug, Default)]
struct VolatileState {
    unlocked: HashSet<String>,
}


pub struct Store {
    durable: DurableState,
    volatile: VolatileState,
    auth: AuthConfig,
    storage: Box<dyn SnapshotStorage>,
    revision: watch::Sender<u64>,
}

impl Store {

    /// Creates a store from whatever `storage` holds
    ///
    /// A missing or unreadable snapshot yields default state.
    pub fn hydrate(storage: Box<dyn SnapshotStorage>, auth: AuthConfig) -> Self {

        let durable = match storage.load() {
            Ok(Some(mut state)) => {
                debug!("hydrated store with {} cameras", state.cameras.len());
                let secs = state.settings.refresh_interval;
                state.settings.refresh_interval = model::clamp_refresh_interval(secs);
                if state.settings.refresh_interval != secs {
                    warn!("stored refresh interval {}s is out of range, using {}s", secs, state.settings.refresh_interval);
                }
                state
            },
            Ok(None) => {
                info!("no stored state found, starting with defaults");
                DurableState::initial(&auth)
            },
            Err(err) => {
                error!("failed to read stored state, starting with defaults: {}", err);
                DurableState::initial(&auth)
            },
        };

        let (revision, _) = watch::channel(0);

        Store {
            durable,
            volatile: VolatileState::default(),
            auth,
            storage,
            revision,
        }
    }

    /// Expires a stale session
    ///
    /// Runs once after hydration and again before every protected request.
    pub fn initialize(&mut self) {
        self.initialize_at(Utc::now());
    }

    /// `initialize`, evaluated as if the current time were `now`
    pub fn initialize_at(&mut self, now: DateTime<Utc>) {

        if !self.durable.is_authenticated {
            return;
        }

        if let Some(created) = self.durable.session_created_at {
            if now - created > Duration::minutes(SESSION_EXPIRY_MINUTES) {
                info!("session created at {} has expired", created);
                self.logout();
            }
        }
    }

    /// Signs in with the configured admin credentials
    ///
    /// On success a new user record and session timestamp replace any
    /// previous session. The password is hashed on the blocking pool.
    pub async fn login(&mut self, username: &str, plaintext: &str) -> bool {

        if username != self.auth.admin_username || plaintext != self.auth.admin_password {
            warn!("failed login attempt for user \"{}\"", username);
            return false;
        }

        let password_hash = match hash_blocking(plaintext).await {
            Ok(digest) => digest,
            Err(err) => {
                error!("refusing login, could not hash password: {}", err);
                return false;
            },
        };

        self.durable.is_authenticated = true;
        self.durable.current_user = Some(User {
            id: Uuid::new_v4().to_string(),
            username: username.to_owned(),
            password_hash,
        });
        self.durable.session_created_at = Some(Utc::now());

        info!("user \"{}\" signed in", username);
        self.commit();
        true
    }

    /// Ends the session and relocks every camera
    pub fn logout(&mut self) {

        if self.durable.is_authenticated {
            info!("signing out");
        }

        self.durable.is_authenticated = false;
        self.durable.current_user = None;
        self.durable.session_created_at = None;
        self.volatile.unlocked.clear();

        self.commit();
    }

    /// Checks `plaintext` against the privacy password
    ///
    /// The comparison runs on the blocking pool.
    pub async fn verify_privacy_password(&self, plaintext: &str) -> bool {

        let digest = self.durable.settings.privacy_password_hash.clone();
        let plaintext = plaintext.to_owned();

        task::spawn_blocking(move || password::verify(&plaintext, &digest))
            .await
            .unwrap_or_else(|err| {
                error!("privacy password check did not complete: {}", err);
                false
            })
    }

    /// Unlocks a private camera if `plaintext` is the privacy password
    ///
    /// The camera id is not checked against the registry.
    pub async fn unlock_camera(&mut self, camera_id: &str, plaintext: &str) -> bool {

        if !self.verify_privacy_password(plaintext).await {
            warn!("wrong privacy password for camera {}", camera_id);
            return false;
        }

        debug!("unlocked camera {}", camera_id);
        self.volatile.unlocked.insert(camera_id.to_owned());
        self.notify();
        true
    }

    /// Relocks every camera
    pub fn lock_all_cameras(&mut self) {

        debug!("locking all cameras");
        self.volatile.unlocked.clear();
        self.notify();
    }

    /// Registers a camera and returns it
    pub fn add_camera(&mut self, new: NewCamera) -> Camera {

        let now = Utc::now();
        let camera = Camera {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            stream_url: new.stream_url,
            location: new.location,
            device_type: new.device_type,
            is_private: new.is_private,
            created_at: now,
            updated_at: now,
        };

        info!("registered camera {} ({})", camera.id, camera.name);
        self.durable.cameras.push(camera.clone());
        self.commit();

        camera
    }

    /// Removes a camera, if registered
    pub fn remove_camera(&mut self, id: &str) {

        let before = self.durable.cameras.len();
        self.durable.cameras.retain(|camera| camera.id != id);

        if self.durable.cameras.len() == before {
            debug!("ignoring removal of unknown camera {}", id);
            return;
        }

        self.volatile.unlocked.remove(id);

        info!("removed camera {}", id);
        self.commit();
    }

    /// Merges `patch` into a camera, if registered
    pub fn update_camera(&mut self, id: &str, patch: CameraPatch) {

        let camera = match self.durable.cameras.iter_mut().find(|camera| camera.id == id) {
            Some(camera) => camera,
            None => {
                debug!("ignoring update of unknown camera {}", id);
                return;
            },
        };

        camera.apply(patch);
        camera.updated_at = Utc::now();

        debug!("updated camera {}", id);
        self.commit();
    }

    /// Merges `patch` into the dashboard settings
    pub fn update_settings(&mut self, patch: SettingsPatch) {

        self.durable.settings.apply(patch);

        debug!("updated settings");
        self.commit();
    }

    /// Replaces the privacy password and relocks every camera
    ///
    /// Returns false, leaving the old password in place, if hashing fails.
    pub async fn update_privacy_password(&mut self, plaintext: &str) -> bool {

        let digest = match hash_blocking(plaintext).await {
            Ok(digest) => digest,
            Err(err) => {
                error!("keeping old privacy password, could not hash new one: {}", err);
                return false;
            },
        };

        self.durable.settings.privacy_password_hash = digest;
        self.volatile.unlocked.clear();

        info!("privacy password changed, all cameras locked");
        self.commit();
        true
    }

    pub fn is_authenticated(&self) -> bool {
        self.durable.is_authenticated
    }

    pub fn current_user(&self) -> Option<&User> {
        self.durable.current_user.as_ref()
    }

    pub fn session_created_at(&self) -> Option<DateTime<Utc>> {
        self.durable.session_created_at
    }

    /// Registered cameras in display order
    pub fn cameras(&self) -> &[Camera] {
        &self.durable.cameras
    }

    pub fn camera(&self, id: &str) -> Option<&Camera> {
        self.durable.cameras.iter()
            .find(|camera| camera.id == id)
    }

    pub fn settings(&self) -> &Settings {
        &self.durable.settings
    }

    /// Whether the privacy gate of `camera_id` has been satisfied
    pub fn is_unlocked(&self, camera_id: &str) -> bool {
        self.volatile.unlocked.contains(camera_id)
    }

    /// Whether `camera` must be hidden behind the privacy gate
    pub fn is_locked(&self, camera: &Camera) -> bool {
        camera.is_private && !self.is_unlocked(&camera.id)
    }

    /// Number of cameras currently unlocked
    pub fn unlocked_count(&self) -> usize {
        self.volatile.unlocked.len()
    }

    /// Returns a receiver that observes every change to the store
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision number
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Persists the durable slice and notifies observers
    fn commit(&mut self) {
        allow_err!(self.storage.save(&self.durable), "failed to persist store state");
        self.notify();
    }

    /// Notifies observers of a change
    fn notify(&mut self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::{DeviceType, GridLayout};
    use crate::storage::MemoryStorage;

    fn store_with(storage: &MemoryStorage) -> Store {
        Store::hydrate(Box::new(storage.clone()), AuthConfig::default())
    }

    fn private_camera() -> NewCamera {
        NewCamera {
            name: "Nursery".into(),
            stream_url: "http://192.168.1.60/stream".into(),
            location: Some("Upstairs".into()),
            device_type: DeviceType::Esp32Cam,
            is_private: true,
        }
    }

    /// Storage whose every operation fails
    struct BrokenStorage;

    impl SnapshotStorage for BrokenStorage {
        fn load(&self) -> Result<Option<DurableState>> {
            Err(Error::Web(StatusCode::INTERNAL_SERVER_ERROR, "disk on fire".into()))
        }
        fn save(&self, _: &DurableState) -> Result<()> {
            Err(Error::Web(StatusCode::INTERNAL_SERVER_ERROR, "disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn login_with_configured_credentials() {

        let mut store = store_with(&MemoryStorage::new());

        assert!(store.login("admin", "admin123").await);
        assert!(store.is_authenticated());
        let user = store.current_user().unwrap();
        assert_eq!(user.username, "admin");
        assert!(password::verify("admin123", &user.password_hash));
        assert!(store.session_created_at().is_some());
    }

    #[tokio::test]
    async fn login_with_wrong_credentials_changes_nothing() {

        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        let revision = store.revision();

        assert!(!store.login("admin", "wrong").await);
        assert!(!store.login("root", "admin123").await);
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
        assert_eq!(store.revision(), revision);
        assert!(storage.raw().is_none());
    }

    #[tokio::test]
    async fn each_login_gets_a_fresh_user_id() {

        let mut store = store_with(&MemoryStorage::new());

        store.login("admin", "admin123").await;
        let first = store.current_user().unwrap().id.clone();
        store.login("admin", "admin123").await;

        assert_ne!(store.current_user().unwrap().id, first);
    }

    #[tokio::test]
    async fn logout_clears_session_and_is_idempotent() {

        let mut store = store_with(&MemoryStorage::new());
        store.login("admin", "admin123").await;

        store.logout();
        store.logout();

        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
        assert!(store.session_created_at().is_none());
    }

    #[tokio::test]
    async fn unlock_requires_privacy_password() {

        let mut store = store_with(&MemoryStorage::new());
        let camera = store.add_camera(private_camera());

        assert!(store.is_locked(&camera));
        assert!(!store.unlock_camera(&camera.id, "wrong").await);
        assert!(store.is_locked(&camera));

        assert!(store.unlock_camera(&camera.id, "privacy123").await);
        assert!(store.is_unlocked(&camera.id));
        assert!(!store.is_locked(&camera));
    }

    #[tokio::test]
    async fn unlock_accepts_unknown_camera_ids() {

        let mut store = store_with(&MemoryStorage::new());

        assert!(store.unlock_camera("no-such-camera", "privacy123").await);
        assert!(store.is_unlocked("no-such-camera"));
    }

    #[tokio::test]
    async fn logout_and_lock_all_relock_cameras() {

        let mut store = store_with(&MemoryStorage::new());
        store.login("admin", "admin123").await;
        let camera = store.add_camera(private_camera());

        store.unlock_camera(&camera.id, "privacy123").await;
        store.lock_all_cameras();
        assert!(store.is_locked(&camera));

        store.unlock_camera(&camera.id, "privacy123").await;
        store.logout();
        assert_eq!(store.unlocked_count(), 0);
    }

    #[tokio::test]
    async fn privacy_password_change_relocks_everything() {

        let mut store = store_with(&MemoryStorage::new());
        let first = store.add_camera(private_camera());
        let second = store.add_camera(private_camera());

        assert!(store.unlock_camera(&first.id, "privacy123").await);
        assert!(store.unlock_camera(&second.id, "privacy123").await);
        assert_eq!(store.unlocked_count(), 2);

        assert!(store.update_privacy_password("curtains-drawn").await);
        assert_eq!(store.unlocked_count(), 0);

        assert!(!store.unlock_camera(&first.id, "privacy123").await);
        assert!(store.unlock_camera(&first.id, "curtains-drawn").await);
    }

    #[tokio::test]
    async fn rehydrated_store_starts_locked() {

        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        store.login("admin", "admin123").await;
        let camera = store.add_camera(private_camera());
        assert!(store.unlock_camera(&camera.id, "privacy123").await);

        let reloaded = store_with(&storage);

        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.cameras(), store.cameras());
        assert_eq!(reloaded.settings(), store.settings());
        assert!(!reloaded.is_unlocked(&camera.id));
        assert_eq!(reloaded.unlocked_count(), 0);
        assert!(!storage.raw().unwrap().contains("unlocked"));
    }

    #[test]
    fn camera_add_update_remove() {

        let mut store = store_with(&MemoryStorage::new());
        let camera = store.add_camera(private_camera());
        assert_eq!(camera.created_at, camera.updated_at);
        assert_eq!(store.cameras().len(), 1);

        store.update_camera(&camera.id, CameraPatch {
            name: Some("Nursery (north)".into()),
            is_private: Some(false),
            ..Default::default()
        });
        let updated = store.camera(&camera.id).unwrap();
        assert_eq!(updated.name, "Nursery (north)");
        assert!(!updated.is_private);
        assert_eq!(updated.location.as_deref(), Some("Upstairs"));
        assert!(updated.updated_at >= camera.updated_at);

        store.remove_camera(&camera.id);
        assert!(store.camera(&camera.id).is_none());
        assert!(store.cameras().is_empty());
    }

    #[test]
    fn unknown_camera_ids_are_ignored() {

        let mut store = store_with(&MemoryStorage::new());
        store.add_camera(private_camera());
        let revision = store.revision();

        store.remove_camera("missing");
        store.update_camera("missing", CameraPatch { name: Some("Ghost".into()), ..Default::default() });

        assert_eq!(store.cameras().len(), 1);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn cameras_keep_insertion_order() {

        let mut store = store_with(&MemoryStorage::new());
        let names = ["Front", "Back", "Side"];
        for name in names.iter() {
            store.add_camera(NewCamera { name: name.to_string(), ..private_camera() });
        }

        let stored: Vec<&str> = store.cameras().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(stored, names);
    }

    #[tokio::test]
    async fn removing_a_camera_prunes_its_unlock() {

        let mut store = store_with(&MemoryStorage::new());
        let camera = store.add_camera(private_camera());
        store.unlock_camera(&camera.id, "privacy123").await;

        store.remove_camera(&camera.id);

        assert!(!store.is_unlocked(&camera.id));
    }

    #[test]
    fn out_of_range_stored_interval_is_clamped() {

        let storage = MemoryStorage::new();
        let mut state = DurableState::initial(&AuthConfig::default());
        state.settings.refresh_interval = 600;
        storage.save(&state).unwrap();

        assert_eq!(store_with(&storage).settings().refresh_interval, 60);

        state.settings.refresh_interval = 0;
        storage.save(&state).unwrap();

        assert_eq!(store_with(&storage).settings().refresh_interval, 1);
    }

    #[test]
    fn settings_updates_persist() {

        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);

        store.update_settings(SettingsPatch {
            grid_layout: Some(GridLayout::TwoByTwo),
            refresh_interval: Some(120),
            theme: None,
        });

        let reloaded = store_with(&storage);
        assert_eq!(reloaded.settings().grid_layout, GridLayout::TwoByTwo);
        assert_eq!(reloaded.settings().refresh_interval, 60);
    }

    fn stored_session(storage: &MemoryStorage, age: Duration) {

        let mut state = DurableState::initial(&AuthConfig::default());
        state.is_authenticated = true;
        state.current_user = Some(User {
            id: "operator".into(),
            username: "admin".into(),
            password_hash: String::new(),
        });
        state.session_created_at = Some(Utc::now() - age);
        storage.save(&state).unwrap();
    }

    #[test]
    fn stale_session_expires_on_initialize() {

        let storage = MemoryStorage::new();
        stored_session(&storage, Duration::minutes(31));

        let mut store = store_with(&storage);
        assert!(store.is_authenticated());
        store.initialize();

        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
    }

    #[test]
    fn recent_session_survives_initialize() {

        let storage = MemoryStorage::new();
        stored_session(&storage, Duration::minutes(10));

        let mut store = store_with(&storage);
        store.initialize();

        assert!(store.is_authenticated());
        assert_eq!(store.current_user().unwrap().id, "operator");
    }

    #[tokio::test]
    async fn session_expiry_boundary() {

        let mut store = store_with(&MemoryStorage::new());
        store.login("admin", "admin123").await;
        let created = store.session_created_at().unwrap();

        store.initialize_at(created + Duration::minutes(SESSION_EXPIRY_MINUTES));
        assert!(store.is_authenticated());

        store.initialize_at(created + Duration::minutes(SESSION_EXPIRY_MINUTES) + Duration::seconds(1));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn broken_storage_degrades_to_memory() {

        let mut store = Store::hydrate(Box::new(BrokenStorage), AuthConfig::default());

        assert!(!store.is_authenticated());
        assert!(store.login("admin", "admin123").await);
        let camera = store.add_camera(private_camera());
        assert!(store.unlock_camera(&camera.id, "privacy123").await);
        assert_eq!(store.cameras().len(), 1);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {

        let mut store = store_with(&MemoryStorage::new());
        let mut changes = store.subscribe();

        store.add_camera(private_camera());
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow_and_update(), 1);

        store.lock_all_cameras();
        assert!(changes.has_changed().unwrap());
    }
}
