//! Web API
//!
//! JSON mirror of the dashboard, mounted under `/api`. Every endpoint
//! requires the session cookie.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::web::{self, Data, Json, Path, ServiceConfig};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::device::{self, ControlRequest};
use crate::error::{Error, Result};
use crate::model::{Camera, CameraPatch, GridLayout, NewCamera, SettingsPatch, Theme, MAX_CAMERAS};
use crate::model::{MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};
use crate::poller::StatusBoard;
use crate::session::ApiSession;
use crate::store::{SharedStore, Store};


/// Camera as returned by the API
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraResource {
    #[serde(flatten)]
    pub camera: Camera,
    pub locked: bool,
    pub online: Option<bool>,
}

impl CameraResource {
    fn new(store: &Store, board: &StatusBoard, camera: &Camera) -> Self {
        CameraResource {
            camera: camera.clone(),
            locked: store.is_locked(camera),
            online: board.get(&camera.id).online,
        }
    }
}


/// Dashboard settings as returned by the API
///
/// The privacy password hash never leaves the server.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResource {
    pub grid_layout: GridLayout,
    pub refresh_interval: u32,
    pub theme: Theme,
}


#[derive(Deserialize, Serialize)]
pub struct UnlockRequest {
    pub password: String,
}


#[derive(Deserialize, Serialize)]
pub struct OnlineResource {
    pub online: bool,
}


fn not_found(id: &str) -> Error {
    Error::Web(StatusCode::NOT_FOUND, format!("no camera with id {}", id))
}


fn find_camera(store: &Store, id: &str) -> Result<Camera> {
    store.camera(id)
        .cloned()
        .ok_or_else(|| not_found(id))
}


//#region CRUD for Cameras

async fn get_cameras(
    _session: ApiSession,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
) -> Json<Vec<CameraResource>>
{
    let store = store.read().await;

    let cameras = store.cameras()
        .iter()
        .map(|camera| CameraResource::new(&store, &board, camera))
        .collect();

    Json(cameras)
}

async fn post_camera(
    _session: ApiSession,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
    raw: Json<NewCamera>,
) -> Result<HttpResponse>
{
    let new = raw.into_inner().normalized();
    new.validate()
        .map_err(Error::with_status(StatusCode::BAD_REQUEST))?;

    let mut store = store.write().await;

    if store.cameras().len() >= MAX_CAMERAS {
        Err(Error::Web(
            StatusCode::CONFLICT,
            format!("at most {} cameras can be registered", MAX_CAMERAS),
        ))?;
    }

    let camera = store.add_camera(new);

    Ok(HttpResponse::Created()
        .json(CameraResource::new(&store, &board, &camera)))
}

async fn get_camera(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
) -> Result<Json<CameraResource>>
{
    let store = store.read().await;
    let camera = find_camera(&store, &path)?;

    Ok(Json(CameraResource::new(&store, &board, &camera)))
}

async fn patch_camera(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
    raw: Json<CameraPatch>,
) -> Result<Json<CameraResource>>
{
    let patch = raw.into_inner().normalized();
    patch.validate()
        .map_err(Error::with_status(StatusCode::BAD_REQUEST))?;

    let mut store = store.write().await;
    find_camera(&store, &path)?;

    store.update_camera(&path, patch);
    let camera = find_camera(&store, &path)?;

    Ok(Json(CameraResource::new(&store, &board, &camera)))
}

async fn delete_camera(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
) -> Result<HttpResponse>
{
    let mut store = store.write().await;
    find_camera(&store, &path)?;

    store.remove_camera(&path);

    Ok(HttpResponse::NoContent().finish())
}

//#endregion


//#region Privacy

async fn unlock_camera(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
    raw: Json<UnlockRequest>,
) -> Result<HttpResponse>
{
    let mut store = store.write().await;
    find_camera(&store, &path)?;

    if !store.unlock_camera(&path, &raw.password).await {
        Err((StatusCode::UNAUTHORIZED, "incorrect privacy password"))?;
    }

    Ok(HttpResponse::NoContent().finish())
}

async fn lock_cameras(
    _session: ApiSession,
    store: Data<SharedStore>,
) -> HttpResponse
{
    store.write().await.lock_all_cameras();

    HttpResponse::NoContent().finish()
}

//#endregion


//#region Device access

async fn get_snapshot(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
) -> Result<HttpResponse>
{
    {
        let store = store.read().await;
        let camera = find_camera(&store, &path)?;
        if store.is_locked(&camera) {
            Err((StatusCode::FORBIDDEN, "camera is locked"))?;
        }
    }

    let frame = board.frame(&path)
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, "no frame received yet"))?;

    Ok(HttpResponse::Ok()
        .content_type("image/jpeg")
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .body(frame))
}

async fn get_online(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
    client: Data<Client>,
) -> Result<Json<OnlineResource>>
{
    let camera = find_camera(&*store.read().await, &path)?;

    let online = device::check_online(&client, &camera).await;
    debug!("camera {} online check: {}", camera.id, online);

    Ok(Json(OnlineResource { online }))
}

async fn post_control(
    _session: ApiSession,
    path: Path<String>,
    store: Data<SharedStore>,
    client: Data<Client>,
    raw: Json<ControlRequest>,
) -> Result<HttpResponse>
{
    let request = raw.into_inner();
    request.validate()
        .map_err(Error::with_status(StatusCode::BAD_REQUEST))?;

    let camera = {
        let store = store.read().await;
        let camera = find_camera(&store, &path)?;
        if store.is_locked(&camera) {
            Err((StatusCode::FORBIDDEN, "camera is locked"))?;
        }
        camera
    };

    device::apply_controls(&client, &camera, &request).await
        .map_err(|err| {
            warn!("failed to send controls to camera {}: {}", camera.id, err);
            Error::Web(StatusCode::BAD_GATEWAY, "could not reach the camera".into())
        })?;

    Ok(HttpResponse::NoContent().finish())
}

//#endregion


//#region Settings

fn settings_resource(store: &Store) -> SettingsResource {
    let settings = store.settings();
    SettingsResource {
        grid_layout: settings.grid_layout,
        refresh_interval: settings.refresh_interval,
        theme: settings.theme,
    }
}

async fn get_settings(
    _session: ApiSession,
    store: Data<SharedStore>,
) -> Json<SettingsResource>
{
    Json(settings_resource(&*store.read().await))
}

async fn patch_settings(
    _session: ApiSession,
    store: Data<SharedStore>,
    raw: Json<SettingsPatch>,
) -> Result<Json<SettingsResource>>
{
    let patch = raw.into_inner();

    if let Some(secs) = patch.refresh_interval {
        if secs < MIN_REFRESH_INTERVAL || secs > MAX_REFRESH_INTERVAL {
            Err(Error::Web(
                StatusCode::BAD_REQUEST,
                format!("refreshInterval must be between {} and {}", MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL),
            ))?;
        }
    }

    let mut store = store.write().await;
    store.update_settings(patch);

    Ok(Json(settings_resource(&store)))
}

//#endregion


/// Configures an Actix service to serve the API
pub fn configure(service: &mut ServiceConfig) {

    service.service(
        web::resource("/cameras")
            .route(web::get().to(get_cameras))
            .route(web::post().to(post_camera))
    );

    // Must precede the `{id}` resource
    service.route("/cameras/lock", web::post().to(lock_cameras));

    service.service(
        web::resource("/cameras/{id}")
            .route(web::get().to(get_camera))
            .route(web::patch().to(patch_camera))
            .route(web::delete().to(delete_camera))
    );
    service.route("/cameras/{id}/unlock", web::post().to(unlock_camera));
    service.route("/cameras/{id}/snapshot", web::get().to(get_snapshot));
    service.route("/cameras/{id}/online", web::get().to(get_online));
    service.route("/cameras/{id}/control", web::post().to(post_control));

    service.service(
        web::resource("/settings")
            .route(web::get().to(get_settings))
            .route(web::patch().to(patch_settings))
    );
}
