//! User interface
//!
//! Server-rendered pages for the operator. Every form posts back to the
//! page that shows it. Failed submissions re-render the page with an inline
//! message, successful ones redirect with a `notice` query parameter.

use actix_web::{HttpRequest, HttpResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::web::{self, Data, Form, Path, Query, ServiceConfig};
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::camera_url;
use crate::device::{self, ControlRequest, FRAME_SIZES, QUALITY_PRESETS};
use crate::error::{Error, Result};
use crate::model::{
    Camera, CameraPatch, DeviceType, GridLayout, NewCamera, SettingsPatch, Theme, User,
    MAX_CAMERAS, MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL,
};
use crate::password;
use crate::poller::StatusBoard;
use crate::session::{self, PageSession};
use crate::store::{SharedStore, Store};
use crate::templates::Templates;


/// Bounds of the login user name, in characters
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;


/// Query carrying the key of a one-off notice
#[derive(Default, Deserialize)]
struct NoticeQuery {
    notice: Option<String>,
}

impl NoticeQuery {

    /// Text of the notice, if the key is known
    fn text(&self) -> Option<&'static str> {
        match self.notice.as_deref()? {
            "camera-added" => Some("Camera added."),
            "camera-updated" => Some("Camera updated."),
            "camera-removed" => Some("Camera removed."),
            "cameras-locked" => Some("All private cameras are locked."),
            "controls-applied" => Some("Resolution and quality sent to the camera."),
            "settings-saved" => Some("Display settings saved."),
            "privacy-changed" => Some("Privacy password changed. All private cameras are locked again."),
            "signed-out" => Some("You have been signed out."),
            _ => None,
        }
    }
}


/// Responds with a 303 redirect to `location`
fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}


/// Looks up a camera or fails with 404
fn find_camera(store: &Store, id: &str) -> Result<Camera> {
    store.camera(id)
        .cloned()
        .ok_or_else(|| Error::Web(StatusCode::NOT_FOUND, format!("no camera with id {}", id)))
}


/// Context shared by every page behind the login
fn page_context(user: &User, store: &Store, notice: &NoticeQuery) -> Context {

    let settings = store.settings();

    let mut context = Context::new();
    context.insert("user", &user.username);
    context.insert("theme", settings.theme.tag());
    context.insert("unlocked_count", &store.unlocked_count());
    context.insert("notice", &notice.text());
    context
}


/// Everything a template needs to draw one camera tile
#[derive(Serialize)]
struct Tile<'a> {
    camera: &'a Camera,
    stream_link: String,
    device: &'static str,
    locked: bool,
    online: Option<bool>,
    token: u64,
    has_frame: bool,
}

impl<'a> Tile<'a> {
    fn new(store: &Store, board: &StatusBoard, camera: &'a Camera) -> Self {
        let status = board.get(&camera.id);
        Tile {
            camera,
            stream_link: camera_url::stream_url(&camera.stream_url),
            device: camera.device_type.label(),
            locked: store.is_locked(camera),
            online: status.online,
            token: status.token,
            has_frame: status.frame.is_some(),
        }
    }
}


#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}


async fn index(req: HttpRequest) -> HttpResponse {
    match session::current_user(&req).await {
        Some(_) => see_other("/dashboard"),
        None => see_other(session::LOGIN_PATH),
    }
}


fn render_login(
    templates: &Templates,
    status: StatusCode,
    username: &str,
    error: Option<&str>,
    notice: Option<&str>,
) -> Result<HttpResponse> {

    let mut context = Context::new();
    context.insert("username", username);
    context.insert("error", &error);
    context.insert("notice", &notice);

    templates.response_with_status(status, "login.html", &context)
}


async fn login_page(
    req: HttpRequest,
    templates: Data<Templates>,
    query: Query<NoticeQuery>,
) -> Result<HttpResponse> {

    if session::current_user(&req).await.is_some() {
        return Ok(see_other("/dashboard"));
    }

    render_login(&templates, StatusCode::OK, "", None, query.text())
}


/// Checks the shape of the login form
fn validate_login(form: &LoginForm) -> std::result::Result<(), String> {

    let username_len = form.username.chars().count();
    if username_len < MIN_USERNAME_LENGTH {
        return Err(format!("Username must be at least {} characters long", MIN_USERNAME_LENGTH));
    }
    if username_len > MAX_USERNAME_LENGTH {
        return Err(format!("Username is too long (max {} characters)", MAX_USERNAME_LENGTH));
    }

    password::validate(&form.password)
        .map_err(|issue| issue.to_string())
}


async fn login(
    store: Data<SharedStore>,
    templates: Data<Templates>,
    form: Form<LoginForm>,
) -> Result<HttpResponse> {

    if let Err(msg) = validate_login(&form) {
        return render_login(&templates, StatusCode::BAD_REQUEST, &form.username, Some(&msg), None);
    }

    let mut store = store.write().await;

    if !store.login(&form.username, &form.password).await {
        return render_login(
            &templates,
            StatusCode::UNAUTHORIZED,
            &form.username,
            Some("Invalid username or password"),
            None,
        );
    }

    let user = store.current_user()
        .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "session was not created"))?;

    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, "/dashboard"))
        .cookie(session::session_cookie(user))
        .finish())
}


async fn logout(_session: PageSession, store: Data<SharedStore>) -> HttpResponse {

    store.write().await.logout();

    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/login?notice=signed-out"))
        .cookie(session::removal_cookie())
        .finish()
}


async fn dashboard(
    session: PageSession,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
    templates: Data<Templates>,
    query: Query<NoticeQuery>,
) -> Result<HttpResponse> {

    let store = store.read().await;
    let cameras = store.cameras();
    let settings = store.settings();

    let tiles: Vec<Tile> = cameras.iter()
        .take(MAX_CAMERAS)
        .map(|camera| Tile::new(&store, &board, camera))
        .collect();

    let mut context = page_context(&session.0, &store, &query);
    context.insert("tiles", &tiles);
    context.insert("hidden_count", &cameras.len().saturating_sub(MAX_CAMERAS));
    context.insert("grid_class", settings.grid_layout.css_class());
    context.insert("refresh_interval", &settings.refresh_interval);

    templates.response("dashboard.html", &context)
}


async fn lock_all(_session: PageSession, store: Data<SharedStore>) -> HttpResponse {
    store.write().await.lock_all_cameras();
    see_other("/dashboard?notice=cameras-locked")
}


/// Fields of the add and edit camera forms
#[derive(Default, Deserialize, Serialize)]
struct CameraForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    stream_url: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    device_type: DeviceType,
    is_private: Option<String>,
}

impl CameraForm {

    fn from_camera(camera: &Camera) -> Self {
        CameraForm {
            name: camera.name.clone(),
            stream_url: camera.stream_url.clone(),
            location: camera.location.clone().unwrap_or_default(),
            device_type: camera.device_type,
            is_private: if camera.is_private { Some("on".into()) } else { None },
        }
    }

    fn to_new_camera(&self) -> NewCamera {
        NewCamera {
            name: self.name.clone(),
            stream_url: self.stream_url.clone(),
            location: Some(self.location.clone()),
            device_type: self.device_type,
            is_private: self.is_private.is_some(),
        }.normalized()
    }

    fn to_patch(&self) -> CameraPatch {
        CameraPatch {
            name: Some(self.name.clone()),
            stream_url: Some(self.stream_url.clone()),
            location: Some(Some(self.location.clone())),
            device_type: Some(self.device_type),
            is_private: Some(self.is_private.is_some()),
        }.normalized()
    }
}


/// Device types as offered by the camera forms
#[derive(Serialize)]
struct DeviceOption {
    tag: &'static str,
    label: &'static str,
}

fn device_options() -> Vec<DeviceOption> {
    DeviceType::ALL.iter()
        .map(|device| DeviceOption { tag: device.tag(), label: device.label() })
        .collect()
}


/// Registry counters shown above the camera list
#[derive(Serialize)]
struct RegistryStats {
    total: usize,
    public: usize,
    private: usize,
    online: usize,
    remaining: usize,
}

impl RegistryStats {
    fn new(cameras: &[Camera], board: &StatusBoard) -> Self {
        let private = cameras.iter().filter(|camera| camera.is_private).count();
        RegistryStats {
            total: cameras.len(),
            public: cameras.len() - private,
            private,
            online: cameras.iter()
                .filter(|camera| board.get(&camera.id).online == Some(true))
                .count(),
            remaining: MAX_CAMERAS.saturating_sub(cameras.len()),
        }
    }
}


struct FormState<'a> {
    status: StatusCode,
    form: &'a CameraForm,
    error: Option<&'a str>,
}


fn render_registry(
    templates: &Templates,
    user: &User,
    store: &Store,
    board: &StatusBoard,
    notice: &NoticeQuery,
    state: FormState,
) -> Result<HttpResponse> {

    let cameras = store.cameras();
    let tiles: Vec<Tile> = cameras.iter()
        .map(|camera| Tile::new(store, board, camera))
        .collect();

    let mut context = page_context(user, store, notice);
    context.insert("tiles", &tiles);
    context.insert("stats", &RegistryStats::new(cameras, board));
    context.insert("max_cameras", &MAX_CAMERAS);
    context.insert("device_types", &device_options());
    context.insert("form", state.form);
    context.insert("error", &state.error);

    templates.response_with_status(state.status, "cameras.html", &context)
}


async fn registry(
    session: PageSession,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
    templates: Data<Templates>,
    query: Query<NoticeQuery>,
) -> Result<HttpResponse> {

    let store = store.read().await;
    let form = CameraForm::default();

    render_registry(&templates, &session.0, &store, &board, &query, FormState {
        status: StatusCode::OK,
        form: &form,
        error: None,
    })
}


async fn add_camera(
    session: PageSession,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
    templates: Data<Templates>,
    form: Form<CameraForm>,
) -> Result<HttpResponse> {

    let mut store = store.write().await;
    let new = form.to_new_camera();

    let rejection = if store.cameras().len() >= MAX_CAMERAS {
        Some(format!("At most {} cameras can be registered", MAX_CAMERAS))
    } else {
        new.validate().err()
    };

    if let Some(msg) = rejection {
        debug!("rejecting new camera: {}", msg);
        return render_registry(&templates, &session.0, &store, &board, &NoticeQuery::default(), FormState {
            status: StatusCode::BAD_REQUEST,
            form: &form,
            error: Some(&msg),
        });
    }

    store.add_camera(new);

    Ok(see_other("/dashboard/cameras?notice=camera-added"))
}


async fn view_camera(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    board: Data<StatusBoard>,
    templates: Data<Templates>,
    query: Query<NoticeQuery>,
) -> Result<HttpResponse> {

    let id = path.into_inner();
    let store = store.read().await;
    let camera = find_camera(&store, &id)?;

    if store.is_locked(&camera) {
        return Ok(see_other(&format!("/dashboard/cameras/{}/unlock", id)));
    }

    let mut context = page_context(&session.0, &store, &query);
    context.insert("tile", &Tile::new(&store, &board, &camera));
    context.insert("refresh_interval", &store.settings().refresh_interval);

    templates.response("camera.html", &context)
}


fn render_edit(
    templates: &Templates,
    user: &User,
    store: &Store,
    camera: &Camera,
    state: FormState,
) -> Result<HttpResponse> {

    let mut context = page_context(user, store, &NoticeQuery::default());
    context.insert("camera", camera);
    context.insert("device_types", &device_options());
    context.insert("form", state.form);
    context.insert("error", &state.error);

    templates.response_with_status(state.status, "camera_edit.html", &context)
}


async fn edit_camera_page(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    templates: Data<Templates>,
) -> Result<HttpResponse> {

    let store = store.read().await;
    let camera = find_camera(&store, &path)?;
    let form = CameraForm::from_camera(&camera);

    render_edit(&templates, &session.0, &store, &camera, FormState {
        status: StatusCode::OK,
        form: &form,
        error: None,
    })
}


async fn edit_camera(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    templates: Data<Templates>,
    form: Form<CameraForm>,
) -> Result<HttpResponse> {

    let mut store = store.write().await;
    let camera = find_camera(&store, &path)?;
    let patch = form.to_patch();

    if let Err(msg) = patch.validate() {
        return render_edit(&templates, &session.0, &store, &camera, FormState {
            status: StatusCode::BAD_REQUEST,
            form: &form,
            error: Some(&msg),
        });
    }

    store.update_camera(&camera.id, patch);

    Ok(see_other("/dashboard/cameras?notice=camera-updated"))
}


async fn delete_camera(
    _session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
) -> HttpResponse {

    store.write().await.remove_camera(&path);
    see_other("/dashboard/cameras?notice=camera-removed")
}


#[derive(Deserialize)]
struct UnlockForm {
    password: String,
}


fn render_unlock(
    templates: &Templates,
    user: &User,
    store: &Store,
    camera: &Camera,
    status: StatusCode,
    error: Option<&str>,
) -> Result<HttpResponse> {

    let mut context = page_context(user, store, &NoticeQuery::default());
    context.insert("camera", camera);
    context.insert("error", &error);

    templates.response_with_status(status, "unlock.html", &context)
}


async fn unlock_page(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    templates: Data<Templates>,
) -> Result<HttpResponse> {

    let store = store.read().await;
    let camera = find_camera(&store, &path)?;

    if !store.is_locked(&camera) {
        return Ok(see_other(&format!("/dashboard/cameras/{}", camera.id)));
    }

    render_unlock(&templates, &session.0, &store, &camera, StatusCode::OK, None)
}


async fn unlock(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    templates: Data<Templates>,
    form: Form<UnlockForm>,
) -> Result<HttpResponse> {

    let mut store = store.write().await;
    let camera = find_camera(&store, &path)?;

    if form.password.is_empty() {
        return render_unlock(
            &templates, &session.0, &store, &camera,
            StatusCode::BAD_REQUEST, Some("Enter the privacy password"),
        );
    }

    if !store.unlock_camera(&camera.id, &form.password).await {
        return render_unlock(
            &templates, &session.0, &store, &camera,
            StatusCode::UNAUTHORIZED, Some("Incorrect privacy password"),
        );
    }

    Ok(see_other(&format!("/dashboard/cameras/{}", camera.id)))
}


fn render_control(
    templates: &Templates,
    user: &User,
    store: &Store,
    camera: &Camera,
    request: &ControlRequest,
    status: StatusCode,
    error: Option<&str>,
) -> Result<HttpResponse> {

    let mut context = page_context(user, store, &NoticeQuery::default());
    context.insert("camera", camera);
    context.insert("frame_sizes", &FRAME_SIZES[..]);
    context.insert("quality_presets", &QUALITY_PRESETS[..]);
    context.insert("request", request);
    context.insert("error", &error);

    templates.response_with_status(status, "control.html", &context)
}


async fn control_page(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    templates: Data<Templates>,
) -> Result<HttpResponse> {

    let store = store.read().await;
    let camera = find_camera(&store, &path)?;

    if store.is_locked(&camera) {
        return Ok(see_other(&format!("/dashboard/cameras/{}/unlock", camera.id)));
    }

    render_control(
        &templates, &session.0, &store, &camera,
        &ControlRequest::default(), StatusCode::OK, None,
    )
}


async fn control(
    session: PageSession,
    path: Path<String>,
    store: Data<SharedStore>,
    client: Data<Client>,
    templates: Data<Templates>,
    form: Form<ControlRequest>,
) -> Result<HttpResponse> {

    let request = form.into_inner();

    let (camera, locked) = {
        let store = store.read().await;
        let camera = find_camera(&store, &path)?;
        let locked = store.is_locked(&camera);
        (camera, locked)
    };

    if locked {
        return Ok(see_other(&format!("/dashboard/cameras/{}/unlock", camera.id)));
    }

    let failure = match request.validate() {
        Err(msg) => Some((StatusCode::BAD_REQUEST, msg)),
        // The store lock is not held while waiting on the camera
        Ok(()) => match device::apply_controls(&client, &camera, &request).await {
            Ok(()) => None,
            Err(err) => {
                warn!("failed to send controls to camera {}: {}", camera.id, err);
                Some((
                    StatusCode::BAD_GATEWAY,
                    "Could not reach the camera. Check that it is online and supports HTTP controls.".to_owned(),
                ))
            },
        },
    };

    if let Some((status, msg)) = failure {
        let store = store.read().await;
        return render_control(&templates, &session.0, &store, &camera, &request, status, Some(&msg));
    }

    Ok(see_other("/dashboard?notice=controls-applied"))
}


/// Option of a settings select box
#[derive(Serialize)]
struct Choice {
    tag: &'static str,
    selected: bool,
}


#[derive(Default, Deserialize)]
struct DisplayForm {
    grid_layout: Option<GridLayout>,
    #[serde(default)]
    refresh_interval: String,
    theme: Option<Theme>,
}


#[derive(Default, Deserialize)]
struct PrivacyForm {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    confirm_password: String,
}


/// Inline messages of the two settings forms
#[derive(Default)]
struct SettingsErrors<'a> {
    display: Option<&'a str>,
    privacy: Option<&'a str>,
}


fn render_settings(
    templates: &Templates,
    user: &User,
    store: &Store,
    notice: &NoticeQuery,
    status: StatusCode,
    errors: SettingsErrors,
) -> Result<HttpResponse> {

    let settings = store.settings();

    let layouts: Vec<Choice> = GridLayout::ALL.iter()
        .map(|layout| Choice { tag: layout.tag(), selected: *layout == settings.grid_layout })
        .collect();
    let themes: Vec<Choice> = Theme::ALL.iter()
        .map(|theme| Choice { tag: theme.tag(), selected: *theme == settings.theme })
        .collect();

    let mut context = page_context(user, store, notice);
    context.insert("layouts", &layouts);
    context.insert("themes", &themes);
    context.insert("refresh_interval", &settings.refresh_interval);
    context.insert("min_refresh", &MIN_REFRESH_INTERVAL);
    context.insert("max_refresh", &MAX_REFRESH_INTERVAL);
    context.insert("min_privacy_length", &password::MIN_PRIVACY_PASSWORD_LENGTH);
    context.insert("display_error", &errors.display);
    context.insert("privacy_error", &errors.privacy);

    templates.response_with_status(status, "settings.html", &context)
}


async fn settings_page(
    session: PageSession,
    store: Data<SharedStore>,
    templates: Data<Templates>,
    query: Query<NoticeQuery>,
) -> Result<HttpResponse> {

    let store = store.read().await;

    render_settings(&templates, &session.0, &store, &query, StatusCode::OK, SettingsErrors::default())
}


/// Parses a refresh interval typed into the settings form
fn parse_refresh_interval(raw: &str) -> std::result::Result<u32, String> {

    let msg = || format!(
        "Refresh interval must be a whole number of seconds between {} and {}",
        MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL,
    );

    let secs: u32 = raw.trim().parse().map_err(|_| msg())?;
    if secs < MIN_REFRESH_INTERVAL || secs > MAX_REFRESH_INTERVAL {
        return Err(msg());
    }

    Ok(secs)
}


async fn save_display(
    session: PageSession,
    store: Data<SharedStore>,
    templates: Data<Templates>,
    form: Form<DisplayForm>,
) -> Result<HttpResponse> {

    let mut store = store.write().await;

    let refresh_interval = match parse_refresh_interval(&form.refresh_interval) {
        Ok(secs) => secs,
        Err(msg) => return render_settings(
            &templates, &session.0, &store, &NoticeQuery::default(),
            StatusCode::BAD_REQUEST,
            SettingsErrors { display: Some(&msg), ..Default::default() },
        ),
    };

    store.update_settings(SettingsPatch {
        grid_layout: form.grid_layout,
        refresh_interval: Some(refresh_interval),
        theme: form.theme,
    });

    Ok(see_other("/dashboard/settings?notice=settings-saved"))
}


/// Checks a privacy password change, short of verifying the current password
fn validate_privacy_change(form: &PrivacyForm) -> std::result::Result<(), String> {

    if form.current_password.is_empty() || form.new_password.is_empty() || form.confirm_password.is_empty() {
        return Err("Please fill in every field".into());
    }

    if form.new_password != form.confirm_password {
        return Err("The new password and its confirmation do not match".into());
    }

    password::validate_privacy(&form.new_password)
        .map_err(|issue| issue.to_string())
}


async fn change_privacy_password(
    session: PageSession,
    store: Data<SharedStore>,
    templates: Data<Templates>,
    form: Form<PrivacyForm>,
) -> Result<HttpResponse> {

    let mut store = store.write().await;

    let rejection = match validate_privacy_change(&form) {
        Err(msg) => Some((StatusCode::BAD_REQUEST, msg)),
        Ok(()) => {
            if store.verify_privacy_password(&form.current_password).await {
                None
            } else {
                Some((StatusCode::UNAUTHORIZED, "The current password is incorrect".to_owned()))
            }
        },
    };

    if let Some((status, msg)) = rejection {
        return render_settings(
            &templates, &session.0, &store, &NoticeQuery::default(), status,
            SettingsErrors { privacy: Some(&msg), ..Default::default() },
        );
    }

    if !store.update_privacy_password(&form.new_password).await {
        return render_settings(
            &templates, &session.0, &store, &NoticeQuery::default(),
            StatusCode::INTERNAL_SERVER_ERROR,
            SettingsErrors { privacy: Some("The password could not be changed. Please try again."), ..Default::default() },
        );
    }

    Ok(see_other("/dashboard/settings?notice=privacy-changed"))
}


/// Configures an Actix service to serve the UI
pub fn configure(service: &mut ServiceConfig) {

    service.route("/", web::get().to(index));

    service.service(
        web::resource("/login")
            .route(web::get().to(login_page))
            .route(web::post().to(login))
    );
    service.route("/logout", web::post().to(logout));

    service.route("/dashboard", web::get().to(dashboard));
    service.route("/dashboard/lock", web::post().to(lock_all));

    service.service(
        web::resource("/dashboard/cameras")
            .route(web::get().to(registry))
            .route(web::post().to(add_camera))
    );
    service.route("/dashboard/cameras/{id}", web::get().to(view_camera));
    service.service(
        web::resource("/dashboard/cameras/{id}/edit")
            .route(web::get().to(edit_camera_page))
            .route(web::post().to(edit_camera))
    );
    service.route("/dashboard/cameras/{id}/delete", web::post().to(delete_camera));
    service.service(
        web::resource("/dashboard/cameras/{id}/unlock")
            .route(web::get().to(unlock_page))
            .route(web::post().to(unlock))
    );
    service.service(
        web::resource("/dashboard/cameras/{id}/control")
            .route(web::get().to(control_page))
            .route(web::post().to(control))
    );

    service.service(
        web::resource("/dashboard/settings")
            .route(web::get().to(settings_page))
            .route(web::post().to(save_display))
    );
    service.route("/dashboard/settings/privacy", web::post().to(change_privacy_password));
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn refresh_interval_parsing() {
        assert_eq!(parse_refresh_interval("5"), Ok(5));
        assert_eq!(parse_refresh_interval(" 60 "), Ok(60));
        assert!(parse_refresh_interval("0").is_err());
        assert!(parse_refresh_interval("61").is_err());
        assert!(parse_refresh_interval("fast").is_err());
    }

    #[test]
    fn privacy_change_rules() {

        let form = |current: &str, new: &str, confirm: &str| PrivacyForm {
            current_password: current.into(),
            new_password: new.into(),
            confirm_password: confirm.into(),
        };

        assert!(validate_privacy_change(&form("", "secret1", "secret1")).is_err());
        assert!(validate_privacy_change(&form("old", "secret1", "secret2")).is_err());
        assert!(validate_privacy_change(&form("old", "short", "short")).is_err());
        assert!(validate_privacy_change(&form("old", "secret1", "secret1")).is_ok());
    }

    #[test]
    fn login_form_rules() {

        let form = |username: &str, password: &str| LoginForm {
            username: username.into(),
            password: password.into(),
        };

        assert!(validate_login(&form("ad", "admin123")).is_err());
        assert!(validate_login(&form("admin", "abc")).is_err());
        assert!(validate_login(&form("admin", "admin123")).is_ok());
        assert!(validate_login(&form("  a  ", "admin123")).is_ok());
    }

    #[test]
    fn tile_links_to_normalized_stream() {

        let mut store = Store::hydrate(
            Box::new(crate::storage::MemoryStorage::new()),
            crate::config::AuthConfig::default(),
        );
        let camera = store.add_camera(NewCamera {
            name: "Porch".into(),
            stream_url: "192.168.1.5/stream".into(),
            ..Default::default()
        });

        let tile = Tile::new(&store, &StatusBoard::new(), &camera);

        assert_eq!(tile.stream_link, "http://192.168.1.5/stream");
        assert!(!tile.locked);
    }

    #[test]
    fn unknown_notices_are_dropped() {
        let known = NoticeQuery { notice: Some("camera-added".into()) };
        let unknown = NoticeQuery { notice: Some("<script>".into()) };
        assert_eq!(known.text(), Some("Camera added."));
        assert_eq!(unknown.text(), None);
        assert_eq!(NoticeQuery::default().text(), None);
    }

    #[test]
    fn camera_form_conversion() {

        let form = CameraForm {
            name: " Porch ".into(),
            stream_url: "192.168.1.40".into(),
            location: "  ".into(),
            device_type: DeviceType::Ameba,
            is_private: Some("on".into()),
        };

        let new = form.to_new_camera();
        assert_eq!(new.name, "Porch");
        assert_eq!(new.location, None);
        assert!(new.is_private);

        let patch = form.to_patch();
        assert_eq!(patch.location, Some(None));
        assert_eq!(patch.device_type, Some(DeviceType::Ameba));
    }
}
