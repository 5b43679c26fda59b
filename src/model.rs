//! Cameras, dashboard settings and users

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::camera_url;


/// Maximum number of cameras shown on the dashboard
pub const MAX_CAMERAS: usize = 20;

/// Minimum length of a camera name
pub const MIN_CAMERA_NAME_LENGTH: usize = 3;

/// Default number of seconds between snapshot refreshes
pub const DEFAULT_REFRESH_INTERVAL: u32 = 5;

/// Bounds of the refresh interval, in seconds
pub const MIN_REFRESH_INTERVAL: u32 = 1;
pub const MAX_REFRESH_INTERVAL: u32 = 60;


/// Kind of device behind a camera URL
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DeviceType {
    #[serde(rename = "ESP32-CAM")]
    Esp32Cam,
    #[serde(rename = "AMEBA")]
    Ameba,
    #[serde(rename = "OTHER")]
    Other,
}

impl DeviceType {

    /// All device types, in the order offered by forms
    pub const ALL: [DeviceType; 3] = [DeviceType::Esp32Cam, DeviceType::Ameba, DeviceType::Other];

    /// Serialized tag of this device type
    pub fn tag(self) -> &'static str {
        match self {
            DeviceType::Esp32Cam => "ESP32-CAM",
            DeviceType::Ameba => "AMEBA",
            DeviceType::Other => "OTHER",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            DeviceType::Esp32Cam => "ESP32-CAM",
            DeviceType::Ameba => "AMEBA",
            DeviceType::Other => "Other",
        }
    }
}

impl Default for DeviceType {
    fn default() -> Self {
        DeviceType::Esp32Cam
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}


/// A registered network camera
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: String,
    pub name: String,
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub device_type: DeviceType,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Camera {

    /// Merges the fields present in `patch` into this camera
    ///
    /// Returns whether anything was supplied. The caller owns `updated_at`.
    pub fn apply(&mut self, patch: CameraPatch) -> bool {

        let mut touched = false;

        if let Some(name) = patch.name {
            self.name = name;
            touched = true;
        }

        if let Some(stream_url) = patch.stream_url {
            self.stream_url = stream_url;
            touched = true;
        }

        if let Some(location) = patch.location {
            self.location = location;
            touched = true;
        }

        if let Some(device_type) = patch.device_type {
            self.device_type = device_type;
            touched = true;
        }

        if let Some(is_private) = patch.is_private {
            self.is_private = is_private;
            touched = true;
        }

        touched
    }
}


/// Fields supplied when registering a camera
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCamera {
    pub name: String,
    pub stream_url: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub is_private: bool,
}


impl NewCamera {

    /// Trims text fields and turns a blank location into `None`
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_owned();
        self.stream_url = self.stream_url.trim().to_owned();
        self.location = normalize_location(self.location);
        self
    }

    /// Checks the name and URL, returning a message suitable for the form
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        camera_url::validate(&self.stream_url)
            .map_err(|err| err.to_string())
    }
}


/// Partial update of a camera
///
/// `location` is doubly optional so that a patch can clear it.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPatch {
    pub name: Option<String>,
    pub stream_url: Option<String>,
    pub location: Option<Option<String>>,
    pub device_type: Option<DeviceType>,
    pub is_private: Option<bool>,
}


impl CameraPatch {

    /// Same normalization as `NewCamera::normalized`, for present fields
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_owned());
        self.stream_url = self.stream_url.map(|url| url.trim().to_owned());
        self.location = self.location.map(normalize_location);
        self
    }

    /// Validates the fields present in this patch
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(url) = &self.stream_url {
            camera_url::validate(url)
                .map_err(|err| err.to_string())?;
        }
        Ok(())
    }
}


fn normalize_location(location: Option<String>) -> Option<String> {
    location.map(|loc| loc.trim().to_owned())
        .filter(|loc| !loc.is_empty())
}


fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().count() < MIN_CAMERA_NAME_LENGTH {
        return Err(format!("Name must be at least {} characters long", MIN_CAMERA_NAME_LENGTH));
    }
    Ok(())
}


/// Arrangement of the dashboard grid
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum GridLayout {
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[serde(rename = "3x3")]
    ThreeByThree,
    #[serde(rename = "4x4")]
    FourByFour,
    #[serde(rename = "auto")]
    Auto,
}

impl GridLayout {

    pub const ALL: [GridLayout; 4] = [
        GridLayout::TwoByTwo,
        GridLayout::ThreeByThree,
        GridLayout::FourByFour,
        GridLayout::Auto,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            GridLayout::TwoByTwo => "2x2",
            GridLayout::ThreeByThree => "3x3",
            GridLayout::FourByFour => "4x4",
            GridLayout::Auto => "auto",
        }
    }

    /// Stylesheet class applied to the grid container
    pub fn css_class(self) -> &'static str {
        match self {
            GridLayout::TwoByTwo => "grid-2",
            GridLayout::ThreeByThree => "grid-3",
            GridLayout::FourByFour => "grid-4",
            GridLayout::Auto => "grid-auto",
        }
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout::Auto
    }
}


/// Color theme (not yet applied by the UI)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {

    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::System];

    pub fn tag(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::System
    }
}


/// Dashboard settings
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub grid_layout: GridLayout,
    pub refresh_interval: u32,
    pub theme: Theme,
    pub privacy_password_hash: String,
}

impl Settings {

    /// Default settings guarded by the given privacy password hash
    pub fn new(privacy_password_hash: String) -> Self {
        Settings {
            grid_layout: GridLayout::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            theme: Theme::default(),
            privacy_password_hash,
        }
    }

    /// Merges `patch`, clamping the refresh interval into its bounds
    pub fn apply(&mut self, patch: SettingsPatch) {

        if let Some(grid_layout) = patch.grid_layout {
            self.grid_layout = grid_layout;
        }

        if let Some(refresh_interval) = patch.refresh_interval {
            self.refresh_interval = clamp_refresh_interval(refresh_interval);
        }

        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}


/// Partial update of the dashboard settings
///
/// The privacy password is deliberately absent. It changes only through
/// `Store::update_privacy_password`, which also relocks every camera.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub grid_layout: Option<GridLayout>,
    pub refresh_interval: Option<u32>,
    pub theme: Option<Theme>,
}


/// Clamps a refresh interval into `[MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL]`
pub fn clamp_refresh_interval(secs: u32) -> u32 {
    secs.max(MIN_REFRESH_INTERVAL).min(MAX_REFRESH_INTERVAL)
}


/// Signed-in operator
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
}
