//! Camera device interface
//!
//! Talks to the HTTP endpoints exposed by ESP32-CAM firmware. Control
//! requests are best-effort: the firmware answers them in ways that vary
//! between builds, so only transport failures are reported.

use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::camera_url;
use crate::error::Result;
use crate::model::Camera;


/// Timeout applied to every device request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout of an online check
pub const ONLINE_TIMEOUT: Duration = Duration::from_secs(10);


/// Sensor resolution offered by the firmware
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct FrameSize {
    pub value: u8,
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Frame sizes accepted by the `framesize` control, by value
pub const FRAME_SIZES: [FrameSize; 10] = [
    FrameSize { value: 0, name: "QQVGA", width: 160, height: 120 },
    FrameSize { value: 1, name: "QCIF", width: 176, height: 144 },
    FrameSize { value: 2, name: "HQVGA", width: 240, height: 176 },
    FrameSize { value: 3, name: "QVGA", width: 320, height: 240 },
    FrameSize { value: 4, name: "CIF", width: 400, height: 296 },
    FrameSize { value: 5, name: "VGA", width: 640, height: 480 },
    FrameSize { value: 6, name: "SVGA", width: 800, height: 600 },
    FrameSize { value: 7, name: "XGA", width: 1024, height: 768 },
    FrameSize { value: 8, name: "SXGA", width: 1280, height: 1024 },
    FrameSize { value: 9, name: "UXGA", width: 1600, height: 1200 },
];

pub const DEFAULT_FRAME_SIZE: u8 = 7;


/// JPEG quality preset (lower is better)
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct QualityPreset {
    pub value: u8,
    pub label: &'static str,
}

pub const QUALITY_PRESETS: [QualityPreset; 4] = [
    QualityPreset { value: 10, label: "Maximum" },
    QualityPreset { value: 20, label: "High" },
    QualityPreset { value: 30, label: "Medium" },
    QualityPreset { value: 40, label: "Low" },
];

pub const DEFAULT_QUALITY: u8 = 20;
pub const MAX_QUALITY: u8 = 63;


/// Looks up a frame size by its control value
pub fn frame_size(value: u8) -> Option<&'static FrameSize> {
    FRAME_SIZES.iter()
        .find(|size| size.value == value)
}


/// Resolution and quality to push to a camera
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct ControlRequest {
    pub framesize: u8,
    pub quality: u8,
}

impl Default for ControlRequest {
    fn default() -> Self {
        ControlRequest {
            framesize: DEFAULT_FRAME_SIZE,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ControlRequest {

    /// Checks both values against what the firmware accepts
    pub fn validate(&self) -> std::result::Result<(), String> {

        if frame_size(self.framesize).is_none() {
            return Err(format!("Unknown resolution {}", self.framesize));
        }

        if self.quality > MAX_QUALITY {
            return Err(format!("Quality must be between 0 and {}", MAX_QUALITY));
        }

        Ok(())
    }
}


/// Builds the HTTP client used for all device traffic
pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}


/// URLs that apply `request` to `camera`, resolution first
pub fn control_urls(camera: &Camera, request: &ControlRequest) -> [String; 2] {

    let base = camera_url::control_base_url(&camera.stream_url);

    [
        format!("{}/control?var=framesize&val={}", base, request.framesize),
        format!("{}/control?var=quality&val={}", base, request.quality),
    ]
}


/// Pushes resolution and quality to a camera
pub async fn apply_controls(client: &Client, camera: &Camera, request: &ControlRequest) -> Result<()> {

    for url in control_urls(camera, request).iter() {
        debug!("sending control request {}", url);
        let res = client.get(url.as_str())
            .send()
            .await?;
        trace!("camera {} answered {}", camera.id, res.status());
    }

    Ok(())
}


/// Checks whether the snapshot endpoint of `camera` answers
pub async fn check_online(client: &Client, camera: &Camera) -> bool {

    let url = camera_url::snapshot_url(&camera.stream_url);

    match client.head(&url).timeout(ONLINE_TIMEOUT).send().await {
        Ok(res) => res.status().is_success(),
        Err(err) => {
            trace!("online check of {} failed: {}", url, err);
            false
        },
    }
}


/// Fetches one JPEG frame from `url`
pub async fn fetch_snapshot(client: &Client, url: &str) -> Result<Bytes> {

    let frame = client.get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    Ok(frame)
}
