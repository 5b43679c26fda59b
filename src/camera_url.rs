//! Camera URL derivation and validation
//!
//! ESP32-CAM firmware serves MJPEG on `/stream`, a single JPEG frame on
//! `/capture` and parameter changes on `/control`. Operators usually paste
//! whichever of these they have at hand, with or without a scheme.

use lazy_static::lazy_static;
use regex::Regex;


lazy_static! {
    static ref DOMAIN_PATTERN: Regex =
        Regex::new(r"^(https?://)?([0-9a-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$")
            .expect("domain pattern is valid");

    static ref IP_PATTERN: Regex =
        Regex::new(r"^(https?://)?[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}(:[0-9]+)?(/.*)?$")
            .expect("IP pattern is valid");

    static ref ENDPOINT_TAIL: Regex =
        Regex::new(r"/(stream|capture|status).*$")
            .expect("endpoint pattern is valid");
}


/// Reason a candidate camera URL was rejected
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum InvalidUrl {
    #[display(fmt = "URL is required")]
    Empty,
    #[display(fmt = "Invalid URL. Use a format like http://192.168.1.100 or http://camera.local")]
    Malformed,
}


/// Returns `url` with `http://` prepended if it carries no scheme
pub fn stream_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else {
        format!("http://{}", url)
    }
}


/// Splits a normalized URL into scheme plus authority, and the rest
fn split_origin(url: &str) -> (&str, &str) {

    let host_start = url.find("://")
        .map(|i| i + 3)
        .unwrap_or(0);
    let path_start = url[host_start..].find('/')
        .map(|i| host_start + i)
        .unwrap_or_else(|| url.len());

    url.split_at(path_start)
}


/// Derives the single-frame endpoint of a camera
///
/// Only the path is inspected, so a host named `stream.local` is left alone.
pub fn snapshot_url(url: &str) -> String {

    let url = stream_url(url);
    let (origin, path) = split_origin(&url);

    if path.contains("/capture") {
        url.clone()
    } else if path.contains("/stream") {
        format!("{}{}", origin, path.replacen("/stream", "/capture", 1))
    } else {
        format!("{}{}/capture", origin, path.trim_end_matches('/'))
    }
}


/// Derives the base URL under which `/control` lives
pub fn control_base_url(url: &str) -> String {

    let url = stream_url(url);
    let (origin, path) = split_origin(&url);
    let path = ENDPOINT_TAIL.replace(path, "");

    format!("{}{}", origin, path.trim_end_matches('/'))
}


/// Checks that `url` looks like a camera address
///
/// Accepts host names with a top-level domain (`camera.local`) or dotted IPv4
/// addresses with optional port and path. The scheme is optional.
pub fn validate(url: &str) -> Result<(), InvalidUrl> {

    if url.trim().is_empty() {
        return Err(InvalidUrl::Empty);
    }

    if DOMAIN_PATTERN.is_match(url) || IP_PATTERN.is_match(url) {
        Ok(())
    } else {
        Err(InvalidUrl::Malformed)
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn stream_url_adds_missing_scheme() {
        assert_eq!(stream_url("192.168.1.50/stream"), "http://192.168.1.50/stream");
        assert_eq!(stream_url("https://cam.example.com"), "https://cam.example.com");
        assert_eq!(stream_url("http://cam.local"), "http://cam.local");
    }

    #[test]
    fn snapshot_url_derivation() {
        assert_eq!(snapshot_url("http://1.2.3.4/stream"), "http://1.2.3.4/capture");
        assert_eq!(snapshot_url("http://1.2.3.4"), "http://1.2.3.4/capture");
        assert_eq!(snapshot_url("http://1.2.3.4/"), "http://1.2.3.4/capture");
        assert_eq!(snapshot_url("http://1.2.3.4/capture"), "http://1.2.3.4/capture");
        assert_eq!(snapshot_url("1.2.3.4:81/stream"), "http://1.2.3.4:81/capture");
        assert_eq!(snapshot_url("http://stream.local"), "http://stream.local/capture");
    }

    #[test]
    fn control_base_strips_endpoint() {
        assert_eq!(control_base_url("http://1.2.3.4/stream"), "http://1.2.3.4");
        assert_eq!(control_base_url("1.2.3.4/capture?x=1"), "http://1.2.3.4");
        assert_eq!(control_base_url("http://cam.local/status"), "http://cam.local");
        assert_eq!(control_base_url("http://cam.local/"), "http://cam.local");
        assert_eq!(control_base_url("http://status.local/cam/stream"), "http://status.local/cam");
    }

    #[test]
    fn validation_accepts_hosts_and_addresses() {
        assert!(validate("http://192.168.1.100").is_ok());
        assert!(validate("192.168.1.100:81/stream").is_ok());
        assert!(validate("http://camera.local").is_ok());
        assert!(validate("https://cam.example.com/stream").is_ok());
    }

    #[test]
    fn validation_rejects_blank_and_garbage() {
        assert_eq!(validate(""), Err(InvalidUrl::Empty));
        assert_eq!(validate("   "), Err(InvalidUrl::Empty));
        assert_eq!(validate("not a camera"), Err(InvalidUrl::Malformed));
        assert_eq!(validate("ftp://1.2.3.4"), Err(InvalidUrl::Malformed));
    }
}
