//! Idle-state tests against the printer web interface
//!
//! Each test boots its own simulator and owns its client session for the
//! test's duration; the handle's Drop tears the simulator down. Tests
//! skip with a note on stderr when the bench (simulator binary, firmware
//! image, tesseract) is not available.

mod support;

use wui_e2e::harness;
use wui_e2e::wui::API_ENDPOINTS;

#[tokio::test]
async fn web_interface_is_accessible() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    // Check we can actually download the whole page and that it looks
    // htmley a bit.
    let body = client.get_html("/").await.expect("download root page");
    assert!(body.contains("<html>"), "root page does not look like HTML");
}

#[tokio::test]
async fn unknown_paths_return_404() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    for path in ["/nonsense", "/api/not"] {
        let response = client.get(path).await.expect("request unknown path");
        assert_eq!(response.status().as_u16(), 404, "{} should be 404", path);
    }
}

#[tokio::test]
async fn api_requires_key() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    // Not getting in when no X-Api-Key is present.
    for endpoint in API_ENDPOINTS {
        let response = client
            .get(&format!("/api/{}", endpoint))
            .await
            .expect("unauthenticated request");
        assert_eq!(
            response.status().as_u16(),
            401,
            "/api/{} without a key",
            endpoint
        );
    }

    // Not getting in with a wrong key, including ones that are close.
    for wrong_key in ["123456789", "012345678", "0123456789abc"] {
        for endpoint in API_ENDPOINTS {
            let response = client
                .get_with_key(&format!("/api/{}", endpoint), wrong_key)
                .await
                .expect("near-miss key request");
            assert_eq!(
                response.status().as_u16(),
                401,
                "/api/{} with key {:?}",
                endpoint,
                wrong_key
            );
        }
    }

    // The correct key gets in and the body parses as JSON.
    for endpoint in API_ENDPOINTS {
        let body = client.api_get_json(endpoint).await.expect("authorized GET");
        assert!(
            body.is_object() || body.is_array(),
            "/api/{} body: {}",
            endpoint,
            body
        );
    }
}

#[tokio::test]
async fn idle_version_reports_identity() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    let version = client.version().await.expect("get version");
    for key in ["text", "hostname", "api", "server"] {
        assert!(
            version.get(key).is_some(),
            "version missing {:?}: {}",
            key,
            version
        );
    }
}

#[tokio::test]
async fn idle_printer_reports_operational() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    let status = client.printer_status().await.expect("get printer status");

    let telemetry = &status["telemetry"];
    assert_eq!(telemetry["material"], "---", "telemetry: {}", telemetry);
    assert_eq!(telemetry["print-speed"].as_f64(), Some(100.0));

    assert_eq!(status["temperature"]["tool0"]["target"].as_f64(), Some(0.0));
    assert_eq!(status["temperature"]["bed"]["target"].as_f64(), Some(0.0));

    assert_eq!(status["state"]["text"], "Operational", "state: {}", status);
    assert_eq!(status["state"]["flags"]["printing"], false);
}

#[tokio::test]
async fn idle_job_is_empty() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    let job = client.job_status().await.expect("get job status");
    assert_eq!(job["state"], "Operational", "job: {}", job);
    assert!(job["job"].is_null(), "job: {}", job);
    assert!(job["progress"].is_null(), "job: {}", job);
}

#[tokio::test]
async fn upload_without_key_is_rejected() {
    let Some(config) = support::sim_config() else { return };
    let (_printer, client) = harness::boot_idle(config).await.expect("boot simulator");

    let response = client
        .upload_sdcard("empty.gcode", Vec::new(), false)
        .await
        .expect("upload request");
    assert_eq!(response.status().as_u16(), 401);
}
