//! Integration tests for `GpsdSensor` against a fake gpsd on a local socket.

use geofix_tui::models::{Coordinates, PositionError, PositionOptions};
use geofix_tui::sensor::{GpsdSensor, LocationSensor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

const VERSION: &str = r#"{"class":"VERSION","release":"3.25","rev":"3.25","proto_major":3,"proto_minor":15}"#;
const ONE_DEVICE: &str = r#"{"class":"DEVICES","devices":[{"class":"DEVICE","path":"/dev/ttyACM0","driver":"u-blox"}]}"#;

/// Serves each connection: greets, waits for the WATCH command, then sends
/// `reports` and either closes or, with `hold_open`, stays silent.
async fn fake_gpsd(reports: Vec<String>, hold_open: bool) -> String {
    serve(reports, hold_open).await.0
}

/// Like [`fake_gpsd`], also counting accepted connections.
async fn serve(reports: Vec<String>, hold_open: bool) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let reports = reports.clone();
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                write.write_all(format!("{VERSION}\n").as_bytes()).await.unwrap();

                let mut command = String::new();
                BufReader::new(read).read_line(&mut command).await.unwrap();
                assert!(command.starts_with("?WATCH="), "unexpected command {command:?}");

                for report in reports {
                    write.write_all(format!("{report}\n").as_bytes()).await.unwrap();
                }
                if hold_open {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            });
        }
    });

    (addr, connections)
}

fn tpv(mode: u8, lat: f64, lon: f64) -> String {
    format!(r#"{{"class":"TPV","device":"/dev/ttyACM0","mode":{mode},"lat":{lat},"lon":{lon},"epx":8.5,"epy":9.1}}"#)
}

fn quick(options: PositionOptions) -> PositionOptions {
    PositionOptions {
        timeout: Duration::from_millis(500),
        ..options
    }
}

#[tokio::test]
async fn high_accuracy_waits_for_3d_fix() {
    let addr = fake_gpsd(
        vec![
            ONE_DEVICE.to_string(),
            tpv(2, 10.0, 10.0),
            tpv(3, 59.3293, 18.0686),
        ],
        false,
    )
    .await;
    let sensor = GpsdSensor::new(addr);

    let pos = sensor
        .current_position(&quick(PositionOptions::HIGH_ACCURACY))
        .await
        .unwrap();
    assert_eq!(pos.coordinates, Coordinates::new(59.3293, 18.0686));
    assert_eq!(pos.accuracy_m, Some(9.1));
}

#[tokio::test]
async fn low_accuracy_accepts_2d_fix() {
    let addr = fake_gpsd(vec![tpv(1, 0.0, 0.0), tpv(2, 35.6762, 139.6503)], false).await;
    let sensor = GpsdSensor::new(addr);

    let pos = sensor
        .current_position(&quick(PositionOptions::LOW_ACCURACY))
        .await
        .unwrap();
    assert_eq!(pos.coordinates, Coordinates::new(35.6762, 139.6503));
}

#[tokio::test]
async fn stream_ending_without_fix_is_unavailable() {
    let addr = fake_gpsd(vec![ONE_DEVICE.to_string(), tpv(2, 1.0, 1.0)], false).await;
    let sensor = GpsdSensor::new(addr);

    let err = sensor
        .current_position(&quick(PositionOptions::HIGH_ACCURACY))
        .await
        .unwrap_err();
    assert_eq!(err.code(), PositionError::POSITION_UNAVAILABLE);
}

#[tokio::test]
async fn no_attached_devices_is_unavailable() {
    let addr = fake_gpsd(vec![r#"{"class":"DEVICES","devices":[]}"#.to_string()], true).await;
    let sensor = GpsdSensor::new(addr);

    let err = sensor
        .current_position(&quick(PositionOptions::LOW_ACCURACY))
        .await
        .unwrap_err();
    assert_eq!(err.code(), PositionError::POSITION_UNAVAILABLE);
}

#[tokio::test]
async fn silent_daemon_times_out() {
    let addr = fake_gpsd(vec![ONE_DEVICE.to_string()], true).await;
    let sensor = GpsdSensor::new(addr);
    let options = PositionOptions {
        timeout: Duration::from_millis(150),
        ..PositionOptions::HIGH_ACCURACY
    };

    let err = sensor.current_position(&options).await.unwrap_err();
    assert_eq!(err, PositionError::Timeout(Duration::from_millis(150)));
    assert_eq!(err.code(), PositionError::TIMEOUT);
}

#[tokio::test]
async fn unreachable_daemon_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let err = GpsdSensor::new(addr)
        .current_position(&quick(PositionOptions::LOW_ACCURACY))
        .await
        .unwrap_err();
    assert_eq!(err.code(), PositionError::POSITION_UNAVAILABLE);
}

#[tokio::test]
async fn cached_fix_is_reused_within_maximum_age() {
    let (addr, connections) = serve(vec![tpv(2, 48.8566, 2.3522)], false).await;
    let sensor = GpsdSensor::new(addr);
    let low = quick(PositionOptions::LOW_ACCURACY);

    let first = sensor.current_position(&low).await.unwrap();
    let again = sensor.current_position(&low).await.unwrap();
    assert_eq!(again.coordinates, first.coordinates);
    assert_eq!(connections.load(Ordering::SeqCst), 1);

    // A zero tolerance always asks the daemon again.
    let uncached = PositionOptions {
        maximum_age: Duration::ZERO,
        ..low
    };
    sensor.current_position(&uncached).await.unwrap();
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cached_2d_fix_does_not_satisfy_high_accuracy() {
    let (addr, connections) = serve(vec![tpv(2, 48.8566, 2.3522)], false).await;
    let sensor = GpsdSensor::new(addr);

    sensor
        .current_position(&quick(PositionOptions::LOW_ACCURACY))
        .await
        .unwrap();
    let err = sensor
        .current_position(&quick(PositionOptions::HIGH_ACCURACY))
        .await
        .unwrap_err();

    assert_eq!(err.code(), PositionError::POSITION_UNAVAILABLE);
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}
