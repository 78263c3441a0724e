use sshoney::telemetry::events::TelemetryEvent;
use sshoney::telemetry::TelemetryLogger;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;

fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).expect("each line is a JSON object"))
        .collect()
}

#[tokio::test]
async fn open_truncates_previous_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("honeypot.log");
    std::fs::write(&path, "left over from last run\n").unwrap();

    let logger = TelemetryLogger::open(&path).await.unwrap();
    let source: SocketAddr = "203.0.113.9:4000".parse().unwrap();
    logger.log(TelemetryEvent::connection_new(&source, "a1b2c3d4"));
    logger.flush().await;

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("left over"));
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn open_creates_parent_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("events.log");
    let logger = TelemetryLogger::open(&path).await.unwrap();
    logger.flush().await;
    assert!(path.exists());
}

#[tokio::test]
async fn open_fails_on_directory_path() {
    let dir = TempDir::new().unwrap();
    assert!(TelemetryLogger::open(dir.path()).await.is_err());
}

#[tokio::test]
async fn line_carries_level_message_and_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("honeypot.log");
    let logger = TelemetryLogger::open(&path).await.unwrap();
    let source: SocketAddr = "198.51.100.20:51515".parse().unwrap();

    logger.log(TelemetryEvent::command(&source, "0badf00d", "cat /etc/shadow"));
    logger.flush().await;

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert_eq!(line["level"], "INFO");
    assert_eq!(line["event_type"], "shell.command");
    assert_eq!(line["session_id"], "0badf00d");
    assert_eq!(line["source_ip"], "198.51.100.20");
    assert_eq!(line["command"], "cat /etc/shadow");
    assert_eq!(
        line["message"],
        "Command received (198.51.100.20): cat /etc/shadow"
    );
    assert!(line["timestamp"].is_string());
}

#[tokio::test]
async fn concurrent_writers_produce_whole_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("honeypot.log");
    let logger = Arc::new(TelemetryLogger::open(&path).await.unwrap());

    let mut tasks = Vec::new();
    for worker in 0..8u16 {
        let logger = logger.clone();
        tasks.push(tokio::spawn(async move {
            let source: SocketAddr = format!("10.0.0.{}:{}", worker + 1, 40000 + worker)
                .parse()
                .unwrap();
            let sid = format!("{:08x}", worker);
            for i in 0..50 {
                let command = format!("echo {} {}", worker, "x".repeat(i * 10));
                logger.log(TelemetryEvent::command(&source, &sid, &command));
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }
    logger.flush().await;

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 400);
    for line in &lines {
        let sid = line["session_id"].as_str().unwrap();
        let worker = u16::from_str_radix(sid, 16).unwrap();
        assert_eq!(line["source_ip"], format!("10.0.0.{}", worker + 1));
        assert!(line["command"]
            .as_str()
            .unwrap()
            .starts_with(&format!("echo {} ", worker)));
    }
    assert_eq!(logger.dropped_count(), 0);
}

#[tokio::test]
async fn noop_logger_drops_and_counts() {
    let logger = TelemetryLogger::new_noop();
    let source: SocketAddr = "10.1.1.1:22".parse().unwrap();
    logger.log(TelemetryEvent::connection_new(&source, "deadbeef"));
    logger.log(TelemetryEvent::command(&source, "deadbeef", "id"));
    logger.flush().await;
    assert_eq!(logger.dropped_count(), 2);
}
