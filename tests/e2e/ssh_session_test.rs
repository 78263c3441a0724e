#[allow(dead_code)]
mod helpers;

use helpers::*;
use russh::keys::{Algorithm, PrivateKey, PrivateKeyWithHashAlg};
use russh::Disconnect;
use sshoney::ssh::pubkey;
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::test]
async fn any_credentials_authenticate() {
    let hp = start_honeypot(|_| {}).await;

    for (user, pass) in [("root", "toor"), ("admin", ""), ("pi", "raspberry")] {
        let handle = connect_with_password(hp.addr, user, pass).await;
        let _ = handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await;
    }

    let events = hp.events_of("auth.password").await;
    let users: Vec<&str> = events
        .iter()
        .map(|e| e["username"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["root", "admin", "pi"]);
    assert_eq!(events[0]["password"], "toor");
    assert_eq!(events[0]["source_ip"], "127.0.0.1");
}

#[tokio::test]
async fn public_key_authenticates_and_is_logged_once() {
    let hp = start_honeypot(|_| {}).await;
    let key = PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519).unwrap();
    let expected = pubkey::describe(key.public_key());

    let mut handle = connect(hp.addr).await;
    let auth = handle
        .authenticate_publickey("git", PrivateKeyWithHashAlg::new(Arc::new(key), None))
        .await
        .unwrap();
    assert!(auth.success(), "honeypot must accept any public key");

    let (mut channel, banner) = open_shell(&handle).await;
    assert!(banner.ends_with("$ "));

    let events = hp.events_of("auth.publickey").await;
    assert_eq!(events.len(), 1, "one signed attempt, one event: {:?}", events);
    let e = &events[0];
    assert_eq!(e["username"], "git");
    assert_eq!(e["algorithm"], "ssh-ed25519");
    assert_eq!(e["bits"], 256);
    assert_eq!(e["fingerprint"], expected.fingerprint.as_str());
    assert_eq!(e["fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(e["base64"], expected.base64.as_str());
    assert!(hp.events_of("auth.password").await.is_empty());

    channel.data(&b"exit\r"[..]).await.unwrap();
    let tail = read_until(&mut channel, "", Duration::from_secs(5)).await;
    assert!(tail.closed);
    let closed = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "session.closed")
        .await
        .expect("session.closed event");
    assert_eq!(closed["reason"], "exit");
}

#[tokio::test]
async fn shell_session_answers_commands_then_exits() {
    let hp = start_honeypot(|_| {}).await;
    let handle = connect_with_password(hp.addr, "root", "123456").await;
    let (mut channel, banner) = open_shell(&handle).await;

    assert!(banner.starts_with("Welcome to Ubuntu 18.04.4 LTS"));
    assert!(banner.ends_with("$ "));

    let out = run_command(&mut channel, "ls -la").await;
    assert!(out.contains("ls -la\r\r\nusers.txt\r\n$ "), "got {:?}", out);

    let out = run_command(&mut channel, "pwd").await;
    assert!(out.contains("/home/root\r\n$ "), "got {:?}", out);

    let out = run_command(&mut channel, "whoami").await;
    assert!(out.contains("Command not found: whoami\r\n$ "), "got {:?}", out);

    channel.data(&b"exit\r"[..]).await.unwrap();
    let tail = read_until(&mut channel, "", Duration::from_secs(5)).await;
    assert!(tail.closed, "exit must close the channel");
    assert!(!tail.output.contains("Command not found"));

    let closed = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "session.closed")
        .await
        .expect("session.closed event");
    assert_eq!(closed["reason"], "exit");

    let commands: Vec<String> = hp
        .events_of("shell.command")
        .await
        .iter()
        .map(|e| e["command"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(commands, vec!["ls -la", "pwd", "whoami", "exit"]);

    let responses = hp.events_of("shell.response").await;
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["response"], "users.txt");

    let pty = hp.events_of("request.pty").await;
    assert_eq!(pty[0]["term"], "xterm");
}

#[tokio::test]
async fn client_version_is_recorded() {
    let hp = start_honeypot(|_| {}).await;
    let handle = connect_with_password(hp.addr, "user", "pass").await;
    let _channel = handle.channel_open_session().await.unwrap();

    let version = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "client.version")
        .await
        .expect("client.version event");
    assert!(version["version"].as_str().unwrap().starts_with("SSH-2.0-"));
}

#[tokio::test]
async fn missing_shell_request_closes_without_prompt() {
    let hp = start_honeypot(|c| c.timeouts.shell_request_secs = 1).await;
    let handle = connect_with_password(hp.addr, "root", "root").await;
    let mut channel = handle.channel_open_session().await.unwrap();

    let outcome = read_until(&mut channel, "", Duration::from_secs(5)).await;
    assert!(outcome.closed, "session should be torn down");
    assert!(!outcome.output.contains("$ "));

    let err = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "session.error")
        .await
        .expect("session.error event");
    assert_eq!(err["error_class"], "NoShellRequest");
    assert!(hp.events_of("shell.command").await.is_empty());
}

#[tokio::test]
async fn missing_channel_closes_session() {
    let hp = start_honeypot(|c| c.timeouts.channel_accept_secs = 1).await;
    let _handle = connect_with_password(hp.addr, "root", "root").await;

    let err = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "session.error")
        .await
        .expect("session.error event");
    assert_eq!(err["error_class"], "NoChannel");

    let closed = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "session.closed")
        .await
        .expect("session.closed event");
    assert_eq!(closed["session_id"], err["session_id"]);
}

#[tokio::test]
async fn exec_request_is_logged_not_run() {
    let hp = start_honeypot(|c| c.timeouts.shell_request_secs = 1).await;
    let handle = connect_with_password(hp.addr, "deploy", "deploy").await;
    let mut channel = handle.channel_open_session().await.unwrap();
    channel
        .exec(false, "uname -a; cat /proc/cpuinfo")
        .await
        .unwrap();

    let exec = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "request.exec")
        .await
        .expect("request.exec event");
    assert_eq!(exec["username"], "deploy");
    assert_eq!(exec["command"], "uname -a; cat /proc/cpuinfo");

    let outcome = read_until(&mut channel, "", Duration::from_secs(5)).await;
    assert!(outcome.closed);
    assert!(outcome.output.is_empty());
}

#[tokio::test]
async fn client_disconnect_mid_line_is_clean() {
    let hp = start_honeypot(|_| {}).await;
    let handle = connect_with_password(hp.addr, "root", "root").await;
    let (channel, _) = open_shell(&handle).await;

    channel.data(&b"rm -rf"[..]).await.unwrap();
    let _ = channel.eof().await;
    drop(channel);
    let _ = handle
        .disconnect(Disconnect::ByApplication, "", "en")
        .await;

    let closed = hp
        .wait_for_event(Duration::from_secs(5), |e| e["event_type"] == "session.closed")
        .await
        .expect("session.closed event");
    assert_eq!(closed["reason"], "disconnected");
    assert!(hp.events_of("shell.command").await.is_empty());
}

#[tokio::test]
async fn concurrent_sessions_are_attributed_separately() {
    let hp = start_honeypot(|_| {}).await;

    let mut tasks = Vec::new();
    for (user, command) in [("alice", "ls /srv"), ("bob", "cat /etc/issue"), ("carol", "pwd")] {
        let addr = hp.addr;
        tasks.push(tokio::spawn(async move {
            let handle = connect_with_password(addr, user, "x").await;
            let (mut channel, _) = open_shell(&handle).await;
            for _ in 0..3 {
                run_command(&mut channel, command).await;
            }
            channel.data(&b"exit\r"[..]).await.unwrap();
            read_until(&mut channel, "", Duration::from_secs(5)).await;
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    let events = hp.events().await;
    let session_of = |user: &str| -> String {
        events
            .iter()
            .find(|e| e["event_type"] == "auth.password" && e["username"] == user)
            .map(|e| e["session_id"].as_str().unwrap().to_string())
            .unwrap()
    };
    for (user, command) in [("alice", "ls /srv"), ("bob", "cat /etc/issue"), ("carol", "pwd")] {
        let sid = session_of(user);
        let typed: Vec<&str> = events
            .iter()
            .filter(|e| e["event_type"] == "shell.command" && e["session_id"] == sid.as_str())
            .map(|e| e["command"].as_str().unwrap())
            .collect();
        assert_eq!(typed, vec![command, command, command, "exit"], "session of {}", user);
    }
}
