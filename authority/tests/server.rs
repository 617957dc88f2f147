//! End-to-end scenarios over HTTP.

use letsrevoke_authority::{serve, Producer, Srd, State, REVOKE_AND_PRODUCE_SRD_PATH};
use letsrevoke_codec::Decode as _;
use letsrevoke_cryptography::{ed25519::PrivateKey, from_hex, Signer as _};
use letsrevoke_dictionary::{CertificateId, DictionaryCfg, EncodingPolicy, SelectionPolicy};
use std::{net::SocketAddr, time::Duration};

const MAX_POPULATION: u64 = 10_000_000;

fn producer(build_timeout: Duration) -> Producer {
    Producer::new(
        PrivateKey::from_seed(0),
        MAX_POPULATION,
        build_timeout,
        SelectionPolicy::Prefix,
        EncodingPolicy::default(),
    )
}

async fn start(producer: Producer) -> SocketAddr {
    let state = State::new(producer);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind");
    let addr = listener.local_addr().expect("could not read local addr");
    tokio::spawn(async move {
        serve(listener, state).await.expect("server failed");
    });
    addr
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}{REVOKE_AND_PRODUCE_SRD_PATH}")
}

async fn produce(addr: SocketAddr, percent: f64, total: i64) -> reqwest::Response {
    reqwest::get(format!(
        "{}?PercentRevoked={percent}&TotalCerts={total}",
        endpoint(addr)
    ))
    .await
    .expect("request failed")
}

fn decode_srd(body: &serde_json::Value) -> Srd {
    let raw = from_hex(body["srd"].as_str().expect("srd field missing")).expect("srd is not hex");
    Srd::decode_cfg(raw.as_slice(), &DictionaryCfg::default()).expect("srd does not decode")
}

#[tokio::test]
async fn test_full_revocation() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = produce(addr, 100.0, 10).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["revoked_count"].as_u64(), Some(10));
    assert_eq!(body["dictionary"].as_str(), Some("all_revoked"));

    let srd = decode_srd(&body);
    srd.verify(&PrivateKey::from_seed(0).public_key()).unwrap();
    for sequence in 0..10 {
        assert!(srd
            .dictionary
            .is_revoked(&CertificateId::from_sequence(sequence)));
    }
}

#[tokio::test]
async fn test_no_revocation() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = produce(addr, 0.0, 100).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["revoked_count"].as_u64(), Some(0));
    assert_eq!(body["dictionary"].as_str(), Some("all_valid"));

    let srd = decode_srd(&body);
    for sequence in 0..100 {
        assert!(!srd
            .dictionary
            .is_revoked(&CertificateId::from_sequence(sequence)));
    }
}

#[tokio::test]
async fn test_one_percent_of_a_million() {
    let addr = start(producer(Duration::from_secs(120))).await;
    let response = produce(addr, 1.0, 1_000_000).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["revoked_count"].as_u64(), Some(10_000));
    assert_eq!(body["dictionary"].as_str(), Some("cascade"));

    let srd = decode_srd(&body);
    srd.verify(&PrivateKey::from_seed(0).public_key()).unwrap();
    // Prefix selection: the first 10k are revoked, the rest are not.
    for sequence in [0, 9_999] {
        assert!(srd
            .dictionary
            .is_revoked(&CertificateId::from_sequence(sequence)));
    }
    for sequence in [10_000, 999_999] {
        assert!(!srd
            .dictionary
            .is_revoked(&CertificateId::from_sequence(sequence)));
    }
}

#[tokio::test]
async fn test_build_deadline_never_hangs() {
    let addr = start(producer(Duration::from_millis(1))).await;
    let response = produce(addr, 10.0, 500_000).await;
    assert_eq!(response.status(), 504);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"].as_str(), Some("timeout"));
}

#[tokio::test]
async fn test_negative_total_rejected() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = produce(addr, 10.0, -5).await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"].as_str(), Some("invalid_parameter"));
}

#[tokio::test]
async fn test_oversized_total_rejected() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = produce(addr, 10.0, MAX_POPULATION as i64 + 1).await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"].as_str(), Some("resource_exceeded"));
}

#[tokio::test]
async fn test_percent_above_hundred_rejected() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = produce(addr, 100.5, 100).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_tampered_srd_fails_verification() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = produce(addr, 10.0, 1_000).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let mut raw = from_hex(body["srd"].as_str().unwrap()).unwrap();

    // Flip one byte in the middle of the artifact.
    let middle = raw.len() / 2;
    raw[middle] ^= 0x01;

    let authority = PrivateKey::from_seed(0).public_key();
    let accepted = Srd::decode_cfg(raw.as_slice(), &DictionaryCfg::default())
        .map(|srd| srd.verify(&authority).is_ok())
        .unwrap_or(false);
    assert!(!accepted);
}

#[tokio::test]
async fn test_post_json_body() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let response = reqwest::Client::new()
        .post(endpoint(addr))
        .json(&serde_json::json!({"PercentRevoked": 50.0, "TotalCerts": 100}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["revoked_count"].as_u64(), Some(50));
}

#[tokio::test]
async fn test_identical_requests_yield_identical_artifacts() {
    let addr = start(producer(Duration::from_secs(30))).await;
    let a: serde_json::Value = produce(addr, 5.0, 10_000).await.json().await.unwrap();
    let b: serde_json::Value = produce(addr, 5.0, 10_000).await.json().await.unwrap();
    // Timestamps differ; the dictionaries must not.
    assert_eq!(decode_srd(&a).dictionary, decode_srd(&b).dictionary);
}

#[tokio::test]
async fn test_healthz_and_metrics() {
    let addr = start(producer(Duration::from_secs(30))).await;
    produce(addr, 10.0, 100).await;

    let health: serde_json::Value = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"].as_str(), Some("ok"));
    let authority = PrivateKey::from_seed(0).public_key().to_string();
    assert_eq!(health["authority"].as_str(), Some(authority.as_str()));

    let metrics = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("authority_requests_total"));
    assert!(metrics.contains("authority_completed_total"));
}
