//! NetboxClient against an in-process fake NetBox.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use vmsync_core::{DestinationInventory, InventoryErrorKind, VmContext, VmRecordSpec};
use vmsync_netbox::{InterfaceDefaults, NetboxClient, NetboxConfig};

const TOKEN: &str = "nb-token";

#[derive(Default)]
struct FakeNetbox {
    /// (name, id) of existing VMs
    vms: Vec<(String, u64)>,
    /// (path, body) of every write
    writes: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<FakeNetbox>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Token {TOKEN}"))
        .unwrap_or(false)
}

async fn root(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(json!({"virtualization": "/api/virtualization/"})).into_response()
}

async fn list_vms(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let name = params.get("name").cloned().unwrap_or_default();
    let fake = state.lock().unwrap();
    let results: Vec<Value> = fake
        .vms
        .iter()
        .filter(|(n, _)| *n == name)
        .map(|(n, id)| json!({"id": id, "name": n}))
        .collect();
    Json(json!({"count": results.len(), "results": results})).into_response()
}

async fn create_vm(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut fake = state.lock().unwrap();
    if body["name"] == "reject-me" {
        return (StatusCode::BAD_REQUEST, r#"{"cluster":["This field is required."]}"#).into_response();
    }
    let id = 100 + fake.vms.len() as u64;
    fake.vms.push((body["name"].as_str().unwrap_or_default().to_string(), id));
    fake.writes.push(("vm".into(), body));
    (StatusCode::CREATED, Json(json!({"id": id}))).into_response()
}

async fn update_vm(State(state): State<Shared>, Path(id): Path<u64>, Json(body): Json<Value>) -> Response {
    let mut fake = state.lock().unwrap();
    if !fake.vms.iter().any(|(_, v)| *v == id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    fake.writes.push((format!("vm/{id}"), body));
    Json(json!({"id": id})).into_response()
}

async fn create_interface(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut fake = state.lock().unwrap();
    fake.writes.push(("interface".into(), body));
    (StatusCode::CREATED, Json(json!({"id": 500}))).into_response()
}

async fn create_ip(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut fake = state.lock().unwrap();
    fake.writes.push(("ip".into(), body));
    (StatusCode::CREATED, Json(json!({"id": 900}))).into_response()
}

async fn spawn(state: Shared) -> String {
    let router = Router::new()
        .route("/api/", get(root))
        .route("/api/virtualization/virtual-machines/", get(list_vms).post(create_vm))
        .route("/api/virtualization/virtual-machines/:id/", patch(update_vm))
        .route("/api/virtualization/interfaces/", post(create_interface))
        .route("/api/ipam/ip-addresses/", post(create_ip))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/api/", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

fn config(url: &str) -> NetboxConfig {
    NetboxConfig {
        url: url.to_string(),
        token: TOKEN.into(),
        site: 1,
        cluster: 2,
        ..Default::default()
    }
}

fn spec(name: &str) -> VmRecordSpec {
    VmRecordSpec {
        name: name.into(),
        vcpus: 2,
        memory_mb: 4096,
        disk_mb: 51200,
        context: VmContext {
            ip_address: "10.0.0.5".into(),
            external_ip: String::new(),
            mac: "AA:BB:CC:DD:EE:FF".into(),
            network: "LAN1".into(),
            cloud_status: "POWERED_ON".into(),
        },
    }
}

#[tokio::test]
async fn debug_output_hides_token() {
    let client = NetboxClient::new(&config("https://netbox.example.com/api/")).unwrap();
    let out = format!("{client:?}");
    assert!(out.contains("https://netbox.example.com/api"));
    assert!(!out.contains(TOKEN));
}

#[tokio::test]
async fn trailing_slash_in_url_is_tolerated() {
    let state = Shared::default();
    let base = spawn(state).await;
    assert!(base.ends_with("/api/"));

    let client = NetboxClient::new(&config(&base)).unwrap();
    client.verify_access().await.unwrap();
    assert_eq!(client.find_vm_by_name("web-01").await.unwrap(), None);
}

#[tokio::test]
async fn verify_access_checks_token() {
    let state = Shared::default();
    let base = spawn(state).await;

    NetboxClient::new(&config(&base)).unwrap().verify_access().await.unwrap();

    let mut bad = config(&base);
    bad.token = "wrong".into();
    let err = NetboxClient::new(&bad).unwrap().verify_access().await.unwrap_err();
    assert_eq!(err.kind, InventoryErrorKind::ConnectionError);
}

#[tokio::test]
async fn find_returns_first_exact_match() {
    let state = Shared::default();
    state.lock().unwrap().vms = vec![("web-01".into(), 7), ("web-01".into(), 8), ("web-02".into(), 9)];
    let client = NetboxClient::new(&config(&spawn(state).await)).unwrap();

    assert_eq!(client.find_vm_by_name("web-01").await.unwrap(), Some(7));
    assert_eq!(client.find_vm_by_name("web-0").await.unwrap(), None);
}

#[tokio::test]
async fn create_sends_active_status_and_context() {
    let state = Shared::default();
    let client = NetboxClient::new(&config(&spawn(state.clone()).await)).unwrap();

    let id = DestinationInventory::create_vm(&client, &spec("web-01")).await.unwrap();
    assert_eq!(id, 100);

    let fake = state.lock().unwrap();
    let (path, body) = &fake.writes[0];
    assert_eq!(path, "vm");
    assert_eq!(body["status"], "active");
    assert_eq!(body["site"], 1);
    assert_eq!(body["cluster"], 2);
    assert!(body.get("tenant").is_none());
    assert_eq!(body["comments"], "auto sync from cloud");
    assert_eq!(body["local_context_data"]["cloud_status"], "POWERED_ON");
    assert_eq!(body["local_context_data"]["ip_address"], "10.0.0.5");
}

#[tokio::test]
async fn rejected_create_carries_status_and_body() {
    let state = Shared::default();
    let client = NetboxClient::new(&config(&spawn(state).await)).unwrap();

    let err = DestinationInventory::create_vm(&client, &spec("reject-me")).await.unwrap_err();
    assert_eq!(err.kind, InventoryErrorKind::ApiError(400));
    assert!(err.message.contains("This field is required."));
}

#[tokio::test]
async fn update_reports_failures() {
    let state = Shared::default();
    state.lock().unwrap().vms = vec![("web-01".into(), 7)];
    let client = NetboxClient::new(&config(&spawn(state.clone()).await)).unwrap();

    DestinationInventory::update_vm(&client, 7, &spec("web-01")).await.unwrap();
    {
        let fake = state.lock().unwrap();
        let (path, body) = &fake.writes[0];
        assert_eq!(path, "vm/7");
        assert_eq!(body["status"], "active");
        assert_eq!(body["vcpus"], 2);
        assert!(body.get("name").is_none());
    }

    let err = DestinationInventory::update_vm(&client, 404, &spec("ghost")).await.unwrap_err();
    assert_eq!(err.kind, InventoryErrorKind::NotFound);
}

#[tokio::test]
async fn interface_uses_configured_defaults() {
    let state = Shared::default();
    let mut cfg = config(&spawn(state.clone()).await);
    cfg.interface = InterfaceDefaults {
        name: "ens192".into(),
        mtu: 9000,
        mode: "tagged".into(),
    };
    let client = NetboxClient::new(&cfg).unwrap();

    let id = DestinationInventory::create_interface(&client, 42).await.unwrap();
    assert_eq!(id, 500);

    let fake = state.lock().unwrap();
    let (_, body) = &fake.writes[0];
    assert_eq!(
        body,
        &json!({"virtual_machine": 42, "name": "ens192", "enabled": true, "mtu": 9000, "mode": "tagged"})
    );
}

#[tokio::test]
async fn ip_is_assigned_to_vm_interface() {
    let state = Shared::default();
    let client = NetboxClient::new(&config(&spawn(state.clone()).await)).unwrap();

    let id = client.create_ip_address(500, "10.0.0.5/24").await.unwrap();
    assert_eq!(id, 900);

    let fake = state.lock().unwrap();
    let (_, body) = &fake.writes[0];
    assert_eq!(
        body,
        &json!({
            "status": "active",
            "assigned_object_type": "virtualization.vminterface",
            "assigned_object_id": 500,
            "address": "10.0.0.5/24",
            "family": 4
        })
    );
}

#[tokio::test]
async fn created_response_without_id_is_missing_id() {
    let router = Router::new().route(
        "/virtualization/interfaces/",
        post(|| async { (StatusCode::CREATED, Json(json!({"name": "eth0"}))) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = NetboxClient::new(&config(&base)).unwrap();
    let err = DestinationInventory::create_interface(&client, 1).await.unwrap_err();
    assert_eq!(err.kind, InventoryErrorKind::MissingId);
}
