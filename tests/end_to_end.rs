//! Full pass through both HTTP clients against one in-process server that
//! plays Cloud Director and NetBox.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use vmsync_lib::{SyncConfig, SyncError, SyncSettings};
use vmsync_netbox::NetboxConfig;
use vmsync_vcloud::VcloudConfig;

#[derive(Default)]
struct World {
    base: String,
    netbox_vms: Vec<(String, u64)>,
    /// (endpoint, body) for every NetBox write
    writes: Vec<(&'static str, Value)>,
    logged_out: bool,
}

type Shared = Arc<Mutex<World>>;

async fn login() -> Response {
    ([("x-vmware-vcloud-access-token", "tok")], "{}").into_response()
}

async fn logout(State(world): State<Shared>) -> StatusCode {
    world.lock().unwrap().logged_out = true;
    StatusCode::NO_CONTENT
}

async fn query(State(world): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    let base = world.lock().unwrap().base.clone();
    match params.get("page").map(String::as_str) {
        Some("1") => Json(json!({"record": [
            {"name": "web-01", "status": "POWERED_ON", "numberOfCpus": 2, "memoryMB": 4096,
             "totalStorageAllocatedMb": 51200, "href": format!("{base}/api/vApp/vm-1"),
             "isVAppTemplate": false},
            {"name": "tmpl", "status": "POWERED_OFF", "numberOfCpus": 1, "memoryMB": 512,
             "totalStorageAllocatedMb": 1024, "href": format!("{base}/api/vApp/vm-2"),
             "isVAppTemplate": true}
        ]}))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn vm_detail() -> Json<Value> {
    Json(json!({
        "name": "web-01",
        "section": [{"_type": "NetworkConnectionSectionType", "networkConnection": [
            {"ipAddress": "10.0.0.5", "externalIpAddress": "", "macAddress": "AA:BB:CC:DD:EE:FF",
             "network": "LAN1"}
        ]}]
    }))
}

async fn netbox_root() -> Json<Value> {
    Json(json!({}))
}

async fn find_vm(State(world): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let name = params.get("name").cloned().unwrap_or_default();
    let results: Vec<Value> = world
        .lock()
        .unwrap()
        .netbox_vms
        .iter()
        .filter(|(n, _)| *n == name)
        .map(|(_, id)| json!({"id": id}))
        .collect();
    Json(json!({"count": results.len(), "results": results}))
}

async fn create_vm(State(world): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut world = world.lock().unwrap();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    world.netbox_vms.push((name, 11));
    world.writes.push(("vm", body));
    (StatusCode::CREATED, Json(json!({"id": 11}))).into_response()
}

async fn create_interface(State(world): State<Shared>, Json(body): Json<Value>) -> Response {
    world.lock().unwrap().writes.push(("interface", body));
    (StatusCode::CREATED, Json(json!({"id": 22}))).into_response()
}

async fn create_ip(State(world): State<Shared>, Json(body): Json<Value>) -> Response {
    world.lock().unwrap().writes.push(("ip", body));
    (StatusCode::CREATED, Json(json!({"id": 33}))).into_response()
}

async fn spawn(world: Shared) -> String {
    let router = Router::new()
        .route("/cloudapi/1.0.0/sessions", post(login))
        .route("/cloudapi/1.0.0/sessions/current", delete(logout))
        .route("/api/query", get(query))
        .route("/api/vApp/:id", get(vm_detail))
        .route("/netbox/api/", get(netbox_root))
        .route("/netbox/api/virtualization/virtual-machines/", get(find_vm).post(create_vm))
        .route("/netbox/api/virtualization/interfaces/", post(create_interface))
        .route("/netbox/api/ipam/ip-addresses/", post(create_ip))
        .with_state(world.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    world.lock().unwrap().base = base.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

fn config(base: &str) -> SyncConfig {
    SyncConfig {
        vcloud: VcloudConfig {
            host: base.to_string(),
            username: "admin".into(),
            password: "secret".into(),
            ..Default::default()
        },
        netbox: NetboxConfig {
            url: format!("{base}/netbox/api"),
            token: "nb".into(),
            cluster: 3,
            ..Default::default()
        },
        settings: SyncSettings {
            pace: std::time::Duration::ZERO,
            ..Default::default()
        },
        log_file: PathBuf::from("sync_vms.log"),
    }
}

#[tokio::test]
async fn one_pass_mirrors_web01() {
    let world = Shared::default();
    let base = spawn(world.clone()).await;

    let report = vmsync_lib::sync(&config(&base)).await.unwrap();

    assert_eq!(report.vms_seen, 2);
    assert_eq!(report.skipped_templates, 1);
    assert_eq!(report.vms_created, 1);
    assert_eq!(report.interfaces_created, 1);
    assert_eq!(report.ips_created, 1);
    assert_eq!(report.failures, 0);

    let world = world.lock().unwrap();
    assert!(world.logged_out);
    let endpoints: Vec<_> = world.writes.iter().map(|(e, _)| *e).collect();
    assert_eq!(endpoints, vec!["vm", "interface", "ip"]);
    assert_eq!(world.writes[0].1["cluster"], 3);
    assert_eq!(world.writes[1].1["virtual_machine"], 11);
    assert_eq!(world.writes[2].1["assigned_object_id"], 22);
    assert_eq!(world.writes[2].1["address"], "10.0.0.5/24");
}

#[tokio::test]
async fn unreachable_source_is_a_startup_error() {
    // Nothing listens on the discard port.
    let err = vmsync_lib::sync(&config("http://127.0.0.1:9")).await.unwrap_err();
    assert!(matches!(err, SyncError::Startup(_)));
}
