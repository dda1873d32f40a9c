// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_multipart::{Multipart, MultipartError};
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use futures_util::StreamExt;
use imagetag::backend::{HttpRecordClient, RecordStore, UploadPolicy};
use imagetag::config::BackendConfig;
use imagetag::session::{ImageSession, SessionSettings};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const COLLECTION: &str = "images";
pub const COLLECTION_ID: &str = "pbc_3607937828";

/// PNG signature plus padding; enough for content sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

#[derive(Debug, Clone, Default)]
pub struct StoredFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory stand-in for the record service.
#[derive(Default)]
pub struct FakeBackend {
    records: Mutex<BTreeMap<String, Value>>,
    files: Mutex<HashMap<String, StoredFile>>,
    failures: Mutex<HashMap<&'static str, Vec<(StatusCode, String)>>>,
    pub requests: Mutex<Vec<String>>,
    pub patch_bodies: Mutex<Vec<Value>>,
    list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores a record whose `image_data` is taken verbatim, so either a
    /// JSON array or an encoded string can be seeded.
    pub fn seed(&self, id: &str, title: &str, image_data: Value) {
        let file_name = format!("{}_seed.png", id);
        self.records_guard().insert(
            id.to_string(),
            json!({
                "id": id,
                "collectionId": COLLECTION_ID,
                "collectionName": COLLECTION,
                "title": title,
                "image_file": file_name,
                "image_data": image_data,
                "created": "2026-01-05 10:00:00.000Z",
                "updated": "2026-01-05 10:00:00.000Z",
            }),
        );
        self.files_guard().insert(
            format!("{}/{}", id, file_name),
            StoredFile {
                name: file_name,
                content_type: "image/png".to_string(),
                bytes: PNG_BYTES.to_vec(),
            },
        );
    }

    pub fn seed_example(&self, id: &str, title: &str) {
        self.seed(
            id,
            title,
            json!([{"name": "Example Tag", "coordinates": {"x": 20, "y": 30}}]),
        );
    }

    pub fn record(&self, id: &str) -> Option<Value> {
        self.records_guard().get(id).cloned()
    }

    pub fn file(&self, id: &str, name: &str) -> Option<StoredFile> {
        self.files_guard().get(&format!("{}/{}", id, name)).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records_guard().len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Queues a failure for the next request of `method` ("GET", "PATCH", "POST").
    pub fn fail_next(&self, method: &'static str, status: StatusCode, body: &str) {
        self.failures
            .lock()
            .expect("failures lock")
            .entry(method)
            .or_default()
            .push((status, body.to_string()));
    }

    fn take_failure(&self, method: &'static str) -> Option<HttpResponse> {
        let mut failures = self.failures.lock().expect("failures lock");
        let queue = failures.get_mut(method)?;
        if queue.is_empty() {
            return None;
        }
        let (status, body) = queue.remove(0);
        Some(
            HttpResponse::build(status)
                .insert_header((CONTENT_TYPE, "application/json"))
                .body(body),
        )
    }

    fn log(&self, req: &HttpRequest) {
        let line = match req.query_string() {
            "" => format!("{} {}", req.method(), req.path()),
            query => format!("{} {}?{}", req.method(), req.path(), query),
        };
        self.requests.lock().expect("requests lock").push(line);
    }

    fn records_guard(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.records.lock().expect("records lock")
    }

    fn files_guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredFile>> {
        self.files.lock().expect("files lock")
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "code": 404,
        "message": "The requested resource wasn't found.",
        "data": {}
    }))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({"code": 400, "message": message, "data": {}}))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    sort: String,
    #[serde(default = "first_page")]
    page: usize,
    #[serde(rename = "perPage", default = "default_per_page")]
    per_page: usize,
}

fn first_page() -> usize {
    1
}

fn default_per_page() -> usize {
    30
}

async fn list_records(
    req: HttpRequest,
    backend: web::Data<Arc<FakeBackend>>,
    query: web::Query<ListQuery>,
) -> HttpResponse {
    backend.log(&req);
    backend.list_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = backend.take_failure("GET") {
        return response;
    }
    let mut items: Vec<Value> = backend.records_guard().values().cloned().collect();
    let (field, descending) = match query.sort.strip_prefix('-') {
        Some(field) => (field.to_string(), true),
        None => (query.sort.clone(), false),
    };
    if !field.is_empty() {
        items.sort_by(|a, b| {
            let ordering = a[&field]
                .as_str()
                .unwrap_or_default()
                .cmp(b[&field].as_str().unwrap_or_default());
            if descending { ordering.reverse() } else { ordering }
        });
    }
    let per_page = query.per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page_items: Vec<Value> = items
        .into_iter()
        .skip((query.page.max(1) - 1) * per_page)
        .take(per_page)
        .collect();
    HttpResponse::Ok().json(json!({
        "page": query.page,
        "perPage": per_page,
        "totalItems": total_items,
        "totalPages": total_pages,
        "items": page_items,
    }))
}

async fn get_record(
    req: HttpRequest,
    backend: web::Data<Arc<FakeBackend>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    backend.log(&req);
    if let Some(response) = backend.take_failure("GET") {
        return response;
    }
    let (_, id) = path.into_inner();
    match backend.record(&id) {
        Some(record) => HttpResponse::Ok().json(record),
        None => not_found(),
    }
}

async fn patch_record(
    req: HttpRequest,
    backend: web::Data<Arc<FakeBackend>>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> HttpResponse {
    backend.log(&req);
    if let Some(response) = backend.take_failure("PATCH") {
        return response;
    }
    let (_, id) = path.into_inner();
    let body = body.into_inner();
    backend
        .patch_bodies
        .lock()
        .expect("patch lock")
        .push(body.clone());

    let mut records = backend.records_guard();
    let Some(record) = records.get_mut(&id) else {
        return not_found();
    };
    let Some(image_data) = body.get("image_data") else {
        return bad_request("Failed to load the submitted data due to invalid formatting.");
    };
    record["image_data"] = image_data.clone();
    record["updated"] = json!("2026-01-05 11:00:00.000Z");
    HttpResponse::Ok().json(record.clone())
}

#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

async fn read_form(mut payload: Multipart) -> Result<Vec<FormPart>, MultipartError> {
    let mut parts = Vec::new();
    while let Some(field) = payload.next().await {
        let mut field = field?;
        let mut part = FormPart {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field
                .content_disposition()
                .and_then(|disposition| disposition.get_filename())
                .map(str::to_string),
            content_type: field.content_type().map(|mime| mime.to_string()),
            data: Vec::new(),
        };
        while let Some(chunk) = field.next().await {
            part.data.extend_from_slice(&chunk?);
        }
        parts.push(part);
    }
    Ok(parts)
}

async fn create_record(
    req: HttpRequest,
    backend: web::Data<Arc<FakeBackend>>,
    payload: Multipart,
) -> HttpResponse {
    backend.log(&req);
    if let Some(response) = backend.take_failure("POST") {
        return response;
    }
    let parts = match read_form(payload).await {
        Ok(parts) => parts,
        Err(_) => {
            return bad_request("Failed to load the submitted data due to invalid formatting.");
        }
    };

    let text = |name: &str| {
        parts
            .iter()
            .find(|part| part.name == name && part.file_name.is_none())
            .map(|part| String::from_utf8_lossy(&part.data).to_string())
    };
    let id = text("id").unwrap_or_default();
    if id.len() != 15 {
        return bad_request("Invalid id length.");
    }
    if backend.record(&id).is_some() {
        return bad_request("The record id is invalid or already exists.");
    }
    let image_data = match text("image_data") {
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(_) => return bad_request("image_data must be valid JSON."),
        },
        None => Value::Null,
    };
    let Some(file) = parts.iter().find(|part| part.name == "image_file") else {
        return bad_request("image_file is required.");
    };
    let original = file.file_name.clone().unwrap_or_else(|| "upload".to_string());
    let stored_name = match original.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_k2x9q1.{}", stem, ext),
        None => format!("{}_k2x9q1", original),
    };

    let record = json!({
        "id": id,
        "collectionId": COLLECTION_ID,
        "collectionName": COLLECTION,
        "title": text("title").unwrap_or_default(),
        "image_file": stored_name,
        "image_data": image_data,
        "created": "2026-01-05 12:00:00.000Z",
        "updated": "2026-01-05 12:00:00.000Z",
    });
    backend.files_guard().insert(
        format!("{}/{}", id, stored_name),
        StoredFile {
            name: stored_name.clone(),
            content_type: file
                .content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes: file.data.clone(),
        },
    );
    backend.records_guard().insert(id, record.clone());
    HttpResponse::Ok().json(record)
}

async fn get_file(
    req: HttpRequest,
    backend: web::Data<Arc<FakeBackend>>,
    path: web::Path<(String, String, String)>,
) -> HttpResponse {
    backend.log(&req);
    let (collection_id, id, name) = path.into_inner();
    if collection_id != COLLECTION_ID {
        return not_found();
    }
    match backend.file(&id, &name) {
        Some(file) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, file.content_type))
            .body(file.bytes),
        None => not_found(),
    }
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/collections/{collection}/records",
        web::get().to(list_records),
    )
    .route(
        "/api/collections/{collection}/records",
        web::post().to(create_record),
    )
    .route(
        "/api/collections/{collection}/records/{id}",
        web::get().to(get_record),
    )
    .route(
        "/api/collections/{collection}/records/{id}",
        web::patch().to(patch_record),
    )
    .route(
        "/api/files/{collection_id}/{id}/{name}",
        web::get().to(get_file),
    );
}

/// Serves `backend` on an ephemeral port and returns its base URL.
pub async fn start_test_server(backend: Arc<FakeBackend>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let data = web::Data::new(backend);

    actix_web::rt::spawn(async move {
        let _ = HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
            .workers(1)
            .listen(listener)
            .expect("listen")
            .run()
            .await;
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        ..BackendConfig::default()
    }
}

pub fn http_client(base_url: &str) -> HttpRecordClient {
    HttpRecordClient::new(&backend_config(base_url)).expect("client")
}

pub fn session_for(base_url: &str, default_record_id: &str) -> ImageSession {
    let store: Arc<dyn RecordStore> = Arc::new(http_client(base_url));
    ImageSession::new(
        store,
        SessionSettings {
            default_record_id: default_record_id.to_string(),
            upload_policy: UploadPolicy::default(),
        },
    )
}

pub fn tag_pairs(value: &Value) -> Vec<(String, i64, i64)> {
    value
        .as_array()
        .map(|tags| {
            tags.iter()
                .map(|tag| {
                    (
                        tag["name"].as_str().unwrap_or_default().to_string(),
                        tag["coordinates"]["x"].as_i64().unwrap_or_default(),
                        tag["coordinates"]["y"].as_i64().unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
