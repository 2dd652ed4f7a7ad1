// tests/common/mod.rs

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use rust_xlsxwriter::Workbook;
use serde_json::Value;

use masterdata_api::config::{Config, StoreBackend};
use masterdata_api::models::{EmployeeStatus, NewEmployee, Role};
use masterdata_api::store::{EmployeeStore, MemoryEmployeeStore};
use masterdata_api::{app, AppState};

pub const BOUNDARY: &str = "----masterdata-test-boundary";

pub fn new_employee(code: &str, first: &str, last: &str) -> NewEmployee {
    NewEmployee {
        no: 0,
        empcode: code.into(),
        first_name: first.into(),
        middle_name: None,
        last_name: last.into(),
        full_name: format!("{first} {last}"),
        cbe_noncbe: None,
        rank: "Staff".into(),
        emp_status: "Regular".into(),
        position: "Clerk".into(),
        costcode: None,
        proj_name: "Depot".into(),
        proj_hr: None,
        email_address: None,
        mobile_assignment: None,
        mobile_number: None,
        laptop_assignment: None,
        asset_code: None,
        others: None,
        remarks: None,
        role: Role::Employee,
        status: EmployeeStatus::Active,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryEmployeeStore>,
}

pub fn test_app(role: Role, template: PathBuf) -> TestApp {
    let store = Arc::new(MemoryEmployeeStore::new());
    let config = Config {
        store_backend: StoreBackend::Memory,
        auth_stub_role: role,
        clearance_template: template,
        ..Config::default()
    };
    let shared: Arc<dyn EmployeeStore> = store.clone();
    TestApp {
        router: app(AppState::new(shared, config)),
        store,
    }
}

pub fn admin_app() -> TestApp {
    test_app(Role::Admin, PathBuf::from("/nonexistent/Clearance_Form.pdf"))
}

/// One-sheet workbook with text cells only.
pub fn sheet(headers: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    for (c, h) in headers.iter().enumerate() {
        ws.write_string(0, c as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                ws.write_string(r as u32 + 1, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub fn multipart_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"employees.xlsx\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Two-page clearance template; each page carries its variant label so a
/// test can tell which one was kept.
pub fn clearance_template(labels: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Write `bytes` to a fresh file under the system temp dir.
pub fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("masterdata-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// All text drawn on the only page of a generated form.
pub fn single_page_text(pdf: &[u8]) -> (usize, String) {
    let doc = Document::load_mem(pdf).unwrap();
    let pages = doc.get_pages();
    let page_id = *pages.values().next().unwrap();
    let content = doc.get_page_content(page_id).unwrap();
    (pages.len(), String::from_utf8_lossy(&content).into_owned())
}
