use actix_web::{http::header, http::StatusCode, test, web, App};
use async_trait::async_trait;
use promptrelay::{server, ImageAnalyzer, InlineImage, RelayError, ServerConfig};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

const BOUNDARY: &str = "----promptrelay-test-boundary";
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

struct CountingAnalyzer {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl CountingAnalyzer {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageAnalyzer for CountingAnalyzer {
    fn model(&self) -> &str {
        "counting-double"
    }

    async fn generate(&self, image: &InlineImage, _prompt: &str) -> promptrelay::Result<String> {
        assert_eq!(image.mime_type, "image/jpeg");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(RelayError::RemoteService)
    }
}

enum FormPart<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File(name, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"photo.jpg\"\r\nContent-Type: {}\r\n\r\n",
                        name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn analyze_request(path: &str, parts: &[FormPart]) -> actix_web::test::TestRequest {
    test::TestRequest::post()
        .uri(path)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

async fn call_raw(
    analyzer: Arc<CountingAnalyzer>,
    settings: ServerConfig,
    request: actix_web::test::TestRequest,
) -> (StatusCode, Option<String>, actix_web::web::Bytes) {
    let data: web::Data<dyn ImageAnalyzer> = web::Data::from(analyzer as Arc<dyn ImageAnalyzer>);
    let app = test::init_service(
        App::new()
            .wrap(server::cors())
            .app_data(data)
            .configure(|cfg| server::configure(cfg, &settings)),
    )
    .await;

    let response = test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = test::read_body(response).await;
    (status, content_type, body)
}

async fn call(
    analyzer: Arc<CountingAnalyzer>,
    settings: ServerConfig,
    request: actix_web::test::TestRequest,
) -> (StatusCode, Option<String>, Value) {
    let (status, content_type, body) = call_raw(analyzer, settings, request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    (status, content_type, body)
}

#[actix_web::test]
async fn structured_request_returns_model_json_verbatim() {
    let inner = json!({
        "baseDescription": {
            "background": "pantai saat senja",
            "subjectDescription": "seorang anak dengan layang-layang",
            "visualStyle": "fotografi sinematik",
            "lighting": "cahaya keemasan",
            "characterTemplate": "anak laki-laki, kaos merah"
        },
        "finalPrompt": "Seorang anak bermain layang-layang di pantai saat senja, aspect ratio: 16:9"
    });
    let reply = format!("```json\n{}\n```", serde_json::to_string_pretty(&inner).unwrap());
    let analyzer = CountingAnalyzer::replying(&reply);

    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::File("imageFile", "image/jpeg", JPEG),
            FormPart::Text("selectedLang", "ID"),
            FormPart::Text("selectedRatio", "16:9"),
        ],
    );
    let (status, content_type, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, inner);
    assert_eq!(analyzer.calls(), 1);
}

#[actix_web::test]
async fn raw_request_wraps_text() {
    let analyzer = CountingAnalyzer::replying("A lone lighthouse in a storm, aspect ratio: 1:1");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::Text("selectedLang", "EN-RAW"),
            FormPart::Text("selectedRatio", "1:1"),
            FormPart::File("imageFile", "image/jpeg", JPEG),
        ],
    );
    let (status, _, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"finalPrompt": "A lone lighthouse in a storm, aspect ratio: 1:1"})
    );
}

#[actix_web::test]
async fn missing_image_is_rejected_without_model_call() {
    let analyzer = CountingAnalyzer::replying("unused");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::Text("selectedLang", "EN"),
            FormPart::Text("selectedRatio", "4:3"),
        ],
    );
    let (status, content_type, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({"error": "Tidak ada file yang diunggah."}));
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn empty_image_is_rejected_without_model_call() {
    let analyzer = CountingAnalyzer::replying("unused");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::File("imageFile", "image/jpeg", &[]),
            FormPart::Text("selectedLang", "ID"),
        ],
    );
    let (status, _, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tidak ada file yang diunggah.");
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn invalid_structured_output_is_generic_failure() {
    let analyzer = CountingAnalyzer::replying("```json\n{\"baseDescription\": \n```");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::File("imageFile", "image/jpeg", JPEG),
            FormPart::Text("selectedLang", "EN"),
            FormPart::Text("selectedRatio", "9:16"),
        ],
    );
    let (status, _, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 500);
    assert!(body["message"].as_str().unwrap().contains("not valid JSON"));
}

#[actix_web::test]
async fn remote_failure_surfaces_message() {
    let analyzer = CountingAnalyzer::failing("API key not valid. Please pass a valid API key.");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::File("imageFile", "image/jpeg", JPEG),
            FormPart::Text("selectedLang", "ID-RAW"),
        ],
    );
    let (status, _, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"code": 500, "message": "API key not valid. Please pass a valid API key."})
    );
    assert_eq!(analyzer.calls(), 1);
}

#[actix_web::test]
async fn analyze_route_can_be_mounted_at_root() {
    let analyzer = CountingAnalyzer::replying("{\"finalPrompt\": \"x\"}");
    let request = analyze_request("/", &[FormPart::File("imageFile", "image/jpeg", JPEG)]);
    let settings = ServerConfig::new().with_analyze_path("/");
    let (status, _, body) = call(analyzer, settings, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"finalPrompt": "x"}));
}

#[actix_web::test]
async fn cors_headers_allow_any_origin() {
    let analyzer = CountingAnalyzer::replying("prompt");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::File("imageFile", "image/jpeg", JPEG),
            FormPart::Text("selectedLang", "EN-RAW"),
        ],
    )
    .insert_header((header::ORIGIN, "http://localhost:5173"));

    let data: web::Data<dyn ImageAnalyzer> = web::Data::from(analyzer as Arc<dyn ImageAnalyzer>);
    let settings = ServerConfig::new();
    let app = test::init_service(
        App::new()
            .wrap(server::cors())
            .app_data(data)
            .configure(|cfg| server::configure(cfg, &settings)),
    )
    .await;
    let response = test::call_service(&app, request.to_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[actix_web::test]
async fn health_reports_model() {
    let analyzer = CountingAnalyzer::replying("unused");
    let request = test::TestRequest::get().uri("/health");
    let (status, _, body) = call(analyzer, ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "model": "counting-double"}));
}

#[actix_web::test]
async fn body_without_content_type_is_missing_image() {
    let analyzer = CountingAnalyzer::replying("unused");
    let request = test::TestRequest::post().uri("/analyze-image");
    let (status, content_type, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({"error": "Tidak ada file yang diunggah."}));
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn urlencoded_body_is_missing_image() {
    let analyzer = CountingAnalyzer::replying("unused");
    let request = test::TestRequest::post()
        .uri("/analyze-image")
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload("selectedLang=EN&selectedRatio=1:1");
    let (status, content_type, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({"error": "Tidak ada file yang diunggah."}));
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn multipart_without_boundary_is_missing_image() {
    let analyzer = CountingAnalyzer::replying("unused");
    let request = test::TestRequest::post()
        .uri("/analyze-image")
        .insert_header((header::CONTENT_TYPE, "multipart/form-data"))
        .set_payload(multipart_body(&[FormPart::File("imageFile", "image/jpeg", JPEG)]));
    let (status, _, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tidak ada file yang diunggah.");
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn truncated_multipart_is_generic_failure() {
    let analyzer = CountingAnalyzer::replying("unused");
    let mut payload = multipart_body(&[
        FormPart::Text("selectedLang", "EN"),
        FormPart::File("imageFile", "image/jpeg", JPEG),
    ]);
    payload.truncate(payload.len() - BOUNDARY.len() - 10);
    let request = test::TestRequest::post()
        .uri("/analyze-image")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(payload);
    let (status, content_type, body) = call(analyzer.clone(), ServerConfig::new(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["code"], 500);
    assert!(!body["message"].as_str().unwrap().is_empty());
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn oversized_image_is_generic_failure() {
    let analyzer = CountingAnalyzer::replying("unused");
    let image = vec![0xAB; 80 * 1024];
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::Text("selectedLang", "EN-RAW"),
            FormPart::File("imageFile", "image/jpeg", &image),
        ],
    );
    let settings = ServerConfig::new().with_max_image_bytes(1024);
    let (status, content_type, body) = call(analyzer.clone(), settings, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["code"], 500);
    assert_eq!(analyzer.calls(), 0);
}

#[actix_web::test]
async fn image_within_limit_is_accepted() {
    let analyzer = CountingAnalyzer::replying("prompt");
    let image = vec![0xAB; 60 * 1024];
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::Text("selectedLang", "EN-RAW"),
            FormPart::File("imageFile", "image/jpeg", &image),
        ],
    );
    let settings = ServerConfig::new().with_max_image_bytes(64 * 1024);
    let (status, _, body) = call(analyzer.clone(), settings, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"finalPrompt": "prompt"}));
    assert_eq!(analyzer.calls(), 1);
}

fn static_settings(dir: &tempfile::TempDir) -> ServerConfig {
    std::fs::write(dir.path().join("index.html"), "<h1>promptrelay</h1>").unwrap();
    ServerConfig::new().with_static_dir(dir.path().to_string_lossy().into_owned())
}

#[actix_web::test]
async fn static_dir_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = CountingAnalyzer::replying("unused");
    let request = test::TestRequest::get().uri("/");
    let (status, content_type, body) = call_raw(analyzer, static_settings(&dir), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert_eq!(&body[..], b"<h1>promptrelay</h1>");
}

#[actix_web::test]
async fn api_routes_take_precedence_over_static_dir() {
    let dir = tempfile::tempdir().unwrap();

    let analyzer = CountingAnalyzer::replying("unused");
    let request = test::TestRequest::get().uri("/health");
    let (status, _, body) = call(analyzer, static_settings(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let analyzer = CountingAnalyzer::replying("A quiet harbor, aspect ratio: 3:2");
    let request = analyze_request(
        "/analyze-image",
        &[
            FormPart::File("imageFile", "image/jpeg", JPEG),
            FormPart::Text("selectedLang", "EN-RAW"),
            FormPart::Text("selectedRatio", "3:2"),
        ],
    );
    let (status, _, body) = call(analyzer.clone(), static_settings(&dir), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"finalPrompt": "A quiet harbor, aspect ratio: 3:2"}));
    assert_eq!(analyzer.calls(), 1);
}
