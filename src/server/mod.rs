use crate::{
    config::{Config, ServerConfig},
    error::RelayError,
    gemini::ImageAnalyzer,
    models::{FailureBody, UploadedImage, ValidationBody, MISSING_IMAGE_MESSAGE},
    relay::{self, AnalyzeRequest},
};
use actix_cors::Cors;
use actix_files::Files;
use actix_multipart::{
    form::{bytes::Bytes, text::Text, MultipartForm, MultipartFormConfig},
    MultipartError,
};
use actix_web::{
    http::StatusCode, middleware, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use serde_json::json;
use std::sync::Arc;

/// Room left for the two text fields and part headers on top of the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, MultipartForm)]
pub struct AnalyzeForm {
    #[multipart(rename = "imageFile")]
    pub image_file: Option<Bytes>,
    #[multipart(rename = "selectedLang")]
    pub selected_lang: Option<Text<String>>,
    #[multipart(rename = "selectedRatio")]
    pub selected_ratio: Option<Text<String>>,
}

impl AnalyzeForm {
    /// A form with no parts at all, standing in for a non-multipart body.
    pub fn empty() -> Self {
        Self {
            image_file: None,
            selected_lang: None,
            selected_ratio: None,
        }
    }

    pub fn into_request(self) -> AnalyzeRequest {
        let image = self.image_file.map(|part| {
            UploadedImage::new(part.data.to_vec(), part.content_type.map(|m| m.to_string()))
                .with_file_name(part.file_name)
        });

        AnalyzeRequest {
            image,
            selected_lang: self
                .selected_lang
                .map(Text::into_inner)
                .unwrap_or_default(),
            selected_ratio: self
                .selected_ratio
                .map(Text::into_inner)
                .unwrap_or_default(),
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_validation() {
            HttpResponse::BadRequest().json(ValidationBody {
                error: self.message().to_string(),
            })
        } else {
            HttpResponse::InternalServerError().json(FailureBody::internal(self.message()))
        }
    }
}

/// Header-level failures: the body is not a multipart form at all, so it
/// carries no image part.
fn is_not_multipart(err: &MultipartError) -> bool {
    matches!(
        err,
        MultipartError::ContentTypeMissing
            | MultipartError::ContentTypeIncompatible
            | MultipartError::BoundaryMissing
    )
}

fn multipart_error(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    if is_not_multipart(&err) {
        log::debug!("Body is not a multipart form: {}", err);
        return RelayError::Validation(MISSING_IMAGE_MESSAGE.into()).into();
    }
    log::error!("Rejected multipart body: {}", err);
    RelayError::Multipart(err.to_string()).into()
}

/// Resolve a failed form extraction: non-multipart bodies become an empty
/// form, anything else is a multipart failure.
fn form_or_empty(
    form: Result<MultipartForm<AnalyzeForm>, actix_web::Error>,
) -> Result<AnalyzeForm, RelayError> {
    let err = match form {
        Ok(MultipartForm(form)) => return Ok(form),
        Err(err) => err,
    };

    if let Some(multipart) = err.as_error::<MultipartError>() {
        if is_not_multipart(multipart) {
            return Ok(AnalyzeForm::empty());
        }
        log::error!("Rejected multipart body: {}", multipart);
        return Err(RelayError::Multipart(multipart.to_string()));
    }

    match err.as_error::<RelayError>() {
        Some(relay) if relay.is_validation() => Ok(AnalyzeForm::empty()),
        Some(relay) => Err(RelayError::Multipart(relay.message().to_string())),
        None => Err(RelayError::Multipart(err.to_string())),
    }
}

pub fn multipart_config(max_image_bytes: usize) -> MultipartFormConfig {
    let limit = max_image_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    MultipartFormConfig::default()
        .total_limit(limit)
        .memory_limit(limit)
        .error_handler(multipart_error)
}

/// Any origin, method and header, answering with a literal `*` origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

pub async fn analyze_image(
    analyzer: web::Data<dyn ImageAnalyzer>,
    form: Result<MultipartForm<AnalyzeForm>, actix_web::Error>,
) -> Result<HttpResponse, RelayError> {
    let request = form_or_empty(form)?.into_request();
    if let Some(name) = request.image.as_ref().and_then(|i| i.file_name.as_deref()) {
        log::debug!("Received upload: {}", name);
    }

    match relay::analyze(analyzer.get_ref(), request).await {
        Ok(envelope) => Ok(HttpResponse::Ok().json(envelope)),
        Err(e) => {
            if e.is_validation() {
                log::warn!("Rejected request: {}", e);
            } else {
                log::error!("Image analysis failed: {}", e);
            }
            Err(e)
        }
    }
}

pub async fn health(analyzer: web::Data<dyn ImageAnalyzer>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "model": analyzer.model(),
    }))
}

/// Mount the relay routes. The analyzer must already be registered as
/// `web::Data<dyn ImageAnalyzer>` on the enclosing app.
pub fn configure(cfg: &mut web::ServiceConfig, settings: &ServerConfig) {
    cfg.app_data(multipart_config(settings.max_image_bytes))
        .route("/health", web::get().to(health))
        .route(&settings.analyze_path, web::post().to(analyze_image));

    if let Some(dir) = &settings.static_dir {
        cfg.service(Files::new("/", dir).index_file("index.html"));
    }
}

pub async fn run(config: Config, analyzer: Arc<dyn ImageAnalyzer>) -> std::io::Result<()> {
    let data: web::Data<dyn ImageAnalyzer> = web::Data::from(analyzer);
    let settings = config.server.clone();

    HttpServer::new(move || {
        let settings = settings.clone();
        App::new()
            .wrap(cors())
            .wrap(middleware::Logger::new("%r %s %b bytes %Dms"))
            .app_data(data.clone())
            .configure(move |cfg| configure(cfg, &settings))
    })
    .bind(config.server.bind_address())?
    .run()
    .await
}
