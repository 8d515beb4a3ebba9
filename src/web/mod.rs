// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web dashboard and JSON API

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::advisor::add_progress_photo;
use crate::analysis::{analyze_zones, decode_image, encode_png, LightAnalysis, LightClassifier};
use crate::config::AppConfig;
use crate::db::{Database, DbStats, PlantRecord};
use crate::PlantPalError;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
}

/// Error body returned by API handlers
pub struct ApiError(PlantPalError);

impl From<PlantPalError> for ApiError {
    fn from(e: PlantPalError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PlantPalError::InvalidImage(_) | PlantPalError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlantPalError::Validation(_) => StatusCode::BAD_REQUEST,
            PlantPalError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(index_page))
        // API endpoints
        .route("/api/stats", get(api_get_stats))
        .route("/api/plants", get(api_get_plants))
        .route("/api/plants/due", get(api_get_due))
        .route("/api/plants/:id", get(api_get_plant))
        .route("/api/plants/:id/images", get(api_get_images).post(api_add_image))
        .route("/api/plants/:id/watered", post(api_mark_watered))
        .route("/api/analyze", post(api_analyze))
        .route("/api/analyze/annotated", post(api_analyze_annotated))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Bytes of the `image` field, or of the first field when none is named so
async fn read_image(mut multipart: Multipart) -> ApiResult<Vec<u8>> {
    let mut fallback = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PlantPalError::Validation(format!("bad multipart body: {}", e)))?
    {
        let is_image = field.name() == Some("image");
        let data = field
            .bytes()
            .await
            .map_err(|e| PlantPalError::Validation(format!("bad multipart field: {}", e)))?;
        if is_image {
            return Ok(data.to_vec());
        }
        if fallback.is_none() {
            fallback = Some(data.to_vec());
        }
    }

    fallback.ok_or_else(|| PlantPalError::Validation("no image in upload".to_string()).into())
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let plants = state.db.list_plants().unwrap_or_default();
    let stats = state.db.get_stats().unwrap_or(DbStats { plant_count: 0, image_count: 0 });
    Html(render_index(&plants, &stats, today()))
}

// === API Handlers ===

async fn api_get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DbStats>> {
    Ok(Json(state.db.get_stats()?))
}

async fn api_get_plants(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<PlantRecord>>> {
    Ok(Json(state.db.list_plants()?))
}

async fn api_get_due(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<PlantRecord>>> {
    Ok(Json(state.db.plants_due(today())?))
}

async fn api_get_plant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PlantRecord>> {
    let plant = state
        .db
        .get_plant(id)?
        .ok_or_else(|| PlantPalError::NotFound(format!("plant {}", id)))?;
    Ok(Json(plant))
}

#[derive(Serialize)]
struct ImageResponse {
    id: i64,
    date: NaiveDateTime,
    data_base64: String,
}

async fn api_get_images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ImageResponse>>> {
    if state.db.get_plant(id)?.is_none() {
        return Err(PlantPalError::NotFound(format!("plant {}", id)).into());
    }
    let images = state
        .db
        .images_for_plant(id)?
        .into_iter()
        .map(|img| ImageResponse {
            id: img.id,
            date: img.date,
            data_base64: general_purpose::STANDARD.encode(&img.image_data),
        })
        .collect();
    Ok(Json(images))
}

async fn api_add_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let data = read_image(multipart).await?;
    let image_id = add_progress_photo(&state.db, id, &data, now())?;
    info!("Stored progress photo {} for plant {}", image_id, id);
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": image_id }))))
}

async fn api_mark_watered(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let next = state.db.record_watering(id, today())?;
    Ok(Json(serde_json::json!({ "id": id, "next_watering": next })))
}

/// Decoding and pixel passes run off the async workers
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(PlantPalError::from)?;
    Ok(result?)
}

async fn api_analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<LightAnalysis>> {
    let data = read_image(multipart).await?;
    let classifier = LightClassifier::from_config(&state.config.analysis);

    let analysis = run_blocking(move || {
        let img = decode_image(&data)?;
        LightAnalysis::run(&img, &classifier)
    })
    .await?;

    Ok(Json(analysis))
}

async fn api_analyze_annotated(multipart: Multipart) -> ApiResult<Response> {
    let data = read_image(multipart).await?;

    let (zone, png) = run_blocking(move || {
        let img = decode_image(&data)?;
        let zones = analyze_zones(&img)?;
        Ok((zones.best().to_string(), encode_png(&zones.annotate(&img))?))
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::HeaderName::from_static("x-placement-zone"), zone),
        ],
        png,
    )
        .into_response())
}

// === Template Rendering ===

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn base_template(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - PlantPal</title>
    <style>
        :root {{
            --bg-primary: #14231a;
            --bg-card: #1e3a29;
            --text-primary: #e8f0e8;
            --text-secondary: #a0b8a0;
            --accent: #6fcf7f;
            --overdue: #e9a045;
            --border: #2a4a36;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }}
        .container {{ max-width: 1100px; margin: 0 auto; padding: 20px; }}
        h1 {{ color: var(--accent); margin-bottom: 20px; }}
        .card {{
            background: var(--bg-card);
            border-radius: 12px;
            padding: 20px;
            margin-bottom: 20px;
            max-height: 500px;
            overflow-y: auto;
        }}
        .stats-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 20px;
            margin-bottom: 30px;
        }}
        .stat-card {{
            background: var(--bg-card);
            border-radius: 12px;
            padding: 20px;
            text-align: center;
        }}
        .stat-card .number {{ font-size: 2.5em; font-weight: bold; color: var(--accent); }}
        .stat-card .label {{ color: var(--text-secondary); font-size: 0.9em; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid var(--border); }}
        tr.due td {{ color: var(--overdue); font-weight: bold; }}
    </style>
</head>
<body>
    <main class="container">
        {}
    </main>
</body>
</html>"#, title, content)
}

fn render_plants_table(plants: &[PlantRecord], today: NaiveDate) -> String {
    if plants.is_empty() {
        return "<p>No plants stored yet.</p>".to_string();
    }

    let rows: String = plants
        .iter()
        .map(|p| {
            let class = if p.next_watering <= today { "due" } else { "" };
            format!(
                r#"
                <tr class="{}">
                    <td>{}</td>
                    <td>{}</td>
                    <td>every {} days</td>
                    <td>{} ml</td>
                    <td>{}</td>
                </tr>
            "#,
                class,
                escape_html(&p.name),
                escape_html(&p.health_status),
                p.watering_interval_days,
                p.watering_amount_ml,
                p.next_watering.format("%Y-%m-%d"),
            )
        })
        .collect();

    format!(
        r#"
        <table>
            <tr>
                <th>Plant</th>
                <th>Health</th>
                <th>Water</th>
                <th>Amount</th>
                <th>Next watering</th>
            </tr>
            {}
        </table>
    "#,
        rows
    )
}

fn render_index(plants: &[PlantRecord], stats: &DbStats, today: NaiveDate) -> String {
    let due_count = plants.iter().filter(|p| p.next_watering <= today).count();

    let content = format!(
        r#"
        <h1>Stored Plants &amp; Watering Schedule</h1>
        <div class="stats-grid">
            <div class="stat-card">
                <div class="number">{}</div>
                <div class="label">Plants</div>
            </div>
            <div class="stat-card">
                <div class="number">{}</div>
                <div class="label">Due today</div>
            </div>
            <div class="stat-card">
                <div class="number">{}</div>
                <div class="label">Progress photos</div>
            </div>
        </div>
        <div class="card">
            {}
        </div>
    "#,
        stats.plant_count,
        due_count,
        stats.image_count,
        render_plants_table(plants, today)
    );

    base_template("Dashboard", &content)
}

/// Start the web server with config and database
pub async fn start_server(config: AppConfig, db: Database) -> crate::Result<()> {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Web UI available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| PlantPalError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewPlant;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use image::{Rgb, RgbImage};
    use tower::ServiceExt;

    const BOUNDARY: &str = "plantpal-test-boundary";

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            db: Database::in_memory().unwrap(),
            config: AppConfig::default(),
        })
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x >= width / 3 * 2 { Rgb([255, 255, 255]) } else { Rgb([20, 20, 20]) }
        });
        encode_png(&img).unwrap()
    }

    fn multipart_request(uri: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"image\"; filename=\"room.png\"\r\n");
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn seed_plant(state: &AppState, next: NaiveDate) -> i64 {
        state
            .db
            .insert_plant(
                &NewPlant {
                    name: "<Monstera>".to_string(),
                    health_status: "Healthy".to_string(),
                    watering_interval_days: 7,
                    watering_amount_ml: 500,
                    next_watering: next,
                },
                now(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let app = create_router(state());
        let response = app.oneshot(multipart_request("/api/analyze", &png(30, 30))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["zone"], "RIGHT-TOP");
        assert_eq!(body["zone_scores"].as_array().unwrap().len(), 9);
        assert_eq!(body["temperature"]["temperature"], "neutral");
        assert_eq!(body["brightness"]["level"], "Low");
    }

    #[tokio::test]
    async fn test_analyze_rejects_tiny_image() {
        let app = create_router(state());
        let response = app.oneshot(multipart_request("/api/analyze", &png(2, 2))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid image"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_garbage() {
        let app = create_router(state());
        let response = app.oneshot(multipart_request("/api/analyze", b"nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_analyze_without_image_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(format!("--{}--\r\n", BOUNDARY)))
            .unwrap();

        let app = create_router(state());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn test_annotated_endpoint_returns_png() {
        let app = create_router(state());
        let response = app
            .oneshot(multipart_request("/api/analyze/annotated", &png(60, 45)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()["x-placement-zone"], "RIGHT-TOP");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (60, 45));
    }

    #[tokio::test]
    async fn test_plant_images_roundtrip() {
        let state = state();
        let id = seed_plant(&state, today());

        let app = create_router(state.clone());
        let response = app
            .oneshot(multipart_request(&format!("/api/plants/{}/images", id), &png(9, 9)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let app = create_router(state);
        let response = app.oneshot(get(&format!("/api/plants/{}/images", id))).await.unwrap();
        let body = json_body(response).await;
        let images = body.as_array().unwrap();
        assert_eq!(images.len(), 1);
        let data = general_purpose::STANDARD
            .decode(images[0]["data_base64"].as_str().unwrap())
            .unwrap();
        assert_eq!(data, png(9, 9));
    }

    #[tokio::test]
    async fn test_unknown_plant_is_404() {
        let app = create_router(state());
        let response = app.oneshot(get("/api/plants/77")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let app = create_router(state());
        let response = app
            .oneshot(multipart_request("/api/plants/77/images", &png(9, 9)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_due_and_watered() {
        let state = state();
        let id = seed_plant(&state, today());

        let app = create_router(state.clone());
        let body = json_body(app.oneshot(get("/api/plants/due")).await.unwrap()).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let app = create_router(state.clone());
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/plants/{}/watered", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let app = create_router(state);
        let body = json_body(app.oneshot(get("/api/plants/due")).await.unwrap()).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_escapes_names() {
        let state = state();
        seed_plant(&state, today());

        let app = create_router(state);
        let response = app.oneshot(get("/")).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("&lt;Monstera&gt;"));
        assert!(!html.contains("<Monstera>"));
        assert!(html.contains(r#"<tr class="due">"#));
    }
}
