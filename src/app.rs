use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::graph;
use crate::leads;
use crate::loader::{self, ImportMode};
use crate::sales;
use crate::saving;
use crate::schema::{self, Category};
use crate::store;
use crate::table::{CellValue, Table};
use crate::validate;

const SESSION_COOKIE: &str = "sid";

#[derive(Serialize)]
struct ApiStatus {
    status: String,
    message: Option<String>,
}

fn ok_status() -> Response {
    Json(ApiStatus {
        status: "ok".to_string(),
        message: None,
    })
    .into_response()
}

fn error_status(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(ApiStatus {
            status: "error".to_string(),
            message: Some(message.into()),
        }),
    )
        .into_response()
}

/// Resolves the dashboard session from the `sid` cookie, creating a fresh
/// seeded session (and setting the cookie) when the cookie is absent or
/// points at an expired session.
fn resolve_session(jar: CookieJar) -> (CookieJar, String) {
    let current = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let session_id = store::ensure_session(current.as_deref());
    if current.as_deref() == Some(session_id.as_str()) {
        (jar, session_id)
    } else {
        let cookie = Cookie::build((SESSION_COOKIE, session_id.clone()))
            .path("/")
            .http_only(true)
            .build();
        (jar.add(cookie), session_id)
    }
}

pub async fn run(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(serve_landing))
        .route("/board", get(serve_board))
        .route("/api/tables", get(list_tables))
        .route("/api/table/:data_key", get(get_table))
        .route("/api/table/:data_key/cell", post(update_cell))
        .route("/api/table/:data_key/column", post(add_column))
        .route("/api/import/:data_key", post(import_table))
        .route("/api/export/:data_key/:format", get(export_table))
        .route("/api/kpis/sales", get(sales_kpis))
        .route("/api/kpis/leads", get(leads_kpis))
        .route("/api/analytics/sales", get(sales_analytics))
        .route("/api/analytics/leads", get(leads_analytics))
        .route("/api/chart/:data_key/:view", get(chart))
        .route("/api/category/:category/clear", post(clear_category))
        .route("/api/category/:category/restore", post(restore_category))
        .route("/api/snapshot", get(download_snapshot).post(upload_snapshot))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/landing.html"))
}

async fn serve_board() -> Html<&'static str> {
    Html(include_str!("./static/board.html"))
}

async fn list_tables(jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let catalog = |category: Category| -> Vec<serde_json::Value> {
        schema::table_configs(category)
            .iter()
            .map(|config| {
                let rows = store::table(&session_id, config.data_key)
                    .map(|t| t.len())
                    .unwrap_or(0);
                let description = schema::schema_for(config.data_key)
                    .map(|s| s.description)
                    .unwrap_or("");
                json!({
                    "key": config.key,
                    "title": config.title,
                    "data_key": config.data_key,
                    "description": description,
                    "row_count": rows,
                })
            })
            .collect()
    };

    (
        jar,
        Json(json!({
            "sales": catalog(Category::Sales),
            "leads": catalog(Category::Leads),
        })),
    )
}

#[derive(Deserialize)]
struct TableQuery {
    annotated: Option<bool>,
}

async fn get_table(
    Path(data_key): Path<String>,
    Query(params): Query<TableQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let table = match store::table(&session_id, &data_key) {
        Some(t) => t,
        None => {
            return (
                jar,
                error_status(StatusCode::NOT_FOUND, format!("unknown table '{}'", data_key)),
            );
        }
    };

    let report = validate::validate_table(&table, &data_key);
    let table = if params.annotated.unwrap_or(false) {
        validate::annotate_problems(&table, &data_key)
    } else {
        table
    };

    (
        jar,
        Json(json!({
            "data_key": data_key,
            "table": table.to_json(),
            "report": report,
        }))
        .into_response(),
    )
}

#[derive(Deserialize)]
struct CellUpdate {
    row: usize,
    column: String,
    value: serde_json::Value,
}

async fn update_cell(
    Path(data_key): Path<String>,
    jar: CookieJar,
    Json(payload): Json<CellUpdate>,
) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let mut table = match store::table(&session_id, &data_key) {
        Some(t) => t,
        None => {
            return (
                jar,
                error_status(StatusCode::NOT_FOUND, format!("unknown table '{}'", data_key)),
            );
        }
    };

    let value = CellValue::from_json(&payload.value);
    if let Err(e) = table.set(payload.row, &payload.column, value) {
        return (jar, error_status(StatusCode::BAD_REQUEST, e.to_string()));
    }

    let report = validate::validate_table(&table, &data_key);
    store::save_table(&session_id, &data_key, table);

    (
        jar,
        Json(json!({
            "status": "ok",
            "report": report,
        }))
        .into_response(),
    )
}

#[derive(Deserialize)]
struct ColumnAddition {
    name: String,
    kind: Option<String>,
}

async fn add_column(
    Path(data_key): Path<String>,
    jar: CookieJar,
    Json(payload): Json<ColumnAddition>,
) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    if let Err(e) = schema::validate_column_addition(&data_key, &payload.name) {
        return (jar, error_status(StatusCode::BAD_REQUEST, e));
    }

    let mut table = match store::table(&session_id, &data_key) {
        Some(t) => t,
        None => {
            return (
                jar,
                error_status(StatusCode::NOT_FOUND, format!("unknown table '{}'", data_key)),
            );
        }
    };

    let default = match payload.kind.as_deref() {
        Some("number") => CellValue::Number(0.0),
        Some("bool") => CellValue::Bool(false),
        _ => CellValue::Null,
    };
    if let Err(e) = table.add_column(&payload.name, default) {
        return (jar, error_status(StatusCode::BAD_REQUEST, e.to_string()));
    }
    store::save_table(&session_id, &data_key, table);

    (jar, ok_status())
}

#[derive(Deserialize)]
struct ImportQuery {
    mode: Option<String>,
    dry_run: Option<bool>,
}

async fn import_table(
    Path(data_key): Path<String>,
    Query(params): Query<ImportQuery>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let mode = match params.mode.as_deref() {
        None => ImportMode::Replace,
        Some(raw) => match ImportMode::parse(raw) {
            Some(m) => m,
            None => {
                return (
                    jar,
                    error_status(
                        StatusCode::BAD_REQUEST,
                        format!("unknown import mode '{}'", raw),
                    ),
                );
            }
        },
    };
    let dry_run = params.dry_run.unwrap_or(false);

    let current = match store::table(&session_id, &data_key) {
        Some(t) => t,
        None => {
            return (
                jar,
                error_status(StatusCode::NOT_FOUND, format!("unknown table '{}'", data_key)),
            );
        }
    };

    let mut content = String::new();
    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name() == Some("file") {
            content = match field.text().await {
                Ok(text) => text,
                Err(e) => {
                    return (
                        jar,
                        error_status(StatusCode::BAD_REQUEST, format!("upload failed: {}", e)),
                    );
                }
            };
        }
    }
    if content.is_empty() {
        return (
            jar,
            error_status(StatusCode::BAD_REQUEST, "no file data received"),
        );
    }

    let outcome = match loader::import_csv(&current, &data_key, &content, mode, dry_run) {
        Ok(o) => o,
        Err(e) => {
            return (jar, error_status(StatusCode::BAD_REQUEST, e.to_string()));
        }
    };

    let applied = outcome.applied.is_some();
    if let Some(table) = outcome.applied {
        store::save_table(&session_id, &data_key, table);
    }

    (
        jar,
        Json(json!({
            "status": if outcome.report.ok { "ok" } else { "error" },
            "report": outcome.report,
            "applied": applied,
            "dry_run": dry_run,
            "incoming_rows": outcome.incoming_rows,
            "previous_rows": outcome.previous_rows,
        }))
        .into_response(),
    )
}

async fn export_table(
    Path((data_key, format)): Path<(String, String)>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let table = match store::table(&session_id, &data_key) {
        Some(t) => t,
        None => {
            return (
                jar,
                error_status(StatusCode::NOT_FOUND, format!("unknown table '{}'", data_key)),
            );
        }
    };

    let response = match format.as_str() {
        "csv" => match crate::downloader::to_csv(&table) {
            Ok(body) => file_response(
                "text/csv; charset=utf-8",
                &format!("{}.csv", data_key),
                body.into_bytes(),
            ),
            Err(e) => error_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        },
        "xlsx" => match crate::downloader::to_xlsx(&table) {
            Ok(bytes) => file_response(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                &format!("{}.xlsx", data_key),
                bytes,
            ),
            Err(e) => error_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        },
        other => error_status(
            StatusCode::BAD_REQUEST,
            format!("unknown export format '{}'", other),
        ),
    };

    (jar, response)
}

fn file_response(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(axum::body::Body::from(Bytes::from(body)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn session_table(session_id: &str, data_key: &str) -> Table {
    store::table(session_id, data_key).unwrap_or_else(|| Table::new(Vec::new()))
}

async fn sales_kpis(jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);
    let monthly = session_table(&session_id, "monthly");
    (jar, Json(sales::kpis(&monthly)))
}

async fn leads_kpis(jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);
    let kpis = leads::kpis(
        &session_table(&session_id, "gender"),
        &session_table(&session_id, "vehicle_condition"),
        &session_table(&session_id, "vehicles_visited"),
    );
    (jar, Json(kpis))
}

#[derive(Deserialize)]
struct RoiQuery {
    investment: Option<f64>,
}

async fn sales_analytics(Query(params): Query<RoiQuery>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let monthly = session_table(&session_id, "monthly");
    let states = session_table(&session_id, "states");
    let brands = session_table(&session_id, "brands");
    let stores = session_table(&session_id, "stores");
    let visits = session_table(&session_id, "visits");

    (
        jar,
        Json(json!({
            "kpis": sales::kpis(&monthly),
            "summary": sales::monthly_summary(&monthly),
            "trends": sales::monthly_trends(&monthly),
            "geographic": sales::geographic(&states),
            "brands": sales::brand_performance(&brands),
            "stores": sales::store_performance(&stores),
            "visits": sales::visits_patterns(&visits),
            "roi": sales::roi_metrics(&monthly, params.investment),
            "top_performers": sales::top_performers(&states, &brands, &stores),
        })),
    )
}

async fn leads_analytics(jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let gender = session_table(&session_id, "gender");
    let age_band = session_table(&session_id, "age_band");
    let income_band = session_table(&session_id, "income_band");
    let job_status = session_table(&session_id, "job_status");
    let vehicle_condition = session_table(&session_id, "vehicle_condition");
    let vehicle_age = session_table(&session_id, "vehicle_age");
    let vehicles_visited = session_table(&session_id, "vehicles_visited");

    (
        jar,
        Json(json!({
            "kpis": leads::kpis(&gender, &vehicle_condition, &vehicles_visited),
            "demographics": leads::demographic_summary(&gender, &age_band, &income_band, &job_status),
            "segments": leads::high_value_segments(&job_status, &age_band, &income_band),
            "vehicles": leads::vehicle_preferences(&vehicle_condition, &vehicle_age, &vehicles_visited),
        })),
    )
}

async fn chart(
    Path((data_key, view)): Path<(String, String)>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let spec = match graph::chart_spec(&data_key, &view) {
        Some(s) => s,
        None => {
            return (
                jar,
                error_status(
                    StatusCode::NOT_FOUND,
                    format!("no chart for {}/{}", data_key, view),
                ),
            );
        }
    };
    let table = match store::table(&session_id, &data_key) {
        Some(t) => t,
        None => {
            return (
                jar,
                error_status(StatusCode::NOT_FOUND, format!("unknown table '{}'", data_key)),
            );
        }
    };

    let response = match graph::chart_for_table(&table, &spec) {
        Ok(png) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/png")
            .body(axum::body::Body::from(Bytes::from(png)))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => error_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    (jar, response)
}

async fn clear_category(Path(category): Path<String>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);
    match Category::parse(&category) {
        Some(cat) => {
            store::clear_category(&session_id, cat);
            (jar, ok_status())
        }
        None => (
            jar,
            error_status(
                StatusCode::BAD_REQUEST,
                format!("unknown category '{}'", category),
            ),
        ),
    }
}

async fn restore_category(Path(category): Path<String>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);
    match Category::parse(&category) {
        Some(cat) => {
            store::restore_category(&session_id, cat);
            (jar, ok_status())
        }
        None => (
            jar,
            error_status(
                StatusCode::BAD_REQUEST,
                format!("unknown category '{}'", category),
            ),
        ),
    }
}

async fn download_snapshot(jar: CookieJar) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let serialized = store::with_dashboard(&session_id, |dashboard| {
        let mut buffer = Vec::new();
        saving::serialize_to_memory(dashboard, &mut buffer).map(|_| buffer)
    });

    let response = match serialized {
        Some(Ok(buffer)) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/gzip")
            .header(
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"dashboard.bin.gz\"",
            )
            .body(axum::body::Body::from(Bytes::from(buffer)))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Some(Err(e)) => error_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        None => error_status(StatusCode::NOT_FOUND, "session not found"),
    };

    (jar, response)
}

async fn upload_snapshot(jar: CookieJar, mut multipart: Multipart) -> impl IntoResponse {
    let (jar, session_id) = resolve_session(jar);

    let mut file_data = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name() == Some("snapshot") {
            file_data = field.bytes().await.unwrap_or_default().to_vec();
        }
    }

    if file_data.is_empty() {
        return (
            jar,
            error_status(StatusCode::BAD_REQUEST, "no file data received"),
        );
    }

    match saving::deserialize_from_memory(&file_data) {
        Ok(dashboard) => {
            store::replace_dashboard(&session_id, dashboard);
            (jar, ok_status())
        }
        Err(e) => (
            jar,
            error_status(
                StatusCode::BAD_REQUEST,
                format!("failed to load snapshot: {}", e),
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_session_sets_cookie_for_new_visitors() {
        let (jar, session_id) = resolve_session(CookieJar::new());
        assert!(!session_id.is_empty());
        assert_eq!(jar.get(SESSION_COOKIE).unwrap().value(), session_id);
    }

    #[test]
    fn resolve_session_keeps_a_live_session() {
        let (jar, first) = resolve_session(CookieJar::new());
        let (_, second) = resolve_session(jar);
        assert_eq!(first, second);
    }

    #[test]
    fn stale_cookie_gets_a_fresh_session() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "no-such-session"));
        let (jar, session_id) = resolve_session(jar);
        assert_ne!(session_id, "no-such-session");
        assert_eq!(jar.get(SESSION_COOKIE).unwrap().value(), session_id);
    }
}
