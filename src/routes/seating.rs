use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use rand::Rng;
use validator::Validate;
use crate::core::{check_assignment, PairHistory, SeatingEngine, SeatingError};
use crate::models::{
    AppendHistoryRequest, ErrorResponse, ExportAssignmentRequest, ExportQuery,
    GenerateSeatingRequest, GenerateSeatingResponse, HealthResponse, ImportAttendeesResponse,
};
use crate::services::{export, history, loader, ExportError, HistoryError, LoaderError};

/// Application state shared across all handlers
///
/// Holds only the engine tuning; every request brings its own attendees,
/// tables and history.
#[derive(Clone)]
pub struct AppState {
    pub engine: SeatingEngine,
}

/// Configure all seating-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/seating/generate", web::post().to(generate_seating))
        .route("/seating/export", web::post().to(export_assignment))
        .route("/attendees/import", web::post().to(import_attendees))
        .route("/history/append", web::post().to(append_history));
}

fn error_response(status: StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn seating_error_response(err: &SeatingError) -> HttpResponse {
    match err {
        SeatingError::InfeasibleConfiguration { .. }
        | SeatingError::HeadTableOverflow { .. }
        | SeatingError::BelowMinimumSeats { .. } => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Infeasible configuration",
            err.to_string(),
        ),
        SeatingError::MalformedInput(_) => {
            error_response(StatusCode::BAD_REQUEST, "Malformed input", err.to_string())
        }
    }
}

fn loader_error_response(err: &LoaderError) -> HttpResponse {
    match err {
        LoaderError::IoError(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read attendees",
            err.to_string(),
        ),
        _ => error_response(StatusCode::BAD_REQUEST, "Malformed input", err.to_string()),
    }
}

fn history_error_response(err: &HistoryError) -> HttpResponse {
    match err {
        HistoryError::IoError(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to write history",
            err.to_string(),
        ),
        _ => error_response(StatusCode::BAD_REQUEST, "Malformed history", err.to_string()),
    }
}

fn export_error_response(err: &ExportError) -> HttpResponse {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed", err.to_string())
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Generate seating endpoint
///
/// POST /api/v1/seating/generate
///
/// Request body:
/// ```json
/// {
///   "attendees": [
///     {"id": "a1", "name": "Ann", "attributes": {"department": "Sales"}, "headTable": false}
///   ],
///   "tables": {"capacities": [6, 6], "diversityWeight": 1.0, "minSeats": 4},
///   "history": [{"date": "2024-03-01", "seats": [{"attendeeId": "string", "table": 1}]}],
///   "seed": 42
/// }
/// ```
///
/// Posting the same body with a new (or no) seed is "regenerate".
async fn generate_seating(
    state: web::Data<AppState>,
    req: web::Json<GenerateSeatingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for generate request: field_errors={:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let seed = req.seed.unwrap_or_else(|| rand::rng().random());

    tracing::info!(
        "Generating seating for {} attendees at {} tables (seed {})",
        req.attendees.len(),
        req.tables.table_count(),
        seed
    );

    match state
        .engine
        .assign_seeded(&req.attendees, &req.tables, &req.history, seed)
    {
        Ok(assignment) => {
            tracing::info!(
                "Seated {} attendees with penalty {:.3}",
                assignment.seated_count(),
                assignment.penalty
            );

            HttpResponse::Ok().json(GenerateSeatingResponse {
                arrangement_id: uuid::Uuid::new_v4().to_string(),
                seed,
                attendee_count: assignment.seated_count(),
                seat_count: assignment.seat_count(),
                assignment,
            })
        }
        Err(e) => {
            tracing::warn!("Seating request rejected: {}", e);
            seating_error_response(&e)
        }
    }
}

/// Attendee import endpoint
///
/// POST /api/v1/attendees/import
///
/// Body is the attendee sheet as CSV (`name` column required).
async fn import_attendees(body: String) -> impl Responder {
    match loader::parse_attendees(body.as_bytes()) {
        Ok(attendees) => {
            tracing::info!("Imported {} attendees", attendees.len());
            HttpResponse::Ok().json(ImportAttendeesResponse {
                count: attendees.len(),
                attendees,
            })
        }
        Err(e) => {
            tracing::info!("Attendee import rejected: {}", e);
            loader_error_response(&e)
        }
    }
}

/// Approve an arrangement into history
///
/// POST /api/v1/history/append
///
/// Request body:
/// ```json
/// {
///   "historyCsv": "Name,01/15/2024\nAnn,2\n",
///   "assignment": { ... },
///   "eventDate": "2024-03-01"
/// }
/// ```
///
/// Returns the updated history sheet as CSV.
async fn append_history(req: web::Json<AppendHistoryRequest>) -> impl Responder {
    if let Err(errors) = check_assignment(&req.assignment) {
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return error_response(StatusCode::BAD_REQUEST, "Invalid assignment", message);
    }

    let records = match req.history_csv.as_deref() {
        Some(csv) if !csv.trim().is_empty() => match history::parse_history(csv.as_bytes()) {
            Ok(records) => records,
            Err(e) => return history_error_response(&e),
        },
        _ => Vec::new(),
    };

    let date = req
        .event_date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let records = history::append_assignment(records, &req.assignment, date);

    let mut out = Vec::new();
    if let Err(e) = history::write_history(&records, &mut out) {
        tracing::error!("Failed to write history sheet: {}", e);
        return history_error_response(&e);
    }

    tracing::info!("Appended event {} to history ({} events)", date, records.len());

    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", "attachment; filename=\"seating_history.csv\""))
        .body(out)
}

/// Export endpoint
///
/// POST /api/v1/seating/export?format=markdown|csv
///
/// Request body:
/// ```json
/// {
///   "assignment": { ... },
///   "history": [{"date": "2024-03-01", "seats": [{"attendeeId": "string", "table": 1}]}]
/// }
/// ```
async fn export_assignment(
    state: web::Data<AppState>,
    query: web::Query<ExportQuery>,
    req: web::Json<ExportAssignmentRequest>,
) -> impl Responder {
    let format = query.format;
    let generated_at = chrono::Local::now().naive_local();
    let pair_history = (!req.history.is_empty())
        .then(|| PairHistory::from_records(&req.history, state.engine.model().memory_events));

    match export::render(&req.assignment, format, generated_at, pair_history.as_ref()) {
        Ok(document) => HttpResponse::Ok()
            .content_type(format.content_type())
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", format.file_name()),
            ))
            .body(document),
        Err(e) => {
            tracing::error!("Failed to export assignment: {}", e);
            export_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use crate::models::{Assignment, Attendee, HistoryRecord, SeatedTable, TableConfig};
    use chrono::NaiveDate;
    use serde_json::json;

    fn app_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            engine: SeatingEngine::with_default_model(),
        })
    }

    fn roster(count: usize) -> Vec<Attendee> {
        (0..count)
            .map(|i| {
                let team = if i % 2 == 0 { "A" } else { "B" };
                Attendee::named(format!("Guest{i}")).with_attribute("team", team)
            })
            .collect()
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.status, "healthy");
    }

    #[actix_web::test]
    async fn test_generate_is_reproducible_with_seed() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body = json!({
            "attendees": roster(12),
            "tables": TableConfig::uniform(2, 6),
            "seed": 7
        });

        let first: GenerateSeatingResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/seating/generate").set_json(&body).to_request(),
        )
        .await;
        let second: GenerateSeatingResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/seating/generate").set_json(&body).to_request(),
        )
        .await;

        assert_eq!(first.seed, 7);
        assert_eq!(first.attendee_count, 12);
        assert_eq!(first.seat_count, 12);
        assert_eq!(first.assignment, second.assignment);
        assert_ne!(first.arrangement_id, second.arrangement_id);
    }

    #[actix_web::test]
    async fn test_generate_infeasible_is_422() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body = json!({
            "attendees": roster(10),
            "tables": {"capacities": [8]}
        });

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/seating/generate").set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(err.status_code, 422);
        assert!(err.message.contains("10 attendees"));
    }

    #[actix_web::test]
    async fn test_generate_rejects_empty_roster() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body = json!({"attendees": [], "tables": {"capacities": [4]}});

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/seating/generate").set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_import_attendees() {
        let app = test::init_service(App::new().configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/attendees/import")
            .insert_header(("Content-Type", "text/csv"))
            .set_payload("name,department\nAnn,Sales\nBob,Legal\n")
            .to_request();
        let resp: ImportAttendeesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.count, 2);
        assert_eq!(resp.attendees[1].attribute("department"), Some("Legal"));

        let req = test::TestRequest::post()
            .uri("/attendees/import")
            .insert_header(("Content-Type", "text/csv"))
            .set_payload("department\nSales\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_append_history_returns_sheet() {
        let app = test::init_service(App::new().configure(configure)).await;
        let assignment = SeatingEngine::with_default_model()
            .assign_seeded(&roster(4), &TableConfig::uniform(2, 2), &[], 3)
            .unwrap();

        let body = json!({
            "historyCsv": "Name,01/15/2024\nGuest0,2\n",
            "assignment": assignment,
            "eventDate": "2024-02-01"
        });
        let req = test::TestRequest::post().uri("/history/append").set_json(&body).to_request();
        let bytes = test::call_and_read_body(&app, req).await;
        let sheet = String::from_utf8(bytes.to_vec()).unwrap();

        let lines: Vec<&str> = sheet.lines().collect();
        assert_eq!(lines[0], "Name,01/15/2024,02/01/2024");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("Guest0,2,"));
    }

    #[actix_web::test]
    async fn test_append_history_rejects_duplicate_seating() {
        let app = test::init_service(App::new().configure(configure)).await;
        let guest = Attendee::named("Ann");
        let assignment = Assignment {
            tables: vec![
                SeatedTable {
                    table: 1,
                    capacity: 2,
                    attendees: vec![guest.clone()],
                },
                SeatedTable {
                    table: 2,
                    capacity: 2,
                    attendees: vec![guest],
                },
            ],
            penalty: 0.0,
            seed: None,
        };

        let req = test::TestRequest::post()
            .uri("/history/append")
            .set_json(json!({ "assignment": assignment }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_generate_engine_rejection_is_400() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body = json!({
            "attendees": roster(3),
            "tables": {"capacities": [4, 0]}
        });

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/seating/generate").set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let err: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(err.error, "Malformed input");
        assert!(err.message.contains("table 2 has zero capacity"));
    }

    #[actix_web::test]
    async fn test_generate_below_minimum_is_422() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let body = json!({
            "attendees": roster(5),
            "tables": {"capacities": [4, 4, 4], "minSeats": 2}
        });

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/seating/generate").set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_export_formats() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let assignment = SeatingEngine::with_default_model()
            .assign_seeded(&roster(3), &TableConfig::uniform(1, 4), &[], 1)
            .unwrap();

        let req = test::TestRequest::post()
            .uri("/seating/export?format=csv")
            .set_json(json!({ "assignment": assignment }))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(body.starts_with(b"table,name,id,head_table,team"));

        let req = test::TestRequest::post()
            .uri("/seating/export")
            .set_json(json!({ "assignment": assignment }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"# Seating Arrangement"));
    }

    #[actix_web::test]
    async fn test_export_markdown_lists_repeat_pairings() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure)).await;
        let assignment = Assignment {
            tables: vec![SeatedTable {
                table: 1,
                capacity: 2,
                attendees: vec![Attendee::named("Ann"), Attendee::named("Bob")],
            }],
            penalty: 0.0,
            seed: None,
        };
        let history = vec![HistoryRecord::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .with_seat("Ann", 3)
            .with_seat("Bob", 3)];

        let req = test::TestRequest::post()
            .uri("/seating/export?format=markdown")
            .set_json(json!({ "assignment": assignment, "history": history }))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let markdown = String::from_utf8(body.to_vec()).unwrap();

        assert!(markdown.contains("- Ann and Bob sat together: 1 event ago"));
    }
}
