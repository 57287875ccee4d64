use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::api::ApiClient;
use crate::config::Config;
use crate::downloader;
use crate::error::AppError;
use crate::format;
use crate::history::{self, LookupState, PrintRecord};
use crate::in_use::Expansion;
use crate::inventory::{self, FilterOptions, FilterState, Summary};
use crate::load::LoadState;
use crate::mailer::Mailer;
use crate::models::{InUseReel, Reel};
use crate::session::{self, AdminSession, SessionStore};
use crate::site;
use crate::sticker;
use crate::templates;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub sessions: SessionStore,
    pub mailer: Option<Arc<Mailer>>,
    pub offset: FixedOffset,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let api = ApiClient::new(&config)?;
        let offset = config.offset()?;
        let mailer = match &config.smtp {
            Some(smtp) => Some(Arc::new(Mailer::new(smtp)?)),
            None => None,
        };
        Ok(AppState {
            config,
            api,
            sessions: SessionStore::new(),
            mailer,
            offset,
        })
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(site::serve_home))
        .route("/about", get(site::serve_about))
        .route("/industries", get(site::serve_industries))
        .route("/contact", get(site::serve_contact).post(site::handle_contact))
        .route("/login", get(session::serve_login_page).post(session::handle_login))
        .route("/logout", post(session::handle_logout))
        .route("/admin", get(serve_dashboard))
        .route("/admin/reels/stock", get(serve_stock))
        .route("/admin/reels/stock/export", get(export_stock))
        .route("/admin/reels/in-use", get(serve_in_use))
        .route("/admin/reels/usage", get(serve_usage_idle))
        .route("/admin/reels/usage/search", get(search_usage))
        .route("/admin/reels/usage/:barcode", get(serve_usage))
        .route("/admin/reels/usage/:barcode/stickers", get(print_stickers))
        .route("/admin/manage/:entity", get(admin::serve_list))
        .route("/admin/manage/:entity/new", get(admin::serve_new).post(admin::handle_new))
        .route(
            "/admin/manage/:entity/:id/edit",
            get(admin::serve_edit).post(admin::handle_edit),
        )
        .with_state(state)
}

/// Start the web server
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    log::info!("Using remote API at {}", state.api.base_url());

    let app = router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Query string (without the leading `?`) that reproduces `filters`
fn stock_query(filters: &FilterState) -> String {
    let pairs = [
        ("barcode", &filters.barcode),
        ("supplier", &filters.supplier),
        ("status", &filters.status),
        ("gsm", &filters.gsm),
        ("bf", &filters.bf),
        ("deckle", &filters.deckle),
        ("unit", &filters.unit),
        ("paperType", &filters.paper_type),
        ("created", &filters.created),
    ];
    pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Admin landing page with the signed-in profile and links to every screen
async fn serve_dashboard(session: AdminSession) -> Result<Html<String>, AppError> {
    let admin = session.credential.admin();
    templates::render(
        "dashboard",
        &json!({
            "title": "Dashboard",
            "admin_name": session.credential.display_name(),
            "admin_email": admin.email,
            "admin_role": admin.role,
            "entities": admin::entity_links(),
        }),
    )
    .map(Html)
}

// =============================================================================
// Reel stock
// =============================================================================

#[derive(Serialize)]
struct SelectOption {
    value: String,
    selected: bool,
}

#[derive(Serialize)]
struct Select {
    name: &'static str,
    label: &'static str,
    options: Vec<SelectOption>,
}

#[derive(Serialize)]
struct StockRow {
    position: usize,
    barcode: String,
    barcode_path: String,
    reel_no: String,
    gsm: String,
    bf: String,
    deckle: String,
    paper_type: String,
    supplier: String,
    unit: String,
    initial_weight: String,
    current_weight: String,
    previous_weight: String,
    status: String,
    created: String,
}

fn selects(options: &FilterOptions, filters: &FilterState) -> Vec<Select> {
    let build = |name, label, values: &[String], current: &str| Select {
        name,
        label,
        options: values
            .iter()
            .map(|v| SelectOption {
                value: v.clone(),
                selected: v == current,
            })
            .collect(),
    };
    vec![
        build("status", "Status", &options.status, &filters.status),
        build("gsm", "GSM", &options.gsm, &filters.gsm),
        build("bf", "BF", &options.bf, &filters.bf),
        build("deckle", "Deckle", &options.deckle, &filters.deckle),
        build("unit", "Unit", &options.unit, &filters.unit),
        build("paperType", "Paper Type", &options.paper_type, &filters.paper_type),
        build("created", "Created", &options.created, &filters.created),
    ]
}

fn stock_row(position: usize, reel: &Reel, offset: &FixedOffset) -> StockRow {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let barcode = text(&reel.barcode_id);
    StockRow {
        position,
        barcode_path: path_segment(&barcode),
        barcode,
        reel_no: text(&reel.reel_no),
        gsm: text(&reel.gsm),
        bf: text(&reel.bf),
        deckle: text(&reel.deckle),
        paper_type: text(&reel.paper_type),
        supplier: text(&reel.supplier_name),
        unit: text(&reel.unit),
        initial_weight: format::weight(reel.initial_weight),
        current_weight: format::weight(reel.current_weight),
        previous_weight: format::weight(reel.previous_weight),
        status: reel.status_label(),
        created: format::long_date_time(reel.created_at.as_deref(), offset),
    }
}

/// Fetch the full stock snapshot in display order
async fn load_stock(state: &AppState, session: &AdminSession) -> Result<Vec<Reel>, AppError> {
    let mut reels = state.api.reel_stocks(&session.credential).await?;
    inventory::sort_for_display(&mut reels);
    Ok(reels)
}

/// Renders the reel stock table.
///
/// # Arguments
/// * `session` - The signed-in admin
/// * `filters` - Active filters, one query parameter per field
///
/// # Returns
/// * `Result<Response, AppError>` - The stock page; options always come from
///   the full snapshot, rows and totals from the filtered set. A failed fetch
///   renders the error banner with status 502
async fn serve_stock(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Query(filters): Query<FilterState>,
) -> Result<Response, AppError> {
    let load = LoadState::from_result(load_stock(&state, &session).await);

    let snapshot: &[Reel] = load.loaded().map(Vec::as_slice).unwrap_or(&[]);
    let options = FilterOptions::from_snapshot(snapshot);
    let filtered = inventory::apply(snapshot, &filters);
    let summary = Summary::of(&filtered);
    let rows: Vec<StockRow> = filtered
        .iter()
        .enumerate()
        .map(|(i, r)| stock_row(i + 1, r, &state.offset))
        .collect();

    let query = stock_query(&filters);
    let export_href = if query.is_empty() {
        "/admin/reels/stock/export".to_string()
    } else {
        format!("/admin/reels/stock/export?{}", query)
    };

    let body = templates::render(
        "stock",
        &json!({
            "title": "Reels in stock",
            "admin_name": session.credential.display_name(),
            "filters": filters,
            "selects": selects(&options, &filters),
            "banner": load.banner(),
            "loaded": load.loaded().is_some(),
            "rows": rows,
            "count": summary.count,
            "total": summary.total_display(),
            "export_href": export_href,
        }),
    )?;

    let status = if load.error().is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Html(body)).into_response())
}

/// Downloads the filtered stock as `ReelsInStock.xlsx`.
///
/// # Arguments
/// * `filters` - Same filters as the stock page
///
/// # Returns
/// * `Result<Response, AppError>` - The workbook as an attachment
///
/// # Errors
/// * Returns an error if the remote read fails or the workbook cannot be built
async fn export_stock(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Query(filters): Query<FilterState>,
) -> Result<Response, AppError> {
    let reels = load_stock(&state, &session).await?;
    let filtered = inventory::apply(&reels, &filters);
    let bytes = downloader::to_xlsx(&filtered)?;
    log::info!("exported {} of {} reels", filtered.len(), reels.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", downloader::STOCK_EXPORT_FILE),
            ),
        ],
        bytes,
    )
        .into_response())
}

// =============================================================================
// Reels in use
// =============================================================================

#[derive(Deserialize)]
struct InUseQuery {
    open: Option<String>,
}

#[derive(Serialize)]
struct UsageRow {
    position: usize,
    active: bool,
    #[serde(flatten)]
    record: PrintRecord,
}

#[derive(Serialize)]
struct InUseRow {
    barcode: String,
    reel_no: String,
    gsm: String,
    bf: String,
    deckle: String,
    current_weight: String,
    status: String,
    expanded: bool,
    toggle_href: String,
    usage_count: usize,
    usages: Vec<UsageRow>,
}

fn usage_rows(records: impl Iterator<Item = PrintRecord>) -> Vec<UsageRow> {
    records
        .enumerate()
        .map(|(i, record)| UsageRow {
            position: i + 1,
            active: record.date_out == format::ACTIVE,
            record,
        })
        .collect()
}

fn in_use_href(expansion: &Expansion) -> String {
    match expansion.open() {
        Some(barcode) => format!("/admin/reels/in-use?open={}", path_segment(barcode)),
        None => "/admin/reels/in-use".to_string(),
    }
}

fn in_use_row(item: &InUseReel, expansion: &Expansion, offset: &FixedOffset) -> InUseRow {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let reel = &item.reel;
    let barcode = text(&reel.barcode_id);
    let expanded = expansion.is_expanded(&barcode);
    InUseRow {
        toggle_href: in_use_href(&expansion.toggled(&barcode)),
        reel_no: text(&reel.reel_no),
        gsm: text(&reel.gsm),
        bf: text(&reel.bf),
        deckle: text(&reel.deckle),
        current_weight: format::weight(reel.current_weight),
        status: reel.status_label(),
        expanded,
        usage_count: item.order_usages.len(),
        usages: if expanded {
            usage_rows(item.order_usages.iter().map(|e| PrintRecord::from_event(e, offset)))
        } else {
            Vec::new()
        },
        barcode,
    }
}

/// Reels currently in use, with at most one row expanded to its usage entries
///
/// # Arguments
/// * `query` - `open` names the expanded barcode, if any
async fn serve_in_use(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Query(query): Query<InUseQuery>,
) -> Result<Response, AppError> {
    let load = LoadState::from_result(state.api.in_use_reels(&session.credential).await);
    let expansion = Expansion::new(query.open);

    let rows: Vec<InUseRow> = load
        .loaded()
        .map(|reels| {
            reels
                .iter()
                .map(|r| in_use_row(r, &expansion, &state.offset))
                .collect()
        })
        .unwrap_or_default();

    let body = templates::render(
        "in_use",
        &json!({
            "title": "Reels in use",
            "admin_name": session.credential.display_name(),
            "banner": load.banner(),
            "loaded": load.loaded().is_some(),
            "rows": rows,
        }),
    )?;

    let status = if load.error().is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Html(body)).into_response())
}

// =============================================================================
// Usage history and stickers
// =============================================================================

#[derive(Deserialize)]
struct UsageSearch {
    #[serde(default)]
    barcode: String,
}

/// Renders the usage history page for `lookup`.
///
/// # Arguments
/// * `lookup` - The session's lookup state to show
/// * `input` - Text to keep in the search box
/// * `validation` - Message for rejected input, which sets status 400
///
/// # Returns
/// * `Result<Response, AppError>` - The page, with status 502 for a failed lookup
fn render_usage(
    session: &AdminSession,
    state: &AppState,
    lookup: &LookupState,
    input: &str,
    validation: Option<String>,
) -> Result<Response, AppError> {
    let (loading, mut error) = match lookup {
        LookupState::Loading { .. } => (true, None),
        LookupState::Failed { message, .. } => (false, Some(message.clone())),
        _ => (false, None),
    };
    if validation.is_some() {
        error = validation.clone();
    }

    let (loaded, barcode, records) = match lookup {
        LookupState::Loaded { barcode, history } => (
            true,
            barcode.clone(),
            usage_rows(history::print_records(history, &state.offset).into_iter()),
        ),
        _ => (false, String::new(), Vec::new()),
    };
    let pending = match lookup {
        LookupState::Loading { barcode } => Some(barcode.clone()),
        _ => None,
    };

    let body = templates::render(
        "usage",
        &json!({
            "title": "Reel usage history",
            "admin_name": session.credential.display_name(),
            "barcode_input": input,
            "banner": { "loading": loading, "error": error },
            "pending_path": pending.as_deref().map(path_segment),
            "pending": pending,
            "loaded": loaded,
            "barcode": barcode,
            "records": records,
            "can_print": lookup.can_print(),
            "stickers_href": format!("/admin/reels/usage/{}/stickers", path_segment(&barcode)),
            "window_width": sticker::window_px(state.config.label.width_mm),
            "window_height": sticker::window_px(state.config.label.height_mm),
        }),
    )?;

    let status = if validation.is_some() {
        StatusCode::BAD_REQUEST
    } else if matches!(lookup, LookupState::Failed { .. }) {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Html(body)).into_response())
}

/// Issue a lookup for `raw` through the session's state machine
///
/// Returns the session's lookup state after this request's result has been
/// offered; a response superseded by a newer lookup is not committed.
async fn run_lookup(
    state: &AppState,
    session: &AdminSession,
    raw: &str,
) -> Result<LookupState, AppError> {
    let ticket = state
        .sessions
        .with_lookup(&session.id, |lookup| lookup.begin(raw))
        .ok_or(AppError::MissingCredential)??;

    let result = state
        .api
        .reel_usage(&session.credential, ticket.barcode())
        .await;

    state
        .sessions
        .with_lookup(&session.id, |lookup| {
            lookup.commit(&ticket, result);
            lookup.state().clone()
        })
        .ok_or(AppError::MissingCredential)
}

async fn serve_usage_idle(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    render_usage(&session, &state, &LookupState::Idle, "", None)
}

/// Validates the searched barcode and redirects to its history page
async fn search_usage(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Query(search): Query<UsageSearch>,
) -> Result<Response, AppError> {
    match history::validate_barcode(&search.barcode) {
        Ok(barcode) => Ok(Redirect::to(&format!(
            "/admin/reels/usage/{}",
            path_segment(&barcode)
        ))
        .into_response()),
        Err(e) => render_usage(&session, &state, &LookupState::Idle, &search.barcode, Some(e.to_string())),
    }
}

/// Looks up the usage history of `barcode` and renders it.
///
/// # Arguments
/// * `barcode` - The reel barcode from the path
///
/// # Returns
/// * `Result<Response, AppError>` - The history page; invalid barcodes render
///   the page with a 400 instead of calling the backend
async fn serve_usage(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(barcode): Path<String>,
) -> Result<Response, AppError> {
    match run_lookup(&state, &session, &barcode).await {
        Ok(lookup) => render_usage(&session, &state, &lookup, barcode.trim(), None),
        Err(AppError::Validation(message)) => {
            render_usage(&session, &state, &LookupState::Idle, &barcode, Some(message))
        }
        Err(e) => Err(e),
    }
}

/// Printable sticker sheet for the reel's usage entries.
///
/// Reuses the session's loaded history when it is for the same barcode.
///
/// # Returns
/// * `Result<Response, AppError>` - The print document
///
/// # Errors
/// * Returns a validation error if the lookup failed, is superseded, or has
///   no entries
async fn print_stickers(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(barcode): Path<String>,
) -> Result<Response, AppError> {
    let barcode = history::validate_barcode(&barcode)?;

    let current = state
        .sessions
        .with_lookup(&session.id, |lookup| lookup.state().clone())
        .ok_or(AppError::MissingCredential)?;
    let reuse = matches!(&current, LookupState::Loaded { barcode: b, .. } if *b == barcode);
    let lookup = if reuse {
        current
    } else {
        run_lookup(&state, &session, &barcode).await?
    };

    match &lookup {
        LookupState::Loaded { barcode, history } => {
            let records = history::print_records(history, &state.offset);
            let body = sticker::render(barcode, &records, &state.config.label)?;
            Ok(Html(body).into_response())
        }
        LookupState::Failed { message, .. } => Err(AppError::validation(format!(
            "Stickers unavailable: {}",
            message
        ))),
        _ => Err(AppError::validation(
            "A newer lookup is in progress; stickers were not printed.",
        )),
    }
}
