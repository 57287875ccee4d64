//! Admin record screens: list, register and update back-office records.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::app::AppState;
use crate::error::AppError;
use crate::load::LoadState;
use crate::records::{self, Entity, FieldKind, FormMode, Record};
use crate::session::AdminSession;
use crate::templates;

#[derive(Serialize)]
struct EntityLink {
    slug: &'static str,
    title: &'static str,
    href: String,
}

#[derive(Serialize)]
struct RecordRow {
    cells: Vec<String>,
    edit_href: Option<String>,
}

#[derive(Serialize)]
struct Choice {
    value: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct FormField {
    name: &'static str,
    label: &'static str,
    input_type: &'static str,
    value: String,
    required: bool,
    textarea: bool,
    choices: Option<Vec<Choice>>,
    hint: Option<&'static str>,
}

/// Links to every admin record screen, for the dashboard
pub fn entity_links() -> Vec<impl Serialize> {
    records::ENTITIES
        .iter()
        .map(|e| EntityLink {
            slug: e.slug,
            title: e.title,
            href: list_href(e),
        })
        .collect()
}

fn list_href(entity: &Entity) -> String {
    format!("/admin/manage/{}", entity.slug)
}

fn edit_href(entity: &Entity, id: &str) -> String {
    format!("/admin/manage/{}/{}/edit", entity.slug, urlencoding::encode(id))
}

fn find_entity(slug: &str) -> Result<&'static Entity, AppError> {
    records::entity(slug).ok_or_else(|| AppError::NotFound(format!("There is no admin screen for \"{}\".", slug)))
}

fn record_row(entity: &Entity, record: &Record) -> RecordRow {
    RecordRow {
        cells: entity
            .listed_fields()
            .map(|f| f.display(record.get(f.name)))
            .collect(),
        edit_href: records::record_id(record).map(|id| edit_href(entity, &id)),
    }
}

fn form_fields(entity: &Entity, values: &HashMap<String, String>, mode: FormMode) -> Vec<FormField> {
    entity
        .fields
        .iter()
        .map(|field| {
            let value = match field.kind {
                FieldKind::Password => String::new(),
                _ => values.get(field.name).cloned().unwrap_or_default(),
            };
            let choices = match field.kind {
                FieldKind::Select(options) => Some(
                    options
                        .iter()
                        .map(|option| Choice {
                            value: *option,
                            selected: *option == value,
                        })
                        .collect(),
                ),
                _ => None,
            };
            FormField {
                name: field.name,
                label: field.label,
                input_type: field.kind.input_type(),
                required: field.required_in(mode),
                textarea: field.kind == FieldKind::TextArea,
                hint: (field.kind == FieldKind::Password && mode == FormMode::Update)
                    .then_some("Leave blank to keep the current password."),
                choices,
                value,
            }
        })
        .collect()
}

/// Where a submitted form is posted back to
enum Target<'a> {
    New,
    Existing(&'a str),
}

fn render_form(
    session: &AdminSession,
    entity: &Entity,
    target: Target<'_>,
    values: &HashMap<String, String>,
    errors: &[String],
    status: StatusCode,
) -> Result<Response, AppError> {
    let (mode, heading, action) = match target {
        Target::New => (
            FormMode::Create,
            format!("Register {}", entity.singular),
            format!("{}/new", list_href(entity)),
        ),
        Target::Existing(id) => (FormMode::Update, format!("Edit {}", entity.singular), edit_href(entity, id)),
    };

    let body = templates::render(
        "record_form",
        &json!({
            "title": heading,
            "admin_name": session.credential.display_name(),
            "entity": { "title": entity.title, "href": list_href(entity) },
            "action": action,
            "fields": form_fields(entity, values, mode),
            "errors": errors,
        }),
    )?;
    Ok((status, Html(body)).into_response())
}

/// Lists the records of one entity.
///
/// # Arguments
/// * `slug` - Entity path segment, e.g. `boxes`
///
/// # Returns
/// * `Result<Response, AppError>` - The list page; a failed remote read still
///   renders the page with an error banner and status 502
///
/// # Errors
/// * Returns `NotFound` for an unknown entity
pub async fn serve_list(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let entity = find_entity(&slug)?;
    let load = LoadState::from_result(state.api.list_records(&session.credential, entity.list_path).await);

    let rows: Vec<RecordRow> = load
        .loaded()
        .map(|records| records.iter().map(|r| record_row(entity, r)).collect())
        .unwrap_or_default();
    let columns: Vec<&str> = entity.listed_fields().map(|f| f.label).collect();

    let body = templates::render(
        "records",
        &json!({
            "title": entity.title,
            "admin_name": session.credential.display_name(),
            "singular": entity.singular,
            "new_href": format!("{}/new", list_href(entity)),
            "banner": load.banner(),
            "loaded": load.loaded().is_some(),
            "columns": columns,
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

/// Blank registration form for an entity
pub async fn serve_new(session: AdminSession, Path(slug): Path<String>) -> Result<Response, AppError> {
    let entity = find_entity(&slug)?;
    render_form(&session, entity, Target::New, &HashMap::new(), &[], StatusCode::OK)
}

/// Registers a new record.
///
/// # Arguments
/// * `slug` - Entity path segment
/// * `form` - Submitted field values
///
/// # Returns
/// * `Result<Response, AppError>` - A redirect to the list once the backend
///   accepts the record, otherwise the form again with the problems listed
///   (400 for invalid input, which never reaches the backend; the remote
///   status mapping for a rejected call)
pub async fn handle_new(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let entity = find_entity(&slug)?;
    let record = match entity.validate(&form, FormMode::Create) {
        Ok(record) => record,
        Err(errors) => {
            return render_form(&session, entity, Target::New, &form, &errors, StatusCode::BAD_REQUEST);
        }
    };

    match state
        .api
        .create_record(&session.credential, entity.create_path, &record)
        .await
    {
        Ok(()) => {
            log::info!("registered {} for {}", entity.singular, session.credential.display_name());
            Ok(Redirect::to(&list_href(entity)).into_response())
        }
        Err(e) => render_form(&session, entity, Target::New, &form, &[e.to_string()], status_of(&e)),
    }
}

/// Edit form prefilled from the backend's copy of record `id`.
///
/// # Arguments
/// * `slug` - Entity path segment
/// * `id` - Record identifier (`_id`)
///
/// # Returns
/// * `Result<Response, AppError>` - The form, or `NotFound` when the backend
///   list has no record with that id
pub async fn serve_edit(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let entity = find_entity(&slug)?;
    let records = state.api.list_records(&session.credential, entity.list_path).await?;
    let record = records
        .iter()
        .find(|r| records::record_id(r).as_deref() == Some(id.as_str()))
        .ok_or_else(|| AppError::NotFound(format!("No {} with id {}.", entity.singular, id)))?;

    let values = entity.form_values(record);
    render_form(&session, entity, Target::Existing(&id), &values, &[], StatusCode::OK)
}

/// Sends changes for record `id`; responds like [`handle_new`]
pub async fn handle_edit(
    session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let entity = find_entity(&slug)?;
    let record = match entity.validate(&form, FormMode::Update) {
        Ok(record) => record,
        Err(errors) => {
            return render_form(&session, entity, Target::Existing(&id), &form, &errors, StatusCode::BAD_REQUEST);
        }
    };

    match state
        .api
        .update_record(&session.credential, entity.update_path, &id, &record)
        .await
    {
        Ok(()) => {
            log::info!("updated {} {}", entity.singular, id);
            Ok(Redirect::to(&list_href(entity)).into_response())
        }
        Err(e) => render_form(&session, entity, Target::Existing(&id), &form, &[e.to_string()], status_of(&e)),
    }
}

fn status_of(e: &AppError) -> StatusCode {
    StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(slug: &str) -> &'static Entity {
        records::entity(slug).unwrap()
    }

    #[test]
    fn rows_follow_listed_fields() {
        let record: Record = serde_json::from_value(json!({
            "_id": "b 1",
            "boxName": "RSC",
            "ply": 5,
            "description": "not listed"
        }))
        .unwrap();
        let row = record_row(entity("boxes"), &record);
        assert_eq!(row.cells, vec!["RSC", "", "5", "", "", "", ""]);
        assert_eq!(row.edit_href.as_deref(), Some("/admin/manage/boxes/b%201/edit"));
    }

    #[test]
    fn select_marks_submitted_value() {
        let values: HashMap<String, String> = [("role".to_string(), "SUPER_ADMIN".to_string())].into();
        let fields = form_fields(entity("admins"), &values, FormMode::Update);
        let role = fields.iter().find(|f| f.name == "role").unwrap();
        let selected: Vec<_> = role
            .choices
            .as_ref()
            .unwrap()
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value)
            .collect();
        assert_eq!(selected, vec!["SUPER_ADMIN"]);

        let password = fields.iter().find(|f| f.name == "password").unwrap();
        assert!(!password.required);
        assert!(password.hint.is_some());
    }

    #[test]
    fn unknown_entity_is_not_found() {
        assert_eq!(find_entity("widgets").unwrap_err().status_code(), 404);
    }
}
