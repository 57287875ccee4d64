//! Back-office records managed through the admin screens.
//!
//! Boxes, employees, salaries, industries, admins and reels are all handled
//! the same way: list what the backend returns, register a new record,
//! update an existing one. Records stay untyped JSON objects; an [`Entity`]
//! only describes the endpoints and the fields its form edits.

use std::collections::HashMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    pub(crate) static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("valid email pattern");
    pub(crate) static ref PHONE_RE: Regex =
        Regex::new(r"^(\+91[\s-]?)?[0-9]{10}$").expect("valid phone pattern");
    static ref MONTH_RE: Regex = Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").expect("valid month pattern");
}

/// A backend record as sent over the wire
pub type Record = Map<String, Value>;

/// Input kind of a form field, which also decides how it is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    /// Non-negative number, sent as a JSON number
    Number,
    Email,
    Phone,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM`
    Month,
    /// Never listed or prefilled; left blank on update to keep the old one
    Password,
    Select(&'static [&'static str]),
}

impl FieldKind {
    /// `type` attribute of the HTML input
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Email => "email",
            FieldKind::Phone => "tel",
            FieldKind::Date => "date",
            FieldKind::Month => "month",
            FieldKind::Password => "password",
            FieldKind::Text | FieldKind::TextArea | FieldKind::Select(_) => "text",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// JSON key on the backend record
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Shown as a column on the list page
    pub listed: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> Field {
    Field {
        name,
        label,
        kind,
        required: false,
        listed: true,
    }
}

impl Field {
    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    /// Is a value needed for this field when submitting in `mode`?
    pub fn required_in(&self, mode: FormMode) -> bool {
        self.required && !(self.kind == FieldKind::Password && mode == FormMode::Update)
    }

    fn parse(&self, raw: &str) -> Result<Value, String> {
        let invalid = |what: &str| format!("{} must be {}.", self.label, what);
        match self.kind {
            FieldKind::Number => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .and_then(number_value)
                .ok_or_else(|| invalid("a non-negative number")),
            FieldKind::Email if !EMAIL_RE.is_match(raw) => Err(invalid("a valid email address")),
            FieldKind::Phone if !PHONE_RE.is_match(raw) => Err(invalid("a 10 digit phone number")),
            FieldKind::Date if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() => {
                Err(invalid("a date (YYYY-MM-DD)"))
            }
            FieldKind::Month if !MONTH_RE.is_match(raw) => Err(invalid("a month (YYYY-MM)")),
            FieldKind::Select(options) if !options.contains(&raw) => {
                Err(format!("{} must be one of: {}.", self.label, options.join(", ")))
            }
            _ => Ok(Value::from(raw)),
        }
    }

    /// Text shown for `value` in this field's list cell or form input
    pub fn display(&self, value: Option<&Value>) -> String {
        let text = match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        match self.kind {
            FieldKind::Date => date_part(&text).to_string(),
            _ => text,
        }
    }
}

fn date_part(ts: &str) -> &str {
    ts.split_once('T').map(|(d, _)| d).unwrap_or(ts)
}

/// Whole numbers go out as integers, everything else as floats
fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n < 9_007_199_254_740_992.0 {
        Some(Value::from(n as i64))
    } else {
        serde_json::Number::from_f64(n).map(Value::Number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// A kind of record with its endpoints and form
#[derive(Debug)]
pub struct Entity {
    /// Path segment under `/admin/manage/`
    pub slug: &'static str,
    pub title: &'static str,
    pub singular: &'static str,
    pub list_path: &'static str,
    pub create_path: &'static str,
    /// The record id is appended as a final path segment
    pub update_path: &'static str,
    pub fields: &'static [Field],
}

impl Entity {
    /// Check a submitted form and build the record to send
    ///
    /// Values are trimmed (passwords excepted). Blank optional fields are left
    /// out, as is a blank password on update, so the backend keeps what it has.
    pub fn validate(&self, form: &HashMap<String, String>, mode: FormMode) -> Result<Record, Vec<String>> {
        let mut record = Record::new();
        let mut errors = Vec::new();

        for field in self.fields {
            let submitted = form.get(field.name).map(String::as_str).unwrap_or("");
            let raw = match field.kind {
                FieldKind::Password => submitted,
                _ => submitted.trim(),
            };
            if raw.is_empty() {
                if field.required_in(mode) {
                    errors.push(format!("{} is required.", field.label));
                }
                continue;
            }
            match field.parse(raw) {
                Ok(value) => {
                    record.insert(field.name.to_string(), value);
                }
                Err(message) => errors.push(message),
            }
        }

        if errors.is_empty() { Ok(record) } else { Err(errors) }
    }

    /// Form values prefilled from an existing record; passwords stay blank
    pub fn form_values(&self, record: &Record) -> HashMap<String, String> {
        self.fields
            .iter()
            .filter(|f| f.kind != FieldKind::Password)
            .map(|f| (f.name.to_string(), f.display(record.get(f.name))))
            .collect()
    }

    pub fn listed_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.listed && f.kind != FieldKind::Password)
    }
}

/// Backend identifier of a record (`_id`, falling back to `id`)
pub fn record_id(record: &Record) -> Option<String> {
    ["_id", "id"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Records out of a list response: a bare array or an object wrapping one
/// under `data`
pub fn records_from_json(value: Value) -> Option<Vec<Record>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };
    Some(
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
    )
}

pub fn entity(slug: &str) -> Option<&'static Entity> {
    ENTITIES.iter().find(|e| e.slug == slug)
}

const REEL_STATUSES: &[&str] = &["IN_USE", "NOT_IN_USE", "PARTIALLY_USED_AVAILABLE", "USE_COMPLETED"];

pub const ENTITIES: &[Entity] = &[
    Entity {
        slug: "reels",
        title: "Reels",
        singular: "reel",
        list_path: "/admin/inventory/getReelStocks",
        create_path: "/admin/reel/registerReel",
        update_path: "/admin/reel/manipulateReel",
        fields: &[
            field("barcodeId", "Barcode ID", FieldKind::Text).required(),
            field("reelNo", "Reel No", FieldKind::Text),
            field("supplierName", "Supplier", FieldKind::Text),
            field("paperType", "Paper Type", FieldKind::Text),
            field("gsm", "GSM", FieldKind::Number),
            field("bf", "BF", FieldKind::Number),
            field("deckle", "Deckle", FieldKind::Number),
            field("unit", "Unit", FieldKind::Text),
            field("initialWeight", "Initial Weight", FieldKind::Number).required(),
            field("currentWeight", "Current Weight", FieldKind::Number),
            field("status", "Status", FieldKind::Select(REEL_STATUSES)).required(),
        ],
    },
    Entity {
        slug: "boxes",
        title: "Boxes",
        singular: "box",
        list_path: "/admin/box/getAllBoxes",
        create_path: "/admin/box/addBox",
        update_path: "/admin/box/updateBox",
        fields: &[
            field("boxName", "Name", FieldKind::Text).required(),
            field("clientName", "Client", FieldKind::Text),
            field("ply", "Ply", FieldKind::Number),
            field("length", "Length", FieldKind::Number),
            field("width", "Width", FieldKind::Number),
            field("height", "Height", FieldKind::Number),
            field("price", "Price", FieldKind::Number),
            field("description", "Description", FieldKind::TextArea).unlisted(),
        ],
    },
    Entity {
        slug: "employees",
        title: "Employees",
        singular: "employee",
        list_path: "/admin/employee/getAllEmployees",
        create_path: "/admin/employee/addEmployee",
        update_path: "/admin/employee/updateEmployee",
        fields: &[
            field("name", "Name", FieldKind::Text).required(),
            field("phone", "Phone", FieldKind::Phone),
            field("designation", "Designation", FieldKind::Text),
            field("joiningDate", "Joining Date", FieldKind::Date),
            field("baseSalary", "Base Salary", FieldKind::Number).required(),
            field("address", "Address", FieldKind::TextArea).unlisted(),
        ],
    },
    Entity {
        slug: "salaries",
        title: "Salaries",
        singular: "salary",
        list_path: "/admin/salary/getAllSalaries",
        create_path: "/admin/salary/addSalary",
        update_path: "/admin/salary/updateSalary",
        fields: &[
            field("employeeName", "Employee", FieldKind::Text).required(),
            field("month", "Month", FieldKind::Month).required(),
            field("amount", "Amount", FieldKind::Number).required(),
            field("paidOn", "Paid On", FieldKind::Date),
            field("status", "Status", FieldKind::Select(&["PAID", "PENDING"])).required(),
            field("remarks", "Remarks", FieldKind::TextArea).unlisted(),
        ],
    },
    Entity {
        slug: "industries",
        title: "Industries",
        singular: "industry",
        list_path: "/admin/industry/getAllIndustries",
        create_path: "/admin/industry/addIndustry",
        update_path: "/admin/industry/updateIndustry",
        fields: &[
            field("name", "Name", FieldKind::Text).required(),
            field("description", "Description", FieldKind::TextArea),
        ],
    },
    Entity {
        slug: "admins",
        title: "Admins",
        singular: "admin",
        list_path: "/admin/getAllAdmins",
        create_path: "/admin/register",
        update_path: "/admin/updateAdmin",
        fields: &[
            field("name", "Name", FieldKind::Text).required(),
            field("email", "Email", FieldKind::Email).required(),
            field("role", "Role", FieldKind::Select(&["ADMIN", "SUPER_ADMIN"])).required(),
            field("password", "Password", FieldKind::Password).required(),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn slugs_are_unique_and_resolvable() {
        for e in ENTITIES {
            assert_eq!(entity(e.slug).map(|found| found.title), Some(e.title));
        }
        assert!(entity("widgets").is_none());
    }

    #[test]
    fn numbers_are_sent_as_numbers() {
        let boxes = entity("boxes").unwrap();
        let record = boxes
            .validate(&form(&[("boxName", " RSC 10x8 "), ("ply", "5"), ("price", "12.5"), ("width", "")]), FormMode::Create)
            .unwrap();
        assert_eq!(record.get("boxName"), Some(&json!("RSC 10x8")));
        assert_eq!(record.get("ply"), Some(&json!(5)));
        assert_eq!(record.get("price"), Some(&json!(12.5)));
        assert!(!record.contains_key("width"));
    }

    #[test]
    fn reports_every_problem() {
        let salaries = entity("salaries").unwrap();
        let errors = salaries
            .validate(
                &form(&[("month", "2024-13"), ("amount", "-4"), ("paidOn", "yesterday"), ("status", "LATE")]),
                FormMode::Create,
            )
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Employee is required.",
                "Month must be a month (YYYY-MM).",
                "Amount must be a non-negative number.",
                "Paid On must be a date (YYYY-MM-DD).",
                "Status must be one of: PAID, PENDING.",
            ]
        );
    }

    #[test]
    fn email_and_phone_are_checked() {
        let admins = entity("admins").unwrap();
        let errors = admins
            .validate(&form(&[("name", "Asha"), ("email", "asha"), ("role", "ADMIN"), ("password", "pw")]), FormMode::Create)
            .unwrap_err();
        assert_eq!(errors, vec!["Email must be a valid email address."]);

        let employees = entity("employees").unwrap();
        let errors = employees
            .validate(&form(&[("name", "Ravi"), ("phone", "12345"), ("baseSalary", "18000")]), FormMode::Create)
            .unwrap_err();
        assert_eq!(errors, vec!["Phone must be a 10 digit phone number."]);
    }

    #[test]
    fn blank_password_keeps_the_old_one_on_update() {
        let admins = entity("admins").unwrap();
        let submitted = form(&[("name", "Asha"), ("email", "asha@example.com"), ("role", "ADMIN"), ("password", "")]);

        assert_eq!(
            admins.validate(&submitted, FormMode::Create).unwrap_err(),
            vec!["Password is required."]
        );
        let record = admins.validate(&submitted, FormMode::Update).unwrap();
        assert!(!record.contains_key("password"));
    }

    #[test]
    fn prefill_skips_passwords_and_trims_dates() {
        let record: Record = serde_json::from_value(json!({
            "_id": "e1",
            "name": "Ravi",
            "joiningDate": "2023-06-01T00:00:00.000Z",
            "baseSalary": 18000
        }))
        .unwrap();
        let values = entity("employees").unwrap().form_values(&record);
        assert_eq!(values["joiningDate"], "2023-06-01");
        assert_eq!(values["baseSalary"], "18000");
        assert_eq!(values["phone"], "");

        let admin: Record = serde_json::from_value(json!({ "name": "A", "password": "hash" })).unwrap();
        assert!(!entity("admins").unwrap().form_values(&admin).contains_key("password"));
    }

    #[test]
    fn list_responses_may_be_wrapped() {
        let bare = records_from_json(json!([{ "_id": "a" }, 3])).unwrap();
        assert_eq!(bare.len(), 1);
        let wrapped = records_from_json(json!({ "data": [{ "id": 7 }] })).unwrap();
        assert_eq!(record_id(&wrapped[0]).as_deref(), Some("7"));
        assert!(records_from_json(json!({ "message": "ok" })).is_none());
    }
}
