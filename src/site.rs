//! Public marketing pages and the contact form.

use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::AppState;
use crate::error::AppError;
use crate::records::{EMAIL_RE, PHONE_RE};
use crate::templates;

#[derive(Debug, Serialize)]
pub struct Company {
    pub name: &'static str,
    pub tagline: &'static str,
    pub founded: u16,
    pub city: &'static str,
    pub capacity: &'static str,
    pub products: &'static [&'static str],
}

pub const COMPANY: Company = Company {
    name: "Boxworks Corrugated",
    tagline: "Corrugated boxes, sheets and rolls made to order, delivered on schedule.",
    founded: 1998,
    city: "Pune",
    capacity: "1,200 tonnes",
    products: &[
        "3, 5 and 7 ply corrugated boxes",
        "Die-cut and printed boxes",
        "Corrugated sheets and rolls",
        "Partitions, pads and inserts",
    ],
};

#[derive(Debug, Serialize)]
pub struct Industry {
    pub slug: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
}

pub const INDUSTRIES: &[Industry] = &[
    Industry {
        slug: "food-beverage",
        name: "Food & Beverage",
        summary: "Food-grade cartons with moisture-resistant liners for dry goods, produce and bottled drinks.",
    },
    Industry {
        slug: "pharmaceuticals",
        name: "Pharmaceuticals",
        summary: "Shipper cartons with batch printing that hold up through cold-chain and long-haul transit.",
    },
    Industry {
        slug: "ecommerce",
        name: "E-commerce",
        summary: "Light, strong mailer boxes sized to cut dimensional-weight shipping costs.",
    },
    Industry {
        slug: "fmcg",
        name: "FMCG",
        summary: "High-volume master cartons and display-ready packaging for retail shelves.",
    },
    Industry {
        slug: "electronics",
        name: "Electronics",
        summary: "Heavy-duty 5 and 7 ply boxes with custom inserts for appliances and components.",
    },
    Industry {
        slug: "automotive",
        name: "Automotive",
        summary: "Returnable and export-grade boxes for spare parts and assemblies.",
    },
];

/// Fields of the public contact form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub message: String,
}

impl ContactForm {
    /// Simple shape checks; returns one message per problem
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Please enter your name.".to_string());
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            errors.push("Please enter a valid email address.".to_string());
        }
        let phone = self.phone.trim();
        if !phone.is_empty() && !PHONE_RE.is_match(phone) {
            errors.push("Phone number must have 10 digits.".to_string());
        }
        if self.message.trim().is_empty() {
            errors.push("Please enter a message.".to_string());
        }
        errors
    }
}

pub async fn serve_home() -> Result<Html<String>, AppError> {
    templates::render(
        "home",
        &json!({ "title": "Home", "company": COMPANY, "industries": INDUSTRIES }),
    )
    .map(Html)
}

pub async fn serve_about() -> Result<Html<String>, AppError> {
    templates::render("about", &json!({ "title": "About", "company": COMPANY })).map(Html)
}

pub async fn serve_industries() -> Result<Html<String>, AppError> {
    templates::render(
        "industries",
        &json!({ "title": "Industries", "industries": INDUSTRIES }),
    )
    .map(Html)
}

pub async fn serve_contact() -> Result<Html<String>, AppError> {
    render_contact(&ContactForm::default(), &[], false, None).map(Html)
}

/// Handle a contact form submission
///
/// Invalid input re-renders the form with messages. Valid enquiries are
/// mailed when SMTP is configured and logged either way.
pub async fn handle_contact(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ContactForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return match render_contact(&form, &errors, false, None) {
            Ok(body) => (StatusCode::BAD_REQUEST, Html(body)).into_response(),
            Err(e) => e.into_response(),
        };
    }

    log::info!("contact enquiry from {} <{}>", form.name.trim(), form.email.trim());

    let mut failure = None;
    if let Some(mailer) = state.mailer.clone() {
        let enquiry = form.clone();
        let sent = tokio::task::spawn_blocking(move || mailer.send_enquiry(&enquiry))
            .await
            .unwrap_or_else(|e| Err(AppError::Mail(e.to_string())));
        if let Err(e) = sent {
            log::error!("failed to send enquiry mail: {}", e);
            failure = Some("We could not send your message right now. Please call us or try again later.".to_string());
        }
    }

    let status = if failure.is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    let sent = failure.is_none();
    match render_contact(&form, &[], sent, failure) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn render_contact(
    form: &ContactForm,
    errors: &[String],
    sent: bool,
    failure: Option<String>,
) -> Result<String, AppError> {
    templates::render(
        "contact",
        &json!({
            "title": "Contact",
            "form": form,
            "errors": errors,
            "sent": sent,
            "banner": { "loading": false, "error": failure },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "9876543210".to_string(),
            company: String::new(),
            message: "Quote for 10k boxes".to_string(),
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        assert!(form().validate().is_empty());
        let mut no_phone = form();
        no_phone.phone.clear();
        assert!(no_phone.validate().is_empty());
        let mut prefixed = form();
        prefixed.phone = "+91 9876543210".to_string();
        assert!(prefixed.validate().is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let bad = ContactForm {
            name: " ".to_string(),
            email: "not-an-email".to_string(),
            phone: "12345".to_string(),
            company: String::new(),
            message: String::new(),
        };
        assert_eq!(bad.validate().len(), 4);
    }

    #[test]
    fn industries_have_unique_slugs() {
        let mut slugs: Vec<_> = INDUSTRIES.iter().map(|i| i.slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), INDUSTRIES.len());
    }
}
