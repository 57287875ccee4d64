use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::error::AppError;
use crate::site::ContactForm;

/// Sends contact-form enquiries to the sales inbox
pub struct Mailer {
    smtp: SmtpTransport,
    from: String,
    inbox: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let tls_parameters =
            TlsParameters::new(config.host.clone()).map_err(|e| AppError::Mail(e.to_string()))?;

        let smtp = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::Mail(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .tls(Tls::Wrapper(tls_parameters))
            .build();

        Ok(Mailer {
            smtp,
            from: config.from.clone(),
            inbox: config.inbox.clone(),
        })
    }

    pub fn send_enquiry(&self, form: &ContactForm) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|e| AppError::Mail(format!("{}", e)))?)
            .reply_to(
                form.email
                    .trim()
                    .parse()
                    .map_err(|e| AppError::Mail(format!("{}", e)))?,
            )
            .to(self.inbox.parse().map_err(|e| AppError::Mail(format!("{}", e)))?)
            .subject(format!("Website enquiry from {}", form.name.trim()))
            .body(enquiry_body(form))
            .map_err(|e| AppError::Mail(e.to_string()))?;

        self.smtp
            .send(&email)
            .map_err(|e| AppError::Mail(e.to_string()))?;
        Ok(())
    }
}

pub fn enquiry_body(form: &ContactForm) -> String {
    format!(
        "Name: {}\nEmail: {}\nPhone: {}\nCompany: {}\n\n{}\n",
        form.name.trim(),
        form.email.trim(),
        form.phone.trim(),
        form.company.trim(),
        form.message.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_lists_every_field() {
        let form = ContactForm {
            name: " Ravi ".to_string(),
            email: "ravi@example.com".to_string(),
            phone: String::new(),
            company: "Acme Foods".to_string(),
            message: "Need 5000 RSC boxes".to_string(),
        };
        let body = enquiry_body(&form);
        assert!(body.starts_with("Name: Ravi\n"));
        assert!(body.contains("Company: Acme Foods"));
        assert!(body.ends_with("Need 5000 RSC boxes\n"));
    }
}
