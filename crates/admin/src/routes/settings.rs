//! Payment settings: which methods checkout offers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use drape_core::checkout::PaymentSettings;
use drape_core::toast::Toast;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, toast_for};
use crate::middleware::RequireAdmin;
use crate::services::{PageContext, push_toast};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).post(save))
}

/// The settings form. Unchecked boxes are absent from the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub cod_enabled: Option<String>,
    pub upi_enabled: Option<String>,
    pub upi_id: String,
    pub card_enabled: Option<String>,
}

impl SettingsForm {
    fn from_settings(settings: &PaymentSettings) -> Self {
        let checked = |on: bool| on.then(|| "on".to_string());
        Self {
            cod_enabled: checked(settings.cod_enabled),
            upi_enabled: checked(settings.upi_enabled),
            upi_id: settings.upi_id.clone().unwrap_or_default(),
            card_enabled: checked(settings.card_enabled),
        }
    }

    /// # Errors
    ///
    /// Returns the message to show when the combination is not allowed.
    pub fn into_settings(self) -> std::result::Result<PaymentSettings, &'static str> {
        let cod_enabled = self.cod_enabled.is_some();
        let upi_enabled = self.upi_enabled.is_some();
        let card_enabled = self.card_enabled.is_some();
        if !(cod_enabled || upi_enabled || card_enabled) {
            return Err("Enable at least one payment method");
        }

        let upi_id = self.upi_id.trim();
        if upi_enabled && upi_id.is_empty() {
            return Err("Enter a UPI ID to accept UPI payments");
        }
        if !upi_id.is_empty() && !upi_id.contains('@') {
            return Err("A UPI ID looks like name@bank");
        }

        Ok(PaymentSettings {
            cod_enabled,
            upi_enabled,
            upi_id: (!upi_id.is_empty()).then(|| upi_id.to_string()),
            card_enabled,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
struct SettingsTemplate {
    page: PageContext,
    form: SettingsForm,
}

/// GET /settings
#[instrument(skip_all)]
async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut page: PageContext,
) -> Result<SettingsTemplate> {
    let settings = match state.backend().payment_settings(&admin.token).await {
        Ok(settings) => settings,
        Err(e) => {
            page.toast(toast_for(e)?);
            PaymentSettings::default()
        }
    };

    Ok(SettingsTemplate {
        form: SettingsForm::from_settings(&settings),
        page,
    })
}

/// POST /settings
#[instrument(skip(state, admin, session))]
async fn save(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let settings = match form.clone().into_settings() {
        Ok(settings) => settings,
        Err(message) => {
            // Keep what the operator typed.
            let mut page = PageContext::load(&session, Some(&admin)).await?;
            page.toast(Toast::error(message));
            return Ok(SettingsTemplate { page, form }.into_response());
        }
    };

    let toast = match state.backend().update_payment_settings(&admin.token, &settings).await {
        Ok(()) => {
            let methods: Vec<&str> = settings.enabled_methods().iter().map(|m| m.as_str()).collect();
            add_breadcrumb("settings", "Payment settings saved", &[("methods", &methods.join(","))]);
            tracing::info!(methods = ?methods, "Payment settings updated");
            Toast::success("Payment settings saved")
        }
        Err(e) => toast_for(e)?,
    };
    push_toast(&session, toast).await?;
    Ok(Redirect::to("/settings").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn on() -> Option<String> {
        Some("on".to_string())
    }

    #[test]
    fn test_at_least_one_method_required() {
        let err = SettingsForm::default().into_settings().unwrap_err();
        assert_eq!(err, "Enable at least one payment method");
    }

    #[test]
    fn test_upi_requires_valid_id() {
        let form = SettingsForm {
            upi_enabled: on(),
            ..SettingsForm::default()
        };
        assert_eq!(
            form.into_settings().unwrap_err(),
            "Enter a UPI ID to accept UPI payments"
        );

        let form = SettingsForm {
            upi_enabled: on(),
            upi_id: "drapeshop".to_string(),
            ..SettingsForm::default()
        };
        assert!(form.into_settings().is_err());

        let form = SettingsForm {
            upi_enabled: on(),
            upi_id: " drape@okbank ".to_string(),
            ..SettingsForm::default()
        };
        let settings = form.into_settings().unwrap();
        assert!(settings.upi_enabled);
        assert!(!settings.cod_enabled);
        assert_eq!(settings.upi_id.as_deref(), Some("drape@okbank"));
    }

    #[test]
    fn test_form_round_trips_settings() {
        let settings = PaymentSettings {
            cod_enabled: true,
            upi_enabled: false,
            upi_id: Some("drape@okbank".to_string()),
            card_enabled: true,
        };
        let back = SettingsForm::from_settings(&settings).into_settings().unwrap();
        assert_eq!(back, settings);
    }
}
