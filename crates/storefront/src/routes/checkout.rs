//! Checkout route handlers.
//!
//! The form posts back to itself. Validation failures re-render the form
//! with the visitor's input and a toast; success clears the cart and
//! redirects to the order's tracking page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use drape_core::checkout::{
    CheckoutError, OrderQuote, PaymentMethod, PaymentSettings, ShippingAddress, prepare_order,
};
use drape_core::toast::Toast;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CartView, money};
use crate::error::{Result, add_breadcrumb, toast_for};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::CurrentUser;
use crate::services::{CartStore, PageContext, push_toast};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct QuoteView {
    pub subtotal: String,
    pub shipping: String,
    pub zone: Option<String>,
    pub total: String,
    pub free: bool,
}

impl From<&OrderQuote> for QuoteView {
    fn from(q: &OrderQuote) -> Self {
        Self {
            subtotal: money(q.subtotal),
            shipping: if q.shipping.is_free() {
                "Free".to_string()
            } else {
                money(q.shipping.fee)
            },
            zone: q.shipping.zone_name().map(str::to_owned),
            total: money(q.total),
            free: q.shipping.is_free(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub address: ShippingAddress,
    pub payment_options: Vec<PaymentOptionView>,
    pub upi_id: Option<String>,
    pub quote: QuoteView,
}

/// Checkout form submission.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub payment_method: String,
}

impl CheckoutForm {
    fn address(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            street: self.street.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
        }
    }

    fn payment_method(&self) -> Option<PaymentMethod> {
        [PaymentMethod::Cod, PaymentMethod::Upi, PaymentMethod::Card]
            .into_iter()
            .find(|m| m.as_str() == self.payment_method.trim())
    }
}

/// Prefill the address from the visitor's profile.
fn address_for(user: &CurrentUser) -> ShippingAddress {
    ShippingAddress {
        full_name: user.profile.name.clone(),
        email: user.profile.email.clone(),
        phone: user.profile.phone.clone().unwrap_or_default(),
        ..ShippingAddress::default()
    }
}

fn payment_options(settings: &PaymentSettings, selected: Option<PaymentMethod>) -> Vec<PaymentOptionView> {
    let enabled = settings.enabled_methods();
    let selected = selected
        .filter(|m| enabled.contains(m))
        .or_else(|| enabled.first().copied());
    enabled
        .into_iter()
        .map(|m| PaymentOptionView {
            value: m.as_str(),
            label: m.label(),
            selected: Some(m) == selected,
        })
        .collect()
}

/// Load payment settings. If the backend cannot say which methods are on,
/// none are offered and placement is refused until it can.
async fn load_payment_settings(state: &AppState, page: &mut PageContext) -> Result<PaymentSettings> {
    match state.backend().payment_settings().await {
        Ok(settings) => Ok(settings),
        Err(e) => {
            page.toast(toast_for(e)?);
            Ok(PaymentSettings::none())
        }
    }
}

/// Display the checkout form.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    store: CartStore,
    mut page: PageContext,
) -> Result<CheckoutTemplate> {
    let cart = store.load().await?;
    let settings = load_payment_settings(&state, &mut page).await?;
    let address = address_for(&user);
    let quote = OrderQuote::compute(&cart, &address.city, &address.state, state.shipping());

    Ok(CheckoutTemplate {
        cart: CartView::new(&cart, state.shipping().free_shipping_threshold()),
        payment_options: payment_options(&settings, None),
        upi_id: settings.upi_id,
        quote: QuoteView::from(&quote),
        address,
        page,
    })
}

/// Validate and place the order.
#[instrument(skip_all, fields(payment_method = %form.payment_method))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    store: CartStore,
    CspNonce(nonce): CspNonce,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = store.load().await?;
    if cart.is_empty() {
        push_toast(&session, Toast::info(CheckoutError::EmptyCart.to_string())).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut page = PageContext::load(&session, Some(&user), nonce).await?;
    let settings = load_payment_settings(&state, &mut page).await?;
    let address = form.address();
    let method = form.payment_method();

    let outcome = match method {
        Some(method) => prepare_order(&cart, &address, method, &settings, state.shipping()),
        None => Err(CheckoutError::PaymentMethodUnavailable),
    };

    let placed = match outcome {
        Ok(new_order) => state
            .backend()
            .place_order(&user.token, &new_order)
            .await
            .map_err(toast_for),
        Err(e) => Err(Ok(Toast::error(e.to_string()))),
    };

    match placed {
        Ok(order) => {
            store.clear().await?;
            add_breadcrumb("checkout", "Order placed", &[("order_id", order.id.as_str())]);
            tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
            push_toast(
                &session,
                Toast::success(format!("Order #{} placed. Thank you!", order.short_id())),
            )
            .await?;
            Ok(Redirect::to(&format!("/orders/{}", order.id)).into_response())
        }
        Err(toast) => {
            page.toast(toast?);
            let quote = OrderQuote::compute(&cart, &address.city, &address.state, state.shipping());
            Ok(CheckoutTemplate {
                cart: CartView::new(&cart, state.shipping().free_shipping_threshold()),
                payment_options: payment_options(&settings, method),
                upi_id: settings.upi_id,
                quote: QuoteView::from(&quote),
                address,
                page,
            }
            .into_response())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuoteParams {
    pub city: String,
    pub state: String,
}

/// Live quote for the checkout page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub free_shipping: bool,
    pub zone: Option<String>,
    pub subtotal_display: String,
    pub shipping_display: String,
    pub total_display: String,
}

impl From<&OrderQuote> for QuoteResponse {
    fn from(q: &OrderQuote) -> Self {
        let view = QuoteView::from(q);
        Self {
            subtotal: q.subtotal,
            shipping_fee: q.shipping.fee,
            total: q.total,
            free_shipping: view.free,
            zone: view.zone,
            subtotal_display: view.subtotal,
            shipping_display: view.shipping,
            total_display: view.total,
        }
    }
}

/// Quote the cart for a destination.
#[instrument(skip(state, store))]
pub async fn quote(
    State(state): State<AppState>,
    store: CartStore,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QuoteResponse>> {
    let cart = store.load().await?;
    let quote = OrderQuote::compute(&cart, &params.city, &params.state, state.shipping());
    Ok(Json(QuoteResponse::from(&quote)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use drape_core::cart::Cart;
    use drape_core::shipping::ShippingCalculator;

    use super::*;

    #[test]
    fn test_payment_options_default_to_first_enabled() {
        let settings = PaymentSettings {
            cod_enabled: false,
            upi_enabled: true,
            upi_id: Some("drape@upi".to_string()),
            card_enabled: true,
        };
        let options = payment_options(&settings, None);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, "upi");
        assert!(options[0].selected);

        let options = payment_options(&settings, Some(PaymentMethod::Card));
        assert!(!options[0].selected && options[1].selected);

        let options = payment_options(&settings, Some(PaymentMethod::Cod));
        assert!(options[0].selected);
    }

    #[test]
    fn test_unknown_settings_offer_no_options() {
        let options = payment_options(&PaymentSettings::none(), Some(PaymentMethod::Cod));
        assert!(options.is_empty());
    }

    #[test]
    fn test_form_payment_method() {
        let form = CheckoutForm {
            payment_method: "upi".to_string(),
            ..CheckoutForm::default()
        };
        assert_eq!(form.payment_method(), Some(PaymentMethod::Upi));

        let form = CheckoutForm {
            payment_method: "bitcoin".to_string(),
            ..CheckoutForm::default()
        };
        assert_eq!(form.payment_method(), None);
    }

    #[test]
    fn test_quote_response_for_empty_cart_in_mumbai() {
        let quote = OrderQuote::compute(&Cart::new(), "Mumbai", "", &ShippingCalculator::standard());
        let json = serde_json::to_value(QuoteResponse::from(&quote)).unwrap();
        assert_eq!(json["subtotal"], 0.0);
        assert_eq!(json["shippingFee"], 5.0);
        assert_eq!(json["freeShipping"], false);
        assert_eq!(json["totalDisplay"], "₹5.00");
    }
}
