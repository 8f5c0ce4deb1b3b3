//! Checkout: address validation, payment methods and order assembly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::order::OrderItem;
use crate::shipping::{ShippingCalculator, ShippingQuote};
use crate::types::Email;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Please fill in {0}")]
    MissingField(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please enter a valid 10-digit phone number")]
    InvalidPhone,

    #[error("Please enter a valid 6-digit pincode")]
    InvalidPincode,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("That payment method is not available")]
    PaymentMethodUnavailable,
}

/// Delivery address collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

impl ShippingAddress {
    /// Check required fields and formats, returning a normalized copy.
    ///
    /// Phone numbers keep only their last ten digits (a leading `91` country
    /// code is accepted). Email is lowercased.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] found, in form order.
    pub fn validate(&self) -> Result<Self, CheckoutError> {
        let required = [
            ("your full name", &self.full_name),
            ("your email", &self.email),
            ("your phone number", &self.phone),
            ("the street address", &self.street),
            ("the city", &self.city),
            ("the state", &self.state),
            ("the pincode", &self.pincode),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CheckoutError::MissingField(*field));
        }

        let email = Email::parse(&self.email).map_err(|_| CheckoutError::InvalidEmail)?;
        let phone = normalize_phone(&self.phone).ok_or(CheckoutError::InvalidPhone)?;

        let pincode = self.pincode.trim();
        if !is_valid_pincode(pincode) {
            return Err(CheckoutError::InvalidPincode);
        }

        Ok(Self {
            full_name: self.full_name.trim().to_owned(),
            email: email.into_inner(),
            phone,
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            pincode: pincode.to_owned(),
        })
    }
}

fn normalize_phone(raw: &str) -> Option<String> {
    if raw
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')')))
    {
        return None;
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(digits),
        12 if digits.starts_with("91") => digits.get(2..).map(str::to_owned),
        _ => None,
    }
}

fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.bytes().all(|b| b.is_ascii_digit()) && !pincode.starts_with('0')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Upi,
    Card,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Upi => "upi",
            Self::Card => "card",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "Cash on delivery",
            Self::Upi => "UPI",
            Self::Card => "Card",
        }
    }
}

/// Which payment methods the shop accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    #[serde(default)]
    pub cod_enabled: bool,
    #[serde(default)]
    pub upi_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub card_enabled: bool,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            cod_enabled: true,
            upi_enabled: false,
            upi_id: None,
            card_enabled: false,
        }
    }
}

impl PaymentSettings {
    /// Every method switched off; used when the real settings are unknown.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            cod_enabled: false,
            upi_enabled: false,
            upi_id: None,
            card_enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Cod => self.cod_enabled,
            PaymentMethod::Upi => self.upi_enabled,
            PaymentMethod::Card => self.card_enabled,
        }
    }

    #[must_use]
    pub fn enabled_methods(&self) -> Vec<PaymentMethod> {
        [PaymentMethod::Cod, PaymentMethod::Upi, PaymentMethod::Card]
            .into_iter()
            .filter(|m| self.is_enabled(*m))
            .collect()
    }
}

/// Subtotal, shipping and total for a cart shipped to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderQuote {
    pub subtotal: Decimal,
    pub shipping: ShippingQuote,
    pub total: Decimal,
}

impl OrderQuote {
    #[must_use]
    pub fn compute(cart: &Cart, city: &str, state: &str, calculator: &ShippingCalculator) -> Self {
        let subtotal = cart.total_price();
        let shipping = calculator.quote(city, state, subtotal);
        let total = subtotal + shipping.fee;
        Self {
            subtotal,
            shipping,
            total,
        }
    }
}

/// Order payload posted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Validate a checkout submission and assemble the order to place.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for an empty cart,
/// [`CheckoutError::PaymentMethodUnavailable`] if `method` is switched off,
/// or the address validation error.
pub fn prepare_order(
    cart: &Cart,
    address: &ShippingAddress,
    method: PaymentMethod,
    settings: &PaymentSettings,
    calculator: &ShippingCalculator,
) -> Result<NewOrder, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let address = address.validate()?;
    if !settings.is_enabled(method) {
        return Err(CheckoutError::PaymentMethodUnavailable);
    }

    let quote = OrderQuote::compute(cart, &address.city, &address.state, calculator);
    let items = cart
        .items()
        .iter()
        .map(|line| OrderItem {
            product_id: line.product_id.clone(),
            name: line.product.name.clone(),
            size: line.size.clone(),
            quantity: line.quantity,
            price: line.product.price,
            accessories: line.accessories.clone(),
            image: line.product.image.clone(),
        })
        .collect();

    Ok(NewOrder {
        items,
        shipping_address: address,
        payment_method: method,
        subtotal: quote.subtotal,
        shipping_fee: quote.shipping.fee,
        total: quote.total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::product::fixtures::tee;
    use crate::types::AccessoryId;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".to_string(),
            email: "Asha@Example.com".to_string(),
            phone: "+91 98765-43210".to_string(),
            street: "12 Hill Road".to_string(),
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "400050".to_string(),
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let a = address().validate().unwrap();
        assert_eq!(a.email, "asha@example.com");
        assert_eq!(a.phone, "9876543210");
    }

    #[test]
    fn test_validate_missing_field() {
        let mut a = address();
        a.city = "  ".to_string();
        assert_eq!(a.validate().unwrap_err(), CheckoutError::MissingField("the city"));
    }

    #[test]
    fn test_validate_formats() {
        let mut a = address();
        a.phone = "12345".to_string();
        assert_eq!(a.validate().unwrap_err(), CheckoutError::InvalidPhone);

        let mut a = address();
        a.phone = "98765abc10".to_string();
        assert_eq!(a.validate().unwrap_err(), CheckoutError::InvalidPhone);

        let mut a = address();
        a.pincode = "40005".to_string();
        assert_eq!(a.validate().unwrap_err(), CheckoutError::InvalidPincode);

        let mut a = address();
        a.pincode = "012345".to_string();
        assert_eq!(a.validate().unwrap_err(), CheckoutError::InvalidPincode);

        let mut a = address();
        a.email = "not-an-email".to_string();
        assert_eq!(a.validate().unwrap_err(), CheckoutError::InvalidEmail);
    }

    #[test]
    fn test_payment_settings() {
        let settings = PaymentSettings::default();
        assert_eq!(settings.enabled_methods(), vec![PaymentMethod::Cod]);

        let json = r#"{"codEnabled":false,"upiEnabled":true,"upiId":"drape@upi","cardEnabled":true}"#;
        let settings: PaymentSettings = serde_json::from_str(json).unwrap();
        assert_eq!(
            settings.enabled_methods(),
            vec![PaymentMethod::Upi, PaymentMethod::Card]
        );
    }

    #[test]
    fn test_prepare_order() {
        let p = tee();
        let mut cart = Cart::new();
        cart.add_item(&p, "M", 2, &[AccessoryId::new("belt")]).unwrap();

        let order = prepare_order(
            &cart,
            &address(),
            PaymentMethod::Cod,
            &PaymentSettings::default(),
            &ShippingCalculator::standard(),
        )
        .unwrap();

        assert_eq!(order.subtotal, Decimal::from(50));
        assert_eq!(order.shipping_fee, Decimal::from(5));
        assert_eq!(order.total, Decimal::from(55));
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].accessories.len(), 1);
    }

    #[test]
    fn test_prepare_order_rejections() {
        let calc = ShippingCalculator::standard();
        let settings = PaymentSettings::default();
        assert_eq!(
            prepare_order(&Cart::new(), &address(), PaymentMethod::Cod, &settings, &calc).unwrap_err(),
            CheckoutError::EmptyCart
        );

        let mut cart = Cart::new();
        cart.add_item(&tee(), "S", 1, &[]).unwrap();
        assert_eq!(
            prepare_order(&cart, &address(), PaymentMethod::Card, &settings, &calc).unwrap_err(),
            CheckoutError::PaymentMethodUnavailable
        );
    }

    #[test]
    fn test_no_settings_blocks_every_method() {
        let none = PaymentSettings::none();
        assert!(none.enabled_methods().is_empty());

        let mut cart = Cart::new();
        cart.add_item(&tee(), "S", 1, &[]).unwrap();
        let calc = ShippingCalculator::standard();
        for method in [PaymentMethod::Cod, PaymentMethod::Upi, PaymentMethod::Card] {
            assert_eq!(
                prepare_order(&cart, &address(), method, &none, &calc).unwrap_err(),
                CheckoutError::PaymentMethodUnavailable
            );
        }
    }

    #[test]
    fn test_new_order_wire_format() {
        let mut cart = Cart::new();
        cart.add_item(&tee(), "S", 1, &[]).unwrap();
        let order = prepare_order(
            &cart,
            &address(),
            PaymentMethod::Cod,
            &PaymentSettings::default(),
            &ShippingCalculator::standard(),
        )
        .unwrap();

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["paymentMethod"], "cod");
        assert_eq!(json["shippingFee"], 5.0);
        assert_eq!(json["shippingAddress"]["fullName"], "Asha Rao");
        assert_eq!(json["items"][0]["productId"], "tee-1");
    }
}
