//! Zone-based shipping fees.
//!
//! A [`ShippingCalculator`] holds an ordered list of [`ShippingZone`]s. A
//! destination is matched against each zone's keywords in order and the
//! first zone with a keyword contained in the city or state wins. If no zone
//! matches, the last zone's rate applies. Orders at or above the free-shipping
//! threshold ship free regardless of destination.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Default subtotal at which shipping is waived.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingError {
    #[error("at least one shipping zone is required")]
    NoZones,
}

/// A named delivery region with a flat rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingZone {
    name: String,
    keywords: Vec<String>,
    rate: Decimal,
}

impl ShippingZone {
    /// Create a zone. Keywords are trimmed and lowercased; blank ones are dropped.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, keywords: I, rate: Decimal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            name: name.into(),
            keywords,
            rate,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.rate
    }

    /// Whether any keyword occurs in either of the (already lowercased) fields.
    fn matches(&self, city: &str, state: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| city.contains(k.as_str()) || state.contains(k.as_str()))
    }
}

/// Which rule produced a fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "zone", rename_all = "snake_case")]
pub enum ShippingRule {
    /// Subtotal reached the free-shipping threshold.
    FreeShipping,
    /// A zone keyword matched.
    Zone(String),
    /// Nothing matched; the last zone's rate was used.
    Fallback(String),
}

/// Result of pricing a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    pub rule: ShippingRule,
    pub fee: Decimal,
}

impl ShippingQuote {
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self.rule, ShippingRule::FreeShipping)
    }

    /// Zone name for display; `None` when shipping was waived.
    #[must_use]
    pub fn zone_name(&self) -> Option<&str> {
        match &self.rule {
            ShippingRule::FreeShipping => None,
            ShippingRule::Zone(name) | ShippingRule::Fallback(name) => Some(name),
        }
    }
}

/// Prices deliveries from a destination and subtotal.
#[derive(Debug, Clone)]
pub struct ShippingCalculator {
    zones: Vec<ShippingZone>,
    free_shipping_threshold: Decimal,
}

impl ShippingCalculator {
    /// Build a calculator from an ordered zone list.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::NoZones`] if `zones` is empty, since the last
    /// zone doubles as the fallback.
    pub fn new(zones: Vec<ShippingZone>, free_shipping_threshold: Decimal) -> Result<Self, ShippingError> {
        if zones.is_empty() {
            return Err(ShippingError::NoZones);
        }
        Ok(Self {
            zones,
            free_shipping_threshold,
        })
    }

    /// The shop's zone table with the default threshold.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            zones: standard_zones(),
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
        }
    }

    #[must_use]
    pub const fn with_free_shipping_threshold(mut self, threshold: Decimal) -> Self {
        self.free_shipping_threshold = threshold;
        self
    }

    #[must_use]
    pub fn zones(&self) -> &[ShippingZone] {
        &self.zones
    }

    #[must_use]
    pub const fn free_shipping_threshold(&self) -> Decimal {
        self.free_shipping_threshold
    }

    /// Price a delivery to `city`/`state` for an order of `subtotal`.
    #[must_use]
    pub fn quote(&self, city: &str, state: &str, subtotal: Decimal) -> ShippingQuote {
        if subtotal >= self.free_shipping_threshold {
            return ShippingQuote {
                rule: ShippingRule::FreeShipping,
                fee: Decimal::ZERO,
            };
        }

        let city = city.trim().to_lowercase();
        let state = state.trim().to_lowercase();

        if let Some(zone) = self.zones.iter().find(|z| z.matches(&city, &state)) {
            return ShippingQuote {
                rule: ShippingRule::Zone(zone.name.clone()),
                fee: zone.rate,
            };
        }

        // `new` guarantees at least one zone.
        let fallback = self.zones.last().map_or_else(
            || (String::new(), Decimal::ZERO),
            |z| (z.name.clone(), z.rate),
        );
        ShippingQuote {
            rule: ShippingRule::Fallback(fallback.0),
            fee: fallback.1,
        }
    }

    /// Shorthand for `quote(..).fee`.
    #[must_use]
    pub fn fee(&self, city: &str, state: &str, subtotal: Decimal) -> Decimal {
        self.quote(city, state, subtotal).fee
    }
}

impl Default for ShippingCalculator {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_zones() -> Vec<ShippingZone> {
    vec![
        ShippingZone::new(
            "Local",
            [
                "mumbai",
                "thane",
                "navi mumbai",
                "kalyan",
                "vasai",
                "virar",
                "panvel",
            ],
            Decimal::from(5),
        ),
        ShippingZone::new(
            "Maharashtra",
            [
                "maharashtra",
                "pune",
                "nashik",
                "nagpur",
                "aurangabad",
                "kolhapur",
            ],
            Decimal::from(10),
        ),
        ShippingZone::new(
            "Metro",
            [
                "delhi",
                "bengaluru",
                "bangalore",
                "chennai",
                "kolkata",
                "hyderabad",
                "ahmedabad",
            ],
            Decimal::from(15),
        ),
        ShippingZone::new(
            "Rest of India",
            [
                "gujarat",
                "karnataka",
                "tamil nadu",
                "telangana",
                "kerala",
                "goa",
                "rajasthan",
                "punjab",
                "haryana",
                "uttar pradesh",
                "madhya pradesh",
                "west bengal",
                "andhra pradesh",
                "odisha",
                "bihar",
                "jharkhand",
                "chhattisgarh",
                "uttarakhand",
                "himachal",
            ],
            Decimal::from(25),
        ),
        ShippingZone::new(
            "Remote",
            [
                "jammu",
                "kashmir",
                "ladakh",
                "andaman",
                "nicobar",
                "lakshadweep",
                "sikkim",
                "assam",
                "arunachal",
                "manipur",
                "meghalaya",
                "mizoram",
                "nagaland",
                "tripura",
            ],
            Decimal::from(50),
        ),
    ]
}
