//! Shipping fee lookups against the shop's zone table.

use drape_core::Price;
use drape_core::shipping::{ShippingCalculator, ShippingQuote, ShippingRule};
use rust_decimal::Decimal;

/// Describe a quote the way support staff read it out to a customer.
#[must_use]
pub fn describe_quote(quote: &ShippingQuote, subtotal: Decimal, threshold: Decimal) -> String {
    let fee = Price::of(quote.fee).display();
    match &quote.rule {
        ShippingRule::FreeShipping => format!(
            "Free shipping: subtotal {} reaches the {} threshold",
            Price::of(subtotal).display(),
            Price::of(threshold).display()
        ),
        ShippingRule::Zone(zone) => format!("{zone} zone: {fee}"),
        ShippingRule::Fallback(zone) => format!("No zone matched, {zone} rate applies: {fee}"),
    }
}

/// Print the fee for one destination.
pub fn quote(city: &str, state: &str, subtotal: Decimal, threshold: Decimal) {
    let calculator = ShippingCalculator::standard().with_free_shipping_threshold(threshold);
    let quote = calculator.quote(city, state, subtotal);
    tracing::debug!(city, state, %subtotal, fee = %quote.fee, "Quoted shipping");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", describe_quote(&quote, subtotal, threshold));
    }
}

/// One line per zone, in match order.
#[must_use]
pub fn zone_table(calculator: &ShippingCalculator) -> Vec<String> {
    calculator
        .zones()
        .iter()
        .map(|zone| {
            format!(
                "{:<16} {:>8}  {}",
                zone.name(),
                Price::of(zone.rate()).display(),
                zone.keywords().join(", ")
            )
        })
        .collect()
}

/// Print the zone table.
pub fn zones(threshold: Decimal) {
    let calculator = ShippingCalculator::standard().with_free_shipping_threshold(threshold);

    #[allow(clippy::print_stdout)]
    {
        for line in zone_table(&calculator) {
            println!("{line}");
        }
        println!(
            "Orders of {} or more ship free. Unmatched destinations use the last zone.",
            Price::of(calculator.free_shipping_threshold()).display()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_quote_by_rule() {
        let calculator = ShippingCalculator::standard();
        let hundred = Decimal::ONE_HUNDRED;

        let local = calculator.quote("Thane", "Maharashtra", Decimal::TEN);
        assert!(describe_quote(&local, Decimal::TEN, hundred).starts_with("Local zone: "));

        let free = calculator.quote("Thane", "Maharashtra", Decimal::from(150));
        assert!(describe_quote(&free, Decimal::from(150), hundred).starts_with("Free shipping"));

        let nowhere = calculator.quote("Atlantis", "", Decimal::TEN);
        assert!(describe_quote(&nowhere, Decimal::TEN, hundred).starts_with("No zone matched"));
    }

    #[test]
    fn test_zone_table_lists_zones_in_order() {
        let table = zone_table(&ShippingCalculator::standard());
        assert!(table[0].starts_with("Local"));
        assert!(table[0].contains("mumbai"));
    }
}
