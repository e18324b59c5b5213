use coursedesk_api::{
    cart::CartItem,
    entities::order_item::Plan,
    services::pricing::{self, Pricing},
};
use proptest::prelude::*;

fn group_thousands(n: i64) -> String {
    let digits = n.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn cart_from_prices(prices: &[i64]) -> Vec<CartItem> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| CartItem {
            course_id: format!("course-{}", i),
            plan: Plan::Short,
            course_name: format!("Course {}", i),
            price: format!("₹{}", group_thousands(*price)),
        })
        .collect()
}

proptest! {
    #[test]
    fn totals_always_reconcile(prices in proptest::collection::vec(0i64..10_000_000, 0..20)) {
        let items = cart_from_prices(&prices);
        let Pricing { subtotal, tax_amount, total_amount } =
            pricing::price_cart(&items, 1800).unwrap();

        prop_assert_eq!(subtotal, prices.iter().sum::<i64>());
        prop_assert_eq!(total_amount, subtotal + tax_amount);

        // Half-up rounding of an 18% rate, computed independently.
        let expected_tax = (subtotal as i128 * 1800 + 5_000) / 10_000;
        prop_assert_eq!(tax_amount as i128, expected_tax);
    }

    #[test]
    fn decorated_prices_parse_back_to_their_value(n in 0i64..1_000_000_000) {
        let formatted = format!("₹{}", group_thousands(n));
        prop_assert_eq!(pricing::parse_price(&formatted).unwrap(), n);
    }

    #[test]
    fn tax_is_monotonic_in_the_subtotal(a in 0i64..1_000_000_000, b in 0i64..1_000_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(pricing::tax_for(lo, 1800).unwrap() <= pricing::tax_for(hi, 1800).unwrap());
    }

    #[test]
    fn zero_rate_means_total_equals_subtotal(prices in proptest::collection::vec(0i64..1_000_000, 0..10)) {
        let items = cart_from_prices(&prices);
        let pricing = pricing::price_cart(&items, 0).unwrap();
        prop_assert_eq!(pricing.tax_amount, 0);
        prop_assert_eq!(pricing.total_amount, pricing.subtotal);
    }
}
