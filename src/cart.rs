//! Client-side cart contract.
//!
//! The cart lives in the buyer's browser storage; the server never persists
//! it. These types define the shape the storefront and the checkout endpoint
//! agree on, plus the dedup semantics both sides rely on. The server tells
//! the client when to clear (only after a completed payment) via the
//! `clear_cart` flag on the confirm response.

use crate::entities::order_item::Plan;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

/// One selected (course, plan) pair, priced as the storefront displays it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "course_id": "c-programming",
    "plan": "short",
    "course_name": "C Programming Masterclass",
    "price": "₹299"
}))]
pub struct CartItem {
    #[validate(length(min = 1, max = 100))]
    pub course_id: String,
    pub plan: Plan,
    #[validate(length(min = 1, max = 200))]
    pub course_name: String,
    /// Display price string; parsed server-side into minor units
    #[validate(length(min = 1, max = 32))]
    pub price: String,
}

impl CartItem {
    /// Dedup key: one line per (course, plan) pair.
    pub fn key(&self) -> (&str, Plan) {
        (self.course_id.as_str(), self.plan)
    }
}

/// Cart value type with the dedup behavior the storefront implements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from raw items, dropping duplicate (course, plan) pairs.
    /// First occurrence wins, matching the add-is-a-no-op rule.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }

    /// Adds an item; adding an already-present (course, plan) pair is a no-op.
    /// Returns true when the item was actually inserted.
    pub fn add(&mut self, item: CartItem) -> bool {
        if self.contains(&item.course_id, item.plan) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, course_id: &str, plan: Plan) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !(item.course_id == course_id && item.plan == plan));
        self.items.len() != before
    }

    pub fn contains(&self, course_id: &str, plan: Plan) -> bool {
        self.items.iter().any(|item| item.key() == (course_id, plan))
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(course_id: &str, plan: Plan, price: &str) -> CartItem {
        CartItem {
            course_id: course_id.to_string(),
            plan,
            course_name: format!("{} course", course_id),
            price: price.to_string(),
        }
    }

    #[test]
    fn adding_duplicate_pair_is_a_no_op() {
        let mut cart = Cart::new();
        assert!(cart.add(item("c-programming", Plan::Short, "₹299")));
        assert!(!cart.add(item("c-programming", Plan::Short, "₹349")));
        assert_eq!(cart.len(), 1);
        // First occurrence wins, including its price.
        assert_eq!(cart.items()[0].price, "₹299");
    }

    #[test]
    fn same_course_different_plan_is_a_distinct_line() {
        let mut cart = Cart::new();
        cart.add(item("c-programming", Plan::Short, "₹299"));
        cart.add(item("c-programming", Plan::Long, "₹2,999"));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn remove_by_pair() {
        let mut cart = Cart::from_items([
            item("c-programming", Plan::Short, "₹299"),
            item("python", Plan::Long, "₹2,999"),
        ]);
        assert!(cart.remove("python", Plan::Long));
        assert!(!cart.remove("python", Plan::Long));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn from_items_dedups() {
        let cart = Cart::from_items([
            item("rust", Plan::Short, "₹499"),
            item("rust", Plan::Short, "₹499"),
        ]);
        assert_eq!(cart.len(), 1);
    }
}
