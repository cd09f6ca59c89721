use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

use crate::{catalog, errors::ServiceError};

/// One line of a submitted cart. The client owns cart state; the server
/// only ever validates a snapshot against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: u32,
}

/// Optional delivery details captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

/// The checkout payload as received from the client. Every field is
/// untrusted input: the total is recomputed server-side and the cart is
/// checked line by line against the catalog.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(custom = "validate_cart_lines")]
    pub cart: Vec<CartLine>,
    pub total_amount: i64,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub customer: Option<CustomerDetails>,
}

fn validate_cart_lines(cart: &Vec<CartLine>) -> Result<(), ValidationError> {
    if cart.is_empty() {
        let mut err = ValidationError::new("cart");
        err.message = Some("cart must contain at least one line".into());
        return Err(err);
    }

    let mut seen = HashSet::new();
    for line in cart {
        if line.quantity == 0 {
            let mut err = ValidationError::new("cart");
            err.message = Some("cart line quantity must be at least 1".into());
            return Err(err);
        }
        if !seen.insert(line.product_id) {
            let mut err = ValidationError::new("cart");
            err.message = Some("cart contains duplicate product lines".into());
            return Err(err);
        }
    }
    Ok(())
}

/// A cart line joined with its catalog product, as persisted on the order
/// and echoed through gateway metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichedLine {
    pub product_id: i32,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
}

impl EnrichedLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}

/// Joins cart lines with the catalog. Unknown product ids are a
/// validation failure, not a silent skip.
pub fn enrich(lines: &[CartLine]) -> Result<Vec<EnrichedLine>, ServiceError> {
    lines
        .iter()
        .map(|line| {
            let product = catalog::find(line.product_id).ok_or_else(|| {
                ServiceError::Validation(format!("unknown product id {}", line.product_id))
            })?;
            Ok(EnrichedLine {
                product_id: product.id,
                name: product.name.to_string(),
                unit_price: product.unit_price,
                quantity: line.quantity,
            })
        })
        .collect()
}

/// Recomputes the cart total from catalog prices. This is the only total
/// the server trusts; the client-sent figure is reconciled against it.
pub fn recompute_total(lines: &[CartLine]) -> Result<i64, ServiceError> {
    let mut total: i64 = 0;
    for line in lines {
        let product = catalog::find(line.product_id).ok_or_else(|| {
            ServiceError::Validation(format!("unknown product id {}", line.product_id))
        })?;
        let line_total = product
            .unit_price
            .checked_mul(line.quantity as i64)
            .ok_or_else(|| ServiceError::Validation("cart total overflows".into()))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| ServiceError::Validation("cart total overflows".into()))?;
    }
    Ok(total)
}
