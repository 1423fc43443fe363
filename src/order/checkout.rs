use serde::Serialize;

use crate::core::ValidationError;

pub const DELIVERY_FEE: f64 = 2.99;
pub const TAX_RATE: f64 = 0.08;

const MIN_ADDRESS_LEN: usize = 10;
const MIN_PHONE_LEN: usize = 10;

/// Raw checkout form input as typed by the buyer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderForm {
    pub address: String,
    pub phone: String,
}

/// Form that passed validation, already trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrderForm {
    address: String,
    phone: String,
}

impl ValidatedOrderForm {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

impl OrderForm {
    pub fn new(address: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            phone: phone.into(),
        }
    }

    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<ValidatedOrderForm, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let address = self.address.trim();
        if address.is_empty() {
            errors.push(ValidationError::AddressMissing);
        } else if address.chars().count() < MIN_ADDRESS_LEN {
            errors.push(ValidationError::AddressIncomplete);
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.push(ValidationError::PhoneMissing);
        } else if !is_valid_phone(phone) {
            errors.push(ValidationError::PhoneInvalid);
        }

        if errors.is_empty() {
            Ok(ValidatedOrderForm {
                address: address.to_string(),
                phone: phone.to_string(),
            })
        } else {
            Err(errors)
        }
    }
}

/// Optional leading '+', then at least ten digits, spaces, '-', '(' or ')'.
fn is_valid_phone(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    body.chars().count() >= MIN_PHONE_LEN
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub tax: f64,
    pub total: f64,
}

impl OrderTotals {
    pub fn for_price(price: f64) -> Self {
        let subtotal = price;
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            delivery_fee: DELIVERY_FEE,
            tax,
            total: subtotal + DELIVERY_FEE + tax,
        }
    }
}
