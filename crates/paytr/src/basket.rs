use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::error::PaytrError;

/// One basket line. Serialized as the `[name, unit_price, qty]` triple the
/// hosted page expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketItem {
    pub name: String,
    /// Major units with a dot separator, e.g. "18.00".
    pub unit_price: String,
    pub quantity: u32,
}

impl BasketItem {
    pub fn new(name: impl Into<String>, unit_price: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            unit_price: unit_price.into(),
            quantity,
        }
    }
}

impl Serialize for BasketItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.name)?;
        tup.serialize_element(&self.unit_price)?;
        tup.serialize_element(&self.quantity)?;
        tup.end()
    }
}

impl std::str::FromStr for BasketItem {
    type Err = PaytrError;

    /// Parses `name:unit_price:qty`. The name may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (qty, price, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(q), Some(p), Some(n)) if !n.is_empty() => (q, p, n),
            _ => {
                return Err(PaytrError::InvalidRequest(format!(
                    "basket item must look like name:price:qty, got {s:?}"
                )))
            }
        };
        let quantity = qty
            .trim()
            .parse()
            .map_err(|_| PaytrError::InvalidRequest(format!("invalid basket quantity: {qty:?}")))?;
        Ok(BasketItem::new(name, price.trim(), quantity))
    }
}

/// Encode basket lines as base64 of a compact JSON array, the format of the
/// `user_basket` field.
pub fn encode_basket(items: &[BasketItem]) -> Result<String, PaytrError> {
    let json = serde_json::to_vec(items)?;
    Ok(STANDARD.encode(json))
}
