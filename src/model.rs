//! Sale record types.
//!
//! A sale has four business fields (`modelo`, `precio`, `comprador`,
//! `fecha`) plus a storage-assigned `id`. The HTTP surface and the queue
//! drain loop both produce [`NewSale`] values; only the HTTP surface
//! produces [`SaleChanges`].

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A persisted sale row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    pub modelo: String,
    pub precio: i64,
    pub comprador: String,
    pub fecha: String,
}

/// A sale ready to be inserted; every field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub modelo: String,
    #[serde(deserialize_with = "whole_number")]
    pub precio: i64,
    pub comprador: String,
    pub fecha: String,
}

/// Message body carried by the sales queue.
///
/// All four fields are required; a body missing any of them is a parse
/// error and the message is left on the queue.
pub type SalePayload = NewSale;

/// Incoming fields for create and update requests.
///
/// Every field is optional at the wire level. Falsy values (empty string,
/// `0`, `null`, absent) are treated as "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SaleChanges {
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default, deserialize_with = "optional_whole_number")]
    pub precio: Option<i64>,
    #[serde(default)]
    pub comprador: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
}

impl SaleChanges {
    /// Build a [`NewSale`] if every field is truthy.
    pub fn into_new_sale(self) -> Option<NewSale> {
        Some(NewSale {
            modelo: truthy_text(self.modelo)?,
            precio: truthy_number(self.precio)?,
            comprador: truthy_text(self.comprador)?,
            fecha: truthy_text(self.fecha)?,
        })
    }

    /// Drop falsy fields so only real replacements remain.
    pub fn normalized(self) -> Self {
        Self {
            modelo: truthy_text(self.modelo),
            precio: truthy_number(self.precio),
            comprador: truthy_text(self.comprador),
            fecha: truthy_text(self.fecha),
        }
    }
}

/// Accept any JSON number without a fractional part, so `20000.0` reads as `20000`.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    number_to_i64(&number)
        .ok_or_else(|| de::Error::custom(format!("precio must be a whole number, got {number}")))
}

fn optional_whole_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<Number>::deserialize(deserializer)?
        .map(|number| {
            number_to_i64(&number).ok_or_else(|| {
                de::Error::custom(format!("precio must be a whole number, got {number}"))
            })
        })
        .transpose()
}

fn number_to_i64(number: &Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    let n = number.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = n >= i64::MIN as f64 && n < i64::MAX as f64;
    (n.fract() == 0.0 && in_range).then_some(n as i64)
}

fn truthy_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn truthy_number(value: Option<i64>) -> Option<i64> {
    value.filter(|n| *n != 0)
}
