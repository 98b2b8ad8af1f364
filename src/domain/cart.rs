//! Marketplace cart owned by the current session.
//!
//! Quantities are stored in the unit's base: whole kilograms, litres and
//! pieces, and grams/millilitres for `gm`/`ml`. Sub-unit quantities move in
//! steps of [`SUB_UNIT_STEP`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{EntityId, Product, Rupees};

pub const SUB_UNIT_STEP: u32 = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Kg,
    Gm,
    Liter,
    Ml,
    #[default]
    #[serde(alias = "pcs", alias = "count")]
    Piece,
}

impl UnitKind {
    pub const ALL: [UnitKind; 5] = [
        UnitKind::Kg,
        UnitKind::Gm,
        UnitKind::Liter,
        UnitKind::Ml,
        UnitKind::Piece,
    ];

    /// Smallest quantity change allowed for this unit.
    pub fn step(&self) -> u32 {
        match self {
            UnitKind::Gm | UnitKind::Ml => SUB_UNIT_STEP,
            UnitKind::Kg | UnitKind::Liter | UnitKind::Piece => 1,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnitKind::Kg => "kg",
            UnitKind::Gm => "gm",
            UnitKind::Liter => "liter",
            UnitKind::Ml => "ml",
            UnitKind::Piece => "pcs",
        }
    }

    /// The larger unit a sub-unit rolls up into at 1000.
    fn major(&self) -> Option<UnitKind> {
        match self {
            UnitKind::Gm => Some(UnitKind::Kg),
            UnitKind::Ml => Some(UnitKind::Liter),
            _ => None,
        }
    }

    fn from_symbol(symbol: &str) -> Option<UnitKind> {
        match symbol.trim().to_ascii_lowercase().as_str() {
            "kg" => Some(UnitKind::Kg),
            "gm" | "g" => Some(UnitKind::Gm),
            "liter" | "litre" | "l" => Some(UnitKind::Liter),
            "ml" => Some(UnitKind::Ml),
            "pcs" | "pc" | "piece" | "pieces" => Some(UnitKind::Piece),
            _ => None,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for UnitKind {
    type Err = CartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        UnitKind::from_symbol(value).ok_or_else(|| CartError::Unparseable(value.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart is empty")]
    Empty,
    #[error("item {0} is not in the cart")]
    NotFound(EntityId),
    #[error("{quantity} {unit} is not a multiple of {step} {unit}")]
    Granularity {
        quantity: i64,
        unit: UnitKind,
        step: u32,
    },
    #[error("quantity {0} is too large")]
    Overflow(i64),
    #[error("order total is too large to place")]
    TotalTooLarge,
    #[error("cannot read quantity '{0}'")]
    Unparseable(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Same as the product id; one line per product.
    pub id: EntityId,
    pub name: String,
    pub seller: String,
    pub unit_price: Rupees,
    pub quantity: u32,
    pub unit: UnitKind,
}

impl CartItem {
    /// Saturates at `Rupees::MAX`; see [`CartItem::checked_line_total`].
    pub fn line_total(&self) -> Rupees {
        self.unit_price.saturating_mul(Rupees::from(self.quantity))
    }

    pub fn checked_line_total(&self) -> Option<Rupees> {
        self.unit_price.checked_mul(Rupees::from(self.quantity))
    }

    pub fn quantity_label(&self) -> String {
        format_quantity(self.quantity, self.unit)
    }
}

/// Snapshot returned by a successful checkout.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderSummary {
    pub items: Vec<CartItem>,
    pub total: Rupees,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Adds `quantity` of `product`, merging into an existing line for the same
    /// product. The amount is rounded up to the unit step and is at least one step.
    pub fn add_item(&mut self, product: &Product, quantity: u32) {
        let amount = snap_to_step(quantity, product.unit);
        if let Some(existing) = self.items.iter_mut().find(|item| item.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(amount);
            tracing::debug!(item = %existing.id, quantity = existing.quantity, "cart line increased");
            return;
        }

        self.items.push(CartItem {
            id: product.id.clone(),
            name: product.name.clone(),
            seller: product.seller.clone(),
            unit_price: product.price,
            quantity: amount,
            unit: product.unit,
        });
        tracing::debug!(item = %product.id, quantity = amount, "cart line added");
    }

    /// Sets the quantity of a line. Zero or below removes the line.
    pub fn update_quantity(&mut self, item_id: &str, new_quantity: i64) -> Result<(), CartError> {
        let Some(index) = self.items.iter().position(|item| item.id == item_id) else {
            return Err(CartError::NotFound(item_id.to_string()));
        };

        if new_quantity <= 0 {
            self.items.remove(index);
            return Ok(());
        }

        let unit = self.items[index].unit;
        let quantity = u32::try_from(new_quantity).map_err(|_| CartError::Overflow(new_quantity))?;
        if quantity % unit.step() != 0 {
            return Err(CartError::Granularity {
                quantity: new_quantity,
                unit,
                step: unit.step(),
            });
        }

        self.items[index].quantity = quantity;
        Ok(())
    }

    /// Moves a line one step up or down; stepping below one step removes it.
    pub fn step_quantity(&mut self, item_id: &str, up: bool) -> Result<(), CartError> {
        let item = self
            .get(item_id)
            .ok_or_else(|| CartError::NotFound(item_id.to_string()))?;
        let step = i64::from(item.unit.step());
        let current = i64::from(item.quantity);
        let next = if up { current + step } else { current - step };
        self.update_quantity(item_id, next)
    }

    pub fn remove_from_cart(&mut self, item_id: &str) {
        self.items.retain(|item| item.id != item_id);
    }

    /// Distinct lines, used for the badge.
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Display total, saturating at `Rupees::MAX`. Checkout uses the exact sum.
    pub fn total_price(&self) -> Rupees {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(0, Rupees::saturating_add)
    }

    fn checked_total(&self) -> Option<Rupees> {
        self.items.iter().try_fold(0, |total: Rupees, item| {
            item.checked_line_total().and_then(|line| total.checked_add(line))
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Closes the cart. Unreachable while empty.
    pub fn checkout(&mut self) -> Result<OrderSummary, CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        let total = self.checked_total().ok_or(CartError::TotalTooLarge)?;
        let items = std::mem::take(&mut self.items);
        tracing::info!(lines = items.len(), total, "cart checked out");
        Ok(OrderSummary { items, total })
    }
}

fn snap_to_step(quantity: u32, unit: UnitKind) -> u32 {
    let step = unit.step();
    let steps = quantity.div_ceil(step).max(1);
    steps.saturating_mul(step)
}

/// Human readable quantity. Sub-units at 1000 or more are shown in the major unit.
pub fn format_quantity(quantity: u32, unit: UnitKind) -> String {
    match unit.major() {
        Some(major) if quantity >= 1000 => {
            let whole = quantity / 1000;
            let fraction = quantity % 1000;
            if fraction == 0 {
                format!("{whole} {major}")
            } else {
                let digits = format!("{fraction:03}");
                format!("{whole}.{} {major}", digits.trim_end_matches('0'))
            }
        }
        _ => format!("{quantity} {unit}"),
    }
}

/// Reads a label produced by [`format_quantity`] back into the quantity stored
/// for a line of `unit`.
///
/// `"1.5 kg"` on a gram line is `1500`; a fractional major unit only fits a
/// sub-unit line. A bare number is read in the line's own unit.
pub fn parse_quantity(text: &str, unit: UnitKind) -> Result<u32, CartError> {
    let unparseable = || CartError::Unparseable(text.to_string());
    let trimmed = text.trim();
    let (number, shown) = match trimmed.split_once(' ') {
        Some((number, symbol)) => (
            number,
            UnitKind::from_symbol(symbol.trim()).ok_or_else(unparseable)?,
        ),
        None => (trimmed, unit),
    };

    if shown == unit {
        return number.parse::<u32>().map_err(|_| unparseable());
    }
    if unit.major() != Some(shown) {
        return Err(unparseable());
    }

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unparseable());
    }
    let whole = whole.parse::<u32>().map_err(|_| unparseable())?;
    let fraction = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<3}")
            .parse::<u32>()
            .map_err(|_| unparseable())?
    };
    whole
        .checked_mul(1000)
        .and_then(|value| value.checked_add(fraction))
        .ok_or_else(unparseable)
}
