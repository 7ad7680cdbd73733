//! Stock pre-check.
//!
//! [`StockValidator::validate`] reads every product named in the request exactly once
//! and compares each line against that product's per-size counter. It never writes.
//! A passing report is advisory: other shoppers may take the stock before reservation.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, instrument, warn};

use super::error::{CheckoutError, FailureStage};
use crate::clients::ProductCatalog;
use crate::model::{CartLine, Product, ProductId};

/// Outcome for one requested line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum LineStatus {
    Ok { available: i64 },
    Insufficient { available: i64 },
    UnknownSize,
    UnknownProduct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineCheck {
    pub line: CartLine,
    #[serde(flatten)]
    pub status: LineStatus,
}

impl LineCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, LineStatus::Ok { .. })
    }
}

/// Per-line results, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    lines: Vec<LineCheck>,
}

impl ValidationReport {
    pub fn lines(&self) -> &[LineCheck] {
        &self.lines
    }

    pub fn is_ok(&self) -> bool {
        self.lines.iter().all(LineCheck::is_ok)
    }

    /// The lines that cannot be fulfilled.
    pub fn rejections(&self) -> Vec<LineCheck> {
        self.lines.iter().filter(|c| !c.is_ok()).cloned().collect()
    }
}

#[derive(Clone)]
pub struct StockValidator {
    catalog: ProductCatalog,
}

impl StockValidator {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self { catalog }
    }

    /// # Errors
    ///
    /// [`CheckoutError::InvariantViolation`] if a requested size has a negative counter,
    /// [`CheckoutError::PersistenceFailure`] if a product cannot be read.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn validate(&self, lines: &[CartLine]) -> Result<ValidationReport, CheckoutError> {
        let mut products: BTreeMap<ProductId, Option<Product>> = BTreeMap::new();
        for line in lines {
            let id = line.product_id();
            if products.contains_key(&id) {
                continue;
            }
            let product = self.catalog.product(id).await.map_err(|e| {
                CheckoutError::PersistenceFailure {
                    stage: FailureStage::Validation,
                    reason: e.to_string(),
                    compensated: true,
                }
            })?;
            if let Some(product) = &product {
                if !product.is_reconciled() {
                    warn!(
                        product_id = %id,
                        aggregate = product.aggregate_stock,
                        derived = product.derived_stock(),
                        "Aggregate stock out of step with size counters"
                    );
                }
            }
            products.insert(id, product);
        }

        let mut checks = Vec::with_capacity(lines.len());
        for line in lines {
            let product = products.get(&line.product_id()).and_then(Option::as_ref);
            let status = match product.map(|p| p.stock_for(line.size())) {
                None => LineStatus::UnknownProduct,
                Some(None) => LineStatus::UnknownSize,
                Some(Some(available)) if available < 0 => {
                    error!(
                        product_id = %line.product_id(),
                        size = %line.size(),
                        available,
                        "Negative stock counter"
                    );
                    return Err(CheckoutError::InvariantViolation {
                        product_id: line.product_id(),
                        size: line.size().clone(),
                        quantity: available,
                    });
                }
                Some(Some(available)) if available < i64::from(line.quantity()) => {
                    LineStatus::Insufficient { available }
                }
                Some(Some(available)) => LineStatus::Ok { available },
            };
            checks.push(LineCheck {
                line: line.clone(),
                status,
            });
        }
        Ok(ValidationReport { lines: checks })
    }
}
