//! Built-in suites selectable by name.

use super::pipeline::Pipeline;
use super::steps::{
    CompleteOrder, CreateEquipment, CreateMaterial, CreateUser, DisassembleOrder, LaunchOrder,
    ReceiveStock, ReconcileStock, ShipOrder, UseProduct,
};
use crate::result::{ErpError, ErpResult};
use serde::{Deserialize, Serialize};

/// Full production cycle: stock, order, completion, disassembly, shipment
pub const PRODUCTION_CYCLE: &str = "production-cycle";
/// Create one fixture of each kind with a conflicting numeric field
pub const FIXTURES: &str = "fixtures";

/// All suite names
pub const SUITES: &[&str] = &[PRODUCTION_CYCLE, FIXTURES];

/// Knobs of the built-in suites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteOptions {
    /// Existing product to launch orders for
    pub product: String,
    /// Units received into stock
    pub stock_quantity: u32,
    /// Units ordered
    pub order_quantity: u32,
    /// Units disassembled after completion
    pub disassemble_quantity: u32,
    /// Archive fixtures after the run
    pub teardown: bool,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            product: "ERPTEST_PRODUCT_BASE".to_string(),
            stock_quantity: 50,
            order_quantity: 10,
            disassemble_quantity: 1,
            teardown: true,
        }
    }
}

impl SuiteOptions {
    fn validate(&self) -> ErpResult<()> {
        if self.product.trim().is_empty() {
            return Err(ErpError::ConfigError {
                message: "product name is empty".into(),
            });
        }
        if self.order_quantity == 0 || self.stock_quantity == 0 {
            return Err(ErpError::ConfigError {
                message: "quantities must be positive".into(),
            });
        }
        if self.disassemble_quantity >= self.order_quantity {
            return Err(ErpError::ConfigError {
                message: format!(
                    "cannot disassemble {} of {} ordered units and still ship",
                    self.disassemble_quantity, self.order_quantity
                ),
            });
        }
        Ok(())
    }
}

/// Build a suite by name
pub fn build(name: &str, options: &SuiteOptions) -> ErpResult<Pipeline> {
    options.validate()?;
    let pipeline = match name {
        PRODUCTION_CYCLE => Pipeline::new(PRODUCTION_CYCLE)
            .step(CreateMaterial::default())
            .step(ReceiveStock {
                quantity: options.stock_quantity,
            })
            .step(ReconcileStock)
            .step(UseProduct {
                product: options.product.clone(),
            })
            .step(LaunchOrder {
                quantity: options.order_quantity,
            })
            .step(CompleteOrder)
            .step(DisassembleOrder {
                quantity: options.disassemble_quantity,
            })
            .step(ShipOrder {
                quantity: Some(options.order_quantity - options.disassemble_quantity),
            }),
        FIXTURES => Pipeline::new(FIXTURES)
            .step(CreateUser)
            .step(CreateMaterial::default())
            .step(CreateEquipment),
        other => {
            return Err(ErpError::ConfigError {
                message: format!("unknown suite {other:?}, expected one of {}", SUITES.join(", ")),
            })
        }
    };
    let pipeline = pipeline.with_teardown(options.teardown);
    pipeline.validate()?;
    Ok(pipeline)
}
