//! Steps of the built-in suites.
//!
//! Fixture steps record the name they generate in the ledger before
//! submitting the form, so a fixture saved by a step that later fails is
//! still archived at teardown.

use super::context::{keys, ScenarioContext};
use super::pipeline::ScenarioStep;
use crate::fixture::FixtureKind;
use crate::page_object::PageObject;
use crate::pages::{
    EquipmentForm, EquipmentPage, MaterialForm, MaterialsPage, ProductionPage, ShippingPage, UserForm,
    UsersPage, WarehousePage,
};
use crate::result::ErpResult;
use crate::session::Session;
use async_trait::async_trait;

/// Create a material named after the run
#[derive(Debug, Clone, Default)]
pub struct CreateMaterial {
    /// Unit of measure to pick, if any
    pub unit: Option<String>,
}

#[async_trait]
impl ScenarioStep for CreateMaterial {
    fn name(&self) -> &str {
        "create-material"
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![keys::MATERIAL.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let name = ctx.namer().next(FixtureKind::Material);
        ctx.ledger_mut().record(FixtureKind::Material, &name)?;
        let page = MaterialsPage::new(session);
        page.open().await?;
        let form = MaterialForm {
            unit: self.unit.clone(),
            ..MaterialForm::named(&name)
        };
        page.create_material(&form).await?;
        ctx.insert(keys::MATERIAL, &name)
    }
}

/// Create equipment, stepping past taken inventory numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateEquipment;

#[async_trait]
impl ScenarioStep for CreateEquipment {
    fn name(&self) -> &str {
        "create-equipment"
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![keys::EQUIPMENT.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let name = ctx.namer().next(FixtureKind::Equipment);
        ctx.ledger_mut().record(FixtureKind::Equipment, &name)?;
        let page = EquipmentPage::new(session);
        page.open().await?;
        let number = page.create_equipment(&EquipmentForm::named(&name)).await?;
        tracing::info!(equipment = %name, inventory = number, "equipment created");
        ctx.insert(keys::EQUIPMENT, &name)
    }
}

/// Create a user, stepping past taken table numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateUser;

#[async_trait]
impl ScenarioStep for CreateUser {
    fn name(&self) -> &str {
        "create-user"
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![keys::USER.name(), keys::USER_TABLE_NUMBER.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let name = ctx.namer().next(FixtureKind::User);
        ctx.ledger_mut().record(FixtureKind::User, &name)?;
        let page = UsersPage::new(session);
        page.open_from_sidebar().await?;
        let created = page.create_user(&UserForm::fixture(&name)).await?;
        if created.unknown_failures > 0 {
            session.annotate(format!(
                "{} submission(s) failed without a conflict message",
                created.unknown_failures
            ));
        }
        ctx.insert(keys::USER, &created.last_name)?;
        ctx.insert(keys::USER_TABLE_NUMBER, &created.table_number)
    }
}

/// Put an existing product into the context
#[derive(Debug, Clone)]
pub struct UseProduct {
    /// Product name as listed in the launch form
    pub product: String,
}

#[async_trait]
impl ScenarioStep for UseProduct {
    fn name(&self) -> &str {
        "use-product"
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![keys::PRODUCT.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        session.annotate(format!("product {}", self.product));
        ctx.insert(keys::PRODUCT, &self.product)
    }
}

/// Receive stock of the run's material and check the on-hand count
#[derive(Debug, Clone, Copy)]
pub struct ReceiveStock {
    /// Units received
    pub quantity: u32,
}

#[async_trait]
impl ScenarioStep for ReceiveStock {
    fn name(&self) -> &str {
        "receive-stock"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![keys::MATERIAL.name()]
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![keys::STOCK_BEFORE.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let material = ctx.get(keys::MATERIAL, self.name())?;
        let page = WarehousePage::new(session);
        page.open().await?;
        // a fresh material has no stock row yet
        let before = match page.stock_count(&material).await {
            Ok(count) => count,
            Err(e) if e.is_timeout() => 0,
            Err(e) => return Err(e),
        };
        ctx.insert(keys::STOCK_BEFORE, &before)?;
        page.receive_stock(&material, self.quantity).await?;
        let after = page.stock_count(&material).await?;
        session
            .soft_eq(&after, &(before + u64::from(self.quantity)), "stock after receipt")
            .await;
        Ok(())
    }
}

/// Cross-check the stock drill-down against its API
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileStock;

#[async_trait]
impl ScenarioStep for ReconcileStock {
    fn name(&self) -> &str {
        "reconcile-warehouse"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![keys::MATERIAL.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let material = ctx.get(keys::MATERIAL, self.name())?;
        let page = WarehousePage::new(session);
        page.open().await?;
        let outcome = page.reconcile(&material).await?;
        session.annotate(format!(
            "{material}: {} row(s) shown, {} returned",
            outcome.ui_rows, outcome.api_entities
        ));
        Ok(())
    }
}

/// Launch a production order tagged with an order fixture name
#[derive(Debug, Clone, Copy)]
pub struct LaunchOrder {
    /// Units ordered
    pub quantity: u32,
}

#[async_trait]
impl ScenarioStep for LaunchOrder {
    fn name(&self) -> &str {
        "launch-order"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![keys::PRODUCT.name()]
    }

    fn produces(&self) -> Vec<&'static str> {
        vec![keys::ORDER_NUMBER.name(), keys::ORDER_QUANTITY.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let product = ctx.get(keys::PRODUCT, self.name())?;
        let note = ctx.namer().next(FixtureKind::Order);
        ctx.ledger_mut().record(FixtureKind::Order, &note)?;
        let page = ProductionPage::new(session);
        page.open().await?;
        let number = page
            .launch_order_with_note(&product, self.quantity, Some(&note))
            .await?;
        ctx.insert(keys::ORDER_NUMBER, &number)?;
        ctx.insert(keys::ORDER_QUANTITY, &self.quantity)
    }
}

/// Complete the launched order and check it is fully made
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteOrder;

#[async_trait]
impl ScenarioStep for CompleteOrder {
    fn name(&self) -> &str {
        "complete-order"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![keys::ORDER_NUMBER.name(), keys::ORDER_QUANTITY.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let order = ctx.get(keys::ORDER_NUMBER, self.name())?;
        let quantity = ctx.get(keys::ORDER_QUANTITY, self.name())?;
        let page = ProductionPage::new(session);
        page.open().await?;
        page.complete_order(&order).await?;
        let counts = page.order_counts(&order).await?;
        session
            .soft_eq(&counts.made, &u64::from(quantity), "units made")
            .await;
        session.soft_true(counts.is_complete(), "order complete").await;
        Ok(())
    }
}

/// Disassemble part of the completed order
#[derive(Debug, Clone, Copy)]
pub struct DisassembleOrder {
    /// Units taken apart
    pub quantity: u32,
}

#[async_trait]
impl ScenarioStep for DisassembleOrder {
    fn name(&self) -> &str {
        "disassemble"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![keys::ORDER_NUMBER.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let order = ctx.get(keys::ORDER_NUMBER, self.name())?;
        let page = ProductionPage::new(session);
        page.open().await?;
        page.disassemble_order(&order, self.quantity).await
    }
}

/// Ship the order and check the shipped count
#[derive(Debug, Clone, Copy)]
pub struct ShipOrder {
    /// Units shipped; the ordered quantity when unset
    pub quantity: Option<u32>,
}

#[async_trait]
impl ScenarioStep for ShipOrder {
    fn name(&self) -> &str {
        "ship-order"
    }

    fn requires(&self) -> Vec<&'static str> {
        vec![keys::ORDER_NUMBER.name(), keys::ORDER_QUANTITY.name()]
    }

    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()> {
        let order = ctx.get(keys::ORDER_NUMBER, self.name())?;
        let quantity = match self.quantity {
            Some(q) => q,
            None => ctx.get(keys::ORDER_QUANTITY, self.name())?,
        };
        let page = ShippingPage::new(session);
        page.open().await?;
        page.ship_order(&order, quantity).await?;
        let shipped = page.shipped_count(&order).await?;
        session
            .soft_eq(&shipped.left, &u64::from(quantity), "units shipped")
            .await;
        Ok(())
    }
}
