use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::commands::finance::{
    ListPurchasesResult, ListSalesResult, RecordPurchaseCommand, RecordPurchaseResult,
    RecordSaleCommand, RecordSaleResult,
};
use crate::domain::models::finance::{Purchase, SaleKind, SaleRecord};
use crate::storage::csv::{CatRepository, CsvConnection, FinanceRepository};
use crate::storage::traits::{CatStorage, FinanceStorage};

/// Service for money movements and the per-cat income/expense totals they
/// accumulate.
///
/// Accumulation happens once, when a record is made, against the cattery as
/// it stands at that moment. Deleting a record later does not roll totals
/// back: the cattery may have changed in between, and reversing against the
/// current one would hit the wrong cats.
#[derive(Clone)]
pub struct FinanceService {
    cat_repository: CatRepository,
    finance_repository: FinanceRepository,
}

impl FinanceService {
    /// Create a new FinanceService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        Self {
            cat_repository: CatRepository::new(csv_conn.clone()),
            finance_repository: FinanceRepository::new(csv_conn),
        }
    }

    /// Record an expense. A single-cat purchase books the full amount against
    /// that cat; a shared one splits it evenly across every cat currently in
    /// the cattery.
    pub fn record_purchase(&self, command: RecordPurchaseCommand) -> Result<RecordPurchaseResult> {
        if command.item.trim().is_empty() {
            return Err(anyhow::anyhow!("Item cannot be empty"));
        }
        if command.amount <= 0.0 {
            return Err(anyhow::anyhow!("Amount must be positive"));
        }
        let purchase_date = parse_date_or_today(command.purchase_date.as_deref(), "purchase_date")?;

        // For a single-cat expense the cat must exist before anything is
        // written, otherwise an orphaned purchase would be left behind
        let single_cat = match command.cat_id {
            Some(ref cat_id) => Some(
                self.cat_repository
                    .get_cat(cat_id)?
                    .ok_or_else(|| anyhow::anyhow!("Cat not found: {}", cat_id))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let purchase = Purchase {
            id: Purchase::generate_id(now.timestamp_millis() as u64),
            item: command.item.trim().to_string(),
            amount: command.amount,
            cat_id: command.cat_id.clone(),
            purchase_date,
            created_at: now,
        };
        self.finance_repository.store_purchase(&purchase)?;

        match single_cat {
            Some(mut cat) => {
                cat.total_expense += purchase.amount;
                cat.updated_at = Utc::now();
                self.cat_repository.update_cat(&cat)?;
                info!(
                    "Recorded purchase '{}' ({}) against {}",
                    purchase.item, purchase.amount, cat.name
                );
            }
            None => {
                let cats = self.cat_repository.list_cats()?;
                if cats.is_empty() {
                    warn!(
                        "No cats to share purchase '{}' across, recording without accumulation",
                        purchase.item
                    );
                } else {
                    let share = purchase.amount / cats.len() as f64;
                    for mut cat in cats {
                        cat.total_expense += share;
                        cat.updated_at = Utc::now();
                        self.cat_repository.update_cat(&cat)?;
                    }
                    info!(
                        "Recorded shared purchase '{}' ({}), {} per cat",
                        purchase.item, purchase.amount, share
                    );
                }
            }
        }

        Ok(RecordPurchaseResult { purchase })
    }

    /// Record a sale. Kitten sales credit half the amount to each of the
    /// kitten's parents that still exist; goods sales accumulate nothing.
    pub fn record_sale(&self, command: RecordSaleCommand) -> Result<RecordSaleResult> {
        if command.item.trim().is_empty() {
            return Err(anyhow::anyhow!("Item cannot be empty"));
        }
        if command.amount <= 0.0 {
            return Err(anyhow::anyhow!("Amount must be positive"));
        }
        let sale_date = parse_date_or_today(command.sale_date.as_deref(), "sale_date")?;

        match command.kind {
            SaleKind::Kitten => self.record_kitten_sale(command, sale_date),
            SaleKind::Goods => self.record_goods_sale(command, sale_date),
        }
    }

    /// List all purchases, most recent first
    pub fn list_purchases(&self) -> Result<ListPurchasesResult> {
        let purchases = self.finance_repository.list_purchases()?;
        Ok(ListPurchasesResult { purchases })
    }

    /// List all sales, most recent first
    pub fn list_sales(&self) -> Result<ListSalesResult> {
        let sales = self.finance_repository.list_sales()?;
        Ok(ListSalesResult { sales })
    }

    /// Delete a purchase. Totals accumulated on cats when it was recorded
    /// stay as they are.
    pub fn delete_purchase(&self, purchase_id: &str) -> Result<()> {
        if !self.finance_repository.delete_purchase(purchase_id)? {
            return Err(anyhow::anyhow!("Purchase not found: {}", purchase_id));
        }
        info!("Deleted purchase {}", purchase_id);
        Ok(())
    }

    /// Delete a sale. Totals accumulated on cats when it was recorded stay
    /// as they are.
    pub fn delete_sale(&self, sale_id: &str) -> Result<()> {
        if !self.finance_repository.delete_sale(sale_id)? {
            return Err(anyhow::anyhow!("Sale not found: {}", sale_id));
        }
        info!("Deleted sale {}", sale_id);
        Ok(())
    }

    fn record_kitten_sale(
        &self,
        command: RecordSaleCommand,
        sale_date: NaiveDate,
    ) -> Result<RecordSaleResult> {
        let kitten_id = command
            .kitten_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("A kitten sale must reference the sold kitten"))?;
        let kitten = self
            .cat_repository
            .get_cat(kitten_id)?
            .ok_or_else(|| anyhow::anyhow!("Kitten not found: {}", kitten_id))?;

        let now = Utc::now();
        let sale = SaleRecord {
            id: SaleRecord::generate_id(now.timestamp_millis() as u64),
            kind: SaleKind::Kitten,
            item: command.item.trim().to_string(),
            amount: command.amount,
            kitten_id: Some(kitten.id.clone()),
            sale_date,
            created_at: now,
        };
        self.finance_repository.store_sale(&sale)?;

        let half = sale.amount / 2.0;
        self.credit_parent(kitten.father_id.as_deref(), half, &kitten.id)?;
        self.credit_parent(kitten.mother_id.as_deref(), half, &kitten.id)?;

        info!(
            "Recorded kitten sale of {} ({}) for {}",
            kitten.name, sale.amount, sale.id
        );
        Ok(RecordSaleResult { sale })
    }

    fn record_goods_sale(
        &self,
        command: RecordSaleCommand,
        sale_date: NaiveDate,
    ) -> Result<RecordSaleResult> {
        if command.kitten_id.is_some() {
            warn!("Ignoring kitten reference on a goods sale");
        }

        let now = Utc::now();
        let sale = SaleRecord {
            id: SaleRecord::generate_id(now.timestamp_millis() as u64),
            kind: SaleKind::Goods,
            item: command.item.trim().to_string(),
            amount: command.amount,
            kitten_id: None,
            sale_date,
            created_at: now,
        };
        self.finance_repository.store_sale(&sale)?;

        info!("Recorded goods sale '{}' ({})", sale.item, sale.amount);
        Ok(RecordSaleResult { sale })
    }

    /// Credit one parent with its half of a kitten sale. A parent that was
    /// never recorded or has since been deleted is skipped with a warning.
    fn credit_parent(&self, parent_id: Option<&str>, half: f64, kitten_id: &str) -> Result<()> {
        let parent_id = match parent_id {
            Some(id) => id,
            None => return Ok(()),
        };

        match self.cat_repository.get_cat(parent_id)? {
            Some(mut parent) => {
                parent.total_income += half;
                parent.updated_at = Utc::now();
                self.cat_repository.update_cat(&parent)?;
                info!(
                    "Credited {} with {} from the sale of kitten {}",
                    parent.name, half, kitten_id
                );
            }
            None => {
                warn!(
                    "Parent {} of kitten {} not found, skipping income credit",
                    parent_id, kitten_id
                );
            }
        }
        Ok(())
    }
}

fn parse_date_or_today(value: Option<&str>, field: &str) -> Result<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid {} format, expected YYYY-MM-DD", field)),
        None => Ok(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cat_service::CatService;
    use crate::domain::commands::cats::{CreateCatCommand, GetCatCommand};
    use crate::domain::models::cat::Cat;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn setup_test() -> (FinanceService, CatService, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let conn = Arc::new(env.connection.clone());
        let finance_service = FinanceService::new(conn.clone());
        let cat_service = CatService::new(conn);
        (finance_service, cat_service, env)
    }

    fn create_cat(service: &CatService, name: &str) -> Cat {
        create_cat_with_parents(service, name, None, None)
    }

    fn create_cat_with_parents(
        service: &CatService,
        name: &str,
        father_id: Option<String>,
        mother_id: Option<String>,
    ) -> Cat {
        service
            .create_cat(CreateCatCommand {
                name: name.to_string(),
                breed: "Ragdoll".to_string(),
                color: "Blue point".to_string(),
                birth_date: None,
                arrival_date: None,
                age: Some(1),
                father_id,
                mother_id,
                weight: 4.0,
            })
            .unwrap()
            .cat
    }

    fn fetch_cat(service: &CatService, cat_id: &str) -> Cat {
        service
            .get_cat(GetCatCommand {
                cat_id: cat_id.to_string(),
            })
            .unwrap()
            .cat
            .unwrap()
    }

    #[test]
    fn test_single_cat_purchase_books_full_amount() {
        let (finance, cats, _env) = setup_test();
        let momo = create_cat(&cats, "Momo");
        create_cat(&cats, "Wasabi");

        finance
            .record_purchase(RecordPurchaseCommand {
                item: "猫粮".to_string(),
                amount: 300.0,
                cat_id: Some(momo.id.clone()),
                purchase_date: None,
            })
            .unwrap();

        assert_eq!(fetch_cat(&cats, &momo.id).total_expense, 300.0);

        let others = cats.list_cats().unwrap().cats;
        let wasabi = others.iter().find(|c| c.name == "Wasabi").unwrap();
        assert_eq!(wasabi.total_expense, 0.0);
    }

    #[test]
    fn test_single_cat_purchase_missing_cat_stores_nothing() {
        let (finance, _cats, _env) = setup_test();

        let result = finance.record_purchase(RecordPurchaseCommand {
            item: "猫粮".to_string(),
            amount: 300.0,
            cat_id: Some("cat::0".to_string()),
            purchase_date: None,
        });
        assert!(result.is_err());
        assert!(finance.list_purchases().unwrap().purchases.is_empty());
    }

    #[test]
    fn test_shared_purchase_splits_evenly() {
        let (finance, cats, _env) = setup_test();
        let momo = create_cat(&cats, "Momo");
        let wasabi = create_cat(&cats, "Wasabi");

        finance
            .record_purchase(RecordPurchaseCommand {
                item: "猫砂".to_string(),
                amount: 100.0,
                cat_id: None,
                purchase_date: None,
            })
            .unwrap();

        assert_eq!(fetch_cat(&cats, &momo.id).total_expense, 50.0);
        assert_eq!(fetch_cat(&cats, &wasabi.id).total_expense, 50.0);
    }

    #[test]
    fn test_shared_purchase_with_empty_cattery_still_stores() {
        let (finance, _cats, _env) = setup_test();

        finance
            .record_purchase(RecordPurchaseCommand {
                item: "猫砂".to_string(),
                amount: 100.0,
                cat_id: None,
                purchase_date: None,
            })
            .unwrap();

        assert_eq!(finance.list_purchases().unwrap().purchases.len(), 1);
    }

    #[test]
    fn test_purchase_validation() {
        let (finance, _cats, _env) = setup_test();

        assert!(finance
            .record_purchase(RecordPurchaseCommand {
                item: " ".to_string(),
                amount: 100.0,
                cat_id: None,
                purchase_date: None,
            })
            .is_err());

        assert!(finance
            .record_purchase(RecordPurchaseCommand {
                item: "猫砂".to_string(),
                amount: 0.0,
                cat_id: None,
                purchase_date: None,
            })
            .is_err());

        assert!(finance
            .record_purchase(RecordPurchaseCommand {
                item: "猫砂".to_string(),
                amount: 100.0,
                cat_id: None,
                purchase_date: Some("2026/01/01".to_string()),
            })
            .is_err());
    }

    #[test]
    fn test_kitten_sale_credits_both_parents() {
        let (finance, cats, _env) = setup_test();
        let father = create_cat(&cats, "Father");
        let mother = create_cat(&cats, "Mother");
        let kitten = create_cat_with_parents(
            &cats,
            "Kitten",
            Some(father.id.clone()),
            Some(mother.id.clone()),
        );

        finance
            .record_sale(RecordSaleCommand {
                kind: SaleKind::Kitten,
                item: "布偶幼猫".to_string(),
                amount: 8000.0,
                kitten_id: Some(kitten.id),
                sale_date: None,
            })
            .unwrap();

        assert_eq!(fetch_cat(&cats, &father.id).total_income, 4000.0);
        assert_eq!(fetch_cat(&cats, &mother.id).total_income, 4000.0);
    }

    #[test]
    fn test_kitten_sale_skips_missing_parent() {
        let (finance, cats, _env) = setup_test();
        let mother = create_cat(&cats, "Mother");
        let kitten = create_cat_with_parents(
            &cats,
            "Kitten",
            Some("cat::0".to_string()),
            Some(mother.id.clone()),
        );

        finance
            .record_sale(RecordSaleCommand {
                kind: SaleKind::Kitten,
                item: "布偶幼猫".to_string(),
                amount: 8000.0,
                kitten_id: Some(kitten.id),
                sale_date: None,
            })
            .unwrap();

        assert_eq!(fetch_cat(&cats, &mother.id).total_income, 4000.0);
    }

    #[test]
    fn test_kitten_sale_without_parents_accumulates_nothing() {
        let (finance, cats, _env) = setup_test();
        let kitten = create_cat(&cats, "Kitten");

        finance
            .record_sale(RecordSaleCommand {
                kind: SaleKind::Kitten,
                item: "布偶幼猫".to_string(),
                amount: 8000.0,
                kitten_id: Some(kitten.id.clone()),
                sale_date: None,
            })
            .unwrap();

        assert_eq!(fetch_cat(&cats, &kitten.id).total_income, 0.0);
        assert_eq!(finance.list_sales().unwrap().sales.len(), 1);
    }

    #[test]
    fn test_kitten_sale_requires_existing_kitten() {
        let (finance, _cats, _env) = setup_test();

        let without_reference = finance.record_sale(RecordSaleCommand {
            kind: SaleKind::Kitten,
            item: "布偶幼猫".to_string(),
            amount: 8000.0,
            kitten_id: None,
            sale_date: None,
        });
        assert!(without_reference.is_err());

        let missing_kitten = finance.record_sale(RecordSaleCommand {
            kind: SaleKind::Kitten,
            item: "布偶幼猫".to_string(),
            amount: 8000.0,
            kitten_id: Some("cat::0".to_string()),
            sale_date: None,
        });
        assert!(missing_kitten.is_err());
        assert!(finance.list_sales().unwrap().sales.is_empty());
    }

    #[test]
    fn test_goods_sale_accumulates_nothing() {
        let (finance, cats, _env) = setup_test();
        let momo = create_cat(&cats, "Momo");

        let result = finance
            .record_sale(RecordSaleCommand {
                kind: SaleKind::Goods,
                item: "猫爬架".to_string(),
                amount: 200.0,
                kitten_id: None,
                sale_date: None,
            })
            .unwrap();
        assert_eq!(result.sale.kind, SaleKind::Goods);
        assert_eq!(result.sale.kitten_id, None);

        assert_eq!(fetch_cat(&cats, &momo.id).total_income, 0.0);
    }

    #[test]
    fn test_delete_purchase_keeps_accumulated_totals() {
        let (finance, cats, _env) = setup_test();
        let momo = create_cat(&cats, "Momo");

        let purchase = finance
            .record_purchase(RecordPurchaseCommand {
                item: "猫粮".to_string(),
                amount: 300.0,
                cat_id: Some(momo.id.clone()),
                purchase_date: None,
            })
            .unwrap()
            .purchase;

        finance.delete_purchase(&purchase.id).unwrap();

        assert!(finance.list_purchases().unwrap().purchases.is_empty());
        assert_eq!(fetch_cat(&cats, &momo.id).total_expense, 300.0);
    }

    #[test]
    fn test_delete_missing_records_fail() {
        let (finance, _cats, _env) = setup_test();
        assert!(finance.delete_purchase("purchase::0").is_err());
        assert!(finance.delete_sale("sale::0").is_err());
    }
}
