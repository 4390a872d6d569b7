use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::finance::{Purchase, SaleKind, SaleRecord};
use crate::storage::traits::FinanceStorage;

const PURCHASES_FILE: &str = "purchases.csv";
const SALES_FILE: &str = "sales.csv";

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvPurchase {
    id: String,
    item: String,
    amount: f64,
    cat_id: Option<String>,
    purchase_date: String,
    created_at: String,
}

impl CsvPurchase {
    fn from_domain(purchase: &Purchase) -> Self {
        Self {
            id: purchase.id.clone(),
            item: purchase.item.clone(),
            amount: purchase.amount,
            cat_id: purchase.cat_id.clone(),
            purchase_date: purchase.purchase_date.format("%Y-%m-%d").to_string(),
            created_at: purchase.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<Purchase> {
        let purchase_date = NaiveDate::parse_from_str(&self.purchase_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid purchase_date in purchase {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in purchase {}", self.id))?
            .with_timezone(&Utc);

        Ok(Purchase {
            id: self.id,
            item: self.item,
            amount: self.amount,
            cat_id: self.cat_id,
            purchase_date,
            created_at,
        })
    }
}

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvSale {
    id: String,
    kind: String,
    item: String,
    amount: f64,
    kitten_id: Option<String>,
    sale_date: String,
    created_at: String,
}

impl CsvSale {
    fn from_domain(sale: &SaleRecord) -> Self {
        Self {
            id: sale.id.clone(),
            kind: sale.kind.to_string(),
            item: sale.item.clone(),
            amount: sale.amount,
            kitten_id: sale.kitten_id.clone(),
            sale_date: sale.sale_date.format("%Y-%m-%d").to_string(),
            created_at: sale.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<SaleRecord> {
        let kind = SaleKind::from_string(&self.kind)
            .map_err(|e| anyhow::anyhow!("{} in sale {}", e, self.id))?;
        let sale_date = NaiveDate::parse_from_str(&self.sale_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid sale_date in sale {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in sale {}", self.id))?
            .with_timezone(&Utc);

        Ok(SaleRecord {
            id: self.id,
            kind,
            item: self.item,
            amount: self.amount,
            kitten_id: self.kitten_id,
            sale_date,
            created_at,
        })
    }
}

/// CSV-based finance repository holding purchases and sales in two
/// collection files.
#[derive(Clone)]
pub struct FinanceRepository {
    connection: Arc<CsvConnection>,
}

impl FinanceRepository {
    /// Create a new CSV finance repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn purchases_path(&self) -> PathBuf {
        self.connection.collection_path(PURCHASES_FILE)
    }

    fn sales_path(&self) -> PathBuf {
        self.connection.collection_path(SALES_FILE)
    }

    fn read_purchases(&self) -> Result<Vec<Purchase>> {
        let file_path = self.purchases_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut purchases = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvPurchase = row.context("Malformed row in purchases.csv")?;
            purchases.push(row.into_domain()?);
        }
        Ok(purchases)
    }

    fn write_purchases(&self, purchases: &[Purchase]) -> Result<()> {
        let file_path = self.purchases_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for purchase in purchases {
                wtr.serialize(CsvPurchase::from_domain(purchase))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} purchases to {:?}", purchases.len(), file_path);
        Ok(())
    }

    fn read_sales(&self) -> Result<Vec<SaleRecord>> {
        let file_path = self.sales_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut sales = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvSale = row.context("Malformed row in sales.csv")?;
            sales.push(row.into_domain()?);
        }
        Ok(sales)
    }

    fn write_sales(&self, sales: &[SaleRecord]) -> Result<()> {
        let file_path = self.sales_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for sale in sales {
                wtr.serialize(CsvSale::from_domain(sale))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} sales to {:?}", sales.len(), file_path);
        Ok(())
    }
}

impl FinanceStorage for FinanceRepository {
    fn store_purchase(&self, purchase: &Purchase) -> Result<()> {
        let mut purchases = self.read_purchases()?;
        purchases.push(purchase.clone());
        self.write_purchases(&purchases)
    }

    fn list_purchases(&self) -> Result<Vec<Purchase>> {
        let mut purchases = self.read_purchases()?;
        purchases.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(purchases)
    }

    fn delete_purchase(&self, purchase_id: &str) -> Result<bool> {
        let mut purchases = self.read_purchases()?;
        let before = purchases.len();
        purchases.retain(|p| p.id != purchase_id);
        if purchases.len() == before {
            return Ok(false);
        }
        self.write_purchases(&purchases)?;
        Ok(true)
    }

    fn store_sale(&self, sale: &SaleRecord) -> Result<()> {
        let mut sales = self.read_sales()?;
        sales.push(sale.clone());
        self.write_sales(&sales)
    }

    fn list_sales(&self) -> Result<Vec<SaleRecord>> {
        let mut sales = self.read_sales()?;
        sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        Ok(sales)
    }

    fn delete_sale(&self, sale_id: &str) -> Result<bool> {
        let mut sales = self.read_sales()?;
        let before = sales.len();
        sales.retain(|s| s.id != sale_id);
        if sales.len() == before {
            return Ok(false);
        }
        self.write_sales(&sales)?;
        Ok(true)
    }
}
