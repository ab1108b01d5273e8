use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resources::task::Price;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Id(pub String);

impl fmt::Display for Id {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BillingGroup {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub balance: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageUsage {
    #[serde(default)]
    pub cost: Price,
}

/// Storage costs accrued by one project over the requested period.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageBreakdown {
    pub project_name: String,
    #[serde(default)]
    pub project_created_by: Option<String>,
    #[serde(default)]
    pub active: StorageUsage,
    #[serde(default)]
    pub archived: StorageUsage,
}

impl StorageBreakdown {
    pub fn total_cost(&self) -> f64 {
        self.active.cost.amount + self.archived.cost.amount
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BreakdownQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub limit: usize,
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_breakdown_total_cost() {
        let breakdown: StorageBreakdown = serde_json::from_value(json!({
            "project_name": "rna-seq",
            "active": {"size": {"value": "10"}, "cost": {"currency": "USD", "amount": "2.50"}},
            "archived": {"cost": {"currency": "USD", "amount": "0.25"}}
        }))
        .unwrap();

        assert_eq!(breakdown.total_cost(), 2.75);
    }
}
