use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref COLUMN_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// Dataset category a table belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sales,
    Leads,
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sales" => Some(Category::Sales),
            "leads" => Some(Category::Leads),
            _ => None,
        }
    }
}

/// Catalog entry for one dashboard table.
#[derive(Clone, Debug, Serialize)]
pub struct TableConfig {
    pub key: &'static str,
    pub title: &'static str,
    pub data_key: &'static str,
}

/// Validation rule set for one table: which columns must exist, which must be
/// numeric, what identifies a row and which value ranges are plausible.
///
/// Ranges are sanity checks on the demo domain (e.g. Brazilian latitudes),
/// violations produce warnings, never hard failures.
#[derive(Clone, Debug)]
pub struct TableSchema {
    pub data_key: &'static str,
    pub description: &'static str,
    pub required_columns: &'static [&'static str],
    pub numeric_columns: &'static [&'static str],
    /// Composite keys list more than one column.
    pub primary_key: &'static [&'static str],
    pub expected_ranges: &'static [(&'static str, f64, f64)],
}

const SALES_SCHEMAS: &[TableSchema] = &[
    TableSchema {
        data_key: "monthly",
        description: "Monthly performance data",
        required_columns: &["month", "leads", "sales", "revenue", "conversion", "avg_ticket"],
        numeric_columns: &["leads", "sales", "revenue", "conversion", "avg_ticket"],
        primary_key: &["month"],
        expected_ranges: &[
            ("leads", 0.0, 100_000.0),
            ("sales", 0.0, 10_000.0),
            ("revenue", 0.0, 1_000_000.0),
            ("conversion", 0.0, 1.0),
            ("avg_ticket", 0.0, 10_000.0),
        ],
    },
    TableSchema {
        data_key: "states",
        description: "Sales by Brazilian state",
        required_columns: &["state", "state_code", "sales", "lat", "lon", "region"],
        numeric_columns: &["sales", "lat", "lon"],
        primary_key: &["state_code"],
        expected_ranges: &[
            ("sales", 0.0, 10_000.0),
            ("lat", -35.0, 5.0),
            ("lon", -75.0, -30.0),
        ],
    },
    TableSchema {
        data_key: "brands",
        description: "Sales by vehicle brand",
        required_columns: &["brand", "sales", "category"],
        numeric_columns: &["sales"],
        primary_key: &["brand"],
        expected_ranges: &[("sales", 0.0, 10_000.0)],
    },
    TableSchema {
        data_key: "stores",
        description: "Performance by store/dealership",
        required_columns: &["store", "sales", "city", "state"],
        numeric_columns: &["sales"],
        primary_key: &["store"],
        expected_ranges: &[("sales", 0.0, 1_000.0)],
    },
    TableSchema {
        data_key: "visits",
        description: "Visits by day of week",
        required_columns: &["weekday", "visits", "rank"],
        numeric_columns: &["visits", "rank"],
        primary_key: &["weekday"],
        expected_ranges: &[("visits", 0.0, 10_000.0), ("rank", 0.0, 6.0)],
    },
];

const LEADS_SCHEMAS: &[TableSchema] = &[
    TableSchema {
        data_key: "gender",
        description: "Lead distribution by gender",
        required_columns: &["gender", "leads"],
        numeric_columns: &["leads"],
        primary_key: &["gender"],
        expected_ranges: &[("leads", 0.0, 100_000.0)],
    },
    TableSchema {
        data_key: "job_status",
        description: "Professional status of leads",
        required_columns: &["status", "leads_percent"],
        numeric_columns: &["leads_percent"],
        primary_key: &["status"],
        expected_ranges: &[("leads_percent", 0.0, 100.0)],
    },
    TableSchema {
        data_key: "age_band",
        description: "Lead distribution by age band",
        required_columns: &["band", "leads_percent"],
        numeric_columns: &["leads_percent"],
        primary_key: &["band"],
        expected_ranges: &[("leads_percent", 0.0, 100.0)],
    },
    TableSchema {
        data_key: "income_band",
        description: "Lead distribution by income band",
        required_columns: &["band", "leads_percent", "rank"],
        numeric_columns: &["leads_percent", "rank"],
        primary_key: &["band"],
        expected_ranges: &[("leads_percent", 0.0, 100.0), ("rank", 1.0, 10.0)],
    },
    TableSchema {
        data_key: "vehicle_condition",
        description: "Visits by vehicle condition (new vs used)",
        required_columns: &["condition", "visits"],
        numeric_columns: &["visits"],
        primary_key: &["condition"],
        expected_ranges: &[("visits", 0.0, 100_000.0)],
    },
    TableSchema {
        data_key: "vehicle_age",
        description: "Visits by vehicle age band",
        required_columns: &["band", "visits_percent", "rank"],
        numeric_columns: &["visits_percent", "rank"],
        primary_key: &["band"],
        expected_ranges: &[("visits_percent", 0.0, 100.0), ("rank", 1.0, 10.0)],
    },
    TableSchema {
        data_key: "vehicles_visited",
        description: "Most visited vehicles",
        required_columns: &["brand", "model", "visits"],
        numeric_columns: &["visits"],
        // Composite: the same brand lists many models.
        primary_key: &["brand", "model"],
        expected_ranges: &[("visits", 0.0, 10_000.0)],
    },
];

/// Rule sets for one category, or for every table when `None`.
pub fn schemas(category: Option<Category>) -> Vec<&'static TableSchema> {
    match category {
        Some(Category::Sales) => SALES_SCHEMAS.iter().collect(),
        Some(Category::Leads) => LEADS_SCHEMAS.iter().collect(),
        None => SALES_SCHEMAS.iter().chain(LEADS_SCHEMAS.iter()).collect(),
    }
}

pub fn schema_for(data_key: &str) -> Option<&'static TableSchema> {
    schemas(None).into_iter().find(|s| s.data_key == data_key)
}

/// The dashboard catalog: which tables exist and under which title.
pub fn table_configs(category: Category) -> &'static [TableConfig] {
    match category {
        Category::Sales => &[
            TableConfig { key: "monthly", title: "Monthly", data_key: "monthly" },
            TableConfig { key: "states", title: "States", data_key: "states" },
            TableConfig { key: "brands", title: "Brands", data_key: "brands" },
            TableConfig { key: "stores", title: "Stores", data_key: "stores" },
            TableConfig { key: "visits", title: "Visits", data_key: "visits" },
        ],
        Category::Leads => &[
            TableConfig { key: "gender", title: "Gender", data_key: "gender" },
            TableConfig { key: "job_status", title: "Professional Status", data_key: "job_status" },
            TableConfig { key: "age_band", title: "Age Band", data_key: "age_band" },
            TableConfig { key: "income_band", title: "Income Band", data_key: "income_band" },
            TableConfig { key: "vehicle_condition", title: "Vehicle Condition", data_key: "vehicle_condition" },
            TableConfig { key: "vehicle_age", title: "Vehicle Age", data_key: "vehicle_age" },
            TableConfig { key: "vehicles_visited", title: "Vehicles Visited", data_key: "vehicles_visited" },
        ],
    }
}

pub fn category_of(data_key: &str) -> Option<Category> {
    if SALES_SCHEMAS.iter().any(|s| s.data_key == data_key) {
        Some(Category::Sales)
    } else if LEADS_SCHEMAS.iter().any(|s| s.data_key == data_key) {
        Some(Category::Leads)
    } else {
        None
    }
}

/// Validate a column-addition request against the rule set of its table.
///
/// Returns `Ok(())` or a human-readable rejection.
pub fn validate_column_addition(data_key: &str, column_name: &str) -> Result<(), String> {
    if column_name.trim().is_empty() {
        return Err("column name must not be empty".to_string());
    }
    if !COLUMN_NAME_REGEX.is_match(column_name) {
        return Err(
            "column name may only contain letters, digits and underscores".to_string(),
        );
    }
    if let Some(schema) = schema_for(data_key) {
        if schema.required_columns.contains(&column_name) {
            return Err(format!("column '{}' already exists in this table", column_name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_complete() {
        assert_eq!(schemas(Some(Category::Sales)).len(), 5);
        assert_eq!(schemas(Some(Category::Leads)).len(), 7);
        assert_eq!(schemas(None).len(), 12);
    }

    #[test]
    fn catalog_matches_registry() {
        for cat in [Category::Sales, Category::Leads] {
            for config in table_configs(cat) {
                let schema = schema_for(config.data_key).expect("schema for catalog entry");
                assert_eq!(schema.data_key, config.data_key);
                assert_eq!(category_of(config.data_key), Some(cat));
                // The catalog endpoint serves this alongside the title.
                assert!(!schema.description.is_empty());
            }
        }
        assert!(schema_for("bogus").is_none());
        assert!(category_of("bogus").is_none());
    }

    #[test]
    fn composite_key_declared() {
        let schema = schema_for("vehicles_visited").unwrap();
        assert_eq!(schema.primary_key, &["brand", "model"]);
    }

    #[test]
    fn column_addition_rules() {
        assert!(validate_column_addition("brands", "roi").is_ok());
        assert!(validate_column_addition("brands", "").is_err());
        assert!(validate_column_addition("brands", "a b").is_err());
        assert!(validate_column_addition("brands", "sales").is_err());
        // Unknown tables only get the name checks.
        assert!(validate_column_addition("bogus", "anything").is_ok());
    }
}
