use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::model::dates::normalize_to_date;

/**
 * Collections kept in the document store by the dashboard.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cars,
    Rentals,
    Stations,
    Categories,
    /**
     * Not read by any aggregation. Known so that seed files exported from the dashboard load without warnings.
     */
    Colors,
    Users,
}

impl Collection {
    /**
     * Name of the collection in the store.
     */
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Cars => "cars",
            Collection::Rentals => "rentals",
            Collection::Stations => "stations",
            Collection::Categories => "categories",
            Collection::Colors => "colors",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "cars" => Ok(Collection::Cars),
            "rentals" => Ok(Collection::Rentals),
            "stations" => Ok(Collection::Stations),
            "categories" => Ok(Collection::Categories),
            "colors" => Ok(Collection::Colors),
            "users" => Ok(Collection::Users),
            _ => Err(format!("Unknown collection {name}")),
        }
    }
}

/**
 * Equality filter on a top level string field, used for counters.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: &str, value: &str) -> Self {
        FieldFilter { field: field.to_string(), value: value.to_string() }
    }

    /**
     * Checks the filter against a document, the same way the `->>` operator compares in Postgres.
     */
    pub fn matches(&self, document: &Document) -> bool {
        document.string_field(&self.field).is_some_and(|value| value == self.value)
    }
}

/**
 * Database response type for listing documents of a collection.
 */
pub type QueryDocumentDbResp = (String, Value);

/**
 * A raw document as read from the store. Fields are loosely typed, the accessors below never fail.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: &str, data: Value) -> Self {
        Document { id: id.to_string(), data }
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|value| !value.is_null())
    }

    /**
     * Reads a non-empty string field. Numbers are rendered as strings, since references are sometimes stored numerically.
     */
    pub fn string_field(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(value) if !value.is_empty() => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /**
     * Reads a decimal amount stored either as a JSON number or a numeric string.
     */
    pub fn decimal_field(&self, name: &str) -> Option<Decimal> {
        match self.field(name)? {
            Value::Number(value) => Decimal::from_str(&value.to_string()).ok().or_else(|| value.as_f64().and_then(|float| Decimal::try_from(float).ok())),
            Value::String(value) => Decimal::from_str(value.trim()).ok(),
            _ => None,
        }
    }

    /**
     * Reads a date-like field through `normalize_to_date`.
     */
    pub fn date_field(&self, name: &str) -> Option<DateTime<Utc>> {
        self.field(name).and_then(normalize_to_date)
    }
}

impl From<QueryDocumentDbResp> for Document {
    fn from((id, data): QueryDocumentDbResp) -> Self {
        Document { id, data }
    }
}
