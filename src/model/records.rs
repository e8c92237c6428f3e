use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::db::Document;

/**
 * Fleet status of a car.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CarStatus {
    Available,
    Rented,
    Maintenance,
    Unavailable,
}

impl FromStr for CarStatus {
    type Err = String;

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "Available" => Ok(CarStatus::Available),
            "Rented" => Ok(CarStatus::Rented),
            "Maintenance" => Ok(CarStatus::Maintenance),
            "Unavailable" => Ok(CarStatus::Unavailable),
            _ => Err(format!("Unknown car status {status}")),
        }
    }
}

/**
 * A car decoded from the `cars` collection.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub id: String,
    pub name: Option<String>,
    pub model: Option<String>,
    pub license_plate: Option<String>,
    pub daily_rate: Option<Decimal>,
    pub category_id: Option<String>,
    pub station_id: Option<String>,
    pub status: Option<CarStatus>,
}

impl From<&Document> for Car {
    fn from(document: &Document) -> Self {
        Car {
            id: document.id.clone(),
            name: document.string_field("name"),
            model: document.string_field("model"),
            license_plate: document.string_field("licensePlate"),
            daily_rate: document.decimal_field("dailyRate"),
            category_id: document.string_field("categoryId"),
            station_id: document.string_field("stationId"),
            status: document.string_field("status").and_then(|status| CarStatus::from_str(&status).ok()),
        }
    }
}

/**
 * A rental decoded from the `rentals` collection. Dates have already been normalized, an unparseable date is `None`.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Rental {
    pub id: String,
    pub car_id: Option<String>,
    pub customer_id: Option<String>,
    pub pickup_station_id: Option<String>,
    pub return_station_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Document> for Rental {
    fn from(document: &Document) -> Self {
        Rental {
            id: document.id.clone(),
            car_id: document.string_field("carId"),
            customer_id: document.string_field("customerId"),
            pickup_station_id: document.string_field("pickupStationId"),
            return_station_id: document.string_field("returnStationId"),
            start_date: document.date_field("startDate"),
            end_date: document.date_field("endDate"),
            total_amount: document.decimal_field("totalAmount"),
            status: document.string_field("status"),
            created_at: document.date_field("createdAt"),
        }
    }
}

/**
 * A pickup/return station.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: Option<String>,
}

impl From<&Document> for Station {
    fn from(document: &Document) -> Self {
        Station { id: document.id.clone(), name: document.string_field("name") }
    }
}

/**
 * A vehicle category.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: Option<String>,
}

impl From<&Document> for Category {
    fn from(document: &Document) -> Self {
        Category { id: document.id.clone(), name: document.string_field("name") }
    }
}

/**
 * Decodes every document of a collection snapshot, keeping store order.
 */
pub fn decode_all<'a, T: From<&'a Document>>(documents: &'a [Document]) -> Vec<T> {
    documents.iter().map(T::from).collect()
}
