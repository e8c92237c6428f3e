use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{DashboardSummaryType, PerformanceType, RecentRentalType, ReportOutputType, RevenueOutputType, TopCarType, TrendPointType},
    records::CarStatus,
};

/***************** Query models *********************/

/**
 * Query parameters selecting a named reporting range.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    /**
     * One of `7days`, `30days`, `month`, `3months`, `year`. Anything else means `7days`.
     */
    pub range: Option<String>,
    /**
     * Overrides the current time, RFC 3339.
     */
    pub as_of: Option<DateTime<Utc>>,
}

/**
 * Query parameters for the rentals trend.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQuery {
    /**
     * `weekly` or `monthly`, defaults to `monthly`.
     */
    pub period: Option<String>,
    /**
     * Number of buckets, defaults to 6.
     */
    pub count: Option<u32>,
    /**
     * Overrides the current time, RFC 3339.
     */
    pub as_of: Option<DateTime<Utc>>,
}

/**
 * Query parameter limiting the size of a ranking.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/**
 * Query parameter limiting the size of the activity feed.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountQuery {
    pub count: Option<usize>,
}

/***************** Trend models *********************/

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPointElement {
    /**
     * Bucket label, `Mar 2024` or `Week 3`.
     */
    period: String,
    rentals: u64,
    revenue: Decimal,
}

impl From<TrendPointType> for TrendPointElement {
    fn from(point: TrendPointType) -> Self {
        TrendPointElement { period: point.period, rentals: point.rentals, revenue: point.revenue }
    }
}

/**
 * Response structure for the rentals trend, oldest bucket first.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResponse {
    trend: Vec<TrendPointElement>,
}

impl From<Vec<TrendPointType>> for TrendResponse {
    fn from(points: Vec<TrendPointType>) -> Self {
        TrendResponse { trend: points.into_iter().map(TrendPointElement::from).collect() }
    }
}

/***************** Ranking models *********************/

/**
 * A car in the top performers list.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCarElement {
    id: String,
    name: String,
    model: String,
    license_plate: Option<String>,
    daily_rate: Option<Decimal>,
    status: Option<CarStatus>,
    category_id: Option<String>,
    category_name: String,
    station_id: Option<String>,
    station_name: String,
    rental_count: u64,
    revenue: Decimal,
    /**
     * Illustrative percentage derived from the rental count only.
     */
    utilization_rate: u64,
}

impl From<TopCarType> for TopCarElement {
    fn from(car: TopCarType) -> Self {
        TopCarElement {
            id: car.id,
            name: car.name,
            model: car.model,
            license_plate: car.license_plate,
            daily_rate: car.daily_rate,
            status: car.status,
            category_id: car.category_id,
            category_name: car.category_name,
            station_id: car.station_id,
            station_name: car.station_name,
            rental_count: car.rental_count,
            revenue: car.revenue,
            utilization_rate: car.utilization_rate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCarsResponse {
    cars: Vec<TopCarElement>,
}

impl From<Vec<TopCarType>> for TopCarsResponse {
    fn from(cars: Vec<TopCarType>) -> Self {
        TopCarsResponse { cars: cars.into_iter().map(TopCarElement::from).collect() }
    }
}

/**
 * Rentals and revenue of a station or category.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceElement {
    id: String,
    name: String,
    rentals: u64,
    revenue: Decimal,
}

impl From<PerformanceType> for PerformanceElement {
    fn from(performance: PerformanceType) -> Self {
        PerformanceElement { id: performance.id, name: performance.name, rentals: performance.rentals, revenue: performance.revenue }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationPerformanceResponse {
    stations: Vec<PerformanceElement>,
}

impl From<Vec<PerformanceType>> for StationPerformanceResponse {
    fn from(stations: Vec<PerformanceType>) -> Self {
        StationPerformanceResponse { stations: stations.into_iter().map(PerformanceElement::from).collect() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformanceResponse {
    categories: Vec<PerformanceElement>,
}

impl From<Vec<PerformanceType>> for CategoryPerformanceResponse {
    fn from(categories: Vec<PerformanceType>) -> Self {
        CategoryPerformanceResponse { categories: categories.into_iter().map(PerformanceElement::from).collect() }
    }
}

/***************** Revenue and summary models *********************/

/**
 * Revenue of a range and of the range before it.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueResponse {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    revenue: Decimal,
    previous_revenue: Decimal,
    revenue_change_percent: Decimal,
}

impl From<RevenueOutputType> for RevenueResponse {
    fn from(output: RevenueOutputType) -> Self {
        RevenueResponse {
            start_date: output.range.start_date,
            end_date: output.range.end_date,
            revenue: output.revenue,
            previous_revenue: output.previous_revenue,
            revenue_change_percent: output.revenue_change_percent,
        }
    }
}

/**
 * Response structure for the dashboard header cards and chart.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryResponse {
    total_cars: u64,
    active_rentals: u64,
    total_customers: u64,
    revenue: RevenueResponse,
    trend: Vec<TrendPointElement>,
}

impl From<DashboardSummaryType> for DashboardSummaryResponse {
    fn from(summary: DashboardSummaryType) -> Self {
        DashboardSummaryResponse {
            total_cars: summary.total_cars,
            active_rentals: summary.active_rentals,
            total_customers: summary.total_customers,
            revenue: RevenueResponse::from(summary.revenue),
            trend: summary.trend.into_iter().map(TrendPointElement::from).collect(),
        }
    }
}

/***************** Activity models *********************/

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRentalElement {
    id: String,
    car_id: Option<String>,
    customer_id: Option<String>,
    status: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    duration_days: u64,
    revenue: Decimal,
}

impl From<RecentRentalType> for RecentRentalElement {
    fn from(rental: RecentRentalType) -> Self {
        RecentRentalElement {
            id: rental.id,
            car_id: rental.car_id,
            customer_id: rental.customer_id,
            status: rental.status,
            start_date: rental.start_date,
            end_date: rental.end_date,
            created_at: rental.created_at,
            duration_days: rental.duration_days,
            revenue: rental.revenue,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRentalsResponse {
    rentals: Vec<RecentRentalElement>,
}

impl From<Vec<RecentRentalType>> for RecentRentalsResponse {
    fn from(rentals: Vec<RecentRentalType>) -> Self {
        RecentRentalsResponse { rentals: rentals.into_iter().map(RecentRentalElement::from).collect() }
    }
}

/***************** Report models *********************/

/**
 * Response structure for the reports page.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    station_performance: Vec<PerformanceElement>,
    category_performance: Vec<PerformanceElement>,
    top_cars: Vec<TopCarElement>,
    rentals_trend: Vec<TrendPointElement>,
}

impl From<ReportOutputType> for ReportResponse {
    fn from(report: ReportOutputType) -> Self {
        ReportResponse {
            station_performance: report.station_performance.into_iter().map(PerformanceElement::from).collect(),
            category_performance: report.category_performance.into_iter().map(PerformanceElement::from).collect(),
            top_cars: report.top_cars.into_iter().map(TopCarElement::from).collect(),
            rentals_trend: report.rentals_trend.into_iter().map(TrendPointElement::from).collect(),
        }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::JwtAuthorization => StatusCode::UNAUTHORIZED,
        ErrorType::Initialization | ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Validation => StatusCode::BAD_REQUEST,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::JwtAuthorization => 1000,
        ErrorType::Initialization => 1001,
        ErrorType::DatabaseError => 1003,
        ErrorType::Validation => 1004,
    }
}
