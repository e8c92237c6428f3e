use std::str::FromStr;

use actix_web::{HttpRequest, HttpResponse, get, web};
use chrono::Utc;
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{
            CategoryPerformanceResponse, CountQuery, DashboardSummaryResponse, LimitQuery, RangeQuery, RecentRentalsResponse, ReportResponse, RevenueResponse, StationPerformanceResponse,
            TopCarsResponse, TrendQuery, TrendResponse,
        },
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{TimeRange, TrendInputType, TrendPeriod, validate_limit},
    },
};

const DEFAULT_TREND_COUNT: u32 = 6;
const DEFAULT_TOP_CARS: usize = 5;
const DEFAULT_RECENT_RENTALS: usize = 5;

/**
 * Endpoint for the dashboard header cards and chart.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "getDashboardSummary", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/summary")]
pub async fn dashboard_summary(http_request: HttpRequest, query: web::Query<RangeQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let time_range = TimeRange::from_token(query.range.as_deref());
    let now = query.as_of.unwrap_or_else(Utc::now);
    let summary = app_state.analytics_service.get_dashboard_summary(time_range, now).instrument(span).await?;
    Ok(HttpResponse::Ok().json(DashboardSummaryResponse::from(summary)))
}

/**
 * Endpoint for revenue of a range compared with the range before it.
 */
#[instrument(skip(http_request, app_state), fields(service = "getRevenue", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/revenue")]
pub async fn revenue(http_request: HttpRequest, query: web::Query<RangeQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let time_range = TimeRange::from_token(query.range.as_deref());
    let now = query.as_of.unwrap_or_else(Utc::now);
    let output = app_state.analytics_service.get_revenue(time_range, now).instrument(span).await?;
    Ok(HttpResponse::Ok().json(RevenueResponse::from(output)))
}

/**
 * Endpoint for rentals and revenue per week or month.
 */
#[instrument(skip(http_request, app_state), fields(service = "getRentalsTrend", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/trend")]
pub async fn rentals_trend(http_request: HttpRequest, query: web::Query<TrendQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let period = query.period.as_deref().map(TrendPeriod::from_str).transpose()?.unwrap_or(TrendPeriod::Monthly);
    let trend_input = TrendInputType { period, count: query.count.unwrap_or(DEFAULT_TREND_COUNT) }.validate()?;
    let now = query.as_of.unwrap_or_else(Utc::now);
    let trend = app_state.analytics_service.get_rentals_trend(trend_input, now).instrument(span).await?;
    Ok(HttpResponse::Ok().json(TrendResponse::from(trend)))
}

/**
 * Endpoint for the most rented cars.
 */
#[instrument(skip(http_request, app_state), fields(service = "getTopCars", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/top-cars")]
pub async fn top_cars(http_request: HttpRequest, query: web::Query<LimitQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_TOP_CARS))?;
    let cars = app_state.analytics_service.get_top_cars(limit).instrument(span).await?;
    Ok(HttpResponse::Ok().json(TopCarsResponse::from(cars)))
}

#[instrument(skip(http_request, app_state), fields(service = "getStationPerformance", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/stations")]
pub async fn station_performance(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let stations = app_state.analytics_service.get_station_performance().instrument(span).await?;
    Ok(HttpResponse::Ok().json(StationPerformanceResponse::from(stations)))
}

#[instrument(skip(http_request, app_state), fields(service = "getCategoryPerformance", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/categories")]
pub async fn category_performance(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let categories = app_state.analytics_service.get_category_performance().instrument(span).await?;
    Ok(HttpResponse::Ok().json(CategoryPerformanceResponse::from(categories)))
}

/**
 * Endpoint for the activity feed, newest first.
 */
#[instrument(skip(http_request, app_state), fields(service = "getRecentRentals", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/recent-rentals")]
pub async fn recent_rentals(http_request: HttpRequest, query: web::Query<CountQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let count = validate_limit(query.count.unwrap_or(DEFAULT_RECENT_RENTALS))?;
    let rentals = app_state.analytics_service.get_recent_rentals(count).instrument(span).await?;
    Ok(HttpResponse::Ok().json(RecentRentalsResponse::from(rentals)))
}

/**
 * Endpoint for the reports page, all sections computed from one snapshot.
 */
#[instrument(skip(http_request, app_state), fields(service = "getReport", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/analytics/report")]
pub async fn report(http_request: HttpRequest, query: web::Query<RangeQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let time_range = TimeRange::from_token(query.range.as_deref());
    let now = query.as_of.unwrap_or_else(Utc::now);
    let output = app_state.analytics_service.get_report(time_range, now).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ReportResponse::from(output)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod test {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        api::security::{
            JwtSecurityService,
            test::{TEST_SECRET, hs256_token},
        },
        dao::store::{ConfiguredStore, SeedDocumentStore},
        service::analytics::AnalyticsService,
    };

    fn app_state() -> web::Data<AppState> {
        let seed = json!({
            "stations": [{"id": "st-1", "name": "Airport"}, {"id": "st-2", "name": "Harbour"}],
            "categories": [{"id": "cat-1", "name": "Compact"}],
            "cars": [
                {"id": "c1", "name": "Corolla", "model": "Toyota", "licensePlate": "AB-123", "dailyRate": 50, "categoryId": "cat-1", "stationId": "st-1", "status": "Rented"},
                {"id": "c2", "name": "Golf", "model": "Volkswagen", "dailyRate": 60, "categoryId": "cat-1", "stationId": "st-2", "status": "Available"}
            ],
            "rentals": [
                {"id": "r1", "carId": "c1", "pickupStationId": "st-1", "startDate": "2024-01-01", "endDate": "2024-01-03", "status": "Completed", "createdAt": "2023-12-30T10:00:00Z"},
                {"id": "r2", "carId": "c1", "pickupStationId": "st-1", "startDate": "2024-03-10", "endDate": "2024-03-11", "status": "Active", "createdAt": "2024-03-09T10:00:00Z"},
                {"id": "r3", "carId": "c2", "pickupStationId": "st-2", "startDate": "2024-02-05", "endDate": "2024-02-05", "status": "Completed", "createdAt": "2024-02-01T10:00:00Z"}
            ],
            "users": [{"id": "u1", "role": "customer"}]
        });
        let store = SeedDocumentStore::from_json(&seed.to_string()).unwrap();
        let jwt_service = JwtSecurityService::new(TEST_SECRET.as_bytes(), "HS256", true).unwrap();
        web::Data::new(AppState::new(jwt_service, AnalyticsService::new(ConfiguredStore::Seed(store))))
    }

    fn authorization() -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", hs256_token(true)))
    }

    #[actix_web::test]
    async fn test_trend_monthly() {
        let app = test::init_service(App::new().app_data(app_state()).service(rentals_trend)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/trend?period=monthly&count=3&asOf=2024-03-15T12:00:00Z").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({"trend": [
                {"period": "Jan 2024", "rentals": 1, "revenue": 150.0},
                {"period": "Feb 2024", "rentals": 1, "revenue": 60.0},
                {"period": "Mar 2024", "rentals": 1, "revenue": 100.0}
            ]})
        );
    }

    #[actix_web::test]
    async fn test_trend_invalid_period() {
        let app = test::init_service(App::new().app_data(app_state()).service(rentals_trend)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/trend?period=daily").insert_header(authorization()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 1004);
    }

    #[actix_web::test]
    async fn test_unauthorized_without_token() {
        let app = test::init_service(App::new().app_data(app_state()).service(station_performance)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/stations").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let non_admin = test::TestRequest::get().uri("/api/services/v1_0/analytics/stations").insert_header(("Authorization", format!("Bearer {}", hs256_token(false)))).to_request();
        assert_eq!(test::call_service(&app, non_admin).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_top_cars_and_limit_validation() {
        let app = test::init_service(App::new().app_data(app_state()).service(top_cars)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/top-cars?limit=1").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let cars = body["cars"].as_array().unwrap();
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0]["id"], "c1");
        assert_eq!(cars[0]["licensePlate"], "AB-123");
        assert_eq!(cars[0]["rentalCount"], 2);
        assert_eq!(cars[0]["utilizationRate"], 40);
        assert_eq!(cars[0]["stationName"], "Airport");
        let too_many = test::TestRequest::get().uri("/api/services/v1_0/analytics/top-cars?limit=1000").insert_header(authorization()).to_request();
        assert_eq!(test::call_service(&app, too_many).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_station_and_category_performance() {
        let app = test::init_service(App::new().app_data(app_state()).service(station_performance).service(category_performance)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/stations").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({"stations": [
                {"id": "st-1", "name": "Airport", "rentals": 2, "revenue": 250.0},
                {"id": "st-2", "name": "Harbour", "rentals": 1, "revenue": 60.0}
            ]})
        );
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/categories").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"categories": [{"id": "cat-1", "name": "Compact", "rentals": 3, "revenue": 310.0}]}));
    }

    #[actix_web::test]
    async fn test_recent_rentals() {
        let app = test::init_service(App::new().app_data(app_state()).service(recent_rentals)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/recent-rentals?count=2").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let rentals = body["rentals"].as_array().unwrap();
        assert_eq!(rentals.iter().map(|rental| rental["id"].as_str().unwrap()).collect::<Vec<_>>(), vec!["r2", "r3"]);
        assert_eq!(rentals[0]["durationDays"], 2);
    }

    #[actix_web::test]
    async fn test_summary_and_report() {
        let app = test::init_service(App::new().app_data(app_state()).service(dashboard_summary).service(revenue).service(report)).await;
        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/summary?range=7days&asOf=2024-03-15T12:00:00Z").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalCars"], 2);
        assert_eq!(body["activeRentals"], 1);
        assert_eq!(body["totalCustomers"], 1);
        assert_eq!(body["revenue"]["revenue"], 100.0);
        assert_eq!(body["trend"].as_array().unwrap().len(), 6);

        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/revenue?range=7days&asOf=2024-03-15T12:00:00Z").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["revenue"], 100.0);
        assert_eq!(body["previousRevenue"], 0.0);

        let req = test::TestRequest::get().uri("/api/services/v1_0/analytics/report?range=year&asOf=2024-03-15T12:00:00Z").insert_header(authorization()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["stationPerformance"].as_array().unwrap().len(), 2);
        assert_eq!(body["categoryPerformance"].as_array().unwrap().len(), 1);
        assert_eq!(body["topCars"].as_array().unwrap().len(), 2);
        assert_eq!(body["rentalsTrend"].as_array().unwrap().len(), 12);
    }

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = test::TestRequest::default().insert_header(("X-Trace-ID", "test")).to_http_request();
        assert_eq!(get_trace_id(&request), "test");
    }

    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = test::TestRequest::default().to_http_request();
        assert!(!get_trace_id(&request).is_empty());
    }
}
