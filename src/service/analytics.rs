use chrono::{DateTime, Utc};
use futures_util::try_join;
use tracing::instrument;

use crate::{
    dao::store::DocumentStore,
    model::{
        apperror::ApplicationError,
        db::{Collection, Document, FieldFilter},
        models::{DashboardSummaryType, PerformanceType, RecentRentalType, ReportOutputType, RevenueOutputType, TimeRange, TopCarType, TrendInputType, TrendPointType},
        records::{Car, Category, Rental, Station, decode_all},
    },
    service::aggregation::{
        category_performance, period_revenue, recent_rentals, rentals_trend, resolve_period_range, revenue_change_percent, station_performance, top_cars,
    },
};

/**
 * Number of cars listed on the reports page.
 */
const REPORT_TOP_CARS: usize = 10;

/**
 * Represents the service computing rental analytics from store snapshots.
 *
 * Every operation reads the collections it needs in parallel and fails as soon as one read fails.
 * Nothing is cached between calls.
 */
pub struct AnalyticsService<S: DocumentStore> {
    /**
     * The store the dashboard documents are read from.
     */
    store: S,
}

impl<S: DocumentStore> AnalyticsService<S> {
    /**
     * Creates a new instance of `AnalyticsService`.
     *
     * # Arguments
     * `store`: The document store to read from.
     *
     * # Returns
     * A new instance of `AnalyticsService`.
     */
    pub fn new(store: S) -> Self {
        AnalyticsService { store }
    }

    /**
     * Reads a whole collection and decodes it.
     */
    async fn fetch<T>(&self, collection: Collection) -> Result<Vec<T>, ApplicationError>
    where
        T: for<'a> From<&'a Document>,
    {
        let documents = self.store.list_all(collection).await?;
        Ok(decode_all(&documents))
    }

    /**
     * Retrieves the dashboard counters, the revenue of the range compared with the range before it, and the trend chart.
     *
     * # Arguments
     * `time_range`: The selected range.
     * `now`: End of the range.
     *
     * # Returns
     * A Result containing `DashboardSummaryType` or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_dashboard_summary(&self, time_range: TimeRange, now: DateTime<Utc>) -> Result<DashboardSummaryType, ApplicationError> {
        let (total_cars, active_rentals, total_customers, cars, rentals) = try_join!(
            self.store.count(Collection::Cars, None),
            self.store.count(Collection::Rentals, Some(FieldFilter::new("status", "Active"))),
            self.store.count(Collection::Users, Some(FieldFilter::new("role", "customer"))),
            self.fetch::<Car>(Collection::Cars),
            self.fetch::<Rental>(Collection::Rentals),
        )?;
        let revenue = Self::revenue_for(&rentals, &cars, time_range, now);
        let trend = rentals_trend(&rentals, &cars, time_range.trend_input(), now);
        Ok(DashboardSummaryType { total_cars, active_rentals, total_customers, revenue, trend })
    }

    /**
     * Retrieves the revenue of a range and of the range before it.
     *
     * # Arguments
     * `time_range`: The selected range.
     * `now`: End of the range.
     *
     * # Returns
     * A Result containing `RevenueOutputType` or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_revenue(&self, time_range: TimeRange, now: DateTime<Utc>) -> Result<RevenueOutputType, ApplicationError> {
        let (cars, rentals) = try_join!(self.fetch::<Car>(Collection::Cars), self.fetch::<Rental>(Collection::Rentals))?;
        Ok(Self::revenue_for(&rentals, &cars, time_range, now))
    }

    /**
     * Retrieves rental count and revenue per week or month, oldest first.
     *
     * # Arguments
     * `trend_input`: Validated period and bucket count.
     * `now`: Reference time of the newest bucket.
     *
     * # Returns
     * A Result containing the trend points or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_rentals_trend(&self, trend_input: TrendInputType, now: DateTime<Utc>) -> Result<Vec<TrendPointType>, ApplicationError> {
        let (cars, rentals) = try_join!(self.fetch::<Car>(Collection::Cars), self.fetch::<Rental>(Collection::Rentals))?;
        Ok(rentals_trend(&rentals, &cars, trend_input, now))
    }

    /**
     * Retrieves the most rented cars.
     *
     * # Arguments
     * `limit`: Maximum number of cars to return.
     *
     * # Returns
     * A Result containing the ranked cars or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_top_cars(&self, limit: usize) -> Result<Vec<TopCarType>, ApplicationError> {
        let (rentals, cars, categories, stations) = try_join!(
            self.fetch::<Rental>(Collection::Rentals),
            self.fetch::<Car>(Collection::Cars),
            self.fetch::<Category>(Collection::Categories),
            self.fetch::<Station>(Collection::Stations),
        )?;
        Ok(top_cars(&rentals, &cars, &categories, &stations, limit))
    }

    /**
     * Retrieves rentals and revenue per pickup station.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_station_performance(&self) -> Result<Vec<PerformanceType>, ApplicationError> {
        let (stations, cars, rentals) = try_join!(self.fetch::<Station>(Collection::Stations), self.fetch::<Car>(Collection::Cars), self.fetch::<Rental>(Collection::Rentals))?;
        Ok(station_performance(&rentals, &cars, &stations))
    }

    /**
     * Retrieves rentals and revenue per vehicle category.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_category_performance(&self) -> Result<Vec<PerformanceType>, ApplicationError> {
        let (categories, cars, rentals) = try_join!(self.fetch::<Category>(Collection::Categories), self.fetch::<Car>(Collection::Cars), self.fetch::<Rental>(Collection::Rentals))?;
        Ok(category_performance(&rentals, &cars, &categories))
    }

    /**
     * Retrieves the latest created rentals for the activity feed.
     *
     * # Arguments
     * `count`: Maximum number of rentals to return.
     *
     * # Returns
     * A Result containing the rentals, newest first, or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_recent_rentals(&self, count: usize) -> Result<Vec<RecentRentalType>, ApplicationError> {
        let (rentals, cars) = try_join!(self.fetch::<Rental>(Collection::Rentals), self.fetch::<Car>(Collection::Cars))?;
        Ok(recent_rentals(&rentals, &cars, count))
    }

    /**
     * Retrieves everything the reports page shows from a single snapshot.
     *
     * # Arguments
     * `time_range`: The selected range, deciding the trend shape.
     * `now`: Reference time of the newest trend bucket.
     *
     * # Returns
     * A Result containing `ReportOutputType` or an `ApplicationError`.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn get_report(&self, time_range: TimeRange, now: DateTime<Utc>) -> Result<ReportOutputType, ApplicationError> {
        let (rentals, cars, categories, stations) = try_join!(
            self.fetch::<Rental>(Collection::Rentals),
            self.fetch::<Car>(Collection::Cars),
            self.fetch::<Category>(Collection::Categories),
            self.fetch::<Station>(Collection::Stations),
        )?;
        Ok(ReportOutputType {
            station_performance: station_performance(&rentals, &cars, &stations),
            category_performance: category_performance(&rentals, &cars, &categories),
            top_cars: top_cars(&rentals, &cars, &categories, &stations, REPORT_TOP_CARS),
            rentals_trend: rentals_trend(&rentals, &cars, time_range.trend_input(), now),
        })
    }

    fn revenue_for(rentals: &[Rental], cars: &[Car], time_range: TimeRange, now: DateTime<Utc>) -> RevenueOutputType {
        let range = resolve_period_range(time_range, now);
        let revenue = period_revenue(rentals, cars, &range);
        let previous_revenue = period_revenue(rentals, cars, &range.previous());
        RevenueOutputType { range, revenue, previous_revenue, revenue_change_percent: revenue_change_percent(revenue, previous_revenue) }
    }
}
