use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::records::CarStatus;

/**
 * Largest number of trend buckets a caller may ask for.
 */
pub const MAX_TREND_COUNT: u32 = 60;

/**
 * Largest number of entries returned by ranking and activity lists.
 */
pub const MAX_LIST_LIMIT: usize = 100;

/**
 * Named reporting range selected on the dashboard.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    SevenDays,
    ThirtyDays,
    Month,
    ThreeMonths,
    Year,
}

impl TimeRange {
    /**
     * Resolves a range token. Unknown or missing tokens fall back to the last seven days.
     */
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("30days") => TimeRange::ThirtyDays,
            Some("month") => TimeRange::Month,
            Some("3months") => TimeRange::ThreeMonths,
            Some("year") => TimeRange::Year,
            _ => TimeRange::SevenDays,
        }
    }

    /**
     * The trend shape the dashboard charts for this range.
     */
    pub fn trend_input(&self) -> TrendInputType {
        let period = match self {
            TimeRange::SevenDays | TimeRange::ThirtyDays => TrendPeriod::Weekly,
            _ => TrendPeriod::Monthly,
        };
        let count = match self {
            TimeRange::ThreeMonths => 3,
            TimeRange::Year => 12,
            _ => 6,
        };
        TrendInputType { period, count }
    }
}

/**
 * Inclusive date interval.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        DateRange { start_date, end_date }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /**
     * The interval of the same length immediately before this one, ending one millisecond before this one starts.
     */
    pub fn previous(&self) -> Self {
        let length = self.end_date - self.start_date;
        DateRange { start_date: self.start_date - length, end_date: self.start_date - TimeDelta::milliseconds(1) }
    }
}

/**
 * Bucket size of a rentals trend.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendPeriod {
    Weekly,
    Monthly,
}

impl FromStr for TrendPeriod {
    type Err = ApplicationError;

    fn from_str(period: &str) -> Result<Self, Self::Err> {
        match period {
            "weekly" => Ok(TrendPeriod::Weekly),
            "monthly" => Ok(TrendPeriod::Monthly),
            _ => Err(ApplicationError::new(ErrorType::Validation, format!("Unsupported trend period {period}"))),
        }
    }
}

/**
 * Validated trend request.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendInputType {
    pub period: TrendPeriod,
    pub count: u32,
}

impl TrendInputType {
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.count == 0 || self.count > MAX_TREND_COUNT {
            return Err(ApplicationError::new(ErrorType::Validation, format!("Trend count must be between 1 and {MAX_TREND_COUNT}")));
        }
        Ok(self)
    }
}

/**
 * Validates a list size given by a caller.
 */
pub fn validate_limit(limit: usize) -> Result<usize, ApplicationError> {
    if limit == 0 || limit > MAX_LIST_LIMIT {
        return Err(ApplicationError::new(ErrorType::Validation, format!("Limit must be between 1 and {MAX_LIST_LIMIT}")));
    }
    Ok(limit)
}

/**
 * One bucket of a rentals trend.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPointType {
    pub period: String,
    pub rentals: u64,
    pub revenue: Decimal,
}

impl TrendPointType {
    pub fn new(period: String, rentals: u64, revenue: Decimal) -> Self {
        TrendPointType { period, rentals, revenue }
    }
}

/**
 * A car with its rental statistics.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopCarType {
    pub id: String,
    pub name: String,
    pub model: String,
    pub license_plate: Option<String>,
    pub daily_rate: Option<Decimal>,
    pub status: Option<CarStatus>,
    pub category_id: Option<String>,
    pub category_name: String,
    pub station_id: Option<String>,
    pub station_name: String,
    pub rental_count: u64,
    pub revenue: Decimal,
    /**
     * Synthetic percentage, `min(rental_count * 20, 100)`. Not a measured utilization.
     */
    pub utilization_rate: u64,
}

/**
 * Rentals and revenue attributed to a station or a category.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceType {
    pub id: String,
    pub name: String,
    pub rentals: u64,
    pub revenue: Decimal,
}

impl PerformanceType {
    pub fn new(id: String, name: String) -> Self {
        PerformanceType { id, name, rentals: 0, revenue: Decimal::ZERO }
    }
}

/**
 * Revenue of a range compared with the range before it.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueOutputType {
    pub range: DateRange,
    pub revenue: Decimal,
    pub previous_revenue: Decimal,
    pub revenue_change_percent: Decimal,
}

/**
 * Dashboard counters, revenue and the trend chart for a range.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummaryType {
    pub total_cars: u64,
    pub active_rentals: u64,
    pub total_customers: u64,
    pub revenue: RevenueOutputType,
    pub trend: Vec<TrendPointType>,
}

/**
 * Entry of the recent activity feed.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentRentalType {
    pub id: String,
    pub car_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub duration_days: u64,
    pub revenue: Decimal,
}

/**
 * Everything the reports page shows.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutputType {
    pub station_performance: Vec<PerformanceType>,
    pub category_performance: Vec<PerformanceType>,
    pub top_cars: Vec<TopCarType>,
    pub rentals_trend: Vec<TrendPointType>,
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_time_range_tokens() {
        assert_eq!(TimeRange::from_token(Some("7days")), TimeRange::SevenDays);
        assert_eq!(TimeRange::from_token(Some("30days")), TimeRange::ThirtyDays);
        assert_eq!(TimeRange::from_token(Some("month")), TimeRange::Month);
        assert_eq!(TimeRange::from_token(Some("3months")), TimeRange::ThreeMonths);
        assert_eq!(TimeRange::from_token(Some("year")), TimeRange::Year);
        assert_eq!(TimeRange::from_token(Some("decade")), TimeRange::SevenDays);
        assert_eq!(TimeRange::from_token(None), TimeRange::SevenDays);
    }

    #[test]
    fn test_trend_input_for_range() {
        assert_eq!(TimeRange::SevenDays.trend_input(), TrendInputType { period: TrendPeriod::Weekly, count: 6 });
        assert_eq!(TimeRange::ThirtyDays.trend_input(), TrendInputType { period: TrendPeriod::Weekly, count: 6 });
        assert_eq!(TimeRange::Month.trend_input(), TrendInputType { period: TrendPeriod::Monthly, count: 6 });
        assert_eq!(TimeRange::ThreeMonths.trend_input(), TrendInputType { period: TrendPeriod::Monthly, count: 3 });
        assert_eq!(TimeRange::Year.trend_input(), TrendInputType { period: TrendPeriod::Monthly, count: 12 });
    }

    #[test]
    fn test_previous_range() {
        let range = DateRange::new(Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap(), Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        let previous = range.previous();
        assert_eq!(previous.start_date, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(previous.end_date, Utc.with_ymd_and_hms(2024, 3, 8, 11, 59, 59).unwrap() + TimeDelta::milliseconds(999));
        assert!(range.contains(range.start_date));
        assert!(!previous.contains(range.start_date));
    }

    #[test]
    fn test_trend_input_validation() {
        assert!(TrendInputType { period: TrendPeriod::Monthly, count: 0 }.validate().is_err());
        assert!(TrendInputType { period: TrendPeriod::Monthly, count: MAX_TREND_COUNT + 1 }.validate().is_err());
        assert!(TrendInputType { period: TrendPeriod::Weekly, count: 12 }.validate().is_ok());
        assert!(TrendPeriod::from_str("daily").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(MAX_LIST_LIMIT + 1).is_err());
        assert_eq!(validate_limit(5).unwrap(), 5);
    }
}
