use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{
    models::{DateRange, PerformanceType, RecentRentalType, TimeRange, TopCarType, TrendInputType, TrendPeriod, TrendPointType},
    records::{Car, Category, Rental, Station},
};

/**
 * Milliseconds in a day, the unit rental durations are counted in.
 */
const MILLIS_PER_DAY: i64 = 86_400_000;

/**
 * Name shown for references that do not resolve.
 */
const UNKNOWN: &str = "Unknown";

/**
 * Inclusive day count of a rental: `ceil((end - start) / day) + 1`. May be zero or negative for reversed dates.
 */
fn rental_day_count(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> i64 {
    let diff = (end_date - start_date).num_milliseconds();
    -((-diff).div_euclid(MILLIS_PER_DAY)) + 1
}

/**
 * Inclusive day count of a rental floored at zero.
 */
pub fn rental_duration_days(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> u64 {
    u64::try_from(rental_day_count(start_date, end_date)).unwrap_or(0)
}

/**
 * Revenue of a single rental.
 *
 * Daily rate times the inclusive day count when the car, a positive rate and both dates are known
 * and the count is positive. Otherwise the stored total amount, or zero when that is missing too.
 */
pub fn revenue_of(rental: &Rental, car: Option<&Car>) -> Decimal {
    let fallback = rental.total_amount.unwrap_or(Decimal::ZERO);
    let (Some(car), Some(start_date), Some(end_date)) = (car, rental.start_date, rental.end_date) else {
        return fallback;
    };
    let Some(daily_rate) = car.daily_rate.filter(|rate| *rate > Decimal::ZERO) else {
        return fallback;
    };
    let days = rental_day_count(start_date, end_date);
    if days <= 0 {
        return fallback;
    }
    daily_rate.checked_mul(Decimal::from(days)).unwrap_or(fallback)
}

/**
 * Sum of two revenue amounts, saturating at `Decimal::MAX` or `Decimal::MIN`.
 */
fn add_revenue(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or(if amount.is_sign_negative() { Decimal::MIN } else { Decimal::MAX })
}

/**
 * Resolves a named range into an interval ending now.
 */
pub fn resolve_period_range(time_range: TimeRange, now: DateTime<Utc>) -> DateRange {
    let start_date = match time_range {
        TimeRange::SevenDays => now - TimeDelta::days(7),
        TimeRange::ThirtyDays => now - TimeDelta::days(30),
        TimeRange::Month => start_of_day(now.date_naive().with_day(1).unwrap_or(now.date_naive())),
        TimeRange::ThreeMonths => now.checked_sub_months(Months::new(3)).unwrap_or(now),
        TimeRange::Year => start_of_day(NaiveDate::from_ymd_opt(now.year(), 1, 1).unwrap_or(now.date_naive())),
    };
    DateRange::new(start_date, now)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}

/**
 * Labelled bucket intervals of a trend, newest first.
 *
 * Buckets are aligned to whole UTC days: a weekly bucket runs from 00:00 six days before its
 * last day to 23:59:59.999 of that day, so consecutive weeks touch without gaps or overlap.
 */
fn trend_buckets(input: TrendInputType, now: DateTime<Utc>) -> Vec<(String, DateRange)> {
    let today = now.date_naive();
    (0..input.count)
        .map(|index| match input.period {
            TrendPeriod::Monthly => {
                let month_index = i64::from(now.month0()) - i64::from(index);
                let year = now.year() + i32::try_from(month_index.div_euclid(12)).unwrap_or(0);
                let month = u32::try_from(month_index.rem_euclid(12)).unwrap_or(0) + 1;
                let first_day = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today);
                let last_day = first_day.checked_add_months(Months::new(1)).and_then(|next| next.pred_opt()).unwrap_or(first_day);
                (first_day.format("%b %Y").to_string(), DateRange::new(start_of_day(first_day), end_of_day(last_day)))
            }
            TrendPeriod::Weekly => {
                let last_day = today.checked_sub_days(Days::new(7 * u64::from(index))).unwrap_or(today);
                let first_day = last_day.checked_sub_days(Days::new(6)).unwrap_or(last_day);
                (format!("Week {}", input.count - index), DateRange::new(start_of_day(first_day), end_of_day(last_day)))
            }
        })
        .collect()
}

/**
 * Rental count and revenue per week or month, oldest first.
 *
 * Rentals are bucketed by start date; rentals without a usable start date are ignored.
 * When every bucket is empty the result is replaced by a zero-filled series with the same labels.
 * That substitution cannot tell "no data" apart from "quiet period" and is kept only for
 * compatibility with existing chart consumers.
 */
pub fn rentals_trend(rentals: &[Rental], cars: &[Car], input: TrendInputType, now: DateTime<Utc>) -> Vec<TrendPointType> {
    let car_index = index_by_id(cars, |car| car.id.as_str());
    let buckets = trend_buckets(input, now);
    let mut points: Vec<TrendPointType> = buckets
        .iter()
        .map(|(label, range)| {
            let (rentals_in_bucket, revenue) = rentals
                .iter()
                .filter(|rental| rental.start_date.is_some_and(|start_date| range.contains(start_date)))
                .fold((0_u64, Decimal::ZERO), |(count, revenue), rental| (count + 1, add_revenue(revenue, revenue_of(rental, lookup_car(&car_index, rental)))));
            TrendPointType::new(label.clone(), rentals_in_bucket, revenue)
        })
        .collect();
    if points.iter().all(|point| point.rentals == 0 && point.revenue.is_zero()) {
        debug!("No rental data found for {:?} trend, returning zero-filled series", input.period);
        points = buckets.into_iter().map(|(label, _)| TrendPointType::new(label, 0, Decimal::ZERO)).collect();
    }
    points.reverse();
    points
}

/**
 * Sum of rental revenue for rentals starting inside the range.
 */
pub fn period_revenue(rentals: &[Rental], cars: &[Car], range: &DateRange) -> Decimal {
    let car_index = index_by_id(cars, |car| car.id.as_str());
    rentals
        .iter()
        .filter(|rental| rental.start_date.is_some_and(|start_date| range.contains(start_date)))
        .fold(Decimal::ZERO, |total, rental| add_revenue(total, revenue_of(rental, lookup_car(&car_index, rental))))
}

/**
 * Percentage change from the previous revenue, one decimal. Zero when there is nothing to compare with.
 */
pub fn revenue_change_percent(current: Decimal, previous: Decimal) -> Decimal {
    if previous <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    current
        .checked_sub(previous)
        .and_then(|change| change.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::ZERO, |percent| percent.round_dp(1))
}

/**
 * Most rented cars, by rental count descending and car id ascending.
 */
pub fn top_cars(rentals: &[Rental], cars: &[Car], categories: &[Category], stations: &[Station], limit: usize) -> Vec<TopCarType> {
    let car_index = index_by_id(cars, |car| car.id.as_str());
    let category_index = index_by_id(categories, |category| category.id.as_str());
    let station_index = index_by_id(stations, |station| station.id.as_str());

    let mut car_stats: HashMap<&str, (u64, Decimal)> = HashMap::new();
    for rental in rentals {
        let Some(car_id) = rental.car_id.as_deref() else { continue };
        let stats = car_stats.entry(car_id).or_insert((0, Decimal::ZERO));
        stats.0 += 1;
        stats.1 = add_revenue(stats.1, revenue_of(rental, car_index.get(car_id).copied()));
    }

    let mut ranked: Vec<(&str, u64, Decimal)> = car_stats.into_iter().map(|(car_id, (count, revenue))| (car_id, count, revenue)).collect();
    ranked.sort_by(|first, second| second.1.cmp(&first.1).then_with(|| first.0.cmp(second.0)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(car_id, rental_count, revenue)| {
            let car = car_index.get(car_id).copied();
            let category_id = car.and_then(|car| car.category_id.clone());
            let station_id = car.and_then(|car| car.station_id.clone());
            TopCarType {
                id: car_id.to_string(),
                name: car.and_then(|car| car.name.clone()).unwrap_or_else(|| UNKNOWN.to_string()),
                model: car.and_then(|car| car.model.clone()).unwrap_or_else(|| UNKNOWN.to_string()),
                license_plate: car.and_then(|car| car.license_plate.clone()),
                daily_rate: car.and_then(|car| car.daily_rate),
                status: car.and_then(|car| car.status),
                category_name: resolve_name(&category_index, category_id.as_deref(), |category| category.name.as_deref()),
                category_id,
                station_name: resolve_name(&station_index, station_id.as_deref(), |station| station.name.as_deref()),
                station_id,
                rental_count,
                revenue,
                utilization_rate: rental_count.saturating_mul(20).min(100),
            }
        })
        .collect()
}

/**
 * Every station with the rentals picked up there, by rental count descending. Ties keep store order.
 */
pub fn station_performance(rentals: &[Rental], cars: &[Car], stations: &[Station]) -> Vec<PerformanceType> {
    let car_index = index_by_id(cars, |car| car.id.as_str());
    let mut performance: Vec<PerformanceType> = stations.iter().map(|station| PerformanceType::new(station.id.clone(), display_name(station.name.as_deref()))).collect();
    let positions = position_by_id(&performance);
    for rental in rentals {
        let Some(position) = rental.pickup_station_id.as_deref().and_then(|station_id| positions.get(station_id).copied()) else { continue };
        let revenue = revenue_of(rental, lookup_car(&car_index, rental));
        if let Some(entry) = performance.get_mut(position) {
            entry.rentals += 1;
            entry.revenue = add_revenue(entry.revenue, revenue);
        }
    }
    performance.sort_by(|first, second| second.rentals.cmp(&first.rentals));
    performance
}

/**
 * Every category with the rentals of its cars, by revenue descending. Ties keep store order.
 */
pub fn category_performance(rentals: &[Rental], cars: &[Car], categories: &[Category]) -> Vec<PerformanceType> {
    let car_index = index_by_id(cars, |car| car.id.as_str());
    let mut performance: Vec<PerformanceType> = categories.iter().map(|category| PerformanceType::new(category.id.clone(), display_name(category.name.as_deref()))).collect();
    let positions = position_by_id(&performance);
    for rental in rentals {
        let car = lookup_car(&car_index, rental);
        let Some(position) = car.and_then(|car| car.category_id.as_deref()).and_then(|category_id| positions.get(category_id).copied()) else { continue };
        let revenue = revenue_of(rental, car);
        if let Some(entry) = performance.get_mut(position) {
            entry.rentals += 1;
            entry.revenue = add_revenue(entry.revenue, revenue);
        }
    }
    performance.sort_by(|first, second| second.revenue.cmp(&first.revenue));
    performance
}

/**
 * Latest created rentals first. Rentals without a creation date sort as if created at the epoch.
 */
pub fn recent_rentals(rentals: &[Rental], cars: &[Car], count: usize) -> Vec<RecentRentalType> {
    let car_index = index_by_id(cars, |car| car.id.as_str());
    let mut sorted: Vec<&Rental> = rentals.iter().collect();
    sorted.sort_by_key(|rental| std::cmp::Reverse(rental.created_at.unwrap_or(DateTime::UNIX_EPOCH)));
    sorted
        .into_iter()
        .take(count)
        .map(|rental| RecentRentalType {
            id: rental.id.clone(),
            car_id: rental.car_id.clone(),
            customer_id: rental.customer_id.clone(),
            status: rental.status.clone(),
            start_date: rental.start_date,
            end_date: rental.end_date,
            created_at: rental.created_at,
            duration_days: match (rental.start_date, rental.end_date) {
                (Some(start_date), Some(end_date)) => rental_duration_days(start_date, end_date),
                _ => 0,
            },
            revenue: revenue_of(rental, lookup_car(&car_index, rental)),
        })
        .collect()
}

fn index_by_id<'a, T>(items: &'a [T], id_of: impl Fn(&'a T) -> &'a str) -> HashMap<&'a str, &'a T> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(id_of(item)).or_insert(item);
    }
    index
}

fn position_by_id(performance: &[PerformanceType]) -> HashMap<String, usize> {
    let mut positions = HashMap::with_capacity(performance.len());
    for (position, entry) in performance.iter().enumerate() {
        positions.entry(entry.id.clone()).or_insert(position);
    }
    positions
}

fn lookup_car<'a>(car_index: &HashMap<&str, &'a Car>, rental: &Rental) -> Option<&'a Car> {
    rental.car_id.as_deref().and_then(|car_id| car_index.get(car_id).copied())
}

fn resolve_name<T>(index: &HashMap<&str, &T>, id: Option<&str>, name_of: impl Fn(&T) -> Option<&str>) -> String {
    display_name(id.and_then(|id| index.get(id)).and_then(|item| name_of(*item)))
}

fn display_name(name: Option<&str>) -> String {
    name.unwrap_or(UNKNOWN).to_string()
}
