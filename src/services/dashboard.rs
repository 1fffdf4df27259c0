//! Dashboard metrics aggregation.
//!
//! Reads the bookings, users, therapists, orders and products collections
//! once each, then derives every KPI, trend, breakdown, ranking and the
//! activity feed in a single in-memory pass per collection.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::AddAssign;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::db::{collections, Document, DocumentStore};
use crate::errors::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::decode_record;
use crate::models::non_empty;
use crate::models::order::ShopOrder;
use crate::models::timestamp::{month_key, Timestamp};
use crate::models::user::UserProfile;

/// Colour for statuses missing from the table.
pub const DEFAULT_STATUS_COLOR: &str = "#94a3b8";

/// Palette assigned round-robin to session types.
pub const SESSION_TYPE_PALETTE: [&str; 6] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899",
];

const TOP_THERAPISTS_LIMIT: usize = 10;
const TOP_PRODUCTS_LIMIT: usize = 10;
const TOP_TIME_SLOTS_LIMIT: usize = 8;
const RECENT_ACTIVITY_LIMIT: usize = 10;
const TREND_WINDOW_MONTHS: u32 = 6;
const ACTIVE_WINDOW_DAYS: i64 = 30;

/// Chart colour for a booking or order status (case-insensitive).
pub fn status_color(status: &str) -> &'static str {
    match status.to_lowercase().as_str() {
        "pending" => "#f59e0b",
        "confirmed" | "processing" => "#3b82f6",
        "completed" | "delivered" => "#10b981",
        "cancelled" => "#ef4444",
        "failed" => "#6b7280",
        "shipped" => "#8b5cf6",
        _ => DEFAULT_STATUS_COLOR,
    }
}

/// Month-over-month growth in percent. A zero baseline reports 100% growth
/// when there is any current activity.
pub fn compute_growth(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    round_half_up((current - previous) / previous * 100.0)
}

/// Round to the nearest integer, halves toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn percentage(part: u64, whole: u64) -> i64 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0)
}

/// One point on a monthly trend chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartDataPoint {
    pub date: String,
    pub value: f64,
}

/// One slice of a categorical breakdown.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PieDataPoint {
    pub label: String,
    pub value: u64,
    pub color: String,
}

/// One row of a top-N list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedItem {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Booking,
    Signup,
    Order,
}

/// Entry of the recent-activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    /// ISO timestamp, empty when the source record has no usable date.
    pub timestamp: String,
    #[serde(skip)]
    at: Option<DateTime<Utc>>,
}

impl RecentActivity {
    fn new(id: &str, kind: ActivityKind, title: String, description: String, at: &Timestamp) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title,
            description,
            timestamp: at.to_iso(),
            at: at.get(),
        }
    }
}

/// Consolidated dashboard payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_users: u64,
    pub total_therapists: u64,
    pub total_bookings: u64,
    pub total_revenue: f64,
    pub total_orders: u64,
    pub total_products: u64,
    pub user_growth: i64,
    pub booking_growth: i64,
    pub revenue_growth: i64,
    pub completion_rate: i64,
    pub average_booking_value: i64,
    pub onboarding_rate: i64,
    pub active_users: u64,
    pub repeat_booking_users: u64,
    pub booking_trends: Vec<ChartDataPoint>,
    pub revenue_trends: Vec<ChartDataPoint>,
    pub new_users_trend: Vec<ChartDataPoint>,
    pub bookings_by_status: Vec<PieDataPoint>,
    pub orders_by_status: Vec<PieDataPoint>,
    pub session_type_distribution: Vec<PieDataPoint>,
    pub top_therapists_by_revenue: Vec<RankedItem>,
    pub bookings_per_therapist: Vec<RankedItem>,
    pub top_selling_products: Vec<RankedItem>,
    pub popular_time_slots: Vec<RankedItem>,
    pub recent_activity: Vec<RecentActivity>,
}

/// Decoded, read-only view of the collections feeding the dashboard.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub bookings: Vec<Booking>,
    pub users: Vec<UserProfile>,
    pub orders: Vec<ShopOrder>,
    pub therapist_count: u64,
    pub product_count: u64,
}

impl Snapshot {
    /// Decode raw documents. Undecodable records are kept with default
    /// fields so they still count toward totals and the unknown bucket.
    pub fn from_documents(
        bookings: &[Document],
        users: &[Document],
        therapists: &[Document],
        orders: &[Document],
        products: &[Document],
    ) -> Self {
        Self {
            bookings: bookings
                .iter()
                .map(|doc| {
                    decode_record(collections::BOOKINGS, "id", doc).unwrap_or_else(|| Booking {
                        id: doc.id.clone(),
                        ..Default::default()
                    })
                })
                .collect(),
            users: users
                .iter()
                .map(|doc| {
                    decode_record(collections::USERS, "userId", doc).unwrap_or_else(|| {
                        UserProfile {
                            user_id: doc.id.clone(),
                            ..Default::default()
                        }
                    })
                })
                .collect(),
            orders: orders
                .iter()
                .map(|doc| {
                    decode_record(collections::ORDERS, "orderId", doc).unwrap_or_else(|| {
                        ShopOrder {
                            order_id: doc.id.clone(),
                            ..Default::default()
                        }
                    })
                })
                .collect(),
            therapist_count: therapists.len() as u64,
            product_count: products.len() as u64,
        }
    }
}

/// Insertion-ordered tally keyed by label.
#[derive(Debug)]
struct Tally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Tally<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Copy + Default + AddAssign> Tally<V> {
    fn add(&mut self, key: &str, amount: V) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }

    fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }
}

/// Stable descending sort by value, capped at `limit`.
fn top_n<V: Into<f64>>(tally: Tally<V>, limit: usize) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = tally
        .entries
        .into_iter()
        .map(|(name, value)| RankedItem {
            name,
            value: value.into(),
        })
        .collect();
    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

fn trend(buckets: BTreeMap<String, f64>) -> Vec<ChartDataPoint> {
    buckets
        .into_iter()
        .map(|(date, value)| ChartDataPoint { date, value })
        .collect()
}

fn status_pie(tally: Tally<u64>) -> Vec<PieDataPoint> {
    tally
        .into_entries()
        .into_iter()
        .map(|(label, value)| PieDataPoint {
            color: status_color(&label).to_string(),
            label,
            value,
        })
        .collect()
}

/// Calendar windows derived from "now".
struct Windows {
    current_month: String,
    previous_month: String,
    trend_start: DateTime<Utc>,
    active_start: DateTime<Utc>,
}

impl Windows {
    fn at(now: DateTime<Utc>) -> Self {
        let previous = now.checked_sub_months(Months::new(1)).unwrap_or(now);
        Self {
            current_month: month_key(&now),
            previous_month: month_key(&previous),
            trend_start: now
                .checked_sub_months(Months::new(TREND_WINDOW_MONTHS))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            active_start: now - chrono::Duration::days(ACTIVE_WINDOW_DAYS),
        }
    }

    fn in_trend(&self, at: Option<DateTime<Utc>>) -> bool {
        at.is_some_and(|at| at >= self.trend_start)
    }
}

/// Current vs previous month accumulator.
#[derive(Debug, Default)]
struct MonthPair {
    current: f64,
    previous: f64,
}

impl MonthPair {
    fn add(&mut self, windows: &Windows, month: Option<&str>, amount: f64) {
        match month {
            Some(m) if m == windows.current_month => self.current += amount,
            Some(m) if m == windows.previous_month => self.previous += amount,
            _ => {}
        }
    }

    fn growth(&self) -> i64 {
        compute_growth(self.current, self.previous)
    }
}

/// Compute every dashboard metric from a snapshot at instant `now`.
pub fn compute_metrics(snapshot: &Snapshot, now: DateTime<Utc>) -> DashboardMetrics {
    let windows = Windows::at(now);

    // Bookings
    let mut total_revenue = 0.0;
    let mut completed: u64 = 0;
    let mut cancelled: u64 = 0;
    let mut failed: u64 = 0;
    let mut booking_status = Tally::<u64>::default();
    let mut session_types = Tally::<u64>::default();
    let mut time_slots = Tally::<u64>::default();
    let mut therapist_bookings = Tally::<u64>::default();
    let mut therapist_revenue = Tally::<f64>::default();
    let mut user_bookings = Tally::<u64>::default();
    let mut bookings_by_month = BTreeMap::<String, f64>::new();
    let mut revenue_by_month = BTreeMap::<String, f64>::new();
    let mut active_users = HashSet::<&str>::new();
    let mut booking_months = MonthPair::default();
    let mut revenue_months = MonthPair::default();
    let mut booking_events = Vec::with_capacity(snapshot.bookings.len());

    for booking in &snapshot.bookings {
        let at = booking.date.get();
        let month = booking.date.month_key();
        let therapist = non_empty(&booking.therapist_name).unwrap_or("Unknown");

        booking_status.add(booking.status.as_str(), 1);

        match booking.status {
            BookingStatus::Completed => {
                completed += 1;
                total_revenue += booking.amount;
                therapist_revenue.add(therapist, booking.amount);
                if let (true, Some(m)) = (windows.in_trend(at), &month) {
                    *revenue_by_month.entry(m.clone()).or_default() += booking.amount;
                }
                revenue_months.add(&windows, month.as_deref(), booking.amount);
            }
            BookingStatus::Cancelled => cancelled += 1,
            BookingStatus::Failed => failed += 1,
            _ => {}
        }

        if let Some(session_type) = non_empty(&booking.session_type) {
            session_types.add(session_type, 1);
        }
        if let Some(slot) = non_empty(&booking.time_slot) {
            time_slots.add(slot, 1);
        }
        therapist_bookings.add(therapist, 1);

        if let (true, Some(m)) = (windows.in_trend(at), &month) {
            *bookings_by_month.entry(m.clone()).or_default() += 1.0;
        }
        booking_months.add(&windows, month.as_deref(), 1.0);

        if let Some(user_id) = non_empty(&booking.user_id) {
            if at.is_some_and(|at| at >= windows.active_start) {
                active_users.insert(user_id);
            }
            user_bookings.add(user_id, 1);
        }

        booking_events.push(RecentActivity::new(
            &booking.id,
            ActivityKind::Booking,
            format!("New booking with {}", non_empty(&booking.therapist_name).unwrap_or("Therapist")),
            format!(
                "{} - {}",
                non_empty(&booking.session_type).unwrap_or("Session"),
                booking.status.as_str()
            ),
            &booking.date,
        ));
    }

    // Users
    let mut onboarded: u64 = 0;
    let mut users_by_month = BTreeMap::<String, f64>::new();
    let mut user_months = MonthPair::default();
    let mut activities = Vec::with_capacity(
        snapshot.users.len() + snapshot.bookings.len() + snapshot.orders.len(),
    );

    for user in &snapshot.users {
        if user.onboarding_completed {
            onboarded += 1;
        }
        let month = user.created_at.month_key();
        if let (true, Some(m)) = (windows.in_trend(user.created_at.get()), &month) {
            *users_by_month.entry(m.clone()).or_default() += 1.0;
        }
        user_months.add(&windows, month.as_deref(), 1.0);

        activities.push(RecentActivity::new(
            &user.user_id,
            ActivityKind::Signup,
            format!("New user: {}", user.full_name()).trim_end().to_string(),
            user.email.clone().unwrap_or_default(),
            &user.created_at,
        ));
    }
    activities.append(&mut booking_events);

    // Orders
    let mut order_status = Tally::<u64>::default();
    let mut product_units = Tally::<f64>::default();

    for order in &snapshot.orders {
        order_status.add(order.status.as_str(), 1);
        for item in &order.items {
            product_units.add(item.display_name(), item.units());
        }
        let short_id: String = order.order_id.chars().take(8).collect();
        activities.push(RecentActivity::new(
            &order.order_id,
            ActivityKind::Order,
            format!("New order #{short_id}"),
            format!("{} - {} item(s)", order.status.as_str(), order.items.len()),
            &order.created_at,
        ));
    }

    // Undated events sort after every dated one.
    activities.sort_by(|a, b| b.at.cmp(&a.at));
    activities.truncate(RECENT_ACTIVITY_LIMIT);

    let total_users = snapshot.users.len() as u64;
    let repeat_booking_users = user_bookings
        .into_entries()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .count() as u64;

    let session_type_distribution = session_types
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| PieDataPoint {
            label,
            value,
            color: SESSION_TYPE_PALETTE[i % SESSION_TYPE_PALETTE.len()].to_string(),
        })
        .collect();

    DashboardMetrics {
        total_users,
        total_therapists: snapshot.therapist_count,
        total_bookings: snapshot.bookings.len() as u64,
        total_revenue,
        total_orders: snapshot.orders.len() as u64,
        total_products: snapshot.product_count,
        user_growth: user_months.growth(),
        booking_growth: booking_months.growth(),
        revenue_growth: revenue_months.growth(),
        completion_rate: percentage(completed, completed + cancelled + failed),
        average_booking_value: if completed > 0 {
            round_half_up(total_revenue / completed as f64)
        } else {
            0
        },
        onboarding_rate: percentage(onboarded, total_users),
        active_users: active_users.len() as u64,
        repeat_booking_users,
        booking_trends: trend(bookings_by_month),
        revenue_trends: trend(revenue_by_month),
        new_users_trend: trend(users_by_month),
        bookings_by_status: status_pie(booking_status),
        orders_by_status: status_pie(order_status),
        session_type_distribution,
        top_therapists_by_revenue: top_n(therapist_revenue, TOP_THERAPISTS_LIMIT),
        bookings_per_therapist: top_n(counts_as_f64(therapist_bookings), TOP_THERAPISTS_LIMIT),
        top_selling_products: top_n(product_units, TOP_PRODUCTS_LIMIT),
        popular_time_slots: top_n(counts_as_f64(time_slots), TOP_TIME_SLOTS_LIMIT),
        recent_activity: activities,
    }
}

fn counts_as_f64(tally: Tally<u64>) -> Tally<f64> {
    Tally {
        index: tally.index,
        entries: tally
            .entries
            .into_iter()
            .map(|(k, v)| (k, v as f64))
            .collect(),
    }
}

/// Read every source collection concurrently under `timeout`.
///
/// Any failed or timed-out read aborts the whole load.
pub async fn load_snapshot(store: &dyn DocumentStore, timeout: Duration) -> Result<Snapshot, AppError> {
    let reads = async {
        tokio::try_join!(
            store.list_all(collections::BOOKINGS),
            store.list_all(collections::USERS),
            store.list_all(collections::THERAPISTS),
            store.list_all(collections::ORDERS),
            store.list_all(collections::PRODUCTS),
        )
    };

    let (bookings, users, therapists, orders, products) = tokio::time::timeout(timeout, reads)
        .await
        .map_err(|_| {
            AppError::Unavailable(format!(
                "dashboard collections not read within {}s",
                timeout.as_secs()
            ))
        })??;

    tracing::debug!(
        bookings = bookings.len(),
        users = users.len(),
        therapists = therapists.len(),
        orders = orders.len(),
        products = products.len(),
        "Loaded dashboard snapshot"
    );

    Ok(Snapshot::from_documents(
        &bookings,
        &users,
        &therapists,
        &orders,
        &products,
    ))
}

/// Load the collections and compute the dashboard at `now`.
pub async fn get_metrics(
    store: &dyn DocumentStore,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<DashboardMetrics, AppError> {
    let snapshot = load_snapshot(store, timeout).await?;
    Ok(compute_metrics(&snapshot, now))
}
