use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatCounter {
    pub total: i64,
    pub this_month: i64,
    pub last_month: i64,
    /// Month-over-month change. A previous month of zero reads as +100%
    /// when anything arrived this month, otherwise 0.
    pub change_percent: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusBucket {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub users: StatCounter,
    pub orders: StatCounter,
    pub products: StatCounter,
    pub orders_by_status: Vec<StatusBucket>,
    pub orders_per_day: Vec<DayBucket>,
}
