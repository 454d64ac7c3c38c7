use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    db::DbPool,
    dto::dashboard::{DashboardStats, DayBucket, StatCounter, StatusBucket},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
};

pub async fn dashboard_stats(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let (this_month_start, last_month_start) = month_boundaries(Utc::now())?;

    let users = count_table(pool, "users", this_month_start, last_month_start).await?;
    let orders = count_table(pool, "orders", this_month_start, last_month_start).await?;
    let products = count_table(pool, "products", this_month_start, last_month_start).await?;

    let orders_by_status: Vec<StatusBucket> =
        sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(status, count)| StatusBucket { status, count })
        .collect();

    let orders_per_day: Vec<DayBucket> = sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        SELECT created_at::date AS day, COUNT(*)
        FROM orders
        WHERE created_at >= now() - interval '30 days'
        GROUP BY day
        ORDER BY day
        "#,
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(date, count)| DayBucket { date, count })
    .collect();

    let data = DashboardStats {
        users,
        orders,
        products,
        orders_by_status,
        orders_per_day,
    };
    Ok(ApiResponse::success("Dashboard", data, Some(Meta::empty())))
}

async fn count_table(
    pool: &DbPool,
    table: &str,
    this_month_start: DateTime<Utc>,
    last_month_start: DateTime<Utc>,
) -> AppResult<StatCounter> {
    // `table` is one of three fixed names chosen above, never user input.
    let sql = format!(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE created_at >= $1),
               COUNT(*) FILTER (WHERE created_at >= $2 AND created_at < $1)
        FROM {table}
        "#
    );
    let (total, this_month, last_month): (i64, i64, i64) = sqlx::query_as(&sql)
        .bind(this_month_start)
        .bind(last_month_start)
        .fetch_one(pool)
        .await?;

    Ok(StatCounter {
        total,
        this_month,
        last_month,
        change_percent: percent_change(this_month, last_month),
    })
}

fn month_boundaries(now: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let this_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid month boundary")))?;
    let (prev_year, prev_month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    let last_month = NaiveDate::from_ymd_opt(prev_year, prev_month, 1)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid month boundary")))?;

    let to_utc = |d: NaiveDate| -> AppResult<DateTime<Utc>> {
        d.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid month boundary")))
    };
    Ok((to_utc(this_month)?, to_utc(last_month)?))
}

fn percent_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        if current > 0 { 100.0 } else { 0.0 }
    } else {
        ((current - previous) as f64 / previous as f64 * 100.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn percent_change_handles_zero_baseline() {
        assert_eq!(percent_change(5, 0), 100.0);
        assert_eq!(percent_change(0, 0), 0.0);
        assert_eq!(percent_change(15, 10), 50.0);
        assert_eq!(percent_change(5, 10), -50.0);
    }

    #[test]
    fn month_boundaries_wrap_january() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let (this_month, last_month) = month_boundaries(now).unwrap();
        assert_eq!(this_month.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(last_month.to_rfc3339(), "2025-12-01T00:00:00+00:00");
    }
}
