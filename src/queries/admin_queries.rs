use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        AdminOrderResponse, AnalyticsSummary, Order, OrderCustomer, OrderQuery,
        OrderSearchResponse, StatusCount, UserQuery, UserResponse, UserSearchResponse,
    },
    queries::order_queries,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

fn push_user_filters(query_builder: &mut QueryBuilder<'_, Postgres>, params: &UserQuery) {
    if let Some(id) = params.id {
        query_builder.push(" AND id = ");
        query_builder.push_bind(id);
    }

    if let Some(ref email) = params.email {
        query_builder.push(" AND email ILIKE ");
        query_builder.push_bind(format!("%{}%", email));
    }

    if let Some(role) = params.role {
        query_builder.push(" AND role = ");
        query_builder.push_bind(role);
    }
}

fn push_order_filters(query_builder: &mut QueryBuilder<'_, Postgres>, params: &OrderQuery) {
    if let Some(id) = params.id {
        query_builder.push(" AND o.id = ");
        query_builder.push_bind(id);
    }

    if let Some(user_id) = params.user_id {
        query_builder.push(" AND o.user_id = ");
        query_builder.push_bind(user_id);
    }

    if let Some(status) = params.status {
        query_builder.push(" AND o.status = ");
        query_builder.push_bind(status);
    }
}

/// `total` counts every match, independent of the requested page.
pub async fn search_users(pool: &PgPool, params: UserQuery) -> Result<UserSearchResponse> {
    let (limit, offset) = page(params.limit, params.offset);

    let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE 1=1");
    push_user_filters(&mut count_builder, &params);
    let total: i64 = count_builder.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "SELECT id, email, first_name, last_name, role, created_at, updated_at
         FROM users WHERE 1=1",
    );
    push_user_filters(&mut query_builder, &params);

    query_builder.push(" ORDER BY created_at DESC, id DESC");

    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    let users = query_builder
        .build_query_as::<UserResponse>()
        .fetch_all(pool)
        .await?;

    Ok(UserSearchResponse {
        users,
        total,
        limit,
        offset,
    })
}

pub async fn search_orders(pool: &PgPool, params: OrderQuery) -> Result<OrderSearchResponse> {
    let (limit, offset) = page(params.limit, params.offset);

    let mut count_builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o WHERE 1=1");
    push_order_filters(&mut count_builder, &params);
    let total: i64 = count_builder.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "SELECT o.*, u.email, u.first_name, u.last_name
         FROM orders o
         LEFT JOIN users u ON u.id = o.user_id
         WHERE 1=1",
    );
    push_order_filters(&mut query_builder, &params);

    query_builder.push(" ORDER BY o.created_at DESC, o.id DESC");
    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        order: Order,
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let order_db_ids: Vec<i32> = results.iter().map(|r| r.order.id).collect();
    let all_items = order_queries::get_items_for_orders(pool, &order_db_ids).await?;

    let mut items_map: HashMap<i32, Vec<_>> = HashMap::new();
    for item in all_items {
        items_map.entry(item.order_id).or_default().push(item);
    }

    let orders = results
        .into_iter()
        .map(|r| {
            let customer = r.email.map(|email| OrderCustomer {
                email,
                first_name: r.first_name.unwrap_or_default(),
                last_name: r.last_name.unwrap_or_default(),
            });
            let items = items_map.remove(&r.order.id).unwrap_or_default();
            AdminOrderResponse {
                order: r.order,
                customer,
                items,
            }
        })
        .collect();

    Ok(OrderSearchResponse {
        orders,
        total,
        limit,
        offset,
    })
}

pub async fn analytics_summary(pool: &PgPool) -> Result<AnalyticsSummary> {
    #[derive(sqlx::FromRow)]
    struct Counts {
        total_users: i64,
        total_customers: i64,
        total_products: i64,
        out_of_stock_products: i64,
        total_orders: i64,
        revenue: Decimal,
    }

    let counts = sqlx::query_as::<_, Counts>(
        "SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE role = 'customer') AS total_customers,
            (SELECT COUNT(*) FROM products) AS total_products,
            (SELECT COUNT(*) FROM products WHERE stock_quantity = 0) AS out_of_stock_products,
            (SELECT COUNT(*) FROM orders) AS total_orders,
            (SELECT COALESCE(SUM(total), 0) FROM orders WHERE status <> 'cancelled') AS revenue",
    )
    .fetch_one(pool)
    .await?;

    let orders_by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsSummary {
        total_users: counts.total_users,
        total_customers: counts.total_customers,
        total_products: counts.total_products,
        out_of_stock_products: counts.out_of_stock_products,
        total_orders: counts.total_orders,
        orders_by_status,
        revenue: counts.revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(page(None, None), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page(Some(1_000), Some(40)), (MAX_PAGE_SIZE, 40));
        assert_eq!(page(Some(0), Some(-5)), (1, 0));
    }
}
