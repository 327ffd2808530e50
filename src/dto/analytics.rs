use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStats {
    pub total: i64,
    pub last_30d: i64,
    pub last_7d: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueStats {
    #[schema(value_type = f64)]
    pub total: Decimal,
    #[schema(value_type = f64)]
    pub last_30d: Decimal,
    #[schema(value_type = f64)]
    pub last_7d: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStats {
    pub total: i64,
    pub last_30d: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductStats {
    pub total: i64,
    pub featured: i64,
    pub out_of_stock: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopCategory {
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub orders: OrderStats,
    pub revenue: RevenueStats,
    pub users: UserStats,
    pub products: ProductStats,
    pub conversion_rate: f64,
    pub top_categories: Vec<TopCategory>,
    pub abandoned_carts: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverviewResponse {
    pub total_users: i64,
    pub total_orders: i64,
    pub total_products: i64,
    #[schema(value_type = f64)]
    pub total_revenue: Decimal,
    pub recent_orders_30d: i64,
    pub top_products: Vec<TopProduct>,
}
