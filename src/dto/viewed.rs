use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ProductSummary;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TrackViewRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewedItemDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub viewed_at: DateTime<Utc>,
    pub product: ProductSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewedList {
    pub items: Vec<ViewedItemDto>,
}
