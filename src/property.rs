use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;

pub const DEFAULT_IMAGE: &str =
    "https://images.unsplash.com/photo-1560518883-ce09059eeffa?w=300";
pub const DEFAULT_HOUSE_RULES: [&str; 1] = ["No specific rules"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "property_type", rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Studio,
    Room,
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "apartment" => Ok(PropertyType::Apartment),
            "house" => Ok(PropertyType::House),
            "studio" => Ok(PropertyType::Studio),
            "room" => Ok(PropertyType::Room),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_status")]
pub enum PropertyStatus {
    Available,
    Occupied,
    Maintenance,
    Pending,
}

impl PropertyStatus {
    /// The status flip behind `PATCH /:id/toggle-status`. Anything that is
    /// not currently `Available` flips back to it.
    pub fn toggled(self) -> PropertyStatus {
        match self {
            PropertyStatus::Available => PropertyStatus::Occupied,
            _ => PropertyStatus::Available,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyStatus::Available => "Available",
            PropertyStatus::Occupied => "Occupied",
            PropertyStatus::Maintenance => "Maintenance",
            PropertyStatus::Pending => "Pending",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "Available" => Ok(PropertyStatus::Available),
            "Occupied" => Ok(PropertyStatus::Occupied),
            "Maintenance" => Ok(PropertyStatus::Maintenance),
            "Pending" => Ok(PropertyStatus::Pending),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i32,
    pub title: String,
    pub location: String,
    pub price: f64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: PropertyType,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub max_occupancy: i32,
    pub description: String,
    pub image: Option<String>,
    pub images: Json<Vec<String>>,
    pub house_rules: Json<Vec<String>>,
    pub status: PropertyStatus,
    pub is_active: bool,
    pub owner_id: i32,
    pub view_count: i32,
    pub featured_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Property row joined with the owning user's public columns.
#[derive(Debug, FromRow)]
pub struct PropertyWithOwner {
    #[sqlx(flatten)]
    pub property: Property,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_email: String,
}

impl PropertyWithOwner {
    pub fn into_json(self) -> Value {
        let mut value = json!(&self.property);

        value["owner"] = json!({
            "id": self.property.owner_id,
            "firstName": self.owner_first_name,
            "lastName": self.owner_last_name,
            "email": self.owner_email,
        });

        value
    }
}

/// Create/update body. Every field the validators require is optional here
/// so missing values surface as field errors instead of a decode failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPayload {
    pub title: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub max_occupancy: Option<i32>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub house_rules: Option<Vec<String>>,
}

impl PropertyPayload {
    pub fn property_type(&self) -> Option<PropertyType> {
        self.kind.as_deref().and_then(|kind| kind.parse().ok())
    }
}

#[derive(Debug, Default)]
pub struct PropertyFilter {
    pub search: Option<String>,
    pub status: Option<PropertyStatus>,
    pub kind: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

const LISTING_SELECT: &str =
    "SELECT p.*, u.first_name AS owner_first_name, u.last_name AS owner_last_name, \
     u.email AS owner_email \
     FROM properties p JOIN users u ON u.id = p.owner_id \
     WHERE p.is_active = TRUE";

pub fn push_property_filters(builder: &mut QueryBuilder<Postgres>, filter: &PropertyFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");

        builder.push(" AND (p.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.location ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(status) = filter.status {
        builder.push(" AND p.status = ");
        builder.push_bind(status);
    }

    if let Some(kind) = filter.kind {
        builder.push(" AND p.type = ");
        builder.push_bind(kind);
    }

    if let Some(min_price) = filter.min_price {
        builder.push(" AND p.price >= ");
        builder.push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        builder.push(" AND p.price <= ");
        builder.push_bind(max_price);
    }
}

/// Maps a client-facing sort key onto a real column, falling back to
/// `created_at` for anything unknown.
pub fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("price") => "p.price",
        Some("title") => "p.title",
        Some("location") => "p.location",
        Some("viewCount") => "p.view_count",
        _ => "p.created_at",
    }
}

impl Property {
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Property>, AppError> {
        let property = sqlx::query_as("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(property)
    }

    pub async fn find_by_id_with_owner(
        pool: &PgPool,
        id: i32,
    ) -> Result<Option<PropertyWithOwner>, AppError> {
        let property = sqlx::query_as(
            "SELECT p.*, u.first_name AS owner_first_name, u.last_name AS owner_last_name, \
             u.email AS owner_email \
             FROM properties p JOIN users u ON u.id = p.owner_id WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(property)
    }

    pub async fn list(
        pool: &PgPool,
        filter: &PropertyFilter,
        sort_column: &str,
        descending: bool,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<PropertyWithOwner>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(LISTING_SELECT);
        push_property_filters(&mut builder, filter);

        builder.push(format!(
            " ORDER BY {} {}",
            sort_column,
            if descending { "DESC" } else { "ASC" }
        ));
        builder.push(" LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let properties = builder.build_query_as().fetch_all(pool).await?;

        Ok(properties)
    }

    pub async fn count(pool: &PgPool, filter: &PropertyFilter) -> Result<i64, AppError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties p WHERE p.is_active = TRUE");
        push_property_filters(&mut builder, filter);

        let count = builder.build_query_scalar().fetch_one(pool).await?;

        Ok(count)
    }

    /// Count under the same filter but with the status pinned, for the
    /// per-status stats block of the listing response.
    pub async fn count_with_status(
        pool: &PgPool,
        filter: &PropertyFilter,
        status: PropertyStatus,
    ) -> Result<i64, AppError> {
        let pinned = PropertyFilter {
            search: filter.search.clone(),
            status: Some(status),
            kind: filter.kind,
            min_price: filter.min_price,
            max_price: filter.max_price,
        };

        Property::count(pool, &pinned).await
    }

    pub async fn create(
        pool: &PgPool,
        owner_id: i32,
        payload: &PropertyPayload,
        kind: PropertyType,
    ) -> Result<Property, AppError> {
        let image = payload
            .image
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());
        let images: Vec<String> = payload.image.clone().into_iter().collect();

        let house_rules = match &payload.house_rules {
            Some(rules) if !rules.is_empty() => rules.clone(),
            _ => DEFAULT_HOUSE_RULES.map(String::from).to_vec(),
        };

        let property = sqlx::query_as(
            "INSERT INTO properties \
             (title, location, price, type, bedrooms, bathrooms, max_occupancy, description, \
              image, images, house_rules, status, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'Available', $12) \
             RETURNING *",
        )
        .bind(payload.title.as_deref().unwrap_or("").trim())
        .bind(payload.location.as_deref().unwrap_or("").trim())
        .bind(payload.price.unwrap_or(0.0))
        .bind(kind)
        .bind(payload.bedrooms.unwrap_or(1))
        .bind(payload.bathrooms.unwrap_or(1))
        .bind(payload.max_occupancy.unwrap_or(1))
        .bind(payload.description.as_deref().unwrap_or("").trim())
        .bind(image)
        .bind(Json(images))
        .bind(Json(house_rules))
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(property)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        payload: &PropertyPayload,
        kind: PropertyType,
    ) -> Result<Property, AppError> {
        let property = sqlx::query_as(
            "UPDATE properties SET \
             title = $2, location = $3, price = $4, type = $5, bedrooms = $6, bathrooms = $7, \
             max_occupancy = $8, description = $9, \
             image = COALESCE($10, image), house_rules = COALESCE($11, house_rules), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.title.as_deref().unwrap_or("").trim())
        .bind(payload.location.as_deref().unwrap_or("").trim())
        .bind(payload.price.unwrap_or(0.0))
        .bind(kind)
        .bind(payload.bedrooms.unwrap_or(1))
        .bind(payload.bathrooms.unwrap_or(1))
        .bind(payload.max_occupancy.unwrap_or(1))
        .bind(payload.description.as_deref().unwrap_or("").trim())
        .bind(payload.image.as_deref())
        .bind(payload.house_rules.clone().map(Json))
        .fetch_one(pool)
        .await?;

        Ok(property)
    }

    pub async fn set_status(
        pool: &PgPool,
        id: i32,
        status: PropertyStatus,
    ) -> Result<Property, AppError> {
        let property = sqlx::query_as(
            "UPDATE properties SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(property)
    }

    pub async fn increment_view_count(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE properties SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn count_by_status(pool: &PgPool, status: PropertyStatus) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn count_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE created_at >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn count_by_owner(pool: &PgPool, owner_id: i32) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Postgres, QueryBuilder};

    use super::{
        push_property_filters, sort_column, PropertyFilter, PropertyStatus, PropertyType,
    };

    #[test]
    fn test_status_toggle() {
        assert_eq!(
            PropertyStatus::Available.toggled(),
            PropertyStatus::Occupied
        );
        assert_eq!(
            PropertyStatus::Occupied.toggled(),
            PropertyStatus::Available
        );
        assert_eq!(
            PropertyStatus::Maintenance.toggled(),
            PropertyStatus::Available
        );
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "Available".parse::<PropertyStatus>(),
            Ok(PropertyStatus::Available)
        );
        assert!("available".parse::<PropertyStatus>().is_err());
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("studio".parse::<PropertyType>(), Ok(PropertyType::Studio));
        assert!("castle".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_sort_whitelist() {
        assert_eq!(sort_column(Some("price")), "p.price");
        assert_eq!(sort_column(Some("viewCount")), "p.view_count");
        assert_eq!(sort_column(Some("id; DROP TABLE users")), "p.created_at");
        assert_eq!(sort_column(None), "p.created_at");
    }

    #[test]
    fn test_filter_sql_assembly() {
        let filter = PropertyFilter {
            search: Some("loft".to_string()),
            status: Some(PropertyStatus::Available),
            kind: None,
            min_price: Some(500.0),
            max_price: None,
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties p WHERE p.is_active = TRUE");
        push_property_filters(&mut builder, &filter);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM properties p WHERE p.is_active = TRUE \
             AND (p.title ILIKE $1 OR p.location ILIKE $2) AND p.status = $3 \
             AND p.price >= $4"
        );
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        push_property_filters(&mut builder, &PropertyFilter::default());

        assert_eq!(builder.sql(), "SELECT 1");
    }
}
