use anyhow::Result;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::{
    models::{Property, PropertyFilters, PropertyInput},
    utils::sql,
};

const PROPERTY_COLUMNS: &str = r#"
    id,
    title,
    description,
    listing_type,
    property_type,
    price,
    surface_m2,
    rooms,
    wilaya_code,
    daira,
    commune,
    address,
    nearby_places,
    is_featured,
    agent_id,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &PropertyFilters) {
        builder.push(" WHERE TRUE");
        if let Some(wilaya_code) = &filters.wilaya {
            builder
                .push(" AND wilaya_code = ")
                .push_bind(wilaya_code.clone());
        }
        if let Some(daira) = &filters.daira {
            builder
                .push(" AND LOWER(daira) = LOWER(")
                .push_bind(daira.clone())
                .push(")");
        }
        if let Some(listing_type) = filters.listing_type {
            builder.push(" AND listing_type = ").push_bind(listing_type);
        }
    }

    /// One page of properties matching `filters`, newest first, plus the total match count.
    pub async fn list(&self, filters: &PropertyFilters) -> Result<(Vec<Property>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties");
        Self::push_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {PROPERTY_COLUMNS} FROM properties"));
        Self::push_filters(&mut select, filters);
        select
            .push(" ORDER BY is_featured DESC, created_at DESC LIMIT ")
            .push_bind(i64::from(filters.limit()))
            .push(" OFFSET ")
            .push_bind(i64::from(filters.offset()));

        let properties = select
            .build_query_as::<Property>()
            .fetch_all(&self.pool)
            .await?;

        Ok((properties, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>> {
        let property = sqlx::query_as::<_, Property>(&sql(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property)
    }

    /// Random featured listings for the home page carousel.
    pub async fn random_featured(&self, limit: i64) -> Result<Vec<Property>> {
        let properties = sqlx::query_as::<_, Property>(&sql(&format!(
            r#"
            SELECT {PROPERTY_COLUMNS}
            FROM properties
            WHERE is_featured
            ORDER BY RANDOM()
            LIMIT ?
            "#
        )))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(properties)
    }

    pub async fn create(&self, input: PropertyInput) -> Result<Property> {
        let now = Utc::now();
        let property = sqlx::query_as::<_, Property>(&sql(&format!(
            r#"
            INSERT INTO
                properties (
                    title,
                    description,
                    listing_type,
                    property_type,
                    price,
                    surface_m2,
                    rooms,
                    wilaya_code,
                    daira,
                    commune,
                    address,
                    nearby_places,
                    is_featured,
                    agent_id,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {PROPERTY_COLUMNS}
            "#
        )))
        .bind(input.title)
        .bind(input.description)
        .bind(input.listing_type)
        .bind(input.property_type)
        .bind(input.price)
        .bind(input.surface_m2)
        .bind(input.rooms)
        .bind(input.wilaya_code)
        .bind(input.daira)
        .bind(input.commune)
        .bind(input.address)
        .bind(input.nearby_places)
        .bind(input.is_featured)
        .bind(input.agent_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(property)
    }

    pub async fn update(&self, id: Uuid, input: PropertyInput) -> Result<Option<Property>> {
        let property = sqlx::query_as::<_, Property>(&sql(&format!(
            r#"
            UPDATE
                properties
            SET
                title = ?,
                description = ?,
                listing_type = ?,
                property_type = ?,
                price = ?,
                surface_m2 = ?,
                rooms = ?,
                wilaya_code = ?,
                daira = ?,
                commune = ?,
                address = ?,
                nearby_places = ?,
                is_featured = ?,
                agent_id = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {PROPERTY_COLUMNS}
            "#
        )))
        .bind(input.title)
        .bind(input.description)
        .bind(input.listing_type)
        .bind(input.property_type)
        .bind(input.price)
        .bind(input.surface_m2)
        .bind(input.rooms)
        .bind(input.wilaya_code)
        .bind(input.daira)
        .bind(input.commune)
        .bind(input.address)
        .bind(input.nearby_places)
        .bind(input.is_featured)
        .bind(input.agent_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql("DELETE FROM properties WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
