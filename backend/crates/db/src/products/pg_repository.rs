use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::products::models::{NewProduct, Product};
use crate::products::repositories::ProductRepository;
use printdesk_common::error::{PrintdeskError, PrintdeskResult};

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Product {
        Product {
            id: row.get("id"),
            asin: row.get("asin"),
            title: row.get("title"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_asin(&self, asin: &str) -> PrintdeskResult<Option<Product>> {
        let row = sqlx::query(
            "select id, asin, title, created_at, updated_at
             from products
             where asin = $1",
        )
        .bind(asin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(row.as_ref().map(Self::map_row))
    }

    async fn insert_if_absent(&self, product: &NewProduct) -> PrintdeskResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "insert into products (id, asin, title, created_at, updated_at)
             values ($1, $2, $3, $4, $4)
             on conflict (asin) do nothing",
        )
        .bind(Uuid::new_v4())
        .bind(&product.asin)
        .bind(&product.title)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| PrintdeskError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    async fn test_repo() -> Option<(PgProductRepository, PgPool)> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");

        sqlx::query(
            "create table if not exists products (
               id uuid primary key default gen_random_uuid(),
               asin text not null unique,
               title text not null,
               created_at timestamptz not null default now(),
               updated_at timestamptz not null default now()
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        Some((PgProductRepository::new(pool.clone()), pool))
    }

    fn unique_asin() -> String {
        format!("B0{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase())
    }

    #[tokio::test]
    async fn insert_if_absent_inserts_once() {
        let (repo, _pool) = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let product = NewProduct {
            asin: unique_asin(),
            title: "Cat Mug".to_string(),
        };

        assert!(repo.insert_if_absent(&product).await.expect("first insert"));
        assert!(!repo.insert_if_absent(&product).await.expect("second insert"));

        let found = repo
            .find_by_asin(&product.asin)
            .await
            .expect("lookup")
            .expect("should exist");
        assert_eq!(found.title, "Cat Mug");
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_local_title() {
        let (repo, pool) = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let asin = unique_asin();
        repo.insert_if_absent(&NewProduct {
            asin: asin.clone(),
            title: "Marketplace Title".to_string(),
        })
        .await
        .expect("insert");

        sqlx::query("update products set title = 'Edited Locally' where asin = $1")
            .bind(&asin)
            .execute(&pool)
            .await
            .expect("local edit");

        repo.insert_if_absent(&NewProduct {
            asin: asin.clone(),
            title: "Marketplace Title".to_string(),
        })
        .await
        .expect("reinsert");

        let found = repo.find_by_asin(&asin).await.expect("lookup").unwrap();
        assert_eq!(found.title, "Edited Locally");
    }

    #[tokio::test]
    async fn find_by_asin_returns_none_for_unknown() {
        let (repo, _pool) = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let found = repo.find_by_asin("B0NOTTHERE").await.expect("lookup");
        assert!(found.is_none());
    }
}
