//! PostgreSQL-backed store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AddressStore, CartLine, CartStore, CatalogStore, EnsuredCart, IdentityResolver, ProfileStore};
use crate::domain::aggregates::{
    Address, AddressDraft, CartItem, GalleryImage, Product, ProductDraft, ProductPage, ProductQuery, ProductSort, Profile, ProfileUpdate,
};
use crate::domain::value_objects::Quantity;
use crate::{AddressId, CartId, CartItemId, ProductId, Result, StorefrontError, UserId};

const PRODUCT_COLUMNS: &str = "p.id, p.title, p.description, p.price, p.discount, p.thumbnail, p.colors, p.sizes, p.category_id, p.created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn galleries(&self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, Vec<GalleryImage>>> {
        if product_ids.is_empty() { return Ok(HashMap::new()); }
        let images = sqlx::query_as::<_, GalleryImage>("SELECT id, product_id, thumbnail, created_at FROM gallery WHERE product_id = ANY($1) ORDER BY id")
            .bind(product_ids).fetch_all(&self.pool).await?;
        let mut by_product: HashMap<ProductId, Vec<GalleryImage>> = HashMap::new();
        for image in images {
            by_product.entry(image.product_id).or_default().push(image);
        }
        Ok(by_product)
    }

    async fn with_galleries(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>> {
        let ids: Vec<ProductId> = rows.iter().map(|r| r.id).collect();
        let mut galleries = self.galleries(&ids).await?;
        Ok(rows.into_iter().map(|r| { let gallery = galleries.remove(&r.id).unwrap_or_default(); r.into_product(gallery) }).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId, title: String, description: Option<String>, price: i64, discount: Option<i32>,
    thumbnail: Option<String>, colors: Vec<String>, sizes: Vec<String>, category_id: Option<i64>, created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, gallery: Vec<GalleryImage>) -> Product {
        Product {
            id: self.id, title: self.title, description: self.description, price: self.price, discount: self.discount,
            thumbnail: self.thumbnail, colors: self.colors, sizes: self.sizes, category_id: self.category_id,
            created_at: self.created_at, gallery,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    item_id: CartItemId,
    cart_id: CartId,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

fn stored_quantity(raw: i32) -> Result<Quantity> {
    Quantity::new(i64::from(raw)).map_err(|_| StorefrontError::Storage(format!("stored quantity {raw} violates the cart_items check")))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    if let Some(category_id) = query.category_id { qb.push(" AND p.category_id = ").push_bind(category_id); }
    if let Some(min) = query.min_price { qb.push(" AND p.price >= ").push_bind(min); }
    if let Some(max) = query.max_price { qb.push(" AND p.price <= ").push_bind(max); }
    if let Some(color) = &query.color { qb.push(" AND ").push_bind(color.clone()).push(" = ANY(p.colors)"); }
    if let Some(size) = &query.size { qb.push(" AND ").push_bind(size.clone()).push(" = ANY(p.sizes)"); }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"))
            .bind(id).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(self.with_galleries(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE TRUE");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE TRUE"));
        push_filters(&mut select, query);
        select.push(match query.sort {
            ProductSort::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            ProductSort::PriceAsc => " ORDER BY p.price ASC, p.id",
            ProductSort::PriceDesc => " ORDER BY p.price DESC, p.id",
        });
        select.push(" LIMIT ").push_bind(i64::from(query.limit()));
        select.push(" OFFSET ").push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        let rows: Vec<ProductRow> = select.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;

        Ok(ProductPage {
            products: self.with_galleries(rows).await?,
            total_count: u64::try_from(total).unwrap_or(0),
            page: query.page(),
            limit: query.limit(),
        })
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (title, description, price, discount, thumbnail, colors, sizes) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, title, description, price, discount, thumbnail, colors, sizes, category_id, created_at",
        )
        .bind(&draft.title).bind(&draft.description).bind(draft.price).bind(draft.discount)
        .bind(&draft.thumbnail).bind(&draft.colors).bind(&draft.sizes)
        .fetch_one(&mut *tx).await?;

        // One row at a time so ids follow the submitted order.
        let mut gallery = Vec::with_capacity(draft.gallery_urls.len());
        for url in &draft.gallery_urls {
            let image = sqlx::query_as::<_, GalleryImage>(
                "INSERT INTO gallery (product_id, thumbnail) VALUES ($1, $2) RETURNING id, product_id, thumbnail, created_at",
            )
            .bind(row.id).bind(url).fetch_one(&mut *tx).await?;
            gallery.push(image);
        }
        tx.commit().await?;
        Ok(row.into_product(gallery))
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn ensure_cart(&self, user_id: UserId) -> Result<EnsuredCart> {
        // ON CONFLICT waits for a concurrent first insert, so the SELECT below sees its row.
        let inserted: Option<CartId> = sqlx::query_scalar("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING RETURNING id")
            .bind(user_id).fetch_optional(&self.pool).await?;
        if let Some(cart_id) = inserted {
            return Ok(EnsuredCart { cart_id, created: true });
        }
        let cart_id: CartId = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1")
            .bind(user_id).fetch_one(&self.pool).await?;
        Ok(EnsuredCart { cart_id, created: false })
    }

    async fn load_items(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT ci.id AS item_id, ci.cart_id, ci.quantity, {PRODUCT_COLUMNS} FROM cart_items ci JOIN products p ON p.id = ci.product_id WHERE ci.cart_id = $1 ORDER BY ci.id"
        )).bind(cart_id).fetch_all(&self.pool).await?;

        let ids: Vec<ProductId> = rows.iter().map(|r| r.product.id).collect();
        let galleries = self.galleries(&ids).await?;
        rows.into_iter().map(|row| {
            let gallery = galleries.get(&row.product.id).cloned().unwrap_or_default();
            Ok(CartItem {
                id: row.item_id,
                cart_id: row.cart_id,
                product_id: row.product.id,
                quantity: stored_quantity(row.quantity)?,
                product: row.product.into_product(gallery),
            })
        }).collect()
    }

    async fn add_item(&self, cart_id: CartId, product_id: ProductId, quantity: Quantity) -> Result<CartLine> {
        let row: (CartItemId, ProductId, i32) = sqlx::query_as(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
             RETURNING id, product_id, quantity",
        )
        .bind(cart_id).bind(product_id).bind(quantity.value())
        .fetch_one(&self.pool).await
        .map_err(|e| {
            // 23503: foreign_key_violation, the product vanished after the lookup.
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some("23503") { return StorefrontError::ProductNotFound(product_id); }
            }
            StorefrontError::from(e)
        })?;
        Ok(CartLine { id: row.0, product_id: row.1, quantity: stored_quantity(row.2)? })
    }

    async fn set_item_quantity(&self, user_id: UserId, item_id: CartItemId, quantity: Quantity) -> Result<bool> {
        let done = sqlx::query("UPDATE cart_items ci SET quantity = $3 FROM carts c WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $1")
            .bind(user_id).bind(item_id).bind(quantity.value()).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete_item(&self, user_id: UserId, item_id: CartItemId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM cart_items ci USING carts c WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $1")
            .bind(user_id).bind(item_id).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }
}

const ADDRESS_COLUMNS: &str = "id, user_id, first_name, last_name, company, phone, street, street2, city, state, country, zip_code, is_default, created_at";

#[async_trait]
impl AddressStore for PgStore {
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let rows = sqlx::query_as::<_, Address>(&format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, id"))
            .bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn insert_address(&self, user_id: UserId, draft: AddressDraft) -> Result<Address> {
        let mut tx = self.pool.begin().await?;
        // Serialises address writes per user.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE").bind(user_id).execute(&mut *tx).await?;
        if draft.is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
                .bind(user_id).execute(&mut *tx).await?;
        }
        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO addresses (user_id, first_name, last_name, company, phone, street, street2, city, state, country, zip_code, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id).bind(&draft.first_name).bind(&draft.last_name).bind(&draft.company).bind(&draft.phone)
        .bind(&draft.street).bind(&draft.street2).bind(&draft.city).bind(&draft.state).bind(&draft.country)
        .bind(&draft.zip_code).bind(draft.is_default)
        .fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(address)
    }

    async fn update_address(&self, user_id: UserId, id: AddressId, draft: AddressDraft) -> Result<Option<Address>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE").bind(user_id).execute(&mut *tx).await?;
        let owned: Option<AddressId> = sqlx::query_scalar("SELECT id FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id).bind(user_id).fetch_optional(&mut *tx).await?;
        if owned.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }
        if draft.is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND id <> $2 AND is_default")
                .bind(user_id).bind(id).execute(&mut *tx).await?;
        }
        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE addresses SET first_name = $3, last_name = $4, company = $5, phone = $6, street = $7, street2 = $8, \
             city = $9, state = $10, country = $11, zip_code = $12, is_default = $13 WHERE id = $1 AND user_id = $2 RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id).bind(user_id).bind(&draft.first_name).bind(&draft.last_name).bind(&draft.company).bind(&draft.phone)
        .bind(&draft.street).bind(&draft.street2).bind(&draft.city).bind(&draft.state).bind(&draft.country)
        .bind(&draft.zip_code).bind(draft.is_default)
        .fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(Some(address))
    }

    async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2").bind(id).bind(user_id).execute(&self.pool).await?;
        Ok(done.rows_affected() == 1)
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<Option<Profile>> {
        let update = update.present();
        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE users SET phone = COALESCE($2, phone), address = COALESCE($3, address), company = COALESCE($4, company) \
             WHERE id = $1 RETURNING id, email, first_name, last_name, phone, address, company",
        )
        .bind(user_id).bind(&update.phone).bind(&update.address).bind(&update.company)
        .fetch_optional(&self.pool).await?;
        Ok(profile)
    }
}

#[async_trait]
impl IdentityResolver for PgStore {
    async fn resolve(&self, token: Uuid) -> Result<Option<UserId>> {
        let user_id = sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > NOW()")
            .bind(token).fetch_optional(&self.pool).await?;
        Ok(user_id)
    }
}
