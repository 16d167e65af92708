//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::value_objects::effective_price;
use crate::ProductId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    /// Smallest currency unit.
    pub price: i64,
    /// Percent off, `0..=100`.
    pub discount: Option<i32>,
    pub thumbnail: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// Creation order.
    pub gallery: Vec<GalleryImage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage { pub id: i64, pub product_id: ProductId, pub thumbnail: String, pub created_at: DateTime<Utc> }

impl Product {
    pub fn effective_price(&self) -> i64 { effective_price(self.price, self.discount) }
    pub fn main_image(&self) -> Option<&GalleryImage> { self.gallery.first() }
    pub fn hover_image(&self) -> Option<&GalleryImage> { self.gallery.get(1) }
}

/// Catalog listing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Unknown values fall back to newest first.
    pub fn from_param(raw: &str) -> Self {
        match raw {
            "priceAsc" => Self::PriceAsc,
            "priceDesc" => Self::PriceDesc,
            _ => Self::Newest,
        }
    }
}

/// Filters and paging for catalog listings.
///
/// `sort`, `page` and `limit` never reject: anything unparsable, and a zero
/// page or limit, means "use the default".
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub color: Option<String>,
    pub size: Option<String>,
    #[serde(default, deserialize_with = "lenient_sort")]
    pub sort: ProductSort,
    #[serde(default, deserialize_with = "lenient_count")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: Option<u32>,
}

fn lenient_sort<'de, D: Deserializer<'de>>(de: D) -> Result<ProductSort, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.as_deref().map(ProductSort::from_param).unwrap_or_default())
}

fn lenient_count<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|n| *n > 0))
}

impl ProductQuery {
    pub const DEFAULT_LIMIT: u32 = 12;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }
    pub fn limit(&self) -> u32 { self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT) }
    pub fn offset(&self) -> u64 { u64::from(self.page() - 1) * u64::from(self.limit()) }

    /// Filters on base price, as the catalog is indexed.
    pub fn matches(&self, p: &Product) -> bool {
        self.category_id.map_or(true, |c| p.category_id == Some(c))
            && self.min_price.map_or(true, |min| p.price >= min)
            && self.max_price.map_or(true, |max| p.price <= max)
            && self.color.as_ref().map_or(true, |c| p.colors.contains(c))
            && self.size.as_ref().map_or(true, |s| p.sizes.contains(s))
    }
}

/// A new catalog entry with its gallery, in display order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductDraft {
    #[validate(custom = "not_blank")]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: i64,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub discount: Option<i32>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    #[validate(custom = "no_blank_urls")]
    pub gallery_urls: Vec<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn no_blank_urls(urls: &Vec<String>) -> Result<(), ValidationError> {
    urls.iter().try_for_each(|url| not_blank(url))
}

impl Product {
    /// `image_id` hands out one id per gallery row, in order.
    pub fn from_draft(id: ProductId, draft: ProductDraft, mut image_id: impl FnMut() -> i64, created_at: DateTime<Utc>) -> Self {
        let gallery = draft.gallery_urls.into_iter()
            .map(|thumbnail| GalleryImage { id: image_id(), product_id: id, thumbnail, created_at })
            .collect();
        Self {
            id, title: draft.title, description: draft.description, price: draft.price, discount: draft.discount,
            thumbnail: draft.thumbnail, colors: draft.colors, sizes: draft.sizes, category_id: None, created_at, gallery,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductPage { pub products: Vec<Product>, pub total_count: u64, pub page: u32, pub limit: u32 }

impl ProductPage {
    pub fn total_pages(&self) -> u64 { self.total_count.div_ceil(u64::from(self.limit.max(1))) }
}
