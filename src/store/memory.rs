//! In-process store for tests and local demos.
//!
//! A single mutex around all tables gives every method the same all-or-nothing
//! behaviour the Postgres store gets from statements and transactions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AddressStore, CartLine, CartStore, CatalogStore, EnsuredCart, IdentityResolver, ProfileStore};
use crate::domain::aggregates::address::{select_default, sort_for_listing};
use crate::domain::aggregates::{
    Address, AddressDraft, CartItem, Product, ProductDraft, ProductPage, ProductQuery, ProductSort, Profile, ProfileUpdate,
};
use crate::domain::value_objects::Quantity;
use crate::{AddressId, CartId, CartItemId, ProductId, Result, StorefrontError, UserId};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    products: BTreeMap<ProductId, Product>,
    carts: HashMap<UserId, CartId>,
    cart_owners: HashMap<CartId, UserId>,
    items: BTreeMap<CartItemId, CartLine>,
    item_carts: HashMap<CartItemId, CartId>,
    addresses: BTreeMap<AddressId, Address>,
    sessions: HashMap<Uuid, UserId>,
    users: HashMap<UserId, Profile>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owned_item(&self, user_id: UserId, item_id: CartItemId) -> bool {
        self.item_carts.get(&item_id).and_then(|cart| self.cart_owners.get(cart)) == Some(&user_id)
    }
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_product(&self, product: Product) {
        let mut t = self.tables.lock().await;
        t.next_id = t.next_id.max(product.id);
        t.products.insert(product.id, product);
    }

    pub async fn remove_product(&self, id: ProductId) {
        let mut t = self.tables.lock().await;
        t.products.remove(&id);
        let orphaned: Vec<CartItemId> = t.items.values().filter(|l| l.product_id == id).map(|l| l.id).collect();
        for item_id in orphaned {
            t.items.remove(&item_id);
            t.item_carts.remove(&item_id);
        }
    }

    /// Opens a session for `user_id` and returns its bearer token.
    /// Registers a bare profile for users seen for the first time.
    pub async fn open_session(&self, user_id: UserId) -> Uuid {
        let token = Uuid::new_v4();
        let mut t = self.tables.lock().await;
        t.sessions.insert(token, user_id);
        t.users.entry(user_id).or_insert_with(|| Profile {
            id: user_id,
            email: format!("user{user_id}@storefront.test"),
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            address: None,
            company: None,
        });
        token
    }

    /// Makes every call fail with a storage error until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorefrontError::Storage("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.check_available()?;
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.check_available()?;
        let t = self.tables.lock().await;
        let mut matching: Vec<&Product> = t.products.values().filter(|p| query.matches(p)).collect();
        match query.sort {
            ProductSort::Newest => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
            ProductSort::PriceAsc => matching.sort_by_key(|p| (p.price, p.id)),
            ProductSort::PriceDesc => matching.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
        }
        let total_count = matching.len() as u64;
        let products = matching.into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit() as usize)
            .cloned()
            .collect();
        Ok(ProductPage { products, total_count, page: query.page(), limit: query.limit() })
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        let id = t.next_id();
        let product = Product::from_draft(id, draft, || t.next_id(), Utc::now());
        t.products.insert(id, product.clone());
        Ok(product)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn ensure_cart(&self, user_id: UserId) -> Result<EnsuredCart> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        if let Some(&cart_id) = t.carts.get(&user_id) {
            return Ok(EnsuredCart { cart_id, created: false });
        }
        let cart_id = t.next_id();
        t.carts.insert(user_id, cart_id);
        t.cart_owners.insert(cart_id, user_id);
        Ok(EnsuredCart { cart_id, created: true })
    }

    async fn load_items(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        self.check_available()?;
        let t = self.tables.lock().await;
        let items = t.items.values()
            .filter(|line| t.item_carts.get(&line.id) == Some(&cart_id))
            .filter_map(|line| t.products.get(&line.product_id).map(|product| CartItem {
                id: line.id,
                cart_id,
                product_id: line.product_id,
                quantity: line.quantity,
                product: product.clone(),
            }))
            .collect();
        Ok(items)
    }

    async fn add_item(&self, cart_id: CartId, product_id: ProductId, quantity: Quantity) -> Result<CartLine> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        if !t.products.contains_key(&product_id) {
            return Err(StorefrontError::ProductNotFound(product_id));
        }
        let existing = t.items.values()
            .find(|l| l.product_id == product_id && t.item_carts.get(&l.id) == Some(&cart_id))
            .map(|l| l.id);
        let line = match existing {
            Some(id) => {
                let line = t.items.get_mut(&id).ok_or_else(|| StorefrontError::Storage(format!("cart item {id} vanished")))?;
                line.quantity = line.quantity.checked_add(quantity)?;
                *line
            }
            None => {
                let id = t.next_id();
                let line = CartLine { id, product_id, quantity };
                t.items.insert(id, line);
                t.item_carts.insert(id, cart_id);
                line
            }
        };
        Ok(line)
    }

    async fn set_item_quantity(&self, user_id: UserId, item_id: CartItemId, quantity: Quantity) -> Result<bool> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        if !t.owned_item(user_id, item_id) { return Ok(false); }
        match t.items.get_mut(&item_id) {
            Some(line) => { line.quantity = quantity; Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete_item(&self, user_id: UserId, item_id: CartItemId) -> Result<bool> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        if !t.owned_item(user_id, item_id) { return Ok(false); }
        t.item_carts.remove(&item_id);
        Ok(t.items.remove(&item_id).is_some())
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        self.check_available()?;
        let t = self.tables.lock().await;
        let mut list: Vec<Address> = t.addresses.values().filter(|a| a.user_id == user_id).cloned().collect();
        sort_for_listing(&mut list);
        Ok(list)
    }

    async fn insert_address(&self, user_id: UserId, draft: AddressDraft) -> Result<Address> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        let id = t.next_id();
        let address = Address::from_draft(id, user_id, draft, Utc::now());
        let is_default = address.is_default;
        t.addresses.insert(id, address.clone());
        if is_default {
            let mut owned: Vec<Address> = t.addresses.values().filter(|a| a.user_id == user_id).cloned().collect();
            select_default(&mut owned, id);
            t.addresses.extend(owned.into_iter().map(|a| (a.id, a)));
        }
        Ok(address)
    }

    async fn update_address(&self, user_id: UserId, id: AddressId, draft: AddressDraft) -> Result<Option<Address>> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        let Some(address) = t.addresses.get_mut(&id).filter(|a| a.user_id == user_id) else {
            return Ok(None);
        };
        address.apply(draft);
        let updated = address.clone();
        if updated.is_default {
            let mut owned: Vec<Address> = t.addresses.values().filter(|a| a.user_id == user_id).cloned().collect();
            select_default(&mut owned, id);
            t.addresses.extend(owned.into_iter().map(|a| (a.id, a)));
        }
        Ok(Some(updated))
    }

    async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<bool> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        if t.addresses.get(&id).is_some_and(|a| a.user_id == user_id) {
            t.addresses.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<Option<Profile>> {
        self.check_available()?;
        let mut t = self.tables.lock().await;
        Ok(t.users.get_mut(&user_id).map(|profile| {
            profile.apply(update);
            profile.clone()
        }))
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve(&self, token: Uuid) -> Result<Option<UserId>> {
        self.check_available()?;
        Ok(self.tables.lock().await.sessions.get(&token).copied())
    }
}
