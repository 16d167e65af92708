//! Aggregates module
pub mod address;
pub mod cart;
pub mod product;
pub mod profile;

pub use address::{Address, AddressDraft};
pub use cart::{compute_aggregate, Cart, CartAggregate, CartItem};
pub use product::{GalleryImage, Product, ProductDraft, ProductPage, ProductQuery, ProductSort};
pub use profile::{Profile, ProfileUpdate};
