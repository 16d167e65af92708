//! Application services composing stores and event publishing.

pub mod address;
pub mod cart;

pub use address::AddressService;
pub use cart::CartService;
