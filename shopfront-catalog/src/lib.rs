pub mod cart;
pub mod pricing;

pub use cart::{Cart, CartItem, CatalogError};
pub use pricing::{format_money, PriceBreakdown, PricingCalculator};
