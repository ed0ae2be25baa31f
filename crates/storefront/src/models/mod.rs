//! Domain models shared by the cart and checkout flow.
//!
//! - [`product`] - catalog product and variant as handed to the cart
//! - [`buy_now`] - single-product purchase descriptor kept in session storage
//! - [`session`] - session storage keys and the post-sign-in cart-reopen flag

pub mod buy_now;
pub mod product;
pub mod session;

pub use buy_now::{BuyNowProduct, PresuppliedIntent};
pub use product::{Product, Variant};
pub use session::keys as session_keys;
