pub mod cart;
pub mod checkout;

pub use cart::{CartError, CartService, CartView};
pub use checkout::{CheckoutError, CheckoutFailure, CheckoutReceipt, CheckoutService};
