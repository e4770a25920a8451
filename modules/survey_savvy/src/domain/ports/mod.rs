pub mod payment;

pub use payment::{PaymentIntent, PaymentProvider};
