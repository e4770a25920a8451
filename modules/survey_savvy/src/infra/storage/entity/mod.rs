//! SeaORM entities, one module per table.

pub mod account;
pub mod comment;
pub mod payment;
pub mod report;
pub mod survey;
pub mod voter;
