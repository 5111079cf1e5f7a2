//! Listing item templates and their payment information
//!
//! Both entities belong to the marketplace; escrow code only reads them.

mod model;
mod repository;

pub use model::*;
pub use repository::{
    ListingItemTemplateRepository, PaymentInformationRepository, PgListingItemTemplateRepository,
    PgPaymentInformationRepository,
};
