//! Domain models for the wallet account platform

pub mod account;
pub mod user;
pub mod transfer;
pub mod reference;
pub mod view;
