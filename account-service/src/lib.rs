//! Account service: provisioning, lifecycle and aggregation of wallet accounts

pub mod config;
pub mod gateway;
pub mod generator;
pub mod reference;
pub mod repository;
pub mod service;

pub use config::{AccountServiceConfig, TransferFailurePolicy};
pub use gateway::{
    HttpTransferGateway, HttpUserGateway, InMemoryTransferGateway, InMemoryUserGateway,
    TransferGateway, UserGateway,
};
pub use generator::{IdentifierGenerator, UniquenessOracle};
pub use reference::{InMemoryReferenceLookup, PostgresReferenceLookup, ReferenceLookup};
pub use repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};
pub use service::{
    AccountService, AggregationService, Collaborators, LifecycleService, ProvisioningService,
};
