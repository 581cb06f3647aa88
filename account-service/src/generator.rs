//! Unique identifier generation for new accounts
//!
//! Every identifier class follows the same loop: draw a random candidate, ask
//! the [`UniquenessOracle`] whether it is free, and retry with a fresh
//! candidate until one is accepted or the attempt budget runs out.
//!
//! The oracle is only a fast path. Between the check and the insert another
//! request may claim the same value, so the account store enforces uniqueness
//! itself and rejects the loser with `Error::DuplicateIdentifier`.

use std::sync::Arc;

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::account::{
    AccountIdentifiers, IdentifierClass, ACCOUNT_NUMBER_DIGITS, ALIAS_SEPARATOR, ALIAS_WORDS,
    CBU_LENGTH,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::AccountServiceConfig;

/// Answers whether a candidate identifier is currently unassigned
#[async_trait]
pub trait UniquenessOracle: Send + Sync {
    async fn is_unique(&self, class: IdentifierClass, value: &str) -> Result<bool>;
}

/// Words aliases are drawn from
pub const ALIAS_DICTIONARY: [&str; 30] = [
    "águila", "león", "tigre", "luna", "río", "nube", "piedra", "bosque", "montaña", "lobo",
    "sol", "estrella", "océano", "sueño", "fuego", "tormenta", "árbol", "cielo", "viento", "sombra",
    "mar", "trueno", "nieve", "rayo", "flor", "campo", "jardín", "ciudad", "desierto", "isla",
];

/// Mints account numbers, CBUs and aliases
pub struct IdentifierGenerator {
    oracle: Arc<dyn UniquenessOracle>,
    bank_code: String,
    cbu_prefix: String,
    max_attempts: u32,
}

impl IdentifierGenerator {
    /// Create a generator; prefixes are expected to be numeric
    pub fn new(
        oracle: Arc<dyn UniquenessOracle>,
        bank_code: impl Into<String>,
        cbu_prefix: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            oracle,
            bank_code: bank_code.into(),
            cbu_prefix: cbu_prefix.into(),
            max_attempts,
        }
    }

    /// Create a generator from validated configuration
    pub fn with_config(oracle: Arc<dyn UniquenessOracle>, config: &AccountServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            oracle,
            config.bank_code.clone(),
            config.cbu_prefix.clone(),
            config.max_generation_attempts,
        ))
    }

    /// Generate a value of `class` the oracle reports as free
    ///
    /// Issues at most `max_attempts` oracle checks. Each call owns its random
    /// stream so concurrent requests never share generator state.
    pub async fn generate(&self, class: IdentifierClass) -> Result<String> {
        let mut rng = StdRng::from_entropy();

        for attempt in 1..=self.max_attempts {
            let candidate = self.candidate(class, &mut rng);

            if self.oracle.is_unique(class, &candidate).await? {
                debug!("Generated {} {} after {} attempt(s)", class, candidate, attempt);
                return Ok(candidate);
            }

            debug!(
                "{} candidate {} already in use (attempt {}/{})",
                class, candidate, attempt, self.max_attempts
            );
        }

        warn!("Exhausted {} attempts generating a {}", self.max_attempts, class);
        Err(Error::GenerationExhausted(class))
    }

    /// Generate the account number, CBU and alias for a new account
    pub async fn generate_all(&self) -> Result<AccountIdentifiers> {
        let (account_number, cbu, alias) = futures::try_join!(
            self.generate(IdentifierClass::AccountNumber),
            self.generate(IdentifierClass::Cbu),
            self.generate(IdentifierClass::Alias),
        )?;

        Ok(AccountIdentifiers {
            account_number,
            cbu,
            alias,
        })
    }

    /// Draw one candidate of `class` without consulting the oracle
    pub fn candidate<R: Rng + ?Sized>(&self, class: IdentifierClass, rng: &mut R) -> String {
        match class {
            IdentifierClass::AccountNumber => {
                format!("{}-{}", self.bank_code, random_digits(rng, ACCOUNT_NUMBER_DIGITS))
            }
            IdentifierClass::Cbu => {
                let tail = CBU_LENGTH.saturating_sub(self.cbu_prefix.len());
                format!("{}{}", self.cbu_prefix, random_digits(rng, tail))
            }
            IdentifierClass::Alias => (0..ALIAS_WORDS)
                .map(|_| ALIAS_DICTIONARY[rng.gen_range(0..ALIAS_DICTIONARY.len())])
                .collect::<Vec<_>>()
                .join(ALIAS_SEPARATOR),
        }
    }
}

// First digit is never zero so the value never reads as a shorter number.
fn random_digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let mut digits = String::with_capacity(len);
    for i in 0..len {
        let low = if i == 0 { 1 } else { 0 };
        digits.push(char::from(b'0' + rng.gen_range(low..10u8)));
    }
    digits
}
