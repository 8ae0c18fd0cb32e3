//! Score and sign-up eligibility lookups keyed by the caller's fid.

use std::sync::Arc;

use tracing::debug;

use super::upstream::{AccountDirectory, IdentityResolver, ReputationLookup, degrade};

/// Score rendered when the reputation service has no answer.
pub const UNKNOWN_SCORE: &str = "0.00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The fid has no verified wallet.
    NoAddress,
    AlreadyRegistered,
    Eligible,
    NotEligible,
}

#[derive(Clone)]
pub struct SignupService {
    resolver: Arc<dyn IdentityResolver>,
    accounts: Arc<dyn AccountDirectory>,
    reputation: Arc<dyn ReputationLookup>,
}

impl SignupService {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        accounts: Arc<dyn AccountDirectory>,
        reputation: Arc<dyn ReputationLookup>,
    ) -> Self {
        Self {
            resolver,
            accounts,
            reputation,
        }
    }

    pub async fn address_for(&self, fid: u64) -> Option<String> {
        degrade(self.resolver.verified_address(fid).await, None)
    }

    pub async fn eligibility(&self, fid: u64) -> Eligibility {
        let Some(address) = self.address_for(fid).await else {
            return Eligibility::NoAddress;
        };

        if degrade(self.accounts.account_exists(&address).await, false) {
            return Eligibility::AlreadyRegistered;
        }

        if degrade(self.accounts.is_eligible(&address).await, false) {
            Eligibility::Eligible
        } else {
            debug!(target = "framecard::signup", fid, %address, "address not eligible");
            Eligibility::NotEligible
        }
    }

    /// Score formatted with two decimals.
    pub async fn formatted_score(&self, address: &str) -> String {
        match degrade(self.reputation.score(address).await, None) {
            Some(score) if score.is_finite() => format!("{score:.2}"),
            _ => UNKNOWN_SCORE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::upstream::UpstreamError;
    use async_trait::async_trait;

    const ADDRESS: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";

    struct Fixture {
        address: Option<&'static str>,
        registered: bool,
        eligible: Result<bool, ()>,
        score: Option<f64>,
    }

    #[async_trait]
    impl IdentityResolver for Fixture {
        async fn verified_address(&self, _fid: u64) -> Result<Option<String>, UpstreamError> {
            Ok(self.address.map(str::to_string))
        }
    }

    #[async_trait]
    impl AccountDirectory for Fixture {
        async fn account_exists(&self, _address: &str) -> Result<bool, UpstreamError> {
            Ok(self.registered)
        }

        async fn is_eligible(&self, _address: &str) -> Result<bool, UpstreamError> {
            self.eligible.map_err(|_| UpstreamError::Status {
                service: "reputation",
                status: 500,
            })
        }
    }

    #[async_trait]
    impl ReputationLookup for Fixture {
        async fn score(&self, _address: &str) -> Result<Option<f64>, UpstreamError> {
            Ok(self.score)
        }
    }

    fn service(fixture: Fixture) -> SignupService {
        let fixture = Arc::new(fixture);
        SignupService::new(fixture.clone(), fixture.clone(), fixture)
    }

    fn fixture() -> Fixture {
        Fixture {
            address: Some(ADDRESS),
            registered: false,
            eligible: Ok(true),
            score: Some(12.5),
        }
    }

    #[tokio::test]
    async fn eligibility_branches() {
        assert_eq!(
            service(Fixture {
                address: None,
                ..fixture()
            })
            .eligibility(1)
            .await,
            Eligibility::NoAddress
        );
        assert_eq!(
            service(Fixture {
                registered: true,
                ..fixture()
            })
            .eligibility(1)
            .await,
            Eligibility::AlreadyRegistered
        );
        assert_eq!(service(fixture()).eligibility(1).await, Eligibility::Eligible);
        assert_eq!(
            service(Fixture {
                eligible: Err(()),
                ..fixture()
            })
            .eligibility(1)
            .await,
            Eligibility::NotEligible
        );
    }

    #[tokio::test]
    async fn scores_use_two_decimals() {
        assert_eq!(service(fixture()).formatted_score(ADDRESS).await, "12.50");
        assert_eq!(
            service(Fixture {
                score: None,
                ..fixture()
            })
            .formatted_score(ADDRESS)
            .await,
            UNKNOWN_SCORE
        );
    }
}
