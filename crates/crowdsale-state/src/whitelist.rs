use tracing::{debug, info};

use crowdsale_core::command::InvocationContext;
use crowdsale_core::error::SaleError;
use crowdsale_core::types::{Identity, Tier};

use crate::db::{StagedMutations, StateDb};

/// KYC whitelist: identity → group 1..=4. Last write wins, no history.
pub struct WhitelistRegistry<'a> {
    db: &'a StateDb,
    kyc_key: Identity,
}

impl<'a> WhitelistRegistry<'a> {
    pub fn new(db: &'a StateDb, kyc_key: Identity) -> Self {
        Self { db, kyc_key }
    }

    fn require_kyc(&self, ctx: &InvocationContext) -> Result<(), SaleError> {
        if ctx.is_witnessed_by(&self.kyc_key) {
            Ok(())
        } else {
            Err(SaleError::MissingWitness(format!("kyc middleware {}", self.kyc_key)))
        }
    }

    /// Whitelist `id` under `group`, replacing any previous group.
    pub fn add_address(&self, ctx: &InvocationContext, id: &Identity, group: u8) -> Result<(), SaleError> {
        let tier = Tier::from_group(group).ok_or(SaleError::InvalidGroup(group))?;
        self.require_kyc(ctx)?;

        let mut staged = StagedMutations::default();
        staged.put_group(id, tier.group())?;
        self.db.commit(staged)?;
        info!(identity = %id, group, "whitelisted");
        Ok(())
    }

    /// Remove `id` from the whitelist. Revoking an absent entry succeeds.
    pub fn revoke_address(&self, ctx: &InvocationContext, id: &Identity) -> Result<(), SaleError> {
        self.require_kyc(ctx)?;

        let mut staged = StagedMutations::default();
        staged.delete_group(id);
        self.db.commit(staged)?;
        info!(identity = %id, "whitelist entry revoked");
        Ok(())
    }

    /// Stored group, 0 when absent.
    pub fn group_of(&self, id: &Identity) -> Result<u8, SaleError> {
        self.db.group_of(id)
    }

    pub fn tier_of(&self, id: &Identity) -> Result<Option<Tier>, SaleError> {
        let group = self.group_of(id)?;
        let tier = Tier::from_group(group);
        if tier.is_none() && group != 0 {
            debug!(identity = %id, group, "stored group outside 1..=4");
        }
        Ok(tier)
    }

    pub fn is_whitelisted(&self, id: &Identity) -> Result<bool, SaleError> {
        Ok(self.tier_of(id)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdsale_core::types::TxId;

    const KYC: Identity = Identity([0xAA; 20]);

    fn ctx() -> InvocationContext {
        InvocationContext::new(0, TxId([0; 32])).witnessed_by(KYC)
    }

    #[test]
    fn add_overwrites_and_revoke_clears() {
        let db = StateDb::in_memory();
        let reg = WhitelistRegistry::new(&db, KYC);
        let id = Identity([1; 20]);

        assert!(!reg.is_whitelisted(&id).unwrap());
        reg.add_address(&ctx(), &id, 2).unwrap();
        assert_eq!(reg.tier_of(&id).unwrap(), Some(Tier::Two));

        reg.add_address(&ctx(), &id, 4).unwrap();
        reg.add_address(&ctx(), &id, 4).unwrap();
        assert_eq!(reg.group_of(&id).unwrap(), 4);

        reg.revoke_address(&ctx(), &id).unwrap();
        assert_eq!(reg.group_of(&id).unwrap(), 0);
        assert!(!reg.is_whitelisted(&id).unwrap());
        // Revoking again is harmless.
        reg.revoke_address(&ctx(), &id).unwrap();
    }

    #[test]
    fn group_outside_range_rejected() {
        let db = StateDb::in_memory();
        let reg = WhitelistRegistry::new(&db, KYC);
        let id = Identity([1; 20]);
        assert_eq!(reg.add_address(&ctx(), &id, 0), Err(SaleError::InvalidGroup(0)));
        assert_eq!(reg.add_address(&ctx(), &id, 5), Err(SaleError::InvalidGroup(5)));
        assert_eq!(reg.group_of(&id).unwrap(), 0);
    }

    #[test]
    fn requires_kyc_witness() {
        let db = StateDb::in_memory();
        let reg = WhitelistRegistry::new(&db, KYC);
        let id = Identity([1; 20]);
        let unsigned = InvocationContext::new(0, TxId([0; 32])).witnessed_by(id);
        assert!(matches!(
            reg.add_address(&unsigned, &id, 1),
            Err(SaleError::MissingWitness(_))
        ));
        reg.add_address(&ctx(), &id, 1).unwrap();
        assert!(reg.revoke_address(&unsigned, &id).is_err());
        assert!(reg.is_whitelisted(&id).unwrap());
    }
}
