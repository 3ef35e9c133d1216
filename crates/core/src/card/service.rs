//! Card issuance and listing.

use std::sync::Arc;

use chrono::Utc;
use ledgerline_shared::{
    config::CardConfig,
    types::{AccountId, PageRequest},
};
use tracing::{error, info};

use super::error::CardError;
use super::types::{CardView, IssuedCard, NewCard, StoredCard};
use crate::Principal;
use crate::crypto::{
    CardCipher, IntegrityKey, generate_card_number, generate_cvv, generate_expiry, hash_secret,
    verify_secret,
};
use crate::principal::authorize_account;
use crate::store::LedgerStore;

/// Issues cards and reads them back decrypted.
#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn LedgerStore>,
    cipher: CardCipher,
    integrity: IntegrityKey,
    settings: CardConfig,
}

impl CardService {
    /// Creates a card service. `cipher` and `integrity` must be keyed with
    /// different secrets.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        cipher: CardCipher,
        integrity: IntegrityKey,
        settings: CardConfig,
    ) -> Self {
        Self {
            store,
            cipher,
            integrity,
            settings,
        }
    }

    /// Issues a card on one of the caller's accounts.
    ///
    /// The returned [`IssuedCard`] is the only place the CVV is ever readable.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`/`Forbidden` for foreign or missing accounts,
    /// `Crypto` if the card material cannot be generated or sealed.
    pub async fn issue_card(
        &self,
        principal: &Principal,
        account_id: AccountId,
    ) -> Result<IssuedCard, CardError> {
        // 1. Ownership
        authorize_account(self.store.as_ref(), principal, account_id).await?;

        // 2. Card material
        let card_number =
            generate_card_number(&self.settings.bin_prefix, self.settings.number_length)?;
        let expiry = generate_expiry(Utc::now().date_naive(), self.settings.validity_years);
        let cvv = generate_cvv();

        // 3. Seal number and expiry separately, hash the CVV
        let card_number_ciphertext = self.cipher.encrypt(&card_number)?;
        let expiry_ciphertext = self.cipher.encrypt(&expiry)?;
        let cvv_hash = hash_secret(&cvv)?;

        // 4. Tag the plaintext triple
        let integrity_tag = self
            .integrity
            .tag(&[card_number.as_str(), expiry.as_str(), cvv.as_str()]);

        let stored = self
            .store
            .create_card(NewCard {
                account_id,
                card_number_ciphertext,
                expiry_ciphertext,
                cvv_hash,
                integrity_tag,
            })
            .await?;

        info!(card_id = %stored.id, %account_id, "Card issued");

        Ok(IssuedCard {
            id: stored.id,
            account_id,
            card_number,
            expiry,
            cvv,
            created_at: stored.created_at,
        })
    }

    /// Lists the caller's cards, newest first, optionally for one account.
    ///
    /// # Errors
    ///
    /// Fails as a whole with `Crypto(DecryptFailed)` if any card does not open.
    pub async fn list_cards(
        &self,
        principal: &Principal,
        account_id: Option<AccountId>,
        page: PageRequest,
    ) -> Result<Vec<CardView>, CardError> {
        if let Some(account_id) = account_id {
            authorize_account(self.store.as_ref(), principal, account_id).await?;
        }

        let cards = self
            .store
            .list_cards(principal.user_id, account_id, page.normalized())
            .await?;

        cards.iter().map(|card| self.open(card)).collect()
    }

    /// Checks a stored card end to end: both fields open, the CVV matches
    /// its hash, and the tag over the plaintext triple is reproduced.
    ///
    /// # Errors
    ///
    /// Returns `Crypto` if the stored ciphertext or hash is unreadable.
    pub fn verify_card(&self, card: &StoredCard, cvv: &str) -> Result<bool, CardError> {
        let view = self.open(card)?;
        if !verify_secret(cvv, &card.cvv_hash)? {
            return Ok(false);
        }
        Ok(self
            .integrity
            .verify(&[view.card_number.as_str(), view.expiry.as_str(), cvv], &card.integrity_tag))
    }

    fn open(&self, card: &StoredCard) -> Result<CardView, CardError> {
        let opened = self
            .cipher
            .decrypt(&card.card_number_ciphertext)
            .and_then(|number| Ok((number, self.cipher.decrypt(&card.expiry_ciphertext)?)));
        let (card_number, expiry) = opened.inspect_err(|e| {
            error!(card_id = %card.id, error = %e, "Stored card failed to decrypt");
        })?;

        Ok(CardView {
            id: card.id,
            account_id: card.account_id,
            card_number,
            expiry,
            integrity_tag: card.integrity_tag.clone(),
            created_at: card.created_at,
        })
    }
}
