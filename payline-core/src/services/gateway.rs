//! Gateway bridge - payment-gateway checkout URLs and settlement webhooks
//!
//! The bridge speaks the gateway's legacy MD5 protocol. Two independent
//! shared secrets are in play: the checkout secret signs outbound payment
//! URLs, the webhook secret verifies inbound settlement notifications.
//! A webhook is verified before any database lookup happens; a bad
//! signature leaves no trace in the ledger.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::config::GatewaySettings;
use crate::domain::result::{Error, Result};
use crate::domain::{Caller, DepositClaim};
use crate::services::DepositService;

/// An inbound settlement notification, exactly as it arrived on the wire
///
/// Fields stay raw strings until the signature has been verified; nothing
/// here is trusted before that.
#[derive(Debug, Clone)]
pub struct WebhookNotification {
    pub merchant_id: String,
    pub amount: String,
    pub claim_id: String,
    pub signature: String,
}

/// Bridge between the ledger and the external payment gateway
pub struct GatewayBridge {
    deposits: Arc<DepositService>,
    settings: RwLock<GatewaySettings>,
}

impl GatewayBridge {
    pub fn new(deposits: Arc<DepositService>, settings: GatewaySettings) -> Self {
        Self {
            deposits,
            settings: RwLock::new(settings),
        }
    }

    /// Replace the gateway credentials at runtime (admin only)
    pub fn update_settings(&self, caller: &Caller, settings: GatewaySettings) -> Result<()> {
        caller.require_admin("update gateway settings")?;
        *self.settings.write().unwrap() = settings;
        Ok(())
    }

    /// Read the gateway credentials (admin only)
    pub fn settings(&self, caller: &Caller) -> Result<GatewaySettings> {
        caller.require_admin("view gateway settings")?;
        Ok(self.settings.read().unwrap().clone())
    }

    /// Build the signed checkout URL for a pending gateway claim
    ///
    /// The amount is rendered with exactly two fractional digits so the
    /// signature matches what the gateway recomputes on its side.
    pub fn build_payment_url(&self, claim: &DepositClaim) -> Result<Url> {
        let settings = self.settings.read().unwrap();
        if !settings.is_configured() {
            return Err(Error::config("gateway is not configured"));
        }

        let amount = render_amount(claim.amount);
        let signature = sign(
            &settings.merchant_id,
            &amount,
            &settings.checkout_secret,
            &claim.id.to_string(),
        );

        let mut url = Url::parse(&settings.checkout_base_url)
            .map_err(|e| Error::config(format!("invalid checkout base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("m", &settings.merchant_id)
            .append_pair("oa", &amount)
            .append_pair("o", &claim.id.to_string())
            .append_pair("s", &signature);
        Ok(url)
    }

    /// Verify and settle an inbound webhook notification
    ///
    /// Order matters: the signature check runs before any claim lookup so
    /// a forger learns nothing about which claim ids exist. The credited
    /// amount always comes from the stored claim, never from the wire.
    pub fn handle_webhook(&self, note: &WebhookNotification) -> Result<(DepositClaim, Decimal)> {
        {
            let settings = self.settings.read().unwrap();
            if !settings.is_configured() {
                return Err(Error::config("gateway is not configured"));
            }
            if note.merchant_id != settings.merchant_id {
                return Err(Error::SignatureMismatch);
            }

            let expected = sign(
                &settings.merchant_id,
                &note.amount,
                &settings.webhook_secret,
                &note.claim_id,
            );
            if !digests_match(&expected, &note.signature.to_lowercase()) {
                return Err(Error::SignatureMismatch);
            }
        }

        let claim_id = Uuid::parse_str(&note.claim_id)
            .map_err(|_| Error::validation(format!("malformed claim id: {}", note.claim_id)))?;

        let claim = self.deposits.get_claim(claim_id)?;
        let wire_amount = Decimal::from_str_exact(&note.amount)
            .map_err(|_| Error::validation(format!("malformed amount: {}", note.amount)))?;
        if wire_amount != claim.amount {
            return Err(Error::validation(
                "webhook amount does not match the claimed amount",
            ));
        }

        self.deposits.settle(claim_id)
    }
}

/// Legacy gateway signature: md5 over colon-joined fields, lowercase hex
fn sign(merchant_id: &str, amount: &str, secret: &str, claim_id: &str) -> String {
    let payload = format!("{merchant_id}:{amount}:{secret}:{claim_id}");
    format!("{:x}", md5::compute(payload.as_bytes()))
}

/// Constant-time digest comparison
fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Render an amount with exactly two fractional digits
fn render_amount(amount: Decimal) -> String {
    let mut amount = amount;
    amount.rescale(2);
    amount.to_string()
}
