//! End-to-end tests driving the full context against a real database file

use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use payline_core::{
    Caller, ClaimStatus, Error, FundingMethod, GatewaySettings, PaylineContext, TransferKind,
    TransferStatus, WebhookNotification,
};

fn context() -> (TempDir, PaylineContext) {
    let dir = TempDir::new().unwrap();
    let ctx = PaylineContext::new(dir.path()).unwrap();
    (dir, ctx)
}

fn gateway_settings() -> GatewaySettings {
    GatewaySettings {
        merchant_id: "m-1020".to_string(),
        webhook_secret: "hook-secret".to_string(),
        checkout_secret: "checkout-secret".to_string(),
        checkout_base_url: "https://pay.example.com/checkout".to_string(),
    }
}

/// Open a member account funded by an admin grant
fn funded_member(ctx: &PaylineContext, name: &str, amount: Decimal) -> (Uuid, Caller) {
    let admin = ctx.account_service.open_account("Ops", true).unwrap();
    let admin_caller = Caller::admin(admin.id);

    let account = ctx.account_service.open_account(name, false).unwrap();
    ctx.ledger_service
        .record_transfer(
            &admin_caller,
            admin.id,
            account.id,
            amount,
            TransferKind::AdminGrant,
            Some("opening grant".to_string()),
        )
        .unwrap();
    (account.id, Caller::member(account.id))
}

#[test]
fn test_transfer_and_cancel_lifecycle() {
    let (_dir, ctx) = context();
    let (alice, alice_caller) = funded_member(&ctx, "Alice", Decimal::new(10000, 2));
    let bob = ctx.account_service.open_account("Bob", false).unwrap();

    let record = ctx
        .ledger_service
        .record_transfer(
            &alice_caller,
            alice,
            bob.id,
            Decimal::new(4000, 2),
            TransferKind::Transfer,
            None,
        )
        .unwrap();

    assert_eq!(
        ctx.account_service
            .get_balance(&alice_caller, alice)
            .unwrap(),
        Decimal::new(6000, 2)
    );
    assert_eq!(
        ctx.account_service
            .get_balance(&Caller::member(bob.id), bob.id)
            .unwrap(),
        Decimal::new(4000, 2)
    );

    let admin = Caller::admin(Uuid::new_v4());
    let (cancelled, refund) = ctx.ledger_service.cancel_transfer(&admin, record.id).unwrap();
    assert_eq!(cancelled.status, TransferStatus::Cancelled);
    assert_eq!(refund.kind, TransferKind::Refund);

    assert_eq!(
        ctx.account_service
            .get_balance(&alice_caller, alice)
            .unwrap(),
        Decimal::new(10000, 2)
    );
    assert_eq!(
        ctx.account_service
            .get_balance(&Caller::member(bob.id), bob.id)
            .unwrap(),
        Decimal::ZERO
    );

    // history shows the original and its refund on both sides
    let history = ctx.ledger_service.history(&alice_caller, alice).unwrap();
    assert!(history.iter().any(|t| t.id == record.id));
    assert!(history.iter().any(|t| t.id == refund.id));
}

#[test]
fn test_manual_deposit_settlement() {
    let (_dir, ctx) = context();
    let account = ctx.account_service.open_account("Alice", false).unwrap();
    let caller = Caller::member(account.id);

    let claim = ctx
        .deposit_service
        .file_claim(
            &caller,
            account.id,
            Decimal::new(50000, 2),
            FundingMethod::BankTransfer,
            Some("wire ref 1881".to_string()),
        )
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Pending);
    assert_eq!(
        ctx.account_service.get_balance(&caller, account.id).unwrap(),
        Decimal::ZERO
    );

    let admin = Caller::admin(Uuid::new_v4());
    let (settled, balance) = ctx.deposit_service.settle_claim(&admin, claim.id).unwrap();
    assert_eq!(settled.status, ClaimStatus::Completed);
    assert_eq!(balance, Decimal::new(50000, 2));

    let err = ctx.deposit_service.settle_claim(&admin, claim.id).unwrap_err();
    assert!(matches!(err, Error::AlreadySettled(_)));
    assert_eq!(
        ctx.account_service.get_balance(&caller, account.id).unwrap(),
        Decimal::new(50000, 2)
    );
}

#[test]
fn test_gateway_checkout_and_webhook_round_trip() {
    let (_dir, ctx) = context();
    ctx.gateway
        .update_settings(&Caller::admin(Uuid::new_v4()), gateway_settings())
        .unwrap();

    let account = ctx.account_service.open_account("Alice", false).unwrap();
    let caller = Caller::member(account.id);
    let claim = ctx
        .deposit_service
        .file_claim(
            &caller,
            account.id,
            Decimal::new(4990, 2),
            FundingMethod::Gateway,
            None,
        )
        .unwrap();

    let url = ctx.gateway.build_payment_url(&claim).unwrap();
    let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs.get("oa").map(String::as_str), Some("49.90"));
    assert_eq!(pairs.get("o"), Some(&claim.id.to_string()));

    // the gateway notifies settlement, signed with the webhook secret
    let payload = format!("m-1020:49.90:hook-secret:{}", claim.id);
    let note = WebhookNotification {
        merchant_id: "m-1020".to_string(),
        amount: "49.90".to_string(),
        claim_id: claim.id.to_string(),
        signature: format!("{:x}", md5::compute(payload.as_bytes())),
    };

    let (settled, balance) = ctx.gateway.handle_webhook(&note).unwrap();
    assert_eq!(settled.status, ClaimStatus::Completed);
    assert_eq!(balance, Decimal::new(4990, 2));

    // replay is rejected without a second credit
    assert!(matches!(
        ctx.gateway.handle_webhook(&note),
        Err(Error::AlreadySettled(_))
    ));
    assert_eq!(
        ctx.account_service.get_balance(&caller, account.id).unwrap(),
        Decimal::new(4990, 2)
    );
}

#[test]
fn test_forged_webhook_mutates_nothing() {
    let (_dir, ctx) = context();
    ctx.gateway
        .update_settings(&Caller::admin(Uuid::new_v4()), gateway_settings())
        .unwrap();

    let account = ctx.account_service.open_account("Alice", false).unwrap();
    let caller = Caller::member(account.id);
    let claim = ctx
        .deposit_service
        .file_claim(
            &caller,
            account.id,
            Decimal::new(50000, 2),
            FundingMethod::Gateway,
            None,
        )
        .unwrap();

    let note = WebhookNotification {
        merchant_id: "m-1020".to_string(),
        amount: "500.00".to_string(),
        claim_id: claim.id.to_string(),
        signature: "0123456789abcdef0123456789abcdef".to_string(),
    };
    assert!(matches!(
        ctx.gateway.handle_webhook(&note),
        Err(Error::SignatureMismatch)
    ));

    assert_eq!(
        ctx.account_service.get_balance(&caller, account.id).unwrap(),
        Decimal::ZERO
    );
    assert_eq!(
        ctx.deposit_service.get_claim(claim.id).unwrap().status,
        ClaimStatus::Pending
    );
}

#[test]
fn test_member_cannot_manage_gateway_credentials() {
    let (_dir, ctx) = context();
    let admin = Caller::admin(Uuid::new_v4());
    ctx.gateway.update_settings(&admin, gateway_settings()).unwrap();

    let account = ctx.account_service.open_account("Alice", false).unwrap();
    let member = Caller::member(account.id);

    assert!(matches!(
        ctx.gateway.update_settings(&member, GatewaySettings::default()),
        Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
        ctx.gateway.settings(&member),
        Err(Error::Unauthorized(_))
    ));

    // the configured credentials survived the rejected update
    assert_eq!(ctx.gateway.settings(&admin).unwrap().merchant_id, "m-1020");
}

#[test]
fn test_context_reopens_existing_database() {
    let dir = TempDir::new().unwrap();
    let account_id = {
        let ctx = PaylineContext::new(dir.path()).unwrap();
        ctx.account_service.open_account("Alice", false).unwrap().id
    };

    let ctx = PaylineContext::new(dir.path()).unwrap();
    let account = ctx.account_service.get_account(account_id).unwrap();
    assert_eq!(account.name, "Alice");
}
