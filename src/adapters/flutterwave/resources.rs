//! Resource services - thin path templates over `ApiClient`.
//!
//! Each service validates its identifiers before building the path; the
//! client then sanitizes the full endpoint again.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::gateway::{
    path_segment, AccountNumber, BankCode, CardBin, GatewayError, TransactionId,
};

use super::client::ApiClient;

// ════════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════════

/// Payments, transactions and refunds.
#[derive(Debug, Clone)]
pub struct Payments {
    client: Arc<ApiClient>,
}

impl Payments {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Creates a hosted payment link.
    ///
    /// An object body without `currency` gets the configured default.
    pub async fn initialize(&self, mut data: Value) -> Result<Value, GatewayError> {
        if let Value::Object(fields) = &mut data {
            if !fields.contains_key("currency") {
                let currency = self.client.credential().default_currency().to_string();
                fields.insert("currency".into(), Value::String(currency));
            }
        }
        self.client.post("payments", data).await
    }

    pub async fn verify(&self, transaction_id: &str) -> Result<Value, GatewayError> {
        let id = TransactionId::parse(transaction_id)?;
        self.client
            .get(&format!("transactions/{}/verify", id), json!({}))
            .await
    }

    pub async fn transaction(&self, transaction_id: &str) -> Result<Value, GatewayError> {
        let id = TransactionId::parse(transaction_id)?;
        self.client.get(&format!("transactions/{}", id), json!({})).await
    }

    pub async fn transaction_by_reference(&self, tx_ref: &str) -> Result<Value, GatewayError> {
        self.client
            .get("transactions", json!({ "tx_ref": tx_ref }))
            .await
    }

    pub async fn list_transactions(&self, filters: Value) -> Result<Value, GatewayError> {
        self.client.get("transactions", filters).await
    }

    pub async fn transaction_fees(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("transactions/fee", data).await
    }

    pub async fn resend_webhook(&self, transaction_id: &str) -> Result<Value, GatewayError> {
        let id = TransactionId::parse(transaction_id)?;
        self.client
            .post(&format!("transactions/{}/resend-webhook", id), json!({}))
            .await
    }

    pub async fn refund(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("transactions/refund", data).await
    }

    pub async fn refund_details(&self, refund_id: &str) -> Result<Value, GatewayError> {
        let id = TransactionId::parse(refund_id)?;
        self.client.get(&format!("refunds/{}", id), json!({})).await
    }

    pub async fn list_refunds(&self, filters: Value) -> Result<Value, GatewayError> {
        self.client.get("refunds", filters).await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Transfers
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Transfers {
    client: Arc<ApiClient>,
}

impl Transfers {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("transfers", data).await
    }

    pub async fn create_bulk(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("bulk-transfers", data).await
    }

    pub async fn get(&self, transfer_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(transfer_id, "transfer_id")?;
        self.client.get(&format!("transfers/{}", id), json!({})).await
    }

    pub async fn list(&self, filters: Value) -> Result<Value, GatewayError> {
        self.client.get("transfers", filters).await
    }

    pub async fn rates(&self, query: Value) -> Result<Value, GatewayError> {
        self.client.get("transfers/rates", query).await
    }

    pub async fn fees(&self, query: Value) -> Result<Value, GatewayError> {
        self.client.get("transfers/fee", query).await
    }

    pub async fn retry(&self, transfer_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(transfer_id, "transfer_id")?;
        self.client
            .post(&format!("transfers/{}/retry", id), json!({}))
            .await
    }

    pub async fn bulk_status(&self, batch_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(batch_id, "batch_id")?;
        self.client
            .get(&format!("bulk-transfers/{}", id), json!({}))
            .await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Subscriptions {
    client: Arc<ApiClient>,
}

impl Subscriptions {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("subscriptions", data).await
    }

    pub async fn get(&self, subscription_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(subscription_id, "subscription_id")?;
        self.client
            .get(&format!("subscriptions/{}", id), json!({}))
            .await
    }

    pub async fn list(&self, filters: Value) -> Result<Value, GatewayError> {
        self.client.get("subscriptions", filters).await
    }

    pub async fn cancel(&self, subscription_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(subscription_id, "subscription_id")?;
        self.client
            .put(&format!("subscriptions/{}/cancel", id), json!({}))
            .await
    }

    pub async fn activate(&self, subscription_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(subscription_id, "subscription_id")?;
        self.client
            .put(&format!("subscriptions/{}/activate", id), json!({}))
            .await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Virtual Accounts
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct VirtualAccounts {
    client: Arc<ApiClient>,
}

impl VirtualAccounts {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("virtual-account-numbers", data).await
    }

    pub async fn create_bulk(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("virtual-account-numbers/bulk", data).await
    }

    pub async fn get(&self, account_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(account_id, "account_id")?;
        self.client
            .get(&format!("virtual-account-numbers/{}", id), json!({}))
            .await
    }

    pub async fn list(&self, filters: Value) -> Result<Value, GatewayError> {
        self.client.get("virtual-account-numbers", filters).await
    }

    pub async fn update(&self, account_id: &str, data: Value) -> Result<Value, GatewayError> {
        let id = path_segment(account_id, "account_id")?;
        self.client
            .put(&format!("virtual-account-numbers/{}", id), data)
            .await
    }

    pub async fn delete(&self, account_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(account_id, "account_id")?;
        self.client
            .delete(&format!("virtual-account-numbers/{}", id))
            .await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Verification
// ════════════════════════════════════════════════════════════════════════════════

/// Bank account, BVN and card BIN lookups.
#[derive(Debug, Clone)]
pub struct Verification {
    client: Arc<ApiClient>,
}

impl Verification {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn resolve_bank_account(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("accounts/resolve", data).await
    }

    pub async fn verify_bvn(&self, data: Value) -> Result<Value, GatewayError> {
        self.client.post("kyc/bvn", data).await
    }

    pub async fn card_bin(&self, bin: &str) -> Result<Value, GatewayError> {
        let bin = CardBin::parse(bin)?;
        self.client
            .get(&format!("card-bins/{}", bin.as_str()), json!({}))
            .await
    }

    /// Validates both numbers, then resolves the account.
    pub async fn verify_account_number(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<Value, GatewayError> {
        let account_number = AccountNumber::parse(account_number)?;
        let bank_code = BankCode::parse(bank_code)?;
        self.resolve_bank_account(json!({
            "account_number": account_number.as_str(),
            "account_bank": bank_code.as_str(),
        }))
        .await
    }

    /// Lists banks for `country`, else for the configured default country.
    pub async fn banks(&self, country: Option<&str>) -> Result<Value, GatewayError> {
        let country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.client.credential().default_country());
        self.client.get("banks", json!({ "country": country })).await
    }

    pub async fn bank_branches(&self, bank_id: &str) -> Result<Value, GatewayError> {
        let id = path_segment(bank_id, "bank_id")?;
        self.client
            .get(&format!("banks/{}/branches", id), json!({}))
            .await
    }
}
