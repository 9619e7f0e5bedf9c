// # Cloudflare DNS Provisioner
//
// Cloudflare implementation of the `DnsProvisioner` trait: a thin wrapper
// over the Cloudflare API v4 with a bounded timeout and status-code-mapped
// errors.
//
// Each registry TLD code maps to its own Cloudflare zone, so the provisioner
// carries a `tld -> zone_id` table rather than a single zone.
//
// Intentionally omitted, per the trait contract:
// - NO retry or backoff logic (callers decide whether to retry)
// - NO caching between requests
// - NO background tasks
// - NO access to the registry store
//
// ## Security
//
// The API token never appears in logs; the Debug impl redacts it.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`
// - List DNS Records: GET `/zones/:zone_id/dns_records`

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use subreg_core::traits::{DnsProvisioner, RemoteRecord};
use subreg_core::{Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Timeout for every provisioning request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// TTL applied to provisioned records, in seconds
const RECORD_TTL: u32 = 120;

/// Cloudflare DNS provisioner
///
/// Stateless apart from the HTTP client; one API call per trait method.
pub struct CloudflareProvisioner {
    /// Cloudflare API token, never logged
    api_token: String,

    /// Zone ID per registry TLD code
    zone_ids: HashMap<String, String>,

    /// HTTP client with the bounded timeout baked in
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvisioner")
            .field("api_token", &"<REDACTED>")
            .field("zone_ids", &self.zone_ids)
            .finish()
    }
}

impl CloudflareProvisioner {
    /// Create a new Cloudflare provisioner
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_ids`: zone ID per registry TLD code
    pub fn new(
        api_token: impl Into<String>,
        zone_ids: HashMap<String, String>,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            zone_ids,
            client,
        })
    }

    /// The zone backing a registry TLD code
    fn zone_id(&self, tld: &str) -> Result<&str> {
        self.zone_ids
            .get(tld)
            .map(String::as_str)
            .ok_or_else(|| Error::config(format!("no Cloudflare zone configured for tld '{tld}'")))
    }

    /// Map a non-success HTTP status to a typed error
    fn status_error(status: reqwest::StatusCode, body: &str, context: &str) -> Error {
        match status.as_u16() {
            401 | 403 => Error::provisioning(
                "cloudflare",
                format!("{context}: authentication failed (status {status}), check API token permissions"),
            ),
            404 => Error::not_found(format!("{context}: remote record or zone not found")),
            429 => Error::provisioning(
                "cloudflare",
                format!("{context}: rate limit exceeded (status {status})"),
            ),
            500..=599 => Error::provisioning(
                "cloudflare",
                format!("{context}: server error (transient): {status} - {body}"),
            ),
            _ => Error::provisioning("cloudflare", format!("{context}: {status} - {body}")),
        }
    }

    /// Send a request, check the status, and parse the response body
    async fn execute(&self, request: reqwest::RequestBuilder, context: &str) -> Result<Value> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provisioning("cloudflare", format!("{context}: request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(Self::status_error(status, &body, context));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provisioning("cloudflare", format!("{context}: invalid response: {e}")))
    }

    /// Record payload shared by create and update
    fn record_payload(fqdn: &str, target: &str, record_type: &str) -> Value {
        serde_json::json!({
            "type": record_type,
            "name": fqdn,
            "content": target,
            "ttl": RECORD_TTL,
            // Cloudflare proxy in front of provisioned records
            "proxied": true,
        })
    }

    fn parse_record(result: &Value, context: &str) -> Result<RemoteRecord> {
        serde_json::from_value(result.clone())
            .map_err(|e| Error::provisioning("cloudflare", format!("{context}: malformed record in response: {e}")))
    }
}

#[async_trait]
impl DnsProvisioner for CloudflareProvisioner {
    async fn create_record(
        &self,
        fqdn: &str,
        tld: &str,
        target: &str,
        record_type: &str,
    ) -> Result<RemoteRecord> {
        let zone_id = self.zone_id(tld)?;
        let url = format!("{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records");

        tracing::info!(fqdn, target, record_type, "creating Cloudflare DNS record");

        let json = self
            .execute(
                self.client
                    .post(&url)
                    .json(&Self::record_payload(fqdn, target, record_type)),
                "create record",
            )
            .await?;

        let record = Self::parse_record(&json["result"], "create record")?;
        tracing::debug!(fqdn, record_id = %record.id, "Cloudflare DNS record created");
        Ok(record)
    }

    async fn update_record(
        &self,
        fqdn: &str,
        tld: &str,
        target: &str,
        record_id: &str,
    ) -> Result<()> {
        let zone_id = self.zone_id(tld)?;
        let url = format!("{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records/{record_id}");

        tracing::info!(fqdn, target, record_id, "updating Cloudflare DNS record");

        self.execute(
            self.client
                .put(&url)
                .json(&Self::record_payload(fqdn, target, "A")),
            "update record",
        )
        .await?;
        Ok(())
    }

    async fn delete_record(&self, tld: &str, record_id: &str) -> Result<()> {
        let zone_id = self.zone_id(tld)?;
        let url = format!("{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records/{record_id}");

        tracing::info!(tld, record_id, "deleting Cloudflare DNS record");

        self.execute(self.client.delete(&url), "delete record").await?;
        Ok(())
    }

    async fn list_records(&self, tld: &str) -> Result<Vec<RemoteRecord>> {
        let zone_id = self.zone_id(tld)?;
        let url = format!("{CLOUDFLARE_API_BASE}/zones/{zone_id}/dns_records");

        let json = self.execute(self.client.get(&url), "list records").await?;

        let results = json["result"]
            .as_array()
            .ok_or_else(|| Error::provisioning("cloudflare", "list records: result is not an array"))?;

        results
            .iter()
            .map(|entry| Self::parse_record(entry, "list records"))
            .collect()
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> HashMap<String, String> {
        HashMap::from([
            ("com".to_string(), "zone-com".to_string()),
            ("net".to_string(), "zone-net".to_string()),
        ])
    }

    #[test]
    fn rejects_empty_token() {
        let result = CloudflareProvisioner::new("", zones());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn zone_lookup_by_tld() {
        let provisioner = CloudflareProvisioner::new("token", zones()).unwrap();
        assert_eq!(provisioner.zone_id("com").unwrap(), "zone-com");
        assert!(matches!(provisioner.zone_id("zw"), Err(Error::Config(_))));
    }

    #[test]
    fn api_token_not_exposed_in_debug() {
        let provisioner =
            CloudflareProvisioner::new("secret_token_12345", zones()).unwrap();

        let debug_str = format!("{provisioner:?}");
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("CloudflareProvisioner"));
    }

    #[test]
    fn status_mapping() {
        let err = CloudflareProvisioner::status_error(
            reqwest::StatusCode::NOT_FOUND,
            "",
            "delete record",
        );
        assert!(matches!(err, Error::NotFound(_)));

        let err = CloudflareProvisioner::status_error(
            reqwest::StatusCode::FORBIDDEN,
            "",
            "create record",
        );
        assert!(matches!(err, Error::Provisioning { .. }));
    }

    #[test]
    fn payload_shape() {
        let payload = CloudflareProvisioner::record_payload("shop.example.com", "1.2.3.4", "A");
        assert_eq!(payload["name"], "shop.example.com");
        assert_eq!(payload["content"], "1.2.3.4");
        assert_eq!(payload["type"], "A");
        assert_eq!(payload["ttl"], 120);
        assert_eq!(payload["proxied"], true);
    }

    #[test]
    fn provider_name() {
        let provisioner = CloudflareProvisioner::new("token", zones()).unwrap();
        assert_eq!(provisioner.provider_name(), "cloudflare");
    }
}
