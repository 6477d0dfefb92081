//! The real gRPC implementation of [`PlatformClient`] (component A).

use crate::convert::request_from_proto;
use crate::identity;
use crate::proto::access_platform_client::AccessPlatformClient;
use crate::proto::{
    ListAccessRequestsRequest, PingRequest, SetAccessRequestStateRequest, UpsertLockRequest,
};
use async_trait::async_trait;
use jitw_core::{AccessRequest, Lock, PlatformClient, PlatformError, SettableState};
use std::path::Path;
use std::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::instrument;

/// gRPC-backed platform facade. Owns the transport channel and credentials;
/// `close` drops the channel.
#[derive(Clone)]
pub struct GrpcPlatformClient {
    inner: AccessPlatformClient<Channel>,
}

impl GrpcPlatformClient {
    /// Build a TLS channel to `proxy` authenticated with the identity-file
    /// bundle at `identity_file`, and wrap it in the generated client.
    /// Connection failure here is fatal at startup (§7 kind 2).
    pub async fn connect(proxy: &str, identity_file: &Path) -> Result<Self, PlatformError> {
        let loaded = identity::load(identity_file)?;

        let mut tls = ClientTlsConfig::new().identity(loaded.identity);
        if let Some(ca) = loaded.ca_cert {
            tls = tls.ca_certificate(ca);
        }

        let endpoint = Endpoint::from_shared(format!("https://{proxy}"))
            .map_err(|e| PlatformError::Connect { source: Box::new(e) })?
            .tls_config(tls)
            .map_err(|e| PlatformError::Connect { source: Box::new(e) })?
            .timeout(Duration::from_secs(10));

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| PlatformError::Connect { source: Box::new(e) })?;

        Ok(Self { inner: AccessPlatformClient::new(channel) })
    }
}

fn call_error(op: &'static str, status: tonic::Status) -> PlatformError {
    PlatformError::Call {
        op,
        message: status.message().to_string(),
        source: Some(Box::new(status)),
    }
}

#[async_trait]
impl PlatformClient for GrpcPlatformClient {
    #[instrument(skip_all)]
    async fn ping(&self) -> Result<(), PlatformError> {
        let mut client = self.inner.clone();
        client.ping(PingRequest {}).await.map_err(|e| call_error("Ping", e))?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn list_access_requests(&self) -> Result<Vec<AccessRequest>, PlatformError> {
        let mut client = self.inner.clone();
        let resp = client
            .list_access_requests(ListAccessRequestsRequest {})
            .await
            .map_err(|e| call_error("ListAccessRequests", e))?;
        Ok(resp.into_inner().requests.into_iter().map(request_from_proto).collect())
    }

    #[instrument(skip(self, reason))]
    async fn set_state(
        &self,
        request_id: &str,
        new_state: SettableState,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let mut client = self.inner.clone();
        let new_state = match new_state {
            SettableState::Approved => "APPROVED",
            SettableState::Denied => "DENIED",
        };
        client
            .set_access_request_state(SetAccessRequestStateRequest {
                request_id: request_id.to_string(),
                new_state: new_state.to_string(),
                reason: reason.to_string(),
            })
            .await
            .map_err(|e| call_error("SetAccessRequestState", e))?;
        Ok(())
    }

    #[instrument(skip(self, lock), fields(lock_name = %lock.name))]
    async fn upsert_lock(&self, lock: &Lock) -> Result<(), PlatformError> {
        let mut client = self.inner.clone();
        client
            .upsert_lock(UpsertLockRequest {
                name: lock.name.clone(),
                target_request_id: lock.target_request_id.clone(),
                message: lock.message.clone(),
                expires_at_ms: lock.expires_at_ms,
            })
            .await
            .map_err(|e| call_error("UpsertLock", e))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PlatformError> {
        // tonic's `Channel` has no explicit close handle; dropping the last
        // clone tears down the connection. Nothing to do here beyond giving
        // callers a symmetric shutdown hook.
        Ok(())
    }
}
