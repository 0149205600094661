//! Core business logic for the authentication system.
//!
//! `AuthService` runs the wallet login protocol: it hands out challenge
//! nonces, checks signed challenges, registers identities on first login and
//! issues session tokens. It also owns the authenticated role-change and
//! token-reissue operations.

use std::sync::Arc;

use adapters::{Address, Identity, IdentityRegistry, Nonce, NonceStore, Role};
use tracing::{debug, info, warn};

use super::errors::AuthError;
use super::models::{Claims, SessionTokens, TokenKind};
use super::signature::{decode_signature, SignatureVerifier};
use super::tokens::SessionIssuer;

/// Behaviour switches that are product decisions rather than protocol rules.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    /// Apply the `role` a caller passes on login. Lets any wallet pick its
    /// own role at sign-in.
    pub allow_login_role_claim: bool,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            allow_login_role_claim: true,
        }
    }
}

/// Input of a login attempt, already parsed from the request body.
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub address: Address,
    /// Hex-encoded `r || s || v`
    pub signature: String,
    pub role: Option<Role>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: SessionTokens,
    pub identity: Identity,
    pub created: bool,
}

pub struct AuthService {
    nonces: Arc<dyn NonceStore>,
    identities: Arc<dyn IdentityRegistry>,
    verifier: SignatureVerifier,
    issuer: SessionIssuer,
    policy: AuthPolicy,
}

impl AuthService {
    pub fn new(
        nonces: Arc<dyn NonceStore>,
        identities: Arc<dyn IdentityRegistry>,
        issuer: SessionIssuer,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            nonces,
            identities,
            verifier: SignatureVerifier::new(),
            issuer,
            policy,
        }
    }

    /// Issue a challenge for `address`. The address need not be registered.
    pub async fn issue_challenge(&self, address: &Address) -> Result<Nonce, AuthError> {
        let nonce = self.nonces.issue(address).await?;
        debug!(%address, "issued login challenge");
        Ok(nonce)
    }

    /// Verify a signed challenge and open a session.
    ///
    /// The nonce is consumed first, so any failure after that point leaves
    /// the caller needing a new challenge. Identity and tokens are touched
    /// only once the signature is known to come from `address`.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, AuthError> {
        let LoginInput {
            address,
            signature,
            role,
        } = input;

        let nonce = self.nonces.consume(&address).await?.ok_or_else(|| {
            warn!(%address, "login without a live nonce");
            AuthError::NonceExpired
        })?;

        let recovered = decode_signature(&signature)
            .and_then(|bytes| self.verifier.verify(nonce.as_bytes(), &bytes))
            .map_err(|e| {
                warn!(%address, error = %e, "unusable login signature");
                AuthError::from(e)
            })?;

        if recovered != address {
            warn!(%address, %recovered, "signature recovered a different address");
            return Err(AuthError::SignatureMismatch);
        }

        let (mut identity, created) = self.identities.get_or_create(&address).await?;

        if let Some(role) = role {
            if self.policy.allow_login_role_claim {
                identity = self
                    .identities
                    .set_role(&address, role)
                    .await?
                    .ok_or(AuthError::NotFound)?;
            } else {
                debug!(%address, %role, "ignoring role claimed at login");
            }
        }

        let tokens = self.issuer.mint(&identity)?;
        info!(%address, role = %identity.role, created, "wallet login succeeded");

        Ok(LoginOutcome {
            tokens,
            identity,
            created,
        })
    }

    /// Resolve a bearer token to its claims. Only access tokens are accepted.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.issuer.validate_kind(token, TokenKind::Access)?)
    }

    /// Change the role of `target` on behalf of the session in `caller`.
    ///
    /// Callers may change their own role; changing someone else's requires
    /// the caller to currently hold the admin role in the registry.
    pub async fn set_role(
        &self,
        caller: &Claims,
        target: &Address,
        role: Role,
    ) -> Result<Role, AuthError> {
        if caller.sub != *target && !self.is_admin(&caller.sub).await? {
            warn!(caller = %caller.sub, %target, "role change refused");
            return Err(AuthError::Forbidden);
        }

        let identity = self
            .identities
            .set_role(target, role)
            .await?
            .ok_or(AuthError::NotFound)?;

        info!(caller = %caller.sub, %target, role = %identity.role, "role updated");
        Ok(identity.role)
    }

    /// Mint a fresh pair for `address` reflecting its current role. Only the
    /// owner or an admin may do this.
    pub async fn reissue(
        &self,
        caller: &Claims,
        address: &Address,
    ) -> Result<(SessionTokens, Role), AuthError> {
        let identity = self
            .identities
            .get(address)
            .await?
            .ok_or(AuthError::NotFound)?;

        if caller.sub != *address && !self.is_admin(&caller.sub).await? {
            warn!(caller = %caller.sub, %address, "token reissue refused");
            return Err(AuthError::Forbidden);
        }

        let tokens = self.issuer.mint(&identity)?;
        debug!(caller = %caller.sub, %address, "reissued session tokens");
        Ok((tokens, identity.role))
    }

    /// Trade a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(SessionTokens, Role), AuthError> {
        let claims = self.issuer.validate_kind(refresh_token, TokenKind::Refresh)?;
        let identity = self
            .identities
            .get(&claims.sub)
            .await?
            .ok_or(AuthError::NotFound)?;

        let tokens = self.issuer.mint(&identity)?;
        debug!(address = %claims.sub, "refreshed session tokens");
        Ok((tokens, identity.role))
    }

    pub async fn identity(&self, address: &Address) -> Result<Identity, AuthError> {
        self.identities
            .get(address)
            .await?
            .ok_or(AuthError::NotFound)
    }

    async fn is_admin(&self, address: &Address) -> Result<bool, AuthError> {
        Ok(self
            .identities
            .get(address)
            .await?
            .is_some_and(|identity| identity.role == Role::Admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::signature::{address_from_public_key, personal_message_hash};
    use crate::auth::tokens::TokenError;
    use adapters::{MemoryIdentityRegistry, MemoryNonceStore};
    use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

    const SECRET: &[u8] = b"test-secret-that-is-at-least-32-characters-long";

    struct Wallet {
        secret: SecretKey,
        address: Address,
    }

    impl Wallet {
        fn new(seed: u8) -> Self {
            let secp = Secp256k1::new();
            let secret = SecretKey::from_slice(&[seed; 32]).unwrap();
            let address = address_from_public_key(&PublicKey::from_secret_key(&secp, &secret));
            Self { secret, address }
        }

        fn sign(&self, nonce: &Nonce) -> String {
            let secp = Secp256k1::new();
            let digest = Message::from_digest(personal_message_hash(nonce.as_bytes()));
            let (recovery_id, compact) = secp
                .sign_ecdsa_recoverable(&digest, &self.secret)
                .serialize_compact();
            let mut bytes = compact.to_vec();
            bytes.push(recovery_id.to_i32() as u8 + 27);
            format!("0x{}", hex::encode(bytes))
        }
    }

    fn service_with(policy: AuthPolicy) -> (AuthService, Arc<MemoryIdentityRegistry>) {
        let identities = Arc::new(MemoryIdentityRegistry::new());
        let service = AuthService::new(
            Arc::new(MemoryNonceStore::default()),
            identities.clone(),
            SessionIssuer::new(SECRET, 3600, 7200).unwrap(),
            policy,
        );
        (service, identities)
    }

    fn service() -> (AuthService, Arc<MemoryIdentityRegistry>) {
        service_with(AuthPolicy::default())
    }

    async fn login(
        service: &AuthService,
        wallet: &Wallet,
        role: Option<Role>,
    ) -> Result<LoginOutcome, AuthError> {
        let nonce = service.issue_challenge(&wallet.address).await.unwrap();
        service
            .login(LoginInput {
                address: wallet.address,
                signature: wallet.sign(&nonce),
                role,
            })
            .await
    }

    #[tokio::test]
    async fn test_first_login_creates_patient() {
        let (service, _) = service();
        let wallet = Wallet::new(1);

        let outcome = login(&service, &wallet, None).await.unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.identity.role, Role::Patient);

        let claims = service.authenticate(&outcome.tokens.access).unwrap();
        assert_eq!(claims.sub, wallet.address);
        assert_eq!(claims.role, Role::Patient);

        let again = login(&service, &wallet, None).await.unwrap();
        assert!(!again.created);
    }

    #[tokio::test]
    async fn test_login_without_nonce() {
        let (service, identities) = service();
        let wallet = Wallet::new(2);

        let result = service
            .login(LoginInput {
                address: wallet.address,
                signature: format!("0x{}", "00".repeat(65)),
                role: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::NonceExpired)));
        assert!(identities.is_empty());
    }

    #[tokio::test]
    async fn test_superseded_nonce_is_rejected() {
        let (service, _) = service();
        let wallet = Wallet::new(3);

        let first = service.issue_challenge(&wallet.address).await.unwrap();
        let mut second = service.issue_challenge(&wallet.address).await.unwrap();
        while second == first {
            second = service.issue_challenge(&wallet.address).await.unwrap();
        }

        // Signing the stale nonce recovers some other key's address
        let stale = service
            .login(LoginInput {
                address: wallet.address,
                signature: wallet.sign(&first),
                role: None,
            })
            .await;
        assert!(matches!(
            stale,
            Err(AuthError::SignatureMismatch) | Err(AuthError::InvalidSignature(_))
        ));

        // The second nonce was consumed by that attempt
        let retry = service
            .login(LoginInput {
                address: wallet.address,
                signature: wallet.sign(&second),
                role: None,
            })
            .await;
        assert!(matches!(retry, Err(AuthError::NonceExpired)));
    }

    #[tokio::test]
    async fn test_nonce_is_single_use() {
        let (service, _) = service();
        let wallet = Wallet::new(4);

        let nonce = service.issue_challenge(&wallet.address).await.unwrap();
        let signature = wallet.sign(&nonce);

        let input = LoginInput {
            address: wallet.address,
            signature,
            role: None,
        };
        assert!(service.login(input.clone()).await.is_ok());
        assert!(matches!(
            service.login(input).await,
            Err(AuthError::NonceExpired)
        ));
    }

    #[tokio::test]
    async fn test_signature_for_other_address() {
        let (service, identities) = service();
        let wallet = Wallet::new(5);
        let impostor = Wallet::new(6);

        let nonce = service.issue_challenge(&wallet.address).await.unwrap();
        let result = service
            .login(LoginInput {
                address: wallet.address,
                signature: impostor.sign(&nonce),
                role: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
        assert!(identities.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_signature() {
        let (service, _) = service();
        let wallet = Wallet::new(7);

        service.issue_challenge(&wallet.address).await.unwrap();
        let result = service
            .login(LoginInput {
                address: wallet.address,
                signature: "0x010203".to_string(),
                role: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidSignature(_))));
    }

    #[tokio::test]
    async fn test_login_role_claim_overrides() {
        let (service, identities) = service();
        let wallet = Wallet::new(8);

        let outcome = login(&service, &wallet, Some(Role::Admin)).await.unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.identity.role, Role::Admin);
        assert_eq!(
            service.authenticate(&outcome.tokens.access).unwrap().role,
            Role::Admin
        );

        let outcome = login(&service, &wallet, Some(Role::Provider)).await.unwrap();
        assert_eq!(outcome.identity.role, Role::Provider);
        assert_eq!(
            identities.get(&wallet.address).await.unwrap().unwrap().role,
            Role::Provider
        );
    }

    #[tokio::test]
    async fn test_login_role_claim_disabled() {
        let (service, _) = service_with(AuthPolicy {
            allow_login_role_claim: false,
        });
        let wallet = Wallet::new(9);

        let outcome = login(&service, &wallet, Some(Role::Admin)).await.unwrap();
        assert_eq!(outcome.identity.role, Role::Patient);
    }

    #[tokio::test]
    async fn test_self_service_role_change() {
        let (service, _) = service();
        let wallet = Wallet::new(10);
        let outcome = login(&service, &wallet, None).await.unwrap();
        let claims = service.authenticate(&outcome.tokens.access).unwrap();

        let role = service
            .set_role(&claims, &wallet.address, Role::Provider)
            .await
            .unwrap();
        assert_eq!(role, Role::Provider);
    }

    #[tokio::test]
    async fn test_role_change_for_others_needs_admin() {
        let (service, _) = service();
        let patient = Wallet::new(11);
        let admin = Wallet::new(12);
        let target = Wallet::new(13);

        login(&service, &target, None).await.unwrap();
        let patient_claims = service
            .authenticate(&login(&service, &patient, None).await.unwrap().tokens.access)
            .unwrap();
        let admin_claims = service
            .authenticate(
                &login(&service, &admin, Some(Role::Admin))
                    .await
                    .unwrap()
                    .tokens
                    .access,
            )
            .unwrap();

        assert!(matches!(
            service
                .set_role(&patient_claims, &target.address, Role::Admin)
                .await,
            Err(AuthError::Forbidden)
        ));
        assert_eq!(
            service
                .set_role(&admin_claims, &target.address, Role::Provider)
                .await
                .unwrap(),
            Role::Provider
        );
    }

    #[tokio::test]
    async fn test_role_change_unknown_target() {
        let (service, _) = service();
        let admin = Wallet::new(14);
        let claims = service
            .authenticate(
                &login(&service, &admin, Some(Role::Admin))
                    .await
                    .unwrap()
                    .tokens
                    .access,
            )
            .unwrap();

        let result = service
            .set_role(&claims, &Wallet::new(15).address, Role::Patient)
            .await;
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_reissue_reflects_current_role() {
        let (service, identities) = service();
        let wallet = Wallet::new(16);
        let outcome = login(&service, &wallet, None).await.unwrap();
        let claims = service.authenticate(&outcome.tokens.access).unwrap();

        identities
            .set_role(&wallet.address, Role::Provider)
            .await
            .unwrap();

        let (tokens, role) = service.reissue(&claims, &wallet.address).await.unwrap();
        assert_eq!(role, Role::Provider);
        assert_eq!(service.authenticate(&tokens.access).unwrap().role, Role::Provider);
    }

    #[tokio::test]
    async fn test_reissue_unknown_address() {
        let (service, _) = service();
        let wallet = Wallet::new(17);
        let outcome = login(&service, &wallet, None).await.unwrap();
        let claims = service.authenticate(&outcome.tokens.access).unwrap();

        let result = service.reissue(&claims, &Wallet::new(18).address).await;
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_reissue_for_other_wallet() {
        let (service, _) = service();
        let admin = Wallet::new(20);
        let patient = Wallet::new(21);

        let admin_claims = service
            .authenticate(&login(&service, &admin, Some(Role::Admin)).await.unwrap().tokens.access)
            .unwrap();
        let patient_claims = service
            .authenticate(&login(&service, &patient, None).await.unwrap().tokens.access)
            .unwrap();

        assert!(matches!(
            service.reissue(&patient_claims, &admin.address).await,
            Err(AuthError::Forbidden)
        ));

        let (_, role) = service.reissue(&admin_claims, &patient.address).await.unwrap();
        assert_eq!(role, Role::Patient);
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let (service, _) = service();
        let wallet = Wallet::new(19);
        let outcome = login(&service, &wallet, None).await.unwrap();

        let (tokens, role) = service.refresh(&outcome.tokens.refresh).await.unwrap();
        assert_eq!(role, Role::Patient);
        assert!(service.authenticate(&tokens.access).is_ok());

        assert!(matches!(
            service.refresh(&outcome.tokens.access).await,
            Err(AuthError::Unauthorized(TokenError::WrongKind { .. }))
        ));
        assert!(matches!(
            service.authenticate(&outcome.tokens.refresh),
            Err(AuthError::Unauthorized(TokenError::WrongKind { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_logins_share_one_nonce() {
        let (service, _) = service();
        let service = Arc::new(service);
        let wallet = Wallet::new(20);

        let nonce = service.issue_challenge(&wallet.address).await.unwrap();
        let input = LoginInput {
            address: wallet.address,
            signature: wallet.sign(&nonce),
            role: None,
        };

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let input = input.clone();
            handles.push(tokio::spawn(async move { service.login(input).await.is_ok() }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
