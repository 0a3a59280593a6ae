// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use collabflow_core::Tier;

use crate::error::{GatewayError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The claims a signed handshake token carries (spec §4.6 "extracts
/// `userId`, `tier`, optional `workspaceId`"; SPEC_FULL C6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
	pub user_id: String,
	pub tier: Tier,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workspace_id: Option<String>,
	/// Unix seconds.
	pub exp: i64,
}

/// A token is `base64url(claims_json).base64url(hmac_sha256(claims_json))`,
/// HMAC-SHA256 over a compact claims payload rather than a full JWT
/// (SPEC_FULL C6).
pub fn verify_token(signing_key: &[u8], token: &str) -> Result<TokenClaims> {
	let (payload_b64, signature_b64) =
		token.split_once('.').ok_or_else(|| GatewayError::AuthFailed("malformed token".into()))?;

	let payload = BASE64.decode(payload_b64).map_err(|_| GatewayError::AuthFailed("malformed token payload".into()))?;
	let signature = BASE64.decode(signature_b64).map_err(|_| GatewayError::AuthFailed("malformed token signature".into()))?;

	let mut mac = HmacSha256::new_from_slice(signing_key).map_err(|_| GatewayError::AuthFailed("invalid signing key".into()))?;
	mac.update(&payload);
	let expected = mac.finalize().into_bytes();
	let signatures_match = expected.len() == signature.len() && expected.as_slice().ct_eq(&signature).unwrap_u8() == 1;
	if !signatures_match {
		return Err(GatewayError::AuthFailed("signature mismatch".into()));
	}

	let claims: TokenClaims =
		serde_json::from_slice(&payload).map_err(|_| GatewayError::AuthFailed("malformed token claims".into()))?;

	let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
	if claims.exp <= now {
		return Err(GatewayError::AuthFailed("token expired".into()));
	}

	Ok(claims)
}

/// Issues a signed token. Used by tests and any trusted caller that
/// mints tokens server-side (the browser-facing issuance flow itself is
/// out of scope, per spec §1's SAML/OAuth exclusion).
pub fn issue_token(signing_key: &[u8], claims: &TokenClaims) -> String {
	let payload = serde_json::to_vec(claims).expect("TokenClaims always serializes");
	let mut mac = HmacSha256::new_from_slice(signing_key).expect("HMAC accepts any key length");
	mac.update(&payload);
	let signature = mac.finalize().into_bytes();
	format!("{}.{}", BASE64.encode(&payload), BASE64.encode(signature))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn claims(exp_offset_secs: i64) -> TokenClaims {
		let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
		TokenClaims { user_id: "u1".into(), tier: Tier::Free, workspace_id: None, exp: now + exp_offset_secs }
	}

	#[test]
	fn round_trips_a_valid_token() {
		let key = b"0123456789abcdef0123456789abcdef";
		let token = issue_token(key, &claims(3600));
		let verified = verify_token(key, &token).unwrap();
		assert_eq!(verified.user_id, "u1");
	}

	#[test]
	fn rejects_expired_token() {
		let key = b"0123456789abcdef0123456789abcdef";
		let token = issue_token(key, &claims(-1));
		assert!(verify_token(key, &token).is_err());
	}

	#[test]
	fn rejects_token_signed_with_a_different_key() {
		let token = issue_token(b"0123456789abcdef0123456789abcdef", &claims(3600));
		let err = verify_token(b"fedcba9876543210fedcba9876543210", &token).unwrap_err();
		assert!(matches!(err, GatewayError::AuthFailed(_)));
	}
}
