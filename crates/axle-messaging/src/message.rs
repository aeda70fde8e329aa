//! Signed agent-to-agent messages

use std::fmt;
use std::str::FromStr;

use axle_crypto::{address_from_did, to_did, KeyPair, Signature};
use axle_types::now_unix_millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::canonical::to_canonical_bytes;
use crate::{MessagingError, Result};

/// Kind of an agent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Look for agents offering a capability
    Discover,
    /// Propose to perform a task
    Offer,
    Accept,
    Reject,
    /// Hand over a task result
    Deliver,
    /// Report on a delivered result
    Verify,
    /// Announce payment settlement
    Settle,
    Ping,
    Pong,
}

impl MessageType {
    pub const ALL: [MessageType; 9] = [
        MessageType::Discover,
        MessageType::Offer,
        MessageType::Accept,
        MessageType::Reject,
        MessageType::Deliver,
        MessageType::Verify,
        MessageType::Settle,
        MessageType::Ping,
        MessageType::Pong,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discover => "DISCOVER",
            Self::Offer => "OFFER",
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::Deliver => "DELIVER",
            Self::Verify => "VERIFY",
            Self::Settle => "SETTLE",
            Self::Ping => "PING",
            Self::Pong => "PONG",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MessagingError::UnknownType(s.to_string()))
    }
}

/// A message with its sender's signature
///
/// `sender` and `recipient` are `did:sol:` identifiers, `timestamp` is unix
/// milliseconds and `signature` is base58.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub timestamp: i64,
    pub payload: Value,
    pub signature: String,
}

/// Every field except the signature
#[derive(Serialize)]
struct SignableMessage<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    message_type: MessageType,
    sender: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient: Option<&'a str>,
    timestamp: i64,
    payload: &'a Value,
}

impl SignedMessage {
    /// Canonical bytes covered by the signature
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        let signable = SignableMessage {
            id: &self.id,
            message_type: self.message_type,
            sender: &self.sender,
            recipient: self.recipient.as_deref(),
            timestamp: self.timestamp,
            payload: &self.payload,
        };
        to_canonical_bytes(&signable)
    }

    /// Check the signature against the sender's key
    pub fn verify(&self) -> Result<()> {
        let signer = address_from_did(&self.sender).map_err(|e| MessagingError::InvalidSender {
            sender: self.sender.clone(),
            reason: e.to_string(),
        })?;
        let signature = Signature::from_base58(&self.signature)
            .map_err(|e| MessagingError::InvalidSignature(e.to_string()))?;
        let bytes = self.signing_bytes()?;

        if signature.verify(&signer, &bytes) {
            Ok(())
        } else {
            Err(MessagingError::SignatureMismatch)
        }
    }

    /// JSON wire form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| MessagingError::Json {
            message: e.to_string(),
        })
    }

    /// Parse the JSON wire form without verifying it
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MessagingError::Json {
            message: e.to_string(),
        })
    }
}

/// Build and sign a message from `keypair`
///
/// A bare base58 recipient key is stored as its `did:sol:` identifier; an
/// empty recipient is dropped.
pub fn create_message(
    keypair: &KeyPair,
    message_type: MessageType,
    recipient: Option<String>,
    payload: Value,
) -> Result<SignedMessage> {
    let mut message = SignedMessage {
        id: Uuid::new_v4().to_string(),
        message_type,
        sender: keypair.did(),
        recipient: recipient.filter(|r| !r.is_empty()).map(|r| to_did(&r)),
        timestamp: now_unix_millis(),
        payload,
        signature: String::new(),
    };
    let bytes = message.signing_bytes()?;
    message.signature = keypair.sign(&bytes).to_base58();

    tracing::debug!(id = %message.id, kind = %message.message_type, sender = %message.sender, "message signed");
    Ok(message)
}

/// Whether a message carries a valid signature from its sender
///
/// Never fails: anything malformed is simply not valid.
pub fn verify_message(message: &SignedMessage) -> bool {
    match message.verify() {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(id = %message.id, error = %e, "message rejected");
            false
        }
    }
}

/// Outcome of checking a message received as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub message_id: String,
    pub message_type: String,
    pub sender: String,
    pub errors: Vec<String>,
}

/// Parse and verify a message from JSON
pub fn verify_message_json(json: &str) -> VerificationResult {
    match SignedMessage::from_json(json) {
        Ok(message) => {
            let mut errors = vec![];
            if let Err(e) = message.verify() {
                errors.push(e.to_string());
            }
            VerificationResult {
                valid: errors.is_empty(),
                message_id: message.id,
                message_type: message.message_type.to_string(),
                sender: message.sender,
                errors,
            }
        }
        Err(e) => VerificationResult {
            valid: false,
            message_id: "unknown".to_string(),
            message_type: "unknown".to_string(),
            sender: "unknown".to_string(),
            errors: vec![format!("Failed to parse message: {}", e)],
        },
    }
}
