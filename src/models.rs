use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// Which of the two chat participants the local client represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Store,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Store => "store",
            Role::Customer => "customer",
        }
    }

    /// The other participant in the two-party chat.
    pub fn counterpart(&self) -> Role {
        match self {
            Role::Store => Role::Customer,
            Role::Customer => Role::Store,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = ClientError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "store" => Ok(Role::Store),
            "customer" => Ok(Role::Customer),
            other => Err(ClientError::UnknownRole(other.to_string())),
        }
    }
}

/// A single chat entry. `text` may contain embedded newlines; the views
/// render those as separate lines but the message stays one logical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: Role, text: impl Into<String>) -> Self {
        Self { sender, text: text.into() }
    }
}

/// One frame on the `/ws/chat` socket (internally tagged on `kind`).
///
/// Chat traffic and the report exchange share a single endpoint and are told
/// apart only by this discriminant. Frames whose `kind` is unknown fail to
/// decode and are dropped before they reach any state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WireMessage {
    #[serde(rename = "message")]
    Message(ChatMessage),

    #[serde(rename = "strategy_request")]
    StrategyRequest {
        #[serde(rename = "customerId", default, skip_serializing_if = "Option::is_none")]
        customer_id: Option<String>,
    },

    #[serde(rename = "strategy_result")]
    StrategyResult(StrategyReport),
}

impl WireMessage {
    /// Wire discriminant for this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Message(_) => "message",
            WireMessage::StrategyRequest { .. } => "strategy_request",
            WireMessage::StrategyResult(_) => "strategy_result",
        }
    }

    /// Decode one inbound text frame. Fails closed: the caller drops the
    /// frame and reports the error instead of letting it reach a state store.
    pub fn decode(text: &str) -> Result<Self, ClientError> {
        serde_json::from_str(text).map_err(ClientError::from)
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(ClientError::from)
    }
}

/// Structured analytics produced once per report view by the single
/// request/response exchange. Every field except the discriminant tolerates
/// absence, matching the lenient rendering of the report view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyReport {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keyword: Vec<String>,
    #[serde(default)]
    pub strategy: Vec<String>,
    #[serde(default)]
    pub recommended_products: Vec<ProductPick>,
    #[serde(default)]
    pub recommended_coupons: Vec<CouponPick>,
    /// Opaque diagnostics passthrough from the server.
    #[serde(default)]
    pub debug: serde_json::Value,
}

/// A recommended catalog item. `category` is emitted by the server but not
/// rendered by the report view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPick {
    pub name: String,
    pub price: u64,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponPick {
    pub title: String,
    #[serde(default)]
    pub valid: String,
    #[serde(default)]
    pub detail: String,
}
