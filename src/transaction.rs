use {
    chrono::{DateTime, TimeZone, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::fmt,
};

/// Category of a confirmed block, determining its visual treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    Send,
    Receive,
    Change,
    Epoch,
}

impl Subtype {
    /// Only value transfers carry an amount
    pub fn carries_amount(self) -> bool {
        matches!(self, Subtype::Send | Subtype::Receive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::Send => "send",
            Subtype::Receive => "receive",
            Subtype::Change => "change",
            Subtype::Epoch => "epoch",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "send" => Some(Subtype::Send),
            // An open block is the receive that creates the account chain
            "receive" | "open" => Some(Subtype::Receive),
            "change" => Some(Subtype::Change),
            "epoch" => Some(Subtype::Epoch),
            _ => None,
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A confirmed ledger event, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub account: String,
    /// Raw amount in the smallest ledger unit; `None` unless `subtype` is send/receive
    pub amount: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub subtype: Subtype,
}

/// Reason a payload could not become a [`Transaction`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEvent {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("unexpected topic: {0}")]
    UnexpectedTopic(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unknown subtype: {0}")]
    UnknownSubtype(String),
    #[error("amount is not a digit string: {0}")]
    InvalidAmount(String),
    #[error("invalid confirmation time: {0}")]
    InvalidTime(String),
}

/// Websocket envelope: `{"topic": "confirmation", "time": "...", "message": {...}}`
#[derive(Debug, Deserialize)]
struct Envelope {
    topic: Option<String>,
    time: Option<Value>,
    message: Option<ConfirmationMessage>,
}

#[derive(Debug, Deserialize)]
struct ConfirmationMessage {
    account: Option<String>,
    amount: Option<String>,
    hash: Option<String>,
    block: Option<BlockBody>,
}

#[derive(Debug, Deserialize)]
struct BlockBody {
    subtype: Option<String>,
}

const CONFIRMATION_TOPIC: &str = "confirmation";

impl Transaction {
    /// Parse a raw confirmation payload.
    ///
    /// `received_at` stands in for the confirmation time when the envelope
    /// does not carry one.
    pub fn parse(payload: &str, received_at: DateTime<Utc>) -> Result<Self, MalformedEvent> {
        let envelope: Envelope = serde_json::from_str(payload)
            .map_err(|e| MalformedEvent::InvalidJson(e.to_string()))?;

        match envelope.topic.as_deref() {
            Some(CONFIRMATION_TOPIC) => {}
            Some(other) => return Err(MalformedEvent::UnexpectedTopic(other.to_string())),
            None => return Err(MalformedEvent::MissingField("topic")),
        }

        let message = envelope.message.ok_or(MalformedEvent::MissingField("message"))?;

        let hash = non_empty(message.hash).ok_or(MalformedEvent::MissingField("hash"))?;
        let account = non_empty(message.account).ok_or(MalformedEvent::MissingField("account"))?;

        let subtype_raw = message
            .block
            .and_then(|b| b.subtype)
            .ok_or(MalformedEvent::MissingField("block.subtype"))?;
        let subtype = Subtype::parse(&subtype_raw)
            .ok_or(MalformedEvent::UnknownSubtype(subtype_raw))?;

        let amount = if subtype.carries_amount() {
            match message.amount {
                Some(raw) if is_digit_string(&raw) => Some(raw),
                Some(raw) => return Err(MalformedEvent::InvalidAmount(raw)),
                None => None,
            }
        } else {
            None
        };

        let timestamp = match envelope.time {
            Some(time) => parse_millis(&time)?,
            None => received_at,
        };

        Ok(Self {
            hash,
            account,
            amount,
            timestamp,
            subtype,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

pub(crate) fn is_digit_string(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

fn parse_millis(value: &Value) -> Result<DateTime<Utc>, MalformedEvent> {
    let millis = match value {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
    .ok_or_else(|| MalformedEvent::InvalidTime(value.to_string()))?;

    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| MalformedEvent::InvalidTime(value.to_string()))
}
