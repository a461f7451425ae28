use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One scheduled meeting row, exactly as sourced from the sheet.
///
/// Every field is optional: ragged rows leave trailing columns absent and
/// unknown headers are dropped by the row mapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// `DD/MM/YYYY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

/// Appointments partitioned by salesperson.
///
/// Owners keep the order in which they were first seen, and so do the
/// appointments inside each group. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedAppointments {
    groups: Vec<(String, Vec<Appointment>)>,
}

impl GroupedAppointments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the owner's group, creating it on first encounter.
    pub fn push(&mut self, owner: &str, appointment: Appointment) {
        match self.groups.iter_mut().find(|(name, _)| name == owner) {
            Some((_, appointments)) => appointments.push(appointment),
            None => self.groups.push((owner.to_string(), vec![appointment])),
        }
    }

    pub fn get(&self, owner: &str) -> Option<&[Appointment]> {
        self.groups
            .iter()
            .find(|(name, _)| name == owner)
            .map(|(_, appointments)| appointments.as_slice())
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Appointment])> {
        self.groups
            .iter()
            .map(|(name, appointments)| (name.as_str(), appointments.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of appointments across all groups.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, a)| a.len()).sum()
    }
}

impl Serialize for GroupedAppointments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (owner, appointments) in &self.groups {
            map.serialize_entry(owner, appointments)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
        }
    }
}

/// Body of the sheet read endpoint. `data[0]` is the header row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetResponse {
    #[serde(default)]
    pub data: Option<Vec<Vec<String>>>,
}

/// Google Sheets `values.get` response. Empty sheets omit `values`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Vec<String>>>,
}

/// Inbound chat relay request.
///
/// `message` is kept as raw JSON so non-string values can be relayed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub message: Option<Value>,
}

impl RelayRequest {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: Some(Value::String(message.into())),
        }
    }

    /// Message as webhook text. Falsy JSON (`null`, `false`, `0`, `""`)
    /// counts as no message; other non-string values are serialized.
    pub fn message_text(&self) -> Option<String> {
        match self.message.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Successful chat relay response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub message: String,
    /// Parsed JSON body of the external webhook.
    #[serde(default)]
    pub n8n_response: Value,
}

impl RelayResponse {
    /// Display text of the webhook reply, when it carries a string `output`.
    pub fn output(&self) -> Option<&str> {
        self.n8n_response.get("output").and_then(|v| v.as_str())
    }
}

/// Outbound payload for the external webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRequest<'a> {
    pub text: &'a str,
}
