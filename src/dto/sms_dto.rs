use serde::Deserialize;

/// Inbound message webhook payload as posted by the SMS carrier
/// (form-encoded, Twilio field names). Other carrier fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundSms {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}
