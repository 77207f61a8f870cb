use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};

use crate::{dto::sms_dto::InboundSms, services::reply_service::ReplyOutcome, AppState};

pub const EMPTY_TWIML: &str = "<Response></Response>";

/// Carrier webhook for replies. Every path answers 200 with an empty
/// TwiML document; resolution problems are only logged.
pub async fn handle_inbound(
    State(state): State<AppState>,
    payload: Result<Form<InboundSms>, FormRejection>,
) -> Response {
    let sms = match payload {
        Ok(Form(sms)) => sms,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "unreadable inbound sms payload");
            return acknowledge();
        }
    };

    match state.reply_service.resolve(&sms.from, &sms.body).await {
        Ok(ReplyOutcome::Ignored { reason }) => {
            tracing::debug!(?reason, "inbound sms ignored");
        }
        Ok(outcome) => {
            tracing::debug!(?outcome, "inbound sms resolved");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to resolve inbound sms");
        }
    }

    acknowledge()
}

fn acknowledge() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_TWIML,
    )
        .into_response()
}
