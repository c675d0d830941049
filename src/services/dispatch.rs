//! Maps inbound [`RelayRequest`]s onto [`RelayService`] calls.
//!
//! Every outcome, including errors, becomes a [`RelayResponse`]; nothing here
//! aborts the caller.

use crate::error::RelayError;
use crate::models::{ClientContext, RelayRequest, RelayResponse, ResponseStatus};
use crate::services::relay::RelayService;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Handle one request on behalf of `client`.
///
/// Protected requests from a session that has not authenticated are answered
/// with `unauthorized` and never reach the service. A granted `auth` request is
/// answered with `authenticated: true`; the caller owns the session flag.
pub fn handle_request(
    service: &RelayService,
    client: &ClientContext,
    request: RelayRequest,
) -> RelayResponse {
    if !request.is_public() && !service.is_authorized(client.authenticated) {
        tracing::warn!("Rejected unauthenticated request from {}", client.identity);
        return RelayResponse::from(&RelayError::Unauthorized);
    }

    match request {
        RelayRequest::Auth { password } => authenticate(service, client, &password),
        RelayRequest::Health => {
            let (healthy, authorized) = service.health(client.authenticated);
            let status = if healthy {
                ResponseStatus::Ok
            } else {
                ResponseStatus::Failed
            };
            let mut response = RelayResponse::with_status(status);
            response.authenticated = Some(authorized);
            response
        }
        RelayRequest::GetOptions => {
            let (commands, phrases) = service.quick_options();
            let mut response = RelayResponse::success();
            response.commands = Some(commands);
            response.phrases = Some(phrases);
            response
        }
        RelayRequest::SaveOptions { commands, phrases } => {
            respond(service.save_quick_options(&commands, &phrases))
        }
        RelayRequest::ReloadOptions => respond(service.reload_quick_options()),
        RelayRequest::Send { text } => respond(service.send_text(&text)),
        RelayRequest::SendEnter => respond(service.send_enter()),
        RelayRequest::SendHotkey { hotkey } => respond(service.send_hotkey(&hotkey)),
        RelayRequest::QuickOption { option } => respond(service.run_quick_option(&option)),
        RelayRequest::MoveCursor { direction } => respond(service.move_cursor(&direction)),
        RelayRequest::DeletePc => respond(service.delete_pc()),
        RelayRequest::MouseMove { dx, dy } => respond(service.move_mouse(dx, dy)),
        RelayRequest::MouseClick { button, clicks } => respond(service.click(&button, clicks)),
        RelayRequest::Screenshot => match service.screenshot() {
            Ok(bytes) => {
                let mut response = RelayResponse::success();
                response.image = Some(STANDARD.encode(bytes));
                response
            }
            Err(e) => fail(&e),
        },
        RelayRequest::Undo => match service.undo() {
            Ok(content) => {
                let mut response = RelayResponse::success();
                response.content = Some(content);
                response
            }
            Err(e) => fail(&e),
        },
    }
}

fn authenticate(service: &RelayService, client: &ClientContext, password: &str) -> RelayResponse {
    if !service.auth_enabled() {
        let mut response = RelayResponse::success().with_msg("Authentication disabled");
        response.authenticated = Some(true);
        return response;
    }

    match service.authenticate(&client.identity, password) {
        Ok(()) => {
            let mut response = RelayResponse::success();
            response.authenticated = Some(true);
            response
        }
        Err(e) => {
            let mut response = fail(&e);
            response.authenticated = Some(false);
            response
        }
    }
}

fn respond(result: Result<(), RelayError>) -> RelayResponse {
    match result {
        Ok(()) => RelayResponse::success(),
        Err(e) => fail(&e),
    }
}

fn fail(error: &RelayError) -> RelayResponse {
    tracing::debug!("Request failed ({}): {}", error.kind(), error);
    RelayResponse::from(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::AuthGuard;
    use crate::services::injector::DryRunInjector;
    use crate::services::quick_options::QuickOptionsStore;
    use crate::services::rules::RuleStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn protected_service() -> RelayService {
        RelayService::new(
            RuleStore::empty(),
            QuickOptionsStore::new("commands.txt", "phrases.txt"),
            AuthGuard::new(Some("letmein".into()), 5, Duration::from_secs(300)),
            Arc::new(DryRunInjector::with_screenshot(vec![1, 2, 3])),
        )
    }

    #[test]
    fn test_protected_request_requires_session() {
        let service = protected_service();
        let anonymous = ClientContext::new("10.0.0.2", false);

        let response = handle_request(&service, &anonymous, RelayRequest::Undo);
        assert_eq!(response.status, ResponseStatus::Unauthorized);
    }

    #[test]
    fn test_health_is_public() {
        let service = protected_service();
        let anonymous = ClientContext::new("10.0.0.2", false);

        let response = handle_request(&service, &anonymous, RelayRequest::Health);
        assert_eq!(response.status, ResponseStatus::Ok);
        assert_eq!(response.authenticated, Some(false));
    }

    #[test]
    fn test_auth_sets_flag() {
        let service = protected_service();
        let anonymous = ClientContext::new("10.0.0.2", false);

        let wrong = handle_request(
            &service,
            &anonymous,
            RelayRequest::Auth {
                password: "nope".into(),
            },
        );
        assert_eq!(wrong.status, ResponseStatus::Failed);
        assert_eq!(wrong.authenticated, Some(false));

        let right = handle_request(
            &service,
            &anonymous,
            RelayRequest::Auth {
                password: "letmein".into(),
            },
        );
        assert!(right.is_success());
        assert_eq!(right.authenticated, Some(true));
    }

    #[test]
    fn test_screenshot_is_base64() {
        let service = protected_service();
        let session = ClientContext::new("10.0.0.2", true);

        let response = handle_request(&service, &session, RelayRequest::Screenshot);
        assert_eq!(response.image.as_deref(), Some("AQID"));
    }

    #[test]
    fn test_undo_reports_content_and_no_history() {
        let service = protected_service();
        let session = ClientContext::new("10.0.0.2", true);

        handle_request(
            &service,
            &session,
            RelayRequest::Send {
                text: "hello".into(),
            },
        );
        let undone = handle_request(&service, &session, RelayRequest::Undo);
        assert_eq!(undone.content.as_deref(), Some("hello"));

        let empty = handle_request(&service, &session, RelayRequest::Undo);
        assert_eq!(empty.status, ResponseStatus::Failed);
        assert!(empty.content.is_none());
    }

    #[test]
    fn test_failed_operation_is_answered_not_raised() {
        let service = protected_service();
        let session = ClientContext::new("10.0.0.2", true);

        let response = handle_request(
            &service,
            &session,
            RelayRequest::MouseClick {
                button: "left".into(),
                clicks: 0,
            },
        );
        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(response.msg.is_some());
    }
}
