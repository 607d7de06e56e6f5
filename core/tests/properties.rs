//! Property-based tests for the interpreter, message catalog and redirect policy.

use std::collections::BTreeSet;

use httpkit_core::interpret::{interpret_ignoring_body, interpret_json};
use httpkit_core::{
    convert_to_sentence, CertificateDer, ExchangeOutcome, HttpApiError, OperationLabels,
    PinningConfig, RedirectMode, RedirectPolicy, TransportError, TrustDecision, TrustValidator,
    UsernameKind,
};
use proptest::prelude::*;
use url::Url;

fn labels() -> OperationLabels {
    OperationLabels::new("Gmail", "retrieve the account profile")
}

fn arb_content_type() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("application/json".to_string())),
        Just(Some("text/json".to_string())),
        Just(Some("application/json; charset=utf-8".to_string())),
        Just(Some("text/html".to_string())),
        "[a-z]{1,8}/[a-z]{1,8}".prop_map(Some),
    ]
}

fn arb_body() -> impl Strategy<Value = Option<Vec<u8>>> {
    prop_oneof![
        Just(None),
        Just(Some(br#"{"error": "bad things"}"#.to_vec())),
        Just(Some(b"[1, 2, 3]".to_vec())),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Some),
    ]
}

fn arb_url() -> impl Strategy<Value = Option<Url>> {
    prop::option::of(
        (
            prop::sample::select(vec!["http", "https", "HTTPS", "Https", "ftp"]),
            "[a-z]{1,10}",
        )
            .prop_map(|(scheme, host)| {
                Url::parse(&format!("{scheme}://{host}.test/path")).unwrap()
            }),
    )
}

fn arb_error() -> impl Strategy<Value = HttpApiError> {
    let labels = labels();
    prop_oneof![
        "[a-z ]{0,20}".prop_map({
            let labels = labels.clone();
            move |cause| HttpApiError::connection(&labels, cause)
        }),
        (100u16..1000).prop_map({
            let labels = labels.clone();
            move |status| HttpApiError::status_code(&labels, status)
        }),
        Just(HttpApiError::interpret_response(&labels)),
        prop::option::of("[a-z ]{0,20}").prop_map({
            let labels = labels.clone();
            move |message| HttpApiError::error_message_from_server(&labels, message.as_deref())
        }),
        Just(HttpApiError::unexpected_transport_response(&labels)),
        Just(HttpApiError::credential_retrieval_failed(&labels)),
        Just(HttpApiError::incorrect_password(&labels, UsernameKind::EmailAddress)),
        arb_content_type()
            .prop_map(move |content_type| HttpApiError::response_not_json(&labels, content_type)),
    ]
}

proptest! {
    #[test]
    fn short_message_depends_only_on_operation(error in arb_error()) {
        prop_assert_eq!(error.short_message(), "Unable to retrieve the account profile");
        prop_assert_eq!(
            error.combined_message(),
            format!("{}. {}", error.short_message(), error.detailed_message())
        );
    }

    #[test]
    fn transport_error_wins(
        status in prop::option::of(100u16..600),
        content_type in arb_content_type(),
        body in arb_body(),
        cause in "[a-z ]{1,20}",
    ) {
        let outcome = ExchangeOutcome {
            status,
            content_type,
            body,
            transport_error: Some(TransportError::new(cause.clone())),
        };
        let err = interpret_json(&outcome, &labels(), &[200], |_| Some(()), |_| {
            Some("ignored".to_string())
        })
        .unwrap_err();
        prop_assert_eq!(err, HttpApiError::connection(&labels(), cause.clone()));

        let err = interpret_ignoring_body(&outcome, &labels(), |_| None).unwrap_err();
        let is_connection = matches!(err, HttpApiError::Connection { .. });
        prop_assert!(is_connection, "expected a connection error, got {:?}", err);
    }

    #[test]
    fn accepted_status_requires_literal_json_content_type(
        content_type in arb_content_type(),
        body in arb_body(),
    ) {
        let json = matches!(content_type.as_deref(), Some("application/json") | Some("text/json"));
        let outcome = ExchangeOutcome {
            status: Some(200),
            content_type: content_type.clone(),
            body,
            transport_error: None,
        };
        let result = interpret_json(&outcome, &labels(), &[200], |_| Some(()), |_| None);
        if json {
            let not_json = matches!(result, Err(HttpApiError::ResponseNotJson { .. }));
            prop_assert!(!not_json, "literal JSON content type was rejected: {:?}", result);
        } else {
            prop_assert_eq!(result, Err(HttpApiError::response_not_json(&labels(), content_type)));
        }
    }

    #[test]
    fn ignoring_body_accepts_success_statuses(
        status in prop::sample::select(vec![200u16, 201, 202, 204]),
        content_type in arb_content_type(),
        body in arb_body(),
    ) {
        let outcome = ExchangeOutcome {
            status: Some(status),
            content_type,
            body,
            transport_error: None,
        };
        prop_assert_eq!(interpret_ignoring_body(&outcome, &labels(), |_| None), Ok(()));
    }

    #[test]
    fn server_message_only_for_error_statuses(
        status in 100u16..600,
        message in "[a-z][a-z ]{0,20}",
    ) {
        prop_assume!(status != 200);
        let body = serde_json::to_vec(&serde_json::json!({ "error": message })).unwrap();
        let outcome = ExchangeOutcome::response(status, Some("application/json"), Some(body));
        let err = interpret_json(&outcome, &labels(), &[200], |_| Some(()), |value| {
            value["error"].as_str().map(str::to_owned)
        })
        .unwrap_err();
        if status > 399 {
            let expected =
                HttpApiError::error_message_from_server(&labels(), Some(message.as_str()));
            prop_assert_eq!(err, expected);
        } else {
            prop_assert_eq!(err, HttpApiError::status_code(&labels(), status));
        }
    }

    #[test]
    fn status_messages_always_name_the_api(status in 0u16..1000) {
        let err = HttpApiError::status_code(&labels(), status);
        prop_assert!(err.detailed_message().starts_with("Gmail "));
        prop_assert!(err.detailed_message().ends_with('.'));
    }

    #[test]
    fn sentence_conversion_is_idempotent(message in "[a-z][a-z ]{0,30}[.?!]?") {
        let once = convert_to_sentence(Some(message.as_str())).unwrap();
        prop_assert!(once.ends_with(['.', '?', '!']));
        prop_assert!(once.starts_with(|c: char| c.is_uppercase()));
        prop_assert_eq!(convert_to_sentence(Some(once.as_str())), Some(once.clone()));
    }

    #[test]
    fn bare_domains_and_addresses_are_left_alone(
        local in "[a-z]{1,8}",
        host in "[a-z][a-z0-9]{0,10}",
        tld in prop::sample::select(vec!["com", "org", "net", "io", "test"]),
        rest in "( [a-z]{1,8}){0,3}",
    ) {
        let domain = format!("{host}.{tld}");
        prop_assert_eq!(convert_to_sentence(Some(domain.as_str())), Some(domain.clone()));

        let address = format!("{local}@{domain}");
        prop_assert_eq!(convert_to_sentence(Some(address.as_str())), Some(address.clone()));

        let message = format!("{domain}{rest}");
        let expected = if rest.is_empty() { domain.clone() } else { format!("{message}.") };
        prop_assert_eq!(convert_to_sentence(Some(message.as_str())), Some(expected));
    }

    #[test]
    fn redirect_modes(source in arb_url(), destination in arb_url()) {
        let destination_https = destination.as_ref().is_some_and(|url| url.scheme() == "https");
        let source_plain = source.as_ref().is_some_and(|url| url.scheme() != "https");

        let follow = |mode| {
            RedirectPolicy::new(mode).should_follow(source.as_ref(), destination.as_ref())
        };
        prop_assert!(follow(RedirectMode::Always));
        prop_assert!(!follow(RedirectMode::Never));
        prop_assert_eq!(follow(RedirectMode::HttpsOnly), destination_https);
        prop_assert_eq!(
            follow(RedirectMode::HttpsOnlyWhenSourceIsHttps),
            destination_https || source_plain
        );
    }

    #[test]
    fn garbage_leaf_never_matches_a_pin(leaf in prop::collection::vec(any::<u8>(), 0..256)) {
        let validator = TrustValidator::new(PinningConfig::PublicKeyHashes(BTreeSet::from([
            "prM8cRdVj7VSuTFet7Wbt3hC/QGo87OZMfYBjF8daqg=".to_string(),
        ])));
        let chain = [CertificateDer::from(leaf)];
        prop_assert_eq!(validator.evaluate(&chain, true), TrustDecision::Reject);
    }
}
