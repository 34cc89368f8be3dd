//! Reply classification: turns raw node replies into results or typed errors.
//!
//! Graphene nodes wrap assertion failures in a multi-line report such as
//!
//! ```text
//! 10 assert_exception: Assert Exception
//! now > auth.last_post + STEEMIT_MIN_ROOT_COMMENT_INTERVAL: You may only post once every 5 minutes.
//! ...
//! ```
//!
//! [`decode_message`] extracts the human-readable line and
//! [`classify_message`] maps it to an [`ApiError`].

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{ApiError, RpcError};

const ASSERT_PATTERN: &str =
    r"(10 assert_exception: Assert Exception\n|3030000 tx_missing_posting_auth).*: (.*)\n";

fn assert_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ASSERT_PATTERN).expect("assert pattern compiles"))
}

/// Extract the meaningful part of a node error message.
pub fn decode_message(raw: &str) -> String {
    match assert_regex().captures(raw).and_then(|c| c.get(2)) {
        Some(m) => m.as_str().trim().to_owned(),
        None => raw.trim().to_owned(),
    }
}

/// Map a decoded message to a known application error.
pub fn classify_message(message: &str) -> Option<ApiError> {
    let owned = || message.to_owned();
    let kind = match message {
        "Account already transacted this block." => ApiError::AlreadyTransactedThisBlock(owned()),
        "missing required posting authority" => ApiError::MissingRequiredPostingAuthority(owned()),
        "Voting weight is too small, please accumulate more voting power or steem power." => {
            ApiError::VoteWeightTooSmall(owned())
        }
        "Can only vote once every 3 seconds." => ApiError::OnlyVoteOnceEvery3Seconds(owned()),
        "You have already voted in a similar way." => ApiError::AlreadyVotedSimilarly(owned()),
        "You may only post once every 5 minutes." => ApiError::PostOnlyEvery5Min(owned()),
        "Duplicate transaction check failed" => ApiError::DuplicateTransaction(owned()),
        "Account exceeded maximum allowed bandwidth per vesting share." => {
            ApiError::ExceededAllowedBandwidth(owned())
        }
        m if m.starts_with("no method with name") => ApiError::NoMethodWithName(owned()),
        _ => return None,
    };
    Some(kind)
}

/// Classify the `error` member of a reply.
pub fn classify_error(error: &Value) -> RpcError {
    let text = match error {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj
            .get("detail")
            .and_then(Value::as_str)
            .or_else(|| obj.get("message").and_then(Value::as_str))
            .unwrap_or(""),
        _ => "",
    };
    let message = decode_message(text);
    if message.is_empty() {
        return RpcError::Rpc(error.clone());
    }
    match classify_message(&message) {
        Some(kind) => RpcError::Api(kind),
        None => RpcError::UnhandledRpcError(message),
    }
}

/// Parse a raw reply and return its `result`, or the classified error.
pub fn classify_reply(reply: &str) -> Result<Value, RpcError> {
    let value: Value =
        serde_json::from_str(reply).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(RpcError::InvalidResponse(format!("expected a JSON object, got `{other}`")))
        }
    };
    if let Some(error) = obj.get("error").filter(|e| !e.is_null()) {
        return Err(classify_error(error));
    }
    obj.remove("result")
        .ok_or_else(|| RpcError::InvalidResponse("reply has neither `result` nor `error`".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_reply(error: Value) -> String {
        json!({ "jsonrpc": "2.0", "id": 1, "error": error }).to_string()
    }

    #[test]
    fn result_passes_through() {
        let out = classify_reply(r#"{"id":1,"result":{"head_block_number":42}}"#).unwrap();
        assert_eq!(out["head_block_number"], 42);
        assert_eq!(classify_reply(r#"{"id":1,"result":null}"#).unwrap(), Value::Null);
    }

    #[test]
    fn non_json_is_invalid_response() {
        let err = classify_reply("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
        assert!(err.to_string().contains("Expected JSON"));
    }

    #[test]
    fn non_object_is_invalid_response() {
        assert!(matches!(classify_reply("[1,2]"), Err(RpcError::InvalidResponse(_))));
        assert!(matches!(classify_reply(r#"{"id":1}"#), Err(RpcError::InvalidResponse(_))));
    }

    #[test]
    fn missing_posting_authority() {
        let err = classify_reply(&error_reply(json!({
            "code": 1,
            "message": "missing required posting authority"
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            RpcError::Api(ApiError::MissingRequiredPostingAuthority(_))
        ));
    }

    #[test]
    fn detail_preferred_over_message() {
        let err = classify_reply(&error_reply(json!({
            "message": "something generic",
            "detail": "Duplicate transaction check failed"
        })))
        .unwrap_err();
        assert!(matches!(err, RpcError::Api(ApiError::DuplicateTransaction(_))));
    }

    #[test]
    fn assert_exception_is_decoded() {
        let raw = "10 assert_exception: Assert Exception\n\
                   now > auth.last_post + STEEMIT_MIN_ROOT_COMMENT_INTERVAL: You may only post once every 5 minutes.\n\
                   {}\n    th_a  steem_evaluator.cpp:1646 do_apply";
        assert_eq!(decode_message(raw), "You may only post once every 5 minutes.");
        let err = classify_reply(&error_reply(json!({ "message": raw }))).unwrap_err();
        assert!(matches!(err, RpcError::Api(ApiError::PostOnlyEvery5Min(_))));
    }

    #[test]
    fn posting_auth_exception_is_decoded() {
        let raw = "3030000 tx_missing_posting_auth: missing required posting authority\n\
                   Missing Posting Authority alice: missing required posting authority\n";
        assert_eq!(decode_message(raw), "missing required posting authority");
    }

    #[test]
    fn no_method_prefix() {
        let kind = classify_message("no method with name 'get_foo'").unwrap();
        assert_eq!(kind, ApiError::NoMethodWithName("no method with name 'get_foo'".into()));
    }

    #[test]
    fn unknown_message_is_unhandled() {
        let err = classify_reply(&error_reply(json!({ "message": "  out of cheese  " }))).unwrap_err();
        match err {
            RpcError::UnhandledRpcError(msg) => assert_eq!(msg, "out of cheese"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_message_keeps_raw_error() {
        let raw = json!({ "code": -32000, "data": { "stack": [] } });
        match classify_reply(&error_reply(raw.clone())).unwrap_err() {
            RpcError::Rpc(value) => assert_eq!(value, raw),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn string_error_is_classified() {
        let err = classify_error(&json!("Can only vote once every 3 seconds."));
        assert!(matches!(err, RpcError::Api(ApiError::OnlyVoteOnceEvery3Seconds(_))));
    }

    #[test]
    fn every_table_entry_maps() {
        let cases = [
            "Account already transacted this block.",
            "missing required posting authority",
            "Voting weight is too small, please accumulate more voting power or steem power.",
            "Can only vote once every 3 seconds.",
            "You have already voted in a similar way.",
            "You may only post once every 5 minutes.",
            "Duplicate transaction check failed",
            "Account exceeded maximum allowed bandwidth per vesting share.",
        ];
        for msg in cases {
            let kind = classify_message(msg).unwrap_or_else(|| panic!("{msg} not classified"));
            assert_eq!(kind.message(), msg);
        }
        assert!(classify_message("Duplicate transaction").is_none());
    }
}
