//! Shape enforcement for persisted and partially-updated snapshots.
//!
//! Normalization is total: any JSON value produces a valid
//! [`SessionSnapshot`]. Missing or malformed parts collapse to defaults,
//! with two exceptions that protect the prior state during partial
//! updates: an absent/`null` `environmentId` and an absent/unknown `phase`
//! keep the prior value.

use serde_json::{Map, Value};

use crate::phase::Phase;
use crate::snapshot::{Message, MessagesByPhase, Role, RunOutcome, SessionSnapshot};

impl SessionSnapshot {
    /// Normalizes a raw stored value with no prior state.
    ///
    /// `session_id` wins over any id carried by `raw`; an empty
    /// `session_id` falls back to the raw id.
    #[must_use]
    pub fn normalize(raw: &Value, session_id: &str) -> Self {
        let id = if session_id.is_empty() {
            raw.get("sessionId")
                .and_then(Value::as_str)
                .unwrap_or_default()
        } else {
            session_id
        };
        Self::normalize_over(&Self::new(id), raw)
    }

    /// Applies a raw partial update over `prior`.
    #[must_use]
    pub fn normalize_over(prior: &Self, raw: &Value) -> Self {
        let Some(fields) = raw.as_object() else {
            return prior.clone().normalized();
        };

        let session_id = if prior.session_id.is_empty() {
            fields
                .get("sessionId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        } else {
            prior.session_id.clone()
        };

        let phase = fields
            .get("phase")
            .and_then(Value::as_str)
            .and_then(Phase::parse)
            .unwrap_or(prior.phase);

        let messages_by_phase = match fields.get("messagesByPhase") {
            None => prior.messages_by_phase.clone(),
            Some(value) => messages_from_value(value),
        };

        let code = match fields.get("code") {
            None => prior.code.clone(),
            Some(value) => value.as_str().unwrap_or_default().to_string(),
        };

        let environment_id = fields
            .get("environmentId")
            .and_then(environment_id_from_value)
            .or_else(|| prior.environment_id.clone());

        let run_outcome = match fields.get("runOutcome") {
            None => prior.run_outcome.clone(),
            Some(value) => value.as_object().map(run_outcome_from_fields),
        };

        let session_info = match fields.get("sessionInfo") {
            None => prior.session_info.clone(),
            Some(Value::Null) => None,
            Some(value) => Some(value.clone()),
        };

        Self {
            session_id,
            phase,
            messages_by_phase,
            code,
            environment_id,
            run_outcome,
            session_info,
        }
        .normalized()
    }

    /// Re-applies the invariants to a typed snapshot.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self
            .environment_id
            .as_deref()
            .is_some_and(|value| value.trim().is_empty())
        {
            self.environment_id = None;
        }
        self
    }
}

/// Reads the three phase buckets from a raw `messagesByPhase` /
/// `display_messages` value. Non-sequence buckets read as empty.
#[must_use]
pub fn messages_from_value(value: &Value) -> MessagesByPhase {
    let Some(buckets) = value.as_object() else {
        return MessagesByPhase::default();
    };

    MessagesByPhase {
        interview: bucket_from_value(buckets.get("interview")),
        live_coding: bucket_from_value(buckets.get("live_coding")),
        r#final: bucket_from_value(buckets.get("final")),
    }
}

fn bucket_from_value(value: Option<&Value>) -> Vec<Message> {
    value
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(message_from_value).collect())
        .unwrap_or_default()
}

/// Entries without a known role or string content are dropped.
#[must_use]
pub fn message_from_value(value: &Value) -> Option<Message> {
    let role = match value.get("role").and_then(Value::as_str)? {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        _ => return None,
    };
    let content = value.get("content").and_then(Value::as_str)?;
    Some(Message {
        role,
        content: content.to_string(),
    })
}

/// Accepts a non-blank string or a number; anything else reads as absent.
#[must_use]
pub fn environment_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn run_outcome_from_fields(fields: &Map<String, Value>) -> RunOutcome {
    RunOutcome {
        stdout: string_field(fields, "stdout"),
        stderr: string_field(fields, "stderr"),
        status: fields
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        execution_time: fields.get("executionTime").and_then(seconds_from_value),
        exit_code: fields.get("exitCode").and_then(Value::as_i64),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Execution services report time either as a number or a decimal string.
#[must_use]
pub fn seconds_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|seconds| seconds.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn assert_three_buckets(snapshot: &SessionSnapshot) {
        let value = snapshot.to_value();
        for key in ["interview", "live_coding", "final"] {
            assert!(
                value["messagesByPhase"][key].is_array(),
                "bucket {key} must serialize as a sequence"
            );
        }
    }

    #[test]
    fn arbitrary_inputs_normalize_to_defaults() {
        let inputs = [
            Value::Null,
            json!(42),
            json!("text"),
            json!([1, 2, 3]),
            json!({}),
            json!({"phase": 7, "messagesByPhase": "nope", "code": false}),
            json!({"messagesByPhase": {"interview": {"role": "user"}, "final": null}}),
        ];

        for raw in inputs {
            let snapshot = SessionSnapshot::normalize(&raw, "s-1");
            assert_eq!(snapshot.session_id, "s-1");
            assert_eq!(snapshot.phase, Phase::Interview);
            assert_eq!(snapshot.environment_id, None);
            assert!(snapshot.code.is_empty());
            assert_three_buckets(&snapshot);
        }
    }

    #[test]
    fn unknown_phase_collapses_to_interview() {
        let snapshot = SessionSnapshot::normalize(&json!({"phase": "review"}), "s-1");
        assert_eq!(snapshot.phase, Phase::Interview);
    }

    #[test]
    fn known_fields_survive_normalization() {
        let raw = json!({
            "sessionId": "ignored",
            "phase": "live_coding",
            "messagesByPhase": {
                "interview": [
                    {"role": "assistant", "content": "Hello"},
                    {"role": "user", "content": "Hi"}
                ],
                "live_coding": [{"role": "system", "content": "dropped"}]
            },
            "code": "print(1)",
            "environmentId": "env-9",
            "runOutcome": {"stdout": "1\n", "status": "completed", "executionTime": "0.25", "exitCode": 0},
            "sessionInfo": {"vacancy": "Backend", "level": "middle"}
        });

        let snapshot = SessionSnapshot::normalize(&raw, "s-1");
        assert_eq!(snapshot.session_id, "s-1");
        assert_eq!(snapshot.phase, Phase::LiveCoding);
        assert_eq!(
            snapshot.messages(Phase::Interview),
            &[Message::assistant("Hello"), Message::user("Hi")]
        );
        assert!(snapshot.messages(Phase::LiveCoding).is_empty());
        assert!(snapshot.messages(Phase::Final).is_empty());
        assert_eq!(snapshot.code, "print(1)");
        assert_eq!(snapshot.environment_id.as_deref(), Some("env-9"));
        let outcome = snapshot.run_outcome.expect("run outcome kept");
        assert_eq!(outcome.stdout, "1\n");
        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.execution_time, Some(0.25));
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(snapshot.session_info, Some(json!({"vacancy": "Backend", "level": "middle"})));
    }

    #[test]
    fn empty_session_id_argument_falls_back_to_stored_id() {
        let snapshot = SessionSnapshot::normalize(&json!({"sessionId": "stored"}), "");
        assert_eq!(snapshot.session_id, "stored");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            json!({}),
            json!({"phase": "final", "environmentId": 71, "code": "x = 1"}),
            json!({
                "phase": "live_coding",
                "messagesByPhase": {"live_coding": [{"role": "user", "content": "run it"}]},
                "runOutcome": {"stdout": "ok", "executionTime": 0.1},
                "sessionInfo": "opaque"
            }),
            json!({"environmentId": "   ", "runOutcome": "broken"}),
        ];

        for raw in inputs {
            let once = SessionSnapshot::normalize(&raw, "s-2");
            let twice = SessionSnapshot::normalize(&once.to_value(), "s-2");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn partial_update_without_environment_keeps_prior_value() {
        let mut prior = SessionSnapshot::new("s-3");
        prior.environment_id = Some("python-3.12".to_string());

        let absent = SessionSnapshot::normalize_over(&prior, &json!({"code": "pass"}));
        assert_eq!(absent.environment_id.as_deref(), Some("python-3.12"));
        assert_eq!(absent.code, "pass");

        let null = SessionSnapshot::normalize_over(&prior, &json!({"environmentId": null}));
        assert_eq!(null.environment_id.as_deref(), Some("python-3.12"));

        let replaced = SessionSnapshot::normalize_over(&prior, &json!({"environmentId": "node"}));
        assert_eq!(replaced.environment_id.as_deref(), Some("node"));
    }

    #[test]
    fn partial_update_keeps_prior_phase_for_unknown_value() {
        let mut prior = SessionSnapshot::new("s-4");
        prior.phase = Phase::LiveCoding;

        let updated = SessionSnapshot::normalize_over(&prior, &json!({"phase": "bogus"}));
        assert_eq!(updated.phase, Phase::LiveCoding);
    }

    #[test]
    fn partial_update_with_malformed_bucket_empties_only_that_bucket() {
        let mut prior = SessionSnapshot::new("s-5");
        prior.messages_by_phase.push(Phase::Interview, Message::user("kept?"));

        let updated = SessionSnapshot::normalize_over(
            &prior,
            &json!({"messagesByPhase": {"interview": "oops", "final": [{"role": "assistant", "content": "Summary"}]}}),
        );
        assert!(updated.messages(Phase::Interview).is_empty());
        assert_eq!(updated.messages(Phase::Final), &[Message::assistant("Summary")]);

        let untouched = SessionSnapshot::normalize_over(&prior, &json!({"code": ""}));
        assert_eq!(untouched.messages(Phase::Interview), &[Message::user("kept?")]);
    }

    #[test]
    fn non_object_run_outcome_reads_as_absent() {
        let mut prior = SessionSnapshot::new("s-6");
        prior.run_outcome = Some(RunOutcome::failed("boom"));

        let cleared = SessionSnapshot::normalize_over(&prior, &json!({"runOutcome": null}));
        assert_eq!(cleared.run_outcome, None);
    }

    #[test]
    fn seconds_accept_numbers_and_decimal_strings() {
        assert_eq!(seconds_from_value(&json!(0.5)), Some(0.5));
        assert_eq!(seconds_from_value(&json!("0.031")), Some(0.031));
        assert_eq!(seconds_from_value(&json!("n/a")), None);
        assert_eq!(seconds_from_value(&Value::Null), None);
    }
}
