//! Sequential rule evaluation.

use crate::error::CoreError;

use super::rules::{FieldError, FormRules};

/// Evaluate `rules` against `data`, reporting the first failing rule per
/// field in field declaration order.
///
/// For each field, rules run in list order. A condition returning `true`
/// marks the rule as failed: its error is recorded and the remaining rules
/// for that field are skipped. A rule without a condition always fails.
/// Async conditions are awaited one at a time; there is no concurrent
/// fan-out across rules or fields.
///
/// # Errors
///
/// A condition returning `Err` propagates immediately and aborts the run.
/// The engine applies no retry or suppression policy.
pub async fn validate_flow<T>(
    data: &T,
    rules: &FormRules<T>,
) -> Result<Vec<FieldError>, CoreError> {
    let mut errors = Vec::new();

    for (field, field_rules) in rules.iter() {
        for rule in field_rules {
            let failed = match rule.condition() {
                Some(condition) => condition(data).await?,
                None => true,
            };

            if failed {
                errors.push(FieldError {
                    field: field.to_string(),
                    message: rule.error().to_string(),
                });
                break;
            }
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::validation::rules::FieldRule;

    /// Login-shaped test payload.
    struct Credentials {
        email: String,
        password: String,
    }

    fn credential_rules() -> FormRules<Credentials> {
        FormRules::new()
            .field(
                "email",
                vec![FieldRule::when(|d: &Credentials| d.email.is_empty(), "required")],
            )
            .field(
                "password",
                vec![FieldRule::when(
                    |d: &Credentials| d.password.is_empty(),
                    "required",
                )],
            )
    }

    #[tokio::test]
    async fn empty_rules_pass_any_input() {
        let rules: FormRules<Credentials> = FormRules::new();
        let data = Credentials {
            email: String::new(),
            password: String::new(),
        };
        let errors = validate_flow(&data, &rules).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn empty_rule_lists_pass_any_input() {
        let rules: FormRules<Credentials> = FormRules::new()
            .field("email", vec![])
            .field("password", vec![]);
        let data = Credentials {
            email: String::new(),
            password: String::new(),
        };
        let errors = validate_flow(&data, &rules).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn first_failing_rule_wins_and_short_circuits() {
        // The second rule flips a flag if evaluated; it must never run.
        let second_evaluated = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&second_evaluated);

        let rules = FormRules::new().field(
            "email",
            vec![
                FieldRule::when(|_: &Credentials| true, "first"),
                FieldRule::when(
                    move |_: &Credentials| {
                        flag.store(true, Ordering::SeqCst);
                        true
                    },
                    "second",
                ),
            ],
        );

        let data = Credentials {
            email: "a@b.com".into(),
            password: "x".into(),
        };
        let errors = validate_flow(&data, &rules).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "first");
        assert!(
            !second_evaluated.load(Ordering::SeqCst),
            "rules after the first failure must not be evaluated"
        );
    }

    #[tokio::test]
    async fn later_rule_reports_when_earlier_passes() {
        let rules = FormRules::new().field(
            "email",
            vec![
                FieldRule::when(|_: &Credentials| false, "first"),
                FieldRule::when(|_: &Credentials| true, "second"),
            ],
        );

        let data = Credentials {
            email: "a@b.com".into(),
            password: "x".into(),
        };
        let errors = validate_flow(&data, &rules).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].message, "second");
    }

    #[tokio::test]
    async fn errors_preserve_field_declaration_order() {
        let rules = FormRules::new()
            .field("a", vec![FieldRule::when(|_: &()| true, "a failed")])
            .field("b", vec![FieldRule::when(|_: &()| true, "b failed")]);

        let errors = validate_flow(&(), &rules).await.unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "a");
        assert_eq!(errors[1].field, "b");
    }

    #[tokio::test]
    async fn rule_without_condition_always_reports() {
        let rules: FormRules<()> =
            FormRules::new().field("terms", vec![FieldRule::always("unconditional")]);

        let errors = validate_flow(&(), &rules).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unconditional");
    }

    #[tokio::test]
    async fn async_conditions_are_awaited() {
        // The condition resolves only after a delay; the flag it sets must be
        // visible once validate_flow returns, proving the engine awaited it.
        let resolved = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&resolved);

        let rules = FormRules::new().field(
            "email",
            vec![FieldRule::when_async(
                move |_: &Credentials| {
                    let flag = Arc::clone(&flag);
                    async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        flag.store(true, Ordering::SeqCst);
                        Ok(true)
                    }
                },
                "taken",
            )],
        );

        let data = Credentials {
            email: "a@b.com".into(),
            password: "x".into(),
        };
        let errors = validate_flow(&data, &rules).await.unwrap();

        assert!(resolved.load(Ordering::SeqCst));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "taken");
    }

    #[tokio::test]
    async fn condition_error_propagates() {
        let rules = FormRules::new()
            .field(
                "email",
                vec![FieldRule::when_async(
                    |_: &Credentials| {
                        async { Err(CoreError::Internal("connection lost".into())) }
                    },
                    "unreachable",
                )],
            )
            .field(
                "password",
                vec![FieldRule::when(|_: &Credentials| true, "also unreachable")],
            );

        let data = Credentials {
            email: "a@b.com".into(),
            password: "x".into(),
        };
        let result = validate_flow(&data, &rules).await;

        assert_matches!(result, Err(CoreError::Internal(msg)) if msg == "connection lost");
    }

    #[tokio::test]
    async fn missing_email_reports_only_email() {
        let data = Credentials {
            email: String::new(),
            password: "x".into(),
        };
        let errors = validate_flow(&data, &credential_rules()).await.unwrap();
        assert_eq!(
            errors,
            vec![FieldError {
                field: "email".into(),
                message: "required".into(),
            }]
        );
    }

    #[tokio::test]
    async fn missing_password_reports_only_password() {
        let data = Credentials {
            email: "a@b.com".into(),
            password: String::new(),
        };
        let errors = validate_flow(&data, &credential_rules()).await.unwrap();
        assert_eq!(
            errors,
            vec![FieldError {
                field: "password".into(),
                message: "required".into(),
            }]
        );
    }

    #[tokio::test]
    async fn both_missing_reports_in_declaration_order() {
        let data = Credentials {
            email: String::new(),
            password: String::new(),
        };
        let errors = validate_flow(&data, &credential_rules()).await.unwrap();
        assert_eq!(
            errors,
            vec![
                FieldError {
                    field: "email".into(),
                    message: "required".into(),
                },
                FieldError {
                    field: "password".into(),
                    message: "required".into(),
                },
            ]
        );
    }
}
