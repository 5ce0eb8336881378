use proptest::prelude::*;
use rulegate_core::prelude::*;
use std::time::Duration;

fn emitting(stage: Stage, priority: Priority, field: String) -> ConcreteRule {
    ConcreteRule::new(field.clone())
        .with_stage(stage)
        .with_priority(priority)
        .with_check(move |errors| {
            errors.add(&field, ErrorCode::Invalid, format!("{field} is invalid"));
            Ok(())
        })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Errors come back ordered by (stage, priority) whatever the registration order.
    #[test]
    fn prop_errors_follow_bucket_order(
        buckets in prop::collection::vec((stage_strategy(), priority_strategy()), 1..12),
        max_parallel in 1usize..6,
    ) {
        let rt = runtime();
        let mut engine = ValidationEngine::new(EngineConfig::new().max_parallel(max_parallel));
        for (i, (stage, priority)) in buckets.iter().enumerate() {
            engine.add_rule(emitting(*stage, *priority, format!("f{i}")));
        }

        let errors = rt.block_on(engine.validate(&Context::background())).unwrap();
        let keys: Vec<(Stage, Priority)> = errors
            .fields()
            .iter()
            .map(|f| {
                let i: usize = f[1..].parse().unwrap();
                buckets[i]
            })
            .collect();

        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
        prop_assert_eq!(errors.len(), buckets.len());
    }

    /// With one worker, rules of a bucket report in registration order.
    #[test]
    fn prop_serial_bucket_keeps_registration_order(count in 1usize..10) {
        let rt = runtime();
        let mut engine = ValidationEngine::new(EngineConfig::serial());
        for i in 0..count {
            engine.add_rule(emitting(Stage::Basic, Priority::Medium, format!("f{i}")));
        }

        let errors = rt.block_on(engine.validate(&Context::background())).unwrap();
        let expected: Vec<String> = (0..count).map(|i| format!("f{i}")).collect();
        prop_assert_eq!(errors.fields(), expected);
    }
}

#[tokio::test]
async fn repeated_runs_are_equal() {
    let mut engine = ValidationEngine::new(EngineConfig::serial());
    engine
        .add_rule(emitting(Stage::Basic, Priority::High, "name".into()))
        .add_rule(emitting(Stage::Compliance, Priority::Low, "permit".into()));

    let first = engine.validate(&Context::background()).await.unwrap();
    let second = engine.validate(&Context::background()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn validate_and_validate_into_agree() {
    let mut engine = ValidationEngine::new(EngineConfig::serial()).for_field("customer");
    engine
        .add_rule(emitting(Stage::Basic, Priority::High, "name".into()))
        .add_rule(emitting(Stage::DataIntegrity, Priority::Medium, "email".into()));

    let direct = engine.validate(&Context::background()).await.unwrap();

    let parent = MultiError::new();
    engine.validate_into(&Context::background(), &parent).await;

    assert_eq!(direct.errors(), parent.errors());
    assert_eq!(parent.fields(), vec!["customer.name", "customer.email"]);
}

#[tokio::test]
async fn slow_rule_keeps_its_bucket_priority() {
    let mut engine = ValidationEngine::default();
    engine
        .add_rule(
            ConcreteRule::new("slow")
                .with_priority(Priority::Medium)
                .with_validation(|_ctx, errors| {
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        errors.add("slow", ErrorCode::Invalid, "slow is invalid");
                        Ok(())
                    })
                }),
        )
        .add_rule(emitting(Stage::Basic, Priority::Medium, "fast".into()))
        .add_rule(emitting(Stage::Basic, Priority::Low, "late".into()));

    let errors = engine.validate(&Context::background()).await.unwrap();
    for error in errors.errors() {
        let expected = if error.field == "late" {
            Priority::Low
        } else {
            Priority::Medium
        };
        assert_eq!(error.priority, expected, "field {}", error.field);
    }
}

#[tokio::test]
async fn timeout_wrapper_reports_system_error() {
    let slow = ConcreteRule::new("remote").with_validation(|ctx, _errors| {
        Box::pin(async move {
            ctx.cancelled().await;
            Ok(())
        })
    });
    let mut engine = ValidationEngine::default();
    engine
        .add_rule(AsyncRule::new(slow, Duration::from_millis(20)))
        .add_rule(emitting(Stage::Basic, Priority::Medium, "name".into()));

    let errors = engine.validate(&Context::background()).await.unwrap();
    let system: Vec<_> = errors.errors().into_iter().filter(|e| e.is_system()).collect();
    assert_eq!(system.len(), 1);
    assert_eq!(system[0].message, "Rule 'remote' timed out after 20ms");
    assert!(errors.has_field("name"));
}

#[tokio::test]
async fn cancellation_mid_run_keeps_recorded_errors() {
    let ctx = Context::background();
    let canceller = ctx.clone();

    let mut engine = ValidationEngine::new(EngineConfig::serial());
    engine
        .add_rule(emitting(Stage::Basic, Priority::High, "first".into()))
        .add_rule(
            ConcreteRule::new("cancel")
                .with_priority(Priority::Low)
                .with_check(move |_| {
                    canceller.cancel();
                    Ok(())
                }),
        )
        .add_rule(emitting(Stage::Compliance, Priority::High, "never".into()));

    let errors = engine.validate(&ctx).await.unwrap();
    assert_eq!(errors.fields(), vec!["first"]);
}
