use proptest::prelude::*;
use rulegate_batch::{BatchConfig, BatchValidator, IndexedBatchValidator};
use rulegate_core::predicates;
use rulegate_core::rules::FieldRule;
use rulegate_core::{Context, ErrorCode, MultiError, Priority, Stage, ValidationEngine};
use rulegate_testing::{assert_error, assert_fields, assert_invalid};

fn always_failing(per_item: usize, config: BatchConfig) -> BatchValidator<usize> {
    BatchValidator::new(config, move |_ctx, _item: &usize, index| {
        Box::pin(async move {
            let mut errors = MultiError::new();
            for n in 0..per_item {
                errors.add(&format!("f{n}"), ErrorCode::Invalid, format!("item {index}"));
            }
            errors.into_option()
        })
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn error_cap_is_never_exceeded(
        items in 0usize..60,
        per_item in 1usize..4,
        cap in 1usize..20,
        chunk_size in 1usize..10,
        max_parallel in 1usize..5,
    ) {
        let config = BatchConfig::new()
            .chunk_size(chunk_size)
            .max_parallel(max_parallel)
            .max_errors(cap);
        let report = runtime().block_on(async {
            always_failing(per_item, config)
                .run(&Context::background(), (0..items).collect::<Vec<_>>())
                .await
        });

        let collected = report.errors.map_or(0, |e| e.len());
        prop_assert!(collected <= cap);
        prop_assert_eq!(report.processed + report.skipped, items);
    }

    #[test]
    fn uncapped_batch_processes_everything(items in 0usize..80, chunk_size in 1usize..12) {
        let config = BatchConfig::new().chunk_size(chunk_size);
        let report = runtime().block_on(async {
            always_failing(1, config)
                .run(&Context::background(), (0..items).collect::<Vec<_>>())
                .await
        });

        prop_assert_eq!(report.processed, items);
        prop_assert_eq!(report.failed, items);
        prop_assert_eq!(report.errors.map_or(0, |e| e.len()), items);
    }
}

#[tokio::test]
async fn indexed_batch_files_errors_under_item_index() {
    let batch = IndexedBatchValidator::from_engine(
        "items",
        BatchConfig::default(),
        |name: &String, _index| {
            ValidationEngine::default().with_rule(
                FieldRule::for_value("name", name.as_str())
                    .check(predicates::required)
                    .with_stage(Stage::Basic)
                    .with_priority(Priority::High),
            )
        },
    );

    let items = vec!["x".to_string(), String::new(), "z".to_string()];
    let errors = assert_invalid(batch.validate(&Context::background(), items).await);

    assert_fields(&errors, &["items[1].name"]);
    assert_error(&errors, "items[1].name", ErrorCode::Required);
}
