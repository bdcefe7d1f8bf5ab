use docstore::collection::UpdateOptions;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::all;
use docstore_int_test::test_util::{cleanup, create_test_context, run_test};
use std::time::Duration;

#[test]
fn test_call_timeout_elapses() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx.connect()?;
            let users = conn.default_database()?.collection("users")?;
            assert_eq!(users.timeout(), None);

            ctx.driver().set_latency(Duration::from_millis(100));
            let hasty = users.with_timeout(Duration::from_millis(5));
            assert_eq!(hasty.timeout(), Some(Duration::from_millis(5)));

            let err = hasty.insert_one(doc! { name: "Ivan" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::TimeoutError);
            assert_eq!(err.operation(), Some("insert_one"));

            let err = hasty
                .update_one(all(), doc! { "$set": { age: 1 } }, UpdateOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::TimeoutError);

            ctx.driver().set_latency(Duration::ZERO);
            assert_eq!(users.count_documents(all())?, 0);
            conn.close()
        },
        cleanup,
    )
}

#[test]
fn test_default_timeout_from_builder() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx
                .builder()
                .default_timeout(Duration::from_millis(5))
                .connect(ctx.address())?;
            let users = conn.default_database()?.collection("users")?;
            assert_eq!(users.timeout(), Some(Duration::from_millis(5)));

            ctx.driver().set_latency(Duration::from_millis(100));
            let err = users.find(all()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::TimeoutError);

            let patient = users.with_timeout(Duration::from_secs(30));
            assert!(patient.find(all())?.is_empty());

            ctx.driver().set_latency(Duration::ZERO);
            conn.close()
        },
        cleanup,
    )
}

#[test]
fn test_no_timeout_waits_for_latency() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.driver().set_latency(Duration::from_millis(20));
            ctx.with_collection("users", |users| {
                users.insert_one(doc! { name: "Ivan" })?;
                assert_eq!(users.count_documents(all())?, 1);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_unbounded_timeout_never_elapses() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx
                .builder()
                .default_timeout(Duration::MAX)
                .connect(ctx.address())?;
            let users = conn.default_database()?.collection("users")?;
            assert_eq!(users.timeout(), Some(Duration::MAX));

            ctx.driver().set_latency(Duration::from_millis(10));
            users.insert_one(doc! { name: "Ivan" })?;
            let patient = users.with_timeout(Duration::MAX);
            assert_eq!(patient.count_documents(all())?, 1);

            ctx.driver().set_latency(Duration::ZERO);
            conn.close()
        },
        cleanup,
    )
}
