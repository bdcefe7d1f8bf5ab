use docstore::client::Client;
use docstore::doc;
use docstore::errors::{ErrorKind, StoreError, StoreResult};
use docstore::filter::all;
use docstore::with_connection;
use docstore_int_test::test_util::{cleanup, create_test_context, run_test};
use std::panic::{catch_unwind, AssertUnwindSafe};

#[test]
fn test_close_releases_once() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx.connect()?;
            assert_eq!(ctx.driver().open_sessions(), 1);
            conn.ping()?;
            conn.close()?;
            assert_eq!(ctx.driver().open_sessions(), 0);
            assert_eq!(ctx.driver().sessions_closed(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_drop_releases() {
    run_test(
        create_test_context,
        |ctx| {
            {
                let conn = ctx.connect()?;
                let users = conn.default_database()?.collection("users")?;
                users.insert_one(doc! { name: "Ivan" })?;
            }
            assert_eq!(ctx.driver().open_sessions(), 0);
            assert_eq!(ctx.driver().sessions_closed(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_with_connection_releases_on_error() {
    run_test(
        create_test_context,
        |ctx| {
            let result: StoreResult<()> = with_connection(ctx.builder(), ctx.address(), |conn| {
                let users = conn.default_database()?.collection("users")?;
                users.insert_many(vec![])?;
                Ok(())
            });
            let err = result.unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            assert_eq!(ctx.driver().open_sessions(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_with_connection_releases_on_panic() {
    run_test(
        create_test_context,
        |ctx| {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                with_connection(ctx.builder(), ctx.address(), |_conn| -> StoreResult<()> {
                    panic!("body failed")
                })
            }));
            assert!(outcome.is_err());
            assert_eq!(ctx.driver().sessions_opened(), 1);
            assert_eq!(ctx.driver().open_sessions(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_connections_share_endpoint() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                users.insert_one(doc! { name: "Ivan" })?;
                Ok(())
            })?;

            let count = ctx.with_collection("users", |users| users.count_documents(all()))?;
            assert_eq!(count, 1);
            assert_eq!(ctx.driver().sessions_opened(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_connect_fails_when_unreachable() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.driver().set_reachable(false);
            let err = ctx.connect().err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::ConnectionError);
            assert_eq!(ctx.driver().sessions_opened(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lost_connection_is_reported_not_retried() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx.connect()?;
            let users = conn.default_database()?.collection("users")?;
            users.insert_one(doc! { name: "Ivan" })?;

            ctx.driver().set_reachable(false);
            let err = users.insert_one(doc! { name: "Anna" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConnectionError);
            assert_eq!(err.operation(), Some("insert_one"));
            assert!(conn.ping().is_err());

            let err = conn.close().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConnectionError);
            assert_eq!(ctx.driver().open_sessions(), 0);

            ctx.driver().set_reachable(true);
            ctx.with_collection("users", |users| {
                assert_eq!(users.count_documents(all())?, 1);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_invalid_addresses_and_names() {
    run_test(
        create_test_context,
        |ctx| {
            for address in ["", "localhost:27017", "mongodb://", "mongodb://host:99999"] {
                let err = ctx.builder().connect(address).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
            }
            assert_eq!(ctx.driver().sessions_opened(), 0);

            let conn = ctx.connect()?;
            for name in ["", "bad.name", "$bad"] {
                let err = conn.database(name).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
            }
            let database = conn.default_database()?;
            assert!(database.collection("a$b").is_err());
            conn.close()?;

            let bare = ctx.builder().connect("mongodb://127.0.0.1:27017/")?;
            let err = bare.default_database().err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            bare.close()
        },
        cleanup,
    )
}

#[test]
fn test_builder_reports_first_config_error() {
    run_test(
        create_test_context,
        |ctx| {
            let err = Client::builder()
                .app_name("")
                .default_timeout(std::time::Duration::ZERO)
                .driver(ctx.driver().clone())
                .connect(ctx.address())
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            assert!(err.message().contains("name"));
            assert_eq!(ctx.driver().sessions_opened(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_error_chain_is_displayed() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.driver().set_reachable(false);
            let err: StoreError = ctx.connect().err().unwrap();
            let cause = err.cause().unwrap();
            assert_eq!(cause.kind(), &ErrorKind::ConnectionError);
            assert!(format!("{:?}", err).contains(cause.message()));
            Ok(())
        },
        cleanup,
    )
}
