use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, by_id, field};
use docstore_int_test::test_util::{
    cleanup, create_test_context, insert_test_documents, random_users, run_test,
};

#[test]
fn test_delete_many_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;
                users.insert_one(doc! { name: "Ivan", age: 52 })?;

                let result = users.delete_many(doc! { name: "Ivan" })?;
                assert!(result.acknowledged());
                assert_eq!(result.deleted_count(), 2);

                let result = users.delete_many(doc! { name: "Ivan" })?;
                assert_eq!(result.deleted_count(), 0);
                assert_eq!(users.count_documents(all())?, 2);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_delete_many_empty_filter_clears_collection() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                users.insert_many(random_users(50))?;
                assert_eq!(users.delete_many(doc! {})?.deleted_count(), 50);
                assert!(users.find(all())?.is_empty());
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_delete_one_removes_first_match() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let ids = users
                    .insert_many(vec![
                        doc! { name: "Ivan", role: "admin" },
                        doc! { name: "Anna", role: "admin" },
                    ])?
                    .ids();

                assert_eq!(users.delete_one(field("role").eq("admin"))?.deleted_count(), 1);
                assert!(users.find_one(by_id(ids[0]))?.is_none());
                assert!(users.find_one(by_id(ids[1]))?.is_some());
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_delete_on_missing_collection() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("nobody", |users| {
                assert_eq!(users.delete_many(all())?.deleted_count(), 0);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_delete_rejects_invalid_filter() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;
                let err = users.delete_many(doc! { age: { "$lt": 30 } }).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
                assert_eq!(err.operation(), Some("delete_many"));
                assert_eq!(users.count_documents(all())?, 3);
                Ok(())
            })
        },
        cleanup,
    )
}
