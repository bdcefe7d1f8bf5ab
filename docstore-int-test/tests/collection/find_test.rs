use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, field};
use docstore_int_test::test_util::{
    cleanup, create_test_context, insert_test_documents, run_test, without_id,
};

#[test]
fn test_users_scenario() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let anna = users.find(doc! { name: "Anna", age: 24 })?.to_vec();
                assert_eq!(anna.len(), 1);
                assert!(anna[0].has_id());
                assert_eq!(without_id(&anna[0]), doc! { name: "Anna", age: 24 });

                let ivan = users.find_one(doc! { age: 25 })?.unwrap();
                assert_eq!(ivan.get("name"), Some(&Value::from("Ivan")));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_no_match_is_empty() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let cursor = users.find(doc! { name: "Olena" })?;
                assert!(cursor.is_empty());
                assert!(users.find_one(field("age").eq(99))?.is_none());
                assert_eq!(users.count_documents(doc! { name: "Olena" })?, 0);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_on_missing_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx.connect()?;
            let database = conn.database(ctx.database())?;
            let users = database.collection("nobody")?;

            assert!(users.find(all())?.is_empty());
            assert!(users.find_one(all())?.is_none());
            assert!(database.list_collection_names()?.is_empty());
            conn.close()
        },
        cleanup,
    )
}

#[test]
fn test_find_all_in_insertion_order() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let names: Vec<String> = users
                    .find(doc! {})?
                    .filter_map(|d| d.get("name").and_then(|v| v.as_str()).map(String::from))
                    .collect();
                assert_eq!(names, vec!["Ivan", "Anna", "Taras"]);
                assert_eq!(users.find_one(all())?.unwrap().get("name"), Some(&Value::from("Ivan")));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_numeric_equality_across_widths() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                users.insert_one(doc! { name: "Ivan", age: (25i64) })?;
                assert!(users.find_one(doc! { age: 25 })?.is_some());
                assert!(users.find_one(doc! { age: 25.0 })?.is_some());
                assert!(users.find_one(doc! { age: "25" })?.is_none());
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_by_embedded_field() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                users.insert_many(vec![
                    doc! { name: "Ivan", address: { city: "Kyiv" }, tags: ["admin", "user"] },
                    doc! { name: "Anna", address: { city: "Lviv" }, tags: ["user"] },
                ])?;

                let kyiv = users.find(field("address.city").eq("Kyiv"))?.to_vec();
                assert_eq!(kyiv.len(), 1);
                assert_eq!(kyiv[0].get("name"), Some(&Value::from("Ivan")));

                assert_eq!(users.count_documents(doc! { tags: "user" })?, 2);
                assert_eq!(users.count_documents(doc! { tags: "admin" })?, 1);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_rejects_operator_filters() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let err = users.find(doc! { age: { "$gt": 20 } }).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
                assert_eq!(err.operation(), Some("find"));

                let err = users.find_one(doc! { "$or": [] }).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_collections_are_isolated() {
    run_test(
        create_test_context,
        |ctx| {
            let conn = ctx.connect()?;
            let database = conn.database(ctx.database())?;
            let users = database.collection("users")?;
            let admins = database.collection("admins")?;

            users.insert_one(doc! { name: "Ivan" })?;
            admins.insert_one(doc! { name: "Anna" })?;

            assert_eq!(users.count_documents(all())?, 1);
            assert!(admins.find_one(doc! { name: "Ivan" })?.is_none());
            assert_eq!(
                database.list_collection_names()?,
                vec!["admins".to_string(), "users".to_string()]
            );
            assert!(conn.list_database_names()?.contains(&ctx.database().to_string()));

            assert!(database.drop_collection("admins")?);
            assert!(!database.drop_collection("admins")?);
            conn.close()
        },
        cleanup,
    )
}
