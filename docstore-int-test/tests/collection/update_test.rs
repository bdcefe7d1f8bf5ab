use docstore::collection::{return_updated, upsert, FindOneAndUpdateOptions, UpdateOptions};
use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, field};
use docstore_int_test::test_util::{
    cleanup, create_test_context, insert_test_documents, run_test, without_id,
};

#[test]
fn test_update_one_upsert_creates_then_updates() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let result = users.update_one(
                    doc! { name: "Olena", city: "Odesa" },
                    doc! { "$set": { age: 35 } },
                    upsert(),
                )?;
                assert_eq!(result.matched_count(), 0);
                assert_eq!(result.modified_count(), 0);
                assert_eq!(result.upserted_count(), 1);
                let upserted_id = result.upserted_id().unwrap();

                let olena = users.find_one(doc! { name: "Olena" })?.unwrap();
                assert_eq!(olena.id(), Some(upserted_id));
                assert_eq!(
                    without_id(&olena),
                    doc! { name: "Olena", city: "Odesa", age: 35 }
                );

                let result = users.update_one(
                    doc! { name: "Olena", city: "Odesa" },
                    doc! { "$set": { age: 36 } },
                    UpdateOptions::upsert(),
                )?;
                assert_eq!(result.matched_count(), 1);
                assert_eq!(result.modified_count(), 1);
                assert_eq!(result.upserted_id(), None);

                assert_eq!(users.count_documents(doc! { name: "Olena" })?, 1);
                assert_eq!(users.count_documents(all())?, 4);
                let olena = users.find_one(by_name("Olena"))?.unwrap();
                assert_eq!(olena.get("age"), Some(&Value::from(36)));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_update_one_without_upsert_on_no_match() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let result = users.update_one(
                    doc! { age: 99 },
                    doc! { "$set": { age: 35 } },
                    UpdateOptions::default(),
                )?;
                assert_eq!(result.matched_count(), 0);
                assert_eq!(result.modified_count(), 0);
                assert_eq!(result.upserted_id(), None);
                assert_eq!(users.count_documents(all())?, 3);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_update_one_with_same_value_is_not_modified() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let result = users.update_one(
                    by_name("Ivan"),
                    doc! { "$set": { age: 25 } },
                    UpdateOptions::default(),
                )?;
                assert_eq!(result.matched_count(), 1);
                assert_eq!(result.modified_count(), 0);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_update_many_operators() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let result = users.update_many(
                    all(),
                    doc! {
                        "$inc": { age: 1 },
                        "$set": { "profile.active": true },
                    },
                    UpdateOptions::default(),
                )?;
                assert_eq!(result.matched_count(), 3);
                assert_eq!(result.modified_count(), 3);

                let taras = users.find_one(by_name("Taras"))?.unwrap();
                assert_eq!(taras.get("age"), Some(&Value::from(35)));
                assert_eq!(taras.get_path("profile.active"), Some(&Value::from(true)));

                let result = users.update_many(
                    field("profile.active").eq(true),
                    doc! { "$unset": { profile: "" } },
                    UpdateOptions::default(),
                )?;
                assert_eq!(result.modified_count(), 3);
                assert_eq!(users.count_documents(doc! { "profile.active": true })?, 0);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_update_returns_requested_snapshot() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let updated = users
                    .find_one_and_update(
                        doc! { name: "Taras" },
                        doc! { "$set": { age: 45 } },
                        return_updated(),
                    )?
                    .unwrap();
                assert_eq!(without_id(&updated), doc! { name: "Taras", age: 45 });

                let before = users
                    .find_one_and_update(
                        doc! { name: "Taras" },
                        doc! { "$set": { age: 46 } },
                        FindOneAndUpdateOptions::default().return_updated(false),
                    )?
                    .unwrap();
                assert_eq!(without_id(&before), doc! { name: "Taras", age: 45 });
                assert_eq!(before.id(), updated.id());

                let stored = users.find_one(by_name("Taras"))?.unwrap();
                assert_eq!(stored.get("age"), Some(&Value::from(46)));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_update_no_match() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let result = users.find_one_and_update(
                    doc! { name: "Olena" },
                    doc! { "$set": { age: 20 } },
                    return_updated(),
                )?;
                assert!(result.is_none());
                assert_eq!(users.count_documents(all())?, 3);

                let inserted = users
                    .find_one_and_update(
                        doc! { name: "Olena" },
                        doc! { "$set": { age: 20 } },
                        return_updated().upsert(true),
                    )?
                    .unwrap();
                assert_eq!(without_id(&inserted), doc! { name: "Olena", age: 20 });
                assert_eq!(users.count_documents(all())?, 4);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_update_rejects_malformed_updates() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                for update in [
                    doc! {},
                    doc! { age: 30 },
                    doc! { "$rename": { age: "years" } },
                    doc! { "$set": 1 },
                    doc! { "$set": { "_id.x": 1 } },
                    doc! { "$inc": { age: "one" } },
                    doc! { "$set": { address: 1, "address.city": "Kyiv" } },
                ] {
                    let err = users
                        .update_one(all(), update, UpdateOptions::default())
                        .unwrap_err();
                    assert_eq!(err.kind(), &ErrorKind::ValidationError);
                    assert_eq!(err.operation(), Some("update_one"));
                }

                let stored = users.find(all())?.to_vec();
                assert_eq!(stored.len(), 3);
                assert_eq!(
                    without_id(&stored[0]),
                    doc! { name: "Ivan", age: 25 }
                );
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_update_rejected_by_store() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                insert_test_documents(users)?;

                let err = users
                    .update_one(
                        by_name("Ivan"),
                        doc! { "$inc": { name: 1 } },
                        UpdateOptions::default(),
                    )
                    .unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::WriteError);

                let ivan = users.find_one(by_name("Ivan"))?.unwrap();
                assert_eq!(ivan.get("name"), Some(&Value::from("Ivan")));
                Ok(())
            })
        },
        cleanup,
    )
}

fn by_name(name: &str) -> docstore::filter::Filter {
    field("name").eq(name)
}
