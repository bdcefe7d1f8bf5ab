use docstore::collection::DocumentId;
use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::{all, by_id, field};
use docstore_int_test::test_util::{
    cleanup, create_test_context, random_users, run_test, without_id,
};

#[test]
fn test_insert_one_then_find_one() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let document = doc! {
                    name: "Ivan",
                    age: 25,
                    address: { city: "Kyiv", zip: "01001" },
                    tags: ["admin", "user"],
                };

                let result = users.insert_one(document.clone())?;
                assert!(result.acknowledged());

                let found = users.find_one(doc! { name: "Ivan" })?.unwrap();
                assert_eq!(found.id(), Some(result.inserted_id()));
                assert_eq!(without_id(&found), document);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_one_keeps_supplied_id() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let id = DocumentId::new();
                let mut document = doc! { name: "Anna" };
                document.put("_id", id)?;

                let result = users.insert_one(document)?;
                assert_eq!(result.inserted_id(), id);

                let found = users.find_one(by_id(id))?.unwrap();
                assert_eq!(found.get("name"), Some(&Value::from("Anna")));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_one_twice_creates_two_documents() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let first = users.insert_one(doc! { name: "Ivan", age: 25 })?;
                let second = users.insert_one(doc! { name: "Ivan", age: 25 })?;
                assert_ne!(first.inserted_id(), second.inserted_id());
                assert_eq!(users.count_documents(field("name").eq("Ivan"))?, 2);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_then_find_all() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let documents = random_users(25);
                let result = users.insert_many(documents.clone())?;
                assert_eq!(result.inserted_count(), 25);

                let found = users.find(all())?.to_vec();
                assert_eq!(found.len(), 25);
                for document in &found {
                    assert!(document.has_id());
                    assert!(result.ids().contains(&document.id().unwrap()));
                    assert!(documents.contains(&without_id(document)));
                }
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_reports_ids_by_position() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let result = users.insert_many(vec![
                    doc! { name: "Ivan" },
                    doc! { name: "Anna" },
                ])?;

                let ivan = users.find_one(doc! { name: "Ivan" })?.unwrap();
                let anna = users.find_one(doc! { name: "Anna" })?.unwrap();
                assert_eq!(result.inserted_ids().get(&0).copied(), ivan.id());
                assert_eq!(result.inserted_ids().get(&1).copied(), anna.id());
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_empty_batch() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let err = users.insert_many(vec![]).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
                assert_eq!(err.operation(), Some("insert_many"));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_stops_at_duplicate() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let id = DocumentId::new();
                let mut first = doc! { name: "Ivan" };
                first.put("_id", id)?;
                let mut duplicate = doc! { name: "Anna" };
                duplicate.put("_id", id)?;

                let err = users
                    .insert_many(vec![
                        doc! { name: "Taras" },
                        first,
                        duplicate,
                        doc! { name: "Olena" },
                    ])
                    .unwrap_err();

                match err.kind() {
                    ErrorKind::PartialWriteError {
                        inserted_ids,
                        failed_index,
                    } => {
                        assert_eq!(*failed_index, 2);
                        assert_eq!(inserted_ids.len(), 2);
                        assert_eq!(inserted_ids[1], id);
                    }
                    other => panic!("unexpected error kind {}", other),
                }
                assert_eq!(err.inserted_count(), Some(2));
                assert_eq!(err.cause().map(|c| c.kind()), Some(&ErrorKind::WriteError));

                assert_eq!(users.count_documents(all())?, 2);
                assert!(users.find_one(doc! { name: "Olena" })?.is_none());
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_one_duplicate_unique_field() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.driver()
                .create_unique_index(ctx.address(), ctx.database(), "users", "email")?;

            ctx.with_collection("users", |users| {
                users.insert_one(doc! { name: "Ivan", email: "ivan@example.com" })?;
                let err = users
                    .insert_one(doc! { name: "Ivan II", email: "ivan@example.com" })
                    .unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::WriteError);
                assert_eq!(err.operation(), Some("insert_one"));
                assert_eq!(
                    err.namespace().map(|ns| ns.to_string()),
                    Some(format!("{}.users", ctx.database()))
                );
                assert_eq!(users.count_documents(all())?, 1);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_one_rejects_malformed_id() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let mut document = doc! { name: "Ivan" };
                document.put("_id", "not-an-id")?;
                let err = users.insert_one(document).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
                assert_eq!(err.operation(), Some("insert_one"));

                let document = docstore::Document::from_json(r#"{"_id": 42, "name": "Ivan"}"#)?;
                let err = users.insert_many(vec![doc! { name: "Anna" }, document]).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);

                assert!(docstore::Document::from_json(r#"{"_id": "nope"}"#).is_err());
                assert_eq!(users.count_documents(all())?, 0);
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_keeps_nested_id_fields() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let document = docstore::Document::from_json(r#"{"name": "Ivan", "ref": {"_id": 7}}"#)?;
                let id = users.insert_one(document)?.inserted_id();

                let found = users.find_one(doc! { "ref._id": 7 })?;
                assert_eq!(found.and_then(|doc| doc.id()), Some(id));
                Ok(())
            })
        },
        cleanup,
    )
}

#[test]
fn test_insert_rejects_operator_field_names() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.with_collection("users", |users| {
                let err = users.insert_one(doc! { "$set": { age: 1 } }).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);

                let nested = doc! { name: "Ivan", address: { "$city": "Kyiv" } };
                let err = users.insert_one(nested).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);

                let in_array = doc! { name: "Anna", orders: [{ "$total": 10 }] };
                let err = users
                    .insert_many(vec![doc! { name: "Taras" }, in_array])
                    .unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
                assert_eq!(err.operation(), Some("insert_many"));

                let literal = doc! { name: "Olena", "price$": 10 };
                users.insert_one(literal)?;
                assert_eq!(users.count_documents(all())?, 1);
                Ok(())
            })
        },
        cleanup,
    )
}
