use docstore::collection::UpdateOptions;
use docstore::doc;
use docstore::errors::StoreResult;
use docstore::filter::{all, field};
use docstore_int_test::test_util::{cleanup, create_test_context, random_users};

fn main() -> StoreResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;

    let count = 100_000;
    let batch = 1_000;

    ctx.with_collection("stress", |records| {
        let start = std::time::Instant::now();
        for _ in 0..count / batch {
            records.insert_many(random_users(batch))?;
        }
        println!("Inserted {} records in {:?}", count, start.elapsed());

        let start = std::time::Instant::now();
        let result = records.update_many(
            all(),
            doc! { "$set": { processed: true } },
            UpdateOptions::default(),
        )?;
        println!(
            "Updated {} records in {:?}",
            result.modified_count(),
            start.elapsed()
        );

        let start = std::time::Instant::now();
        let processed = records.count_documents(field("processed").eq(true))?;
        println!("Counted {} processed records in {:?}", processed, start.elapsed());

        let start = std::time::Instant::now();
        let deleted = records.delete_many(all())?.deleted_count();
        println!("Deleted {} records in {:?}", deleted, start.elapsed());
        Ok(())
    })?;

    cleanup(ctx)
}
