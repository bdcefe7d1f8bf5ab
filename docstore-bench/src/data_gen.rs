//! Data generators for benchmarks

use docstore::collection::Document;
use docstore::doc;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;

/// Generate simple user documents; `id` is the position in the batch
pub fn generate_simple_docs(count: usize) -> Vec<Document> {
    (0..count).map(generate_single_doc).collect()
}

pub fn generate_single_doc(i: usize) -> Document {
    let mut rng = rand::thread_rng();
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let email: String = FreeEmail().fake();
    let company: String = CompanyName().fake();
    let age: i64 = rng.gen_range(18..80);
    let salary: f64 = rng.gen_range(30000.0..200000.0);

    doc! {
        id: (i as i64),
        firstName: (first_name),
        lastName: (last_name),
        email: (email),
        company: (company),
        age: (age),
        salary: (salary),
        active: (rng.gen_bool(0.8)),
        address: { city: "Kyiv", zip: (format!("{:05}", i % 100_000)) }
    }
}
