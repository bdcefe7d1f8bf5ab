use clap::{Parser, Subcommand};

const DEFAULT_ADDRESS: &str = "mongodb://127.0.0.1:27017/usersdb";
const DEFAULT_COLLECTION: &str = "users";

#[derive(Parser, Debug)]
#[command(name = "docstore-demo", version, about = "Runs docstore operations and prints their results as JSON.")]
pub struct Cli {
    /// Store address; its path names the database
    #[arg(long, global = true, default_value = DEFAULT_ADDRESS)]
    pub address: String,

    #[arg(long, global = true, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Pre-load the sample users before running the command
    #[arg(long, global = true, default_value_t = false)]
    pub seed: bool,

    /// Per-call timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inserts one document given as a JSON object
    InsertOne { document: String },

    /// Inserts the documents of a JSON array, in order
    InsertMany { documents: String },

    /// Prints every document matching a JSON filter
    Find {
        #[arg(default_value = "{}")]
        filter: String,
    },

    /// Prints the first document matching a JSON filter, or null
    FindOne {
        #[arg(default_value = "{}")]
        filter: String,
    },

    /// Updates the first document matching a filter
    UpdateOne {
        filter: String,
        update: String,
        #[arg(long, default_value_t = false)]
        upsert: bool,
    },

    /// Updates the first match and prints it
    FindOneAndUpdate {
        filter: String,
        update: String,
        /// Print the document after the update instead of before it
        #[arg(long, default_value_t = false)]
        return_updated: bool,
        #[arg(long, default_value_t = false)]
        upsert: bool,
    },

    /// Deletes every document matching a JSON filter
    DeleteMany { filter: String },

    /// Runs the users walkthrough from insert to delete
    Scenario,
}
