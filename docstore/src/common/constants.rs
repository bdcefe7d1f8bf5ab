// doc constants
pub const DOC_ID: &str = "_id";
pub const FIELD_SEPARATOR: &str = ".";

// update operators
pub const OP_SET: &str = "$set";
pub const OP_UNSET: &str = "$unset";
pub const OP_INC: &str = "$inc";
pub const UPDATE_OPERATORS: [&str; 3] = [OP_SET, OP_UNSET, OP_INC];

// connection defaults
pub const DEFAULT_PORT: u16 = 27017;

// characters a database or collection name cannot contain
pub const INVALID_NAME_CHARS: [char; 3] = ['.', '$', '\0'];
