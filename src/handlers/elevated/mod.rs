// handlers/elevated/mod.rs - Elevated handlers (root JWT required)
//
// Platform operator endpoints spanning every tenant. Tokens carry the
// `root` claim when the account's email is listed in ROOT_EMAILS.

pub mod root;
