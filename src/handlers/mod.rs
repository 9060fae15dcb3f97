// handlers/mod.rs - three access tiers
//
// Public (no auth) → Protected (JWT + active tenant) → Elevated (root JWT)
pub mod elevated;
pub mod protected;
pub mod public;
