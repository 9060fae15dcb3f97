// handlers/elevated/root/tenant/mod.rs - Tenant registry management

pub mod list;   // GET /root/tenants
pub mod status; // PUT /root/tenants/:id/status

pub use list::list;
pub use status::update_status;
