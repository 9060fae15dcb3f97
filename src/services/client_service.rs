use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::database::models::{Client, ClientInput};
use crate::database::ClientStore;
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::TenantContext;

#[derive(Clone)]
pub struct ClientService {
    clients: Arc<dyn ClientStore>,
}

impl ClientService {
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    pub async fn create_client(&self, ctx: &TenantContext, input: ClientInput) -> ServiceResult<Client> {
        let input = normalize(input)?;
        let client = self.clients.insert_client(ctx.tenant_id, input, ctx.user_id).await?;
        info!("Created client {} in tenant {}", client.id, ctx.tenant_id);
        Ok(client)
    }

    pub async fn list_clients(&self, ctx: &TenantContext) -> ServiceResult<Vec<Client>> {
        Ok(self.clients.list_clients(ctx.tenant_id).await?)
    }

    pub async fn get_client(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<Client> {
        self.clients
            .get_client(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Client not found"))
    }

    pub async fn update_client(&self, ctx: &TenantContext, id: Uuid, input: ClientInput) -> ServiceResult<Client> {
        let input = normalize(input)?;
        Ok(self.clients.update_client(ctx.tenant_id, id, input, ctx.user_id).await?)
    }

    pub async fn delete_client(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<()> {
        self.clients.delete_client(ctx.tenant_id, id).await?;
        info!("Deleted client {}", id);
        Ok(())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize(input: ClientInput) -> ServiceResult<ClientInput> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::validation("Client name is required"));
    }

    let email = optional(input.email);
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(ServiceError::validation("Invalid email address"));
        }
    }

    Ok(ClientInput {
        name,
        email,
        phone: optional(input.phone),
        address: optional(input.address),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDatabase;

    fn ctx() -> TenantContext {
        TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "p@clinic.test", "practitioner")
    }

    #[tokio::test]
    async fn create_trims_and_records_author() {
        let service = ClientService::new(Arc::new(MemoryDatabase::new()));
        let ctx = ctx();

        let client = service
            .create_client(
                &ctx,
                ClientInput {
                    name: "  Jordan Lee ".into(),
                    email: Some(" ".into()),
                    phone: Some("555-0100".into()),
                    address: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(client.name, "Jordan Lee");
        assert!(client.email.is_none());
        assert_eq!(client.created_by, ctx.user_id);
        assert_eq!(client.tenant_id, ctx.tenant_id);
    }

    #[tokio::test]
    async fn rejects_missing_name_and_bad_email() {
        let service = ClientService::new(Arc::new(MemoryDatabase::new()));
        let ctx = ctx();

        let nameless = ClientInput::default();
        assert!(matches!(service.create_client(&ctx, nameless).await, Err(ServiceError::Validation(_))));

        let bad_email = ClientInput {
            name: "Sam".into(),
            email: Some("sam.example.com".into()),
            ..Default::default()
        };
        assert!(matches!(service.create_client(&ctx, bad_email).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn clients_are_listed_by_name_within_tenant() {
        let service = ClientService::new(Arc::new(MemoryDatabase::new()));
        let ctx = ctx();
        for name in ["Rowan", "Alex"] {
            service
                .create_client(&ctx, ClientInput { name: name.into(), ..Default::default() })
                .await
                .unwrap();
        }

        let names: Vec<String> = service.list_clients(&ctx).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alex", "Rowan"]);
        let other_tenant = TenantContext::new(Uuid::new_v4(), ctx.user_id, "p@clinic.test", "practitioner");
        assert!(service.list_clients(&other_tenant).await.unwrap().is_empty());
    }
}
