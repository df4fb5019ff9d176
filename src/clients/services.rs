use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::dto::CreateClientRequest;
use crate::clients::repo_types::{ClientProfile, NewClient, ProfileUpdate};
use crate::error::{CoreError, CoreResult};
use crate::store::SharedStore;

/// The client, if it exists and belongs to `nutritionist_id`. Someone else's
/// client is reported as missing.
pub async fn owned_client(
    store: &SharedStore,
    nutritionist_id: Uuid,
    client_id: Uuid,
) -> CoreResult<ClientProfile> {
    match store.get_client(client_id).await? {
        Some(c) if c.nutritionist_id == nutritionist_id => Ok(c),
        Some(_) => {
            warn!(%nutritionist_id, %client_id, "client owned by another nutritionist");
            Err(CoreError::Missing("client"))
        }
        None => Err(CoreError::Missing("client")),
    }
}

pub async fn create_client(
    store: &SharedStore,
    nutritionist_id: Uuid,
    req: CreateClientRequest,
    email: String,
    password_hash: String,
) -> CoreResult<ClientProfile> {
    let activity = req.activity_level();
    let client = store
        .create_client(NewClient {
            nutritionist_id,
            name: req.name.trim().to_string(),
            email,
            password_hash,
            age: req.age,
            sex: req.sex,
            weight_kg: req.weight_kg,
            height_cm: req.height_cm,
            activity,
            goal: req.goal,
        })
        .await?;
    info!(%nutritionist_id, client_id = %client.id, "client created");
    Ok(client)
}

pub async fn update_owned_client(
    store: &SharedStore,
    nutritionist_id: Uuid,
    client_id: Uuid,
    update: &ProfileUpdate,
) -> CoreResult<ClientProfile> {
    owned_client(store, nutritionist_id, client_id).await?;
    store.update_client(client_id, update).await
}

pub async fn delete_owned_client(
    store: &SharedStore,
    nutritionist_id: Uuid,
    client_id: Uuid,
) -> CoreResult<()> {
    owned_client(store, nutritionist_id, client_id).await?;
    store.delete_client(client_id).await?;
    info!(%nutritionist_id, %client_id, "client deleted");
    Ok(())
}
