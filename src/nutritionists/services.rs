use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::services::{is_valid_email, normalize_email, AuthError, MIN_PASSWORD_LEN};
use crate::error::{CoreError, CoreResult};
use crate::nutritionists::dto::UpdateProfileRequest;
use crate::nutritionists::repo_types::{BotConfig, Nutritionist, NutritionistUpdate};
use crate::store::SharedStore;

pub async fn profile(store: &SharedStore, id: Uuid) -> CoreResult<Nutritionist> {
    store
        .get_nutritionist(id)
        .await?
        .ok_or(CoreError::Missing("nutritionist"))
}

/// Name and e-mail are replaced; a non-blank password is re-hashed.
pub async fn update_profile(
    store: &SharedStore,
    id: Uuid,
    req: UpdateProfileRequest,
) -> Result<Nutritionist, AuthError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("name must be non-empty".into()).into());
    }
    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) if p.len() < MIN_PASSWORD_LEN => return Err(AuthError::WeakPassword),
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let changed_password = password_hash.is_some();

    let n = store
        .update_nutritionist(
            id,
            &NutritionistUpdate {
                name,
                email,
                password_hash,
            },
        )
        .await?;
    info!(nutritionist_id = %n.id, changed_password, "nutritionist profile updated");
    Ok(n)
}

pub async fn bot_config(store: &SharedStore, nutritionist_id: Uuid) -> CoreResult<BotConfig> {
    store
        .get_bot_config(nutritionist_id)
        .await?
        .ok_or(CoreError::Missing("nutritionist"))
}

pub async fn save_bot_config(
    store: &SharedStore,
    nutritionist_id: Uuid,
    config: BotConfig,
) -> CoreResult<BotConfig> {
    let saved = store.update_bot_config(nutritionist_id, &config).await?;
    info!(%nutritionist_id, "bot config saved");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::password::verify_password;
    use crate::nutritionists::repo_types::NewNutritionist;
    use crate::store::MemoryStore;

    async fn seeded() -> (SharedStore, Nutritionist) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let n = store
            .create_nutritionist(NewNutritionist {
                name: "Ana".into(),
                email: "ana@x.com".into(),
                password_hash: hash_password("senha-antiga").unwrap(),
            })
            .await
            .unwrap();
        (store, n)
    }

    fn request(name: &str, email: &str, password: Option<&str>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: name.into(),
            email: email.into(),
            password: password.map(Into::into),
        }
    }

    #[tokio::test]
    async fn blank_password_keeps_the_old_one() {
        let (store, n) = seeded().await;
        let updated = update_profile(&store, n.id, request(" Ana Souza ", "ANA@x.com", Some("")))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana Souza");
        assert_eq!(updated.email, "ana@x.com");
        assert!(verify_password("senha-antiga", &updated.password_hash).unwrap());
    }

    #[tokio::test]
    async fn new_password_is_hashed() {
        let (store, n) = seeded().await;
        let updated = update_profile(&store, n.id, request("Ana", "ana@x.com", Some("senha-nova-1")))
            .await
            .unwrap();
        assert!(verify_password("senha-nova-1", &updated.password_hash).unwrap());
        assert!(!verify_password("senha-antiga", &updated.password_hash).unwrap());
    }

    #[tokio::test]
    async fn rejects_bad_input_and_taken_email() {
        let (store, n) = seeded().await;
        store
            .create_nutritionist(NewNutritionist {
                name: "Bia".into(),
                email: "bia@x.com".into(),
                password_hash: "h".into(),
            })
            .await
            .unwrap();

        let taken = update_profile(&store, n.id, request("Ana", "bia@x.com", None)).await;
        assert!(matches!(taken, Err(AuthError::EmailTaken)));
        let email = update_profile(&store, n.id, request("Ana", "sem-arroba", None)).await;
        assert!(matches!(email, Err(AuthError::InvalidEmail)));
        let weak = update_profile(&store, n.id, request("Ana", "ana@x.com", Some("curta"))).await;
        assert!(matches!(weak, Err(AuthError::WeakPassword)));
        let name = update_profile(&store, n.id, request("  ", "ana@x.com", None)).await;
        assert!(matches!(
            name,
            Err(AuthError::Store(CoreError::InvalidInput(_)))
        ));
    }

    #[tokio::test]
    async fn bot_config_round_trip() {
        let (store, n) = seeded().await;
        assert_eq!(bot_config(&store, n.id).await.unwrap(), BotConfig::default());
        let cfg = BotConfig {
            persona: Some("Direta e acolhedora".into()),
            restrictions: None,
            color: Some("#ff9800".into()),
        };
        save_bot_config(&store, n.id, cfg.clone()).await.unwrap();
        assert_eq!(bot_config(&store, n.id).await.unwrap(), cfg);
        assert!(matches!(
            bot_config(&store, Uuid::new_v4()).await,
            Err(CoreError::Missing(_))
        ));
    }
}
