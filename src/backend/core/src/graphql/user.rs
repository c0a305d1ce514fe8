//! User queries and mutations.

use async_graphql::{Context, MaybeUndefined, Object, ResultExt};

use super::{db, principal};
use crate::db::users::{NewUser, UserChanges, UserFilter};
use crate::db::{AuthProvider, Gender, Page, UnitPreference, UserRow};
use crate::rbac::{resources, PermissionAction, RequirePermission};

type Result<T> = async_graphql::Result<T>;

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::View)")]
    async fn user(&self, ctx: &Context<'_>, id: i32) -> Result<Option<UserRow>> {
        db(ctx)?.user(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::View)")]
    async fn users(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 10)] take: i32,
        username: Option<String>,
        email: Option<String>,
    ) -> Result<Vec<UserRow>> {
        let filter = UserFilter { username, email };
        db(ctx)?.users(&filter, Page::new(skip, take)).await.extend()
    }

    /// The calling principal, if it maps to a user.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<UserRow>> {
        match principal(ctx).and_then(|p| p.user_id) {
            Some(id) => db(ctx)?.user(id).await.extend(),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::Create)")]
    #[allow(clippy::too_many_arguments)]
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        email: String,
        auth_provider: AuthProvider,
        auth_provider_id: Option<String>,
        preferred_units: UnitPreference,
        profile_picture_url: Option<String>,
        gender: Option<Gender>,
        age: Option<i32>,
        height: Option<f64>,
        weight: Option<f64>,
    ) -> Result<UserRow> {
        let user = NewUser {
            username,
            email,
            auth_provider,
            auth_provider_id,
            preferred_units,
            profile_picture_url,
            gender,
            age,
            height,
            weight,
        };
        db(ctx)?.create_user(user).await.extend()
    }

    /// Update the supplied fields; `updatedAt` always moves.
    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::Edit)")]
    #[allow(clippy::too_many_arguments)]
    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        profile_picture_url: MaybeUndefined<String>,
        preferred_units: Option<UnitPreference>,
        notifications_enabled: Option<bool>,
        gender: MaybeUndefined<Gender>,
        age: MaybeUndefined<i32>,
        height: MaybeUndefined<f64>,
        weight: MaybeUndefined<f64>,
    ) -> Result<UserRow> {
        let changes = UserChanges {
            username: username.into(),
            email: email.into(),
            profile_picture_url: profile_picture_url.into(),
            preferred_units: preferred_units.into(),
            notifications_enabled: notifications_enabled.into(),
            gender: gender.into(),
            age: age.into(),
            height: height.into(),
            weight: weight.into(),
        };
        db(ctx)?.update_user(id, changes).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::Delete)")]
    async fn delete_user(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        db(ctx)?.delete_user(id).await.extend()
    }
}
