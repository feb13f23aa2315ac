//! Permflow REST API
//!
//! Thin HTTP layer over the store. Authentication is a bearer token from
//! `POST /auth/login`; every response is wrapped in the same envelope with
//! `success`, `data` and `error` fields.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::account::{self, Account, AccountPage, AccountUpdate, NewAccount};
use crate::error::PermError;
use crate::flags::Role;
use crate::graph::DependencyGraph;
use crate::resolver::WorkflowCompliance;
use crate::service::{PermissionService, RolePermissions};
use crate::session;
use crate::set::PermissionSet;
use crate::store::Store;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct BootstrapReq {
    email: String,
    name: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginReq {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginRes {
    token: String,
    account: Account,
}

#[derive(Deserialize)]
struct UpdatePermissionsReq {
    role: Role,
    permissions: PermissionSet,
}

#[derive(Serialize)]
struct MyPermissionsRes {
    role: Role,
    permissions: PermissionSet,
    compliance: WorkflowCompliance,
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

fn fail<T>(status: StatusCode, e: PermError) -> Reply<T> {
    (status, Json(ApiResponse::err(e.0)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Pull the account behind the request's bearer token
fn authenticate(store: &Store, headers: &HeaderMap) -> crate::error::Result<Account> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| PermError("Missing bearer token".into()))?;
    session::authenticate(store, token)
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("ok"))
}

async fn post_bootstrap(
    State(store): State<Arc<Store>>,
    Json(req): Json<BootstrapReq>,
) -> Reply<LoginRes> {
    match session::bootstrap_admin(&store, &req.email, &req.name, &req.password) {
        Ok(boot) => ok(LoginRes { token: boot.token, account: boot.admin }),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

async fn post_login(
    State(store): State<Arc<Store>>,
    Json(req): Json<LoginReq>,
) -> Reply<LoginRes> {
    match session::login(&store, &req.email, &req.password, None) {
        Ok((account, token)) => ok(LoginRes { token, account }),
        Err(e) => fail(StatusCode::UNAUTHORIZED, e),
    }
}

async fn post_logout(State(store): State<Arc<Store>>, headers: HeaderMap) -> Reply<bool> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(token) => match session::revoke_session(&store, token) {
            Ok(revoked) => ok(revoked),
            Err(e) => fail(StatusCode::BAD_REQUEST, e),
        },
        None => fail(StatusCode::UNAUTHORIZED, PermError("Missing bearer token".into())),
    }
}

async fn get_me(State(store): State<Arc<Store>>, headers: HeaderMap) -> Reply<Account> {
    match authenticate(&store, &headers) {
        Ok(account) => ok(account),
        Err(e) => fail(StatusCode::UNAUTHORIZED, e),
    }
}

async fn get_role_permissions(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Path(role): Path<Role>,
) -> Reply<RolePermissions> {
    if let Err(e) = authenticate(&store, &headers) {
        return fail(StatusCode::UNAUTHORIZED, e);
    }
    match store.fetch(role) {
        Ok(permissions) => ok(RolePermissions { role, permissions }),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn post_update_permissions(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Json(req): Json<UpdatePermissionsReq>,
) -> Reply<RolePermissions> {
    let actor = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    if let Err(e) = account::require_manager(&actor) {
        return fail(StatusCode::FORBIDDEN, e);
    }
    if let Err(e) = DependencyGraph::workflow().check(req.permissions) {
        return fail(StatusCode::BAD_REQUEST, e);
    }
    match store.update(req.role, req.permissions) {
        Ok(permissions) => ok(RolePermissions { role: req.role, permissions }),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn get_my_permissions(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
) -> Reply<MyPermissionsRes> {
    let account = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    let role = account.role.permission_role();
    match store.fetch(role) {
        Ok(permissions) => ok(MyPermissionsRes {
            role,
            permissions,
            compliance: WorkflowCompliance::of(permissions),
        }),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn post_user(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Json(req): Json<NewAccount>,
) -> Reply<Account> {
    let actor = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    if let Err(e) = account::require_manager(&actor) {
        return fail(StatusCode::FORBIDDEN, e);
    }
    match account::register(&store, &actor, &req) {
        Ok(created) => ok(created),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

async fn get_users(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Reply<AccountPage> {
    let actor = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    if let Err(e) = account::require_manager(&actor) {
        return fail(StatusCode::FORBIDDEN, e);
    }
    match account::list(&store, &actor, q.page.unwrap_or(1), q.limit.unwrap_or(10)) {
        Ok(page) => ok(page),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

async fn get_user(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply<Account> {
    let actor = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    if let Err(e) = account::require_manager(&actor) {
        return fail(StatusCode::FORBIDDEN, e);
    }
    match account::get(&store, &actor, &id) {
        Ok(found) => ok(found),
        Err(e) => fail(StatusCode::NOT_FOUND, e),
    }
}

async fn patch_user(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AccountUpdate>,
) -> Reply<Account> {
    let actor = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    if let Err(e) = account::require_manager(&actor) {
        return fail(StatusCode::FORBIDDEN, e);
    }
    match account::update(&store, &actor, &id, &req) {
        Ok(updated) => ok(updated),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

async fn delete_user(
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply<bool> {
    let actor = match authenticate(&store, &headers) {
        Ok(account) => account,
        Err(e) => return fail(StatusCode::UNAUTHORIZED, e),
    };
    if let Err(e) = account::require_manager(&actor) {
        return fail(StatusCode::FORBIDDEN, e);
    }
    match account::remove(&store, &actor, &id) {
        Ok(()) => ok(true),
        Err(e) => fail(StatusCode::BAD_REQUEST, e),
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the router over a shared store
pub fn app(store: Arc<Store>) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/bootstrap", post(post_bootstrap))
        .route("/auth/login", post(post_login))
        .route("/auth/logout", post(post_logout))
        .route("/auth/me", get(get_me))
        .route("/auth/permissions/me", get(get_my_permissions))
        .route("/auth/permissions/update", post(post_update_permissions))
        .route("/auth/permissions/:role", get(get_role_permissions))
        .route("/auth/users", get(get_users).post(post_user))
        .route("/auth/users/:id", get(get_user).patch(patch_user).delete(delete_user))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
