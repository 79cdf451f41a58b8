//! Route role declarations and the middleware that enforces them
//!
//! Every route is registered through a [`RouteScope`]. The scope carries
//! the group-level declaration; a route may override it with its own.
//! The resolved set is fixed at router construction.

use crate::auth::{Access, AccessGuard, RoleSet};
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use tracing::debug;

/// Pick the most specific non-empty declaration: handler first, then group.
pub fn resolve_roles<'a>(
    handler: Option<&'a RoleSet>,
    group: Option<&'a RoleSet>,
) -> Option<&'a RoleSet> {
    handler
        .filter(|roles| !roles.is_empty())
        .or_else(|| group.filter(|roles| !roles.is_empty()))
}

/// A resource group's guard and default role declaration
#[derive(Clone)]
pub struct RouteScope {
    guard: AccessGuard,
    roles: Option<RoleSet>,
}

impl RouteScope {
    /// Group whose routes are open unless they declare roles themselves
    pub fn open(guard: AccessGuard) -> Self {
        Self { guard, roles: None }
    }

    /// Group whose routes require `roles` unless they declare their own
    pub fn restricted(guard: AccessGuard, roles: RoleSet) -> Self {
        Self {
            guard,
            roles: Some(roles),
        }
    }

    /// Register a route under the group declaration
    pub fn route<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.declare(None, route)
    }

    /// Register a route with its own declaration
    pub fn route_with<S>(&self, roles: RoleSet, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.declare(Some(roles), route)
    }

    fn declare<S>(&self, handler: Option<RoleSet>, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let access = RouteAccess {
            guard: self.guard.clone(),
            roles: resolve_roles(handler.as_ref(), self.roles.as_ref()).cloned(),
        };
        route.route_layer(from_fn_with_state(access, enforce_roles))
    }
}

#[derive(Clone)]
struct RouteAccess {
    guard: AccessGuard,
    roles: Option<RoleSet>,
}

/// Evaluate the route's declaration and publish the principal
async fn enforce_roles(
    State(access): State<RouteAccess>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let outcome = access
        .guard
        .evaluate(access.roles.as_ref(), request.headers())
        .await;

    request.extensions_mut().insert(outcome.principal());

    match outcome {
        Access::Denied(reason) => {
            debug!(
                method = %request.method(),
                path = %request.uri().path(),
                %reason,
                "Request denied"
            );
            Err(AppError::Unauthorized)
        }
        Access::Open | Access::Granted(_) => Ok(next.run(request).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, Role, TokenService};
    use crate::users::MemoryCredentials;
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Method, Request as HttpRequest, StatusCode},
        routing::get,
        Extension, Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[test]
    fn handler_declaration_wins() {
        let handler = RoleSet::of([Role::Buyer]);
        let group = RoleSet::of([Role::Admin]);
        assert_eq!(resolve_roles(Some(&handler), Some(&group)), Some(&handler));
    }

    #[test]
    fn group_declaration_is_fallback() {
        let group = RoleSet::of([Role::Admin]);
        assert_eq!(resolve_roles(None, Some(&group)), Some(&group));
        assert_eq!(
            resolve_roles(Some(&RoleSet::default()), Some(&group)),
            Some(&group)
        );
    }

    #[test]
    fn no_declaration_means_open() {
        assert_eq!(resolve_roles(None, None), None);
        assert_eq!(
            resolve_roles(Some(&RoleSet::default()), Some(&RoleSet::default())),
            None
        );
    }

    async fn whoami(Extension(principal): Extension<Principal>) -> String {
        match principal.user() {
            Some(user) => format!("user:{}", user.id),
            None => "anonymous".to_string(),
        }
    }

    struct Fixture {
        router: Router,
        tokens: Arc<TokenService>,
        store: Arc<MemoryCredentials>,
    }

    fn setup(ttl: i64) -> Fixture {
        let tokens = Arc::new(TokenService::new("middleware-secret", ttl).unwrap());
        let store = Arc::new(MemoryCredentials::new());
        store.insert(MemoryCredentials::user(1, Role::Buyer));
        store.insert(MemoryCredentials::user(7, Role::Admin));
        let guard = AccessGuard::new(tokens.clone(), store.clone());

        let open = RouteScope::open(guard.clone());
        let admin = RouteScope::restricted(guard, RoleSet::of([Role::Admin]));

        let router = Router::new()
            .route("/public", open.route(get(whoami)))
            .route("/admin", admin.route(get(whoami)))
            .route(
                "/admin/buyers-only",
                admin.route_with(RoleSet::of([Role::Buyer]), get(whoami)),
            );
        Fixture {
            router,
            tokens,
            store,
        }
    }

    async fn call(router: Router, path: &str, token: Option<&str>) -> (StatusCode, String) {
        send(router, Method::GET, path, token).await
    }

    async fn send(
        router: Router,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn open_route_without_header_is_anonymous() {
        let f = setup(3600);
        let (status, body) = call(f.router, "/public", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn open_route_ignores_bad_token() {
        let f = setup(3600);
        let (status, body) = call(f.router, "/public", Some("not-a-token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn admin_reaches_admin_route() {
        let f = setup(3600);
        let token = f.tokens.issue(7, "Admin").unwrap();
        let (status, body) = call(f.router, "/admin", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user:7");
    }

    #[tokio::test]
    async fn denials_share_one_response() {
        let f = setup(3600);
        let buyer = f.tokens.issue(1, "Buyer").unwrap();
        let ghost = f.tokens.issue(42, "Ghost").unwrap();
        let admin = f.tokens.issue(7, "Admin").unwrap();

        let (_, expected) = call(f.router.clone(), "/admin", None).await;
        for token in [Some(buyer.as_str()), Some(ghost.as_str()), Some("junk")] {
            let (status, body) = call(f.router.clone(), "/admin", token).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, expected);
        }

        // A store outage looks exactly like any other denial
        f.store.set_unavailable(true);
        let (status, body) = call(f.router.clone(), "/admin", Some(&admin)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn wrong_method_is_not_guarded() {
        let f = setup(3600);
        let admin = f.tokens.issue(7, "Admin").unwrap();

        let (status, _) = send(f.router.clone(), Method::POST, "/admin", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(f.router.clone(), Method::DELETE, "/admin", Some(&admin)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(f.store.lookups(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let f = setup(-1);
        let token = f.tokens.issue(7, "Admin").unwrap();
        let (status, _) = call(f.router, "/admin", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn handler_override_replaces_group_roles() {
        let f = setup(3600);
        let buyer = f.tokens.issue(1, "Buyer").unwrap();
        let admin = f.tokens.issue(7, "Admin").unwrap();

        let (status, body) = call(f.router.clone(), "/admin/buyers-only", Some(&buyer)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user:1");

        let (status, _) = call(f.router, "/admin/buyers-only", Some(&admin)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
