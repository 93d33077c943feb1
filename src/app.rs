use std::net::SocketAddr;
use axum::{http::HeaderMap, response::Response, Router, routing::get};
use tower_http::trace::TraceLayer;
use crate::state::AppState;
use crate::{auth, flash, users, views};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(users::router())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn index(headers: HeaderMap) -> Response {
    let pending = flash::Flash::pending(&headers);
    flash::page(pending, views::index_page(pending))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fakes::{FailingNotifier, RecordingNotifier};
    use crate::users::search::SearchCriteria;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
        app.clone().oneshot(req).await.expect("router is infallible")
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut b = Request::builder().method("GET").uri(uri);
        if let Some(c) = cookie {
            b = b.header(header::COOKIE, c);
        }
        b.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn location(res: &axum::response::Response) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// `name=value` pairs of every Set-Cookie, joined as a Cookie header.
    fn cookies_of(res: &axum::response::Response) -> String {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const ANA: &str = "name=Ana&email=ana%40x.com&password=p1&skill=tennis&location=Madrid";

    async fn login_cookie(app: &Router, email: &str, password: &str) -> String {
        let res = send(
            app,
            post_form("/iniciar_sesion", &format!("email={}&password={}", email, password)),
        )
        .await;
        assert_eq!(location(&res), "/perfil");
        cookies_of(&res)
    }

    #[tokio::test]
    async fn register_login_and_profile_end_to_end() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::fake(notifier.clone());
        let app = build_app(state.clone());

        let res = send(&app, post_form("/registrar", ANA)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");

        let rows = state.users.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "ana@x.com");
        assert_eq!(rows[0].verification_code.len(), 6);
        assert_ne!(rows[0].password_hash, "p1");

        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![("ana@x.com".to_string(), rows[0].verification_code.clone())]);

        let cookie = login_cookie(&app, "ana%40x.com", "p1").await;
        let res = send(&app, get("/perfil", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Ana"));
        assert!(html.contains("Logged in successfully"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_identically() {
        let app = build_app(AppState::fake(Arc::new(RecordingNotifier::default())));
        send(&app, post_form("/registrar", ANA)).await;

        let wrong = send(&app, post_form("/iniciar_sesion", "email=ana%40x.com&password=wrong")).await;
        let unknown = send(&app, post_form("/iniciar_sesion", "email=bob%40x.com&password=p1")).await;
        for res in [&wrong, &unknown] {
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(res), "/login");
        }
        assert_eq!(cookies_of(&wrong), cookies_of(&unknown));
        assert!(!cookies_of(&wrong).contains("rtf_session"));

        let html = body_text(send(&app, get("/login", Some(&cookies_of(&wrong)))).await).await;
        assert!(html.contains("Incorrect email or password"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let state = AppState::fake(Arc::new(RecordingNotifier::default()));
        let app = build_app(state.clone());
        send(&app, post_form("/registrar", ANA)).await;

        let res = send(
            &app,
            post_form("/registrar", "name=Other&email=ANA%40x.com&password=p2&skill=chess&location=Sevilla"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(state.users.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_field_is_a_validation_error() {
        let state = AppState::fake(Arc::new(RecordingNotifier::default()));
        let app = build_app(state.clone());
        let res = send(&app, post_form("/registrar", "name=Ana&email=ana%40x.com&password=p1")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(state.users.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_inline() {
        let state = AppState::fake(Arc::new(FailingNotifier));
        let app = build_app(state.clone());
        let res = send(&app, post_form("/registrar", ANA)).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_text(res).await, crate::error::DELIVERY_FAILED_TEXT);
        assert_eq!(state.users.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn protected_routes_redirect_to_login() {
        let app = build_app(AppState::fake(Arc::new(RecordingNotifier::default())));
        for uri in ["/buscar", "/buscar_rivales", "/perfil", "/logout", "/usuarios", "/eliminar/1"] {
            let res = send(&app, get(uri, None)).await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(location(&res), "/login", "{}", uri);
        }
        let res = send(&app, get("/perfil", Some("rtf_session=forged.token.value"))).await;
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let app = build_app(AppState::fake(Arc::new(RecordingNotifier::default())));
        send(&app, post_form("/registrar", ANA)).await;
        let cookie = login_cookie(&app, "ana%40x.com", "p1").await;

        let res = send(&app, get("/logout", Some(&cookie))).await;
        assert_eq!(location(&res), "/");

        let res = send(&app, get("/perfil", Some(&cookie))).await;
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn search_filters_by_query_criteria() {
        let state = AppState::fake(Arc::new(RecordingNotifier::default()));
        let app = build_app(state.clone());
        send(&app, post_form("/registrar", ANA)).await;
        send(
            &app,
            post_form("/registrar", "name=Bea&email=bea%40x.com&password=p&skill=chess&location=Madrid"),
        )
        .await;
        send(
            &app,
            post_form("/registrar", "name=Carla&email=carla%40x.com&password=p&skill=tennis&location=Sevilla&age=25&sport=padel"),
        )
        .await;
        let cookie = login_cookie(&app, "ana%40x.com", "p1").await;

        let html = body_text(send(&app, get("/buscar_rivales?location=Madrid", Some(&cookie))).await).await;
        assert!(html.contains("Ana") && html.contains("Bea") && !html.contains("Carla"));

        let html = body_text(
            send(&app, get("/buscar_rivales?location=Madrid&skill=tennis", Some(&cookie))).await,
        )
        .await;
        assert!(html.contains("ana@x.com") && !html.contains("bea@x.com"));

        let html = body_text(
            send(&app, get("/buscar_rivales?age=25&sport=padel&location=", Some(&cookie))).await,
        )
        .await;
        assert!(html.contains("carla@x.com") && !html.contains("ana@x.com"));

        let all = state.users.search(&SearchCriteria::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let res = send(&app, get("/buscar_rivales?age=abc", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_removes_user_and_reports_missing_ids() {
        let state = AppState::fake(Arc::new(RecordingNotifier::default()));
        let app = build_app(state.clone());
        send(&app, post_form("/registrar", ANA)).await;
        send(
            &app,
            post_form("/registrar", "name=Bea&email=bea%40x.com&password=p&skill=chess&location=Madrid"),
        )
        .await;
        let cookie = login_cookie(&app, "ana%40x.com", "p1").await;
        let bea = state.users.get_by_email("bea@x.com").await.unwrap();

        let res = send(&app, get(&format!("/eliminar/{}", bea.id), Some(&cookie))).await;
        assert_eq!(location(&res), "/usuarios");
        let html = body_text(send(&app, get("/usuarios", Some(&cookie))).await).await;
        assert!(!html.contains("bea@x.com"));
        assert!(html.contains("ana@x.com"));

        let res = send(&app, get("/eliminar/9999", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.users.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn public_pages_render() {
        let app = build_app(AppState::fake(Arc::new(RecordingNotifier::default())));
        for uri in ["/", "/register", "/login", "/health"] {
            let res = send(&app, get(uri, None)).await;
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn session_cookie_is_same_site_strict() {
        let app = build_app(AppState::fake(Arc::new(RecordingNotifier::default())));
        send(&app, post_form("/registrar", ANA)).await;
        let res = send(&app, post_form("/iniciar_sesion", "email=ana%40x.com&password=p1")).await;

        let session = res
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("rtf_session="))
            .expect("login sets the session cookie");
        assert!(session.contains("SameSite=Strict"), "{}", session);
        assert!(session.contains("Max-Age=300"), "{}", session);
    }

    #[tokio::test]
    async fn oversized_session_lifetime_fails_login_without_panicking() {
        let mut config = crate::state::fakes::config();
        config.session.ttl_minutes = 10_000_000_000_000;
        let state = AppState::from_parts(
            Arc::new(config),
            Arc::new(crate::users::memory::MemoryUserStore::default()),
            Arc::new(RecordingNotifier::default()),
        );
        let app = build_app(state);
        send(&app, post_form("/registrar", ANA)).await;

        let res = send(&app, post_form("/iniciar_sesion", "email=ana%40x.com&password=p1")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!cookies_of(&res).contains("rtf_session"));
    }
}
