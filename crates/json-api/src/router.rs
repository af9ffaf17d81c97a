//! App Router

use salvo::Router;

use portal_app::domain::api_keys::credentials::Scope;

use crate::{
    auth::{PortalAuth, TenantAuth},
    interventions, portal, submissions, subscription, tokens, webhooks,
};

/// Tenant-facing API, authenticated with an API key.
fn tenant_router() -> Router {
    Router::with_path("v1")
        .push(
            Router::with_path("tokens")
                .hoop(TenantAuth::scoped(Scope::TokensWrite))
                .post(tokens::create::handler),
        )
        .push(
            Router::with_path("submissions")
                .hoop(TenantAuth::scoped(Scope::SubmissionsRead))
                .get(submissions::index::handler)
                .push(Router::with_path("mark-synced").post(submissions::mark_synced::handler)),
        )
        .push(
            Router::new()
                .hoop(TenantAuth::new())
                .push(Router::with_path("subscription/status").get(subscription::status::handler))
                .push(
                    Router::with_path("interventions/{intervention_id}/report")
                        .get(interventions::report::handler),
                ),
        )
        .push(Router::with_path("tokens/{token}/validate").get(tokens::validate::handler))
        .push(Router::with_path("webhooks/billing").post(webhooks::billing::handler))
}

/// Artisan portal, authenticated with a portal token.
fn portal_router() -> Router {
    Router::with_path("portal")
        .hoop(portal::upload_limit)
        .hoop(PortalAuth::any())
        .push(Router::with_path("session").get(portal::session::handler))
        .push(
            Router::with_path("photos")
                .get(portal::photos::index::handler)
                .post(portal::photos::create::handler)
                .push(
                    Router::with_path("{photo_id}")
                        .patch(portal::photos::update::handler)
                        .delete(portal::photos::delete::handler),
                ),
        )
        .push(
            Router::with_path("documents")
                .get(portal::documents::index::handler)
                .post(portal::documents::create::handler),
        )
        .push(
            Router::with_path("report")
                .get(portal::report::get::handler)
                .post(portal::report::generate::handler)
                .push(Router::with_path("submit").post(portal::report::submit::handler)),
        )
        .push(crm_router())
}

fn crm_router() -> Router {
    Router::with_path("crm")
        .push(
            Router::with_path("interventions")
                .get(portal::crm::interventions::index)
                .push(
                    Router::with_path("{intervention_id}")
                        .get(portal::crm::interventions::show)
                        .push(
                            Router::with_path("documents")
                                .get(portal::crm::interventions::documents),
                        )
                        .push(
                            Router::with_path("report")
                                .get(portal::crm::interventions::report)
                                .post(portal::crm::interventions::submit_report),
                        ),
                ),
        )
        .push(
            Router::with_path("documents")
                .get(portal::crm::documents::index)
                .post(portal::crm::documents::create),
        )
}

pub(crate) fn app_router() -> Router {
    Router::new().push(tenant_router()).push(portal_router())
}
