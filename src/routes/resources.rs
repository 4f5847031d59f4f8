//! Resource routers. Each one is mounted at its collection path; `/` is the collection, `/:id` one record.

use crate::handlers::{clients, records};
use crate::model::{Contact, Contract, Partner, Resource};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn client_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(clients::list).post(clients::create))
        .route(
            "/:id",
            get(clients::read).put(clients::replace).delete(clients::delete),
        )
        .with_state(state)
}

pub fn resource_routes<R: Resource>(state: AppState) -> Router {
    Router::new()
        .route("/", get(records::list::<R>).post(records::create::<R>))
        .route(
            "/:id",
            get(records::read::<R>)
                .put(records::replace::<R>)
                .delete(records::delete::<R>),
        )
        .with_state(state)
}

/// Every collection, relative to the API prefix.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/clients", client_routes(state.clone()))
        .nest("/contacts", resource_routes::<Contact>(state.clone()))
        .nest("/contracts", resource_routes::<Contract>(state.clone()))
        .nest("/partners", resource_routes::<Partner>(state))
}
