//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod budgets;
pub mod documents;
pub mod grants;
pub mod health;
pub mod imports;
pub mod payments;
pub mod tasks;
pub mod templates;

#[cfg(test)]
mod tests;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(grants::routes())
        .merge(budgets::routes())
        .merge(imports::routes())
        .merge(payments::routes())
        .merge(documents::routes())
        .merge(tasks::routes())
        .merge(templates::routes())
}
