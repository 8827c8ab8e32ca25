//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::{handlers::*, middleware::admin_key_middleware};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>, enable_metrics: bool) -> Router {
    let admin = Router::new()
        .route("/api/admin/withdrawals", get(pending_withdrawals_handler))
        .route("/api/admin/withdrawals/:id/approve", post(approve_withdrawal_handler))
        .route("/api/admin/withdrawals/:id/paid", post(paid_withdrawal_handler))
        .route("/api/admin/withdrawals/:id/reject", post(reject_withdrawal_handler))
        .route_layer(from_fn_with_state(state.clone(), admin_key_middleware));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        // Users and balances
        .route("/api/users/sync", post(sync_user_handler))
        .route("/api/users/:telegram_id", get(get_user_handler))
        .route("/api/update-coins", post(update_coins_handler))
        // Timed draws
        .route("/api/draw/current", get(current_draw_handler))
        .route("/api/draw/:draw_id", get(draw_handler))
        .route("/api/lottery/tickets", post(buy_ticket_handler))
        .route("/api/lottery/claim", post(claim_ticket_handler))
        // Instant games
        .route("/api/wheel/spin", post(spin_wheel_handler))
        .route("/api/mystery-box/open", post(open_box_handler))
        .route("/api/mines/start", post(mines_start_handler))
        .route("/api/mines/reveal", post(mines_reveal_handler))
        .route("/api/mines/cashout", post(mines_cashout_handler))
        // Battle royale
        .route("/api/battle/join", post(join_battle_handler))
        .route("/api/battle/current", get(current_battle_handler))
        .route("/api/battle/process", post(process_battles_handler))
        // Withdrawals
        .route(
            "/api/withdrawals",
            post(request_withdrawal_handler).get(list_withdrawals_handler),
        )
        .route("/api/channel/check", post(check_channel_handler))
        .route("/api/stats/daily", get(daily_stats_handler))
        .merge(admin);

    if enable_metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.with_state(state)
}
