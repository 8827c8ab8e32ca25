//! Request Handlers
//!
//! Thin adapters from HTTP to [`CasinoService`]: extract, call, map errors.

use super::{
    errors::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::RequestId,
    models::*,
};
use crate::{
    ledger::CoinUpdate,
    services::{
        BattleJoin, BattleStatus, BoxResult, CasinoService, ChannelCheck, CurrentDraw, DrawResult,
        MinesCashout, MinesReveal, MinesStart, SyncUser, TicketClaimResult, TicketReceipt,
        WheelResult,
    },
    store::{DailyStats, User, Withdrawal},
};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub service: Arc<CasinoService>,
    pub version: String,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn respond<T>(request_id: RequestId, result: crate::errors::CasinoResult<T>) -> ApiResult<T> {
    result
        .map(Json)
        .map_err(|e| ApiError::from_casino(request_id.0, e))
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.service.metrics().render(),
    )
}

/// POST /api/users/sync
pub async fn sync_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SyncUser>,
) -> ApiResult<User> {
    respond(request_id, state.service.sync_user(body))
}

/// GET /api/users/:telegram_id
pub async fn get_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiPath(telegram_id): ApiPath<i64>,
) -> ApiResult<User> {
    respond(request_id, state.service.get_user(telegram_id))
}

/// POST /api/update-coins
pub async fn update_coins_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<UpdateCoinsRequest>,
) -> ApiResult<UpdateCoinsResponse> {
    let result = state
        .service
        .update_coins(body.telegram_id, body.amount, body.source, body.update_stats)
        .map(|update: CoinUpdate| UpdateCoinsResponse {
            success: true,
            new_coins: update.new_coins,
            new_total_winnings: update.new_total_winnings,
        });
    respond(request_id, result)
}

/// GET /api/draw/current?game=lottery|battle
pub async fn current_draw_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DrawQuery>,
) -> ApiResult<CurrentDraw> {
    respond(request_id, state.service.current_draw(query.game))
}

/// GET /api/draw/:draw_id
pub async fn draw_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiPath(draw_id): ApiPath<String>,
) -> ApiResult<DrawResult> {
    respond(request_id, state.service.draw_by_id(&draw_id))
}

/// POST /api/lottery/tickets
pub async fn buy_ticket_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<BuyTicketRequest>,
) -> ApiResult<TicketReceipt> {
    respond(request_id, state.service.buy_ticket(body.telegram_id, &body.numbers))
}

/// POST /api/lottery/claim
pub async fn claim_ticket_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ClaimTicketRequest>,
) -> ApiResult<TicketClaimResult> {
    respond(request_id, state.service.claim_ticket(body.telegram_id, &body.draw_id))
}

/// POST /api/wheel/spin
pub async fn spin_wheel_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<PlayerRequest>,
) -> ApiResult<WheelResult> {
    respond(request_id, state.service.spin_wheel(body.telegram_id))
}

/// POST /api/mystery-box/open
pub async fn open_box_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<PlayerRequest>,
) -> ApiResult<BoxResult> {
    respond(request_id, state.service.open_box(body.telegram_id))
}

/// POST /api/mines/start
pub async fn mines_start_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<MinesStartRequest>,
) -> ApiResult<MinesStart> {
    respond(
        request_id,
        state.service.mines_start(body.telegram_id, body.bet, body.bombs),
    )
}

/// POST /api/mines/reveal
pub async fn mines_reveal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<MinesRevealRequest>,
) -> ApiResult<MinesReveal> {
    respond(request_id, state.service.mines_reveal(&body.session_id, body.cell))
}

/// POST /api/mines/cashout
pub async fn mines_cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<MinesCashoutRequest>,
) -> ApiResult<MinesCashout> {
    respond(request_id, state.service.mines_cashout(&body.session_id))
}

/// POST /api/battle/join
pub async fn join_battle_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<PlayerRequest>,
) -> ApiResult<BattleJoin> {
    respond(request_id, state.service.join_battle(body.telegram_id))
}

/// GET /api/battle/current
pub async fn current_battle_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<BattleStatus> {
    respond(request_id, state.service.current_battle())
}

/// POST /api/battle/process
pub async fn process_battles_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<BattleProcessResponse> {
    let result = state
        .service
        .process_battles()
        .map(|rounds| BattleProcessResponse {
            processed: rounds.len(),
            rounds,
        });
    respond(request_id, result)
}

/// POST /api/withdrawals
pub async fn request_withdrawal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<WithdrawalRequest>,
) -> ApiResult<Withdrawal> {
    respond(
        request_id,
        state
            .service
            .request_withdrawal(body.telegram_id, body.amount, body.wallet_address),
    )
}

/// GET /api/withdrawals?telegramId=
pub async fn list_withdrawals_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<WithdrawalsQuery>,
) -> ApiResult<Vec<Withdrawal>> {
    respond(request_id, state.service.list_withdrawals(query.telegram_id))
}

/// GET /api/admin/withdrawals
pub async fn pending_withdrawals_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<Withdrawal>> {
    respond(request_id, state.service.pending_withdrawals())
}

/// POST /api/admin/withdrawals/:id/approve
pub async fn approve_withdrawal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Withdrawal> {
    respond(request_id, state.service.approve_withdrawal(&id))
}

/// POST /api/admin/withdrawals/:id/paid
pub async fn paid_withdrawal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Withdrawal> {
    respond(request_id, state.service.mark_withdrawal_paid(&id))
}

/// POST /api/admin/withdrawals/:id/reject
pub async fn reject_withdrawal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Withdrawal> {
    respond(request_id, state.service.reject_withdrawal(&id))
}

/// POST /api/channel/check
pub async fn check_channel_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<PlayerRequest>,
) -> ApiResult<ChannelCheck> {
    respond(request_id, state.service.check_channel(body.telegram_id).await)
}

/// GET /api/stats/daily?date=YYYY-MM-DD
pub async fn daily_stats_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<DailyStats> {
    respond(request_id, state.service.daily_stats(query.date))
}
