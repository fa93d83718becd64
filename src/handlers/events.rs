//! 변경 피드 (Server-Sent Events)

use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::auth::AuthUser;
use crate::state::AppState;

/// GET /api/events
///
/// 호출자 소유 레코드의 변경만 내보낸다. 뒤처진 구독자는 놓친 이벤트를 건너뛴다.
pub async fn change_feed(
    user: AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(owner_id = %user.user_id, "change feed subscribed");
    let owner_id = user.user_id;

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(move |received| match received {
        Ok(event) if event.owner_id == owner_id => {
            Some(Event::default().event(event.kind.as_str()).json_data(&event))
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "change feed subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
