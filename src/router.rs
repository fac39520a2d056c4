use crate::Result;
use crate::config::BotConfig;
use crate::event::InboundEvent;
use crate::handlers::{Services, download, recognize, search};
use crate::messenger::Messenger;

/// Hands `event` to exactly one handler.
pub async fn dispatch(
    messenger: &dyn Messenger,
    services: &Services,
    config: &BotConfig,
    event: &InboundEvent,
) -> Result<()> {
    match event {
        InboundEvent::Text { chat_id, text } => {
            search::handle_text(messenger, services, *chat_id, text).await
        }
        InboundEvent::Audio { chat_id, input } => {
            recognize::handle_audio(messenger, services, config, *chat_id, input).await
        }
        InboundEvent::ButtonPress {
            chat_id,
            query_id,
            payload,
        } => download::handle_button(messenger, services, *chat_id, query_id, payload).await,
    }
}
